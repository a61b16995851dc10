//! Error types for the ecape-analysis crate.
use std::{error::Error, fmt::Display};

/// The way in which a profile failed the structural checks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProfileDefect {
    /// The profiles do not all have the same number of levels.
    LengthMismatch,
    /// Heights are not strictly increasing from the bottom to the top.
    HeightNotIncreasing,
    /// Pressures are not strictly decreasing from the bottom to the top.
    PressureNotDecreasing,
    /// Fewer than two levels, nothing can be integrated.
    TooFewLevels,
}

impl Display for ProfileDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ProfileDefect::*;

        match self {
            LengthMismatch => write!(f, "profiles have different lengths"),
            HeightNotIncreasing => write!(f, "height is not strictly increasing"),
            PressureNotDecreasing => write!(f, "pressure is not strictly decreasing"),
            TooFewLevels => write!(f, "fewer than two levels"),
        }
    }
}

/// Error type for the crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnalysisError {
    /// The profile arrays are structurally unusable.
    InvalidProfile(ProfileDefect),
    /// A value is missing, or its magnitude is not physical for the unit it claims to carry.
    UnitsError,
    /// A value (surface value, index, location, etc) that is required is not available.
    MissingValue,
    /// Not enough data available for analysis.
    NotEnoughData,
    /// Bad or invalid input.
    InvalidInput,
    /// Missing data during interpolation, or it would have been extrapolation.
    InterpolationError,
    /// Forward an error from the metfor crate.
    MetForError,
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use AnalysisError::*;

        match self {
            InvalidProfile(defect) => write!(f, "invalid profile: {}", defect),
            UnitsError => write!(f, "missing or non-physical value for its units"),
            MissingValue => write!(f, "missing value required for analysis"),
            NotEnoughData => write!(f, "not enough data available for analysis"),
            InvalidInput => write!(f, "invalid input"),
            InterpolationError => write!(f, "none value encountered during interpolation"),
            MetForError => write!(f, "error bubbled up from metfor crate"),
        }
    }
}

impl Error for AnalysisError {}

impl From<ProfileDefect> for AnalysisError {
    fn from(defect: ProfileDefect) -> Self {
        AnalysisError::InvalidProfile(defect)
    }
}

/// Shorthand for results.
pub type Result<T> = std::result::Result<T, AnalysisError>;

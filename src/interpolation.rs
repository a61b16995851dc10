//! Linear interpolation on profiles that never extrapolates.
use itertools::{izip, Itertools};
use metfor::{MetersPSec, Quantity, WindUV};
use optional::{Noned, Optioned};
use std::ops::Sub;

/// Interpolate values given two parallel slices of data and a target value.
///
/// Assumes that xs is monotonic, either increasing like height or decreasing like pressure.
/// Returns a missing value if the target is not bracketed by `xs`, this never extrapolates.
#[inline]
pub fn linear_interpolate<X, Y>(xs: &[X], ys: &[Y], target_x: X) -> Optioned<Y>
where
    X: Quantity + PartialOrd + Sub<X>,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + Noned + Sub<Y>,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_eq!(xs.len(), ys.len());

    Optioned::from(
        find_bracket(xs, target_x).map(|(i0, i1)| {
            if i0 == i1 {
                ys[i0]
            } else {
                linear_interp(target_x, xs[i0], xs[i1], ys[i0], ys[i1])
            }
        }),
    )
}

/// Interpolate the wind components, which are not a `Quantity` themselves.
pub fn linear_interpolate_wind<X>(
    xs: &[X],
    winds: &[WindUV<MetersPSec>],
    target_x: X,
) -> Option<WindUV<MetersPSec>>
where
    X: Quantity + PartialOrd + Sub<X>,
    <X as Sub<X>>::Output: Quantity,
{
    debug_assert_eq!(xs.len(), winds.len());

    find_bracket(xs, target_x).map(|(i0, i1)| {
        if i0 == i1 {
            winds[i0]
        } else {
            let (w0, w1) = (winds[i0], winds[i1]);
            WindUV {
                u: linear_interp(target_x, xs[i0], xs[i1], w0.u, w1.u),
                v: linear_interp(target_x, xs[i0], xs[i1], w0.v, w1.v),
            }
        }
    })
}

// Find the indexes of the pair of levels that bracket the target. If the target lands exactly on
// a level both indexes are the same.
fn find_bracket<X>(xs: &[X], target_x: X) -> Option<(usize, usize)>
where
    X: Quantity + PartialOrd + Sub<X>,
    <X as Sub<X>>::Output: Quantity,
{
    let is_equal = |x: X| (x - target_x).unpack().abs() < std::f64::EPSILON;

    izip!(0.., xs)
        // Look at them in pairs.
        .tuple_windows::<(_, _)>()
        // Keep the first pair that brackets or lands on the target value
        .find_map(|((i0, &x0), (i1, &x1))| {
            if is_equal(x0) {
                Some((i0, i0))
            } else if is_equal(x1) {
                Some((i1, i1))
            } else if (x0 < target_x && x1 > target_x) || (x0 > target_x && x1 < target_x) {
                Some((i0, i1))
            } else {
                None
            }
        })
}

#[inline]
pub(crate) fn linear_interp<X, Y>(x_val: X, x1: X, x2: X, y1: Y, y2: Y) -> Y
where
    X: Sub<X> + Copy + std::fmt::Debug + std::cmp::PartialEq,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + Sub<Y>,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_ne!(x1, x2);

    let run = (x2 - x1).unpack();
    let rise = (y2 - y1).unpack();
    let dx = (x_val - x1).unpack();

    Y::pack(y1.unpack() + dx * (rise / run))
}

#[cfg(test)]
mod test {
    use super::*;
    use metfor::{Celsius, HectoPascal, Meters};

    #[test]
    fn test_linear_interpolate_pressure_coordinate() {
        let pres = [
            HectoPascal(1000.0),
            HectoPascal(900.0),
            HectoPascal(800.0),
        ];
        let hgt = [Meters(0.0), Meters(1000.0), Meters(2000.0)];

        let h = linear_interpolate(&pres, &hgt, HectoPascal(850.0));
        assert!((h.unpack().unpack() - 1500.0).abs() < 1.0e-9);

        let h = linear_interpolate(&pres, &hgt, HectoPascal(900.0));
        assert!((h.unpack().unpack() - 1000.0).abs() < 1.0e-9);

        // No extrapolation
        assert!(linear_interpolate(&pres, &hgt, HectoPascal(700.0)).is_none());
        assert!(linear_interpolate(&pres, &hgt, HectoPascal(1010.0)).is_none());
    }

    #[test]
    fn test_linear_interpolate_height_coordinate() {
        let hgt = [Meters(0.0), Meters(1000.0), Meters(3000.0)];
        let t = [Celsius(20.0), Celsius(10.0), Celsius(0.0)];

        let val = linear_interpolate(&hgt, &t, Meters(2000.0));
        assert!((val.unpack().unpack() - 5.0).abs() < 1.0e-9);
    }

    #[test]
    fn test_linear_interpolate_wind() {
        let hgt = [Meters(0.0), Meters(1000.0)];
        let winds = [
            WindUV {
                u: MetersPSec(0.0),
                v: MetersPSec(10.0),
            },
            WindUV {
                u: MetersPSec(10.0),
                v: MetersPSec(0.0),
            },
        ];

        let WindUV { u, v } = linear_interpolate_wind(&hgt, &winds, Meters(250.0)).unwrap();
        assert!((u.unpack() - 2.5).abs() < 1.0e-9);
        assert!((v.unpack() - 7.5).abs() < 1.0e-9);

        assert!(linear_interpolate_wind(&hgt, &winds, Meters(1500.0)).is_none());
    }
}

use approx::assert_relative_eq;
use ecape_analysis::{
    ecape, ecape_analysis, ecape_with_moisture, entraining_cape, EcapeOptions,
    EntrainmentParameters, ParcelType, Sounding, StormRelativeLayer,
};
use metfor::{JpKg, Meters, MetersPSec, Quantity};

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_parcel_type(snd: &Sounding, parcel_type: ParcelType) {
    let opts = EcapeOptions::new().with_parcel_type(parcel_type);
    let anal = ecape_analysis(snd, &opts).unwrap();

    assert!(anal.ecape().unpack().is_finite());
    assert!(anal.ecape() >= JpKg(0.0));
    assert_eq!(ecape(snd, parcel_type).unwrap(), anal.ecape());

    if anal.parcel_analysis().has_lfc() {
        assert!(anal.psi() > 0.0);
        assert!(anal.entrainment_rate() > 0.0);
        assert!(anal.ncape().unpack().is_finite());

        let expected = entraining_cape(
            anal.storm_relative_speed(),
            anal.psi(),
            anal.ncape(),
            anal.cape(),
        );
        assert_eq!(anal.ecape(), expected);
    } else {
        assert_eq!(anal.ecape(), JpKg(0.0));
        assert_eq!(anal.ncape(), JpKg(0.0));
    }
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_no_entrainment_limit(snd: &Sounding) {
    let opts = EcapeOptions::new()
        .with_entrainment(EntrainmentParameters::default().with_radius(Meters(1.0e9)));
    let anal = ecape_analysis(snd, &opts).unwrap();

    if anal.parcel_analysis().has_lfc() && anal.cape() > JpKg(0.0) {
        let s = anal.storm_relative_speed().unpack().powi(2);
        assert_relative_eq!(
            anal.ecape().unpack(),
            anal.cape().unpack() + s / 2.0,
            max_relative = 1.0e-6
        );

        let entraining = ecape_analysis(snd, &EcapeOptions::new()).unwrap();
        assert!(entraining.ecape() < anal.ecape());
    }
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_cape_override(snd: &Sounding) {
    let base = ecape_analysis(snd, &EcapeOptions::new()).unwrap();
    let override_cape = JpKg(base.parcel_analysis().cape().unpack() / 2.0);

    let anal = ecape_analysis(snd, &EcapeOptions::new().with_cape_override(override_cape)).unwrap();
    assert_eq!(anal.cape(), override_cape);
    assert_eq!(anal.parcel_analysis().cape(), base.parcel_analysis().cape());

    if anal.parcel_analysis().has_lfc() {
        let expected = entraining_cape(
            anal.storm_relative_speed(),
            anal.psi(),
            anal.ncape(),
            override_cape,
        );
        assert_eq!(anal.ecape(), expected);
        assert!(anal.ecape() <= base.ecape());
    } else {
        assert_eq!(anal.ecape(), JpKg(0.0));
    }

    let zero = ecape_analysis(snd, &EcapeOptions::new().with_cape_override(JpKg(0.0))).unwrap();
    assert_eq!(zero.ecape(), JpKg(0.0));
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_moisture(snd: &Sounding) {
    for parcel_type in &[
        ParcelType::SurfaceBased,
        ParcelType::MostUnstable,
        ParcelType::MixedLayer,
    ] {
        let (ecape, ecape_a) = ecape_with_moisture(snd, *parcel_type).unwrap();

        assert!(ecape_a >= JpKg(0.0));
        assert!(ecape_a <= ecape);
    }
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_cloud_layer(snd: &Sounding) {
    let opts = EcapeOptions::new().with_storm_relative_layer(StormRelativeLayer::CloudLayer);
    let anal = ecape_analysis(snd, &opts).unwrap();

    assert!(anal.ecape().unpack().is_finite());
    assert!(anal.ecape() >= JpKg(0.0));
    assert_eq!(
        anal.storm_relative_speed(),
        anal.cloud_layer_storm_relative_speed()
    );

    if anal.parcel_analysis().has_lfc() {
        assert!(anal.cloud_layer_storm_relative_speed().unpack().is_finite());
        assert!(anal.cloud_layer_storm_relative_speed() >= MetersPSec(0.0));
    }
}

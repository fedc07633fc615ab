use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert!(close(ease.apply(0.0), 0.0), "{ease:?} at 0");
        assert!(close(ease.apply(1.0), 1.0), "{ease:?} at 1");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::InQuart,
        Ease::OutQuart,
        Ease::InOutQuart,
        Ease::InSine,
        Ease::OutSine,
        Ease::InOutSine,
        Ease::InExpo,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::InCirc,
        Ease::OutCirc,
        Ease::InOutCirc,
    ] {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn back_presets_leave_the_unit_interval() {
    assert!(Ease::InBack.apply(0.2) < 0.0);
    assert!(Ease::OutBack.apply(0.8) > 1.0);
}

#[test]
fn names_round_trip_through_from_str() {
    for ease in Ease::ALL {
        assert_eq!(ease.name().parse::<Ease>().unwrap(), ease);
    }
    assert_eq!("in-out-cubic".parse::<Ease>().unwrap(), Ease::InOutCubic);
    assert_eq!("IN_QUAD".parse::<Ease>().unwrap(), Ease::InQuad);
}

#[test]
fn unknown_names_are_validation_errors() {
    let err = Easer::named("wobble").unwrap_err();
    assert!(matches!(err, ChoreoError::Validation(_)));
}

#[test]
fn default_easer_is_identity() {
    let easer = Easer::default();
    assert_eq!(easer.apply(0.3), 0.3);
    assert_eq!(easer.apply(1.7), 1.7);
}

#[test]
fn custom_easer_is_not_clamped() {
    let easer = Easer::custom(|t| t * 2.0);
    assert_eq!(easer.apply(0.75), 1.5);
    assert_eq!(Easer::from(Ease::InQuad).apply(2.0), 1.0);
}

use proptest::prelude::*;
use tracker_core::error::TrackerError;
use tracker_core::{CoordinateTransform, PixelPoint, StagePoint, StaticCalibration};

fn skewed() -> CoordinateTransform {
    let mut t = CoordinateTransform::new();
    t.load(&StaticCalibration::new(vec![
        vec![2.0, 0.1, 5.0],
        vec![0.05, 1.5, -3.0],
        vec![1e-4, 2e-4, 1.0],
    ]))
    .unwrap();
    t
}

#[test]
fn identity_round_trip() {
    let mut t = CoordinateTransform::new();
    t.load(&StaticCalibration::identity()).unwrap();
    let p = PixelPoint::new(320.0, 240.0);
    let s = t.to_stage(p).unwrap();
    assert_eq!(s, StagePoint::new(320.0, 240.0));
    assert_eq!(t.to_image(s).unwrap(), p);
}

#[test]
fn scaled_calibration_maps_to_stage_units() {
    let mut t = CoordinateTransform::new();
    t.load(&StaticCalibration::new(vec![
        vec![10.0, 0.0, 100.0],
        vec![0.0, 10.0, -50.0],
        vec![0.0, 0.0, 1.0],
    ]))
    .unwrap();
    let s = t.to_stage(PixelPoint::new(3.0, 4.0)).unwrap();
    assert_eq!(s, StagePoint::new(130.0, -10.0));
}

#[test]
fn non_finite_rows_are_calibration_errors() {
    let mut t = CoordinateTransform::new();
    let err = t
        .load(&StaticCalibration::new(vec![
            vec![1.0, 0.0, f64::NAN],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TrackerError>(),
        Some(TrackerError::Calibration(_))
    ));
    assert!(!t.is_loaded());
}

proptest! {
    #[test]
    fn round_trip_recovers_pixel(x in 0.0f64..640.0, y in 0.0f64..480.0) {
        let t = skewed();
        let back = t.to_image(t.to_stage(PixelPoint::new(x, y)).unwrap()).unwrap();
        prop_assert!((back.x - x).abs() < 1e-6);
        prop_assert!((back.y - y).abs() < 1e-6);
    }
}

use std::fs::File;
use std::io::Write;

use rstest::rstest;
use tempfile::tempdir;
use tracker_config::{load_calibration_csv, load_calibration_file, load_calibration_toml};

#[rstest]
fn csv_rows_load_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "h0,h1,h2").unwrap();
    writeln!(f, "2.0, 0.0, 10.0").unwrap();
    writeln!(f, "0.0, 2.0, -5.0").unwrap();
    writeln!(f, "0.0, 0.0, 1.0").unwrap();
    drop(f);

    let rows = load_calibration_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            vec![2.0, 0.0, 10.0],
            vec![0.0, 2.0, -5.0],
            vec![0.0, 0.0, 1.0]
        ]
    );
}

#[rstest]
fn csv_rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "a,b,c").unwrap();
    writeln!(f, "1,0,0").unwrap();
    drop(f);

    let err = load_calibration_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers 'h0,h1,h2'"));
}

#[rstest]
fn csv_reports_bad_row_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "h0,h1,h2").unwrap();
    writeln!(f, "1,0,0").unwrap();
    writeln!(f, "0,one,0").unwrap();
    drop(f);

    let err = load_calibration_csv(&path).expect_err("non-numeric cell");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn toml_file_dispatch_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.toml");
    std::fs::write(
        &path,
        "homography_image_to_stage = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]\n",
    )
    .unwrap();
    let rows = load_calibration_file(&path).unwrap();
    assert_eq!(rows.len(), 3);
}

#[rstest]
fn toml_keeps_malformed_shape_for_core_to_reject() {
    // The loader does not judge the shape; a 2x3 matrix comes back as-is.
    let rows =
        load_calibration_toml("homography_image_to_stage = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]")
            .unwrap();
    assert_eq!(rows.len(), 2);
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_calibration_file(&dir.path().join("nope.toml")).expect_err("missing");
    assert!(format!("{err}").contains("does not exist"));
}

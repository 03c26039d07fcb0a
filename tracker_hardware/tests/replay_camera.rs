use std::time::Duration;

use image::{GrayImage, Luma};
use rstest::rstest;
use tracker_hardware::ReplayCamera;
use tracker_hardware::error::HwError;
use tracker_traits::Camera;

fn write_frames(dir: &std::path::Path, values: &[u8], size: (u32, u32)) {
    for (i, v) in values.iter().enumerate() {
        let img = GrayImage::from_pixel(size.0, size.1, Luma([*v]));
        img.save(dir.join(format!("frame_{i:03}.png"))).unwrap();
    }
}

#[rstest]
#[case::looping(false, 10)]
#[case::once(true, 30)]
fn frames_play_in_name_order(#[case] once: bool, #[case] expected_last: u8) {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20, 30], (4, 3));
    let mut cam = ReplayCamera::from_dir(dir.path()).unwrap();
    if once {
        cam = cam.once();
    }
    cam.start().unwrap();
    let t = Duration::from_millis(10);
    assert_eq!(cam.acquire(t).unwrap().get_pixel(0, 0).0[0], 10);
    assert_eq!(cam.acquire(t).unwrap().get_pixel(0, 0).0[0], 20);
    assert_eq!(cam.acquire(t).unwrap().get_pixel(0, 0).0[0], 30);
    match cam.acquire(t) {
        Ok(frame) => assert_eq!(frame.get_pixel(0, 0).0[0], expected_last),
        Err(e) => {
            assert!(once);
            assert!(matches!(e.downcast_ref::<HwError>(), Some(HwError::Exhausted(3))));
        }
    }
}

#[test]
fn size_change_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    GrayImage::from_pixel(4, 4, Luma([0])).save(dir.path().join("a.png")).unwrap();
    GrayImage::from_pixel(5, 4, Luma([0])).save(dir.path().join("b.png")).unwrap();
    let mut cam = ReplayCamera::from_dir(dir.path()).unwrap();
    cam.start().unwrap();
    cam.acquire(Duration::ZERO).unwrap();
    let err = cam.acquire(Duration::ZERO).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::FrameSize { .. })));
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
    assert!(matches!(ReplayCamera::from_dir(dir.path()), Err(HwError::Image(_))));
}

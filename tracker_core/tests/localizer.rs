use std::collections::BTreeSet;

use image::{GrayImage, Luma};
use proptest::prelude::*;
use rstest::rstest;
use tracker_core::localizer::{BlobLocalizer, Mask, centroid};
use tracker_core::{LocalizerCfg, Locate, Localizer, PixelPoint, Polarity, click_channel};

fn field(v: u8) -> GrayImage {
    GrayImage::from_pixel(200, 200, Luma([v]))
}

fn with_block(bg: u8, fg: u8, x0: u32, y0: u32) -> GrayImage {
    GrayImage::from_fn(200, 200, |x, y| {
        let inside = (x0..x0 + 5).contains(&x) && (y0..y0 + 5).contains(&y);
        Luma([if inside { fg } else { bg }])
    })
}

#[test]
fn bright_block_on_dark_field_is_centered() {
    let mut loc = Localizer::blob(LocalizerCfg::default());
    assert_eq!(loc.locate(&field(10)), None);
    let p = loc.locate(&with_block(10, 200, 100, 100));
    assert_eq!(p, Some(PixelPoint::new(102.0, 102.0)));
}

#[rstest]
#[case::absolute(Polarity::Absolute, true)]
#[case::darker(Polarity::Darker, true)]
#[case::brighter(Polarity::Brighter, false)]
fn dark_organism_by_polarity(#[case] polarity: Polarity, #[case] found: bool) {
    let cfg = LocalizerCfg {
        polarity,
        ..LocalizerCfg::default()
    };
    let mut loc = BlobLocalizer::new(cfg);
    loc.locate(&field(200));
    let p = loc.locate(&with_block(200, 40, 20, 30));
    assert_eq!(p.is_some(), found);
    if found {
        assert_eq!(p, Some(PixelPoint::new(22.0, 32.0)));
    }
}

#[test]
fn unchanged_scene_has_no_target() {
    let mut loc = Localizer::blob(LocalizerCfg::default());
    for _ in 0..15 {
        assert_eq!(loc.locate(&field(90)), None);
    }
}

#[test]
fn erosion_drops_speckle_but_keeps_block() {
    let cfg = LocalizerCfg {
        erode: true,
        ..LocalizerCfg::default()
    };
    let mut loc = BlobLocalizer::new(cfg);
    loc.locate(&field(10));
    let mut frame = with_block(10, 200, 100, 100);
    frame.put_pixel(10, 10, Luma([255]));
    let p = loc.locate(&frame);
    assert_eq!(p, Some(PixelPoint::new(102.0, 102.0)));
    assert_eq!(loc.mask().count(), 9);
}

#[test]
fn click_is_valid_for_one_cycle_only() {
    let (tx, rx) = click_channel();
    let mut loc = Localizer::click(rx);
    let frame = field(0);
    assert_eq!(loc.locate(&frame), None);
    tx.click(5.0, 6.0);
    tx.click(7.0, 8.0);
    assert_eq!(loc.locate(&frame), Some(PixelPoint::new(7.0, 8.0)));
    assert_eq!(loc.locate(&frame), None);
}

proptest! {
    #[test]
    fn centroid_is_mean_of_foreground(
        pts in prop::collection::btree_set((0u32..32, 0u32..32), 1..200)
    ) {
        let pts: BTreeSet<(u32, u32)> = pts;
        let mut bits = vec![false; 32 * 32];
        for (x, y) in &pts {
            bits[(*y * 32 + *x) as usize] = true;
        }
        let mask = Mask { width: 32, height: 32, bits };
        let n = pts.len() as f64;
        let ex = pts.iter().map(|p| f64::from(p.0)).sum::<f64>() / n;
        let ey = pts.iter().map(|p| f64::from(p.1)).sum::<f64>() / n;
        let c = centroid(&mask).unwrap();
        prop_assert!((c.x - ex).abs() < 1e-9);
        prop_assert!((c.y - ey).abs() < 1e-9);
    }
}

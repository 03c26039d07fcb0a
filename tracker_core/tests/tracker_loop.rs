use std::time::Duration;

use image::{GrayImage, Luma};
use rstest::rstest;
use tracker_core::error::BuildError;
use tracker_core::mocks::{NoCamera, ScriptedCamera, ScriptedLink};
use tracker_core::{
    CancelToken, CoordinateTransform, CycleOutcome, DynTracker, LocalizerCfg, LoopCfg,
    PixelPoint, StageCfg, StaticCalibration, click_channel,
};
use tracker_traits::{BoxError, Camera, Frame, ManualClock};

const ID: &str = "stage_controller";

fn identity() -> CoordinateTransform {
    let mut t = CoordinateTransform::new();
    t.load(&StaticCalibration::identity()).unwrap();
    t
}

fn field() -> GrayImage {
    GrayImage::from_pixel(200, 200, Luma([10]))
}

fn block() -> GrayImage {
    GrayImage::from_fn(200, 200, |x, y| {
        let inside = (100..=104).contains(&x) && (100..=104).contains(&y);
        Luma([if inside { 200 } else { 10 }])
    })
}

fn frames(n_blocks: usize) -> Vec<GrayImage> {
    std::iter::once(field())
        .chain(std::iter::repeat_with(block).take(n_blocks))
        .collect()
}

fn loop_cfg() -> LoopCfg {
    LoopCfg {
        idle_ms: 0,
        report_every: 0,
        ..LoopCfg::default()
    }
}

#[test]
fn full_cycle_homes_then_moves() {
    let link = ScriptedLink::new()
        .respond("[getDeviceId]", ID)
        .respond_seq("[isHomed]", &["false", "true"]);
    let log = link.written();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(5)))
        .with_stage(link)
        .with_transform(identity())
        .with_loop_cfg(loop_cfg())
        .build()
        .unwrap();
    t.connect().unwrap();

    assert!(matches!(t.step(), CycleOutcome::NoTarget));
    assert!(matches!(t.step(), CycleOutcome::HomeRequested));
    assert!(matches!(t.step(), CycleOutcome::HomingPolled { homed: false }));
    assert!(matches!(t.step(), CycleOutcome::HomingPolled { homed: true }));
    match t.step() {
        CycleOutcome::Moved { pixel, x, y } => {
            assert_eq!(pixel, PixelPoint::new(102.0, 102.0));
            assert_eq!((x, y), (102, 102));
        }
        other => panic!("expected a move, got {other:?}"),
    }
    assert!(matches!(t.step(), CycleOutcome::Deadbanded));
    assert!(matches!(t.step(), CycleOutcome::NoFrame));

    assert_eq!(
        log.lines(),
        vec![
            "[getDeviceId]",
            "[homeStage]",
            "[isHomed]",
            "[isHomed]",
            "[moveStageTo [102,102]]",
        ]
    );
}

#[test]
fn paralyzed_tracks_without_touching_the_stage() {
    let link = ScriptedLink::new();
    let log = link.written();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(3)))
        .with_stage(link)
        .with_transform(identity())
        .with_loop_cfg(LoopCfg {
            paralyzed: true,
            max_cycles: Some(4),
            ..loop_cfg()
        })
        .build()
        .unwrap();
    t.connect().unwrap();
    let stats = t.run(&CancelToken::new()).unwrap();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.targets, 3);
    assert_eq!(stats.moves, 0);
    assert!(log.lines().is_empty());
    assert!(!t.stage().is_connected());
}

#[test]
fn blind_mode_never_acquires() {
    let clock = ManualClock::new();
    let mut t = DynTracker::builder()
        .with_camera(NoCamera)
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .with_clock(Box::new(clock.clone()))
        .with_loop_cfg(LoopCfg {
            blind: true,
            paralyzed: true,
            idle_ms: 20,
            max_cycles: Some(5),
            ..loop_cfg()
        })
        .build()
        .unwrap();
    let stats = t.run(&CancelToken::new()).unwrap();
    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.frames, 0);
    assert_eq!(stats.frame_errors, 0);
    assert_eq!(clock.elapsed(), Duration::from_millis(100));
}

#[test]
fn cancelled_token_stops_before_first_cycle() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(3)))
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .with_loop_cfg(loop_cfg())
        .build()
        .unwrap();
    assert_eq!(t.run(&cancel).unwrap().cycles, 0);
}

/// Camera that requests a stop after delivering `left` frames.
struct StoppingCamera {
    left: u32,
    cancel: CancelToken,
}

impl Camera for StoppingCamera {
    fn start(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn acquire(&mut self, _timeout: Duration) -> Result<Frame, BoxError> {
        self.left = self.left.saturating_sub(1);
        if self.left == 0 {
            self.cancel.cancel();
        }
        Ok(field())
    }
}

#[test]
fn cancellation_is_observed_at_the_next_cycle() {
    let cancel = CancelToken::new();
    let cam = StoppingCamera {
        left: 3,
        cancel: cancel.clone(),
    };
    let mut t = DynTracker::builder()
        .with_camera(cam)
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .with_loop_cfg(loop_cfg())
        .build()
        .unwrap();
    let stats = t.run(&cancel).unwrap();
    assert_eq!(stats.cycles, 3);
}

#[test]
fn stalled_homing_is_reissued() {
    let link = ScriptedLink::new()
        .respond("[getDeviceId]", ID)
        .respond("[isHomed]", "false");
    let log = link.written();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(6)))
        .with_stage(link)
        .with_transform(identity())
        .with_loop_cfg(LoopCfg {
            rehome_after_polls: Some(2),
            ..loop_cfg()
        })
        .build()
        .unwrap();
    t.connect().unwrap();
    let outcomes: Vec<_> = (0..5).map(|_| t.step()).collect();
    assert!(matches!(outcomes[1], CycleOutcome::HomeRequested));
    assert!(matches!(outcomes[2], CycleOutcome::HomingPolled { homed: false }));
    assert!(matches!(outcomes[3], CycleOutcome::HomeRequested));
    assert_eq!(log.count("[homeStage]"), 2);
}

#[test]
fn stage_errors_do_not_stop_the_loop() {
    let mut link = ScriptedLink::new().failing_reads();
    tracker_traits::SerialLink::open(&mut link).unwrap();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(4)))
        .with_stage(link)
        .with_transform(identity())
        .with_loop_cfg(LoopCfg {
            max_cycles: Some(5),
            ..loop_cfg()
        })
        .build()
        .unwrap();
    let stats = t.run(&CancelToken::new()).unwrap();
    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.stage_errors, 3);
}

#[test]
fn target_at_infinity_fails_transform_only() {
    let mut transform = CoordinateTransform::new();
    transform
        .load(&StaticCalibration::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, -102.0],
        ]))
        .unwrap();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(frames(1)))
        .with_stage(ScriptedLink::new())
        .with_transform(transform)
        .with_loop_cfg(loop_cfg())
        .build()
        .unwrap();
    t.step();
    assert!(matches!(t.step(), CycleOutcome::TransformFailed(_)));
}

#[test]
fn clicks_drive_paralyzed_tracking() {
    let (tx, rx) = click_channel();
    let mut t = DynTracker::builder()
        .with_camera(ScriptedCamera::new(vec![field(), field(), field()]))
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .with_clicks(rx)
        .with_loop_cfg(LoopCfg {
            paralyzed: true,
            ..loop_cfg()
        })
        .build()
        .unwrap();
    assert!(matches!(t.step(), CycleOutcome::NoTarget));
    tx.click(40.0, 50.0);
    match t.step() {
        CycleOutcome::Tracked { pixel, stage } => {
            assert_eq!(pixel, PixelPoint::new(40.0, 50.0));
            assert_eq!((stage.x, stage.y), (40.0, 50.0));
        }
        other => panic!("expected tracked click, got {other:?}"),
    }
    assert!(matches!(t.step(), CycleOutcome::NoTarget));
}

#[test]
fn missing_camera_is_typed() {
    let err = DynTracker::builder()
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .try_build()
        .unwrap_err();
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingCamera) => {}
        other => panic!("expected MissingCamera, got: {other:?}"),
    }
}

#[test]
fn unloaded_transform_is_missing() {
    let err = DynTracker::builder()
        .with_camera(NoCamera)
        .with_stage(ScriptedLink::new())
        .with_transform(CoordinateTransform::new())
        .build()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingTransform)
    ));
}

#[rstest]
#[case::divisor_zero(LocalizerCfg { background_divisor: 0, ..LocalizerCfg::default() }, StageCfg::default())]
#[case::divisor_too_large(LocalizerCfg { background_divisor: 1001, ..LocalizerCfg::default() }, StageCfg::default())]
#[case::learning_rate(LocalizerCfg { learning_rate: 0.0, ..LocalizerCfg::default() }, StageCfg::default())]
#[case::attempts(LocalizerCfg::default(), StageCfg { max_read_attempts: 0, ..StageCfg::default() })]
#[case::deadband(LocalizerCfg::default(), StageCfg { deadband: -1.0, ..StageCfg::default() })]
fn invalid_settings_are_rejected(#[case] loc: LocalizerCfg, #[case] stage: StageCfg) {
    let err = DynTracker::builder()
        .with_camera(NoCamera)
        .with_stage(ScriptedLink::new())
        .with_transform(identity())
        .with_localizer(loc)
        .with_stage_cfg(stage)
        .build()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

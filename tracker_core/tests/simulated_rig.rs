//! Full loop against the simulated camera and stage from `tracker_hardware`.

use tracker_core::{
    CancelToken, CoordinateTransform, LocalizerCfg, LoopCfg, Polarity, StageCfg,
    StaticCalibration, build_tracker,
};
use tracker_hardware::{SimulatedCamera, SimulatedStage};

#[test]
fn loop_follows_the_simulated_organism() {
    let camera = SimulatedCamera::new(160, 120);
    let stage = SimulatedStage::new().with_homing_polls(1).with_empty_reads(2);
    let transcript = stage.transcript();

    let mut transform = CoordinateTransform::new();
    transform.load(&StaticCalibration::identity()).unwrap();

    let mut t = build_tracker(
        camera,
        stage,
        transform,
        LocalizerCfg {
            polarity: Polarity::Darker,
            ..LocalizerCfg::default()
        },
        None,
        StageCfg {
            deadband: 0.0,
            ..StageCfg::default()
        },
        LoopCfg {
            max_cycles: Some(40),
            report_every: 10,
            ..LoopCfg::default()
        },
        None,
    )
    .unwrap();
    t.connect().unwrap();
    let stats = t.run(&CancelToken::new()).unwrap();
    t.disconnect();

    assert_eq!(stats.cycles, 40);
    assert_eq!(stats.stage_errors, 0);
    assert!(stats.moves > 20, "stats = {stats:?}");
    assert_eq!(transcript.count("[homeStage]"), 1);

    let last = transcript
        .lines()
        .into_iter()
        .rev()
        .find(|l| l.starts_with("[moveStageTo"))
        .unwrap();
    assert!(last.starts_with("[moveStageTo ["), "{last}");
}

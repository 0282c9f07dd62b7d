//! End-to-end behaviour of the engine through its public API.

use std::time::{Duration, Instant};

use tonechain_effects::EffectType;
use tonechain_engine::{
    ChainController, ChainDescription, ControlError, Engine, EngineConfig, EngineEvent,
    EngineState, FaultReason, FixedClock, NodeDescription, OfflineDriver,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tonechain_engine=debug")
        .try_init();
}

fn started(config: EngineConfig, chain: &ChainDescription) -> (OfflineDriver, ChainController) {
    let (engine, controller) = Engine::with_chain(config, chain).unwrap();
    controller.start().unwrap();
    let engine = engine.with_clock(FixedClock::new(Duration::from_millis(1)));
    (OfflineDriver::new(engine), controller)
}

fn impulse(len: usize) -> Vec<f32> {
    let mut signal = vec![0.0; len];
    signal[0] = 1.0;
    signal
}

fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn boost_into_distortion_impulse_is_deterministic() {
    init_tracing();
    let chain = ChainDescription::new()
        .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 6.0))
        .with_node(NodeDescription::new(EffectType::Distortion).with_param("drive_db", 15.0));

    let render = || {
        let (mut driver, _controller) = started(EngineConfig::default(), &chain);
        driver.render(&impulse(2048))
    };
    let first = render();
    let second = render();

    let first_bits: Vec<u32> = first.iter().map(|s| s.to_bits()).collect();
    let second_bits: Vec<u32> = second.iter().map(|s| s.to_bits()).collect();
    assert_eq!(first_bits, second_bits);

    let p = peak(&first);
    assert!(p > 0.1 && p <= 0.7, "peak {p}");
    assert_eq!(p, peak(&second));
}

#[test]
fn eight_nodes_ten_thousand_blocks_without_underrun() {
    init_tracing();
    let mut chain = ChainDescription::new();
    for effect_type in EffectType::ALL.iter().chain(EffectType::ALL.iter()) {
        chain = chain.with_node(NodeDescription::new(*effect_type));
    }
    assert_eq!(chain.len(), 8);

    let (mut driver, controller) = started(EngineConfig::default(), &chain);
    let period: Vec<f32> = (0..256)
        .map(|i| 0.3 * (std::f32::consts::TAU * i as f32 / 64.0).sin())
        .collect();
    let input: Vec<f32> = period.iter().copied().cycle().take(256 * 100).collect();

    for _ in 0..100 {
        let out = driver.render(&input);
        assert!(out.iter().all(|s| s.is_finite()));
    }

    let status = controller.status();
    assert_eq!(status.blocks_processed, 10_000);
    assert_eq!(status.underruns, 0);
    assert!(status.last_block_load < 1.0);
    assert!(
        !controller
            .events()
            .try_iter()
            .any(|e| matches!(e, EngineEvent::Underrun { .. }))
    );
}

#[test]
fn update_storm_fails_fast() {
    init_tracing();
    let chain = ChainDescription::new().with_node(NodeDescription::new(EffectType::Delay));
    let (_engine, controller) = Engine::with_chain(EngineConfig::default(), &chain).unwrap();
    let id = controller.node_ids()[0];

    let started_at = Instant::now();
    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..1000 {
        let value = (i % 100) as f32 / 100.0;
        if controller.enqueue_parameter_change(id, "mix", value).unwrap() {
            accepted += 1;
        } else {
            rejected += 1;
        }
    }
    assert_eq!(accepted, 256);
    assert_eq!(rejected, 744);
    assert!(started_at.elapsed() < Duration::from_secs(1));
    assert_eq!(controller.pending_updates(), 256);
}

#[test]
fn export_import_round_trip() {
    init_tracing();
    let chain = ChainDescription::new()
        .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 4.5))
        .with_node(
            NodeDescription::new(EffectType::Delay)
                .with_param("delay_seconds", 0.5)
                .with_param("tempo_sync", 1.0),
        )
        .with_node(NodeDescription::new(EffectType::Reverb).with_bypassed(true))
        .with_node(NodeDescription::new(EffectType::Distortion).with_param("level", 0.4));
    let (mut driver, controller) = started(EngineConfig::default(), &chain);

    let ids = controller.node_ids();
    controller.enqueue_parameter_change(ids[3], "drive_db", 22.0).unwrap();
    controller.enqueue_bypass(ids[2], false).unwrap();
    controller.reorder_effects(&[ids[3], ids[0], ids[1], ids[2]]).unwrap();
    driver.render_silence(1024);

    let saved = controller.export_state();
    assert_eq!(
        saved.effect_types(),
        vec![EffectType::Distortion, EffectType::Boost, EffectType::Delay, EffectType::Reverb]
    );

    let json = serde_json::to_string_pretty(&saved).unwrap();
    let parsed: ChainDescription = serde_json::from_str(&json).unwrap();

    let (mut other, other_controller) = started(EngineConfig::default(), &ChainDescription::new());
    assert!(other_controller.load_state(&parsed).unwrap());
    other.render_silence(256);
    assert_eq!(other_controller.export_state(), saved);
    assert_eq!(other.engine().chain_len(), 4);

    // Loading into the same engine replaces every node.
    assert!(controller.load_state(&saved).unwrap());
    assert_eq!(controller.export_state(), saved);
    assert!(controller.node_ids().iter().all(|id| !ids.contains(id)));
}

#[test]
fn bypass_resumes_internal_state() {
    init_tracing();
    let chain = ChainDescription::new().with_node(
        NodeDescription::new(EffectType::Delay)
            .with_param("delay_seconds", 0.05)
            .with_param("feedback", 0.5)
            .with_param("mix", 0.5),
    );
    let (mut toggled, controller) = started(EngineConfig::default(), &chain);
    let (mut reference, _reference_controller) = started(EngineConfig::default(), &chain);
    let id = controller.node_ids()[0];

    let head = impulse(1024);
    assert_eq!(toggled.render(&head), reference.render(&head));

    // Fade out. The effect still runs inside the crossfade window.
    controller.enqueue_bypass(id, true).unwrap();
    toggled.render_silence(256);
    reference.render_silence(256);

    // Fully bypassed: the tail is silenced and the delay line frozen.
    let frozen = toggled.render_silence(256 * 20);
    assert!(frozen.iter().all(|&s| s == 0.0));

    controller.enqueue_bypass(id, false).unwrap();
    let resumed = toggled.render_silence(256 * 30);
    let uninterrupted = reference.render_silence(256 * 30);

    assert_eq!(resumed[256..], uninterrupted[256..]);
    assert!(peak(&resumed[256..]) > 0.01, "echo tail lost on re-enable");
}

#[test]
fn parameter_change_converges_within_ramp() {
    init_tracing();
    let config = EngineConfig::default();
    let chain = ChainDescription::new().with_node(NodeDescription::new(EffectType::Boost));
    let (mut driver, controller) = started(config.clone(), &chain);
    let id = controller.node_ids()[0];
    driver.render(&vec![0.1; 256]);

    controller.enqueue_parameter_change(id, "gain_db", 12.0).unwrap();
    let out = driver.render(&vec![0.1; 1024]);

    let expected = 0.1 * tonechain_core::db_to_linear(12.0);
    let ramp = config.ramp_samples() as usize;
    // Rising monotonically across the window, then steady.
    assert!(out.windows(2).take(ramp).all(|w| w[1] >= w[0] - 1e-6));
    assert!(out[ramp + 8..].iter().all(|s| (s - expected).abs() < 1e-4));
    assert!(out.iter().all(|&s| s <= expected + 1e-4));
}

#[test]
fn validation_errors_are_synchronous() {
    init_tracing();
    let chain = ChainDescription::new().with_node(NodeDescription::new(EffectType::Boost));
    let (_engine, controller) = Engine::with_chain(EngineConfig::default(), &chain).unwrap();
    let id = controller.node_ids()[0];

    assert!(matches!(
        controller.enqueue_parameter_change(id, "gain_db", 100.0),
        Err(ControlError::ParameterOutOfRange { .. })
    ));
    for _ in 0..7 {
        controller.add_effect(EffectType::Reverb).unwrap();
    }
    assert!(matches!(
        controller.add_effect(EffectType::Reverb),
        Err(ControlError::ChainTooLong { .. })
    ));
    assert_eq!(controller.len(), 8);
}

#[test]
fn lifecycle_events_in_order() {
    init_tracing();
    let (mut driver, controller) = started(EngineConfig::default(), &ChainDescription::new());
    driver.render_silence(256);
    controller.stop().unwrap();
    let out = driver.render(&[0.5; 256]);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(controller.state(), EngineState::Stopped);

    let changes: Vec<_> = controller
        .events()
        .try_iter()
        .filter_map(|e| match e {
            EngineEvent::StateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (EngineState::Stopped, EngineState::Starting),
            (EngineState::Starting, EngineState::Running),
            (EngineState::Running, EngineState::Draining),
            (EngineState::Draining, EngineState::Stopped),
        ]
    );
    assert_eq!(controller.log_events(), 0);
}

#[test]
fn faulted_engine_is_silent_until_restarted() {
    init_tracing();
    let chain = ChainDescription::new().with_node(NodeDescription::new(EffectType::Boost));
    let (mut driver, controller) = started(EngineConfig::default(), &chain);
    driver.render(&[0.2; 256]);

    assert!(controller.report_device_fault(FaultReason::Disconnected));
    assert!(driver.render(&[0.2; 256]).iter().all(|&s| s == 0.0));
    assert!(controller.log_events() >= 3);

    controller.clear_fault().unwrap();
    controller.start().unwrap();
    let out = driver.render(&[0.2; 256]);
    assert!((out[255] - 0.2).abs() < 1e-6);
}

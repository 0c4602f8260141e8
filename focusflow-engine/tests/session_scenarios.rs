use focusflow_engine::{
    AudioContext, ContextState, EngineError, EngineSettings, OfflineHost, ParameterController,
    PlaybackState, ResumeBehavior, Session, StartProgress, ToneParameters,
};

const SR: f32 = 8_000.0;

fn session(host: OfflineHost) -> Session<OfflineHost> {
    Session::new(host, EngineSettings::default())
}

fn peak(frames: &[[f32; 2]], ch: usize) -> f32 {
    frames.iter().map(|f| f[ch].abs()).fold(0.0, f32::max)
}

#[test]
fn default_session_plays_432_and_467() {
    let mut s = session(OfflineHost::new(SR));
    assert_eq!(s.start().unwrap(), StartProgress::Running);
    assert_eq!(s.left_frequency(), Some(432.0));
    assert_eq!(s.right_frequency(), Some(467.0));
    assert!((s.master_gain().unwrap() - 0.1681).abs() < 1e-4);

    let ctx = s.context_mut().unwrap();
    ctx.render(64);
    let r = ctx.attached().unwrap();
    assert_eq!(r.voice_frequency(0), Some(432.0));
    assert_eq!(r.voice_frequency(1), Some(467.0));
}

#[test]
fn live_base_change_retunes_both_ears() {
    let mut s = session(OfflineHost::new(SR));
    s.start().unwrap();
    s.context_mut().unwrap().render(800);

    let mut p = s.parameters();
    p.base_frequency_hz = 500.0;
    s.update_parameters(p);
    assert_eq!(s.left_frequency(), Some(500.0));
    assert_eq!(s.right_frequency(), Some(535.0));
    assert_eq!(s.episodes(), 1);

    let ctx = s.context_mut().unwrap();
    ctx.render(1);
    let r = ctx.attached().unwrap();
    assert_eq!(r.voice_frequency(0), Some(500.0));
    assert_eq!(r.voice_frequency(1), Some(535.0));
}

#[test]
fn controller_clamps_before_reaching_the_graph() {
    let mut s = session(OfflineHost::new(SR));
    s.start().unwrap();
    let mut ctl = ParameterController::new(&mut s, ToneParameters::default());
    assert_eq!(ctl.set_base_frequency(1_000.0), 800.0);
    assert_eq!(ctl.set_beat_frequency(40.0), 40.0);
    assert_eq!(ctl.set_volume(-5.0), 0.0);
    drop(ctl);
    assert_eq!(s.left_frequency(), Some(800.0));
    assert_eq!(s.right_frequency(), Some(840.0));
    assert_eq!(s.master_gain(), Some(0.0));
}

#[test]
fn stop_then_start_rebuilds_the_same_wiring() {
    let mut s = session(OfflineHost::new(SR));
    s.start().unwrap();
    s.stop();
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert!(!s.has_graph());

    s.start().unwrap();
    assert_eq!(s.episodes(), 2);
    assert_eq!(s.host().opened(), 1);
    assert_eq!(s.left_frequency(), Some(432.0));
    assert_eq!(s.right_frequency(), Some(467.0));
}

#[test]
fn stop_is_idempotent_and_updates_while_stopped_are_kept() {
    let mut s = session(OfflineHost::new(SR));
    s.stop();
    s.stop();
    assert_eq!(s.state(), PlaybackState::Stopped);

    s.update_parameters(ToneParameters { base_frequency_hz: 300.0, beat_frequency_hz: 10.0, volume_percent: 50.0 });
    assert!(!s.has_graph());
    assert!(s.context().is_none());

    s.start().unwrap();
    assert_eq!(s.left_frequency(), Some(300.0));
    assert_eq!(s.right_frequency(), Some(310.0));
    assert!((s.master_gain().unwrap() - 0.25).abs() < 1e-6);
}

#[test]
fn refused_resume_leaves_no_graph() {
    let host = OfflineHost::new(SR).suspended().with_resume(ResumeBehavior::Refuse);
    let mut s = session(host);
    assert_eq!(s.start(), Err(EngineError::DeviceSuspended));
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert!(!s.has_graph());
    assert_eq!(s.context().map(|c| c.state()), Some(ContextState::Suspended));
}

#[test]
fn stop_during_pending_resume_cancels_the_start() {
    let host = OfflineHost::new(SR).suspended().with_resume(ResumeBehavior::Defer);
    let mut s = session(host);
    let StartProgress::AwaitingResume(ticket) = s.start().unwrap() else {
        panic!("expected a pending resume");
    };
    assert_eq!(s.state(), PlaybackState::Starting);

    s.stop();
    s.context_mut().unwrap().complete_resume(true);
    assert_eq!(s.resume_settled(ticket).unwrap(), PlaybackState::Stopped);
    assert!(!s.has_graph());
    assert_eq!(s.episodes(), 0);
}

#[test]
fn toggle_alternates() {
    let mut s = session(OfflineHost::new(SR));
    assert_eq!(s.toggle().unwrap(), PlaybackState::Running);
    assert_eq!(s.toggle().unwrap(), PlaybackState::Stopped);
    assert_eq!(s.toggle().unwrap(), PlaybackState::Running);
    assert_eq!(s.episodes(), 2);
}

#[test]
fn toggle_during_pending_resume_leaves_nothing_running() {
    let mut s = session(OfflineHost::new(SR).suspended().with_resume(ResumeBehavior::Defer));
    assert_eq!(s.toggle().unwrap(), PlaybackState::Starting);
    assert_eq!(s.toggle().unwrap(), PlaybackState::Stopped);
    let ctx = s.context_mut().unwrap();
    ctx.complete_resume(true);
    assert!(ctx.render(256).iter().all(|f| *f == [0.0, 0.0]));
    assert!(!s.has_graph());
    assert_eq!(s.state(), PlaybackState::Stopped);
}

#[test]
fn restart_while_running_swaps_in_one_fresh_graph() {
    let host = OfflineHost::new(SR);
    let mut s = session(host.clone());
    s.start().unwrap();
    s.context_mut().unwrap().render(400);
    assert_eq!(s.start().unwrap(), StartProgress::Running);
    assert_eq!(s.episodes(), 2);
    assert_eq!(host.live_graphs(), 1);

    let frames = s.context_mut().unwrap().render(2_000);
    assert!(peak(&frames, 0) > 0.15 && peak(&frames, 1) > 0.15);
    assert!(peak(&frames, 0) <= 0.1682 && peak(&frames, 1) <= 0.1682);
}

#[test]
fn volume_sweep_follows_squared_gain_law() {
    let mut s = session(OfflineHost::new(SR));
    s.start().unwrap();
    let mut ctl = ParameterController::new(&mut s, ToneParameters::default());
    for v in 0..=100 {
        let expected = (v as f32 / 100.0).powi(2);
        assert_eq!(ctl.set_volume(v as f32), v as f32);
        let gain = ctl.sink().master_gain().unwrap();
        assert!((gain - expected).abs() < 1e-6, "volume {v}: gain {gain}");

        let ctx = ctl.sink_mut().context_mut().unwrap();
        ctx.render(1);
        let target = ctx.attached().unwrap().master_target();
        assert!((target - expected).abs() < 1e-6, "volume {v}: renderer {target}");
    }
}

#[test]
fn rendered_channels_are_distinct_and_silent_after_stop() {
    let mut s = session(OfflineHost::new(SR));
    s.start().unwrap();
    let frames = s.context_mut().unwrap().render(4_000);
    let tail = &frames[2_000..];

    assert!(tail.iter().any(|f| (f[0] - f[1]).abs() > 1e-3));
    for ch in 0..2 {
        let p = peak(tail, ch);
        assert!(p > 0.15 && p <= 0.1682, "channel {ch} peak {p}");
    }

    s.stop();
    let after = s.context_mut().unwrap().render(512);
    assert!(after.iter().all(|f| f[0] == 0.0 && f[1] == 0.0));
}

#[test]
fn unavailable_output_is_reported() {
    let mut s = session(OfflineHost::new(SR).unavailable());
    assert!(matches!(s.start(), Err(EngineError::AudioUnavailable(_))));
    assert_eq!(s.state(), PlaybackState::Stopped);
}

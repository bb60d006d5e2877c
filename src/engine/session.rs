// SessionPipeline - per-session detection tick loop
//
// One logical tick per invocation: the audio path is scored and gated every
// tick; raster sampling and motion scoring run at most once per motion
// interval; accepted candidates either raise an instant alert or spawn a
// single-flight remote verification. Ticks are strictly sequential — the
// loop only proceeds after the current tick's synchronous work completes —
// and verification never blocks the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::alert::{AlertCenter, INSTANT_MOTION_REASON, INSTANT_SOUND_REASON};
use crate::analysis::{peak_level, GateDecision, MotionEstimator, TriggerGate};
use crate::api::SignalLevels;
use crate::config::{GuardSettings, PipelineConfig};
use crate::engine::TimeSource;
use crate::error::{log_media_error, log_verify_error};
use crate::media::{MediaSource, RasterFrame};
use crate::telemetry::{unix_ms, MonitorEvent, MonitorEventKind};
use crate::verify::{SingleFlight, Verifier};

/// Session-scoped run state, reset whenever a session starts.
struct PipelineState {
    previous_frame: Option<RasterFrame>,
    last_motion_sample_ms: Option<u64>,
    /// Shared cooldown clock across both signal paths
    last_detection_ms: Option<u64>,
    motion_score: f32,
    audio_score: f32,
}

impl PipelineState {
    fn new() -> Self {
        Self {
            previous_frame: None,
            last_motion_sample_ms: None,
            last_detection_ms: None,
            motion_score: 0.0,
            audio_score: 0.0,
        }
    }
}

pub(crate) struct SessionPipeline {
    config: PipelineConfig,
    settings: Arc<RwLock<GuardSettings>>,
    source: Arc<dyn MediaSource>,
    verifier: Arc<dyn Verifier>,
    alerts: Arc<AlertCenter>,
    levels_tx: watch::Sender<SignalLevels>,
    telemetry_tx: broadcast::Sender<MonitorEvent>,
    motion: MotionEstimator,
    gate: TriggerGate,
    flight: SingleFlight,
    /// Generation this session was started under; completions from stale
    /// generations are discarded
    generation: u64,
    live_generation: Arc<AtomicU64>,
    state: PipelineState,
}

impl SessionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: PipelineConfig,
        settings: Arc<RwLock<GuardSettings>>,
        source: Arc<dyn MediaSource>,
        verifier: Arc<dyn Verifier>,
        alerts: Arc<AlertCenter>,
        levels_tx: watch::Sender<SignalLevels>,
        telemetry_tx: broadcast::Sender<MonitorEvent>,
        flight: SingleFlight,
        generation: u64,
        live_generation: Arc<AtomicU64>,
    ) -> Self {
        let motion = MotionEstimator::from_config(&config);
        let gate = TriggerGate::from_config(&config);
        Self {
            config,
            settings,
            source,
            verifier,
            alerts,
            levels_tx,
            telemetry_tx,
            motion,
            gate,
            flight,
            generation,
            live_generation,
            state: PipelineState::new(),
        }
    }

    /// Drive ticks until the stop signal fires.
    pub(crate) async fn run(
        mut self,
        mut stop_rx: watch::Receiver<bool>,
        time_source: Arc<dyn TimeSource>,
    ) {
        let started = time_source.now();
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));

        loop {
            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let now_ms = time_source
                        .now()
                        .saturating_duration_since(started)
                        .as_millis() as u64;
                    self.tick(now_ms);
                }
            }
        }

        tracing::debug!("[Session] Tick loop exited");
    }

    /// One pipeline tick at `now_ms` milliseconds since session start.
    pub(crate) fn tick(&mut self, now_ms: u64) {
        // Audio path: scored every tick.
        match self.source.capture_spectrum() {
            Ok(spectrum) => self.state.audio_score = peak_level(&spectrum),
            Err(err) => tracing::debug!("[Session] Spectrum capture failed: {}", err),
        }

        // Motion path: rate-limited to the motion interval. The gate only
        // sees a motion score on ticks where a fresh pair was scored.
        let fresh_motion = if self.motion_sample_due(now_ms) {
            self.state.last_motion_sample_ms = Some(now_ms);
            match self.source.capture_frame() {
                Ok(current) => {
                    let score = match &self.state.previous_frame {
                        Some(previous) => self.motion.score(previous, &current),
                        None => 0.0,
                    };
                    self.state.previous_frame = Some(current);
                    self.state.motion_score = score;
                    Some(score)
                }
                Err(err) => {
                    tracing::debug!("[Session] Frame capture failed: {}", err);
                    None
                }
            }
        } else {
            None
        };

        let _ = self.levels_tx.send(SignalLevels {
            motion_score: self.state.motion_score,
            audio_score: self.state.audio_score,
            timestamp_ms: now_ms,
        });

        let settings = self.settings.read().unwrap().clone();
        let decision = self.gate.evaluate(
            fresh_motion.unwrap_or(0.0),
            self.state.audio_score,
            now_ms,
            &settings,
            self.state.last_detection_ms,
        );

        match decision {
            GateDecision::None => {}
            GateDecision::MotionCandidate => {
                self.accept_candidate(INSTANT_MOTION_REASON, now_ms, &settings)
            }
            GateDecision::AudioCandidate => {
                self.accept_candidate(INSTANT_SOUND_REASON, now_ms, &settings)
            }
        }
    }

    fn motion_sample_due(&self, now_ms: u64) -> bool {
        match self.state.last_motion_sample_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.motion_interval_ms,
        }
    }

    /// A candidate crossed its threshold and survived the cooldown check.
    fn accept_candidate(&mut self, instant_reason: &str, now_ms: u64, settings: &GuardSettings) {
        if !settings.smart_guard {
            let snapshot = match self.capture_snapshot() {
                Some(jpeg) => jpeg,
                None => return,
            };
            // Acceptance arms the cooldown clock immediately.
            self.state.last_detection_ms = Some(now_ms);
            self.alerts
                .candidate_accepted(instant_reason, snapshot, unix_ms(), !settings.muted);
            self.emit(
                MonitorEventKind::AlertRaised {
                    reason: instant_reason.to_string(),
                },
                None,
            );
            return;
        }

        // Smart guard: the candidate only proceeds if no verification is
        // outstanding; otherwise it is dropped, not queued.
        let guard = match self.flight.try_begin() {
            Some(guard) => guard,
            None => {
                tracing::debug!("[Session] Verification in flight, dropping candidate");
                return;
            }
        };
        let snapshot = match self.capture_snapshot() {
            Some(jpeg) => jpeg,
            None => return, // guard drops here, releasing the slot
        };

        // Clock is armed before the verification outcome is known; this is
        // what serializes the verification pipeline.
        self.state.last_detection_ms = Some(now_ms);
        self.emit(MonitorEventKind::VerificationStarted, None);

        let outcome = self.verifier.verify(snapshot.clone());
        let alerts = Arc::clone(&self.alerts);
        let settings_handle = Arc::clone(&self.settings);
        let telemetry_tx = self.telemetry_tx.clone();
        let live_generation = Arc::clone(&self.live_generation);
        let generation = self.generation;

        tokio::spawn(async move {
            // The guard travels with the task so the in-flight flag clears
            // on every completion path.
            let _guard = guard;
            let outcome = outcome.await;

            if live_generation.load(Ordering::SeqCst) != generation {
                tracing::debug!("[Session] Discarding verification result from stopped session");
                return;
            }

            match outcome {
                Ok(verdict) => {
                    let audible = !settings_handle.read().unwrap().muted;
                    if let Some(event) =
                        alerts.verifier_confirmed(&verdict, snapshot, unix_ms(), audible)
                    {
                        let _ = telemetry_tx.send(MonitorEvent {
                            timestamp_ms: unix_ms(),
                            kind: MonitorEventKind::AlertRaised {
                                reason: event.reason,
                            },
                            detail: None,
                        });
                    }
                }
                Err(err) => {
                    log_verify_error(&err, "session verification");
                    let _ = telemetry_tx.send(MonitorEvent {
                        timestamp_ms: unix_ms(),
                        kind: MonitorEventKind::VerificationFailed,
                        detail: Some(err.to_string()),
                    });
                }
            }
        });
    }

    /// Capture a fresh frame and encode it for the event record.
    fn capture_snapshot(&self) -> Option<Vec<u8>> {
        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log_media_error(&err, "snapshot capture");
                return None;
            }
        };
        match frame.to_jpeg(self.config.snapshot_jpeg_quality) {
            Ok(jpeg) => Some(jpeg),
            Err(err) => {
                log_media_error(&err, "snapshot encoding");
                None
            }
        }
    }

    fn emit(&self, kind: MonitorEventKind, detail: Option<String>) {
        let _ = self.telemetry_tx.send(MonitorEvent {
            timestamp_ms: unix_ms(),
            kind,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertNotice;
    use crate::api::AlarmState;
    use crate::error::VerifyError;
    use crate::managers::ChannelManager;
    use crate::media::SyntheticMediaSource;
    use crate::verify::StubVerifier;

    struct Harness {
        pipeline: SessionPipeline,
        source: Arc<SyntheticMediaSource>,
        alerts: Arc<AlertCenter>,
        flight: SingleFlight,
        live_generation: Arc<AtomicU64>,
        channels: ChannelManager,
    }

    fn harness_with(verifier: Arc<dyn Verifier>, settings: GuardSettings) -> Harness {
        let channels = ChannelManager::new();
        let source = Arc::new(SyntheticMediaSource::new(32, 32));
        source.start().unwrap();
        let alerts = Arc::new(AlertCenter::new(50, channels.alerts_sender()));
        let flight = SingleFlight::new();
        let live_generation = Arc::new(AtomicU64::new(1));

        let pipeline = SessionPipeline::new(
            PipelineConfig::default(),
            Arc::new(RwLock::new(settings)),
            Arc::clone(&source) as Arc<dyn MediaSource>,
            verifier,
            Arc::clone(&alerts),
            channels.levels_sender(),
            channels.telemetry_sender(),
            flight.clone(),
            1,
            Arc::clone(&live_generation),
        );

        Harness {
            pipeline,
            source,
            alerts,
            flight,
            live_generation,
            channels,
        }
    }

    fn sensitive_settings(smart_guard: bool) -> GuardSettings {
        GuardSettings {
            motion_sensitivity: 90,
            audio_sensitivity: 90,
            smart_guard,
            muted: false,
        }
    }

    async fn await_flight_drain(flight: &SingleFlight) {
        for _ in 0..100 {
            if !flight.is_in_flight() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("verification never completed");
    }

    #[tokio::test]
    async fn test_instant_motion_alert_fires_once_per_cooldown() {
        let verifier = Arc::new(StubVerifier::with_verdict(true, "unused"));
        let mut h = harness_with(verifier, sensitive_settings(false));
        h.source.set_motion(0.8);

        // First tick establishes the baseline raster; no previous, no alert.
        h.pipeline.tick(0);
        assert_eq!(h.alerts.log_len(), 0);

        // Second motion sample differs from the baseline: instant alert.
        h.pipeline.tick(100);
        assert_eq!(h.alerts.log_len(), 1);
        assert_eq!(h.alerts.alarm_state(), AlarmState::Alerting);
        assert_eq!(h.alerts.events()[0].reason, INSTANT_MOTION_REASON);

        // Inside the 300ms cooldown window: rejected.
        h.pipeline.tick(200);
        h.pipeline.tick(300);
        assert_eq!(h.alerts.log_len(), 1);

        // Past the window: accepted again.
        h.pipeline.tick(401);
        assert_eq!(h.alerts.log_len(), 2);
    }

    #[tokio::test]
    async fn test_instant_sound_alert_uses_sound_reason() {
        let verifier = Arc::new(StubVerifier::with_verdict(true, "unused"));
        let mut h = harness_with(verifier, sensitive_settings(false));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);

        assert_eq!(h.alerts.log_len(), 1);
        assert_eq!(h.alerts.events()[0].reason, INSTANT_SOUND_REASON);
        // Snapshot is attached even for sound alerts.
        assert!(!h.alerts.events()[0].image_jpeg.is_empty());
    }

    #[tokio::test]
    async fn test_motion_scoring_respects_cadence() {
        let verifier = Arc::new(StubVerifier::with_verdict(true, "unused"));
        let mut h = harness_with(verifier, sensitive_settings(false));
        h.source.set_motion(0.8);

        h.pipeline.tick(0);
        // 50ms later: below the 100ms motion interval, no fresh score.
        h.pipeline.tick(50);
        assert_eq!(h.alerts.log_len(), 0);

        h.pipeline.tick(150);
        assert_eq!(h.alerts.log_len(), 1);
    }

    #[tokio::test]
    async fn test_smart_guard_positive_verdict_logs_verifier_reason() {
        let stub = StubVerifier::with_verdict(true, "person crossing the room");
        let calls = stub.call_counter();
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        await_flight_drain(&h.flight).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.alerts.log_len(), 1);
        assert_eq!(h.alerts.events()[0].reason, "person crossing the room");
        assert!(h.alerts.is_alerting());
    }

    #[tokio::test]
    async fn test_smart_guard_negative_verdict_is_silent() {
        let stub = StubVerifier::with_verdict(false, "nothing there");
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        await_flight_drain(&h.flight).await;

        assert_eq!(h.alerts.log_len(), 0);
        assert_eq!(h.alerts.alarm_state(), AlarmState::Idle);
    }

    #[tokio::test]
    async fn test_verification_failure_degrades_to_no_alert() {
        let stub = StubVerifier::with_error(VerifyError::Timeout);
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        let mut telemetry = h.channels.subscribe_telemetry();
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        await_flight_drain(&h.flight).await;

        assert_eq!(h.alerts.log_len(), 0);

        let mut saw_failure = false;
        while let Ok(event) = telemetry.try_recv() {
            if event.kind == MonitorEventKind::VerificationFailed {
                saw_failure = true;
            }
        }
        assert!(saw_failure, "expected a VerificationFailed telemetry event");
    }

    #[tokio::test]
    async fn test_single_flight_drops_second_candidate() {
        let stub = StubVerifier::with_verdict(true, "person").with_delay(Duration::from_millis(300));
        let calls = stub.call_counter();
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        // Well past the 1000ms guarded cooldown, but the first verification
        // is still in flight: the candidate is dropped, not queued.
        h.pipeline.tick(1500);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        await_flight_drain(&h.flight).await;
        assert_eq!(h.alerts.log_len(), 1);
    }

    #[tokio::test]
    async fn test_stale_generation_verdict_is_discarded() {
        let stub = StubVerifier::with_verdict(true, "person").with_delay(Duration::from_millis(100));
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        // Session stops while the verification is outstanding.
        h.live_generation.fetch_add(1, Ordering::SeqCst);
        await_flight_drain(&h.flight).await;

        assert_eq!(h.alerts.log_len(), 0);
        assert!(!h.alerts.is_alerting());
    }

    #[tokio::test]
    async fn test_guarded_cooldown_rejects_then_reverifies() {
        // smartGuard on: acceptance at t=0, rejection at t=500, acceptance
        // at t=1200 triggering the verifier again.
        let stub = StubVerifier::with_verdict(false, "nothing");
        let calls = stub.call_counter();
        let mut h = harness_with(Arc::new(stub), sensitive_settings(true));
        h.source.set_tone(1.0);

        h.pipeline.tick(0);
        await_flight_drain(&h.flight).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        h.pipeline.tick(500);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "inside cooldown window");

        h.pipeline.tick(1200);
        await_flight_drain(&h.flight).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_levels_published_every_tick() {
        let verifier = Arc::new(StubVerifier::with_verdict(true, "unused"));
        let mut h = harness_with(verifier, sensitive_settings(false));
        let levels_rx = h.channels.watch_levels();
        h.source.set_tone(1.0);

        h.pipeline.tick(0);

        let levels = *levels_rx.borrow();
        assert!(levels.audio_score > 90.0);
        assert_eq!(levels.timestamp_ms, 0);
    }

    #[tokio::test]
    async fn test_muted_alert_is_inaudible() {
        let verifier = Arc::new(StubVerifier::with_verdict(true, "unused"));
        let mut settings = sensitive_settings(false);
        settings.muted = true;
        let mut h = harness_with(verifier, settings);
        let mut alerts_rx = h.channels.subscribe_alerts();
        h.source.set_tone(1.0);

        h.pipeline.tick(0);

        match alerts_rx.try_recv().unwrap() {
            AlertNotice::Raised { audible, .. } => assert!(!audible),
            other => panic!("Expected Raised, got {:?}", other),
        }
        // Muting never blocks the transition itself.
        assert!(h.alerts.is_alerting());
    }
}

//! MonitorHandle: reusable monitoring orchestration layer.
//!
//! Owns the injectable collaborators (media source, verifier, clock), the
//! alert state machine, and the fan-out channels, and exposes the session
//! lifecycle commands to the presentation layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::alert::{AlertCenter, AlertNotice, DetectionEvent};
use crate::api::{AlarmState, MonitorStatus, SignalLevels};
use crate::config::{GuardSettings, MonitorConfig};
use crate::engine::session::SessionPipeline;
use crate::engine::{SystemTimeSource, TimeSource};
use crate::error::MediaError;
use crate::managers::ChannelManager;
use crate::media::MediaSource;
use crate::telemetry::{unix_ms, MonitorEvent, MonitorEventKind};
use crate::verify::{RemoteVerifier, SingleFlight, Verifier};

/// Patch describing settings updates to apply to the engine.
///
/// Sensitivities outside 1..=99 are clamped on application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub motion_sensitivity: Option<u8>,
    #[serde(default)]
    pub audio_sensitivity: Option<u8>,
    #[serde(default)]
    pub smart_guard: Option<bool>,
    #[serde(default)]
    pub muted: Option<bool>,
}

struct SessionSlot {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// MonitorHandle orchestrates the detection pipeline and shared channels.
///
/// Session commands must be issued from within a Tokio runtime; the tick
/// loop runs as a spawned task for as long as the session is active.
pub struct MonitorHandle {
    config: MonitorConfig,
    settings: Arc<RwLock<GuardSettings>>,
    source: Arc<dyn MediaSource>,
    verifier: Arc<dyn Verifier>,
    alerts: Arc<AlertCenter>,
    channels: ChannelManager,
    flight: SingleFlight,
    live_generation: Arc<AtomicU64>,
    time_source: Arc<dyn TimeSource>,
    session: Mutex<Option<SessionSlot>>,
}

impl MonitorHandle {
    /// Create a handle wired to the remote verifier from the configuration.
    pub fn new(config: MonitorConfig, source: Arc<dyn MediaSource>) -> Self {
        let verifier = Arc::new(RemoteVerifier::new(config.verifier.clone()));
        Self::with_components(config, source, verifier, Arc::new(SystemTimeSource::default()))
    }

    /// Create a handle with every collaborator injected.
    pub fn with_components(
        config: MonitorConfig,
        source: Arc<dyn MediaSource>,
        verifier: Arc<dyn Verifier>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let channels = ChannelManager::new();
        let alerts = Arc::new(AlertCenter::new(
            config.events.capacity,
            channels.alerts_sender(),
        ));

        Self {
            config,
            settings: Arc::new(RwLock::new(GuardSettings::default())),
            source,
            verifier,
            alerts,
            channels,
            flight: SingleFlight::new(),
            live_generation: Arc::new(AtomicU64::new(0)),
            time_source,
            session: Mutex::new(None),
        }
    }

    // ========================================================================
    // SESSION LIFECYCLE
    // ========================================================================

    /// Acquire the media source and start the tick loop.
    ///
    /// On acquisition failure no pipeline state is created and the engine
    /// stays stopped.
    pub fn start_session(&self) -> Result<(), MediaError> {
        let mut slot = self.session.lock().unwrap();
        if slot.is_some() {
            return Err(MediaError::AlreadyRunning);
        }

        self.source.start()?;

        let generation = self.live_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop_tx, stop_rx) = watch::channel(false);

        let pipeline = SessionPipeline::new(
            self.config.pipeline.clone(),
            Arc::clone(&self.settings),
            Arc::clone(&self.source),
            Arc::clone(&self.verifier),
            Arc::clone(&self.alerts),
            self.channels.levels_sender(),
            self.channels.telemetry_sender(),
            self.flight.clone(),
            generation,
            Arc::clone(&self.live_generation),
        );

        let time_source = Arc::clone(&self.time_source);
        let join = tokio::spawn(pipeline.run(stop_rx, time_source));

        *slot = Some(SessionSlot { stop_tx, join });
        drop(slot);

        log::info!("[Monitor] Session started");
        self.emit(MonitorEventKind::SessionStarted, None);
        Ok(())
    }

    /// Stop the tick loop and release the media source.
    ///
    /// Waits for the current tick to finish so run state is deterministically
    /// cleared on return. The event log persists across stop/start; an
    /// in-flight verification is not cancelled but its result is discarded.
    pub async fn stop_session(&self) -> Result<(), MediaError> {
        let slot = self
            .session
            .lock()
            .unwrap()
            .take()
            .ok_or(MediaError::NotRunning)?;

        // Cancel the next scheduled tick and wait for the loop to exit.
        let _ = slot.stop_tx.send(true);
        let _ = slot.join.await;

        // Invalidate any outstanding verification before resetting state.
        self.live_generation.fetch_add(1, Ordering::SeqCst);
        self.alerts.session_stop();
        let _ = self.channels.levels_sender().send(SignalLevels::default());

        let stopped = self.source.stop();

        log::info!("[Monitor] Session stopped");
        self.emit(MonitorEventKind::SessionStopped, None);
        stopped
    }

    pub fn is_session_active(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    // ========================================================================
    // ALERT COMMANDS
    // ========================================================================

    /// Clear the live alarm. History is untouched.
    pub fn dismiss(&self) {
        self.alerts.dismiss();
        self.emit(MonitorEventKind::AlertDismissed, None);
    }

    /// Drop all logged detection events.
    pub fn clear_log(&self) {
        self.alerts.clear_log();
        self.emit(MonitorEventKind::LogCleared, None);
    }

    /// Logged detection events, newest first.
    pub fn events(&self) -> Vec<DetectionEvent> {
        self.alerts.events()
    }

    // ========================================================================
    // SETTINGS
    // ========================================================================

    /// Apply a settings patch, clamping sensitivities into range.
    pub fn apply_settings(&self, patch: SettingsPatch) {
        {
            let mut settings = self.settings.write().unwrap();
            if let Some(value) = patch.motion_sensitivity {
                settings.motion_sensitivity = GuardSettings::clamp_sensitivity(value);
            }
            if let Some(value) = patch.audio_sensitivity {
                settings.audio_sensitivity = GuardSettings::clamp_sensitivity(value);
            }
            if let Some(value) = patch.smart_guard {
                settings.smart_guard = value;
            }
            if let Some(value) = patch.muted {
                settings.muted = value;
            }
            log::debug!("[Monitor] Settings updated: {:?}", *settings);
        }
        self.emit(MonitorEventKind::SettingsChanged, None);
    }

    pub fn settings(&self) -> GuardSettings {
        self.settings.read().unwrap().clone()
    }

    // ========================================================================
    // READOUTS
    // ========================================================================

    /// Point-in-time snapshot of the engine for the presentation layer.
    pub fn status(&self) -> MonitorStatus {
        let levels = self.channels.current_levels();
        let alarm = self.alerts.alarm_state();
        let muted = self.settings.read().unwrap().muted;
        MonitorStatus {
            session_active: self.is_session_active(),
            motion_score: levels.motion_score,
            audio_score: levels.audio_score,
            alarm,
            alarm_audible: alarm == AlarmState::Alerting && !muted,
            verification_in_flight: self.flight.is_in_flight(),
            logged_events: self.alerts.log_len(),
        }
    }

    /// Watch the latest signal levels.
    pub fn watch_levels(&self) -> watch::Receiver<SignalLevels> {
        self.channels.watch_levels()
    }

    /// Subscribe to alert raise/dismiss notifications.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertNotice> {
        self.channels.subscribe_alerts()
    }

    /// Alert notifications as a `Stream`, for presentation event loops.
    pub fn alert_stream(&self) -> BroadcastStream<AlertNotice> {
        BroadcastStream::new(self.channels.subscribe_alerts())
    }

    /// Subscribe to telemetry events.
    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<MonitorEvent> {
        self.channels.subscribe_telemetry()
    }

    fn emit(&self, kind: MonitorEventKind, detail: Option<String>) {
        let _ = self.channels.telemetry_sender().send(MonitorEvent {
            timestamp_ms: unix_ms(),
            kind,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SyntheticMediaSource;
    use crate::verify::StubVerifier;

    fn test_handle() -> (MonitorHandle, Arc<SyntheticMediaSource>) {
        let source = Arc::new(SyntheticMediaSource::new(16, 16));
        let handle = MonitorHandle::with_components(
            MonitorConfig::default(),
            Arc::clone(&source) as Arc<dyn MediaSource>,
            Arc::new(StubVerifier::with_verdict(false, "nothing")),
            Arc::new(SystemTimeSource::default()),
        );
        (handle, source)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (handle, _source) = test_handle();
        assert!(!handle.is_session_active());

        handle.start_session().unwrap();
        assert!(handle.is_session_active());

        // Double start is rejected.
        assert!(matches!(
            handle.start_session(),
            Err(MediaError::AlreadyRunning)
        ));

        handle.stop_session().await.unwrap();
        assert!(!handle.is_session_active());

        // Double stop is rejected.
        assert!(matches!(
            handle.stop_session().await,
            Err(MediaError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (handle, _source) = test_handle();
        handle.start_session().unwrap();
        handle.stop_session().await.unwrap();
        handle.start_session().unwrap();
        assert!(handle.is_session_active());
        handle.stop_session().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_resets_levels() {
        let (handle, source) = test_handle();
        source.set_tone(1.0);
        handle.start_session().unwrap();

        let mut levels_rx = handle.watch_levels();
        // Wait for at least one tick to publish a non-zero audio score.
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                levels_rx.changed().await.unwrap();
                if levels_rx.borrow().audio_score > 0.0 {
                    break;
                }
            }
        })
        .await
        .expect("levels never became non-zero");

        handle.stop_session().await.unwrap();
        assert_eq!(handle.status().audio_score, 0.0);
        assert_eq!(handle.status().motion_score, 0.0);
    }

    #[test]
    fn test_settings_patch_clamps() {
        let source = Arc::new(SyntheticMediaSource::new(16, 16));
        let handle = MonitorHandle::with_components(
            MonitorConfig::default(),
            source,
            Arc::new(StubVerifier::with_verdict(false, "nothing")),
            Arc::new(SystemTimeSource::default()),
        );

        handle.apply_settings(SettingsPatch {
            motion_sensitivity: Some(0),
            audio_sensitivity: Some(200),
            smart_guard: Some(true),
            muted: Some(true),
        });

        let settings = handle.settings();
        assert_eq!(settings.motion_sensitivity, 1);
        assert_eq!(settings.audio_sensitivity, 99);
        assert!(settings.smart_guard);
        assert!(settings.muted);

        // Partial patch leaves other fields alone.
        handle.apply_settings(SettingsPatch {
            muted: Some(false),
            ..Default::default()
        });
        let settings = handle.settings();
        assert!(!settings.muted);
        assert!(settings.smart_guard);
    }

    #[test]
    fn test_status_defaults() {
        let (handle, _source) = test_handle();
        let status = handle.status();

        assert!(!status.session_active);
        assert_eq!(status.alarm, AlarmState::Idle);
        assert!(!status.alarm_audible);
        assert!(!status.verification_in_flight);
        assert_eq!(status.logged_events, 0);
    }
}

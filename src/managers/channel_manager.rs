// ChannelManager: Centralized tokio channel management
// Single Responsibility: channel lifecycle and subscription

use tokio::sync::{broadcast, watch};

use crate::alert::AlertNotice;
use crate::api::SignalLevels;
use crate::telemetry::MonitorEvent;

/// Manages the engine's fan-out channels
///
/// Single Responsibility: channel lifecycle and subscription
///
/// # Channel Types
/// - Alerts: broadcast of raise/dismiss notifications (100-message buffer)
/// - Telemetry: broadcast of lifecycle/diagnostic events (128-message buffer)
/// - Levels: watch channel carrying the latest signal levels; subscribers
///   always see the most recent tick and never a backlog
pub struct ChannelManager {
    alerts_tx: broadcast::Sender<AlertNotice>,
    telemetry_tx: broadcast::Sender<MonitorEvent>,
    levels_tx: watch::Sender<SignalLevels>,
    // Held so the watch channel never closes while the manager lives
    levels_rx: watch::Receiver<SignalLevels>,
}

impl ChannelManager {
    pub fn new() -> Self {
        let (alerts_tx, _) = broadcast::channel(100);
        let (telemetry_tx, _) = broadcast::channel(128);
        let (levels_tx, levels_rx) = watch::channel(SignalLevels::default());
        Self {
            alerts_tx,
            telemetry_tx,
            levels_tx,
            levels_rx,
        }
    }

    /// Sender used by the alert state machine to publish notices.
    pub(crate) fn alerts_sender(&self) -> broadcast::Sender<AlertNotice> {
        self.alerts_tx.clone()
    }

    /// Subscribe to alert raise/dismiss notifications.
    ///
    /// Each subscriber gets an independent receiver; lagged subscribers
    /// drop the oldest messages.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertNotice> {
        self.alerts_tx.subscribe()
    }

    /// Sender used by the engine to publish telemetry.
    pub(crate) fn telemetry_sender(&self) -> broadcast::Sender<MonitorEvent> {
        self.telemetry_tx.clone()
    }

    /// Subscribe to telemetry events.
    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<MonitorEvent> {
        self.telemetry_tx.subscribe()
    }

    /// Sender used by the tick loop to publish the latest levels.
    pub(crate) fn levels_sender(&self) -> watch::Sender<SignalLevels> {
        self.levels_tx.clone()
    }

    /// Watch the latest signal levels.
    pub fn watch_levels(&self) -> watch::Receiver<SignalLevels> {
        self.levels_rx.clone()
    }

    /// Latest published levels, without subscribing.
    pub fn current_levels(&self) -> SignalLevels {
        *self.levels_rx.borrow()
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

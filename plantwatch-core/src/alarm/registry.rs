//! Alarm registry
//!
//! Owns the active set, the history ring and the per-id configuration, and
//! reports every raise and clear to the host through a [`FrameSink`].

use heapless::Vec;
use plantwatch_protocol::payloads::MESSAGE_CAPACITY;
use plantwatch_protocol::{AlarmNotification, Payload};

use super::config::AlarmConfigTable;
use super::history::AlarmHistory;
use super::types::{
    AlarmError, AlarmHistoryEntry, AlarmMessage, AlarmRecord, AlarmState, Category,
    HistoryAction, Indication, LedPattern, RaiseOutcome, Severity,
};
use crate::traits::FrameSink;

/// Maximum simultaneously active alarms
pub const MAX_ACTIVE_ALARMS: usize = 20;

/// History ring capacity
pub const ALARM_HISTORY_SIZE: usize = 100;

/// Alarm registry bound to a notification sink
pub struct AlarmRegistry<S: FrameSink> {
    active: Vec<AlarmRecord, MAX_ACTIVE_ALARMS>,
    history: AlarmHistory<ALARM_HISTORY_SIZE>,
    config: AlarmConfigTable,
    sink: S,
    now_s: u32,
    /// Notifications the sink refused
    notify_failures: u32,
}

impl<S: FrameSink> AlarmRegistry<S> {
    pub fn new(sink: S) -> Self {
        Self {
            active: Vec::new(),
            history: AlarmHistory::new(),
            config: AlarmConfigTable::new(),
            sink,
            now_s: 0,
            notify_failures: 0,
        }
    }

    /// Advance the registry clock
    pub fn update_time(&mut self, now_ms: u64) {
        self.now_s = (now_ms / 1000).min(u32::MAX as u64) as u32;
    }

    /// Current registry time in seconds
    pub fn now_s(&self) -> u32 {
        self.now_s
    }

    /// Raise an alarm
    ///
    /// Raising an id that is already active changes nothing. The registry does
    /// not consult the enabled flag; producers check [`Self::config`] first.
    pub fn raise(
        &mut self,
        id: u32,
        severity: Severity,
        category: Category,
        message: &str,
    ) -> Result<RaiseOutcome, AlarmError> {
        if self.is_active(id) {
            return Ok(RaiseOutcome::AlreadyActive);
        }

        if message.len() > MESSAGE_CAPACITY {
            return Err(AlarmError::MessageTooLong);
        }
        let text = AlarmMessage::try_from(message).map_err(|_| AlarmError::InvalidMessage)?;

        let record = AlarmRecord {
            id,
            severity,
            category,
            state: AlarmState::Active,
            raised_at_s: self.now_s,
            acknowledged_by: None,
            acknowledged_at_s: None,
            message: text,
        };
        if self.active.push(record).is_err() {
            warn!("alarm {=u32} dropped: active set full", id);
            return Err(AlarmError::CapacityExceeded);
        }

        info!("alarm {=u32} raised ({}): {=str}", id, severity, message);
        self.record(id, severity, HistoryAction::Raised);
        self.notify(id);
        Ok(RaiseOutcome::Raised)
    }

    /// Acknowledge an active alarm on behalf of `actor`
    ///
    /// Returns false if the alarm is not active or already acknowledged.
    pub fn acknowledge(&mut self, id: u32, actor: u8) -> bool {
        let now_s = self.now_s;
        let Some(record) = self
            .active
            .iter_mut()
            .find(|r| r.id == id && r.state == AlarmState::Active)
        else {
            return false;
        };

        record.state = AlarmState::Acknowledged;
        record.acknowledged_by = Some(actor);
        record.acknowledged_at_s = Some(now_s);
        let severity = record.severity;

        debug!("alarm {=u32} acknowledged by {=u8}", id, actor);
        self.record(id, severity, HistoryAction::Acknowledged);
        true
    }

    /// Clear an alarm whether or not it was acknowledged
    ///
    /// Returns false if the alarm was not present.
    pub fn clear(&mut self, id: u32) -> bool {
        let Some(index) = self.active.iter().position(|r| r.id == id) else {
            return false;
        };
        let mut record = self.active.remove(index);
        record.state = AlarmState::Cleared;

        info!("alarm {=u32} cleared", id);
        self.record(id, record.severity, HistoryAction::Cleared);
        self.send_notification(&record, false);
        true
    }

    /// Clear every active alarm in ascending id order
    pub fn clear_all(&mut self) {
        let mut ids: Vec<u32, MAX_ACTIVE_ALARMS> = self.active.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        for id in ids {
            self.clear(id);
        }
    }

    pub fn is_active(&self, id: u32) -> bool {
        self.active.iter().any(|r| r.id == id)
    }

    pub fn is_acknowledged(&self, id: u32) -> bool {
        self.active
            .iter()
            .any(|r| r.id == id && r.state == AlarmState::Acknowledged)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active alarms at Critical or Emergency severity
    pub fn critical_count(&self) -> usize {
        self.active
            .iter()
            .filter(|r| r.severity.is_critical())
            .count()
    }

    /// Copy of one active record
    pub fn get(&self, id: u32) -> Option<AlarmRecord> {
        self.active.iter().find(|r| r.id == id).cloned()
    }

    /// Copy of the active set
    pub fn snapshot_active(&self) -> Vec<AlarmRecord, MAX_ACTIVE_ALARMS> {
        self.active.clone()
    }

    /// Copy of the history, oldest first
    pub fn snapshot_history(&self) -> Vec<AlarmHistoryEntry, ALARM_HISTORY_SIZE> {
        self.history.snapshot()
    }

    pub fn history(&self) -> &AlarmHistory<ALARM_HISTORY_SIZE> {
        &self.history
    }

    /// Empty the history ring
    pub fn clear_history(&mut self) {
        info!("alarm history cleared");
        self.history.clear();
    }

    /// Seconds an alarm has been active, or 0 if it is not
    pub fn duration_s(&self, id: u32) -> u32 {
        self.active
            .iter()
            .find(|r| r.id == id)
            .map(|r| self.now_s.saturating_sub(r.raised_at_s))
            .unwrap_or(0)
    }

    /// LED patterns for the current active set
    pub fn indication(&self) -> Indication {
        let alarm = if self.critical_count() > 0 {
            LedPattern::Blink
        } else if !self.active.is_empty() {
            LedPattern::Solid
        } else {
            LedPattern::Off
        };
        let status = if self.active.is_empty() {
            LedPattern::Solid
        } else {
            LedPattern::Blink
        };
        Indication { alarm, status }
    }

    /// Re-send the notification for one active alarm
    ///
    /// Returns false if the alarm is not active.
    pub fn notify(&mut self, id: u32) -> bool {
        let Some(record) = self.get(id) else {
            return false;
        };
        self.send_notification(&record, true);
        true
    }

    /// Re-send notifications for the whole active set
    pub fn notify_all(&mut self) {
        for index in 0..self.active.len() {
            let record = self.active[index].clone();
            self.send_notification(&record, true);
        }
    }

    /// Notifications the sink refused since boot
    pub fn notify_failures(&self) -> u32 {
        self.notify_failures
    }

    pub fn config(&self) -> &AlarmConfigTable {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AlarmConfigTable {
        &mut self.config
    }

    pub fn get_enabled(&self, id: u32) -> bool {
        self.config.enabled(id)
    }

    pub fn get_severity(&self, id: u32) -> Severity {
        self.config.severity(id)
    }

    pub fn get_threshold(&self, id: u32) -> u32 {
        self.config.threshold(id)
    }

    pub fn set_enabled(&mut self, id: u32, enabled: bool) -> Result<(), AlarmError> {
        self.config.set_enabled(id, enabled)
    }

    pub fn set_severity(&mut self, id: u32, severity: Severity) -> Result<(), AlarmError> {
        self.config.set_severity(id, severity)
    }

    pub fn set_threshold(&mut self, id: u32, threshold: u32) -> Result<(), AlarmError> {
        self.config.set_threshold(id, threshold)
    }

    /// Transport shared with the rest of the supervisor
    pub fn sink(&mut self) -> &mut S {
        &mut self.sink
    }

    fn record(&mut self, id: u32, severity: Severity, action: HistoryAction) {
        self.history.push(AlarmHistoryEntry {
            alarm_id: id,
            severity,
            timestamp_s: self.now_s,
            action,
        });
    }

    fn send_notification(&mut self, record: &AlarmRecord, active: bool) {
        let notification = AlarmNotification {
            alarm_id: record.id,
            severity: record.severity.to_byte(),
            category: record.category.to_byte(),
            timestamp_s: if active { record.raised_at_s } else { self.now_s },
            active,
            message: record.message.clone(),
        };
        let sent = Payload::Alarm(notification)
            .to_frame()
            .map_err(|_| ())
            .and_then(|frame| self.sink.send(&frame).map_err(|_| ()));
        if sent.is_err() {
            self.notify_failures = self.notify_failures.saturating_add(1);
            warn!("alarm {=u32} notification not sent", record.id);
        }
    }
}

//! Safety monitor implementation
//!
//! Runs six independent checks once per interval and folds the number of
//! failures into a single plant-wide [`SafetyState`].

use core::fmt::Write;

use heapless::String;
use plantwatch_protocol::PowerModuleReading;

use super::limits::SafetyLimits;
use super::simulated::SimulatedPlant;
use crate::alarm::ids::{EMERGENCY_SHUTDOWN, SAFETY_CRITICAL, SAFETY_EMERGENCY};
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::{ControlError, FrameSink, ModuleControl};

/// Interval between full check passes
pub const SAFETY_CHECK_INTERVAL_MS: u64 = 1_000;
/// Interval between communication checks
pub const COMM_CHECK_INTERVAL_MS: u64 = 30_000;
/// Interval between system health checks
pub const HEALTH_CHECK_INTERVAL_MS: u64 = 60_000;
/// Silence on the host link that counts as a communication failure
pub const LINK_TIMEOUT_MS: u64 = 10_000;
/// Critical events tolerated before system health fails
pub const MAX_CRITICAL_EVENTS: u32 = 5;
/// Uptime after which simulated health faults may appear
pub const SIMULATED_AGING_S: u32 = 24 * 60 * 60;

/// Capacity of the last-warning buffer
pub const WARNING_CAPACITY: usize = 64;

/// Plant-wide safety level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyState {
    Normal,
    Warning,
    Critical,
    Emergency,
    /// Latched by an emergency shutdown until reset
    Shutdown,
}

impl SafetyState {
    /// Level for a number of failed checks
    pub fn from_failed_count(failed: u8) -> Self {
        match failed {
            0 => SafetyState::Normal,
            1..=2 => SafetyState::Warning,
            3..=4 => SafetyState::Critical,
            _ => SafetyState::Emergency,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            SafetyState::Normal => 0,
            SafetyState::Warning => 1,
            SafetyState::Critical => 2,
            SafetyState::Emergency => 3,
            SafetyState::Shutdown => 4,
        }
    }
}

/// The six checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Check {
    Voltage,
    Current,
    Temperature,
    Power,
    Communication,
    SystemHealth,
}

impl Check {
    /// Fixed text used when a warning does not fit its buffer
    pub fn label(self) -> &'static str {
        match self {
            Check::Voltage => "Voltage check failed",
            Check::Current => "Current check failed",
            Check::Temperature => "Temperature check failed",
            Check::Power => "Power check failed",
            Check::Communication => "Communication check failed",
            Check::SystemHealth => "System health check failed",
        }
    }
}

/// Outcome of one check pass (true = passed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyCheckResult {
    pub voltage_ok: bool,
    pub current_ok: bool,
    pub temperature_ok: bool,
    pub power_ok: bool,
    pub communication_ok: bool,
    pub system_health_ok: bool,
}

impl Default for SafetyCheckResult {
    fn default() -> Self {
        Self::ALL_OK
    }
}

impl SafetyCheckResult {
    pub const ALL_OK: Self = Self {
        voltage_ok: true,
        current_ok: true,
        temperature_ok: true,
        power_ok: true,
        communication_ok: true,
        system_health_ok: true,
    };

    pub fn get(&self, check: Check) -> bool {
        match check {
            Check::Voltage => self.voltage_ok,
            Check::Current => self.current_ok,
            Check::Temperature => self.temperature_ok,
            Check::Power => self.power_ok,
            Check::Communication => self.communication_ok,
            Check::SystemHealth => self.system_health_ok,
        }
    }

    /// Number of checks that failed (0-6)
    pub fn failed_count(&self) -> u8 {
        [
            self.voltage_ok,
            self.current_ok,
            self.temperature_ok,
            self.power_ok,
            self.communication_ok,
            self.system_health_ok,
        ]
        .iter()
        .filter(|ok| !**ok)
        .count() as u8
    }
}

/// Where the electrical checks get their numbers from
#[derive(Debug, Clone, Copy)]
pub enum InputSource<'a> {
    /// Latest readings from the rectifier modules
    Live(&'a [PowerModuleReading]),
    /// Internal simulated bus
    Simulated,
}

/// Safety monitor
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
    state: SafetyState,
    warning_count: u32,
    critical_count: u32,
    last: SafetyCheckResult,
    last_warning: String<WARNING_CAPACITY>,
    last_check_ms: Option<u64>,
    comm_due_ms: u64,
    health_due_ms: u64,
    last_frame_ms: u64,
    simulated: SimulatedPlant,
}

impl Default for SafetyMonitor {
    fn default() -> Self {
        Self::new(SafetyLimits::default())
    }
}

impl SafetyMonitor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self::with_simulation(limits, SimulatedPlant::default())
    }

    /// Monitor with a specific simulated plant (e.g. a fixed seed)
    pub fn with_simulation(limits: SafetyLimits, simulated: SimulatedPlant) -> Self {
        Self {
            limits,
            state: SafetyState::Normal,
            warning_count: 0,
            critical_count: 0,
            last: SafetyCheckResult::ALL_OK,
            last_warning: String::new(),
            last_check_ms: None,
            comm_due_ms: COMM_CHECK_INTERVAL_MS,
            health_due_ms: HEALTH_CHECK_INTERVAL_MS,
            last_frame_ms: 0,
            simulated,
        }
    }

    /// Run every check if the interval has elapsed
    ///
    /// Returns `None` when called before the next pass is due. While the
    /// state is Critical or Emergency the matching system alarm is held
    /// raised; it is cleared as soon as the state moves elsewhere.
    pub fn check_all<S: FrameSink>(
        &mut self,
        now_ms: u64,
        input: InputSource<'_>,
        registry: &mut AlarmRegistry<S>,
    ) -> Option<SafetyCheckResult> {
        if let Some(last) = self.last_check_ms {
            if now_ms.saturating_sub(last) < SAFETY_CHECK_INTERVAL_MS {
                return None;
            }
        }
        self.last_check_ms = Some(now_ms);

        let result = SafetyCheckResult {
            voltage_ok: self.check_voltage(input),
            current_ok: self.check_current(input),
            temperature_ok: self.check_temperature(input),
            power_ok: self.check_power(input),
            communication_ok: self.check_communication(now_ms, input),
            system_health_ok: self.check_system_health(now_ms, input),
        };
        self.last = result;

        if self.state != SafetyState::Shutdown {
            let next = SafetyState::from_failed_count(result.failed_count());
            if matches!(next, SafetyState::Critical | SafetyState::Emergency) {
                self.critical_count = self.critical_count.saturating_add(1);
            }
            if next != self.state {
                info!("safety state {} -> {}", self.state, next);
            }
            self.state = next;
            self.sync_alarms(registry);
        }

        Some(result)
    }

    /// Check every module voltage against the limits
    pub fn check_voltage(&mut self, input: InputSource<'_>) -> bool {
        match input {
            InputSource::Simulated => {
                let voltage = self.simulated.voltage_mv.advance().max(0) as u32;
                let ok = self.limits.voltage_ok(voltage);
                if !ok {
                    self.warn_fmt(
                        Check::Voltage,
                        format_args!("Voltage out of range: {} mV", voltage),
                    );
                }
                ok
            }
            InputSource::Live(modules) => {
                let limits = self.limits;
                match modules.iter().find(|m| !limits.voltage_ok(m.voltage_mv)) {
                    Some(m) => {
                        self.warn_fmt(
                            Check::Voltage,
                            format_args!(
                                "Module {} voltage unsafe: {} mV",
                                m.module_id, m.voltage_mv
                            ),
                        );
                        false
                    }
                    None => true,
                }
            }
        }
    }

    pub fn check_current(&mut self, input: InputSource<'_>) -> bool {
        let max = self.limits.current_max_ma();
        match input {
            InputSource::Simulated => {
                let current = self.simulated.current_ma.advance().max(0) as u32;
                let ok = current <= max;
                if !ok {
                    self.warn_fmt(
                        Check::Current,
                        format_args!("Current too high: {} mA", current),
                    );
                }
                ok
            }
            InputSource::Live(modules) => match modules.iter().find(|m| m.current_ma > max) {
                Some(m) => {
                    self.warn_fmt(
                        Check::Current,
                        format_args!("Module {} current unsafe: {} mA", m.module_id, m.current_ma),
                    );
                    false
                }
                None => true,
            },
        }
    }

    pub fn check_temperature(&mut self, input: InputSource<'_>) -> bool {
        let max = self.limits.temperature_max_c();
        match input {
            InputSource::Simulated => {
                let temperature = self.simulated.temperature_c.advance();
                let ok = temperature <= max as i32;
                if !ok {
                    self.warn_fmt(
                        Check::Temperature,
                        format_args!("Temperature too high: {} C", temperature),
                    );
                }
                ok
            }
            InputSource::Live(modules) => {
                match modules.iter().find(|m| m.temperature_c > max) {
                    Some(m) => {
                        self.warn_fmt(
                            Check::Temperature,
                            format_args!(
                                "Module {} temperature unsafe: {} C",
                                m.module_id, m.temperature_c
                            ),
                        );
                        false
                    }
                    None => true,
                }
            }
        }
    }

    pub fn check_power(&mut self, input: InputSource<'_>) -> bool {
        let max = self.limits.power_max_mw();
        match input {
            InputSource::Simulated => {
                let power = self.simulated.power_mw.advance().max(0) as u32;
                let ok = power <= max;
                if !ok {
                    self.warn_fmt(Check::Power, format_args!("Power too high: {} mW", power));
                }
                ok
            }
            InputSource::Live(modules) => match modules.iter().find(|m| m.power_mw > max) {
                Some(m) => {
                    self.warn_fmt(
                        Check::Power,
                        format_args!("Module {} power unsafe: {} mW", m.module_id, m.power_mw),
                    );
                    false
                }
                None => true,
            },
        }
    }

    /// Link health; runs every [`COMM_CHECK_INTERVAL_MS`]
    ///
    /// Between runs the previous result is reported.
    pub fn check_communication(&mut self, now_ms: u64, input: InputSource<'_>) -> bool {
        if now_ms < self.comm_due_ms {
            return self.last.communication_ok;
        }
        self.comm_due_ms = now_ms.saturating_add(COMM_CHECK_INTERVAL_MS);

        let ok = match input {
            InputSource::Simulated => !self.simulated.rng.chance(5),
            InputSource::Live(_) => now_ms.saturating_sub(self.last_frame_ms) <= LINK_TIMEOUT_MS,
        };
        if !ok {
            self.issue_warning(Check::Communication, "Communication fault detected");
        }
        ok
    }

    /// Controller health; runs every [`HEALTH_CHECK_INTERVAL_MS`]
    ///
    /// Between runs the previous result is reported.
    pub fn check_system_health(&mut self, now_ms: u64, input: InputSource<'_>) -> bool {
        if now_ms < self.health_due_ms {
            return self.last.system_health_ok;
        }
        self.health_due_ms = now_ms.saturating_add(HEALTH_CHECK_INTERVAL_MS);

        let mut ok = self.critical_count <= MAX_CRITICAL_EVENTS;
        if ok && matches!(input, InputSource::Simulated) && self.uptime_s(now_ms) > SIMULATED_AGING_S
        {
            ok = !self.simulated.rng.chance(10);
        }
        if !ok {
            self.issue_warning(Check::SystemHealth, "System health degraded");
        }
        ok
    }

    /// Note that a valid frame arrived from the host
    pub fn frame_received(&mut self, now_ms: u64) {
        self.last_frame_ms = now_ms;
    }

    /// Record a warning against `check`
    ///
    /// Bumps the warning counter and moves Normal to Warning straight away.
    pub fn issue_warning(&mut self, check: Check, message: &str) {
        self.last_warning.clear();
        if self.last_warning.push_str(message).is_err() {
            warn!("warning text too long for {}, storing label", check);
            self.store_label(check);
        }
        self.note_warning(check);
    }

    /// Latch Shutdown, switch every module off and raise the shutdown alarm
    pub fn emergency_shutdown<S: FrameSink, M: ModuleControl>(
        &mut self,
        registry: &mut AlarmRegistry<S>,
        modules: &mut M,
    ) {
        error!("emergency shutdown");
        self.state = SafetyState::Shutdown;
        modules.shutdown_all();

        let severity = registry.get_severity(EMERGENCY_SHUTDOWN);
        if let Err(e) = registry.raise(EMERGENCY_SHUTDOWN, severity, Category::System, "E_SHUTDOWN") {
            error!("shutdown alarm not raised: {}", e);
        }
        self.critical_count = self.critical_count.saturating_add(1);
    }

    /// Limit one module's output
    pub fn reduce_power<M: ModuleControl>(
        &mut self,
        modules: &mut M,
        module: u8,
        percent: u8,
    ) -> Result<(), ControlError> {
        warn!("reducing module {=u8} to {=u8}%", module, percent);
        modules.reduce_power(module, percent)
    }

    /// Switch one module off
    pub fn shutdown_module<M: ModuleControl>(
        &mut self,
        modules: &mut M,
        module: u8,
    ) -> Result<(), ControlError> {
        warn!("shutting down module {=u8}", module);
        modules.shutdown_module(module)
    }

    /// Back to Normal with zeroed counters; alarm history is untouched
    pub fn reset(&mut self) {
        info!("safety monitor reset");
        self.state = SafetyState::Normal;
        self.warning_count = 0;
        self.critical_count = 0;
        self.last = SafetyCheckResult::ALL_OK;
        self.last_warning.clear();
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    /// Normal or Warning
    pub fn is_safe(&self) -> bool {
        matches!(self.state, SafetyState::Normal | SafetyState::Warning)
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn critical_count(&self) -> u32 {
        self.critical_count
    }

    pub fn last_check_result(&self, check: Check) -> bool {
        self.last.get(check)
    }

    pub fn last_result(&self) -> SafetyCheckResult {
        self.last
    }

    pub fn last_warning(&self) -> &str {
        &self.last_warning
    }

    /// Failed checks in the last pass
    pub fn failed_checks(&self) -> u8 {
        self.last.failed_count()
    }

    pub fn uptime_s(&self, now_ms: u64) -> u32 {
        (now_ms / 1000).min(u32::MAX as u64) as u32
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn limits_mut(&mut self) -> &mut SafetyLimits {
        &mut self.limits
    }

    fn warn_fmt(&mut self, check: Check, args: core::fmt::Arguments<'_>) {
        self.last_warning.clear();
        if self.last_warning.write_fmt(args).is_err() {
            warn!("warning text too long for {}, storing label", check);
            self.store_label(check);
        }
        self.note_warning(check);
    }

    fn store_label(&mut self, check: Check) {
        self.last_warning.clear();
        // Labels are shorter than the buffer
        let _ = self.last_warning.push_str(check.label());
    }

    fn note_warning(&mut self, check: Check) {
        warn!("safety warning ({}): {=str}", check, self.last_warning.as_str());
        self.warning_count = self.warning_count.saturating_add(1);
        if self.state == SafetyState::Normal {
            self.state = SafetyState::Warning;
        }
    }

    fn sync_alarms<S: FrameSink>(&mut self, registry: &mut AlarmRegistry<S>) {
        let held = [
            (SAFETY_CRITICAL, SafetyState::Critical, "SAFETY_CRIT"),
            (SAFETY_EMERGENCY, SafetyState::Emergency, "SAFETY_EMERG"),
        ];
        for (id, state, message) in held {
            if self.state == state {
                if registry.is_active(id) {
                    continue;
                }
                let severity = registry.get_severity(id);
                if let Err(e) = registry.raise(id, severity, Category::System, message) {
                    warn!("safety alarm {=u32} not raised: {}", id, e);
                }
            } else {
                registry.clear(id);
            }
        }
    }
}

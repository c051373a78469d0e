//! Plant supervisor
//!
//! Ties the alarm registry, the safety monitor and the module actuators
//! together, and answers commands from the supervisory host.

use plantwatch_protocol::payloads::Field;
use plantwatch_protocol::{
    Action, Command, Frame, FrameType, OperationMode, Payload, PayloadError, Response,
    SystemStatus, Target,
};

use crate::alarm::ids::{AC_FAULT, EMERGENCY_SHUTDOWN, MAINTENANCE};
use crate::alarm::{AlarmRegistry, Category, Indication};
use crate::persist::{self, PersistError, PlantSettings};
use crate::safety::{InputSource, SafetyCheckResult, SafetyMonitor};
use crate::sweep::{self, PlantReadings};
use crate::traits::{ConfigStore, FrameSink, ModuleControl, SinkError};

/// Top-level plant logic
pub struct Supervisor<T: FrameSink, M: ModuleControl> {
    alarms: AlarmRegistry<T>,
    monitor: SafetyMonitor,
    modules: M,
    mode: OperationMode,
    mains_available: bool,
    battery_backup: bool,
    generator_running: bool,
    load_permille: u16,
}

impl<T: FrameSink, M: ModuleControl> Supervisor<T, M> {
    pub fn new(sink: T, modules: M, monitor: SafetyMonitor) -> Self {
        Self {
            alarms: AlarmRegistry::new(sink),
            monitor,
            modules,
            mode: OperationMode::Auto,
            mains_available: true,
            battery_backup: false,
            generator_running: false,
            load_permille: 0,
        }
    }

    /// Handle one frame from the host
    ///
    /// Commands are answered with a Response frame, which is also returned.
    /// Every other payload is ignored.
    pub fn on_frame(&mut self, now_ms: u64, frame: &Frame) -> Option<Response> {
        self.monitor.frame_received(now_ms);
        self.alarms.update_time(now_ms);

        let response = match Payload::from_frame(frame) {
            Ok(Payload::Command(command)) => self.route(command),
            Ok(other) => {
                debug!("ignoring {} frame from host", other.frame_type());
                return None;
            }
            // Right length but an unknown target/action: still answerable
            Err(PayloadError::OutOfRange(Field::Target | Field::Action))
                if frame.msg_type == FrameType::Command.to_byte() =>
            {
                let command_id = frame.payload.first().copied().unwrap_or(0);
                Response::unsupported(command_id)
            }
            Err(e) => {
                warn!("rejected frame {=u8}: {}", frame.msg_type, e);
                return None;
            }
        };

        self.send(&Payload::Response(response));
        Some(response)
    }

    /// Execute a command and build its response
    pub fn route(&mut self, command: Command) -> Response {
        let id = command.command_id;
        debug!("command {}", command);

        match (command.target, command.action) {
            (Target::PowerModule, Action::Set) => {
                let enabled = match command.parameter {
                    0 => false,
                    1 => true,
                    _ => return Response::rejected(id),
                };
                match self.modules.set_enabled(command.instance, enabled) {
                    Ok(()) => {
                        info!("module {=u8} enabled={=bool}", command.instance, enabled);
                        Response::ok(id, enabled as u32)
                    }
                    Err(e) => {
                        warn!("module {=u8}: {}", command.instance, e);
                        Response::rejected(id)
                    }
                }
            }
            (Target::PowerModule, Action::Stop) => {
                match self
                    .monitor
                    .shutdown_module(&mut self.modules, command.instance)
                {
                    Ok(()) => Response::ok(id, 0),
                    Err(_) => Response::rejected(id),
                }
            }
            (Target::Battery, Action::Start) => {
                let severity = self.alarms.get_severity(MAINTENANCE);
                match self
                    .alarms
                    .raise(MAINTENANCE, severity, Category::Maintenance, "BAT_TEST")
                {
                    Ok(_) => {
                        info!("battery test started");
                        Response::ok(id, 1)
                    }
                    Err(_) => Response::rejected(id),
                }
            }
            (Target::Battery, Action::Stop) => {
                let stopped = self.alarms.clear(MAINTENANCE);
                Response::ok(id, stopped as u32)
            }
            (Target::System, Action::Set) => match OperationMode::from_byte(command.parameter) {
                Some(mode) => {
                    info!("operation mode {}", mode);
                    self.mode = mode;
                    Response::ok(id, mode.to_byte() as u32)
                }
                None => Response::rejected(id),
            },
            (Target::System, Action::Get) => Response::ok(id, self.mode.to_byte() as u32),
            (Target::Alarms, Action::Get) => {
                self.alarms.notify_all();
                Response::ok(id, self.alarms.active_count() as u32)
            }
            (Target::Alarms, Action::Stop) => {
                self.alarms.clear_all();
                Response::ok(id, 0)
            }
            (Target::Safety, Action::Get) => Response::ok(id, self.monitor.state().to_byte() as u32),
            (Target::Safety, Action::Start) => {
                self.monitor
                    .emergency_shutdown(&mut self.alarms, &mut self.modules);
                Response::ok(id, self.monitor.state().to_byte() as u32)
            }
            (Target::Safety, Action::Stop) => {
                self.monitor.reset();
                self.alarms.clear(EMERGENCY_SHUTDOWN);
                Response::ok(id, self.monitor.state().to_byte() as u32)
            }
            _ => Response::unsupported(id),
        }
    }

    /// Run the safety monitor if its interval has elapsed
    pub fn poll(&mut self, now_ms: u64, input: InputSource<'_>) -> Option<SafetyCheckResult> {
        self.alarms.update_time(now_ms);
        self.monitor.check_all(now_ms, input, &mut self.alarms)
    }

    /// Run every producer sweep against fresh readings
    pub fn sweep(&mut self, now_ms: u64, readings: &PlantReadings) {
        self.alarms.update_time(now_ms);
        let uptime_s = self.monitor.uptime_s(now_ms);
        sweep::sweep_all(&mut self.alarms, readings, uptime_s);

        self.load_permille = readings.system_load_permille;
        self.generator_running = readings.generator_running;
        if !readings.ac_phases.is_empty() {
            // Any phase in AC_FAULT means the mains cannot carry the plant
            self.mains_available =
                (0..readings.ac_phases.len() as u32).all(|i| !self.alarms.is_active(AC_FAULT + i));
        }
        self.battery_backup = !self.mains_available && !readings.batteries.is_empty();
    }

    /// Plant-wide status summary
    pub fn status(&self, now_ms: u64) -> SystemStatus {
        SystemStatus {
            mains_available: self.mains_available,
            battery_backup: self.battery_backup,
            generator_running: self.generator_running,
            operation_mode: self.mode,
            system_load_permille: self.load_permille.min(1_000),
            uptime_s: self.monitor.uptime_s(now_ms),
            safety_state: self.monitor.state().to_byte(),
            active_alarms: self.alarms.active_count().min(u8::MAX as usize) as u8,
        }
    }

    /// Send the status summary to the host
    pub fn send_status(&mut self, now_ms: u64) -> Result<(), SinkError> {
        let frame = Payload::Status(self.status(now_ms))
            .to_frame()
            .map_err(|_| SinkError::Full)?;
        self.alarms.sink().send(&frame)
    }

    /// Send every reading to the host as telemetry frames
    ///
    /// Stops at the first frame the sink refuses.
    pub fn send_readings(&mut self, readings: &PlantReadings) -> Result<(), SinkError> {
        let payloads = readings
            .modules
            .iter()
            .map(|r| Payload::PowerModule(*r))
            .chain(readings.batteries.iter().map(|r| Payload::Battery(*r)))
            .chain(readings.ac_phases.iter().map(|r| Payload::AcPhase(*r)))
            .chain(readings.dc_circuits.iter().map(|r| Payload::DcCircuit(r.clone())));

        for payload in payloads {
            let frame = payload.to_frame().map_err(|_| SinkError::Full)?;
            self.alarms.sink().send(&frame)?;
        }
        Ok(())
    }

    /// Load stored settings; on any error the current settings stay in force
    pub fn load_settings<C: ConfigStore>(&mut self, store: &mut C) -> Result<(), PersistError> {
        let settings = persist::load_config(store)?;
        settings.apply(&mut self.alarms, &mut self.monitor)?;
        info!("settings loaded ({=usize} overrides)", settings.alarms.len());
        Ok(())
    }

    pub fn save_settings<C: ConfigStore>(&self, store: &mut C) -> Result<(), PersistError> {
        persist::save_config(store, &PlantSettings::capture(&self.alarms, &self.monitor))
    }

    pub fn indication(&self) -> Indication {
        self.alarms.indication()
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn alarms(&self) -> &AlarmRegistry<T> {
        &self.alarms
    }

    pub fn alarms_mut(&mut self) -> &mut AlarmRegistry<T> {
        &mut self.alarms
    }

    pub fn monitor(&self) -> &SafetyMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut SafetyMonitor {
        &mut self.monitor
    }

    pub fn modules(&self) -> &M {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut M {
        &mut self.modules
    }

    fn send(&mut self, payload: &Payload) {
        let sent = payload
            .to_frame()
            .map_err(|_| SinkError::Full)
            .and_then(|frame| self.alarms.sink().send(&frame));
        if let Err(e) = sent {
            warn!("{} frame not sent: {}", payload.frame_type(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::ids::SAFETY_EMERGENCY;
    use crate::alarm::{LedPattern, Severity};
    use crate::safety::SafetyState;
    use crate::testing::{ControlCall, MemoryStore, RecordingControl, RecordingSink};
    use plantwatch_protocol::{AcPhaseReading, BatteryReading, ResponseStatus};

    type TestSupervisor = Supervisor<RecordingSink, RecordingControl>;

    fn supervisor() -> TestSupervisor {
        Supervisor::new(
            RecordingSink::default(),
            RecordingControl::default(),
            SafetyMonitor::default(),
        )
    }

    fn command(target: Target, instance: u8, action: Action, parameter: u8) -> Frame {
        Payload::Command(Command {
            command_id: 42,
            target,
            instance,
            action,
            parameter,
        })
        .to_frame()
        .unwrap()
    }

    fn last_response(sup: &mut TestSupervisor) -> Response {
        match sup.alarms_mut().sink().payloads().last() {
            Some(Payload::Response(r)) => *r,
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_power_module_set_and_stop() {
        let mut sup = supervisor();
        let r = sup
            .on_frame(0, &command(Target::PowerModule, 2, Action::Set, 1))
            .unwrap();
        assert_eq!(r, Response::ok(42, 1));
        sup.on_frame(0, &command(Target::PowerModule, 2, Action::Set, 0));
        sup.on_frame(0, &command(Target::PowerModule, 1, Action::Stop, 0));
        assert_eq!(
            sup.modules_mut().calls,
            [
                ControlCall::SetEnabled(2, true),
                ControlCall::SetEnabled(2, false),
                ControlCall::Shutdown(1)
            ]
        );
    }

    #[test]
    fn test_power_module_bad_instance_or_parameter() {
        let mut sup = supervisor();
        let r = sup
            .on_frame(0, &command(Target::PowerModule, 9, Action::Set, 1))
            .unwrap();
        assert_eq!(r.status, ResponseStatus::Rejected);
        let r = sup
            .on_frame(0, &command(Target::PowerModule, 0, Action::Set, 2))
            .unwrap();
        assert_eq!(r.status, ResponseStatus::Rejected);
        assert!(sup.modules_mut().calls.is_empty());
    }

    #[test]
    fn test_battery_test_raises_maintenance() {
        let mut sup = supervisor();
        sup.on_frame(3_000, &command(Target::Battery, 0, Action::Start, 0));

        let record = sup.alarms().get(MAINTENANCE).unwrap();
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.message.as_str(), "BAT_TEST");
        assert_eq!(record.raised_at_s, 3);

        // Notification first, then the response
        let payloads = sup.alarms_mut().sink().payloads();
        assert!(matches!(payloads[0], Payload::Alarm(_)));
        assert_eq!(payloads[1], Payload::Response(Response::ok(42, 1)));

        sup.on_frame(4_000, &command(Target::Battery, 0, Action::Stop, 0));
        assert!(!sup.alarms().is_active(MAINTENANCE));
        assert_eq!(last_response(&mut sup), Response::ok(42, 1));
    }

    #[test]
    fn test_system_mode() {
        let mut sup = supervisor();
        sup.on_frame(0, &command(Target::System, 0, Action::Set, 2));
        assert_eq!(sup.mode(), OperationMode::Test);
        let r = sup.on_frame(0, &command(Target::System, 0, Action::Get, 0)).unwrap();
        assert_eq!(r.value, 2);

        let r = sup.on_frame(0, &command(Target::System, 0, Action::Set, 3)).unwrap();
        assert_eq!(r.status, ResponseStatus::Rejected);
        assert_eq!(sup.mode(), OperationMode::Test);
    }

    #[test]
    fn test_alarms_get_and_stop() {
        let mut sup = supervisor();
        sup.alarms_mut()
            .raise(1000, Severity::Warning, Category::Power, "V_LOW_1")
            .unwrap();
        sup.alarms_mut()
            .raise(2000, Severity::Warning, Category::Battery, "BAT_LOW_1")
            .unwrap();
        sup.alarms_mut().sink().frames.clear();

        let r = sup.on_frame(0, &command(Target::Alarms, 0, Action::Get, 0)).unwrap();
        assert_eq!(r.value, 2);
        // Two notifications and a response
        assert_eq!(sup.alarms_mut().sink().frames.len(), 3);

        sup.on_frame(0, &command(Target::Alarms, 0, Action::Stop, 0));
        assert_eq!(sup.alarms().active_count(), 0);
    }

    #[test]
    fn test_safety_commands() {
        let mut sup = supervisor();
        let r = sup.on_frame(0, &command(Target::Safety, 0, Action::Get, 0)).unwrap();
        assert_eq!(r.value, 0);

        sup.on_frame(0, &command(Target::Safety, 0, Action::Start, 0));
        assert_eq!(sup.monitor().state(), SafetyState::Shutdown);
        assert!(sup.alarms().is_active(EMERGENCY_SHUTDOWN));
        assert_eq!(sup.modules_mut().calls, [ControlCall::ShutdownAll]);
        assert_eq!(last_response(&mut sup).value, 4);

        sup.on_frame(0, &command(Target::Safety, 0, Action::Stop, 0));
        assert_eq!(sup.monitor().state(), SafetyState::Normal);
        assert!(!sup.alarms().is_active(EMERGENCY_SHUTDOWN));
    }

    #[test]
    fn test_unsupported_pairs() {
        let mut sup = supervisor();
        for (target, action) in [
            (Target::PowerModule, Action::Get),
            (Target::Battery, Action::Set),
            (Target::Alarms, Action::Start),
            (Target::System, Action::Stop),
        ] {
            let r = sup.on_frame(0, &command(target, 0, action, 0)).unwrap();
            assert_eq!(r, Response::unsupported(42));
        }
    }

    #[test]
    fn test_unknown_target_answered() {
        let mut sup = supervisor();
        let frame = Frame::new(FrameType::Command.to_byte(), &[7, 9, 0, 0, 0]).unwrap();
        assert_eq!(sup.on_frame(0, &frame), Some(Response::unsupported(7)));
    }

    #[test]
    fn test_non_command_ignored() {
        let mut sup = supervisor();
        let frame = Payload::Status(SystemStatus::default()).to_frame().unwrap();
        assert_eq!(sup.on_frame(0, &frame), None);
        let junk = Frame::new(0x42, &[1, 2, 3]).unwrap();
        assert_eq!(sup.on_frame(0, &junk), None);
        assert!(sup.alarms_mut().sink().frames.is_empty());
    }

    #[test]
    fn test_frames_keep_link_alive() {
        let mut sup = supervisor();
        let live = InputSource::Live(&[]);
        sup.on_frame(25_000, &command(Target::System, 0, Action::Get, 0));
        let result = sup.poll(30_000, live).unwrap();
        assert!(result.communication_ok);
    }

    #[test]
    fn test_silent_link_fails_communication() {
        let mut sup = supervisor();
        let result = sup.poll(30_000, InputSource::Live(&[])).unwrap();
        assert!(!result.communication_ok);
        assert_eq!(sup.monitor().state(), SafetyState::Warning);
        assert!(!sup.alarms().is_active(SAFETY_EMERGENCY));
    }

    #[test]
    fn test_sweep_and_status() {
        let mut sup = supervisor();
        let mut readings = PlantReadings::default();
        readings
            .ac_phases
            .push(AcPhaseReading {
                phase_id: 0,
                voltage_dv: 0,
                current_da: 0,
                frequency_dhz: 0,
                power_w: 0,
                status: 0,
            })
            .unwrap();
        readings
            .batteries
            .push(BatteryReading {
                battery_id: 0,
                voltage_mv: 12_500,
                current_ma: 5_000,
                temperature_c: 25,
                capacity_pct: 70,
                charging: false,
                test_running: false,
            })
            .unwrap();
        readings.system_load_permille = 600;

        sup.sweep(5_000, &readings);
        let status = sup.status(5_000);
        assert!(!status.mains_available);
        assert!(status.battery_backup);
        assert_eq!(status.system_load_permille, 600);
        assert_eq!(status.uptime_s, 5);
        assert_eq!(status.active_alarms, 2);
        assert_eq!(sup.indication().alarm, LedPattern::Blink);

        sup.alarms_mut().sink().frames.clear();
        sup.send_status(5_000).unwrap();
        assert_eq!(
            sup.alarms_mut().sink().payloads(),
            [Payload::Status(status)]
        );
    }

    #[test]
    fn test_readings_sent_as_telemetry() {
        let mut sup = supervisor();
        let mut readings = PlantReadings::default();
        let battery = BatteryReading {
            battery_id: 1,
            voltage_mv: 12_800,
            current_ma: 0,
            temperature_c: 22,
            capacity_pct: 100,
            charging: false,
            test_running: false,
        };
        readings.batteries.push(battery).unwrap();
        readings.batteries.push(battery).unwrap();

        sup.send_readings(&readings).unwrap();
        assert_eq!(
            sup.alarms_mut().sink().payloads(),
            [Payload::Battery(battery), Payload::Battery(battery)]
        );

        let mut failing = Supervisor::new(
            RecordingSink::failing(),
            RecordingControl::default(),
            SafetyMonitor::default(),
        );
        assert_eq!(failing.send_readings(&readings), Err(SinkError::Full));
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut sup = supervisor();
        let mut store = MemoryStore::default();
        sup.alarms_mut().set_threshold(1000, 47_000).unwrap();
        sup.save_settings(&mut store).unwrap();

        let mut fresh = supervisor();
        fresh.load_settings(&mut store).unwrap();
        assert_eq!(fresh.alarms().get_threshold(1000), 47_000);

        let mut empty = MemoryStore::default();
        assert!(fresh.load_settings(&mut empty).is_err());
        assert_eq!(fresh.alarms().get_threshold(1000), 47_000);
    }
}

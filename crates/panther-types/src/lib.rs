use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Well-known topic and service names of the deployed power-control node.
pub mod names {
    /// Latched E-Stop state (`true` = E-Stop asserted).
    pub const E_STOP_TOPIC: &str = "hardware/e_stop";
    /// Latched digital IO snapshot.
    pub const IO_STATE_TOPIC: &str = "hardware/io_state";
    /// Velocity-command stream; only message arrival matters here.
    pub const CMD_VEL_TOPIC: &str = "/cmd_vel";
    /// Motor-controller status reports.
    pub const DRIVER_STATE_TOPIC: &str = "driver/motor_controllers_state";
    /// Service that attempts to clear the E-Stop.
    pub const E_STOP_RESET_SERVICE: &str = "hardware/e_stop_reset";
    /// Service that asserts the E-Stop.
    pub const E_STOP_TRIGGER_SERVICE: &str = "hardware/e_stop_trigger";
}

/// Snapshot of the robot's digital IO lines.
///
/// Only `motor_on` is driven by the power controller; the remaining fields
/// keep their startup baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoState {
    /// Motor controllers are powered (mirrors the power-stage-ready line).
    pub motor_on: bool,
    pub aux_power: bool,
    pub charger_connected: bool,
    pub fan: bool,
    pub power_button: bool,
    pub digital_power: bool,
    pub charger_enabled: bool,
}

impl IoState {
    /// Startup baseline: digital power on, everything else off except
    /// `motor_on`, which is taken from the live hardware signal.
    pub fn baseline(motor_on: bool) -> Self {
        Self {
            motor_on,
            aux_power: false,
            charger_connected: false,
            fan: false,
            power_button: false,
            digital_power: true,
            charger_enabled: false,
        }
    }
}

/// Fault flags reported by a single motor controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFlags {
    /// The controller lost CAN-bus communication.
    pub can_net_err: bool,
}

/// Status report covering both drivetrain motor controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorControllersState {
    pub front: FaultFlags,
    pub rear: FaultFlags,
}

/// Reply of a trigger-style service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub success: bool,
    pub message: String,
}

impl ServiceResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Envelope for every value published by the power controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Topic name the event was published on, e.g. `"hardware/e_stop"`.
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped with the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Values that can be published on the state bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// E-Stop state (`true` = asserted).
    EStop(bool),
    IoState(IoState),
}

/// Error type shared by the hardware layer, the bus, and the controller.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum PowerError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Invalid Configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_io_state() {
        let io = IoState::baseline(true);
        assert!(io.motor_on);
        assert!(io.digital_power);
        assert!(!io.aux_power);
        assert!(!io.charger_connected);
        assert!(!io.fan);
        assert!(!io.power_button);
        assert!(!io.charger_enabled);

        assert!(!IoState::baseline(false).motor_on);
    }

    #[test]
    fn motor_controllers_state_from_json() {
        let json = r#"{"front":{"can_net_err":false},"rear":{"can_net_err":true}}"#;
        let state: MotorControllersState = serde_json::from_str(json).unwrap();
        assert!(!state.front.can_net_err);
        assert!(state.rear.can_net_err);
    }

    #[test]
    fn event_roundtrip() {
        let event = Event::new(
            names::IO_STATE_TOPIC,
            EventPayload::IoState(IoState::baseline(true)),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(back.source, "hardware/io_state");
        assert_eq!(back.payload, event.payload);
    }

    #[test]
    fn service_response_constructors() {
        let ok = ServiceResponse::ok("done");
        assert!(ok.success);
        assert_eq!(ok.message, "done");
        assert!(!ServiceResponse::failed("nope").success);
    }

    #[test]
    fn power_error_display() {
        let err = PowerError::HardwareFault {
            component: "power_stage".to_string(),
            details: "gpio read failed".to_string(),
        };
        assert!(err.to_string().contains("power_stage"));
        assert!(PowerError::InvalidConfig("bad".into())
            .to_string()
            .contains("Invalid Configuration"));
    }
}

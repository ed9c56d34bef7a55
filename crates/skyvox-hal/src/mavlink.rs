//! MAVLink adapter for ArduPilot and PX4 autopilots.
//!
//! [`MavlinkAdapter`] bridges approved intents to a MAVLink vehicle:
//!
//! * **Flight** – `COMMAND_LONG` with `MAV_CMD_NAV_TAKEOFF`, `NAV_LAND`,
//!   `NAV_RETURN_TO_LAUNCH`, `NAV_LOITER_UNLIM`; STOP switches to BRAKE via
//!   `MAV_CMD_DO_SET_MODE`.
//! * **Movement** – `SET_POSITION_TARGET_LOCAL_NED` in the body-offset NED
//!   frame, `MAV_CMD_CONDITION_YAW` for rotation, `MAV_CMD_DO_CHANGE_SPEED`
//!   for speed.
//! * **Status** – `MAV_CMD_REQUEST_MESSAGE` for `SYS_STATUS`,
//!   `GLOBAL_POSITION_INT`, and `RADIO_STATUS`.
//!
//! Camera and zoom are not offered over MAVLink here; the capability matrix
//! says so and [`execute`][VehicleAdapter::execute] refuses them.
//!
//! Frames are JSON objects in the field layout of the MAVLink common
//! message set and travel over a [`CommandLink`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use skyvox_types::{Capability, ExecutionResult, Intent, SkyError, Slots};
use tracing::{info, warn};

use crate::adapter::{VehicleAdapter, precheck};
use crate::capability::CapabilityMatrix;
use crate::link::{CommandLink, LoopbackLink, transmit};
use crate::state::{DEFAULT_MOVE_DISTANCE, DEFAULT_YAW_DEGREES, FlightState};

// ────────────────────────────────────────────────────────────────────────────
// Protocol constants (MAVLink common.xml)
// ────────────────────────────────────────────────────────────────────────────

pub const MAV_CMD_NAV_LOITER_UNLIM: u16 = 17;
pub const MAV_CMD_NAV_RETURN_TO_LAUNCH: u16 = 20;
pub const MAV_CMD_NAV_LAND: u16 = 21;
pub const MAV_CMD_NAV_TAKEOFF: u16 = 22;
pub const MAV_CMD_CONDITION_YAW: u16 = 115;
pub const MAV_CMD_DO_SET_MODE: u16 = 176;
pub const MAV_CMD_DO_CHANGE_SPEED: u16 = 178;
pub const MAV_CMD_COMPONENT_ARM_DISARM: u16 = 400;
pub const MAV_CMD_REQUEST_MESSAGE: u16 = 512;

pub const MAVLINK_MSG_ID_SYS_STATUS: u32 = 1;
pub const MAVLINK_MSG_ID_GLOBAL_POSITION_INT: u32 = 33;
pub const MAVLINK_MSG_ID_RADIO_STATUS: u32 = 109;

const MAV_MODE_FLAG_CUSTOM_MODE_ENABLED: f64 = 1.0;
const COPTER_MODE_GUIDED: f64 = 4.0;
const COPTER_MODE_BRAKE: f64 = 17.0;
const MAV_FRAME_BODY_OFFSET_NED: u8 = 9;
/// Use the position fields only; ignore velocity, acceleration, and yaw.
const POSITION_ONLY_TYPE_MASK: u16 = 0x0FF8;
const MAV_TYPE_GCS: u8 = 6;
const MAV_AUTOPILOT_INVALID: u8 = 8;

// ────────────────────────────────────────────────────────────────────────────
// Endpoint
// ────────────────────────────────────────────────────────────────────────────

/// Where the autopilot lives.
///
/// # Example
///
/// ```
/// use skyvox_hal::mavlink::MavlinkEndpoint;
///
/// let ep: MavlinkEndpoint = "udp:127.0.0.1:14550".parse().unwrap();
/// assert_eq!(ep, MavlinkEndpoint::Udp { host: "127.0.0.1".into(), port: 14550 });
///
/// let serial: MavlinkEndpoint = "serial:/dev/ttyACM0:57600".parse().unwrap();
/// assert_eq!(serial.to_string(), "serial:/dev/ttyACM0:57600");
///
/// assert!("bluetooth:drone".parse::<MavlinkEndpoint>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MavlinkEndpoint {
    Udp { host: String, port: u16 },
    Tcp { host: String, port: u16 },
    Serial { path: String, baud: u32 },
}

impl FromStr for MavlinkEndpoint {
    type Err = SkyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            |why: &str| SkyError::Config(format!("invalid MAVLink endpoint {s:?}: {why}"));

        let (scheme, rest) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| invalid("expected <scheme>:<address>"))?;
        let (address, tail) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port or baud rate"))?;
        if address.is_empty() {
            return Err(invalid("empty address"));
        }

        match scheme.to_ascii_lowercase().as_str() {
            "udp" | "tcp" => {
                let port: u16 = tail.parse().map_err(|_| invalid("port must be 1-65535"))?;
                if port == 0 {
                    return Err(invalid("port must be 1-65535"));
                }
                let host = address.to_string();
                Ok(if scheme.eq_ignore_ascii_case("udp") {
                    MavlinkEndpoint::Udp { host, port }
                } else {
                    MavlinkEndpoint::Tcp { host, port }
                })
            }
            "serial" => {
                let baud: u32 = tail
                    .parse()
                    .ok()
                    .filter(|b| *b > 0)
                    .ok_or_else(|| invalid("baud rate must be a positive integer"))?;
                Ok(MavlinkEndpoint::Serial {
                    path: address.to_string(),
                    baud,
                })
            }
            other => Err(invalid(&format!("unsupported scheme {other:?}"))),
        }
    }
}

impl fmt::Display for MavlinkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MavlinkEndpoint::Udp { host, port } => write!(f, "udp:{host}:{port}"),
            MavlinkEndpoint::Tcp { host, port } => write!(f, "tcp:{host}:{port}"),
            MavlinkEndpoint::Serial { path, baud } => write!(f, "serial:{path}:{baud}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Adapter
// ────────────────────────────────────────────────────────────────────────────

pub struct MavlinkAdapter {
    endpoint: MavlinkEndpoint,
    link: Arc<dyn CommandLink>,
    target_system: u8,
    target_component: u8,
    connected: AtomicBool,
    state: Mutex<FlightState>,
    /// Held across a whole `execute` so concurrent commands apply in order.
    exec: tokio::sync::Mutex<()>,
}

impl MavlinkAdapter {
    /// Create an adapter for `endpoint` that sends on `link`.  The adapter
    /// starts disconnected.
    pub fn new(endpoint: MavlinkEndpoint, link: Arc<dyn CommandLink>) -> Self {
        Self {
            endpoint,
            link,
            target_system: 1,
            target_component: 1,
            connected: AtomicBool::new(false),
            state: Mutex::new(FlightState::new()),
            exec: tokio::sync::Mutex::new(()),
        }
    }

    /// Parse `url` and attach an in-memory [`LoopbackLink`], returned so the
    /// caller can inspect the frames.
    pub fn loopback(url: &str) -> Result<(Self, Arc<LoopbackLink>), SkyError> {
        let endpoint: MavlinkEndpoint = url.parse()?;
        let link = Arc::new(LoopbackLink::new(endpoint.to_string()));
        Ok((Self::new(endpoint, link.clone()), link))
    }

    pub fn endpoint(&self) -> &MavlinkEndpoint {
        &self.endpoint
    }

    /// Last-commanded vehicle state.
    pub fn state(&self) -> FlightState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn command_long(&self, command: u16, params: [f64; 7]) -> Value {
        json!({
            "message": "COMMAND_LONG",
            "target_system": self.target_system,
            "target_component": self.target_component,
            "command": command,
            "confirmation": 0,
            "param1": params[0],
            "param2": params[1],
            "param3": params[2],
            "param4": params[3],
            "param5": params[4],
            "param6": params[5],
            "param7": params[6],
        })
    }

    fn set_mode(&self, custom_mode: f64) -> Value {
        self.command_long(
            MAV_CMD_DO_SET_MODE,
            [MAV_MODE_FLAG_CUSTOM_MODE_ENABLED, custom_mode, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    fn request_message(&self, message_id: u32) -> Value {
        self.command_long(
            MAV_CMD_REQUEST_MESSAGE,
            [f64::from(message_id), 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    fn body_offset(&self, forward: f64, right: f64, down: f64) -> Value {
        json!({
            "message": "SET_POSITION_TARGET_LOCAL_NED",
            "target_system": self.target_system,
            "target_component": self.target_component,
            "coordinate_frame": MAV_FRAME_BODY_OFFSET_NED,
            "type_mask": POSITION_ONLY_TYPE_MASK,
            "x": forward,
            "y": right,
            "z": down,
        })
    }

    fn heartbeat(&self) -> Value {
        json!({
            "message": "HEARTBEAT",
            "type": MAV_TYPE_GCS,
            "autopilot": MAV_AUTOPILOT_INVALID,
            "base_mode": 0,
            "custom_mode": 0,
            "system_status": 0,
        })
    }

    /// Frames for `intent`, given the state the command will produce.
    fn frames(&self, intent: Intent, slots: &Slots, next: &FlightState) -> Vec<Value> {
        let step = slots.distance_meters().unwrap_or(DEFAULT_MOVE_DISTANCE);
        let zero = [0.0; 7];
        match intent {
            Intent::Stop => vec![self.set_mode(COPTER_MODE_BRAKE)],
            Intent::Takeoff => vec![
                self.set_mode(COPTER_MODE_GUIDED),
                self.command_long(
                    MAV_CMD_COMPONENT_ARM_DISARM,
                    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                ),
                self.command_long(
                    MAV_CMD_NAV_TAKEOFF,
                    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, next.altitude_m],
                ),
            ],
            Intent::Land => vec![self.command_long(MAV_CMD_NAV_LAND, zero)],
            Intent::Hover => vec![self.command_long(MAV_CMD_NAV_LOITER_UNLIM, zero)],
            Intent::ReturnHome => vec![self.command_long(MAV_CMD_NAV_RETURN_TO_LAUNCH, zero)],
            Intent::MoveForward => vec![self.body_offset(step, 0.0, 0.0)],
            Intent::MoveBack => vec![self.body_offset(-step, 0.0, 0.0)],
            Intent::MoveRight => vec![self.body_offset(0.0, step, 0.0)],
            Intent::MoveLeft => vec![self.body_offset(0.0, -step, 0.0)],
            // NED: z grows downward.
            Intent::MoveUp => vec![self.body_offset(0.0, 0.0, -step)],
            Intent::MoveDown => vec![self.body_offset(0.0, 0.0, step)],
            Intent::YawLeft | Intent::YawRight => {
                let degrees = slots.degrees.unwrap_or(DEFAULT_YAW_DEGREES);
                let direction = if intent == Intent::YawLeft { -1.0 } else { 1.0 };
                vec![self.command_long(
                    MAV_CMD_CONDITION_YAW,
                    [degrees, 0.0, direction, 1.0, 0.0, 0.0, 0.0],
                )]
            }
            Intent::SpeedUp | Intent::SlowDown | Intent::SpeedSet => vec![self.command_long(
                MAV_CMD_DO_CHANGE_SPEED,
                [1.0, next.speed_mps, -1.0, 0.0, 0.0, 0.0, 0.0],
            )],
            Intent::Battery => vec![self.request_message(MAVLINK_MSG_ID_SYS_STATUS)],
            Intent::Altitude | Intent::Position => {
                vec![self.request_message(MAVLINK_MSG_ID_GLOBAL_POSITION_INT)]
            }
            Intent::Signal => vec![self.request_message(MAVLINK_MSG_ID_RADIO_STATUS)],
            Intent::RecordStart
            | Intent::RecordStop
            | Intent::PhotoCapture
            | Intent::ZoomIn
            | Intent::ZoomOut
            | Intent::ZoomSet
            | Intent::ZoomReset
            | Intent::Unknown => Vec::new(),
        }
    }
}

impl fmt::Debug for MavlinkAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MavlinkAdapter")
            .field("endpoint", &self.endpoint)
            .field("link", &self.link.describe())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VehicleAdapter for MavlinkAdapter {
    fn name(&self) -> &str {
        "mavlink"
    }

    async fn connect(&self) -> Result<(), SkyError> {
        let failed = |e: SkyError| SkyError::ConnectionFailed {
            adapter: format!("mavlink {}", self.endpoint),
            details: e.to_string(),
        };
        self.link.open().await.map_err(failed)?;
        if let Err(e) = self.link.send(&self.heartbeat()).await {
            self.link.close().await;
            return Err(failed(e));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(endpoint = %self.endpoint, "MAVLink link up");
        Ok(())
    }

    async fn disconnect(&self) {
        self.link.close().await;
        self.connected.store(false, Ordering::SeqCst);
        info!(endpoint = %self.endpoint, "MAVLink link down");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn capabilities(&self) -> CapabilityMatrix {
        CapabilityMatrix::none()
            .grant(Capability::Flight)
            .grant(Capability::Movement)
            .grant(Capability::Status)
    }

    async fn execute(&self, intent: Intent, slots: &Slots) -> ExecutionResult {
        if let Some(refusal) = precheck(self, intent) {
            return refusal;
        }

        let _serial = self.exec.lock().await;
        let mut next = self.state();
        let result = next.apply(intent, slots);
        if !result.success {
            return result;
        }

        let frames = self.frames(intent, slots, &next);
        if let Err(e) = transmit(self.link.as_ref(), &frames).await {
            warn!(endpoint = %self.endpoint, %intent, error = %e, "MAVLink send failed");
            return ExecutionResult::failed(intent, format!("MAVLink link fault: {e}"));
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
        info!(endpoint = %self.endpoint, %intent, frames = frames.len(), "{}", result.message);
        result
    }
}

#[cfg(test)]
mod tests {
    use skyvox_types::DistanceUnit;

    use super::*;

    async fn connected() -> (MavlinkAdapter, Arc<LoopbackLink>) {
        let (adapter, link) = MavlinkAdapter::loopback("udp:127.0.0.1:14550").unwrap();
        adapter.connect().await.unwrap();
        link.clear_frames();
        (adapter, link)
    }

    // ── Endpoint parsing ────────────────────────────────────────────────

    #[test]
    fn parses_supported_endpoints() {
        assert_eq!(
            "tcp:10.0.0.2:5760".parse::<MavlinkEndpoint>().unwrap(),
            MavlinkEndpoint::Tcp {
                host: "10.0.0.2".into(),
                port: 5760
            }
        );
        assert_eq!(
            "serial:/dev/ttyUSB0:921600".parse::<MavlinkEndpoint>().unwrap(),
            MavlinkEndpoint::Serial {
                path: "/dev/ttyUSB0".into(),
                baud: 921600
            }
        );
        assert_eq!(
            "UDP:localhost:14550".parse::<MavlinkEndpoint>().unwrap(),
            MavlinkEndpoint::Udp {
                host: "localhost".into(),
                port: 14550
            }
        );
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for bad in [
            "",
            "udp",
            "udp:host",
            "udp::14550",
            "udp:host:0",
            "udp:host:70000",
            "serial:/dev/ttyS0:fast",
            "serial:/dev/ttyS0:0",
            "ws:host:80",
        ] {
            assert!(
                matches!(bad.parse::<MavlinkEndpoint>(), Err(SkyError::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn endpoint_display_round_trips() {
        let ep: MavlinkEndpoint = "tcp:sitl:5760".parse().unwrap();
        assert_eq!(ep.to_string().parse::<MavlinkEndpoint>().unwrap(), ep);
    }

    // ── Capabilities ────────────────────────────────────────────────────

    #[test]
    fn camera_and_zoom_are_unsupported() {
        let (adapter, _) = MavlinkAdapter::loopback("udp:127.0.0.1:14550").unwrap();
        assert!(adapter.supports_intent(Intent::Takeoff));
        assert!(adapter.supports_intent(Intent::MoveLeft));
        assert!(adapter.supports_intent(Intent::Battery));
        for intent in [
            Intent::RecordStart,
            Intent::RecordStop,
            Intent::PhotoCapture,
            Intent::ZoomIn,
            Intent::ZoomOut,
            Intent::ZoomSet,
            Intent::ZoomReset,
        ] {
            assert!(!adapter.supports_intent(intent), "{intent}");
        }
    }

    // ── Connection ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn connect_sends_heartbeat() {
        let (adapter, link) = MavlinkAdapter::loopback("udp:127.0.0.1:14550").unwrap();
        assert!(!adapter.is_connected());
        adapter.connect().await.unwrap();
        assert!(adapter.is_connected());
        assert_eq!(link.frames()[0]["message"], "HEARTBEAT");
    }

    #[tokio::test]
    async fn connect_failure_is_an_error() {
        let (adapter, link) = MavlinkAdapter::loopback("serial:/dev/ttyACM0:57600").unwrap();
        link.refuse_open("permission denied");
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, SkyError::ConnectionFailed { .. }));
        assert!(err.to_string().contains("permission denied"));
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn execute_before_connect_fails() {
        let (adapter, link) = MavlinkAdapter::loopback("udp:127.0.0.1:14550").unwrap();
        let r = adapter.execute(Intent::Land, &Slots::default()).await;
        assert!(!r.success);
        assert!(r.message.contains("not connected"));
        assert!(link.frames().is_empty());
    }

    // ── Frame translation ───────────────────────────────────────────────

    #[tokio::test]
    async fn takeoff_sets_guided_arms_and_climbs() {
        let (adapter, link) = connected().await;
        let slots = Slots {
            distance: Some(15.0),
            unit: Some(DistanceUnit::Meters),
            ..Default::default()
        };
        let r = adapter.execute(Intent::Takeoff, &slots).await;
        assert!(r.success);
        let frames = link.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0]["command"], MAV_CMD_DO_SET_MODE);
        assert_eq!(frames[0]["param2"], COPTER_MODE_GUIDED);
        assert_eq!(frames[1]["command"], MAV_CMD_COMPONENT_ARM_DISARM);
        assert_eq!(frames[2]["command"], MAV_CMD_NAV_TAKEOFF);
        assert_eq!(frames[2]["param7"], 15.0);
        assert!(adapter.state().is_flying);
    }

    #[tokio::test]
    async fn stop_switches_to_brake() {
        let (adapter, link) = connected().await;
        adapter.execute(Intent::Stop, &Slots::default()).await;
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["command"], MAV_CMD_DO_SET_MODE);
        assert_eq!(frame["param2"], COPTER_MODE_BRAKE);
    }

    #[tokio::test]
    async fn flight_commands_use_nav_ids() {
        let (adapter, link) = connected().await;
        for (intent, cmd) in [
            (Intent::Land, MAV_CMD_NAV_LAND),
            (Intent::Hover, MAV_CMD_NAV_LOITER_UNLIM),
            (Intent::ReturnHome, MAV_CMD_NAV_RETURN_TO_LAUNCH),
        ] {
            adapter.execute(intent, &Slots::default()).await;
            assert_eq!(link.last_frame().unwrap()["command"], cmd, "{intent}");
        }
    }

    #[tokio::test]
    async fn moves_are_body_offsets_in_ned() {
        let (adapter, link) = connected().await;
        let slots = Slots {
            distance: Some(10.0),
            unit: Some(DistanceUnit::Feet),
            ..Default::default()
        };
        let r = adapter.execute(Intent::MoveLeft, &slots).await;
        assert_eq!(r.message, "Moving left 10 feet");
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["message"], "SET_POSITION_TARGET_LOCAL_NED");
        assert_eq!(frame["coordinate_frame"], MAV_FRAME_BODY_OFFSET_NED);
        let y = frame["y"].as_f64().unwrap();
        assert!((y + 3.048).abs() < 1e-9);

        adapter.execute(Intent::MoveUp, &Slots::default()).await;
        assert_eq!(link.last_frame().unwrap()["z"], -1.0);
    }

    #[tokio::test]
    async fn yaw_is_relative_with_direction() {
        let (adapter, link) = connected().await;
        let slots = Slots {
            degrees: Some(30.0),
            ..Default::default()
        };
        adapter.execute(Intent::YawLeft, &slots).await;
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["command"], MAV_CMD_CONDITION_YAW);
        assert_eq!(frame["param1"], 30.0);
        assert_eq!(frame["param3"], -1.0);
        assert_eq!(frame["param4"], 1.0);
    }

    #[tokio::test]
    async fn speed_change_carries_resulting_speed() {
        let (adapter, link) = connected().await;
        adapter.execute(Intent::SpeedUp, &Slots::default()).await;
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["command"], MAV_CMD_DO_CHANGE_SPEED);
        assert_eq!(frame["param2"], 7.0);
    }

    #[tokio::test]
    async fn status_requests_the_right_message() {
        let (adapter, link) = connected().await;
        for (intent, id) in [
            (Intent::Battery, MAVLINK_MSG_ID_SYS_STATUS),
            (Intent::Altitude, MAVLINK_MSG_ID_GLOBAL_POSITION_INT),
            (Intent::Position, MAVLINK_MSG_ID_GLOBAL_POSITION_INT),
            (Intent::Signal, MAVLINK_MSG_ID_RADIO_STATUS),
        ] {
            let r = adapter.execute(intent, &Slots::default()).await;
            assert!(r.success);
            assert!(r.detail.is_some());
            let frame = link.last_frame().unwrap();
            assert_eq!(frame["command"], MAV_CMD_REQUEST_MESSAGE);
            assert_eq!(frame["param1"], f64::from(id), "{intent}");
        }
    }

    #[tokio::test]
    async fn unsupported_intent_sends_nothing() {
        let (adapter, link) = connected().await;
        let r = adapter.execute(Intent::ZoomIn, &Slots::default()).await;
        assert!(!r.success);
        assert!(r.message.contains("not supported"));
        assert!(link.frames().is_empty());
    }

    #[tokio::test]
    async fn link_fault_fails_and_keeps_state() {
        let (adapter, link) = connected().await;
        link.inject_fault("radio timeout");
        let r = adapter.execute(Intent::Takeoff, &Slots::default()).await;
        assert!(!r.success);
        assert!(r.message.contains("radio timeout"));
        assert!(!adapter.state().is_flying);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_moves_all_land() {
        let (adapter, link) = connected().await;
        let adapter = Arc::new(adapter);
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let adapter = adapter.clone();
                tokio::spawn(async move {
                    adapter.execute(Intent::MoveForward, &Slots::default()).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().success);
        }
        assert_eq!(adapter.state().x_m, 16.0);
        assert_eq!(link.frames().len(), 16);
    }

    #[tokio::test]
    async fn disconnect_closes_link() {
        let (adapter, link) = connected().await;
        adapter.disconnect().await;
        assert!(!adapter.is_connected());
        assert!(!link.is_open());
    }
}

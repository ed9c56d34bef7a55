//! DJI adapter.
//!
//! Translates intents into Mobile-SDK style action frames: `startTakeoff`,
//! `startLanding`, `startGoHome`, virtual-stick moves and rotations, camera
//! record and shoot actions, and zoom ratios.  Every capability group is
//! supported.  Connecting requires the SDK app key issued by the DJI
//! developer portal; the key is sent once in the `registerApp` frame and is
//! redacted from `Debug` output.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use skyvox_types::{ExecutionResult, Intent, SkyError, Slots};
use tracing::{info, warn};

use crate::adapter::{VehicleAdapter, precheck};
use crate::capability::CapabilityMatrix;
use crate::link::{CommandLink, LoopbackLink, transmit};
use crate::state::{DEFAULT_MOVE_DISTANCE, DEFAULT_YAW_DEGREES, FlightState};

pub struct DjiAdapter {
    app_key: Option<String>,
    link: Arc<dyn CommandLink>,
    connected: AtomicBool,
    state: Mutex<FlightState>,
    /// Held across a whole `execute` so concurrent commands apply in order.
    exec: tokio::sync::Mutex<()>,
}

impl DjiAdapter {
    /// Create a disconnected adapter.  `app_key` may be absent; `connect`
    /// will then fail.
    pub fn new(app_key: Option<String>, link: Arc<dyn CommandLink>) -> Self {
        Self {
            app_key: app_key.filter(|k| !k.trim().is_empty()),
            link,
            connected: AtomicBool::new(false),
            state: Mutex::new(FlightState::new()),
            exec: tokio::sync::Mutex::new(()),
        }
    }

    /// Adapter on an in-memory [`LoopbackLink`], returned for inspection.
    pub fn loopback(app_key: Option<String>) -> (Self, Arc<LoopbackLink>) {
        let link = Arc::new(LoopbackLink::new("dji-msdk"));
        (Self::new(app_key, link.clone()), link)
    }

    /// Last-commanded vehicle state.
    pub fn state(&self) -> FlightState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn frames(intent: Intent, slots: &Slots, next: &FlightState) -> Vec<Value> {
        let step = slots.distance_meters().unwrap_or(DEFAULT_MOVE_DISTANCE);
        let stick = |forward: f64, right: f64, up: f64| {
            json!({
                "action": "virtualStickMove",
                "forward_m": forward,
                "right_m": right,
                "up_m": up,
                "speed_mps": next.speed_mps,
            })
        };
        let action = |name: &str| json!({ "action": name });
        let key = |name: &str| json!({ "action": "getValue", "key": name });

        let frame = match intent {
            // Zeroed sticks hold the aircraft in place.
            Intent::Stop | Intent::Hover => json!({
                "action": "sendVirtualStickFlightControlData",
                "pitch": 0.0,
                "roll": 0.0,
                "yaw": 0.0,
                "vertical_throttle": 0.0,
            }),
            Intent::Takeoff => json!({
                "action": "startTakeoff",
                "altitude_m": next.altitude_m,
            }),
            Intent::Land => action("startLanding"),
            Intent::ReturnHome => action("startGoHome"),
            Intent::MoveForward => stick(step, 0.0, 0.0),
            Intent::MoveBack => stick(-step, 0.0, 0.0),
            Intent::MoveRight => stick(0.0, step, 0.0),
            Intent::MoveLeft => stick(0.0, -step, 0.0),
            Intent::MoveUp => stick(0.0, 0.0, step),
            Intent::MoveDown => stick(0.0, 0.0, -step),
            Intent::YawLeft | Intent::YawRight => {
                let degrees = slots.degrees.unwrap_or(DEFAULT_YAW_DEGREES);
                let signed = if intent == Intent::YawLeft {
                    -degrees
                } else {
                    degrees
                };
                json!({ "action": "virtualStickRotate", "yaw_deg": signed })
            }
            Intent::RecordStart => action("startRecordVideo"),
            Intent::RecordStop => action("stopRecordVideo"),
            Intent::PhotoCapture => json!({ "action": "startShootPhoto", "mode": "SINGLE" }),
            Intent::ZoomIn | Intent::ZoomOut | Intent::ZoomSet | Intent::ZoomReset => json!({
                "action": "setCameraZoomRatios",
                "ratio": next.zoom_level,
            }),
            Intent::SpeedUp | Intent::SlowDown | Intent::SpeedSet => json!({
                "action": "setMaxFlightSpeed",
                "speed_mps": next.speed_mps,
            }),
            Intent::Battery => key("ChargeRemainingInPercent"),
            Intent::Altitude => key("Altitude"),
            Intent::Signal => key("UplinkSignalQuality"),
            Intent::Position => key("AircraftLocation3D"),
            Intent::Unknown => return Vec::new(),
        };
        vec![frame]
    }
}

impl fmt::Debug for DjiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DjiAdapter")
            .field("app_key", &self.app_key.as_ref().map(|_| "[REDACTED]"))
            .field("link", &self.link.describe())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VehicleAdapter for DjiAdapter {
    fn name(&self) -> &str {
        "dji"
    }

    async fn connect(&self) -> Result<(), SkyError> {
        let Some(app_key) = self.app_key.as_deref() else {
            return Err(SkyError::ConnectionFailed {
                adapter: "dji".to_string(),
                details: "no DJI SDK app key configured".to_string(),
            });
        };
        let failed = |e: SkyError| SkyError::ConnectionFailed {
            adapter: "dji".to_string(),
            details: e.to_string(),
        };
        self.link.open().await.map_err(failed)?;
        let register = json!({ "action": "registerApp", "app_key": app_key });
        if let Err(e) = self.link.send(&register).await {
            self.link.close().await;
            return Err(failed(e));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(link = %self.link.describe(), "DJI SDK registered");
        Ok(())
    }

    async fn disconnect(&self) {
        self.link.close().await;
        self.connected.store(false, Ordering::SeqCst);
        info!(link = %self.link.describe(), "DJI link down");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn capabilities(&self) -> CapabilityMatrix {
        CapabilityMatrix::all()
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

        let frames = Self::frames(intent, slots, &next);
        if let Err(e) = transmit(self.link.as_ref(), &frames).await {
            warn!(%intent, error = %e, "DJI send failed");
            return ExecutionResult::failed(intent, format!("DJI link fault: {e}"));
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
        info!(adapter = "dji", %intent, "{}", result.message);
        result
    }
}

#[cfg(test)]
mod tests {
    use skyvox_types::{Capability, DistanceUnit};

    use super::*;

    async fn connected() -> (DjiAdapter, Arc<LoopbackLink>) {
        let (adapter, link) = DjiAdapter::loopback(Some("abc123".into()));
        adapter.connect().await.unwrap();
        link.clear_frames();
        (adapter, link)
    }

    #[test]
    fn supports_everything() {
        let (adapter, _) = DjiAdapter::loopback(None);
        for cap in Capability::ALL {
            assert!(adapter.capabilities().supports(cap));
        }
        assert_eq!(adapter.supported_intents().len(), Intent::ALL.len());
    }

    #[test]
    fn debug_redacts_app_key() {
        let (adapter, _) = DjiAdapter::loopback(Some("super-secret".into()));
        let dbg = format!("{adapter:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn connect_requires_app_key() {
        for key in [None, Some("   ".to_string())] {
            let (adapter, link) = DjiAdapter::loopback(key);
            let err = adapter.connect().await.unwrap_err();
            assert!(matches!(err, SkyError::ConnectionFailed { .. }));
            assert!(err.to_string().contains("app key"));
            assert!(!adapter.is_connected());
            assert!(!link.is_open());
        }
    }

    #[tokio::test]
    async fn connect_registers_app() {
        let (adapter, link) = DjiAdapter::loopback(Some("abc123".into()));
        adapter.connect().await.unwrap();
        assert!(adapter.is_connected());
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["action"], "registerApp");
        assert_eq!(frame["app_key"], "abc123");
    }

    #[tokio::test]
    async fn flight_actions() {
        let (adapter, link) = connected().await;
        for (intent, action) in [
            (Intent::Takeoff, "startTakeoff"),
            (Intent::Land, "startLanding"),
            (Intent::ReturnHome, "startGoHome"),
            (Intent::Stop, "sendVirtualStickFlightControlData"),
        ] {
            let r = adapter.execute(intent, &Slots::default()).await;
            assert!(r.success, "{intent}");
            assert_eq!(link.last_frame().unwrap()["action"], action);
        }
    }

    #[tokio::test]
    async fn camera_and_zoom_actions() {
        let (adapter, link) = connected().await;
        adapter.execute(Intent::RecordStart, &Slots::default()).await;
        assert_eq!(link.last_frame().unwrap()["action"], "startRecordVideo");
        assert!(adapter.state().recording);

        adapter.execute(Intent::PhotoCapture, &Slots::default()).await;
        assert_eq!(link.last_frame().unwrap()["action"], "startShootPhoto");

        let zoom = Slots {
            zoom_level: Some(4.0),
            ..Default::default()
        };
        adapter.execute(Intent::ZoomSet, &zoom).await;
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["action"], "setCameraZoomRatios");
        assert_eq!(frame["ratio"], 4.0);
    }

    #[tokio::test]
    async fn moves_use_virtual_stick() {
        let (adapter, link) = connected().await;
        let slots = Slots {
            distance: Some(5.0),
            unit: Some(DistanceUnit::Meters),
            ..Default::default()
        };
        let r = adapter.execute(Intent::MoveBack, &slots).await;
        assert_eq!(r.message, "Moving back 5 meters");
        let frame = link.last_frame().unwrap();
        assert_eq!(frame["action"], "virtualStickMove");
        assert_eq!(frame["forward_m"], -5.0);
    }

    #[tokio::test]
    async fn missing_zoom_slot_sends_nothing() {
        let (adapter, link) = connected().await;
        let r = adapter.execute(Intent::ZoomSet, &Slots::default()).await;
        assert!(!r.success);
        assert!(link.frames().is_empty());
    }

    #[tokio::test]
    async fn connect_does_not_log_the_app_key() {
        use std::io;
        use std::sync::Mutex as StdMutex;

        #[derive(Clone, Default)]
        struct Captured(Arc<StdMutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (adapter, _) = DjiAdapter::loopback(Some("k3y-do-not-log".into()));
        adapter.connect().await.unwrap();
        adapter.execute(Intent::Takeoff, &Slots::default()).await;

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("registerApp"), "{logs}");
        assert!(!logs.contains("k3y-do-not-log"), "{logs}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_photos_are_all_counted() {
        let (adapter, link) = connected().await;
        let adapter = Arc::new(adapter);
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let adapter = adapter.clone();
                tokio::spawn(async move {
                    adapter.execute(Intent::PhotoCapture, &Slots::default()).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().success);
        }
        assert_eq!(adapter.state().photo_count, 16);
        assert_eq!(link.frames().len(), 16);
    }

    #[tokio::test]
    async fn link_fault_is_reported() {
        let (adapter, link) = connected().await;
        link.inject_fault("USB accessory detached");
        let r = adapter.execute(Intent::Land, &Slots::default()).await;
        assert!(!r.success);
        assert!(r.message.contains("USB accessory detached"));
    }
}

//! [`CommandLink`] – the byte pipe under a protocol adapter.
//!
//! Protocol adapters ([`MavlinkAdapter`][crate::mavlink::MavlinkAdapter],
//! [`DjiAdapter`][crate::dji::DjiAdapter]) translate intents into JSON frames
//! and hand them to a link.  Keeping the transport behind a trait lets the
//! frame translation be tested without a radio, a serial port, or an SDK.
//!
//! [`LoopbackLink`] is the in-memory implementation: it records every frame
//! and can be told to fail, which is how link faults are exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use skyvox_types::SkyError;
use tracing::{debug, warn};

/// Transport for protocol frames.
#[async_trait]
pub trait CommandLink: Send + Sync {
    /// Human-readable endpoint description, used in errors and logs.
    fn describe(&self) -> String;

    async fn open(&self) -> Result<(), SkyError>;

    async fn send(&self, frame: &Value) -> Result<(), SkyError>;

    async fn close(&self);

    fn is_open(&self) -> bool;
}

/// Send `frames` in order, stopping at the first failure.
pub async fn transmit(link: &dyn CommandLink, frames: &[Value]) -> Result<(), SkyError> {
    for frame in frames {
        link.send(frame).await?;
    }
    Ok(())
}

/// Name of a frame for logging: its `action` or `message` field.  Payload
/// fields are never logged since some carry credentials.
pub fn frame_kind(frame: &Value) -> &str {
    frame
        .get("action")
        .or_else(|| frame.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("frame")
}

/// In-memory link that records frames instead of transmitting them.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use skyvox_hal::link::{CommandLink, LoopbackLink};
///
/// # tokio_test_block(async {
/// let link = LoopbackLink::new("udp:127.0.0.1:14550");
/// link.open().await.unwrap();
/// link.send(&json!({ "msg": "HEARTBEAT" })).await.unwrap();
/// assert_eq!(link.frames().len(), 1);
///
/// link.inject_fault("radio lost");
/// assert!(link.send(&json!({})).await.is_err());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct LoopbackLink {
    endpoint: String,
    open: AtomicBool,
    frames: Mutex<Vec<Value>>,
    fault: Mutex<Option<String>>,
    refuse_open: Mutex<Option<String>>,
}

impl LoopbackLink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Every frame sent so far, oldest first.
    pub fn frames(&self) -> Vec<Value> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_frame(&self) -> Option<Value> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn clear_frames(&self) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Make every subsequent `send` fail with `details`.
    pub fn inject_fault(&self, details: impl Into<String>) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(details.into());
    }

    pub fn clear_fault(&self) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Make every subsequent `open` fail with `details`.
    pub fn refuse_open(&self, details: impl Into<String>) {
        *self
            .refuse_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(details.into());
    }

    fn link_error(&self, details: impl Into<String>) -> SkyError {
        SkyError::Link {
            link: self.endpoint.clone(),
            details: details.into(),
        }
    }
}

#[async_trait]
impl CommandLink for LoopbackLink {
    fn describe(&self) -> String {
        format!("loopback({})", self.endpoint)
    }

    async fn open(&self) -> Result<(), SkyError> {
        let refusal = self
            .refuse_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(details) = refusal {
            warn!(link = %self.endpoint, %details, "loopback open refused");
            return Err(self.link_error(details));
        }
        self.open.store(true, Ordering::SeqCst);
        debug!(link = %self.endpoint, "loopback opened");
        Ok(())
    }

    async fn send(&self, frame: &Value) -> Result<(), SkyError> {
        if !self.is_open() {
            return Err(self.link_error("link is not open"));
        }
        let fault = self
            .fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(details) = fault {
            return Err(self.link_error(details));
        }
        debug!(link = %self.endpoint, kind = frame_kind(frame), "loopback frame");
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.clone());
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        debug!(link = %self.endpoint, "loopback closed");
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

//! In-process vehicle simulator for tests and demos without an aircraft.
//!
//! [`MockAdapter`] supports every capability by default, starts connected,
//! and applies commands straight to a [`FlightState`].
//!
//! # Example
//!
//! ```rust
//! use skyvox_hal::{MockAdapter, VehicleAdapter};
//! use skyvox_types::{Intent, Slots};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mock = MockAdapter::new();
//! let result = mock.execute(Intent::Takeoff, &Slots::default()).await;
//! assert!(result.success);
//! assert!(mock.state().is_flying);
//! # });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use skyvox_types::{ExecutionResult, Intent, SkyError, Slots};
use tracing::info;

use crate::adapter::{VehicleAdapter, precheck};
use crate::capability::CapabilityMatrix;
use crate::state::FlightState;

pub struct MockAdapter {
    connected: AtomicBool,
    capabilities: CapabilityMatrix,
    state: Mutex<FlightState>,
}

impl MockAdapter {
    /// A connected simulator supporting every capability.
    pub fn new() -> Self {
        Self::with_capabilities(CapabilityMatrix::all())
    }

    /// A connected simulator that only advertises `capabilities`.
    pub fn with_capabilities(capabilities: CapabilityMatrix) -> Self {
        Self {
            connected: AtomicBool::new(true),
            capabilities,
            state: Mutex::new(FlightState::new()),
        }
    }

    /// Snapshot of the simulated vehicle.
    pub fn state(&self) -> FlightState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VehicleAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<(), SkyError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn capabilities(&self) -> CapabilityMatrix {
        self.capabilities.clone()
    }

    async fn execute(&self, intent: Intent, slots: &Slots) -> ExecutionResult {
        if let Some(refusal) = precheck(self, intent) {
            return refusal;
        }
        let result = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(intent, slots);
        info!(adapter = "mock", %intent, success = result.success, "{}", result.message);
        result
    }
}

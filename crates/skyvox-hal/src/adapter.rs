//! The vehicle adapter contract.
//!
//! The pipeline never speaks a drone protocol directly.  Once the policy gate
//! approves a command, the caller hands `(intent, slots)` to whichever
//! [`VehicleAdapter`] is live, and the adapter translates it for the outside
//! world.
//!
//! - [`MockAdapter`][crate::mock::MockAdapter] – in-process simulator.
//! - [`MavlinkAdapter`][crate::mavlink::MavlinkAdapter] – ArduPilot / PX4
//!   autopilots over MAVLink.
//! - [`DjiAdapter`][crate::dji::DjiAdapter] – DJI aircraft via Mobile-SDK
//!   style actions.

use std::collections::BTreeSet;

use async_trait::async_trait;
use skyvox_types::{ExecutionResult, Intent, SkyError, Slots};

use crate::capability::CapabilityMatrix;

/// Every vehicle backend implements this trait.
///
/// # Contract
///
/// * `connect` – establish the vehicle link.  Setup failures are the only
///   errors an adapter returns.
///
/// * `capabilities` – static per adapter type; never changes with link
///   state.
///
/// * `execute` – the only side-effecting call.  It never fails with an
///   error: a disconnected adapter answers `success: false` with a message
///   containing "not connected", a capability gap with "not supported", and a
///   link fault with the fault text.
#[async_trait]
pub trait VehicleAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<(), SkyError>;

    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn capabilities(&self) -> CapabilityMatrix;

    fn supports_intent(&self, intent: Intent) -> bool {
        self.capabilities().supports_intent(intent)
    }

    fn supported_intents(&self) -> BTreeSet<Intent> {
        self.capabilities().supported_intents()
    }

    async fn execute(&self, intent: Intent, slots: &Slots) -> ExecutionResult;
}

/// Common refusal checks run before an adapter touches state or the link.
pub(crate) fn precheck(
    adapter: &(impl VehicleAdapter + ?Sized),
    intent: Intent,
) -> Option<ExecutionResult> {
    if !adapter.is_connected() {
        return Some(ExecutionResult::failed(
            intent,
            format!("{} adapter not connected", adapter.name()),
        ));
    }
    if !adapter.supports_intent(intent) {
        return Some(ExecutionResult::failed(
            intent,
            format!("{intent} not supported by the {} adapter", adapter.name()),
        ));
    }
    None
}

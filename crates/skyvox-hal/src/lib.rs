//! `skyvox-hal` – The Adapter Layer
//!
//! Translates approved commands into the protocol of a specific aircraft.
//! Everything above this crate speaks [`Intent`][skyvox_types::Intent] and
//! [`Slots`][skyvox_types::Slots]; everything below it speaks MAVLink, DJI
//! SDK actions, or nothing at all (the simulator).
//!
//! # Modules
//!
//! - [`adapter`] – the [`VehicleAdapter`][adapter::VehicleAdapter] trait.
//! - [`capability`] – [`CapabilityMatrix`][capability::CapabilityMatrix]:
//!   which capability groups an adapter can drive.
//! - [`state`] – [`FlightState`][state::FlightState]: last-commanded vehicle
//!   state and the shared intent → outcome rules.
//! - [`link`] – [`CommandLink`][link::CommandLink] transport seam and the
//!   in-memory [`LoopbackLink`][link::LoopbackLink].
//! - [`mock`] – in-process simulator, every capability supported.
//! - [`mavlink`] – ArduPilot / PX4 over MAVLink (no camera or zoom).
//! - [`dji`] – DJI aircraft via Mobile-SDK style actions.

pub mod adapter;
pub mod capability;
pub mod dji;
pub mod link;
pub mod mavlink;
pub mod mock;
pub mod state;

pub use adapter::VehicleAdapter;
pub use capability::CapabilityMatrix;
pub use dji::DjiAdapter;
pub use link::{CommandLink, LoopbackLink};
pub use mavlink::{MavlinkAdapter, MavlinkEndpoint};
pub use mock::MockAdapter;
pub use state::FlightState;

//! Emergency call domain selection.
//!
//! Decides whether an emergency call goes out over Wi-Fi or cellular and,
//! on cellular, whether it uses the CS or PS domain. When the current
//! registration cannot carry the call, the engine orders prioritized
//! network scans and falls back to Wi-Fi on a carrier-configured timer.

/// Bounded per-selector event log.
pub mod diag;
/// Decision engine and selection state.
pub mod engine;
/// Carrier policy snapshots and their sources.
pub mod policy;
/// Mailbox service, handle, and command protocol.
pub mod service;
/// Subscriber and SIM state queries.
pub mod subscriber;
/// Transport decisions and the scan interface.
pub mod transport;

pub use diag::EventLog;
pub use engine::{EmergencySelector, SelectionContext, SelectionPhase, SignalSet, WakeGuard};
pub use policy::{CarrierPolicy, DefaultPolicies, PolicyFile, PolicyFileError, PolicyProvider};
pub use service::{
	DEFAULT_MAILBOX_CAPACITY, HandleError, SelectorCommand, SelectorHandle, SelectorService,
	SelectorServiceBuilder,
};
pub use subscriber::{StaticSubscriber, SubscriberError, SubscriberGateway};
pub use transport::{ScanRequest, ScanResponder, TransportDriver, WwanHandle};

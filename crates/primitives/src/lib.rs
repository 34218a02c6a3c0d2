//! Core types for emergency call routing: access networks, registration
//! snapshots, selection attributes, and entitlement state.

/// Access network, transport, and domain classification types.
pub mod access;
/// Dialed-number attributes handed to a domain selector.
pub mod attributes;
/// Premium network entitlement responses.
pub mod entitlement;
/// Emergency registration snapshots reported by the radio stack.
pub mod registration;

pub use access::{
	AccessNetwork, CallDomain, DomainPreference, NetworkDomain, RegState, ScanPreference, ScanType,
	TransportKind,
};
pub use attributes::{SelectionAttributes, SubscriptionId};
pub use entitlement::{EntitlementStatus, PremiumNetworkEntitlement, ProvisionStatus};
pub use registration::{EmergencyRegResult, ImsRegistration};

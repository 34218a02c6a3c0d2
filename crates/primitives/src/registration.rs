//! Emergency registration snapshots reported by the radio stack.

use crate::access::{AccessNetwork, NetworkDomain, RegState, TransportKind};

/// Where, if anywhere, the device is registered for emergency service.
///
/// Delivered with the initial selection attributes and again as the payload
/// of every scan result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmergencyRegResult {
	pub reg_state: RegState,
	/// Domains the registration covers.
	pub domains: NetworkDomain,
	pub access_network: AccessNetwork,
	/// Voice over PS sessions supported on the registered network.
	pub vops_supported: bool,
	/// Emergency bearer services supported (EUTRAN attach indicator).
	pub emc_bearer_supported: bool,
	/// Network-signalled emergency service support (NGRAN indicator).
	pub nw_provided_emc: bool,
	/// ISO country code of the serving network, when the modem knows it.
	pub country_iso: Option<String>,
}

impl EmergencyRegResult {
	pub fn new(access_network: AccessNetwork, reg_state: RegState, domains: NetworkDomain) -> Self {
		Self {
			reg_state,
			domains,
			access_network,
			..Self::default()
		}
	}

	/// Out-of-service placeholder: no network, no domains.
	pub fn none() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_vops(mut self, supported: bool) -> Self {
		self.vops_supported = supported;
		self
	}

	#[must_use]
	pub fn with_emc_bearer(mut self, supported: bool) -> Self {
		self.emc_bearer_supported = supported;
		self
	}

	#[must_use]
	pub fn with_nw_provided_emc(mut self, provided: bool) -> Self {
		self.nw_provided_emc = provided;
		self
	}

	#[must_use]
	pub fn with_country(mut self, iso: impl Into<String>) -> Self {
		self.country_iso = Some(iso.into());
		self
	}

	pub fn supports_domain(&self, domain: NetworkDomain) -> bool {
		self.domains.contains(domain)
	}
}

/// IMS registration signal payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImsRegistration {
	#[default]
	Unregistered,
	/// Registered, over the given transport.
	Registered(TransportKind),
}

impl ImsRegistration {
	pub const fn is_registered(self) -> bool {
		matches!(self, Self::Registered(_))
	}

	pub const fn over_wlan(self) -> bool {
		matches!(self, Self::Registered(TransportKind::Wlan))
	}
}

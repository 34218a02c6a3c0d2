//! Carrier policy snapshots and their sources.

use std::time::Duration;

use mayday_primitives::{AccessNetwork, DomainPreference, ScanPreference, SubscriptionId};

mod file;

pub use file::{PolicyFile, PolicyFileError};

/// Immutable carrier policy for one selection attempt.
///
/// Snapshotted once when selection starts; mid-call carrier updates never
/// reach a running attempt. Home and roaming variants of each list travel
/// together so the roaming determination can settle after the snapshot is
/// taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierPolicy {
	/// Ranked emergency domain preference when camped on the home network.
	pub domain_preference: Vec<DomainPreference>,
	/// Ranked emergency domain preference when roaming.
	pub domain_preference_roaming: Vec<DomainPreference>,
	/// Networks on which emergency calls may use IMS (PS).
	pub ims_networks: Vec<AccessNetwork>,
	pub ims_networks_roaming: Vec<AccessNetwork>,
	/// Networks on which emergency calls may use CS signalling.
	pub cs_networks: Vec<AccessNetwork>,
	pub cs_networks_roaming: Vec<AccessNetwork>,
	/// Prefer the PS attempt even when voice calls currently run on CS.
	pub prefer_ims_when_calls_on_cs: bool,
	/// How long a scan may run before the Wi-Fi fallback timer fires.
	/// Zero disables the timer.
	pub scan_timeout: Duration,
	/// Cap on call setup time on the current network. Zero disables it.
	pub call_setup_timeout: Duration,
	/// Emergency attempts allowed over Wi-Fi per selector before the
	/// fallback stops being offered.
	pub max_vowifi_trials: u32,
	pub scan_preference: ScanPreference,
	/// PS is only usable while IMS is registered for voice.
	pub requires_ims_registration: bool,
	/// PS is only usable while the advanced-calling (VoLTE) user setting
	/// is on.
	pub requires_volte_enabled: bool,
	/// After a failed NR attempt, rank LTE ahead of another NR try.
	pub lte_preferred_after_nr_failure: bool,
	/// Emergency numbers that should be attempted on CDMA when available.
	pub cdma_preferred_numbers: Vec<String>,
}

impl Default for CarrierPolicy {
	fn default() -> Self {
		Self {
			domain_preference: vec![
				DomainPreference::Ps3gpp,
				DomainPreference::Cs,
				DomainPreference::PsNon3gpp,
			],
			domain_preference_roaming: vec![
				DomainPreference::Ps3gpp,
				DomainPreference::Cs,
				DomainPreference::PsNon3gpp,
			],
			ims_networks: vec![AccessNetwork::Eutran],
			ims_networks_roaming: vec![AccessNetwork::Eutran],
			cs_networks: vec![AccessNetwork::Utran, AccessNetwork::Geran],
			cs_networks_roaming: vec![AccessNetwork::Utran, AccessNetwork::Geran],
			prefer_ims_when_calls_on_cs: false,
			scan_timeout: Duration::from_secs(10),
			call_setup_timeout: Duration::ZERO,
			max_vowifi_trials: 1,
			scan_preference: ScanPreference::NoPreference,
			requires_ims_registration: false,
			requires_volte_enabled: false,
			lte_preferred_after_nr_failure: false,
			cdma_preferred_numbers: Vec::new(),
		}
	}
}

impl CarrierPolicy {
	pub fn domain_preference(&self, roaming: bool) -> &[DomainPreference] {
		if roaming {
			&self.domain_preference_roaming
		} else {
			&self.domain_preference
		}
	}

	pub fn ims_networks(&self, roaming: bool) -> &[AccessNetwork] {
		if roaming {
			&self.ims_networks_roaming
		} else {
			&self.ims_networks
		}
	}

	pub fn cs_networks(&self, roaming: bool) -> &[AccessNetwork] {
		if roaming {
			&self.cs_networks_roaming
		} else {
			&self.cs_networks
		}
	}

	/// Rank of Wi-Fi emergency in the preference list, 0 being the most
	/// preferred. `None` when the carrier does not offer emergency over
	/// Wi-Fi at all.
	pub fn wifi_rank(&self, roaming: bool) -> Option<usize> {
		self.domain_preference(roaming)
			.iter()
			.position(|p| *p == DomainPreference::PsNon3gpp)
	}

	pub fn supports_emergency_over_wifi(&self, roaming: bool) -> bool {
		self.wifi_rank(roaming).is_some()
	}
}

/// Source of carrier policy snapshots.
pub trait PolicyProvider: Send + Sync {
	/// Policy for a subscription, or `None` when no carrier record exists;
	/// the engine then runs on [`CarrierPolicy::default`].
	fn policy(&self, subscription: SubscriptionId) -> Option<CarrierPolicy>;
}

/// Empty store: every subscription runs on the default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicies;

impl PolicyProvider for DefaultPolicies {
	fn policy(&self, _subscription: SubscriptionId) -> Option<CarrierPolicy> {
		None
	}
}

impl PolicyProvider for CarrierPolicy {
	/// A fixed policy serving every subscription. Useful for tests and
	/// single-carrier deployments.
	fn policy(&self, _subscription: SubscriptionId) -> Option<CarrierPolicy> {
		Some(self.clone())
	}
}

//! Premium network entitlement responses.

use std::time::Duration;

/// Entitlement verdict for a premium network capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntitlementStatus {
	#[default]
	Disabled,
	Enabled,
	/// The subscriber's plan cannot carry the capability.
	Incompatible,
	/// Entitlement exists but provisioning has to finish first.
	Provisioning,
	/// Already part of the subscriber's plan.
	Included,
}

/// Provisioning progress for a premium network capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProvisionStatus {
	#[default]
	NotProvisioned,
	Provisioned,
	NotRequired,
	InProgress,
}

/// Parsed entitlement-server answer for one premium network capability.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PremiumNetworkEntitlement {
	pub entitlement_status: EntitlementStatus,
	pub provision_status: ProvisionStatus,
	/// Time the ongoing provisioning flow has left, in whole seconds.
	pub provision_time_left_secs: u32,
	/// Web sheet the subscriber is sent to when purchase is required.
	pub service_flow_url: Option<String>,
}

impl PremiumNetworkEntitlement {
	pub fn is_provisioned(&self) -> bool {
		self.provision_status == ProvisionStatus::Provisioned
			|| self.entitlement_status == EntitlementStatus::Included
	}

	pub fn is_provisioning_in_progress(&self) -> bool {
		self.provision_status == ProvisionStatus::InProgress
			|| self.entitlement_status == EntitlementStatus::Provisioning
	}

	/// Whether the capability may be offered to the subscriber at all.
	pub fn capability_allowed(&self) -> bool {
		!matches!(
			self.entitlement_status,
			EntitlementStatus::Incompatible | EntitlementStatus::Disabled
		)
	}

	pub fn provision_time_left(&self) -> Duration {
		Duration::from_secs(u64::from(self.provision_time_left_secs))
	}
}

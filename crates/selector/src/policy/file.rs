//! TOML-backed policy store.
//!
//! Layout: one optional `[default]` table plus any number of
//! `[subscription.<id>]` tables. Subscription tables are partial; fields
//! they leave out inherit from `[default]`, which in turn inherits from
//! [`CarrierPolicy::default`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mayday_primitives::{AccessNetwork, DomainPreference, ScanPreference, SubscriptionId};
use serde::Deserialize;
use thiserror::Error;

use super::{CarrierPolicy, PolicyProvider};

/// Failure loading or interpreting a policy file.
#[derive(Debug, Error)]
pub enum PolicyFileError {
	/// The file could not be read.
	#[error("read {path:?}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	/// The file is not valid TOML or does not match the policy schema.
	#[error("parse policy file: {0}")]
	Parse(#[from] toml::de::Error),
	/// A `[subscription.<id>]` key is not a numeric subscription id.
	#[error("subscription key {key:?} is not a numeric id")]
	SubscriptionKey { key: String },
}

/// Policy store parsed from a TOML file.
#[derive(Debug, Clone)]
pub struct PolicyFile {
	default: CarrierPolicy,
	overrides: HashMap<i32, CarrierPolicy>,
}

impl PolicyFile {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyFileError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| PolicyFileError::Io {
			path: path.to_owned(),
			source,
		})?;
		Self::parse(&text)
	}

	pub fn parse(text: &str) -> Result<Self, PolicyFileError> {
		let model: FileModel = toml::from_str(text)?;
		let mut default = CarrierPolicy::default();
		model.default.apply(&mut default);
		let mut overrides = HashMap::with_capacity(model.subscription.len());
		for (key, table) in &model.subscription {
			let id: i32 = key
				.parse()
				.map_err(|_| PolicyFileError::SubscriptionKey { key: key.clone() })?;
			let mut policy = default.clone();
			table.apply(&mut policy);
			overrides.insert(id, policy);
		}
		Ok(Self { default, overrides })
	}

	pub fn policy_for(&self, subscription: SubscriptionId) -> &CarrierPolicy {
		self.overrides.get(&subscription.0).unwrap_or(&self.default)
	}
}

impl PolicyProvider for PolicyFile {
	fn policy(&self, subscription: SubscriptionId) -> Option<CarrierPolicy> {
		Some(self.policy_for(subscription).clone())
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileModel {
	#[serde(default)]
	default: PolicyTable,
	#[serde(default)]
	subscription: BTreeMap<String, PolicyTable>,
}

/// One partial policy table. `None` means "inherit".
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyTable {
	domain_preference: Option<Vec<DomainPreference>>,
	domain_preference_roaming: Option<Vec<DomainPreference>>,
	ims_networks: Option<Vec<AccessNetwork>>,
	ims_networks_roaming: Option<Vec<AccessNetwork>>,
	cs_networks: Option<Vec<AccessNetwork>>,
	cs_networks_roaming: Option<Vec<AccessNetwork>>,
	prefer_ims_when_calls_on_cs: Option<bool>,
	scan_timeout_secs: Option<u64>,
	call_setup_timeout_secs: Option<u64>,
	max_vowifi_trials: Option<u32>,
	scan_preference: Option<ScanPreference>,
	requires_ims_registration: Option<bool>,
	requires_volte_enabled: Option<bool>,
	lte_preferred_after_nr_failure: Option<bool>,
	cdma_preferred_numbers: Option<Vec<String>>,
}

impl PolicyTable {
	fn apply(&self, policy: &mut CarrierPolicy) {
		if let Some(v) = &self.domain_preference {
			policy.domain_preference = v.clone();
		}
		if let Some(v) = &self.domain_preference_roaming {
			policy.domain_preference_roaming = v.clone();
		}
		if let Some(v) = &self.ims_networks {
			policy.ims_networks = v.clone();
		}
		if let Some(v) = &self.ims_networks_roaming {
			policy.ims_networks_roaming = v.clone();
		}
		if let Some(v) = &self.cs_networks {
			policy.cs_networks = v.clone();
		}
		if let Some(v) = &self.cs_networks_roaming {
			policy.cs_networks_roaming = v.clone();
		}
		if let Some(v) = self.prefer_ims_when_calls_on_cs {
			policy.prefer_ims_when_calls_on_cs = v;
		}
		if let Some(secs) = self.scan_timeout_secs {
			policy.scan_timeout = Duration::from_secs(secs);
		}
		if let Some(secs) = self.call_setup_timeout_secs {
			policy.call_setup_timeout = Duration::from_secs(secs);
		}
		if let Some(v) = self.max_vowifi_trials {
			policy.max_vowifi_trials = v;
		}
		if let Some(v) = self.scan_preference {
			policy.scan_preference = v;
		}
		if let Some(v) = self.requires_ims_registration {
			policy.requires_ims_registration = v;
		}
		if let Some(v) = self.requires_volte_enabled {
			policy.requires_volte_enabled = v;
		}
		if let Some(v) = self.lte_preferred_after_nr_failure {
			policy.lte_preferred_after_nr_failure = v;
		}
		if let Some(v) = &self.cdma_preferred_numbers {
			policy.cdma_preferred_numbers = v.clone();
		}
	}
}

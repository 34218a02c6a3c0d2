//! Scan candidate ranking.

use mayday_primitives::{AccessNetwork, DomainPreference};

use crate::policy::CarrierPolicy;

/// Inputs the ranking needs from the engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RankingInputs<'a> {
	pub policy: &'a CarrierPolicy,
	pub roaming: bool,
	/// Rank CS networks first regardless of attempt history.
	pub cs_preferred: bool,
	/// Network of the previous cellular attempt; `Unknown` when none has
	/// been made yet.
	pub last_network: AccessNetwork,
	/// Dialed number, for the CDMA-preferred override.
	pub number: &'a str,
}

/// Ranked networks for the next scan, most preferred first.
///
/// The first scan of an attempt follows the carrier's domain preference
/// order. Later scans alternate away from whatever was tried last, with
/// one carve-out: after an NR failure a carrier may rank LTE ahead of
/// another NR try.
pub(crate) fn next_preferred_networks(inputs: RankingInputs<'_>) -> Vec<AccessNetwork> {
	let prefs = inputs.policy.domain_preference(inputs.roaming);
	let ps_rank = prefs.iter().position(|p| *p == DomainPreference::Ps3gpp);
	let cs_rank = prefs.iter().position(|p| *p == DomainPreference::Cs);
	let ims = inputs.policy.ims_networks(inputs.roaming).to_vec();
	let cs = cs_networks_for_number(inputs.policy, inputs.roaming, inputs.number);

	if !inputs.cs_preferred && inputs.last_network == AccessNetwork::Unknown {
		// First trial: rank by domain preference alone.
		match (ps_rank, cs_rank) {
			(None, Some(_)) => cs,
			(Some(_), None) => ims,
			(Some(ps), Some(cs_pos)) if ps < cs_pos => merge(&[&ims, &cs]),
			(Some(_), Some(_)) => merge(&[&cs, &ims]),
			(None, None) => Vec::new(),
		}
	} else if inputs.cs_preferred
		|| matches!(
			inputs.last_network,
			AccessNetwork::Eutran | AccessNetwork::Ngran
		) {
		if !inputs.cs_preferred
			&& inputs.last_network == AccessNetwork::Ngran
			&& inputs.policy.lte_preferred_after_nr_failure
		{
			let ims_without_nr: Vec<AccessNetwork> = ims
				.iter()
				.copied()
				.filter(|n| *n != AccessNetwork::Ngran)
				.collect();
			merge(&[&ims_without_nr, &cs])
		} else if cs_rank.is_some() {
			merge(&[&cs, &ims])
		} else {
			ims
		}
	} else if ps_rank.is_some() {
		// CS was tried last; move on to PS.
		merge(&[&ims, &cs])
	} else {
		cs
	}
}

/// CS-capable networks for this call. With CDMA-preferred numbers
/// configured, a matching dialed number forces CDMA2000 and any other
/// number drops it from the list.
pub(crate) fn cs_networks_for_number(
	policy: &CarrierPolicy,
	roaming: bool,
	number: &str,
) -> Vec<AccessNetwork> {
	let mut networks: Vec<AccessNetwork> = policy.cs_networks(roaming).to_vec();
	if policy.cdma_preferred_numbers.is_empty() {
		return networks;
	}
	if policy.cdma_preferred_numbers.iter().any(|n| n == number) {
		vec![AccessNetwork::Cdma2000]
	} else {
		networks.retain(|n| *n != AccessNetwork::Cdma2000);
		networks
	}
}

/// Flattens ranked groups in order. Empty groups vanish; duplicates stay
/// as given.
fn merge(groups: &[&[AccessNetwork]]) -> Vec<AccessNetwork> {
	groups.iter().flat_map(|g| g.iter().copied()).collect()
}

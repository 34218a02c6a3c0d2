//! Subscription and SIM state queries.

use mayday_primitives::SubscriptionId;
use thiserror::Error;

/// Failure answering a subscriber query.
#[derive(Debug, Error)]
pub enum SubscriberError {
	/// The underlying telephony service could not be reached.
	#[error("telephony service unavailable: {0}")]
	Unavailable(String),
	/// The subscription is not known to the platform.
	#[error("unknown subscription {0}")]
	UnknownSubscription(SubscriptionId),
}

/// Read-only subscriber state the selection engine consults.
///
/// Failures never abort a selection. The engine degrades every error to
/// the permissive default for that query: advanced calling assumed on,
/// SIM assumed active, country unknown.
pub trait SubscriberGateway: Send + Sync {
	/// Whether the user's advanced-calling (VoLTE) setting is enabled.
	fn advanced_calling_enabled(
		&self,
		subscription: SubscriptionId,
	) -> Result<bool, SubscriberError>;

	/// Whether the SIM's data service has been deactivated by the carrier.
	fn data_deactivated(&self, subscription: SubscriptionId) -> Result<bool, SubscriberError>;

	/// ISO country code of the SIM provider.
	fn sim_country(&self, subscription: SubscriptionId) -> Result<Option<String>, SubscriberError>;

	/// ISO country code of the currently camped network.
	fn network_country(
		&self,
		subscription: SubscriptionId,
	) -> Result<Option<String>, SubscriberError>;
}

/// Fixed subscriber state. Serves tests and deployments where the state
/// is known up front and never changes.
#[derive(Debug, Clone)]
pub struct StaticSubscriber {
	pub advanced_calling: bool,
	pub data_deactivated: bool,
	pub sim_country: Option<String>,
	pub network_country: Option<String>,
}

impl Default for StaticSubscriber {
	fn default() -> Self {
		Self {
			advanced_calling: true,
			data_deactivated: false,
			sim_country: None,
			network_country: None,
		}
	}
}

impl SubscriberGateway for StaticSubscriber {
	fn advanced_calling_enabled(
		&self,
		_subscription: SubscriptionId,
	) -> Result<bool, SubscriberError> {
		Ok(self.advanced_calling)
	}

	fn data_deactivated(&self, _subscription: SubscriptionId) -> Result<bool, SubscriberError> {
		Ok(self.data_deactivated)
	}

	fn sim_country(
		&self,
		_subscription: SubscriptionId,
	) -> Result<Option<String>, SubscriberError> {
		Ok(self.sim_country.clone())
	}

	fn network_country(
		&self,
		_subscription: SubscriptionId,
	) -> Result<Option<String>, SubscriberError> {
		Ok(self.network_country.clone())
	}
}

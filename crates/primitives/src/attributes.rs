//! Dialed-number attributes handed to a domain selector.

use std::fmt;

use crate::registration::EmergencyRegResult;

/// Platform subscription identifier.
///
/// Negative values are invalid; [`SubscriptionId::INVALID`] is the
/// conventional placeholder for "no usable SIM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub i32);

impl SubscriptionId {
	pub const INVALID: Self = Self(-1);

	pub const fn is_valid(self) -> bool {
		self.0 >= 0
	}
}

impl fmt::Display for SubscriptionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "sub{}", self.0)
	}
}

impl Default for SubscriptionId {
	fn default() -> Self {
		Self::INVALID
	}
}

/// Everything the call layer knows at the moment it asks for a domain
/// decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionAttributes {
	/// Dialed emergency number.
	pub number: String,
	pub subscription: SubscriptionId,
	/// Registration snapshot taken when the call was placed, when one is
	/// available.
	pub reg_result: Option<EmergencyRegResult>,
}

impl SelectionAttributes {
	pub fn new(number: impl Into<String>, subscription: SubscriptionId) -> Self {
		Self {
			number: number.into(),
			subscription,
			reg_result: None,
		}
	}

	#[must_use]
	pub fn with_reg_result(mut self, reg: EmergencyRegResult) -> Self {
		self.reg_result = Some(reg);
		self
	}
}

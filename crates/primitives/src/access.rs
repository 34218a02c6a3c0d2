//! Access network, transport, and domain classification types.

use std::fmt;

use bitflags::bitflags;

/// Transport an emergency call can be routed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
	/// Wi-Fi (IMS over untrusted WLAN).
	Wlan,
	/// Cellular.
	Wwan,
}

impl TransportKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Wlan => "WLAN",
			Self::Wwan => "WWAN",
		}
	}
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Radio access network generations the selector distinguishes.
///
/// `Unknown` doubles as "no usable network found", both in registration
/// snapshots and in scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AccessNetwork {
	#[default]
	Unknown,
	/// GSM EDGE.
	Geran,
	/// UMTS.
	Utran,
	/// LTE.
	Eutran,
	Cdma2000,
	/// Wi-Fi access to the IMS core.
	Iwlan,
	/// 5G NR.
	Ngran,
}

impl AccessNetwork {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unknown => "UNKNOWN",
			Self::Geran => "GERAN",
			Self::Utran => "UTRAN",
			Self::Eutran => "EUTRAN",
			Self::Cdma2000 => "CDMA2000",
			Self::Iwlan => "IWLAN",
			Self::Ngran => "NGRAN",
		}
	}

	pub const fn is_known(self) -> bool {
		!matches!(self, Self::Unknown)
	}

	/// Domain an emergency call attaches on when this cellular network is
	/// chosen. EUTRAN and NGRAN carry emergency over IMS bearers; everything
	/// older falls back to circuit-switched signalling.
	pub const fn call_domain(self) -> CallDomain {
		match self {
			Self::Eutran | Self::Ngran => CallDomain::Ps,
			_ => CallDomain::Cs,
		}
	}
}

impl fmt::Display for AccessNetwork {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

bitflags! {
	/// Registration domains reported alongside a registration snapshot.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct NetworkDomain: u8 {
		/// Circuit-switched domain.
		const CS = 1 << 0;
		/// Packet-switched domain.
		const PS = 1 << 1;
	}
}

/// Domain finally chosen for an emergency call placed over cellular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallDomain {
	Cs,
	Ps,
}

impl CallDomain {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Cs => "CS",
			Self::Ps => "PS",
		}
	}
}

impl fmt::Display for CallDomain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Registration state attached to an [`EmergencyRegResult`].
///
/// [`EmergencyRegResult`]: crate::registration::EmergencyRegResult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegState {
	/// Not registered, or searching.
	#[default]
	Unregistered,
	Home,
	Roaming,
}

impl RegState {
	/// Whether normal (not emergency-only) service is available.
	pub const fn in_service(self) -> bool {
		matches!(self, Self::Home | Self::Roaming)
	}
}

/// One ranked entry of a carrier's emergency domain preference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DomainPreference {
	/// Circuit-switched emergency call.
	#[cfg_attr(feature = "serde", serde(rename = "CS"))]
	Cs,
	/// Packet-switched emergency call over cellular IMS.
	#[cfg_attr(feature = "serde", serde(rename = "PS_3GPP"))]
	Ps3gpp,
	/// Packet-switched emergency call over Wi-Fi.
	#[cfg_attr(feature = "serde", serde(rename = "PS_NON_3GPP"))]
	PsNon3gpp,
}

impl DomainPreference {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Cs => "CS",
			Self::Ps3gpp => "PS_3GPP",
			Self::PsNon3gpp => "PS_NON_3GPP",
		}
	}
}

impl fmt::Display for DomainPreference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Carrier-configured appetite for full-service results when scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ScanPreference {
	/// Accept whatever the modem finds first.
	#[default]
	NoPreference,
	/// Only accept networks offering full service.
	FullService,
	/// Demand full service first; fall back to limited service once a
	/// scan round comes back empty.
	FullThenLimited,
}

impl ScanPreference {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::NoPreference => "NO_PREFERENCE",
			Self::FullService => "FULL_SERVICE",
			Self::FullThenLimited => "FULL_THEN_LIMITED",
		}
	}
}

impl fmt::Display for ScanPreference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Service level demanded of an individual scan request.
///
/// A carrier [`ScanPreference`] ranks acceptable outcomes for the whole
/// attempt; a `ScanType` is what one concrete request asks the modem for.
/// Keeping the two apart stops a preference value from ever being compared
/// against a request value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanType {
	#[default]
	NoPreference,
	LimitedService,
	FullService,
}

impl ScanType {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::NoPreference => "NO_PREFERENCE",
			Self::LimitedService => "LIMITED_SERVICE",
			Self::FullService => "FULL_SERVICE",
		}
	}
}

impl fmt::Display for ScanType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

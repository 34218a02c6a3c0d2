//! Transport decisions and the scan interface toward the radio stack.

use mayday_primitives::{AccessNetwork, CallDomain, EmergencyRegResult, ScanType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One prioritized emergency network scan ordered by the engine.
#[derive(Debug)]
pub struct ScanRequest {
	/// Networks to probe, most preferred first.
	pub networks: Vec<AccessNetwork>,
	pub scan_type: ScanType,
	/// Observed by the radio stack to stop delivering results once the
	/// engine has abandoned the scan.
	pub cancel: CancellationToken,
	/// Completion port for the winning registration snapshot.
	pub responder: ScanResponder,
}

/// Posts one scan result back onto the selector's completion lane.
///
/// Consumed on use; a request produces at most one result. The lane is
/// unbounded and reserved for scan results, so delivery cannot be
/// refused by caller traffic backing up the command mailbox.
#[derive(Debug)]
pub struct ScanResponder {
	tx: mpsc::UnboundedSender<EmergencyRegResult>,
}

impl ScanResponder {
	pub(crate) fn new(tx: mpsc::UnboundedSender<EmergencyRegResult>) -> Self {
		Self { tx }
	}

	/// Delivers the scan outcome. An [`AccessNetwork::Unknown`] access
	/// network means the round found nothing usable.
	pub fn complete(self, result: EmergencyRegResult) {
		if self.tx.send(result).is_err() {
			// Receiver gone: the selector already tore down.
			tracing::debug!("scan.result.after_teardown");
		}
	}
}

/// Call-layer glue carrying out the engine's transport decisions.
pub trait TransportDriver: Send {
	/// The call proceeds over Wi-Fi. Terminal for the attempt.
	fn select_wlan(&mut self);

	/// Switch the attempt to cellular. The returned handle stays live
	/// while the cellular attempt is active; dropping it ends the
	/// attempt from the radio stack's point of view.
	fn select_wwan(&mut self) -> Box<dyn WwanHandle>;
}

/// Surface of an active cellular attempt.
pub trait WwanHandle: Send {
	/// Order a prioritized emergency network scan.
	fn request_scan(&mut self, request: ScanRequest);

	/// Final domain decision for the cellular call.
	fn select_domain(&mut self, domain: CallDomain);
}

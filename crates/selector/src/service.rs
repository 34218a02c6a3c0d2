//! Mailbox service around [`EmergencySelector`].
//!
//! One tokio task owns the engine. Caller requests and signals enter
//! through a bounded command mailbox and are applied in arrival order,
//! so the engine itself needs no locking. Scan results ride a separate
//! unbounded lane drained ahead of commands: a responder fires at most
//! once per scan, so the lane stays small, and the one message that
//! settles a scan is never refused because callers filled the mailbox.
//! The task also sleeps on the engine's scan deadline and converts it
//! into a timeout event.

use std::sync::Arc;

use mayday_primitives::{EmergencyRegResult, ImsRegistration, SelectionAttributes};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;

use crate::diag::EventLog;
use crate::engine::{EmergencySelector, SelectionPhase, WakeGuard};
use crate::policy::{DefaultPolicies, PolicyProvider};
use crate::subscriber::{StaticSubscriber, SubscriberGateway};
use crate::transport::TransportDriver;

/// Default bound of the command mailbox.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Commands accepted by a running selector.
#[derive(Debug)]
pub enum SelectorCommand {
	/// Begin selection for a call attempt.
	Start(SelectionAttributes),
	/// Barring signal: all emergency services barred, or not.
	BarringUpdate(bool),
	/// IMS registration signal.
	ImsRegistrationUpdate(ImsRegistration),
	/// IMS voice capability signal.
	ImsCapabilityUpdate(bool),
	/// Restart after the current attempt failed.
	Reselect(SelectionAttributes),
	/// Tear the selector down.
	Finish,
}

/// Failure submitting a command to the service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
	/// The service task is gone.
	#[error("selector service closed")]
	Closed,
	/// The mailbox is full.
	#[error("selector mailbox backlogged")]
	Backlogged,
}

/// Cloneable command port for a [`SelectorService`].
#[derive(Debug, Clone)]
pub struct SelectorHandle {
	tx: mpsc::Sender<SelectorCommand>,
}

impl SelectorHandle {
	pub fn start(&self, attributes: SelectionAttributes) -> Result<(), HandleError> {
		self.send(SelectorCommand::Start(attributes))
	}

	pub fn update_barring(&self, barred: bool) -> Result<(), HandleError> {
		self.send(SelectorCommand::BarringUpdate(barred))
	}

	pub fn update_ims_registration(
		&self,
		registration: ImsRegistration,
	) -> Result<(), HandleError> {
		self.send(SelectorCommand::ImsRegistrationUpdate(registration))
	}

	pub fn update_ims_capability(&self, voice_capable: bool) -> Result<(), HandleError> {
		self.send(SelectorCommand::ImsCapabilityUpdate(voice_capable))
	}

	pub fn reselect(&self, attributes: SelectionAttributes) -> Result<(), HandleError> {
		self.send(SelectorCommand::Reselect(attributes))
	}

	pub fn finish(&self) -> Result<(), HandleError> {
		self.send(SelectorCommand::Finish)
	}

	fn send(&self, command: SelectorCommand) -> Result<(), HandleError> {
		self.tx.try_send(command).map_err(|err| match err {
			mpsc::error::TrySendError::Full(_) => HandleError::Backlogged,
			mpsc::error::TrySendError::Closed(_) => HandleError::Closed,
		})
	}
}

/// Builder for [`SelectorService`]. Everything except the transport
/// driver has a default.
#[must_use]
pub struct SelectorServiceBuilder {
	driver: Box<dyn TransportDriver>,
	policies: Arc<dyn PolicyProvider>,
	subscriber: Arc<dyn SubscriberGateway>,
	log: Arc<EventLog>,
	wake: Option<WakeGuard>,
	cancel: CancellationToken,
	mailbox_capacity: usize,
}

impl SelectorServiceBuilder {
	fn new(driver: Box<dyn TransportDriver>) -> Self {
		Self {
			driver,
			policies: Arc::new(DefaultPolicies),
			subscriber: Arc::new(StaticSubscriber::default()),
			log: Arc::new(EventLog::default()),
			wake: None,
			cancel: CancellationToken::new(),
			mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
		}
	}

	pub fn policies(mut self, policies: Arc<dyn PolicyProvider>) -> Self {
		self.policies = policies;
		self
	}

	pub fn subscriber(mut self, subscriber: Arc<dyn SubscriberGateway>) -> Self {
		self.subscriber = subscriber;
		self
	}

	pub fn event_log(mut self, log: Arc<EventLog>) -> Self {
		self.log = log;
		self
	}

	/// Held for the lifetime of the selector and dropped exactly once at
	/// teardown, whichever way the service winds down.
	pub fn wake_guard(mut self, guard: WakeGuard) -> Self {
		self.wake = Some(guard);
		self
	}

	/// External kill switch observed by the service loop.
	pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// # Panics
	///
	/// Panics if `capacity` is zero.
	pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
		assert!(capacity > 0, "mailbox capacity must be non-zero");
		self.mailbox_capacity = capacity;
		self
	}

	pub fn build(self) -> (SelectorService, SelectorHandle) {
		let (tx, rx) = mpsc::channel(self.mailbox_capacity);
		let (results_tx, results) = mpsc::unbounded_channel();
		let mut engine = EmergencySelector::new(
			self.policies,
			self.subscriber,
			self.driver,
			self.log,
			results_tx,
		);
		if let Some(guard) = self.wake {
			engine = engine.with_wake_guard(guard);
		}
		let service = SelectorService {
			engine,
			rx,
			results,
			cancel: self.cancel,
		};
		(service, SelectorHandle { tx })
	}
}

/// Owns an [`EmergencySelector`], its mailbox, and the scan timeout.
pub struct SelectorService {
	engine: EmergencySelector,
	rx: mpsc::Receiver<SelectorCommand>,
	results: mpsc::UnboundedReceiver<EmergencyRegResult>,
	cancel: CancellationToken,
}

impl SelectorService {
	pub fn builder(driver: Box<dyn TransportDriver>) -> SelectorServiceBuilder {
		SelectorServiceBuilder::new(driver)
	}

	/// Kill switch observed by [`run`](Self::run).
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	/// Processes commands until the selector finishes, the token fires,
	/// or every handle is dropped. Teardown runs in all three cases.
	pub async fn run(mut self) {
		loop {
			let deadline = self.engine.scan_deadline();
			let timeout = async move {
				match deadline {
					Some(at) => sleep_until(at).await,
					None => std::future::pending().await,
				}
			};
			tokio::select! {
				biased;
				_ = self.cancel.cancelled() => {
					tracing::debug!("selector.service.cancelled");
					break;
				}
				// Result before command and deadline: the one message
				// that settles a scan must beat both a backlogged
				// mailbox and a due timer.
				Some(result) = self.results.recv() => {
					self.engine.handle_scan_result(result);
				}
				command = self.rx.recv() => {
					match command {
						Some(command) => self.engine.handle_command(command),
						None => {
							tracing::debug!("selector.service.handles_dropped");
							break;
						}
					}
				}
				_ = timeout => {
					self.engine.handle_scan_timeout();
				}
			}
			if self.engine.context().phase() == SelectionPhase::Finished {
				break;
			}
		}
		self.engine.finish();
	}

	/// Spawns [`run`](Self::run) on the current runtime.
	pub fn spawn(self) -> JoinHandle<()> {
		tokio::spawn(self.run())
	}
}

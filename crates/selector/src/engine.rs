//! Emergency domain selection engine.
//!
//! [`EmergencySelector`] is the synchronous decision core. It consumes
//! signals and turns them into scan orders and transport decisions; it
//! never blocks and never sleeps. The service loop in [`crate::service`]
//! owns the mailbox and sleeps on [`EmergencySelector::scan_deadline`].

mod candidates;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use mayday_primitives::{
	AccessNetwork, EmergencyRegResult, ImsRegistration, NetworkDomain, RegState, ScanPreference,
	ScanType, SelectionAttributes, SubscriptionId, TransportKind,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::diag::EventLog;
use crate::engine::candidates::RankingInputs;
use crate::policy::{CarrierPolicy, PolicyProvider};
use crate::service::SelectorCommand;
use crate::subscriber::SubscriberGateway;
use crate::transport::{ScanRequest, ScanResponder, TransportDriver, WwanHandle};

/// Token held while the selector is alive, typically a platform wake
/// lock. Dropped exactly once at teardown.
pub type WakeGuard = Box<dyn Send>;

bitflags! {
	/// Signals that must each arrive at least once before the first
	/// decision may run.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct SignalSet: u8 {
		/// Barring status delivered.
		const BARRING = 1 << 0;
		/// IMS registration state delivered.
		const IMS_REGISTRATION = 1 << 1;
		/// IMS voice capability delivered.
		const IMS_CAPABILITY = 1 << 2;
	}
}

/// Lifecycle of one selection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
	/// Constructed; selection not yet requested.
	Created,
	/// Selection requested; entry conditions not yet satisfied.
	Started,
	/// Blocked on the first delivery of one or more signals.
	AwaitingSignals,
	/// A network scan is outstanding.
	Scanning,
	/// A transport and domain decision went out to the driver.
	Selected,
	/// A caller-driven restart is being worked out.
	Reselecting,
	/// Terminal. Resources released; every further event is ignored.
	Finished,
}

/// Mutable per-attempt state, observable for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct SelectionContext {
	attributes: SelectionAttributes,
	phase: SelectionPhase,
	received: SignalSet,
	barred: bool,
	ims_registration: ImsRegistration,
	ims_voice_capable: bool,
	last_transport: Option<TransportKind>,
	last_network: AccessNetwork,
	cs_candidate: AccessNetwork,
	ps_candidate: AccessNetwork,
	try_cs_on_ps_failure: bool,
	vowifi_trials: u32,
	scan_type: ScanType,
	scanned_networks: Vec<AccessNetwork>,
}

impl SelectionContext {
	fn empty() -> Self {
		Self {
			attributes: SelectionAttributes::new("", SubscriptionId::INVALID),
			phase: SelectionPhase::Created,
			received: SignalSet::empty(),
			barred: false,
			ims_registration: ImsRegistration::Unregistered,
			ims_voice_capable: false,
			last_transport: None,
			last_network: AccessNetwork::Unknown,
			cs_candidate: AccessNetwork::Unknown,
			ps_candidate: AccessNetwork::Unknown,
			try_cs_on_ps_failure: false,
			vowifi_trials: 0,
			scan_type: ScanType::NoPreference,
			scanned_networks: Vec::new(),
		}
	}

	pub fn phase(&self) -> SelectionPhase {
		self.phase
	}

	pub fn attributes(&self) -> &SelectionAttributes {
		&self.attributes
	}

	pub fn received(&self) -> SignalSet {
		self.received
	}

	pub fn barred(&self) -> bool {
		self.barred
	}

	pub fn last_transport(&self) -> Option<TransportKind> {
		self.last_transport
	}

	/// Network of the most recent cellular domain decision.
	pub fn last_network(&self) -> AccessNetwork {
		self.last_network
	}

	pub fn vowifi_trials(&self) -> u32 {
		self.vowifi_trials
	}

	pub fn scan_type(&self) -> ScanType {
		self.scan_type
	}

	/// Candidate list of the most recent scan.
	pub fn scanned_networks(&self) -> &[AccessNetwork] {
		&self.scanned_networks
	}
}

/// Work queued behind a cellular handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterWwan {
	/// Run the initial decision from registration state.
	Decide,
	/// The Wi-Fi attempt failed; rescan keeping the previous candidates.
	RescanAfterWifiFailure,
}

/// Parameters of one scan issue.
#[derive(Debug, Clone, Copy)]
struct ScanTrigger {
	/// Arm the Wi-Fi fallback timer, subject to the policy checks.
	arm_timer: bool,
	/// Rank CS networks first.
	cs_preferred: bool,
	/// Reuse the previous candidate list instead of regenerating it.
	keep_candidates: bool,
}

/// Decision core for one emergency call attempt.
///
/// All methods are synchronous. The surrounding service serializes calls
/// and owns the scan timeout; embedders without a runtime can pump
/// [`SelectorCommand`]s into [`handle_command`](Self::handle_command) and
/// drain the result lane into
/// [`handle_scan_result`](Self::handle_scan_result) themselves.
pub struct EmergencySelector {
	ctx: SelectionContext,
	policy: CarrierPolicy,
	policies: Arc<dyn PolicyProvider>,
	subscriber: Arc<dyn SubscriberGateway>,
	driver: Box<dyn TransportDriver>,
	wwan: Option<Box<dyn WwanHandle>>,
	scan_cancel: Option<CancellationToken>,
	scan_deadline: Option<Instant>,
	results: mpsc::UnboundedSender<EmergencyRegResult>,
	log: Arc<EventLog>,
	wake: Option<WakeGuard>,
}

impl EmergencySelector {
	/// `results` is the lane scan results are posted back on. It is
	/// separate from the command mailbox so a backlog of caller traffic
	/// can never cost a scan its one result;
	/// [`crate::service::SelectorService`] drains it ahead of commands.
	pub fn new(
		policies: Arc<dyn PolicyProvider>,
		subscriber: Arc<dyn SubscriberGateway>,
		driver: Box<dyn TransportDriver>,
		log: Arc<EventLog>,
		results: mpsc::UnboundedSender<EmergencyRegResult>,
	) -> Self {
		Self {
			ctx: SelectionContext::empty(),
			policy: CarrierPolicy::default(),
			policies,
			subscriber,
			driver,
			wwan: None,
			scan_cancel: None,
			scan_deadline: None,
			results,
			log,
			wake: None,
		}
	}

	#[must_use]
	pub fn with_wake_guard(mut self, guard: WakeGuard) -> Self {
		self.wake = Some(guard);
		self
	}

	pub fn context(&self) -> &SelectionContext {
		&self.ctx
	}

	pub fn policy(&self) -> &CarrierPolicy {
		&self.policy
	}

	pub fn event_log(&self) -> &EventLog {
		&self.log
	}

	/// Deadline of the armed Wi-Fi fallback timer, if any.
	pub fn scan_deadline(&self) -> Option<Instant> {
		self.scan_deadline
	}

	/// Applies one queued command. The service loop feeds every command
	/// through here in arrival order.
	pub fn handle_command(&mut self, command: SelectorCommand) {
		match command {
			SelectorCommand::Start(attributes) => self.start(attributes),
			SelectorCommand::BarringUpdate(barred) => self.update_barring(barred),
			SelectorCommand::ImsRegistrationUpdate(reg) => self.update_ims_registration(reg),
			SelectorCommand::ImsCapabilityUpdate(voice) => self.update_ims_capability(voice),
			SelectorCommand::Reselect(attributes) => self.reselect(attributes),
			SelectorCommand::Finish => self.finish(),
		}
	}

	/// Begins selection for the given call attributes.
	///
	/// Snapshots the carrier policy, then either runs the first decision
	/// or parks until the required signals arrive. With no usable SIM the
	/// cached IMS values stand in for the real signals and only barring
	/// remains awaited.
	pub fn start(&mut self, attributes: SelectionAttributes) {
		if self.ctx.phase != SelectionPhase::Created {
			tracing::debug!(phase = ?self.ctx.phase, "selector.start.ignored");
			return;
		}
		let sub = attributes.subscription;
		let reg_network = attributes
			.reg_result
			.as_ref()
			.map_or(AccessNetwork::Unknown, |r| r.access_network);
		self.policy = self.load_policy(sub);
		self.ctx.attributes = attributes;
		self.ctx.phase = SelectionPhase::Started;
		self.ctx.scan_type = initial_scan_type(self.policy.scan_preference);
		self.note(format!("start: {sub} reg={reg_network}"));
		if sub.is_valid() {
			self.run_selection();
		} else {
			let reg = self.ctx.ims_registration;
			let voice = self.ctx.ims_voice_capable;
			self.update_ims_registration(reg);
			self.update_ims_capability(voice);
		}
	}

	/// Barring signal. The caller reduces the platform's barring report
	/// to "all emergency services barred" before delivering it here.
	pub fn update_barring(&mut self, barred: bool) {
		if self.ctx.phase == SelectionPhase::Finished {
			return;
		}
		self.ctx.received |= SignalSet::BARRING;
		self.ctx.barred = barred;
		tracing::debug!(barred, "selector.signal.barring");
		self.run_selection();
	}

	pub fn update_ims_registration(&mut self, registration: ImsRegistration) {
		if self.ctx.phase == SelectionPhase::Finished {
			return;
		}
		self.ctx.received |= SignalSet::IMS_REGISTRATION;
		self.ctx.ims_registration = registration;
		tracing::debug!(?registration, "selector.signal.ims_registration");
		self.run_selection();
	}

	pub fn update_ims_capability(&mut self, voice_capable: bool) {
		if self.ctx.phase == SelectionPhase::Finished {
			return;
		}
		self.ctx.received |= SignalSet::IMS_CAPABILITY;
		self.ctx.ims_voice_capable = voice_capable;
		tracing::debug!(voice_capable, "selector.signal.ims_capability");
		self.run_selection();
	}

	/// Scan result drained from the result lane. Results from a scan the
	/// engine no longer waits on are dropped.
	pub fn handle_scan_result(&mut self, result: EmergencyRegResult) {
		if self.ctx.phase != SelectionPhase::Scanning {
			tracing::debug!(phase = ?self.ctx.phase, "selector.scan.result_ignored");
			return;
		}
		self.note(format!(
			"scan result: {} {:?}",
			result.access_network, result.reg_state
		));
		if result.access_network == AccessNetwork::Unknown {
			if self.policy.scan_preference == ScanPreference::FullThenLimited
				|| self.ctx.scan_type == ScanType::FullService
			{
				// Limited-service retry: same candidates, same cancellation.
				self.ctx.scan_type = ScanType::LimitedService;
				self.note("scan empty: retrying for limited service");
				if let Some(cancel) = self.scan_cancel.clone() {
					self.issue_scan(cancel);
				}
			} else {
				self.request_scan(ScanTrigger {
					arm_timer: false,
					cs_preferred: false,
					keep_candidates: false,
				});
			}
			return;
		}
		self.scan_deadline = None;
		self.scan_cancel = None;
		self.select_wwan_network(result.access_network);
	}

	/// Wi-Fi fallback timer fired. Moves the attempt to Wi-Fi when IMS is
	/// registered for voice over WLAN; otherwise the scan keeps running.
	/// Stale timeouts arriving after the scan settled are ignored.
	pub fn handle_scan_timeout(&mut self) {
		if self.ctx.phase != SelectionPhase::Scanning {
			tracing::trace!(phase = ?self.ctx.phase, "selector.timeout.stale");
			return;
		}
		self.scan_deadline = None;
		if !self.ims_voice_over_wlan() {
			self.note("scan timeout: wifi not ready, scan continues");
			return;
		}
		self.note("scan timeout: falling back to wifi");
		if let Some(cancel) = self.scan_cancel.take() {
			cancel.cancel();
		}
		self.select_wlan();
	}

	/// Caller-driven restart after the current attempt failed.
	/// `attributes` carries the latest registration snapshot.
	///
	/// A failed attempt implies a prior decision, so anything but the
	/// Selected phase rejects the request.
	pub fn reselect(&mut self, attributes: SelectionAttributes) {
		if self.ctx.phase != SelectionPhase::Selected {
			tracing::debug!(phase = ?self.ctx.phase, "selector.reselect.ignored");
			return;
		}
		self.ctx.attributes = attributes;
		self.ctx.phase = SelectionPhase::Reselecting;
		self.note(format!(
			"reselect: try_cs={} last={:?}",
			self.ctx.try_cs_on_ps_failure, self.ctx.last_transport
		));
		if self.ctx.try_cs_on_ps_failure {
			self.ctx.try_cs_on_ps_failure = false;
			let cs = self.selectable_cs_network();
			self.ctx.cs_candidate = cs;
			if cs.is_known() {
				self.select_wwan_network(cs);
				return;
			}
		} else if self.ims_unusable() {
			self.ctx.cs_candidate = AccessNetwork::Utran;
			self.note("ims unusable: cs fallback over utran");
			self.select_wwan_network(AccessNetwork::Utran);
			return;
		}
		if self.ctx.last_transport == Some(TransportKind::Wlan) {
			self.select_wwan_then(AfterWwan::RescanAfterWifiFailure);
			return;
		}
		self.request_scan(ScanTrigger {
			arm_timer: true,
			cs_preferred: false,
			keep_candidates: false,
		});
	}

	/// Terminal teardown: cancels any in-flight scan, drops the cellular
	/// handle, and releases the wake guard. Idempotent.
	pub fn finish(&mut self) {
		if self.ctx.phase == SelectionPhase::Finished {
			return;
		}
		if let Some(cancel) = self.scan_cancel.take() {
			cancel.cancel();
		}
		self.scan_deadline = None;
		self.wwan = None;
		self.ctx.phase = SelectionPhase::Finished;
		self.wake = None;
		self.note("finished");
	}

	/// Runs the decision if the entry conditions hold. Every signal
	/// arrival funnels through here, which makes redundant deliveries
	/// harmless.
	fn run_selection(&mut self) {
		match self.ctx.phase {
			SelectionPhase::Created
			| SelectionPhase::Scanning
			| SelectionPhase::Selected
			| SelectionPhase::Reselecting
			| SelectionPhase::Finished => return,
			SelectionPhase::Started | SelectionPhase::AwaitingSignals => {}
		}
		if !self.ctx.received.is_all() {
			self.ctx.phase = SelectionPhase::AwaitingSignals;
			let missing = SignalSet::all() - self.ctx.received;
			tracing::debug!(?missing, "selector.awaiting_signals");
			return;
		}
		if self.wifi_preferred() {
			self.note("wifi preferred: selecting wlan");
			self.select_wlan();
		} else {
			self.select_wwan_then(AfterWwan::Decide);
		}
	}

	/// First decision once all signals are in and the attempt is on
	/// cellular.
	fn decide_from_registration(&mut self) {
		if self.ims_unusable() {
			self.ctx.cs_candidate = AccessNetwork::Utran;
			self.note("ims unusable: cs fallback over utran");
			self.select_wwan_network(AccessNetwork::Utran);
			return;
		}

		let cs_in_service = self.in_service_domain(NetworkDomain::CS);
		let ps_in_service = self.in_service_domain(NetworkDomain::PS);
		if !cs_in_service && !ps_in_service {
			let ps = self.selectable_ps_network(false);
			self.ctx.ps_candidate = ps;
			self.note(format!("out of service: limited ps candidate {ps}"));
			if ps.is_known() {
				self.select_wwan_network(ps);
			} else {
				self.request_scan(ScanTrigger {
					arm_timer: true,
					cs_preferred: false,
					keep_candidates: false,
				});
			}
			return;
		}

		// Selection between in-service domains per 3GPP TS 23.167 Annex H;
		// a domain without service never yields a candidate.
		let cs = if cs_in_service {
			self.selectable_cs_network()
		} else {
			AccessNetwork::Unknown
		};
		let ps = if ps_in_service {
			self.selectable_ps_network(true)
		} else {
			AccessNetwork::Unknown
		};
		self.ctx.cs_candidate = cs;
		self.ctx.ps_candidate = ps;
		self.note(format!("candidates: cs={cs} ps={ps}"));
		match (cs.is_known(), ps.is_known()) {
			(true, true) => {
				if self.policy.prefer_ims_when_calls_on_cs || self.ims_registered_with_voice() {
					self.ctx.try_cs_on_ps_failure = true;
					self.select_wwan_network(ps);
				} else if self.deactivated_sim() {
					self.select_wwan_network(ps);
				} else {
					self.select_wwan_network(cs);
				}
			}
			(false, true) => {
				if !self.policy.requires_ims_registration || self.ims_registered_with_voice() {
					self.select_wwan_network(ps);
				} else if self.deactivated_sim() {
					self.select_wwan_network(ps);
				} else {
					self.request_scan(ScanTrigger {
						arm_timer: true,
						cs_preferred: true,
						keep_candidates: false,
					});
				}
			}
			(true, false) => self.select_wwan_network(cs),
			(false, false) => {
				let cs_preferred =
					self.policy.requires_ims_registration && !self.ims_registered_with_voice();
				self.request_scan(ScanTrigger {
					arm_timer: true,
					cs_preferred,
					keep_candidates: false,
				});
			}
		}
	}

	fn request_scan(&mut self, trigger: ScanTrigger) {
		self.note(format!(
			"scan: timer={} cs_preferred={} keep={}",
			trigger.arm_timer, trigger.cs_preferred, trigger.keep_candidates
		));
		let cancel = CancellationToken::new();
		if let Some(previous) = self.scan_cancel.replace(cancel.clone()) {
			// A superseded scan must not outlive its replacement.
			previous.cancel();
		}
		let roaming = self.roaming();
		if !trigger.keep_candidates {
			self.ctx.scanned_networks = candidates::next_preferred_networks(RankingInputs {
				policy: &self.policy,
				roaming,
				cs_preferred: trigger.cs_preferred,
				last_network: self.ctx.last_network,
				number: &self.ctx.attributes.number,
			});
		}
		if roaming && self.policy.scan_preference == ScanPreference::FullService {
			// Full-service-only scans apply on the home network only.
			self.ctx.scan_type = ScanType::NoPreference;
		}
		self.ctx.phase = SelectionPhase::Scanning;
		self.issue_scan(cancel);
		if trigger.arm_timer && self.ctx.attributes.subscription.is_valid() {
			let timeout = self.policy.scan_timeout;
			if self.policy.supports_emergency_over_wifi(roaming)
				&& timeout > Duration::ZERO
				&& self.ctx.vowifi_trials < self.policy.max_vowifi_trials
			{
				// Replaces any timer already pending.
				self.scan_deadline = Some(Instant::now() + timeout);
				tracing::debug!(?timeout, "selector.scan.timer_armed");
			}
		}
	}

	fn issue_scan(&mut self, cancel: CancellationToken) {
		if self.wwan.is_none() {
			tracing::warn!("selector.scan.no_wwan_handle");
			return;
		}
		let request = ScanRequest {
			networks: self.ctx.scanned_networks.clone(),
			scan_type: self.ctx.scan_type,
			cancel,
			responder: ScanResponder::new(self.results.clone()),
		};
		tracing::debug!(
			networks = ?request.networks,
			scan_type = %request.scan_type,
			"selector.scan.request"
		);
		if let Some(wwan) = self.wwan.as_mut() {
			wwan.request_scan(request);
		}
	}

	fn select_wlan(&mut self) {
		if self.ctx.last_transport == Some(TransportKind::Wlan) {
			tracing::debug!("selector.wlan.duplicate");
			return;
		}
		self.ctx.phase = SelectionPhase::Selected;
		self.ctx.last_transport = Some(TransportKind::Wlan);
		self.ctx.vowifi_trials += 1;
		self.note(format!("transport: wlan (trial {})", self.ctx.vowifi_trials));
		self.driver.select_wlan();
		self.wwan = None;
	}

	fn select_wwan_then(&mut self, next: AfterWwan) {
		if self.ctx.last_transport == Some(TransportKind::Wwan) {
			// A second handoff would tear down the attempt the driver is
			// already running; the queued work is dropped with it.
			tracing::debug!(?next, "selector.wwan.duplicate");
			return;
		}
		self.ctx.last_transport = Some(TransportKind::Wwan);
		self.note("transport: wwan");
		self.wwan = Some(self.driver.select_wwan());
		match next {
			AfterWwan::Decide => self.decide_from_registration(),
			AfterWwan::RescanAfterWifiFailure => self.request_scan(ScanTrigger {
				arm_timer: true,
				cs_preferred: false,
				keep_candidates: true,
			}),
		}
	}

	fn select_wwan_network(&mut self, network: AccessNetwork) {
		if self.wwan.is_none() {
			tracing::debug!(%network, "selector.wwan.network_without_handle");
			return;
		}
		self.ctx.phase = SelectionPhase::Selected;
		self.ctx.last_network = network;
		let domain = network.call_domain();
		self.note(format!("domain: {domain} over {network}"));
		if let Some(wwan) = self.wwan.as_mut() {
			wwan.select_domain(domain);
		}
	}

	/// Wi-Fi wins outright only when the carrier ranks it first and IMS
	/// is already registered for voice over WLAN.
	fn wifi_preferred(&self) -> bool {
		if !self.ctx.attributes.subscription.is_valid() {
			return false;
		}
		self.policy.wifi_rank(self.roaming()) == Some(0) && self.ims_voice_over_wlan()
	}

	/// PS emergency unusable on this carrier: no IMS networks configured,
	/// or VoLTE is required and the user has it off.
	fn ims_unusable(&self) -> bool {
		self.policy.ims_networks(self.roaming()).is_empty()
			|| (self.policy.requires_volte_enabled && !self.advanced_calling_enabled())
	}

	fn ims_registered_with_voice(&self) -> bool {
		self.ctx.ims_registration.is_registered() && self.ctx.ims_voice_capable
	}

	fn ims_voice_over_wlan(&self) -> bool {
		self.ctx.ims_registration.over_wlan() && self.ctx.ims_voice_capable
	}

	fn in_service_domain(&self, domain: NetworkDomain) -> bool {
		self.ctx
			.attributes
			.reg_result
			.as_ref()
			.is_some_and(|reg| reg.reg_state.in_service() && reg.supports_domain(domain))
	}

	/// CS network reachable without scanning. EUTRAN with a CS-capable
	/// attach means falling back to UTRAN.
	fn selectable_cs_network(&self) -> AccessNetwork {
		let Some(reg) = self.ctx.attributes.reg_result.as_ref() else {
			return AccessNetwork::Unknown;
		};
		let cs_networks = candidates::cs_networks_for_number(
			&self.policy,
			self.roaming(),
			&self.ctx.attributes.number,
		);
		if cs_networks.contains(&reg.access_network) {
			return reg.access_network;
		}
		if reg.access_network == AccessNetwork::Eutran && reg.supports_domain(NetworkDomain::CS) {
			return AccessNetwork::Utran;
		}
		AccessNetwork::Unknown
	}

	/// PS network reachable without scanning. `in_service` distinguishes
	/// a normal attach from the limited-service path, which tolerates a
	/// missing VoPS indicator on EUTRAN.
	fn selectable_ps_network(&self, in_service: bool) -> AccessNetwork {
		if self.ctx.barred {
			return AccessNetwork::Unknown;
		}
		let Some(reg) = self.ctx.attributes.reg_result.as_ref() else {
			return AccessNetwork::Unknown;
		};
		if !self
			.policy
			.ims_networks(self.roaming())
			.contains(&reg.access_network)
		{
			return AccessNetwork::Unknown;
		}
		match reg.access_network {
			AccessNetwork::Ngran if reg.nw_provided_emc && reg.vops_supported => {
				AccessNetwork::Ngran
			}
			AccessNetwork::Eutran
				if reg.emc_bearer_supported && (reg.vops_supported || !in_service) =>
			{
				AccessNetwork::Eutran
			}
			_ => AccessNetwork::Unknown,
		}
	}

	/// Roaming determination. Registration state wins when decisive;
	/// otherwise the SIM country is compared with the serving network
	/// country. Unknown countries count as not roaming.
	fn roaming(&self) -> bool {
		let sub = self.ctx.attributes.subscription;
		if !sub.is_valid() {
			return false;
		}
		let reg = self.ctx.attributes.reg_result.as_ref();
		match reg.map(|r| r.reg_state) {
			Some(RegState::Home) => false,
			Some(RegState::Roaming) => true,
			_ => {
				let sim = self
					.subscriber
					.sim_country(sub)
					.ok()
					.flatten()
					.filter(|iso| !iso.is_empty());
				// An empty ISO from the registration falls back to the
				// gateway's view of the serving network.
				let network = reg
					.and_then(|r| r.country_iso.clone())
					.filter(|iso| !iso.is_empty())
					.or_else(|| self.subscriber.network_country(sub).ok().flatten())
					.filter(|iso| !iso.is_empty());
				match (sim, network) {
					(Some(sim), Some(network)) => sim != network,
					_ => false,
				}
			}
		}
	}

	fn advanced_calling_enabled(&self) -> bool {
		let sub = self.ctx.attributes.subscription;
		if !sub.is_valid() {
			return true;
		}
		match self.subscriber.advanced_calling_enabled(sub) {
			Ok(enabled) => enabled,
			Err(err) => {
				// Assume enabled rather than block the PS attempt.
				tracing::debug!(%err, "selector.subscriber.advanced_calling_failed");
				true
			}
		}
	}

	fn deactivated_sim(&self) -> bool {
		let sub = self.ctx.attributes.subscription;
		if !sub.is_valid() {
			return false;
		}
		match self.subscriber.data_deactivated(sub) {
			Ok(deactivated) => deactivated,
			Err(err) => {
				tracing::debug!(%err, "selector.subscriber.data_state_failed");
				false
			}
		}
	}

	fn load_policy(&self, subscription: SubscriptionId) -> CarrierPolicy {
		let mut policy = self.policies.policy(subscription).unwrap_or_default();
		if !subscription.is_valid() {
			// No SIM: emergency attach is still possible on any LTE or NR
			// cell, whatever the last carrier configured.
			policy.ims_networks = vec![AccessNetwork::Eutran, AccessNetwork::Ngran];
			policy.ims_networks_roaming = policy.ims_networks.clone();
		}
		policy
	}

	fn note(&self, line: impl Into<String>) {
		let line = line.into();
		tracing::debug!("{line}");
		self.log.record(line);
	}
}

const fn initial_scan_type(preference: ScanPreference) -> ScanType {
	match preference {
		ScanPreference::FullService | ScanPreference::FullThenLimited => ScanType::FullService,
		ScanPreference::NoPreference => ScanType::NoPreference,
	}
}

use mayday_primitives::{CallDomain, DomainPreference};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::subscriber::StaticSubscriber;

const NUMBER: &str = "911";

fn sub() -> SubscriptionId {
	SubscriptionId(0)
}

fn attrs(reg: Option<EmergencyRegResult>) -> SelectionAttributes {
	let attributes = SelectionAttributes::new(NUMBER, sub());
	match reg {
		Some(reg) => attributes.with_reg_result(reg),
		None => attributes,
	}
}

fn eutran_home_combined() -> EmergencyRegResult {
	EmergencyRegResult::new(
		AccessNetwork::Eutran,
		RegState::Home,
		NetworkDomain::CS | NetworkDomain::PS,
	)
	.with_vops(true)
	.with_emc_bearer(true)
}

fn eutran_limited() -> EmergencyRegResult {
	EmergencyRegResult::new(
		AccessNetwork::Eutran,
		RegState::Unregistered,
		NetworkDomain::PS,
	)
	.with_emc_bearer(true)
}

fn wifi_first_policy() -> CarrierPolicy {
	CarrierPolicy {
		domain_preference: vec![
			DomainPreference::PsNon3gpp,
			DomainPreference::Ps3gpp,
			DomainPreference::Cs,
		],
		..CarrierPolicy::default()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DriverEvent {
	Wlan,
	Wwan,
	Scan {
		networks: Vec<AccessNetwork>,
		scan_type: ScanType,
	},
	Domain(CallDomain),
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<DriverEvent>>>);

impl Recorder {
	fn push(&self, event: DriverEvent) {
		self.0.lock().push(event);
	}

	fn events(&self) -> Vec<DriverEvent> {
		self.0.lock().clone()
	}
}

struct MockDriver {
	recorder: Recorder,
	scans: Arc<Mutex<Vec<ScanRequest>>>,
	tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl TransportDriver for MockDriver {
	fn select_wlan(&mut self) {
		self.recorder.push(DriverEvent::Wlan);
	}

	fn select_wwan(&mut self) -> Box<dyn WwanHandle> {
		self.recorder.push(DriverEvent::Wwan);
		Box::new(MockWwan {
			recorder: self.recorder.clone(),
			scans: self.scans.clone(),
			tokens: self.tokens.clone(),
		})
	}
}

struct MockWwan {
	recorder: Recorder,
	scans: Arc<Mutex<Vec<ScanRequest>>>,
	tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl WwanHandle for MockWwan {
	fn request_scan(&mut self, request: ScanRequest) {
		self.recorder.push(DriverEvent::Scan {
			networks: request.networks.clone(),
			scan_type: request.scan_type,
		});
		self.tokens.lock().push(request.cancel.clone());
		self.scans.lock().push(request);
	}

	fn select_domain(&mut self, domain: CallDomain) {
		self.recorder.push(DriverEvent::Domain(domain));
	}
}

struct Harness {
	engine: EmergencySelector,
	rx: mpsc::UnboundedReceiver<EmergencyRegResult>,
	recorder: Recorder,
	scans: Arc<Mutex<Vec<ScanRequest>>>,
	tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl Harness {
	fn new(policy: CarrierPolicy) -> Self {
		Self::with_subscriber(policy, StaticSubscriber::default())
	}

	fn with_subscriber(policy: CarrierPolicy, subscriber: StaticSubscriber) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let recorder = Recorder::default();
		let scans = Arc::new(Mutex::new(Vec::new()));
		let tokens = Arc::new(Mutex::new(Vec::new()));
		let driver = MockDriver {
			recorder: recorder.clone(),
			scans: scans.clone(),
			tokens: tokens.clone(),
		};
		let engine = EmergencySelector::new(
			Arc::new(policy),
			Arc::new(subscriber),
			Box::new(driver),
			Arc::new(EventLog::default()),
			tx,
		);
		Self {
			engine,
			rx,
			recorder,
			scans,
			tokens,
		}
	}

	fn deliver_signals(&mut self, barred: bool, registration: ImsRegistration, voice: bool) {
		self.engine.update_barring(barred);
		self.engine.update_ims_registration(registration);
		self.engine.update_ims_capability(voice);
	}

	fn events(&self) -> Vec<DriverEvent> {
		self.recorder.events()
	}

	fn issued_scans(&self) -> usize {
		self.tokens.lock().len()
	}

	fn token(&self, index: usize) -> CancellationToken {
		self.tokens.lock()[index].clone()
	}

	/// Completes the oldest unanswered scan and pumps the queued result,
	/// the way the service loop would.
	fn answer_scan(&mut self, result: EmergencyRegResult) {
		assert!(self.try_answer_scan(result), "no scan outstanding");
	}

	fn try_answer_scan(&mut self, result: EmergencyRegResult) -> bool {
		let request = {
			let mut scans = self.scans.lock();
			if scans.is_empty() {
				return false;
			}
			scans.remove(0)
		};
		request.responder.complete(result);
		self.pump();
		true
	}

	fn pump(&mut self) {
		while let Ok(result) = self.rx.try_recv() {
			self.engine.handle_scan_result(result);
		}
	}
}

#[test]
fn test_combined_attach_selects_ps_and_arms_cs_fallback() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Ps)]
	);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Selected);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Eutran);
}

#[test]
fn test_ims_preferred_policy_picks_ps_without_registration() {
	let policy = CarrierPolicy {
		prefer_ims_when_calls_on_cs: true,
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Ps)]
	);

	// CS stayed viable, so the failure path skips straight to it.
	h.engine.reselect(attrs(Some(eutran_home_combined())));
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Domain(CallDomain::Cs))
	);
	assert_eq!(h.issued_scans(), 0);
}

#[test]
fn test_reselect_after_ps_failure_falls_back_to_cs() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);

	h.engine.reselect(attrs(Some(eutran_home_combined())));

	// CS retry reuses the live cellular attempt: no second handoff, no scan.
	assert_eq!(
		h.events(),
		vec![
			DriverEvent::Wwan,
			DriverEvent::Domain(CallDomain::Ps),
			DriverEvent::Domain(CallDomain::Cs),
		]
	);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Utran);
	assert_eq!(h.issued_scans(), 0);
}

#[test]
fn test_legacy_attach_selects_cs_without_scan() {
	let mut h = Harness::new(CarrierPolicy::default());
	let reg = EmergencyRegResult::new(AccessNetwork::Utran, RegState::Home, NetworkDomain::CS);
	h.engine.start(attrs(Some(reg)));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Cs)]
	);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Utran);
	assert_eq!(h.issued_scans(), 0);
}

#[test]
fn test_out_of_service_scans_in_preference_order() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events(),
		vec![
			DriverEvent::Wwan,
			DriverEvent::Scan {
				networks: vec![
					AccessNetwork::Eutran,
					AccessNetwork::Utran,
					AccessNetwork::Geran,
				],
				scan_type: ScanType::NoPreference,
			},
		]
	);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Scanning);
	assert!(h.engine.scan_deadline().is_some());

	h.answer_scan(eutran_limited());

	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Domain(CallDomain::Ps))
	);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Selected);
	assert_eq!(h.engine.scan_deadline(), None);
}

#[test]
fn test_barred_ps_falls_back_to_cs() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(true, ImsRegistration::Registered(TransportKind::Wwan), true);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Cs)]
	);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Utran);
}

#[test]
fn test_selection_waits_for_every_signal() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.engine.update_barring(false);
	h.engine
		.update_ims_registration(ImsRegistration::Registered(TransportKind::Wwan));

	// Two of three signals in: no decision yet.
	assert_eq!(h.events(), vec![]);
	assert_eq!(h.engine.context().phase(), SelectionPhase::AwaitingSignals);

	h.engine.update_ims_capability(true);

	assert_eq!(h.engine.context().phase(), SelectionPhase::Selected);
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Domain(CallDomain::Ps))
	);
}

#[test]
fn test_redundant_signals_after_selection_change_nothing() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);
	let settled = h.events();

	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(h.events(), settled);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Selected);
}

#[test]
fn test_wifi_first_policy_selects_wlan_directly() {
	let mut h = Harness::new(wifi_first_policy());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wlan), true);

	assert_eq!(h.events(), vec![DriverEvent::Wlan]);
	assert_eq!(h.engine.context().last_transport(), Some(TransportKind::Wlan));
	assert_eq!(h.engine.context().vowifi_trials(), 1);
}

#[test]
fn test_wifi_failure_moves_to_cellular_scan() {
	let mut h = Harness::new(wifi_first_policy());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wlan), true);

	h.engine.reselect(attrs(Some(eutran_home_combined())));

	assert_eq!(
		h.events(),
		vec![
			DriverEvent::Wlan,
			DriverEvent::Wwan,
			DriverEvent::Scan {
				networks: vec![],
				scan_type: ScanType::NoPreference,
			},
		]
	);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Scanning);
	// The single Wi-Fi trial is spent, so the fallback timer stays off.
	assert_eq!(h.engine.scan_deadline(), None);
}

#[test]
fn test_scan_timeout_with_wifi_ready_falls_back() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wlan), true);
	assert!(h.engine.scan_deadline().is_some());

	h.engine.handle_scan_timeout();

	assert!(h.token(0).is_cancelled());
	assert_eq!(h.events().last(), Some(&DriverEvent::Wlan));
	assert_eq!(h.engine.context().vowifi_trials(), 1);

	// A late result from the abandoned scan must not pick a domain.
	assert!(h.try_answer_scan(eutran_limited()));
	assert!(!h.events().contains(&DriverEvent::Domain(CallDomain::Ps)));
}

#[test]
fn test_scan_timeout_without_wifi_keeps_scanning() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);
	assert!(h.engine.scan_deadline().is_some());

	h.engine.handle_scan_timeout();

	assert_eq!(h.engine.context().phase(), SelectionPhase::Scanning);
	assert!(!h.token(0).is_cancelled());
	assert_eq!(h.engine.scan_deadline(), None);

	h.answer_scan(eutran_limited());
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Domain(CallDomain::Ps))
	);
}

#[test]
fn test_empty_full_scan_widens_to_limited_in_place() {
	let policy = CarrierPolicy {
		scan_preference: ScanPreference::FullThenLimited,
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);
	let deadline = h.engine.scan_deadline();
	let networks = vec![
		AccessNetwork::Eutran,
		AccessNetwork::Utran,
		AccessNetwork::Geran,
	];
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Scan {
			networks: networks.clone(),
			scan_type: ScanType::FullService,
		})
	);

	h.answer_scan(EmergencyRegResult::none());

	// Widened retry: same candidates, same cancellation, wider net.
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Scan {
			networks,
			scan_type: ScanType::LimitedService,
		})
	);
	assert!(!h.token(0).is_cancelled());
	h.token(0).cancel();
	assert!(h.token(1).is_cancelled());
	assert_eq!(h.engine.scan_deadline(), deadline);
}

#[test]
fn test_full_then_limited_reissues_limited_continuously() {
	let policy = CarrierPolicy {
		scan_preference: ScanPreference::FullThenLimited,
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);
	let deadline = h.engine.scan_deadline();

	h.answer_scan(EmergencyRegResult::none());
	h.answer_scan(EmergencyRegResult::none());

	// Every empty round re-issues the limited retry on the one token.
	assert_eq!(h.issued_scans(), 3);
	assert!(!h.token(2).is_cancelled());
	h.token(0).cancel();
	assert!(h.token(2).is_cancelled());
	match h.events().last() {
		Some(DriverEvent::Scan { scan_type, .. }) => {
			assert_eq!(*scan_type, ScanType::LimitedService);
		}
		other => panic!("expected a scan, got {other:?}"),
	}
	// The Wi-Fi fallback timer rides across retries.
	assert_eq!(h.engine.scan_deadline(), deadline);
}

#[test]
fn test_full_service_widens_once_then_restarts_limited() {
	let policy = CarrierPolicy {
		scan_preference: ScanPreference::FullService,
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	h.answer_scan(EmergencyRegResult::none());

	// First empty round widens on the same token.
	assert_eq!(h.issued_scans(), 2);
	h.token(0).cancel();
	assert!(h.token(1).is_cancelled());

	let mut h = Harness::new(CarrierPolicy {
		scan_preference: ScanPreference::FullService,
		..CarrierPolicy::default()
	});
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);
	h.answer_scan(EmergencyRegResult::none());
	h.answer_scan(EmergencyRegResult::none());

	// Once limited, further empty rounds restart fresh, still limited.
	assert_eq!(h.issued_scans(), 3);
	assert!(h.token(1).is_cancelled());
	assert!(!h.token(2).is_cancelled());
	match h.events().last() {
		Some(DriverEvent::Scan { scan_type, .. }) => {
			assert_eq!(*scan_type, ScanType::LimitedService);
		}
		other => panic!("expected a scan, got {other:?}"),
	}
}

#[test]
fn test_empty_scan_restarts_with_fresh_cancellation() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	h.answer_scan(EmergencyRegResult::none());

	assert_eq!(h.issued_scans(), 2);
	assert!(h.token(0).is_cancelled());
	assert!(!h.token(1).is_cancelled());
}

#[test]
fn test_ims_registration_required_scans_cs_first() {
	let policy = CarrierPolicy {
		requires_ims_registration: true,
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	let reg = EmergencyRegResult::new(AccessNetwork::Eutran, RegState::Home, NetworkDomain::PS)
		.with_vops(true)
		.with_emc_bearer(true);
	h.engine.start(attrs(Some(reg)));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Scan {
			networks: vec![
				AccessNetwork::Utran,
				AccessNetwork::Geran,
				AccessNetwork::Eutran,
			],
			scan_type: ScanType::NoPreference,
		})
	);
	assert!(h.engine.scan_deadline().is_some());
}

#[test]
fn test_deactivated_sim_dials_ps_without_registration() {
	let policy = CarrierPolicy {
		requires_ims_registration: true,
		..CarrierPolicy::default()
	};
	let subscriber = StaticSubscriber {
		data_deactivated: true,
		..StaticSubscriber::default()
	};
	let mut h = Harness::with_subscriber(policy, subscriber);
	let reg = EmergencyRegResult::new(AccessNetwork::Eutran, RegState::Home, NetworkDomain::PS)
		.with_vops(true)
		.with_emc_bearer(true);
	h.engine.start(attrs(Some(reg)));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Ps)]
	);
	assert_eq!(h.issued_scans(), 0);
}

#[test]
fn test_cdma_preferred_number_forces_cdma() {
	let policy = CarrierPolicy {
		cs_networks: vec![AccessNetwork::Utran, AccessNetwork::Cdma2000],
		cdma_preferred_numbers: vec!["*911".to_string()],
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	let reg = EmergencyRegResult::new(AccessNetwork::Cdma2000, RegState::Home, NetworkDomain::CS);
	let attributes = SelectionAttributes::new("*911", sub()).with_reg_result(reg);
	h.engine.start(attributes);
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Cs)]
	);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Cdma2000);
}

#[test]
fn test_cdma_dropped_for_other_numbers() {
	let policy = CarrierPolicy {
		cs_networks: vec![AccessNetwork::Utran, AccessNetwork::Cdma2000],
		cdma_preferred_numbers: vec!["*911".to_string()],
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	let reg = EmergencyRegResult::new(AccessNetwork::Cdma2000, RegState::Home, NetworkDomain::CS);
	h.engine.start(attrs(Some(reg)));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	// The CDMA attach no longer counts as a CS candidate, so the attempt
	// scans, and the candidate list leaves CDMA out.
	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Scan {
			networks: vec![AccessNetwork::Eutran, AccessNetwork::Utran],
			scan_type: ScanType::NoPreference,
		})
	);
}

#[test]
fn test_no_sim_attaches_over_lte_after_barring() {
	// The configured IMS list must not matter without a usable SIM.
	let policy = CarrierPolicy {
		ims_networks: vec![AccessNetwork::Utran],
		..CarrierPolicy::default()
	};
	let mut h = Harness::new(policy);
	let reg = EmergencyRegResult::new(
		AccessNetwork::Eutran,
		RegState::Unregistered,
		NetworkDomain::empty(),
	)
	.with_emc_bearer(true);
	let attributes = SelectionAttributes::new("112", SubscriptionId::INVALID).with_reg_result(reg);
	h.engine.start(attributes);

	// Cached IMS state stands in for the live signals; only barring is
	// still awaited.
	assert_eq!(h.events(), vec![]);
	assert_eq!(
		h.engine.context().received(),
		SignalSet::IMS_REGISTRATION | SignalSet::IMS_CAPABILITY
	);

	h.engine.update_barring(false);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Ps)]
	);
	assert_eq!(h.engine.scan_deadline(), None);
}

#[test]
fn test_volte_off_forces_utran_fallback() {
	let policy = CarrierPolicy {
		requires_volte_enabled: true,
		..CarrierPolicy::default()
	};
	let subscriber = StaticSubscriber {
		advanced_calling: false,
		..StaticSubscriber::default()
	};
	let mut h = Harness::with_subscriber(policy, subscriber);
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);

	assert_eq!(
		h.events(),
		vec![DriverEvent::Wwan, DriverEvent::Domain(CallDomain::Cs)]
	);
	assert_eq!(h.engine.context().last_network(), AccessNetwork::Utran);
}

#[test]
fn test_roaming_uses_roaming_lists_and_downgrades_full_scan() {
	let policy = CarrierPolicy {
		scan_preference: ScanPreference::FullService,
		ims_networks: vec![AccessNetwork::Eutran],
		ims_networks_roaming: vec![AccessNetwork::Ngran],
		cs_networks_roaming: vec![AccessNetwork::Utran],
		..CarrierPolicy::default()
	};
	let subscriber = StaticSubscriber {
		sim_country: Some("us".to_string()),
		network_country: Some("ca".to_string()),
		..StaticSubscriber::default()
	};
	let mut h = Harness::with_subscriber(policy, subscriber);
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Scan {
			networks: vec![AccessNetwork::Ngran, AccessNetwork::Utran],
			scan_type: ScanType::NoPreference,
		})
	);
}

#[test]
fn test_home_registration_overrides_country_mismatch() {
	let policy = CarrierPolicy {
		ims_networks: vec![AccessNetwork::Eutran],
		ims_networks_roaming: vec![AccessNetwork::Ngran],
		..CarrierPolicy::default()
	};
	let subscriber = StaticSubscriber {
		sim_country: Some("us".to_string()),
		network_country: Some("ca".to_string()),
		..StaticSubscriber::default()
	};
	let mut h = Harness::with_subscriber(policy, subscriber);
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wwan), true);

	assert_eq!(
		h.events().last(),
		Some(&DriverEvent::Domain(CallDomain::Ps))
	);
}

#[test]
fn test_finish_cancels_scan_and_mutes_everything() {
	let mut h = Harness::new(CarrierPolicy::default());
	h.engine.start(attrs(Some(EmergencyRegResult::none())));
	h.deliver_signals(false, ImsRegistration::Unregistered, false);

	h.engine.finish();

	assert!(h.token(0).is_cancelled());
	assert_eq!(h.engine.context().phase(), SelectionPhase::Finished);
	let settled = h.events();

	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wlan), true);
	h.engine.reselect(attrs(Some(EmergencyRegResult::none())));
	assert!(h.try_answer_scan(eutran_limited()));
	h.engine.finish();

	assert_eq!(h.events(), settled);
	assert_eq!(h.engine.context().phase(), SelectionPhase::Finished);
}

#[test]
fn test_timeout_after_selection_is_stale() {
	let mut h = Harness::new(wifi_first_policy());
	h.engine.start(attrs(Some(eutran_home_combined())));
	h.deliver_signals(false, ImsRegistration::Registered(TransportKind::Wlan), true);

	h.engine.handle_scan_timeout();

	assert_eq!(h.events(), vec![DriverEvent::Wlan]);
	assert_eq!(h.engine.context().vowifi_trials(), 1);
}

fn ranked(
	policy: &CarrierPolicy,
	cs_preferred: bool,
	last_network: AccessNetwork,
) -> Vec<AccessNetwork> {
	candidates::next_preferred_networks(RankingInputs {
		policy,
		roaming: false,
		cs_preferred,
		last_network,
		number: NUMBER,
	})
}

fn policy_with_prefs(prefs: Vec<DomainPreference>) -> CarrierPolicy {
	CarrierPolicy {
		domain_preference: prefs,
		..CarrierPolicy::default()
	}
}

#[test]
fn test_first_scan_ranks_ps_before_cs() {
	let policy = CarrierPolicy::default();
	assert_eq!(
		ranked(&policy, false, AccessNetwork::Unknown),
		vec![
			AccessNetwork::Eutran,
			AccessNetwork::Utran,
			AccessNetwork::Geran,
		]
	);
}

#[test]
fn test_first_scan_honors_cs_first_preference() {
	let policy = policy_with_prefs(vec![DomainPreference::Cs, DomainPreference::Ps3gpp]);
	assert_eq!(
		ranked(&policy, false, AccessNetwork::Unknown),
		vec![
			AccessNetwork::Utran,
			AccessNetwork::Geran,
			AccessNetwork::Eutran,
		]
	);
}

#[test]
fn test_first_scan_single_domain_preferences() {
	let ps_only = policy_with_prefs(vec![DomainPreference::Ps3gpp]);
	assert_eq!(
		ranked(&ps_only, false, AccessNetwork::Unknown),
		vec![AccessNetwork::Eutran]
	);

	let cs_only = policy_with_prefs(vec![DomainPreference::Cs]);
	assert_eq!(
		ranked(&cs_only, false, AccessNetwork::Unknown),
		vec![AccessNetwork::Utran, AccessNetwork::Geran]
	);

	let wifi_only = policy_with_prefs(vec![DomainPreference::PsNon3gpp]);
	assert_eq!(ranked(&wifi_only, false, AccessNetwork::Unknown), vec![]);
}

#[test]
fn test_retry_after_lte_ranks_cs_first() {
	let policy = CarrierPolicy::default();
	assert_eq!(
		ranked(&policy, false, AccessNetwork::Eutran),
		vec![
			AccessNetwork::Utran,
			AccessNetwork::Geran,
			AccessNetwork::Eutran,
		]
	);
}

#[test]
fn test_cs_preferred_without_cs_rank_keeps_ims() {
	let policy = policy_with_prefs(vec![DomainPreference::Ps3gpp]);
	assert_eq!(
		ranked(&policy, true, AccessNetwork::Unknown),
		vec![AccessNetwork::Eutran]
	);
}

#[test]
fn test_nr_failure_prefers_lte_retry() {
	let policy = CarrierPolicy {
		ims_networks: vec![AccessNetwork::Eutran, AccessNetwork::Ngran],
		lte_preferred_after_nr_failure: true,
		..CarrierPolicy::default()
	};
	assert_eq!(
		ranked(&policy, false, AccessNetwork::Ngran),
		vec![
			AccessNetwork::Eutran,
			AccessNetwork::Utran,
			AccessNetwork::Geran,
		]
	);
}

#[test]
fn test_retry_after_cs_moves_to_ps() {
	let policy = CarrierPolicy::default();
	assert_eq!(
		ranked(&policy, false, AccessNetwork::Utran),
		vec![
			AccessNetwork::Eutran,
			AccessNetwork::Utran,
			AccessNetwork::Geran,
		]
	);
}

#[test]
fn test_cdma_number_override() {
	let policy = CarrierPolicy {
		cs_networks: vec![AccessNetwork::Utran, AccessNetwork::Cdma2000],
		cdma_preferred_numbers: vec!["*911".to_string()],
		..CarrierPolicy::default()
	};
	assert_eq!(
		candidates::cs_networks_for_number(&policy, false, "*911"),
		vec![AccessNetwork::Cdma2000]
	);
	assert_eq!(
		candidates::cs_networks_for_number(&policy, false, "911"),
		vec![AccessNetwork::Utran]
	);
	// Without configured numbers the list passes through untouched.
	let plain = CarrierPolicy {
		cs_networks: vec![AccessNetwork::Utran, AccessNetwork::Cdma2000],
		..CarrierPolicy::default()
	};
	assert_eq!(
		candidates::cs_networks_for_number(&plain, false, "*911"),
		vec![AccessNetwork::Utran, AccessNetwork::Cdma2000]
	);
}

#[derive(Debug, Clone)]
enum Step {
	Barring(bool),
	ImsRegistrationUpdate(ImsRegistration),
	ImsCapability(bool),
	Reselect,
	Timeout,
	AnswerEmpty,
	AnswerEutran,
}

fn arb_step() -> impl Strategy<Value = Step> {
	prop_oneof![
		any::<bool>().prop_map(Step::Barring),
		prop_oneof![
			Just(ImsRegistration::Unregistered),
			Just(ImsRegistration::Registered(TransportKind::Wwan)),
			Just(ImsRegistration::Registered(TransportKind::Wlan)),
		]
		.prop_map(Step::ImsRegistrationUpdate),
		any::<bool>().prop_map(Step::ImsCapability),
		Just(Step::Reselect),
		Just(Step::Timeout),
		Just(Step::AnswerEmpty),
		Just(Step::AnswerEutran),
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// At most one scan is ever live: each request follows either a result
	/// for, or cancellation of, the previous one.
	#[test]
	fn prop_scans_never_overlap(steps in prop::collection::vec(arb_step(), 0..48)) {
		let mut h = Harness::new(CarrierPolicy::default());
		h.engine.start(attrs(Some(EmergencyRegResult::none())));
		let mut answered = 0usize;
		for step in steps {
			match step {
				Step::Barring(barred) => h.engine.update_barring(barred),
				Step::ImsRegistrationUpdate(reg) => h.engine.update_ims_registration(reg),
				Step::ImsCapability(voice) => h.engine.update_ims_capability(voice),
				Step::Reselect => h.engine.reselect(attrs(Some(EmergencyRegResult::none()))),
				Step::Timeout => h.engine.handle_scan_timeout(),
				Step::AnswerEmpty => {
					if h.try_answer_scan(EmergencyRegResult::none()) {
						answered += 1;
					}
				}
				Step::AnswerEutran => {
					if h.try_answer_scan(eutran_limited()) {
						answered += 1;
					}
				}
			}
			let tokens = h.tokens.lock();
			let live = tokens
				.iter()
				.enumerate()
				.filter(|(i, token)| *i >= answered && !token.is_cancelled())
				.count();
			prop_assert!(live <= 1, "{} scans live after {} answered", live, answered);
		}
	}
}

#![allow(clippy::unwrap_used)]
// Engine tests against a scripted in-memory probe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use camsweep_core::{
    AttackConfig, Attacker, AuthType, CoreError, CredentialDictionary, CredentialSource, Device,
    Phase, Probe, ProbeFactory, ProbeRequest, ProbeResponse, RequestKind, Route, RouteDictionary,
};
use camsweep_rtsp::{AuthMethods, Error as RtspError};

// ── Helpers ─────────────────────────────────────────────────────────

/// An owned copy of one probe request, as the scripted server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    address: String,
    port: u16,
    path: String,
    username: Option<String>,
    password: Option<String>,
    auth_type: AuthType,
    kind: RequestKind,
}

impl Call {
    fn creds(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

type Rule = dyn Fn(&Call) -> Result<ProbeResponse, RtspError> + Send + Sync;

struct ScriptedFactory {
    rule: Arc<Rule>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedFactory {
    fn new(rule: impl Fn(&Call) -> Result<ProbeResponse, RtspError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            rule: Arc::new(rule),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProbeFactory for ScriptedFactory {
    fn session(&self) -> Box<dyn Probe> {
        Box::new(ScriptedProbe {
            rule: Arc::clone(&self.rule),
            calls: Arc::clone(&self.calls),
        })
    }
}

struct ScriptedProbe {
    rule: Arc<Rule>,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&mut self, request: &ProbeRequest<'_>) -> Result<ProbeResponse, RtspError> {
        let call = Call {
            address: request.address.to_string(),
            port: request.port,
            path: request.path.to_string(),
            username: request.credentials.map(|c| c.username.clone()),
            password: request.credentials.map(|c| c.password.clone()),
            auth_type: request.auth_type,
            kind: request.kind,
        };
        self.calls.lock().unwrap().push(call.clone());
        (self.rule)(&call)
    }
}

fn ok(status: u16) -> Result<ProbeResponse, RtspError> {
    Ok(ProbeResponse::new(status))
}

fn timeout() -> Result<ProbeResponse, RtspError> {
    Err(RtspError::Timeout { timeout_ms: 2000 })
}

fn dictionary(usernames: &[&str], passwords: &[&str]) -> CredentialSource {
    CredentialSource::Dictionary(CredentialDictionary::new(
        usernames.iter().map(ToString::to_string).collect(),
        passwords.iter().map(ToString::to_string).collect(),
    ))
}

fn config(routes: &[&str], credentials: CredentialSource) -> AttackConfig {
    AttackConfig::new(RouteDictionary::new(routes), credentials)
}

fn device_with_route(address: &str, path: &str, auth_type: AuthType) -> Device {
    let mut device = Device::new(address, 554);
    device.auth_type = auth_type;
    device.routes.push(Route::new(path, auth_type));
    device
}

// ── Orchestrator ────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_is_usage_error() {
    let factory = ScriptedFactory::new(|_| ok(200));
    let attacker = Attacker::new(config(&["live.sdp"], dictionary(&["admin"], &[""])), factory.clone());

    let err = attacker.attack(Vec::new()).await.unwrap_err();

    assert!(matches!(err, CoreError::NoTargets));
    assert!(err.is_usage());
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn identity_is_preserved_when_every_probe_fails() {
    let factory = ScriptedFactory::new(|_| timeout());
    let attacker = Attacker::new(
        config(&["live.sdp", "h264"], dictionary(&["admin"], &["admin"])),
        factory,
    );
    let input = vec![
        Device::new("10.0.0.1", 554),
        Device::new("10.0.0.2", 554),
        Device::new("10.0.0.2", 8554),
    ];

    let out = attacker.attack(input.clone()).await.unwrap();

    assert_eq!(out.len(), 3);
    let keys: Vec<_> = out.iter().map(Device::key).collect();
    let expected: Vec<_> = input.iter().map(Device::key).collect();
    assert_eq!(keys, expected);
    for device in &out {
        assert!(device.routes.is_empty());
        assert_eq!(device.credentials, None);
        assert_eq!(device.auth_type, AuthType::Unknown);
    }
}

#[tokio::test]
async fn full_attack_finds_route_credentials_and_access() {
    let factory = ScriptedFactory::new(|call| match (call.kind, call.path.as_str(), call.creds()) {
        (RequestKind::Describe, "live.sdp", None) => {
            Ok(ProbeResponse::new(401).with_auth_methods(AuthMethods::BASIC))
        }
        (RequestKind::Describe, "live.sdp", Some(("admin", "12345"))) => ok(200),
        (RequestKind::Describe, "live.sdp", Some(_)) => ok(401),
        (RequestKind::Setup, "live.sdp", Some(("admin", "12345"))) => ok(200),
        (RequestKind::Setup, _, _) => ok(401),
        _ => ok(404),
    });
    let attacker = Attacker::new(
        config(
            &["media.amp", "live.sdp"],
            dictionary(&["admin", "root"], &["admin", "12345"]),
        ),
        factory.clone(),
    );
    let state = attacker.subscribe();

    let out = attacker
        .attack(vec![Device::new("10.0.0.5", 554).with_label(Some("Hikvision"))])
        .await
        .unwrap();

    let device = &out[0];
    assert_eq!(device.label.as_deref(), Some("Hikvision"));
    assert_eq!(device.auth_type, AuthType::Basic);
    let creds = device.credentials.as_ref().unwrap();
    assert_eq!((creds.username.as_str(), creds.password.as_str()), ("admin", "12345"));
    assert_eq!(device.routes.len(), 1);
    let route = &device.routes[0];
    assert_eq!(route.path, "live.sdp");
    assert_eq!(route.auth_type, AuthType::Basic);
    assert!(route.credentials_found);
    assert!(route.available);
    assert!(device.is_accessible());

    // Every device had a route, so no second round.
    let setups = factory
        .calls()
        .iter()
        .filter(|c| c.kind == RequestKind::Setup)
        .count();
    assert_eq!(setups, 1);
    assert_eq!(state.borrow().phase, Phase::Done);
}

#[tokio::test]
async fn second_round_runs_over_all_devices_and_merges_routes() {
    // 10.0.0.1 times out on its first DESCRIBE only; 10.0.0.2 is steady.
    let flaky = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&flaky);
    let factory = ScriptedFactory::new(move |call| match (call.address.as_str(), call.kind) {
        ("10.0.0.1", RequestKind::Describe) if call.path == "live.sdp" => {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                timeout()
            } else {
                ok(200)
            }
        }
        ("10.0.0.2", RequestKind::Describe) if call.path == "ch0" => ok(200),
        (_, RequestKind::Setup) => ok(200),
        _ => ok(404),
    });
    let attacker = Attacker::new(
        config(&["live.sdp", "ch0"], dictionary(&["admin"], &["admin"])),
        factory.clone(),
    );

    let out = attacker
        .attack(vec![Device::new("10.0.0.1", 554), Device::new("10.0.0.2", 554)])
        .await
        .unwrap();

    let first = &out[0];
    assert_eq!(first.routes.len(), 1);
    assert_eq!(first.routes[0].path, "live.sdp");
    assert!(first.routes[0].available);

    let second = &out[1];
    assert_eq!(second.routes.len(), 1, "known route must not be duplicated");
    assert_eq!(second.routes[0].path, "ch0");
    assert!(second.routes[0].available);
    assert!(second.routes[0].credentials_found);

    // The steady device was rediscovered and revalidated too.
    let calls = factory.calls();
    let steady_describes = calls
        .iter()
        .filter(|c| c.address == "10.0.0.2" && c.kind == RequestKind::Describe && c.path == "ch0")
        .count();
    // Two discovery rounds, one detection, one credential attempt.
    assert_eq!(steady_describes, 4);
    let steady_setups = calls
        .iter()
        .filter(|c| c.address == "10.0.0.2" && c.kind == RequestKind::Setup)
        .count();
    assert_eq!(steady_setups, 2);
}

#[tokio::test]
async fn second_round_reuses_found_credentials_and_auth_type() {
    // Unauthenticated, every path is 401. Authenticated, only live.sdp exists.
    let factory = ScriptedFactory::new(|call| {
        if call.address == "10.0.0.9" {
            return timeout();
        }
        match (call.kind, call.creds(), call.path.as_str()) {
            (RequestKind::Describe, None, _) => {
                Ok(ProbeResponse::new(401).with_auth_methods(AuthMethods::BASIC))
            }
            (_, Some(("admin", "12345")), "live.sdp") => ok(200),
            (_, Some(("admin", "12345")), _) => ok(404),
            _ => ok(401),
        }
    });
    let attacker = Attacker::new(
        config(&["bad", "live.sdp"], dictionary(&["admin"], &["wrong", "12345"])),
        factory.clone(),
    );

    let out = attacker
        .attack(vec![Device::new("10.0.0.5", 554), Device::new("10.0.0.9", 554)])
        .await
        .unwrap();

    let camera = &out[0];
    let paths: Vec<_> = camera.routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["bad", "live.sdp"]);
    assert!(camera.routes[1].available);
    assert!(out[1].routes.is_empty());

    // The last DESCRIBEs against the camera are the second discovery round.
    let calls = factory.calls();
    let describes: Vec<_> = calls
        .iter()
        .filter(|c| c.address == "10.0.0.5" && c.kind == RequestKind::Describe)
        .collect();
    let second_round = &describes[describes.len() - 2..];
    assert_eq!(second_round[0].path, "bad");
    assert_eq!(second_round[1].path, "live.sdp");
    for call in second_round {
        assert_eq!(call.creds(), Some(("admin", "12345")));
        assert_eq!(call.auth_type, AuthType::Basic);
    }
}

#[tokio::test]
async fn duplicate_targets_keep_one_output_per_input() {
    let factory = ScriptedFactory::new(|call| if call.path == "live.sdp" { ok(200) } else { ok(404) });
    let attacker = Attacker::new(
        config(&["live.sdp"], dictionary(&["admin"], &["admin"])),
        factory.clone(),
    );

    let out = attacker
        .attack(vec![Device::new("10.0.0.1", 554); 2])
        .await
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0], out[1]);
    assert_eq!(out[0].routes.len(), 1);
    // The device itself was attacked once.
    let setups = factory
        .calls()
        .iter()
        .filter(|c| c.kind == RequestKind::Setup)
        .count();
    assert_eq!(setups, 1);
}

#[tokio::test]
async fn panicking_probe_leaves_device_unchanged() {
    let factory = ScriptedFactory::new(|call| {
        assert!(call.address != "10.0.0.9", "probe crashed");
        if call.path == "live.sdp" { ok(200) } else { ok(404) }
    });
    let attacker = Attacker::new(config(&["live.sdp"], dictionary(&["admin"], &["admin"])), factory);
    let crashing = Device::new("10.0.0.9", 554).with_label(Some("before"));

    let out = attacker
        .discover_routes(vec![crashing.clone(), Device::new("10.0.0.1", 554)])
        .await;

    assert_eq!(out[0], crashing);
    assert_eq!(out[1].routes.len(), 1);
}

// ── Route discovery ─────────────────────────────────────────────────

#[tokio::test]
async fn only_the_answering_route_is_kept() {
    let factory = ScriptedFactory::new(|call| if call.path == "live.sdp" { ok(200) } else { ok(404) });
    let attacker = Attacker::new(
        config(
            &["media.amp", "live.sdp", "h264/ch1/main", "11"],
            dictionary(&["admin"], &["admin"]),
        ),
        factory,
    );

    let out = attacker.discover_routes(vec![Device::new("10.0.0.2", 554)]).await;

    let paths: Vec<_> = out[0].routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["live.sdp"]);
    assert!(!out[0].routes[0].credentials_found);
    assert!(!out[0].routes[0].available);
}

#[tokio::test]
async fn route_signal_is_200_401_or_403() {
    let factory = ScriptedFactory::new(|call| match call.path.as_str() {
        "open" => ok(200),
        "locked" => ok(401),
        "forbidden" => ok(403),
        "missing" => ok(404),
        "broken" => ok(500),
        _ => timeout(),
    });
    let attacker = Attacker::new(
        config(
            &["open", "locked", "forbidden", "missing", "broken", "silent"],
            dictionary(&["admin"], &["admin"]),
        ),
        factory.clone(),
    );

    let out = attacker.discover_routes(vec![Device::new("10.0.0.2", 554)]).await;

    let paths: Vec<_> = out[0].routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["open", "locked", "forbidden"]);
    // Dictionary order, one probe each, no credentials on a fresh device.
    let probed: Vec<_> = factory.calls().into_iter().map(|c| c.path).collect();
    assert_eq!(probed, ["open", "locked", "forbidden", "missing", "broken", "silent"]);
    assert!(factory.calls().iter().all(|c| c.username.is_none()));
}

#[tokio::test]
async fn route_discovery_is_idempotent() {
    let factory = ScriptedFactory::new(|call| match call.path.as_str() {
        "a" | "c" => ok(401),
        _ => ok(404),
    });
    let attacker = Attacker::new(config(&["a", "b", "c"], dictionary(&["admin"], &["admin"])), factory);
    let input = vec![Device::new("10.0.0.2", 554), Device::new("10.0.0.3", 554)];

    let once = attacker.discover_routes(input).await;
    let twice = attacker.discover_routes(once.clone()).await;

    assert_eq!(once, twice);
}

#[tokio::test(start_paused = true)]
async fn pacing_spaces_probes_within_a_device() {
    let factory = ScriptedFactory::new(|_| ok(404));
    let attacker = Attacker::new(
        config(&["a", "b", "c", "d"], dictionary(&["admin"], &["admin"]))
            .with_attack_interval(Duration::from_millis(100)),
        factory,
    );
    let start = tokio::time::Instant::now();

    attacker
        .discover_routes(vec![Device::new("10.0.0.2", 554), Device::new("10.0.0.3", 554)])
        .await;

    // Four probes per device, three gaps; devices run side by side.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
}

// ── Authentication detection ────────────────────────────────────────

#[tokio::test]
async fn detection_uses_first_route_without_credentials() {
    let factory = ScriptedFactory::new(|call| match call.address.as_str() {
        "10.0.0.1" => Ok(ProbeResponse::new(401).with_auth_methods(AuthMethods::DIGEST)),
        "10.0.0.2" => Ok(ProbeResponse::new(401)
            .with_auth_methods(AuthMethods::BASIC | AuthMethods::DIGEST)),
        "10.0.0.3" => ok(200),
        _ => timeout(),
    });
    let attacker = Attacker::new(config(&[], dictionary(&["admin"], &["admin"])), factory.clone());

    let mut first = device_with_route("10.0.0.1", "live.sdp", AuthType::Unknown);
    first.routes.push(Route::new("second", AuthType::Unknown));
    let out = attacker
        .detect_auth_methods(vec![
            first,
            device_with_route("10.0.0.2", "ch0", AuthType::Unknown),
            Device::new("10.0.0.3", 554),
            device_with_route("10.0.0.4", "x", AuthType::Unknown),
        ])
        .await;

    assert_eq!(out[0].auth_type, AuthType::Digest);
    assert!(out[0].routes.iter().all(|r| r.auth_type == AuthType::Digest));
    assert_eq!(out[1].auth_type, AuthType::Basic);
    assert_eq!(out[2].auth_type, AuthType::None);
    assert_eq!(out[3].auth_type, AuthType::Unknown);
    assert_eq!(out[3].routes[0].auth_type, AuthType::Unknown);

    let calls = factory.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|c| c.username.is_none() && c.kind == RequestKind::Describe));
    let first_call = calls.iter().find(|c| c.address == "10.0.0.1").unwrap();
    assert_eq!(first_call.path, "live.sdp");
    let rootless = calls.iter().find(|c| c.address == "10.0.0.3").unwrap();
    assert_eq!(rootless.path, "");
}

// ── Credential attack ───────────────────────────────────────────────

#[tokio::test]
async fn first_accepted_password_is_recorded_after_two_probes() {
    let factory = ScriptedFactory::new(|call| match call.creds() {
        Some((_, "right")) => ok(200),
        _ => ok(401),
    });
    let attacker = Attacker::new(
        config(&[], dictionary(&["admin"], &["wrong", "right"])),
        factory.clone(),
    );

    let out = attacker
        .attack_credentials(vec![device_with_route("10.0.0.2", "live.sdp", AuthType::Digest)])
        .await;

    let creds = out[0].credentials.as_ref().unwrap();
    assert_eq!(creds.password, "right");
    assert!(out[0].routes[0].credentials_found);
    let calls = factory.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.auth_type == AuthType::Digest));
}

#[tokio::test]
async fn credentials_are_tried_username_major() {
    let factory = ScriptedFactory::new(|call| match call.creds() {
        Some(("root", "x")) => ok(404),
        _ => ok(401),
    });
    let attacker = Attacker::new(
        config(&[], dictionary(&["admin", "root"], &["x", "y"])),
        factory.clone(),
    );

    let out = attacker
        .attack_credentials(vec![device_with_route("10.0.0.2", "live.sdp", AuthType::Basic)])
        .await;

    assert_eq!(out[0].credentials.as_ref().unwrap().username, "root");
    let tried: Vec<_> = factory
        .calls()
        .iter()
        .map(|c| format!("{}:{}", c.username.as_deref().unwrap(), c.password.as_deref().unwrap()))
        .collect();
    assert_eq!(tried, ["admin:x", "admin:y", "root:x"]);
}

#[tokio::test]
async fn no_accepted_pair_is_a_negative_result() {
    let factory = ScriptedFactory::new(|_| ok(401));
    let attacker = Attacker::new(config(&[], dictionary(&["admin"], &["a", "b"])), factory);

    let out = attacker
        .attack_credentials(vec![device_with_route("10.0.0.2", "live.sdp", AuthType::Basic)])
        .await;

    assert_eq!(out[0].credentials, None);
    assert!(!out[0].routes[0].credentials_found);
}

#[tokio::test]
async fn known_credentials_are_tried_first_on_later_routes() {
    let factory = ScriptedFactory::new(|call| match call.creds() {
        Some(("b", "2")) => ok(200),
        _ => ok(401),
    });
    let attacker = Attacker::new(config(&[], dictionary(&["a", "b"], &["1", "2"])), factory.clone());
    let mut device = device_with_route("10.0.0.2", "one", AuthType::Basic);
    device.routes.push(Route::new("two", AuthType::Basic));

    let out = attacker.attack_credentials(vec![device]).await;

    assert!(out[0].routes.iter().all(|r| r.credentials_found));
    let second_route_calls = factory.calls().iter().filter(|c| c.path == "two").count();
    assert_eq!(second_route_calls, 1);
}

#[tokio::test]
async fn fixed_credentials_replace_the_dictionary() {
    let factory = ScriptedFactory::new(|_| ok(401));
    let source = CredentialSource::Fixed {
        username: "operator".into(),
        password: String::from("s3cret").into(),
    };
    let attacker = Attacker::new(config(&[], source), factory.clone());

    attacker
        .attack_credentials(vec![device_with_route("10.0.0.2", "live.sdp", AuthType::Basic)])
        .await;

    let calls = factory.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].creds(), Some(("operator", "s3cret")));
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn available_only_on_setup_200() {
    let factory = ScriptedFactory::new(|call| match (call.kind, call.path.as_str()) {
        (RequestKind::Setup, "good") => ok(200),
        (RequestKind::Setup, "denied") => ok(401),
        (RequestKind::Setup, "moved") => ok(302),
        _ => timeout(),
    });
    let attacker = Attacker::new(config(&[], dictionary(&["admin"], &["admin"])), factory.clone());
    let mut device = device_with_route("10.0.0.2", "good", AuthType::Basic);
    for path in ["denied", "moved", "silent"] {
        device.routes.push(Route::new(path, AuthType::Basic));
    }
    device.credentials = Some(camsweep_core::Credentials::new("admin", "admin"));

    let out = attacker.validate(vec![device]).await;

    let flags: Vec<_> = out[0].routes.iter().map(|r| r.available).collect();
    assert_eq!(flags, [true, false, false, false]);
    assert!(factory.calls().iter().all(|c| c.kind == RequestKind::Setup
        && c.creds() == Some(("admin", "admin"))));
}

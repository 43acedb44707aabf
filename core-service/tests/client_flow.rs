//! End-to-end behaviour of `AuthClient` over a scripted transport.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::ManualClock;
use bridge_traits::BridgeError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_auth::AuthError;
use core_income::IncomeError;
use core_service::{AuthClient, ClientConfig, CoreError, IncomeItem, IncomeRequest};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const API: &str = "https://api.test/api/v1";
const INN: &str = "771234567890";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    authorization: Option<String>,
    body: serde_json::Value,
}

/// Answers login, refresh and income calls and records them in order.
struct ScriptedService {
    calls: Mutex<Vec<Recorded>>,
    refreshes: AtomicUsize,
    receipts: AtomicUsize,
    login_status: u16,
    refresh_status: Mutex<u16>,
    profile: serde_json::Value,
}

impl ScriptedService {
    fn new() -> Arc<Self> {
        Self::with(200, serde_json::json!({ "inn": INN, "displayName": "Ivan" }))
    }

    fn with(login_status: u16, profile: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
            receipts: AtomicUsize::new(0),
            login_status,
            refresh_status: Mutex::new(200),
            profile,
        })
    }

    fn fail_refreshes(&self, status: u16) {
        *self.refresh_status.lock().unwrap() = status;
    }

    fn paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.path.clone())
            .collect()
    }

    fn calls_to(&self, path: &str) -> Vec<Recorded> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .cloned()
            .collect()
    }

    fn token_answer(access: &str, refresh: &str) -> serde_json::Value {
        serde_json::json!({
            "token": access,
            "tokenExpireIn": (start() + Duration::hours(1)).to_rfc3339(),
            "refreshToken": refresh,
        })
    }
}

#[async_trait]
impl HttpClient for ScriptedService {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let path = request
            .url
            .strip_prefix(API)
            .unwrap_or(&request.url)
            .to_string();
        let body = request
            .body
            .as_ref()
            .map(|body| serde_json::from_slice(body).unwrap())
            .unwrap_or(serde_json::Value::Null);

        self.calls.lock().unwrap().push(Recorded {
            path: path.clone(),
            authorization: request.header_value("Authorization").map(str::to_owned),
            body,
        });

        let (status, answer) = match path.as_str() {
            "/auth/lkfl" => {
                let mut answer = Self::token_answer("access-1", "refresh-1");
                answer["profile"] = self.profile.clone();
                (self.login_status, answer)
            }
            "/auth/token" => {
                let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 2;
                let status = *self.refresh_status.lock().unwrap();
                // Leave room for concurrent callers to pile up behind the refresh
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                let mut answer =
                    Self::token_answer(&format!("access-{}", n), &format!("refresh-{}", n));
                answer["tokenExpireIn"] =
                    serde_json::json!((start() + Duration::hours(10)).to_rfc3339());
                (status, answer)
            }
            "/income" => {
                let n = self.receipts.fetch_add(1, Ordering::SeqCst) + 1;
                (
                    200,
                    serde_json::json!({ "approvedReceiptUuid": format!("receipt-{}", n) }),
                )
            }
            other => {
                return Err(BridgeError::OperationFailed(format!(
                    "unexpected path {}",
                    other
                )))
            }
        };

        if !(200..300).contains(&status) {
            return Ok(HttpResponse::new(status, "{\"message\":\"rejected\"}"));
        }
        Ok(HttpResponse::new(
            status,
            serde_json::to_vec(&answer).unwrap(),
        ))
    }
}

fn client(service: Arc<ScriptedService>) -> (AuthClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let config = ClientConfig::builder()
        .api_path(API)
        .device_id_prefix("test")
        .zone_offset("+03:00")
        .http_client(service)
        .clock(clock.clone())
        .build()
        .unwrap();
    (AuthClient::new(config).unwrap(), clock)
}

fn consult() -> IncomeRequest {
    IncomeRequest::new().with_item(IncomeItem::new("Consult", 1, 1000.0))
}

#[tokio::test]
async fn submit_with_valid_token_makes_one_call() {
    let service = ScriptedService::new();
    let (client, _clock) = client(service.clone());

    let profile = client.authenticate("79001234567", "secret").await.unwrap();
    assert_eq!(profile.tax_id(), Some(INN));

    let receipt = client.submit(&consult()).await.unwrap();

    assert_eq!(service.paths(), ["/auth/lkfl", "/income"]);
    assert_eq!(receipt.id, "receipt-1");
    assert_eq!(
        receipt.json_url,
        format!("{}/receipt/{}/receipt-1/json", API, INN)
    );
    assert_eq!(
        receipt.print_url,
        format!("{}/receipt/{}/receipt-1/print", API, INN)
    );

    let income = service.calls_to("/income").remove(0);
    assert_eq!(income.authorization.as_deref(), Some("Bearer access-1"));
    assert_eq!(income.body["totalAmount"], serde_json::json!(1000.0));
    assert_eq!(income.body["operationTime"], "2024-05-01T12:00:00+03:00");

    let login = service.calls_to("/auth/lkfl").remove(0);
    assert_eq!(
        login.body["deviceInfo"]["sourceDeviceId"],
        client.device_id().as_str()
    );
}

#[tokio::test]
async fn expired_token_refreshes_then_submits() {
    let service = ScriptedService::new();
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    clock.advance(Duration::hours(2));

    let receipt = client.submit(&consult()).await.unwrap();

    assert_eq!(service.paths(), ["/auth/lkfl", "/auth/token", "/income"]);
    assert_eq!(receipt.id, "receipt-1");

    let refresh = service.calls_to("/auth/token").remove(0);
    assert_eq!(refresh.body["refreshToken"], "refresh-1");
    assert_eq!(
        refresh.body["deviceInfo"]["sourceDeviceId"],
        client.device_id().as_str()
    );

    let income = service.calls_to("/income").remove(0);
    assert_eq!(income.authorization.as_deref(), Some("Bearer access-2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_share_one_refresh() {
    let service = ScriptedService::new();
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    clock.advance(Duration::hours(2));

    let handles: Vec<_> = (0..8)
        .map(|_| client.submit_async(consult()).unwrap())
        .collect();
    let receipts = join_all(handles).await;

    assert!(receipts.iter().all(Result::is_ok));
    assert_eq!(service.calls_to("/auth/token").len(), 1);

    let incomes = service.calls_to("/income");
    assert_eq!(incomes.len(), 8);
    assert!(incomes
        .iter()
        .all(|call| call.authorization.as_deref() == Some("Bearer access-2")));
}

#[tokio::test]
async fn refresh_failure_fails_submission_and_is_retried() {
    let service = ScriptedService::new();
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    clock.advance(Duration::hours(2));
    service.fail_refreshes(401);

    let err = client.submit(&consult()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Auth(AuthError::AuthenticationFailed { status: 401, .. })
    ));
    assert_eq!(err.status_code(), Some(401));
    assert!(service.calls_to("/income").is_empty());
    assert!(client.is_authenticated().await);

    service.fail_refreshes(200);
    client.submit(&consult()).await.unwrap();
    assert_eq!(
        service.paths(),
        ["/auth/lkfl", "/auth/token", "/auth/token", "/income"]
    );
}

#[tokio::test]
async fn submit_before_authenticate_is_rejected() {
    let service = ScriptedService::new();
    let (client, _clock) = client(service.clone());

    let err = client.submit(&consult()).await.unwrap_err();
    assert!(err.is_not_authenticated());
    assert!(service.paths().is_empty());
}

#[tokio::test]
async fn second_authenticate_requires_sign_out() {
    let service = ScriptedService::new();
    let (client, _clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    let err = client.authenticate("79001234567", "secret").await.unwrap_err();
    assert_eq!(err, CoreError::Auth(AuthError::InvalidState));
    assert_eq!(service.paths(), ["/auth/lkfl"]);

    client.sign_out().await;
    assert!(!client.is_authenticated().await);
    assert!(client.profile().await.is_none());

    client.authenticate("79001234567", "secret").await.unwrap();
    assert_eq!(service.paths(), ["/auth/lkfl", "/auth/lkfl"]);
}

#[tokio::test]
async fn rejected_login_leaves_client_unauthenticated() {
    let service = ScriptedService::with(422, serde_json::json!({}));
    let (client, _clock) = client(service);

    let err = client.authenticate("79001234567", "wrong").await.unwrap_err();
    assert_eq!(err.status_code(), Some(422));
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn invalid_request_makes_no_call() {
    let service = ScriptedService::new();
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    clock.advance(Duration::hours(2));

    let err = client.submit(&IncomeRequest::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::Income(IncomeError::InvalidRequest(_))));

    let nan = IncomeRequest::new().with_item(IncomeItem::new("X", 1, f64::NAN));
    let err = client.submit(&nan).await.unwrap_err();
    assert!(matches!(err, CoreError::Income(IncomeError::InvalidRequest(_))));

    assert_eq!(service.paths(), ["/auth/lkfl"]);
}

#[tokio::test]
async fn profile_without_inn_cannot_submit() {
    let service = ScriptedService::with(200, serde_json::json!({ "displayName": "Ivan" }));
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    let err = client.submit(&consult()).await.unwrap_err();

    assert_eq!(err, CoreError::Income(IncomeError::MissingTaxId));
    assert_eq!(service.paths(), ["/auth/lkfl"]);

    // An expired token is not refreshed for a submission that cannot succeed
    clock.advance(Duration::hours(2));
    let err = client.submit(&consult()).await.unwrap_err();
    assert_eq!(err, CoreError::Income(IncomeError::MissingTaxId));
    assert_eq!(service.paths(), ["/auth/lkfl"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_keep_profile_and_tokens_together() {
    let service = ScriptedService::new();
    let (client, _clock) = client(service.clone());

    let logins: Vec<_> = (0..2)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.authenticate("79001234567", "secret").await })
        })
        .collect();
    let outcomes: Vec<_> = join_all(logins)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|outcome| outcome.as_ref().err() == Some(&CoreError::Auth(AuthError::InvalidState))));
    assert_eq!(service.paths(), ["/auth/lkfl"]);

    let profile = client.profile().await.unwrap();
    assert_eq!(profile.tax_id(), Some(INN));

    client.submit(&consult()).await.unwrap();
    assert_eq!(service.paths(), ["/auth/lkfl", "/income"]);
}

#[tokio::test]
async fn aborted_submission_leaves_client_usable() {
    let service = ScriptedService::new();
    let (client, clock) = client(service.clone());

    client.authenticate("79001234567", "secret").await.unwrap();
    clock.advance(Duration::hours(2));

    let handle = client.submit_async(consult()).unwrap();
    // Let the task get inside the refresh call
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    handle.abort();

    let err = handle.await.unwrap_err();
    assert!(matches!(err, CoreError::TaskFailed(_)));
    assert!(service.calls_to("/income").is_empty());
    assert!(client.is_authenticated().await);

    let receipt = client.submit(&consult()).await.unwrap();
    assert_eq!(receipt.id, "receipt-1");
    assert_eq!(
        service.paths(),
        ["/auth/lkfl", "/auth/token", "/auth/token", "/income"]
    );

    let income = service.calls_to("/income").remove(0);
    assert_eq!(income.authorization.as_deref(), Some("Bearer access-3"));
}

#[tokio::test]
async fn submit_async_resolves_to_receipt() {
    let service = ScriptedService::new();
    let (client, _clock) = client(service);

    client.authenticate("79001234567", "secret").await.unwrap();
    let receipt = client.submit_async(consult()).unwrap().await.unwrap();
    assert_eq!(receipt.id, "receipt-1");
}

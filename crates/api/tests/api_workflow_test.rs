use autoliq_api::middleware::auth::JwtVerifier;
use autoliq_api::server::{AppState, build_router};
use autoliq_api::types::{AccountsResponse, ApiErrorResponse, Claims, HealthResponse, RiskResponse, RiskUpdateResponse};
use autoliq_cache::mem::MemCache;
use autoliq_core::risk::entity::{Account, AccountId, RiskSettings};
use autoliq_core::risk::error::DownstreamError;
use autoliq_core::store::port::{ConnectionRecord, ConnectionStore};
use autoliq_core::testing::{ScriptedAutoLiqApi, StaticClientFactory};
use autoliq_gateway::resolver::ConnectionResolver;
use autoliq_gateway::risk::RiskGateway;
use autoliq_gateway::settings_cache::SettingsCache;
use autoliq_store::memory::MemoryConnectionStore;
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;

const SECRET: &str = "api-test-secret";

struct TestServer {
    base_url: String,
    api: Arc<ScriptedAutoLiqApi>,
    factory: Arc<StaticClientFactory>,
}

fn mint(sub: &str, ttl_secs: i64) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let exp = now.checked_add_signed(ttl_secs).unwrap();
    let claims = Claims {
        sub: sub.to_string(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server() -> TestServer {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let store = MemoryConnectionStore::new();
    for (subject, reference, token) in [
        ("alice", "TS-1", Some("delegated-alice")),
        ("alice", "BROKEN", None),
        ("bob", "TS-1", Some("delegated-bob")),
    ] {
        store
            .save(&ConnectionRecord {
                subject: subject.into(),
                reference: reference.into(),
                token: token.map(str::to_string),
                base_url: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
    }

    let api = ScriptedAutoLiqApi::new();
    let factory = StaticClientFactory::new(api.clone());
    let resolver = ConnectionResolver::new(Arc::new(store), "https://demo.tradovateapi.com", "v1");
    let cache = SettingsCache::new(Arc::new(MemCache::with_ttl(Duration::from_secs(3600))));
    let gateway = Arc::new(RiskGateway::new(resolver, factory.clone(), cache));

    let state = AppState {
        gateway,
        verifier: Arc::new(JwtVerifier::new(SECRET, None, None)),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        api,
        factory,
    }
}

#[tokio::test]
async fn test_health_and_docs_are_public() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: HealthResponse = res.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.status, "ok");

    let res = client
        .get(format!("{}/api-docs/openapi.json", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc: serde_json::Value = res.json().await.unwrap();
    assert!(doc["paths"].get("/risk/{account_id}").is_some());
}

#[tokio::test]
async fn test_authentication_failures() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    let url = format!("{}/risk/42?connectionRef=TS-1", srv.base_url);

    // ============================================
    // Case 1: 缺少 Authorization 头
    // ============================================
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.error, "Missing Authorization header");
    assert_eq!(body.code.as_deref(), Some("UNAUTHENTICATED"));

    // ============================================
    // Case 2: 格式错误
    // ============================================
    let res = client
        .get(&url)
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.error, "Invalid Authorization header format");

    // ============================================
    // Case 3: 身份令牌过期
    // ============================================
    let res = client
        .get(&url)
        .bearer_auth(mint("alice", -3600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.error, "Identity token expired");

    assert_eq!(srv.api.read_calls(), 0, "认证失败不应触达下游");
}

#[tokio::test]
async fn test_connection_resolution_errors() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    let token = mint("alice", 600);

    // 缺少连接名
    let res = client
        .get(format!("{}/risk/42", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.code.as_deref(), Some("MISSING_PARAMETER"));

    // 连接不存在 / 缺少令牌
    for reference in ["NOPE", "BROKEN"] {
        let res = client
            .get(format!("{}/accounts?connectionRef={}", srv.base_url, reference))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: ApiErrorResponse = res.json().await.unwrap();
        assert_eq!(body.code.as_deref(), Some("NOT_FOUND"));
    }

    // 非法账户 ID
    let res = client
        .get(format!("{}/risk/abc?connectionRef=TS-1", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(srv.factory.distinct_credentials(), 0);
}

#[tokio::test]
async fn test_read_with_owner_error_is_reported() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    srv.api.script_owner(
        AccountId(42),
        Err(DownstreamError::Upstream {
            status: 500,
            message: "Internal downstream failure".into(),
        }),
    );
    srv.api.script_permissioned(
        AccountId(42),
        Err(DownstreamError::Unauthorized("Access is denied".into())),
    );

    let res = client
        .get(format!("{}/risk/42?connectionRef=TS-1", srv.base_url))
        .bearer_auth(mint("alice", 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.error, "Internal downstream failure");
    assert_eq!(body.code.as_deref(), Some("UPSTREAM_ERROR"));
}

#[tokio::test]
async fn test_permissioned_denial_is_not_an_error() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    srv.api.script_owner(
        AccountId(42),
        Ok(Some(RiskSettings {
            id: Some(AccountId(42)),
            daily_loss_auto_liq: Some(dec!(500)),
            ..Default::default()
        })),
    );
    srv.api.script_permissioned(
        AccountId(42),
        Err(DownstreamError::Unauthorized("Access is denied".into())),
    );

    let res = client
        .get(format!("{}/risk/42", srv.base_url))
        .header("X-Connection-Ref", "TS-1")
        .bearer_auth(mint("alice", 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: RiskResponse = res.json().await.unwrap();
    assert!(body.success);
    assert!(!body.cached);
    assert_eq!(body.auto_liq.unwrap().daily_loss_auto_liq, Some(dec!(500)));

    let cred = srv.factory.credential_for("delegated-alice").unwrap();
    assert_eq!(cred.base_url, "https://demo.tradovateapi.com/v1");
}

#[tokio::test]
async fn test_expired_delegated_token_maps_to_token_expired() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    let expired = || Err(DownstreamError::Unauthorized("Expired Access Token".into()));
    srv.api.script_accounts(expired()).await;

    let res = client
        .get(format!("{}/accounts?connectionRef=TS-1", srv.base_url))
        .bearer_auth(mint("alice", 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.code.as_deref(), Some("TOKEN_EXPIRED"));

    srv.api
        .script_accounts(Err(DownstreamError::RateLimited("slow down".into())))
        .await;
    let res = client
        .get(format!("{}/accounts?connectionRef=TS-1", srv.base_url))
        .bearer_auth(mint("alice", 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_write_then_read_is_cached() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    let token = mint("alice", 600);

    // ============================================
    // Case 1: 没有白名单字段
    // ============================================
    let res = client
        .post(format!("{}/risk/42", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({"connectionRef": "TS-1", "changesLocked": true, "foo": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert_eq!(body.error, "No valid risk settings fields provided");
    assert_eq!(body.code.as_deref(), Some("VALIDATION_ERROR"));
    assert_eq!(srv.api.update_calls(), 0);

    // ============================================
    // Case 2: 写入成功
    // ============================================
    let res = client
        .post(format!("{}/risk/42", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({"connectionRef": "TS-1", "dailyLossAutoLiq": 500, "doNotUnlock": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: RiskUpdateResponse = res.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.auto_liq.id, Some(AccountId(42)));
    assert_eq!(body.auto_liq.daily_loss_auto_liq, Some(dec!(500)));
    assert_eq!(body.auto_liq.do_not_unlock, None, "非白名单字段不下发");

    // ============================================
    // Case 3: 紧随其后的读取命中缓存
    // ============================================
    let res = client
        .get(format!("{}/risk/42?connectionRef=TS-1", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: RiskResponse = res.json().await.unwrap();
    assert!(body.cached);
    assert_eq!(body.auto_liq.unwrap().daily_loss_auto_liq, Some(dec!(500)));
    assert_eq!(srv.api.read_calls(), 0);
    assert_eq!(srv.api.update_calls(), 1);
}

#[tokio::test]
async fn test_list_accounts() {
    let srv = spawn_test_server().await;
    let client = reqwest::Client::new();
    srv.api
        .script_accounts(Ok(vec![Account {
            id: AccountId(1),
            name: "DEMO0001".into(),
            user_id: Some(10),
            account_type: Some("Customer".into()),
            active: Some(true),
            nickname: None,
        }]))
        .await;

    let res = client
        .get(format!("{}/accounts?connectionRef=TS-1", srv.base_url))
        .bearer_auth(mint("bob", 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: AccountsResponse = res.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.accounts.len(), 1);
    assert_eq!(body.accounts[0].name, "DEMO0001");
    assert!(srv.factory.credential_for("delegated-bob").is_some());
}

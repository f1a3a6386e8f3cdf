#![allow(dead_code)]

use std::{
    env,
    sync::{Arc, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use mongodb::{Client, bson::oid::ObjectId};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt; // for oneshot

use fieldsales::{
    build_router,
    config::Settings,
    messages::Lang,
    models::UserRole,
    state::{AppState, NewUser, create_user, init_state},
    team::TeamTags,
    tenant::{TENANT_HEADER, TenantScope},
};

/// Global lock so integration tests that mutate the DB run one-at-a-time.
static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestContext {
    pub state: AppState,
    pub db_name: String,
    uri: String,
    _guard: MutexGuard<'static, ()>,
}

fn mongodb_uri() -> String {
    env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000".to_string())
}

pub fn test_settings(db_name: &str) -> Settings {
    Settings {
        port: 0,
        mongodb_uri: mongodb_uri(),
        mongodb_db: db_name.to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        users_file: "./does-not-exist/users.json".to_string(),
        default_language: Lang::En,
    }
}

/// State over a client that is never contacted; for requests rejected
/// before any repository call.
pub async fn offline_state() -> Arc<AppState> {
    let client = Client::with_uri_str("mongodb://localhost:27017")
        .await
        .expect("client construction is lazy");
    Arc::new(AppState::from_database(
        &client.database("fieldsales_offline"),
        Lang::En,
    ))
}

pub async fn setup_state() -> Option<TestContext> {
    let guard = TEST_DB_LOCK.get_or_init(|| Mutex::new(())).lock().await;

    let uri = mongodb_uri();
    let db_name = format!(
        "fieldsalestest_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );

    let client = match Client::with_uri_str(&uri).await {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Skipping test; cannot connect to MongoDB: {err:?}");
            return None;
        }
    };
    if let Err(err) = client.database(&db_name).drop().await {
        eprintln!("Skipping test; cannot drop test DB: {err:?}");
        return None;
    }

    match init_state(&test_settings(&db_name)).await {
        Ok(state) => Some(TestContext {
            state,
            db_name,
            uri,
            _guard: guard,
        }),
        Err(err) => {
            eprintln!("Skipping test; init_state failed: {err:?}");
            None
        }
    }
}

pub async fn teardown(ctx: Option<TestContext>) {
    if let Some(ctx) = ctx {
        if let Ok(client) = Client::with_uri_str(&ctx.uri).await {
            let _ = client.database(&ctx.db_name).drop().await;
        }
        drop(ctx);
    }
}

pub fn new_tenant() -> TenantScope {
    TenantScope::new(ObjectId::new())
}

pub async fn add_user(state: &AppState, scope: &TenantScope, email: &str, role: UserRole) -> ObjectId {
    create_user(
        state,
        scope,
        NewUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role,
            team_products: TeamTags::parse("TEAM A"),
            team_area: TeamTags::parse("NORTH"),
        },
    )
    .await
    .expect("create user")
    .id
    .expect("inserted id")
}

pub fn app(state: Arc<AppState>) -> Router {
    build_router(state)
}

pub async fn send(
    app: Router,
    method: &str,
    path: &str,
    tenant: Option<&TenantScope>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(path);
    if let Some(scope) = tenant {
        req = req.header(TENANT_HEADER, scope.admin_id().to_hex());
    }
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.oneshot(req).await.expect("request failed");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), 1024 * 1024)
        .await
        .expect("body read failed");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

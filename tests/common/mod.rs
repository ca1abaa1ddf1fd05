use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use reqwest::Client;
use serde_json::{Value, json};

use hotline::config::{
    AirtableConfig, BackendKind, Config, OauthConfig, ProviderEndpoints, SheetsConfig,
    SupabaseConfig,
};

/// A running app instance bound to an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a JSON payload, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/submit"))
            .json(data)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit with a cookie header (for OAuth-backed flows).
    pub async fn submit_json_with_cookie(&self, data: &Value, cookie: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/submit"))
            .header("cookie", cookie)
            .json(data)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Baseline config with every backend section missing, so each test fills
/// in exactly the section it exercises. Built directly instead of from the
/// environment to keep tests independent of process-wide state.
pub fn base_config(backend: BackendKind) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        backend,
        credential_key: "test-credential-key-32-chars-ok!".to_string(),
        max_body_size: 10 * 1024 * 1024,
        rate_limit: 100,
        rate_limit_window_secs: 60,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        airtable: Err("Missing required environment variables: AIRTABLE_BASE_ID, \
                       AIRTABLE_TABLE_ID, AIRTABLE_PERSONAL_ACCESS_TOKEN"
            .to_string()),
        service_account: Err("Missing required environment variables: \
                              GOOGLE_SERVICE_ACCOUNT_EMAIL, GOOGLE_PRIVATE_KEY"
            .to_string()),
        sheets: Err("Missing required environment variables: GOOGLE_SHEET_ID".to_string()),
        oauth: Err("Missing required environment variables: GOOGLE_CLIENT_ID, \
                    GOOGLE_CLIENT_SECRET, GOOGLE_REDIRECT_URI"
            .to_string()),
        supabase: Err(
            "Missing required environment variables: SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY"
                .to_string(),
        ),
        drive_folder_id: None,
        endpoints: ProviderEndpoints::default(),
    }
}

pub fn airtable_config() -> AirtableConfig {
    AirtableConfig {
        base_id: "appTESTBASE".to_string(),
        table_id: "Stories".to_string(),
        personal_access_token: "pat-test-token".to_string(),
    }
}

pub fn sheets_config() -> SheetsConfig {
    SheetsConfig {
        sheet_id: "sheet-test-id".to_string(),
        range: "Submissions!A:F".to_string(),
    }
}

pub fn oauth_config(base_url: &str) -> OauthConfig {
    OauthConfig {
        client_id: "client-test-id".to_string(),
        client_secret: "client-test-secret".to_string(),
        redirect_uri: format!("{base_url}/auth/callback"),
    }
}

pub fn supabase_config(url: &str) -> SupabaseConfig {
    SupabaseConfig {
        url: url.trim_end_matches('/').to_string(),
        service_role_key: "service-role-test-key".to_string(),
        table: "submissions".to_string(),
        bucket: "voice-memos".to_string(),
    }
}

/// Spawn the app under test.
pub async fn spawn_app(config: Config) -> TestApp {
    let app = hotline::build_app(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { addr, client }
}

/// Spawn a stub provider router on an ephemeral port, returning its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub failed");
    });

    format!("http://{addr}")
}

// ── Request recording ───────────────────────────────────────────

#[derive(Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

/// Requests a stub provider has seen, shared between the stub and the test.
#[derive(Clone, Default)]
pub struct Recorded {
    inner: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorded {
    pub fn push(&self, method: &str, path: String, body: Value) {
        self.inner.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            path,
            body,
        });
    }

    pub fn matching(&self, method: &str, path_part: &str) -> Vec<RecordedRequest> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path.contains(path_part))
            .cloned()
            .collect()
    }

    pub fn count(&self, method: &str, path_part: &str) -> usize {
        self.matching(method, path_part).len()
    }

    pub fn total(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

// ── Airtable stub ───────────────────────────────────────────────

pub async fn spawn_airtable_stub(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/v0/meta/bases/{base}/tables", get(airtable_meta))
        .route("/v0/{base}/{table}", post(airtable_create))
        .with_state(recorded);
    spawn_stub(app).await
}

async fn airtable_meta(State(rec): State<Recorded>, Path(base): Path<String>) -> Json<Value> {
    rec.push("GET", format!("/v0/meta/bases/{base}/tables"), Value::Null);
    Json(json!({
        "tables": [
            { "id": "tblSTORIES", "name": "Stories" },
            { "id": "tblOTHER", "name": "Other" },
        ]
    }))
}

async fn airtable_create(
    State(rec): State<Recorded>,
    Path((base, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.push("POST", format!("/v0/{base}/{table}"), body);
    let n = rec.count("POST", "/v0/");
    Json(json!({
        "id": format!("rec{n:06}"),
        "createdTime": "2025-10-31T00:00:00.000Z",
    }))
}

// ── Google stubs (Drive, Sheets, token endpoint) ────────────────

#[derive(Clone)]
pub struct GoogleStubState {
    pub recorded: Recorded,
    pub permission_status: u16,
}

/// One stub standing in for the Google APIs: Drive multipart upload,
/// permission grant, Sheets append/metadata, and the OAuth token endpoint.
pub async fn spawn_google_stub(recorded: Recorded, permission_status: u16) -> String {
    let state = GoogleStubState {
        recorded,
        permission_status,
    };
    let app = Router::new()
        .route("/upload/drive/v3/files", post(drive_upload))
        .route("/drive/v3/files/{id}/permissions", post(drive_permissions))
        .route("/v4/spreadsheets/{id}", get(sheets_meta))
        .route("/v4/spreadsheets/{id}/values/{range}", post(sheets_append))
        .route("/token", post(token_exchange))
        .with_state(state);
    spawn_stub(app).await
}

async fn drive_upload(State(state): State<GoogleStubState>, body: axum::body::Bytes) -> Json<Value> {
    state.recorded.push(
        "POST",
        "/upload/drive/v3/files".to_string(),
        json!(String::from_utf8_lossy(&body)),
    );
    Json(json!({ "id": "file-stub-123" }))
}

async fn drive_permissions(
    State(state): State<GoogleStubState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .recorded
        .push("POST", format!("/drive/v3/files/{id}/permissions"), body);
    let status = StatusCode::from_u16(state.permission_status).unwrap();
    if status.is_success() {
        (status, Json(json!({ "id": "perm-1" })))
    } else {
        (
            status,
            Json(json!({ "error": { "message": "The user does not have sufficient permissions" } })),
        )
    }
}

async fn sheets_meta(State(state): State<GoogleStubState>, Path(id): Path<String>) -> Json<Value> {
    state
        .recorded
        .push("GET", format!("/v4/spreadsheets/{id}"), Value::Null);
    Json(json!({ "spreadsheetId": id }))
}

async fn sheets_append(
    State(state): State<GoogleStubState>,
    Path((id, range)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .recorded
        .push("POST", format!("/v4/spreadsheets/{id}/values/{range}"), body);
    Json(json!({
        "spreadsheetId": id,
        "updates": { "updatedRange": "Submissions!A2:F2" },
    }))
}

async fn token_exchange(State(state): State<GoogleStubState>) -> Json<Value> {
    state.recorded.push("POST", "/token".to_string(), Value::Null);
    Json(json!({
        "access_token": "ya29.stub-access-token",
        "refresh_token": "1//stub-refresh-token",
        "expires_in": 3599,
        "token_type": "Bearer",
    }))
}

// ── Supabase stub ───────────────────────────────────────────────

pub async fn spawn_supabase_stub(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/rest/v1/{table}", get(supabase_probe).post(supabase_insert))
        .route("/storage/v1/object/{bucket}/{object}", post(supabase_upload))
        .with_state(recorded);
    spawn_stub(app).await
}

async fn supabase_probe(State(rec): State<Recorded>, Path(table): Path<String>) -> Json<Value> {
    rec.push("GET", format!("/rest/v1/{table}"), Value::Null);
    Json(json!([]))
}

async fn supabase_insert(
    State(rec): State<Recorded>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.push("POST", format!("/rest/v1/{table}"), body);
    let n = rec.count("POST", "/rest/v1/");
    Json(json!([{ "id": 100 + n }]))
}

async fn supabase_upload(
    State(rec): State<Recorded>,
    Path((bucket, object)): Path<(String, String)>,
    body: axum::body::Bytes,
) -> Json<Value> {
    rec.push(
        "POST",
        format!("/storage/v1/object/{bucket}/{object}"),
        json!({ "len": body.len() }),
    );
    Json(json!({ "Key": format!("{bucket}/{object}") }))
}

/// Build the `cookie` header value carrying a sealed credential, the same
/// way the callback handler would have set it.
pub fn credential_cookie_header(key: &str, access_token: &str) -> String {
    use axum_extra::extract::CookieJar;
    use hotline::auth::cookie::{CREDENTIAL_COOKIE, store_credential};
    use hotline::models::StoredCredential;

    let credential = StoredCredential {
        access_token: access_token.to_string(),
        refresh_token: None,
        expires_at: None,
    };
    let jar = store_credential(CookieJar::new(), &credential, key, false).unwrap();
    let value = jar.get(CREDENTIAL_COOKIE).unwrap().value().to_string();
    format!("{CREDENTIAL_COOKIE}={value}")
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web UI: lookup forms, API keys page and the live results panel

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, Form, Multipart, Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::credentials::{mask, CredentialStore, KNOWN_KEYS};
use crate::lookups::{InputKind, Lookup, LookupContext, LookupInfo, LookupRegistry};
use crate::panel::{Line, ResultsPanel};
use crate::{Result, WicError};

/// Largest accepted image upload
const UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub panel: ResultsPanel,
    pub registry: LookupRegistry,
    pub config: Arc<AppConfig>,
    /// Base context; each lookup gets a copy with the current credentials
    lookups: LookupContext,
    credentials: Mutex<CredentialStore>,
}

impl AppState {
    pub fn new(config: AppConfig, credentials: CredentialStore) -> Result<Self> {
        let config = Arc::new(config);
        let panel = ResultsPanel::new();
        let lookups = LookupContext::new(
            config.clone(),
            Arc::new(credentials.clone()),
            panel.clone(),
        )?;

        Ok(Self {
            panel,
            registry: LookupRegistry::new(),
            config,
            lookups,
            credentials: Mutex::new(credentials),
        })
    }

    fn credentials(&self) -> MutexGuard<'_, CredentialStore> {
        self.credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a lookup in the background; results arrive through the panel
    fn spawn_lookup(self: &Arc<Self>, service: String, input: String, upload: Option<PathBuf>) {
        let ctx = self
            .lookups
            .with_credentials(Arc::new(self.credentials().clone()));
        let state = Arc::clone(self);

        tokio::spawn(async move {
            if let Err(e) = state.registry.dispatch(&ctx, &service, &input).await {
                warn!("Lookup {} rejected: {}", service, e);
            }
            // Reap the probe tasks so their handles do not pile up
            ctx.wait_pending().await;

            if let Some(path) = upload {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!("Could not remove upload {:?}: {}", path, e);
                }
            }
        });
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(index_page))
        .route("/keys", get(keys_page).post(save_keys))
        // API endpoints
        .route("/api/lookup", post(api_lookup))
        .route(
            "/api/image",
            post(api_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/results", get(api_results))
        .route("/api/clear", post(api_clear))
        .route("/api/services", get(api_services))
        // Link table and live feed
        .route("/open/:tag", get(open_link))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Errors ===

/// JSON error body with a status code
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.1 }));
        (self.0, body).into_response()
    }
}

impl From<WicError> for ApiError {
    fn from(e: WicError) -> Self {
        let status = match e {
            WicError::EmptyInput | WicError::UnknownLookup(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(&state.registry))
}

async fn keys_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let credentials = state.credentials();
    Html(render_keys_page(&credentials, None))
}

async fn save_keys(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> std::result::Result<Html<String>, ApiError> {
    let mut credentials = state.credentials();

    for key in KNOWN_KEYS {
        if form.contains_key(&format!("clear_{}", key)) {
            credentials.remove(key);
            continue;
        }
        if let Some(value) = form.get(*key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            credentials.set(key, value);
        }
    }

    credentials.save()?;
    info!("Saved API keys to {:?}", credentials.path());
    Ok(Html(render_keys_page(&credentials, Some("API keys saved."))))
}

// === API Handlers ===

#[derive(Debug, Deserialize)]
struct LookupRequest {
    service: String,
    #[serde(default)]
    input: String,
}

#[derive(Serialize)]
struct Accepted {
    service: String,
}

async fn api_lookup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LookupRequest>,
) -> std::result::Result<(StatusCode, Json<Accepted>), ApiError> {
    let (lookup, input) = state.registry.validate(&request.service, &request.input)?;
    let service = lookup.id().to_string();
    let input = input.to_string();

    debug!("Accepted lookup {}", service);
    state.spawn_lookup(service.clone(), input, None);
    Ok((StatusCode::ACCEPTED, Json(Accepted { service })))
}

async fn api_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> std::result::Result<(StatusCode, Json<Accepted>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError(StatusCode::BAD_REQUEST, e.to_string()))?;
        if bytes.is_empty() {
            return Err(WicError::EmptyInput.into());
        }

        let path = std::env::temp_dir().join(format!("wicosintx-{}{}", Uuid::new_v4(), extension));
        tokio::fs::write(&path, &bytes).await.map_err(WicError::from)?;
        debug!("Stored upload ({} bytes) at {:?}", bytes.len(), path);

        let input = path.to_string_lossy().into_owned();
        state.spawn_lookup("image-exif".to_string(), input, Some(path));
        return Ok((
            StatusCode::ACCEPTED,
            Json(Accepted {
                service: "image-exif".to_string(),
            }),
        ));
    }

    Err(ApiError(
        StatusCode::BAD_REQUEST,
        "Missing 'file' field".to_string(),
    ))
}

async fn api_results(State(state): State<Arc<AppState>>) -> Json<Vec<Line>> {
    Json(state.panel.snapshot())
}

async fn api_clear(State(state): State<Arc<AppState>>) -> StatusCode {
    state.panel.clear();
    StatusCode::NO_CONTENT
}

async fn api_services(State(state): State<Arc<AppState>>) -> Json<Vec<LookupInfo>> {
    Json(state.registry.describe())
}

async fn open_link(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> std::result::Result<Redirect, ApiError> {
    match state.panel.resolve(&tag) {
        Some(url) => Ok(Redirect::to(&url)),
        None => Err(ApiError(
            StatusCode::NOT_FOUND,
            format!("Unknown link: {}", tag),
        )),
    }
}

// === WebSocket ===

#[derive(Serialize)]
struct SnapshotMessage<'a> {
    event: &'static str,
    lines: &'a [Line],
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| stream_panel(socket, state))
}

async fn stream_panel(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (lines, mut feed) = state.panel.follow();
    let snapshot = SnapshotMessage {
        event: "snapshot",
        lines: &lines,
    };
    match serde_json::to_string(&snapshot) {
        Ok(text) => {
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        Err(e) => {
            warn!("Could not encode panel snapshot: {}", e);
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Could not encode panel event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client lagged, {} lines skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("WebSocket client disconnected");
}

// === Template Rendering ===

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = r#"
        :root {
            --bg-primary: #1a1a2e;
            --bg-secondary: #16213e;
            --bg-card: #0f3460;
            --bg-panel: #2b2b2b;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
            --border: #2a2a4a;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }
        .container { max-width: 1400px; margin: 0 auto; padding: 20px; }
        nav {
            background: var(--bg-secondary);
            padding: 15px 20px;
            display: flex;
            align-items: center;
            gap: 30px;
            border-bottom: 1px solid var(--border);
        }
        nav .logo {
            font-size: 1.5em;
            font-weight: bold;
            color: var(--accent);
            text-decoration: none;
        }
        nav a { color: var(--text-secondary); text-decoration: none; }
        nav a:hover { color: var(--text-primary); }
        .layout { display: grid; grid-template-columns: 1fr 2fr; gap: 20px; }
        .card {
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 20px;
        }
        .card h2 { margin-bottom: 10px; color: var(--accent); font-size: 1.1em; }
        form { display: flex; gap: 8px; flex-wrap: wrap; }
        input, select, button {
            padding: 6px 10px;
            border-radius: 6px;
            border: 1px solid var(--border);
            background: var(--bg-secondary);
            color: var(--text-primary);
        }
        input[type=text], input[type=password] { flex: 1; min-width: 180px; }
        button { background: var(--accent); border: none; cursor: pointer; }
        table { width: 100%; border-collapse: collapse; }
        td { padding: 8px; border-bottom: 1px solid var(--border); }
        .muted { color: var(--text-secondary); font-size: 0.85em; }
        .notice { color: lightgreen; margin-bottom: 15px; }
        #status { min-height: 1.5em; color: orange; margin-bottom: 10px; }
        #results {
            background: var(--bg-panel);
            color: white;
            font-family: Consolas, 'DejaVu Sans Mono', monospace;
            font-size: 0.9em;
            height: 75vh;
            overflow-y: auto;
            padding: 12px;
            border-radius: 8px;
            white-space: pre-wrap;
        }
        #results .line { display: block; }
        #results .success { color: lightgreen; }
        #results .not_found { color: red; }
        #results .info { color: yellow; }
        #results .error { color: orange; }
        #results .pending { color: gray; }
        #results a.link { color: cyan; text-decoration: underline; cursor: pointer; }
"#;

const PANEL_SCRIPT: &str = r#"
const panel = document.getElementById('results');
const statusBox = document.getElementById('status');

let lastId = -1;

function appendLine(line) {
    if (line.id <= lastId) return;
    lastId = line.id;
    const el = document.createElement(line.link ? 'a' : 'span');
    el.className = 'line ' + (line.tag || 'plain');
    if (line.link) {
        el.classList.add('link');
        el.href = '/open/' + encodeURIComponent(line.link);
        el.target = '_blank';
        el.rel = 'noopener';
    }
    el.textContent = line.text;
    panel.appendChild(el);
    panel.scrollTop = panel.scrollHeight;
}

function connect() {
    const proto = location.protocol === 'https:' ? 'wss' : 'ws';
    const ws = new WebSocket(proto + '://' + location.host + '/ws');
    ws.onmessage = (msg) => {
        const ev = JSON.parse(msg.data);
        if (ev.event === 'snapshot') {
            panel.innerHTML = '';
            ev.lines.forEach(appendLine);
        } else if (ev.event === 'line') {
            appendLine(ev);
        } else if (ev.event === 'cleared') {
            panel.innerHTML = '';
        }
    };
    ws.onclose = () => setTimeout(connect, 2000);
}

async function report(response) {
    if (response.ok) {
        statusBox.textContent = '';
        return;
    }
    const body = await response.json().catch(() => ({}));
    statusBox.textContent = body.error || ('Request failed: ' + response.status);
}

async function lookup(service, input) {
    const response = await fetch('/api/lookup', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ service, input }),
    });
    await report(response);
}

document.querySelectorAll('form.lookup').forEach((form) => {
    form.addEventListener('submit', (e) => {
        e.preventDefault();
        const data = new FormData(form);
        lookup(data.get('service'), data.get('input') || '');
    });
});

document.getElementById('upload-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const response = await fetch('/api/image', { method: 'POST', body: new FormData(e.target) });
    await report(response);
});

document.getElementById('reverse').addEventListener('click', () => {
    lookup('image-reverse', '');
});

document.getElementById('clear').addEventListener('click', async () => {
    await report(await fetch('/api/clear', { method: 'POST' }));
});

connect();
"#;

fn base_template(title: &str, content: &str, script: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - WicOsintX</title>
    <style>{}</style>
</head>
<body>
    <nav>
        <a href="/" class="logo">WicOsintX</a>
        <a href="/">Lookups</a>
        <a href="/keys">API keys</a>
    </nav>
    <main class="container">
        {}
    </main>
    <script>{}</script>
</body>
</html>"#, title, STYLE, content, script)
}

fn render_lookup_form(kind: InputKind, lookups: &[&dyn Lookup]) -> String {
    let selector = match lookups {
        [single] => format!(r#"<input type="hidden" name="service" value="{}">"#, single.id()),
        _ => {
            let options: String = lookups
                .iter()
                .map(|l| format!(r#"<option value="{}">{}</option>"#, l.id(), escape_html(l.label())))
                .collect();
            format!(r#"<select name="service">{}</select>"#, options)
        }
    };

    format!(r#"
        <div class="card">
            <h2>{}</h2>
            <form class="lookup">
                {}
                <input type="text" name="input" required>
                <button type="submit">Search</button>
            </form>
        </div>
    "#, escape_html(kind.label()), selector)
}

fn render_index(registry: &LookupRegistry) -> String {
    let forms: String = InputKind::ALL
        .iter()
        .filter(|kind| **kind != InputKind::Image)
        .map(|kind| render_lookup_form(*kind, &registry.for_kind(*kind)))
        .collect();

    let content = format!(r#"
        <div class="layout">
            <div>
                {}
                <div class="card">
                    <h2>{}</h2>
                    <form id="upload-form" enctype="multipart/form-data">
                        <input type="file" name="file" accept="image/*" required>
                        <button type="submit">Extract EXIF</button>
                    </form>
                    <p class="muted" style="margin-top: 10px;">
                        <button type="button" id="reverse">Reverse image search</button>
                    </p>
                </div>
                <div class="card">
                    <button type="button" id="clear">Clear results</button>
                </div>
            </div>
            <div class="card">
                <h2>Results</h2>
                <div id="status"></div>
                <div id="results"></div>
            </div>
        </div>
    "#, forms, escape_html(InputKind::Image.label()));

    base_template("Lookups", &content, PANEL_SCRIPT)
}

fn render_keys_page(credentials: &CredentialStore, notice: Option<&str>) -> String {
    let rows: String = KNOWN_KEYS
        .iter()
        .map(|key| {
            let current = credentials
                .get(key)
                .map(mask)
                .unwrap_or_else(|| "not set".to_string());
            format!(r#"
                <tr>
                    <td>{key}</td>
                    <td><input type="password" name="{key}" placeholder="{current}" autocomplete="off"></td>
                    <td><label class="muted"><input type="checkbox" name="clear_{key}"> remove</label></td>
                </tr>
            "#, key = key, current = escape_html(&current))
        })
        .collect();

    let notice = notice
        .map(|n| format!(r#"<p class="notice">{}</p>"#, escape_html(n)))
        .unwrap_or_default();

    let content = format!(r#"
        <h1>API keys</h1>
        <div class="card">
            {}
            <p class="muted">Stored in {}. Leave a field empty to keep its current value.</p>
            <form method="post" action="/keys" style="display: block; margin-top: 15px;">
                <table>{}</table>
                <p style="margin-top: 15px;"><button type="submit">Save</button></p>
            </form>
        </div>
    "#, notice, escape_html(&credentials.path().display().to_string()), rows);

    base_template("API keys", &content, "")
}

/// Start the web server with config and credentials
pub async fn start_server(config: AppConfig, credentials: CredentialStore) -> Result<()> {
    let addr = config.web_addr();
    let state = Arc::new(AppState::new(config, credentials)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| WicError::Web(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{PanelEvent, Tag};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        let credentials = CredentialStore::load(dir.path().join("apis.json")).unwrap();
        Arc::new(AppState::new(AppConfig::default(), credentials).unwrap())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_lists_every_input_kind() {
        let dir = TempDir::new().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        for kind in InputKind::ALL {
            assert!(html.contains(&escape_html(kind.label())), "missing {:?}", kind);
        }
        assert!(html.contains(r#"<option value="ip-shodan">"#));
        assert!(html.contains(r#"name="service" value="domain-whois""#));
    }

    #[tokio::test]
    async fn other_origins_get_no_cors_grant() {
        let dir = TempDir::new().unwrap();
        let router = create_router(test_state(&dir));

        let results = router
            .clone()
            .oneshot(
                Request::get("/api/results")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(results.status(), StatusCode::OK);
        assert!(results
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());

        let preflight = router
            .oneshot(
                Request::options("/api/lookup")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(!preflight.status().is_success());
        assert!(preflight
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn services_endpoint_lists_registry() {
        let dir = TempDir::new().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(Request::get("/api/services").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let services: Vec<serde_json::Value> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(services.len(), 13);
        assert!(services.iter().any(|s| s["id"] == "email-dehashed" && s["kind"] == "email"));
    }

    #[tokio::test]
    async fn lookup_rejects_bad_requests() {
        let dir = TempDir::new().unwrap();
        let router = create_router(test_state(&dir));

        let unknown = router
            .clone()
            .oneshot(json_post("/api/lookup", serde_json::json!({ "service": "nope", "input": "x" })))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(unknown).await.contains("Unknown lookup: nope"));

        let empty = router
            .oneshot(json_post("/api/lookup", serde_json::json!({ "service": "ip-ipinfo", "input": "  " })))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lookup_runs_in_background() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let mut events = state.panel.subscribe();

        let response = create_router(state.clone())
            .oneshot(json_post("/api/lookup", serde_json::json!({ "service": "ip-shodan", "input": "8.8.8.8" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // No key stored, so the handler reports it on the panel
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            PanelEvent::Line(line) => {
                assert_eq!(line.tag, Some(Tag::Error));
                assert!(line.text.contains("No API key configured for Shodan"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_is_handed_to_exif() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let mut events = state.panel.subscribe();

        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"photo.jpg\"\r\n\
            Content-Type: image/jpeg\r\n\r\n\
            not really a jpeg\r\n\
            --XBOUNDARY--\r\n";
        let response = create_router(state)
            .oneshot(
                Request::post("/api/image")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            PanelEvent::Line(line) => {
                assert!(line.text.starts_with("\n[EXIF] Analyzing file: "));
                assert!(line.text.ends_with(".jpg"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"other\"\r\n\r\n\
            value\r\n\
            --XBOUNDARY--\r\n";
        let response = create_router(test_state(&dir))
            .oneshot(
                Request::post("/api/image")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn open_redirects_known_links_only() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let link = state
            .panel
            .write_link("-> ✅ Bing: Accessible.", Tag::Success, "https://www.bing.com/search?q=x");
        let router = create_router(state);

        let found = router
            .clone()
            .oneshot(Request::get(format!("/open/{}", link)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            found.headers().get(header::LOCATION).unwrap(),
            "https://www.bing.com/search?q=x"
        );

        let missing = router
            .oneshot(Request::get("/open/link-999").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_empties_results_and_links() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.panel.write("hello", Tag::Info);
        state.panel.write_link("link", Tag::Success, "https://example.com");
        let router = create_router(state.clone());

        let cleared = router
            .clone()
            .oneshot(Request::post("/api/clear").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
        assert!(state.panel.is_empty());
        assert_eq!(state.panel.link_count(), 0);

        let results = router
            .oneshot(Request::get("/api/results").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(results).await, "[]");
    }

    #[tokio::test]
    async fn keys_form_saves_and_clears() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.credentials().set("veriphone", "old-value");
        let router = create_router(state.clone());

        let form = "shodan=abcdefgh1234&veriphone=&clear_veriphone=on&dehashed_user=+++";
        let response = router
            .oneshot(
                Request::post("/keys")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("API keys saved."));
        assert!(!html.contains("abcdefgh1234"));

        let reloaded = CredentialStore::load(dir.path().join("apis.json")).unwrap();
        assert_eq!(reloaded.get("shodan"), Some("abcdefgh1234"));
        assert_eq!(reloaded.get("veriphone"), None);
        assert_eq!(reloaded.get("dehashed_user"), None);
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}

//! HTTP server for the OAuth code exchange
//!
//! `lifelog serve` → browser sends `GET <endpoint>?code=...`, gets back
//! `{access_token, user}`.

use serde::Deserialize;
use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::oauth::CodeExchange;

const ALLOWED_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Status plus optional JSON body, before any headers are attached
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<Value>,
}

impl Reply {
    fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }
}

#[derive(Deserialize, Default)]
struct ExchangeQuery {
    #[serde(default)]
    code: Option<String>,
}

/// Start the exchange server and block serving requests
pub fn start_auth_server(
    port: u16,
    endpoint_path: &str,
    exchanger: &dyn CodeExchange,
) -> std::io::Result<()> {
    let server = Server::http(format!("127.0.0.1:{}", port))
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    eprintln!("\n\x1b[1;32m📓 lifelog\x1b[0m");
    eprintln!("   OAuth exchange: http://localhost:{}{}", port, endpoint_path);
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, endpoint_path, exchanger) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

pub fn handle_request(
    request: Request,
    endpoint_path: &str,
    exchanger: &dyn CodeExchange,
) -> std::io::Result<()> {
    let origin = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Origin"))
        .map(|h| h.value.as_str().to_string());

    let reply = route(
        request.method(),
        request.url(),
        origin.as_deref(),
        endpoint_path,
        exchanger,
    );
    log::info!("{} {} -> {}", request.method(), request.url(), reply.status);

    let mut response = Response::from_string(
        reply
            .body
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default(),
    )
    .with_status_code(reply.status);
    for header in cors_headers() {
        response.add_header(header);
    }
    if reply.body.is_some() {
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
            response.add_header(header);
        }
    }
    request.respond(response)
}

/// Decide the reply for one request
pub fn route(
    method: &Method,
    url: &str,
    origin: Option<&str>,
    endpoint_path: &str,
    exchanger: &dyn CodeExchange,
) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    if path.trim_end_matches('/') != endpoint_path.trim_end_matches('/') {
        return Reply::json(404, json!({ "error": "Not found" }));
    }

    match method {
        Method::Options => return Reply::empty(200),
        Method::Get => {}
        _ => return Reply::json(405, json!({ "error": "Method not allowed" })),
    }

    let code = serde_urlencoded::from_str::<ExchangeQuery>(query)
        .unwrap_or_default()
        .code
        .filter(|c| !c.is_empty());
    let Some(code) = code else {
        return Reply::json(400, json!({ "error": "Missing authorization code" }));
    };

    match exchanger.exchange(&code, origin) {
        Ok(token) => Reply::json(200, json!({ "access_token": token.access_token, "user": token.user })),
        Err(e) => {
            log::warn!("OAuth exchange failed: {}", e);
            Reply::json(
                500,
                json!({ "error": "OAuth authentication failed", "message": e.to_string() }),
            )
        }
    }
}

/// Headers sent on every response, preflight included
pub fn cors_headers() -> Vec<Header> {
    [
        ("Access-Control-Allow-Credentials", "true"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET,OPTIONS"),
        ("Access-Control-Allow-Headers", ALLOWED_HEADERS),
    ]
    .into_iter()
    .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
    .collect()
}

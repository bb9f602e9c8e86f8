// HTTP client for the retrieval backend.
//
// The session state machine never touches reqwest directly: it consumes the
// three-outcome result types produced here. `Backend` is the narrow seam the
// orchestrator calls through, so tests can substitute scripted doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Result of the one-shot health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Backend is up and its vector store is loaded.
    Ready,
    /// Backend responded but reports the vector store as still loading.
    Loading,
    /// Error status, network failure, or unparsable health body.
    Unreachable,
}

/// Result of one query call. Every submission resolves to exactly one of
/// these; there is no retry at this layer or above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// 2xx response with a parsable answer body.
    Answer(String),
    /// Non-success status, or a response body that failed to parse.
    HttpError,
    /// The request never completed (connect/transport failure).
    NetworkError,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HealthResponse {
    vectorstore_loaded: bool,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: String,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// The backend surface the orchestrator depends on.
///
/// Both calls are infallible by signature: every failure mode is folded into
/// the outcome enums so the caller has a single resolution path per call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Probe `GET /health` once.
    async fn probe_health(&self) -> ProbeOutcome;

    /// Send one question to `POST /query`.
    async fn send_query(&self, question: &str) -> QueryOutcome;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Production backend speaking JSON over HTTP via reqwest.
///
/// No timeout is configured: a hanging backend call leaves the session busy
/// until the call completes. Callers needing liveness must layer polling on
/// top.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        HttpBackend {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn probe_health(&self) -> ProbeOutcome {
        let url = format!("{}/health", self.base_url);
        debug!(%url, "probing backend health");

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("health probe failed to complete: {e}");
                return ProbeOutcome::Unreachable;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "health probe returned error status");
            return ProbeOutcome::Unreachable;
        }

        match response.json::<HealthResponse>().await {
            Ok(body) if body.vectorstore_loaded => ProbeOutcome::Ready,
            Ok(_) => ProbeOutcome::Loading,
            Err(e) => {
                warn!("health probe body failed to parse: {e}");
                ProbeOutcome::Unreachable
            }
        }
    }

    async fn send_query(&self, question: &str) -> QueryOutcome {
        let url = format!("{}/query", self.base_url);
        debug!(%url, "sending query");

        let response = match self
            .http
            .post(&url)
            .json(&QueryRequest { question })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("query failed to complete: {e}");
                return QueryOutcome::NetworkError;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "query returned error status");
            return QueryOutcome::HttpError;
        }

        match response.json::<QueryResponse>().await {
            Ok(body) => QueryOutcome::Answer(body.answer),
            Err(e) => {
                warn!("query body failed to parse: {e}");
                QueryOutcome::HttpError
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (mock TCP servers, one request each)
// ---------------------------------------------------------------------------

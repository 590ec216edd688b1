use std::{fmt, net::SocketAddr, num::ParseIntError};

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::{latency::LatencyRange, routes::AppState};

/// Status returned when `status` is missing or unusable.
pub const DEFAULT_STATUS: u16 = 400;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("no status given")]
    Missing,

    #[error("status is not an integer")]
    NotANumber(#[from] ParseIntError),

    #[error("status {0} is outside 100..600")]
    OutOfRange(i64),
}

/// Parses a status code. Any integer in `100..600` is accepted, registered or not.
pub fn parse_status(raw: &str) -> Result<u16, StatusError> {
    if raw.is_empty() {
        return Err(StatusError::Missing);
    }
    let code: i64 = raw.parse()?;
    if !(100..600).contains(&code) {
        return Err(StatusError::OutOfRange(code));
    }
    Ok(code as u16)
}

/// A `/simulate` query after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub status: u16,
    pub stdout_msg: Option<String>,
    pub stderr_msg: Option<String>,
    pub latency: LatencyRange,
}

impl SimulationRequest {
    /// Normalizes decoded query pairs. The first occurrence of a key wins.
    /// Invalid values are logged and replaced, so this never fails.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        let raw_status = get("status");
        let status = parse_status(raw_status).unwrap_or_else(|err| {
            error!(
                status_code = raw_status,
                %err,
                "invalid or missing 'status' parameter, defaulting to 400"
            );
            DEFAULT_STATUS
        });

        Self {
            status,
            stdout_msg: non_empty(get("stdout_msg")),
            stderr_msg: non_empty(get("stderr_msg")),
            latency: LatencyRange::parse(get("latency")),
        }
    }

    /// Sleeps, emits the requested markers and reports what happened.
    pub async fn execute(&self, state: &AppState) -> SimulationOutcome {
        let latency_ms = self.latency.apply(&*state.random).await;

        if let Some(msg) = &self.stdout_msg {
            state.stdout.write_line(&format!("STDOUT_TRIGGER: {msg}"));
        }
        if let Some(msg) = &self.stderr_msg {
            state.stderr.write_line(&format!("STDERR_TRIGGER: {msg}"));
        }

        SimulationOutcome {
            status: self.status,
            stdout_triggered: self.stdout_msg.is_some(),
            stderr_triggered: self.stderr_msg.is_some(),
            latency_ms,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub status: u16,
    pub stdout_triggered: bool,
    pub stderr_triggered: bool,
    pub latency_ms: u64,
}

impl fmt::Display for SimulationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulated HTTP {}", self.status)?;
        writeln!(f, "STDOUT triggered: {}", self.stdout_triggered)?;
        writeln!(f, "STDERR triggered: {}", self.stderr_triggered)?;
        writeln!(f, "Latency: {}ms", self.latency_ms)
    }
}

impl IntoResponse for SimulationOutcome {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_REQUEST);
        (status, self.to_string()).into_response()
    }
}

pub async fn simulate(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let path = parts.uri.path().to_owned();
    let query = parts.uri.query().unwrap_or_default();
    let raddr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_owned());

    info!(method = %parts.method, path = %path, raddr = %raddr, query, "serving simulate request");

    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(pairs)) => pairs,
        Err(err) => {
            error!(query, %err, "unreadable query string, ignoring it");
            Vec::new()
        }
    };

    let outcome = SimulationRequest::from_query(&pairs).execute(&state).await;

    info!(
        status_code = outcome.status,
        path = %path,
        latency = outcome.latency_ms,
        "responded simulate"
    );

    outcome.into_response()
}

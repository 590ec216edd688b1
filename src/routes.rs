use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    routing::any,
    Router,
};
use tracing::info;

use crate::{
    latency::{RandomSource, ThreadRandom},
    simulate::simulate,
    sink::{MarkerSink, Stderr, Stdout},
};

const USAGE: &str = "\
Welcome to the error-simulator!
Use the /simulate endpoint to trigger custom responses and logs.

Query parameters:
  status      status code to respond with, 100-599 (default 400)
              1xx codes other than 101 cannot be a final response and
              arrive as 500
  stdout_msg  print `STDOUT_TRIGGER: <msg>` to stdout
  stderr_msg  print `STDERR_TRIGGER: <msg>` to stderr
  latency     delay in ms: `N`, `-N` (0 to N) or `min-max`

Examples:
  GET /simulate?status=200
  GET /simulate?status=404&stdout_msg=File_not_found
  GET /simulate?status=500&stderr_msg=Internal_server_error&stdout_msg=Processing_failed
  GET /simulate?status=401&stderr_msg=Auth_failed
  GET /simulate?status=401&latency=300-900
";

/// Collaborators shared by every request. Nothing in here is mutated.
#[derive(Clone)]
pub struct AppState {
    pub stdout: Arc<dyn MarkerSink>,
    pub stderr: Arc<dyn MarkerSink>,
    pub random: Arc<dyn RandomSource>,
}

impl AppState {
    /// Markers go to the real process streams, draws to the thread rng.
    pub fn process() -> Self {
        Self {
            stdout: Arc::new(Stdout),
            stderr: Arc::new(Stderr),
            random: Arc::new(ThreadRandom),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(root))
        .route("/simulate", any(simulate))
        .fallback(root)
        .with_state(state)
}

async fn root(method: Method, uri: Uri) -> &'static str {
    info!(%method, path = uri.path(), "serving root request");
    USAGE
}

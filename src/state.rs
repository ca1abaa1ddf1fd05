use std::sync::Arc;

use crate::backend::BackendAdapter;
use crate::backend::drive::DriveClient;
use crate::config::Config;
use crate::rate_limit::SubmissionRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    /// The one storage backend this deployment routes submissions to.
    pub backend: Arc<dyn BackendAdapter>,
    /// Drive client for the standalone voice-memo upload endpoint.
    pub drive: DriveClient,
    /// Client for token exchanges outside any adapter.
    pub http: reqwest::Client,
    pub submission_limiter: SubmissionRateLimiter,
}

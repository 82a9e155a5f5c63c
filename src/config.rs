//! Configuration for workflow execution behavior.

use std::time::Duration;

/// Default model id for the generative provider.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default bounded timeout applied to every external call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default completion token budget per model call.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Schema-validation retries per model call (attempts = retries + 1).
///
/// Fixed at one: a second malformed completion becomes a stage error
/// rather than an open-ended retry loop, which bounds worst-case latency
/// and cost per stage.
pub const SCHEMA_RETRIES: u32 = 1;

/// Default cap on search-enrichment results.
pub const DEFAULT_SEARCH_RESULT_CAP: usize = 5;

/// Configuration for one [`RecipeWorkflow`](crate::pipeline::RecipeWorkflow).
///
/// # Examples
///
/// ```
/// use sous_chef::config::WorkflowConfig;
/// use std::time::Duration;
///
/// let config = WorkflowConfig::default()
///     .with_model("gpt-4o-mini")
///     .with_request_timeout(Duration::from_secs(60));
/// assert_eq!(config.search_result_cap, 5);
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Model id passed to the generative provider.
    pub model: String,
    /// Bounded timeout for each external call.
    pub request_timeout: Duration,
    /// Completion token budget per model call.
    pub max_tokens: u32,
    /// Schema-validation retries per model call.
    pub schema_retries: u32,
    /// Maximum number of search-enrichment results kept.
    pub search_result_cap: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
            schema_retries: SCHEMA_RETRIES,
            search_result_cap: DEFAULT_SEARCH_RESULT_CAP,
        }
    }
}

impl WorkflowConfig {
    /// Overrides the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the search result cap.
    pub fn with_search_result_cap(mut self, cap: usize) -> Self {
        self.search_result_cap = cap;
        self
    }
}

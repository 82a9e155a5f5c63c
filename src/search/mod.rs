//! The optional web-search client used for recipe enrichment.
//!
//! Search failures are never fatal to a run: the enrichment stage maps any
//! [`SearchError`] to an empty tip list and the pipeline moves on.

pub mod tavily;

pub use tavily::TavilySearchClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::state::CookingTip;

/// Errors that can occur while talking to the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The HTTP request failed before the provider answered.
    #[error("search request failed: {0}")]
    Transport(String),

    /// The per-call timeout elapsed.
    #[error("search request timed out")]
    Timeout,

    /// The provider rejected the credential.
    #[error("invalid search credential: {0}")]
    InvalidCredential(String),

    /// The provider answered with a failure status or unusable body.
    #[error("search provider error: {0}")]
    Provider(String),
}

/// The seam to a web-search provider.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Searches for cooking tips related to a generated recipe.
    ///
    /// Results come back in the provider's relevance order, truncated to
    /// `limit`.
    async fn find_tips(
        &self,
        recipe_title: &str,
        ingredients: &[String],
        limit: usize,
    ) -> Result<Vec<CookingTip>, SearchError>;
}

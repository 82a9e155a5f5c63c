//! `sous-chef` - a typed, failure-tolerant workflow engine for LLM-powered
//! recipe generation.
//!
//! The crate turns a validated description of a kitchen (ingredients on
//! hand, appliances, skill level, dietary preferences) into a complete
//! recipe with nutrition facts, a shopping list for whatever is missing,
//! and (when a search credential is supplied) web-sourced cooking tips.
//!
//! The interesting part is not the recipes but the plumbing: a fixed
//! directed pipeline whose stages call a generative model, validate every
//! completion against a declared schema before admitting it into state,
//! and recover from individual stage failures by substituting documented
//! defaults instead of aborting the run.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::collections::BTreeSet;
//! use sous_chef::{Appliance, SkillLevel, WorkflowInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = WorkflowInput::new(
//!         vec!["eggs".into(), "flour".into(), "milk".into()],
//!         BTreeSet::from([Appliance::Stovetop]),
//!         SkillLevel::Beginner,
//!         std::env::var("OPENAI_API_KEY")?,
//!     )
//!     .with_cuisine("French");
//!
//!     let output = sous_chef::run(input).await?;
//!     println!("{}", output.recipe.title);
//!     for item in &output.shopping_list {
//!         println!("buy: {}", item.item);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Hosts with their own client stacks (or tests with mocks) use
//! [`RecipeWorkflow::with_clients`] instead of [`run`] and receive a
//! [`RecipeRun`] that also carries the recovered-failure log.

pub mod config;
pub mod extract;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod search;

pub use config::WorkflowConfig;
pub use llm::{ChatClient, ChatRequest, GenerationProfile, LlmError, OpenAiChatClient};
pub use model::{
    Appliance, CookingTip, DietaryPreference, GeneratedRecipe, IngredientCategory, NutritionFact,
    NutritionFacts, ParsedIngredient, Priority, RecipeOutput, ShoppingItem, SkillLevel,
    StageFailure, ValidationError, WorkflowInput,
};
pub use pipeline::{
    AssemblyDefect, AssemblyError, RecipeRun, RecipeWorkflow, Stage, StageError, WorkflowError,
};
pub use search::{SearchClient, SearchError, TavilySearchClient};

/// Runs the workflow once with the default client stack.
///
/// Builds an OpenAI chat client and a Tavily search client from the
/// credentials inside `input` and executes the full pipeline. This is the
/// invocation contract consumed by a UI layer: one synchronous-feeling
/// call per user action.
pub async fn run(input: WorkflowInput) -> Result<RecipeOutput, WorkflowError> {
    let config = WorkflowConfig::default();

    let chat = OpenAiChatClient::new(input.openai_key.clone(), config.model.clone())
        .with_timeout(config.request_timeout)
        .with_max_tokens(config.max_tokens);
    let search = TavilySearchClient::new(input.tavily_key.clone().unwrap_or_default())
        .with_timeout(config.request_timeout);

    let workflow = RecipeWorkflow::with_clients(chat, search, config);
    workflow.execute(input).await.map(|run| run.output)
}

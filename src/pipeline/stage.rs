//! Stage vocabulary and the stage-level error type.

use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;
use crate::model::state::{
    CookingTip, GeneratedRecipe, NutritionFacts, ParsedIngredient, ShoppingItem, StateError,
};

/// The fixed set of pipeline stages, in topological order.
///
/// Assembly is deliberately not a member: it runs after the recovery loop
/// and its failure is terminal rather than recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseIngredients,
    GenerateRecipe,
    ComputeNutrition,
    BuildShoppingList,
    EnrichWithSearch,
}

impl Stage {
    /// Stable tag used in the error log.
    pub fn name(self) -> &'static str {
        match self {
            Self::ParseIngredients => "parse_ingredients",
            Self::GenerateRecipe => "generate_recipe",
            Self::ComputeNutrition => "compute_nutrition",
            Self::BuildShoppingList => "build_shopping_list",
            Self::EnrichWithSearch => "enrich_with_search",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single typed output a stage produces.
///
/// The engine, not the stage, records the output into state; that keeps
/// the single writer in one place and makes default substitution uniform.
#[derive(Debug, Clone)]
pub enum StageOutput {
    ParsedIngredients(Vec<ParsedIngredient>),
    GeneratedRecipe(GeneratedRecipe),
    NutritionFacts(NutritionFacts),
    ShoppingList(Vec<ShoppingItem>),
    SearchEnrichment(Vec<CookingTip>),
}

/// A stage failure: which stage, and why.
#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {cause}")]
pub struct StageError {
    pub stage: Stage,
    pub cause: StageErrorCause,
}

impl StageError {
    pub fn new(stage: Stage, cause: impl Into<StageErrorCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// What went wrong inside a stage.
#[derive(Debug, Error)]
pub enum StageErrorCause {
    /// A model call failed (transport, timeout, or schema violation).
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Rendering the stage prompt failed.
    #[error(transparent)]
    Template(#[from] minijinja::Error),

    /// The stage produced a value that violates its own output contract.
    #[error("invalid stage output: {0}")]
    InvalidOutput(String),

    /// Recording the output violated the single-writer discipline.
    #[error(transparent)]
    State(#[from] StateError),
}

//! The workflow engine: a fixed directed pipeline over one state record.
//!
//! The engine executes the stage plan in topological order, threading a
//! single [`WorkflowState`] through it. Stage failures are recovered
//! locally: the failure is logged, the stage's documented default output is
//! substituted, and the run continues. Only input validation (before the
//! pipeline) and final assembly (after it) can fail a run outright.
//!
//! The enrichment branch is decided once at run start from the presence of
//! a search credential and never re-evaluated mid-run.

pub mod assemble;
pub mod stage;

pub use assemble::{AssemblyDefect, AssemblyError};
pub use stage::{Stage, StageError, StageErrorCause, StageOutput};

use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::llm::{ChatClient, ChatRequest, GenerationProfile, StructuredLlm};
use crate::model::input::{ValidationError, WorkflowInput};
use crate::model::output::RecipeOutput;
use crate::model::state::{
    CookingTip, GeneratedRecipe, NutritionFacts, ParsedIngredient, StageFailure, WorkflowState,
};
use crate::prompt;
use crate::search::SearchClient;

/// Errors surfaced to the caller of a run.
///
/// Everything else is recovered inside the engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The input record was malformed; the pipeline never started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No usable recipe could be assembled.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// A completed run: the assembled output plus the recovered failures.
#[derive(Debug)]
pub struct RecipeRun {
    /// The assembled output record.
    pub output: RecipeOutput,
    /// Stage failures that were recovered by default substitution, in the
    /// order they occurred. Empty on a clean run.
    pub error_log: Vec<StageFailure>,
}

/// Wire shape for the ingredient-parsing stage.
#[derive(Debug, Deserialize, JsonSchema)]
struct ParsedIngredientList {
    ingredients: Vec<ParsedIngredient>,
}

/// The workflow engine, generic over its two external clients.
pub struct RecipeWorkflow<C, S> {
    llm: StructuredLlm<C>,
    search: S,
    config: WorkflowConfig,
}

impl<C: ChatClient, S: SearchClient> RecipeWorkflow<C, S> {
    /// Builds an engine around injected clients. Hosts use
    /// [`run`](crate::run) instead; this constructor is the seam for tests
    /// and embedders with their own client stacks.
    pub fn with_clients(chat: C, search: S, config: WorkflowConfig) -> Self {
        let llm = StructuredLlm::new(chat).with_schema_retries(config.schema_retries);
        Self {
            llm,
            search,
            config,
        }
    }

    /// Runs the full pipeline for one input record.
    pub async fn execute(&self, input: WorkflowInput) -> Result<RecipeRun, WorkflowError> {
        let input = input.validated()?;
        let enrich = input.wants_enrichment();
        info!(
            enrichment = enrich,
            ingredient_count = input.ingredients.len(),
            "starting recipe workflow"
        );

        let mut state = WorkflowState::seeded(&input);
        for stage in Self::plan(enrich) {
            debug!(stage = %stage, "running stage");
            self.apply(stage, &mut state).await;
        }

        if !enrich {
            debug!("search credential absent; enrichment skipped");
            if let Err(err) = state.record_search_enrichment(Vec::new()) {
                warn!(error = %err, "could not record skipped enrichment");
            }
        }

        let run = assemble::assemble(state)?;
        info!(failures = run.error_log.len(), "recipe workflow completed");
        Ok(run)
    }

    /// The stage plan for this run, fixed before the first stage executes.
    fn plan(enrich: bool) -> Vec<Stage> {
        let mut stages = vec![
            Stage::ParseIngredients,
            Stage::GenerateRecipe,
            Stage::ComputeNutrition,
            Stage::BuildShoppingList,
        ];
        if enrich {
            stages.push(Stage::EnrichWithSearch);
        }
        stages
    }

    /// Runs one stage and records its output, recovering from failure by
    /// substituting the stage's documented default.
    async fn apply(&self, stage: Stage, state: &mut WorkflowState) {
        match self.run_stage(stage, state).await {
            Ok(output) => {
                if let Err(err) = state.record(output) {
                    state.log_failure(StageFailure {
                        stage,
                        message: err.to_string(),
                    });
                }
            }
            Err(err) => {
                warn!(stage = %stage, error = %err.cause, "stage failed; substituting default output");
                state.log_failure(StageFailure {
                    stage,
                    message: err.cause.to_string(),
                });
                if let Err(err) = state.record(Self::default_output(stage, state)) {
                    state.log_failure(StageFailure {
                        stage,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    async fn run_stage(
        &self,
        stage: Stage,
        state: &WorkflowState,
    ) -> Result<StageOutput, StageError> {
        match stage {
            Stage::ParseIngredients => self.parse_ingredients(state).await,
            Stage::GenerateRecipe => self.generate_recipe(state).await,
            Stage::ComputeNutrition => self.compute_nutrition(state).await,
            Stage::BuildShoppingList => Ok(StageOutput::ShoppingList(
                assemble::build_shopping_list(state),
            )),
            Stage::EnrichWithSearch => Ok(StageOutput::SearchEnrichment(
                self.enrich_with_search(state).await,
            )),
        }
    }

    async fn parse_ingredients(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let stage = Stage::ParseIngredients;
        let user = prompt::parse_ingredients_prompt(state.raw_ingredients())
            .map_err(|err| StageError::new(stage, err))?;
        let request =
            ChatRequest::new(prompt::PARSE_SYSTEM, user).with_profile(GenerationProfile::Precise);

        let parsed: ParsedIngredientList = self
            .llm
            .call(request)
            .await
            .map_err(|err| StageError::new(stage, err))?;

        if parsed.ingredients.is_empty() {
            return Err(StageError::new(
                stage,
                StageErrorCause::InvalidOutput("the parsed ingredient list is empty".into()),
            ));
        }
        if parsed.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err(StageError::new(
                stage,
                StageErrorCause::InvalidOutput("a parsed ingredient has a blank name".into()),
            ));
        }

        Ok(StageOutput::ParsedIngredients(parsed.ingredients))
    }

    async fn generate_recipe(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let stage = Stage::GenerateRecipe;
        let user =
            prompt::generate_recipe_prompt(state).map_err(|err| StageError::new(stage, err))?;
        let request =
            ChatRequest::new(prompt::RECIPE_SYSTEM, user).with_profile(GenerationProfile::Creative);

        let recipe: GeneratedRecipe = self
            .llm
            .call(request)
            .await
            .map_err(|err| StageError::new(stage, err))?;

        Ok(StageOutput::GeneratedRecipe(recipe))
    }

    async fn compute_nutrition(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let stage = Stage::ComputeNutrition;
        let Some(recipe) = state.generated_recipe() else {
            return Err(StageError::new(
                stage,
                StageErrorCause::InvalidOutput("no recipe available".into()),
            ));
        };
        let user =
            prompt::compute_nutrition_prompt(recipe).map_err(|err| StageError::new(stage, err))?;
        let request = ChatRequest::new(prompt::NUTRITION_SYSTEM, user)
            .with_profile(GenerationProfile::Precise);

        let facts: NutritionFacts = self
            .llm
            .call(request)
            .await
            .map_err(|err| StageError::new(stage, err))?;

        Ok(StageOutput::NutritionFacts(facts))
    }

    /// Enrichment never raises a stage error: a provider failure is an
    /// empty-enrichment outcome, not a pipeline failure.
    async fn enrich_with_search(&self, state: &WorkflowState) -> Vec<CookingTip> {
        let Some(recipe) = state.generated_recipe() else {
            return Vec::new();
        };
        match self
            .search
            .find_tips(
                &recipe.title,
                state.raw_ingredients(),
                self.config.search_result_cap,
            )
            .await
        {
            Ok(mut tips) => {
                tips.truncate(self.config.search_result_cap);
                tips
            }
            Err(err) => {
                warn!(error = %err, "search enrichment unavailable; continuing without tips");
                Vec::new()
            }
        }
    }

    /// The documented default substituted when a stage fails.
    fn default_output(stage: Stage, state: &WorkflowState) -> StageOutput {
        match stage {
            Stage::ParseIngredients => {
                StageOutput::ParsedIngredients(carried_over_ingredients(state))
            }
            Stage::GenerateRecipe => StageOutput::GeneratedRecipe(fallback_recipe(state)),
            Stage::ComputeNutrition => StageOutput::NutritionFacts(NutritionFacts::unavailable()),
            Stage::BuildShoppingList => StageOutput::ShoppingList(Vec::new()),
            Stage::EnrichWithSearch => StageOutput::SearchEnrichment(Vec::new()),
        }
    }
}

/// Parse-stage default: the raw ingredients carried over verbatim.
fn carried_over_ingredients(state: &WorkflowState) -> Vec<ParsedIngredient> {
    use crate::model::state::IngredientCategory;

    state
        .raw_ingredients()
        .iter()
        .map(|name| ParsedIngredient {
            name: name.clone(),
            estimated_quantity: "to taste".to_string(),
            category: IngredientCategory::Other,
        })
        .collect()
}

/// Generation-stage default: a deterministic recipe built from the raw
/// ingredients, so downstream stages and assembly always see a well-typed
/// recipe with a non-empty title and steps.
fn fallback_recipe(state: &WorkflowState) -> GeneratedRecipe {
    let appliance = state
        .appliances()
        .iter()
        .next()
        .map(ToString::to_string)
        .unwrap_or_else(|| "Stovetop".to_string());

    GeneratedRecipe {
        title: "Simple Mixed Dish".to_string(),
        summary: format!("A simple dish using the ingredients on hand with the {appliance}."),
        required_ingredients: state.raw_ingredients().to_vec(),
        optional_additions: Vec::new(),
        steps: vec![
            "Prepare all ingredients by washing and chopping as needed.".to_string(),
            format!("Cook the ingredients using the {appliance}."),
            "Season to taste with salt and pepper.".to_string(),
            "Cook until the ingredients are tender and the flavors have combined.".to_string(),
            "Serve hot.".to_string(),
        ],
        prep_time_minutes: 15,
        cook_time_minutes: 30,
        servings: 4,
        difficulty: "Easy".to_string(),
        cuisine: state.cuisine().unwrap_or("International").to_string(),
        primary_appliance: appliance,
        variations: vec![
            "Add different seasonings.".to_string(),
            "Include extra vegetables.".to_string(),
        ],
        storage: "Store in the refrigerator for up to 3 days.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::input::{Appliance, SkillLevel};
    use std::collections::BTreeSet;

    fn seeded() -> WorkflowState {
        let input = WorkflowInput::new(
            vec!["eggs".into(), "rice".into()],
            BTreeSet::from([Appliance::Oven, Appliance::Stovetop]),
            SkillLevel::Intermediate,
            "sk-test",
        )
        .with_cuisine("Japanese");
        WorkflowState::seeded(&input)
    }

    #[test]
    fn plan_includes_enrichment_only_when_enabled() {
        let without = RecipeWorkflow::<crate::llm::OpenAiChatClient, crate::search::TavilySearchClient>::plan(false);
        assert_eq!(
            without,
            vec![
                Stage::ParseIngredients,
                Stage::GenerateRecipe,
                Stage::ComputeNutrition,
                Stage::BuildShoppingList,
            ]
        );

        let with = RecipeWorkflow::<crate::llm::OpenAiChatClient, crate::search::TavilySearchClient>::plan(true);
        assert_eq!(with.last(), Some(&Stage::EnrichWithSearch));
        assert_eq!(with.len(), 5);
    }

    #[test]
    fn carried_over_ingredients_mirror_the_raw_list() {
        let parsed = carried_over_ingredients(&seeded());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "eggs");
        assert_eq!(parsed[0].estimated_quantity, "to taste");
    }

    #[test]
    fn fallback_recipe_is_minimally_valid() {
        let recipe = fallback_recipe(&seeded());
        assert!(!recipe.title.trim().is_empty());
        assert!(!recipe.steps.is_empty());
        assert_eq!(recipe.cuisine, "Japanese");
        // First appliance in the set ordering drives the instructions.
        assert_eq!(recipe.primary_appliance, "Oven");
        assert!(recipe.steps.iter().any(|s| s.contains("Oven")));
    }
}

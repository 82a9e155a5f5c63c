//! The mutable state record threaded through the pipeline.
//!
//! `WorkflowState` starts out seeded from the input and accumulates exactly
//! one field per stage. The single-writer discipline is enforced
//! mechanically: every field is written through a `record_*` method that
//! rejects a second write with [`StateError::AlreadyWritten`], so replaying
//! a stage against the same state can never silently clobber earlier work.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::input::{Appliance, DietaryPreference, SkillLevel, WorkflowInput};
use crate::pipeline::stage::{Stage, StageOutput};

/// Coarse pantry taxonomy used when parsing free-form ingredient names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Protein,
    Vegetable,
    Fruit,
    Grain,
    Dairy,
    HerbSpice,
    Pantry,
    Other,
}

/// One user ingredient, structured by the parsing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedIngredient {
    /// Canonical ingredient name.
    pub name: String,
    /// A rough usable quantity, e.g. "2 cups" or "to taste".
    pub estimated_quantity: String,
    /// Pantry category the ingredient belongs to.
    pub category: IngredientCategory,
}

/// The recipe produced by the generation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedRecipe {
    /// Recipe title.
    pub title: String,
    /// One- or two-sentence description.
    pub summary: String,
    /// Ingredients the recipe depends on, with measurements.
    pub required_ingredients: Vec<String>,
    /// Garnishes and nice-to-have additions mentioned by the recipe.
    #[serde(default)]
    pub optional_additions: Vec<String>,
    /// Ordered cooking instructions.
    pub steps: Vec<String>,
    /// Preparation time in minutes.
    pub prep_time_minutes: u32,
    /// Cooking time in minutes.
    pub cook_time_minutes: u32,
    /// Number of servings the recipe yields.
    pub servings: u32,
    /// Difficulty label, e.g. "Easy".
    pub difficulty: String,
    /// Cuisine label, e.g. "French".
    pub cuisine: String,
    /// The main appliance the instructions are written for.
    pub primary_appliance: String,
    /// Suggested variations on the base recipe.
    #[serde(default)]
    pub variations: Vec<String>,
    /// How to store leftovers.
    pub storage: String,
}

impl GeneratedRecipe {
    /// Total estimated time from start to plate.
    pub fn total_time_minutes(&self) -> u32 {
        self.prep_time_minutes + self.cook_time_minutes
    }
}

/// A single nutrient entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NutritionFact {
    /// Amount per serving.
    pub amount: f64,
    /// Unit for the amount, e.g. "g" or "kcal".
    pub unit: String,
    /// Percentage of the recommended daily value, when known.
    pub daily_value_percent: Option<f64>,
}

/// Nutrition facts per serving, keyed by nutrient name.
///
/// The empty value doubles as the documented "unavailable" placeholder the
/// engine substitutes when nutrition computation fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NutritionFacts {
    /// Nutrient name to per-serving fact.
    pub facts: BTreeMap<String, NutritionFact>,
}

impl NutritionFacts {
    /// The placeholder recorded when nutrition could not be computed.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether this value is the "unavailable" placeholder.
    pub fn is_unavailable(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Priority of a shopping-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// The recipe does not work without it.
    Essential,
    /// Garnish or variation only.
    Optional,
}

/// One missing item the user should buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// The item name, stripped of measurements.
    pub item: String,
    /// Whether the recipe requires it or merely suggests it.
    pub priority: Priority,
}

/// A cooking tip sourced from web search enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingTip {
    /// The tip text, as returned by the provider.
    pub tip_text: String,
    /// Where the tip came from.
    pub source_url: Url,
}

/// A recovered stage failure, recorded in the append-only error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: Stage,
    /// Human-readable cause.
    pub message: String,
}

/// Violations of the single-writer discipline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// A stage output field was written twice.
    #[error("state field `{0}` was already written by an earlier stage")]
    AlreadyWritten(&'static str),
}

/// The state record owned by one pipeline run.
///
/// Fields echoing the input are fixed at construction; each stage output
/// field is `None` until its stage records it, exactly once.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    raw_ingredients: Vec<String>,
    appliances: BTreeSet<Appliance>,
    skill_level: SkillLevel,
    dietary_preferences: BTreeSet<DietaryPreference>,
    cuisine: Option<String>,
    parsed_ingredients: Option<Vec<ParsedIngredient>>,
    generated_recipe: Option<GeneratedRecipe>,
    nutrition_facts: Option<NutritionFacts>,
    shopping_list: Option<Vec<ShoppingItem>>,
    search_enrichment: Option<Vec<CookingTip>>,
    error_log: Vec<StageFailure>,
}

/// Decomposed terminal state, handed to the assembler.
pub struct TerminalState {
    pub generated_recipe: Option<GeneratedRecipe>,
    pub nutrition_facts: Option<NutritionFacts>,
    pub shopping_list: Option<Vec<ShoppingItem>>,
    pub search_enrichment: Option<Vec<CookingTip>>,
    pub error_log: Vec<StageFailure>,
}

impl WorkflowState {
    /// Creates the run's state, echoing the (already validated) input.
    pub fn seeded(input: &WorkflowInput) -> Self {
        Self {
            raw_ingredients: input.ingredients.clone(),
            appliances: input.appliances.clone(),
            skill_level: input.skill_level,
            dietary_preferences: input.dietary_preferences.clone(),
            cuisine: input.cuisine.clone(),
            parsed_ingredients: None,
            generated_recipe: None,
            nutrition_facts: None,
            shopping_list: None,
            search_enrichment: None,
            error_log: Vec::new(),
        }
    }

    pub fn raw_ingredients(&self) -> &[String] {
        &self.raw_ingredients
    }

    pub fn appliances(&self) -> &BTreeSet<Appliance> {
        &self.appliances
    }

    pub fn skill_level(&self) -> SkillLevel {
        self.skill_level
    }

    pub fn dietary_preferences(&self) -> &BTreeSet<DietaryPreference> {
        &self.dietary_preferences
    }

    pub fn cuisine(&self) -> Option<&str> {
        self.cuisine.as_deref()
    }

    pub fn parsed_ingredients(&self) -> Option<&[ParsedIngredient]> {
        self.parsed_ingredients.as_deref()
    }

    pub fn generated_recipe(&self) -> Option<&GeneratedRecipe> {
        self.generated_recipe.as_ref()
    }

    pub fn nutrition_facts(&self) -> Option<&NutritionFacts> {
        self.nutrition_facts.as_ref()
    }

    pub fn shopping_list(&self) -> Option<&[ShoppingItem]> {
        self.shopping_list.as_deref()
    }

    pub fn search_enrichment(&self) -> Option<&[CookingTip]> {
        self.search_enrichment.as_deref()
    }

    pub fn error_log(&self) -> &[StageFailure] {
        &self.error_log
    }

    /// Records a stage output into its field, enforcing the single-writer
    /// discipline.
    pub fn record(&mut self, output: StageOutput) -> Result<(), StateError> {
        match output {
            StageOutput::ParsedIngredients(v) => self.record_parsed_ingredients(v),
            StageOutput::GeneratedRecipe(v) => self.record_generated_recipe(v),
            StageOutput::NutritionFacts(v) => self.record_nutrition_facts(v),
            StageOutput::ShoppingList(v) => self.record_shopping_list(v),
            StageOutput::SearchEnrichment(v) => self.record_search_enrichment(v),
        }
    }

    pub fn record_parsed_ingredients(
        &mut self,
        value: Vec<ParsedIngredient>,
    ) -> Result<(), StateError> {
        Self::write_once(&mut self.parsed_ingredients, value, "parsed_ingredients")
    }

    pub fn record_generated_recipe(&mut self, value: GeneratedRecipe) -> Result<(), StateError> {
        Self::write_once(&mut self.generated_recipe, value, "generated_recipe")
    }

    pub fn record_nutrition_facts(&mut self, value: NutritionFacts) -> Result<(), StateError> {
        Self::write_once(&mut self.nutrition_facts, value, "nutrition_facts")
    }

    pub fn record_shopping_list(&mut self, value: Vec<ShoppingItem>) -> Result<(), StateError> {
        Self::write_once(&mut self.shopping_list, value, "shopping_list")
    }

    pub fn record_search_enrichment(&mut self, value: Vec<CookingTip>) -> Result<(), StateError> {
        Self::write_once(&mut self.search_enrichment, value, "search_enrichment")
    }

    /// Appends a recovered failure to the error log. Append-only: entries
    /// are never removed or rewritten.
    pub fn log_failure(&mut self, failure: StageFailure) {
        self.error_log.push(failure);
    }

    /// Consumes the state at the end of the run.
    pub fn into_terminal(self) -> TerminalState {
        TerminalState {
            generated_recipe: self.generated_recipe,
            nutrition_facts: self.nutrition_facts,
            shopping_list: self.shopping_list,
            search_enrichment: self.search_enrichment,
            error_log: self.error_log,
        }
    }

    fn write_once<T>(
        slot: &mut Option<T>,
        value: T,
        field: &'static str,
    ) -> Result<(), StateError> {
        if slot.is_some() {
            return Err(StateError::AlreadyWritten(field));
        }
        *slot = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::input::{Appliance, SkillLevel};
    use std::collections::BTreeSet;

    fn seeded_state() -> WorkflowState {
        let input = WorkflowInput::new(
            vec!["eggs".into(), "flour".into()],
            BTreeSet::from([Appliance::Stovetop]),
            SkillLevel::Beginner,
            "sk-test",
        );
        WorkflowState::seeded(&input)
    }

    fn sample_parsed() -> Vec<ParsedIngredient> {
        vec![ParsedIngredient {
            name: "eggs".into(),
            estimated_quantity: "2".into(),
            category: IngredientCategory::Protein,
        }]
    }

    #[test]
    fn seeded_state_echoes_input_and_starts_empty() {
        let state = seeded_state();
        assert_eq!(state.raw_ingredients(), ["eggs", "flour"]);
        assert!(state.parsed_ingredients().is_none());
        assert!(state.generated_recipe().is_none());
        assert!(state.error_log().is_empty());
    }

    #[test]
    fn second_write_to_a_field_is_rejected() {
        let mut state = seeded_state();
        state.record_parsed_ingredients(sample_parsed()).unwrap();
        let err = state
            .record_parsed_ingredients(sample_parsed())
            .unwrap_err();
        assert_eq!(err, StateError::AlreadyWritten("parsed_ingredients"));
        // The first write is retained untouched.
        assert_eq!(state.parsed_ingredients().unwrap().len(), 1);
    }

    #[test]
    fn record_dispatches_by_output_variant() {
        let mut state = seeded_state();
        state
            .record(StageOutput::NutritionFacts(NutritionFacts::unavailable()))
            .unwrap();
        assert!(state.nutrition_facts().unwrap().is_unavailable());
        let err = state
            .record(StageOutput::NutritionFacts(NutritionFacts::unavailable()))
            .unwrap_err();
        assert_eq!(err, StateError::AlreadyWritten("nutrition_facts"));
    }

    #[test]
    fn error_log_is_append_only() {
        let mut state = seeded_state();
        state.log_failure(StageFailure {
            stage: Stage::ComputeNutrition,
            message: "first".into(),
        });
        state.log_failure(StageFailure {
            stage: Stage::ParseIngredients,
            message: "second".into(),
        });
        let log = state.error_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "first");
        assert_eq!(log[1].stage, Stage::ParseIngredients);
    }

    #[test]
    fn terminal_state_carries_the_error_log() {
        let mut state = seeded_state();
        state.log_failure(StageFailure {
            stage: Stage::GenerateRecipe,
            message: "recovered".into(),
        });
        let terminal = state.into_terminal();
        assert_eq!(terminal.error_log.len(), 1);
        assert!(terminal.generated_recipe.is_none());
    }
}

//! The immutable output record returned to the caller.

use serde::Serialize;

use crate::model::state::{CookingTip, GeneratedRecipe, NutritionFacts, ShoppingItem};

/// The assembled result of one workflow run.
///
/// A pure projection of the terminal [`WorkflowState`](crate::model::WorkflowState):
/// it owns its data and holds no reference back to the state. The caller
/// (typically a UI layer) owns it for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeOutput {
    /// The generated recipe.
    pub recipe: GeneratedRecipe,
    /// Nutrition facts per serving; the empty placeholder when unavailable.
    pub nutrition_facts: NutritionFacts,
    /// Items to buy, essential entries before optional ones.
    pub shopping_list: Vec<ShoppingItem>,
    /// Search-sourced cooking tips; empty when enrichment was skipped or
    /// the provider returned nothing.
    pub cooking_tips: Vec<CookingTip>,
    /// How to store leftovers.
    pub storage_recommendations: String,
    /// Suggested variations on the base recipe.
    pub variations: Vec<String>,
}

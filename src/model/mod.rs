//! Typed records for workflow input, intermediate state, and final output.

pub mod input;
pub mod output;
pub mod state;

pub use input::{
    Appliance, DietaryPreference, MAX_INGREDIENTS, SkillLevel, ValidationError, WorkflowInput,
};
pub use output::RecipeOutput;
pub use state::{
    CookingTip, GeneratedRecipe, IngredientCategory, NutritionFact, NutritionFacts,
    ParsedIngredient, Priority, ShoppingItem, StageFailure, StateError, TerminalState,
    WorkflowState,
};

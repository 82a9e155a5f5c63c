//! Prompt templates for the model-backed stages.
//!
//! Templates are `minijinja` sources rendered through [`render_prompt`].
//! They describe the task only; the response-schema framing is appended by
//! the structured client so every stage shares one schema contract.

use minijinja::{Environment, context};
use serde::Serialize;

use crate::model::state::{GeneratedRecipe, WorkflowState};

/// Renders a prompt from a template string and a serializable context.
pub(crate) fn render_prompt<T: Serialize>(
    template: &str,
    context: T,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("prompt", template)?;
    let tmpl = env.get_template("prompt")?;
    tmpl.render(context)
}

pub(crate) const PARSE_SYSTEM: &str = "You are a culinary assistant who turns free-form \
ingredient lists into clean, structured pantry data.";

const PARSE_TEMPLATE: &str = "\
Categorize each ingredient below. For every entry give its canonical name, \
a usable estimated quantity (or \"to taste\" when none is implied), and its \
pantry category.

Ingredients:
{% for ingredient in ingredients %}- {{ ingredient }}
{% endfor %}";

/// Builds the user prompt for the ingredient-parsing stage.
pub(crate) fn parse_ingredients_prompt(ingredients: &[String]) -> Result<String, minijinja::Error> {
    render_prompt(PARSE_TEMPLATE, context! { ingredients => ingredients })
}

pub(crate) const RECIPE_SYSTEM: &str = "You are a professional chef. Provide complete, \
detailed recipes and never truncate or abbreviate the instructions.";

const RECIPE_TEMPLATE: &str = "\
Create a complete recipe for the following kitchen.

Ingredients on hand:
{% for line in ingredients %}- {{ line }}
{% endfor %}
Appliances: {{ appliances }}
Skill level: {{ skill_level }}
Dietary restrictions: {{ dietary }}
Cuisine preference: {{ cuisine }}

The recipe must:
- use primarily the ingredients on hand; anything extra belongs in required_ingredients with a measurement
- suit the stated skill level and respect every dietary restriction
- rely only on the listed appliances
- follow the cuisine preference where possible
- spell out every step with times and temperatures, from preparation to serving
- list garnishes and nice-to-have extras under optional_additions, never under required_ingredients
- make sure grains, legumes, root vegetables and raw proteins are fully cooked";

/// Builds the user prompt for the recipe-generation stage.
pub(crate) fn generate_recipe_prompt(state: &WorkflowState) -> Result<String, minijinja::Error> {
    let ingredients: Vec<String> = match state.parsed_ingredients() {
        Some(parsed) => parsed
            .iter()
            .map(|p| format!("{} ({})", p.name, p.estimated_quantity))
            .collect(),
        None => state.raw_ingredients().to_vec(),
    };
    let appliances = state
        .appliances()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let dietary = if state.dietary_preferences().is_empty() {
        "None".to_string()
    } else {
        state
            .dietary_preferences()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    render_prompt(
        RECIPE_TEMPLATE,
        context! {
            ingredients => ingredients,
            appliances => appliances,
            skill_level => state.skill_level().to_string(),
            dietary => dietary,
            cuisine => state.cuisine().unwrap_or("Any"),
        },
    )
}

pub(crate) const NUTRITION_SYSTEM: &str = "You are a nutritionist. Provide realistic \
per-serving estimates for home-cooked dishes.";

const NUTRITION_TEMPLATE: &str = "\
Estimate the nutrition facts per serving for this recipe.

Recipe: {{ title }}
Servings: {{ servings }}
Ingredients:
{% for line in ingredients %}- {{ line }}
{% endfor %}
Include at least calories, protein, carbohydrates, fat, fiber, sodium and \
sugar, with daily-value percentages where applicable.";

/// Builds the user prompt for the nutrition-computation stage.
pub(crate) fn compute_nutrition_prompt(
    recipe: &GeneratedRecipe,
) -> Result<String, minijinja::Error> {
    render_prompt(
        NUTRITION_TEMPLATE,
        context! {
            title => &recipe.title,
            servings => recipe.servings,
            ingredients => &recipe.required_ingredients,
        },
    )
}

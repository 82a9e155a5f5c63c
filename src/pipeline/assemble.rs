//! Shopping-list derivation and final output assembly.
//!
//! Matching between recipe ingredient lines and on-hand ingredients is
//! case-insensitive and singular/plural-normalized: "2 tomatoes, diced"
//! counts as covered by an on-hand "Tomato".

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::RecipeRun;
use crate::model::output::RecipeOutput;
use crate::model::state::{
    NutritionFacts, Priority, ShoppingItem, StageFailure, WorkflowState,
};

/// Why assembly could not produce a usable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyDefect {
    /// No recipe was recorded at all.
    MissingRecipe,
    /// The recipe title was empty or blank.
    EmptyTitle,
    /// The recipe had no instruction steps.
    NoSteps,
}

impl fmt::Display for AssemblyDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingRecipe => "no recipe was generated",
            Self::EmptyTitle => "the recipe has no title",
            Self::NoSteps => "the recipe has no instruction steps",
        };
        f.write_str(reason)
    }
}

/// Terminal failure: no minimally valid recipe exists. Carries the
/// accumulated error log for diagnostics.
#[derive(Debug, Error)]
#[error("no usable recipe could be assembled: {defect}")]
pub struct AssemblyError {
    pub defect: AssemblyDefect,
    pub error_log: Vec<StageFailure>,
}

/// Derives the shopping list by diffing recipe-referenced ingredients
/// against what the user already has.
///
/// Missing `required_ingredients` become `Essential` items; missing
/// `optional_additions` become `Optional`. An item named in both lists is
/// kept once, at the essential priority.
pub(crate) fn build_shopping_list(state: &WorkflowState) -> Vec<ShoppingItem> {
    let Some(recipe) = state.generated_recipe() else {
        return Vec::new();
    };

    let on_hand = state.raw_ingredients();
    let mut items = Vec::new();
    let mut seen = BTreeSet::new();

    for line in &recipe.required_ingredients {
        push_missing(line, Priority::Essential, on_hand, &mut items, &mut seen);
    }
    for line in &recipe.optional_additions {
        push_missing(line, Priority::Optional, on_hand, &mut items, &mut seen);
    }

    items
}

fn push_missing(
    line: &str,
    priority: Priority,
    on_hand: &[String],
    items: &mut Vec<ShoppingItem>,
    seen: &mut BTreeSet<String>,
) {
    if on_hand.iter().any(|have| mentions(line, have)) {
        return;
    }
    let name = display_name(line);
    if name.is_empty() {
        return;
    }
    let key: String = name
        .split_whitespace()
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ");
    if seen.insert(key) {
        items.push(ShoppingItem {
            item: name,
            priority,
        });
    }
}

/// Merges terminal state into the output record.
pub(crate) fn assemble(state: WorkflowState) -> Result<RecipeRun, AssemblyError> {
    let terminal = state.into_terminal();

    let Some(recipe) = terminal.generated_recipe else {
        return Err(AssemblyError {
            defect: AssemblyDefect::MissingRecipe,
            error_log: terminal.error_log,
        });
    };
    if recipe.title.trim().is_empty() {
        return Err(AssemblyError {
            defect: AssemblyDefect::EmptyTitle,
            error_log: terminal.error_log,
        });
    }
    if recipe.steps.iter().all(|step| step.trim().is_empty()) {
        return Err(AssemblyError {
            defect: AssemblyDefect::NoSteps,
            error_log: terminal.error_log,
        });
    }

    let output = RecipeOutput {
        storage_recommendations: recipe.storage.clone(),
        variations: recipe.variations.clone(),
        nutrition_facts: terminal
            .nutrition_facts
            .unwrap_or_else(NutritionFacts::unavailable),
        shopping_list: terminal.shopping_list.unwrap_or_default(),
        cooking_tips: terminal.search_enrichment.unwrap_or_default(),
        recipe,
    };

    Ok(RecipeRun {
        output,
        error_log: terminal.error_log,
    })
}

/// Whether an ingredient line mentions an on-hand ingredient.
fn mentions(line: &str, have: &str) -> bool {
    let line = normalize(line);
    let have = normalize(have);
    if have.contains(' ') {
        return line.contains(&have);
    }
    let target = singularize(&have);
    line.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .any(|token| singularize(token) == target)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Light singular/plural normalization: "berries" → "berry",
/// "tomatoes" → "tomato", "eggs" → "egg".
fn singularize(word: &str) -> String {
    let word = word.to_lowercase();
    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["oes", "ches", "shes", "sses", "xes", "zes"] {
        if word.len() > suffix.len() && word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.len() > 2 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word
}

const MEASURE_WORDS: &[&str] = &[
    "cup", "cups", "tbsp", "tablespoon", "tablespoons", "tsp", "teaspoon", "teaspoons", "g",
    "gram", "grams", "kg", "ml", "l", "liter", "liters", "oz", "ounce", "ounces", "lb", "lbs",
    "pound", "pounds", "pinch", "pinches", "dash", "clove", "cloves", "slice", "slices", "can",
    "cans", "stick", "sticks", "of", "a", "an", "large", "small", "medium", "fresh",
];

/// Strips leading quantities and measure words from an ingredient line,
/// leaving a bare item name for the shopping list.
fn display_name(line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        let cleaned: String = token
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '/' || *c == '.')
            .collect::<String>()
            .to_lowercase();
        let numeric = !cleaned.is_empty()
            && cleaned
                .chars()
                .all(|c| c.is_ascii_digit() || c == '/' || c == '.');
        if numeric || MEASURE_WORDS.contains(&cleaned.as_str()) {
            start = i + 1;
        } else {
            break;
        }
    }
    if start >= tokens.len() {
        return normalize(line);
    }
    tokens[start..]
        .join(" ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::input::{Appliance, SkillLevel, WorkflowInput};
    use crate::model::state::GeneratedRecipe;
    use crate::pipeline::stage::Stage;
    use std::collections::BTreeSet;

    fn recipe(required: Vec<&str>, optional: Vec<&str>) -> GeneratedRecipe {
        GeneratedRecipe {
            title: "Test Dish".into(),
            summary: "A dish.".into(),
            required_ingredients: required.into_iter().map(String::from).collect(),
            optional_additions: optional.into_iter().map(String::from).collect(),
            steps: vec!["Cook it.".into()],
            prep_time_minutes: 10,
            cook_time_minutes: 20,
            servings: 2,
            difficulty: "Easy".into(),
            cuisine: "Any".into(),
            primary_appliance: "Stovetop".into(),
            variations: vec!["Add herbs.".into()],
            storage: "Refrigerate.".into(),
        }
    }

    fn state_with(ingredients: Vec<&str>, recipe_value: GeneratedRecipe) -> WorkflowState {
        let input = WorkflowInput::new(
            ingredients.into_iter().map(String::from).collect(),
            BTreeSet::from([Appliance::Stovetop]),
            SkillLevel::Beginner,
            "sk-test",
        );
        let mut state = WorkflowState::seeded(&input);
        state.record_generated_recipe(recipe_value).unwrap();
        state
    }

    #[test]
    fn shopping_list_is_empty_when_everything_is_on_hand() {
        let state = state_with(
            vec!["eggs", "flour", "milk"],
            recipe(vec!["3 eggs", "1 cup flour", "1/2 cup milk"], vec![]),
        );
        assert!(build_shopping_list(&state).is_empty());
    }

    #[test]
    fn missing_required_ingredients_are_essential() {
        let state = state_with(
            vec!["eggs", "flour", "milk"],
            recipe(vec!["3 eggs", "2 tbsp butter"], vec![]),
        );
        let list = build_shopping_list(&state);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].item, "butter");
        assert_eq!(list[0].priority, Priority::Essential);
    }

    #[test]
    fn missing_optional_additions_are_optional() {
        let state = state_with(
            vec!["eggs"],
            recipe(vec!["3 eggs"], vec!["fresh chives"]),
        );
        let list = build_shopping_list(&state);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].item, "chives");
        assert_eq!(list[0].priority, Priority::Optional);
    }

    #[test]
    fn an_item_in_both_lists_stays_essential() {
        let state = state_with(
            vec!["eggs"],
            recipe(vec!["2 tbsp butter"], vec!["butter"]),
        );
        let list = build_shopping_list(&state);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].priority, Priority::Essential);
    }

    #[test]
    fn matching_is_case_insensitive_and_plural_aware() {
        let state = state_with(
            vec!["Tomatoes", "onion"],
            recipe(vec!["2 tomatoes, diced", "1 onion, sliced"], vec![]),
        );
        assert!(build_shopping_list(&state).is_empty());
    }

    #[test]
    fn multiword_ingredients_match_as_phrases() {
        let state = state_with(
            vec!["olive oil"],
            recipe(vec!["2 tbsp olive oil"], vec![]),
        );
        assert!(build_shopping_list(&state).is_empty());
    }

    #[test]
    fn display_names_drop_quantities_and_measures() {
        assert_eq!(display_name("2 tbsp unsalted butter"), "unsalted butter");
        assert_eq!(display_name("1/2 cup milk"), "milk");
        assert_eq!(display_name("2 cloves garlic"), "garlic");
        assert_eq!(display_name("salt"), "salt");
    }

    #[test]
    fn singularize_handles_common_plural_shapes() {
        assert_eq!(singularize("tomatoes"), "tomato");
        assert_eq!(singularize("berries"), "berry");
        assert_eq!(singularize("eggs"), "egg");
        assert_eq!(singularize("dishes"), "dish");
        assert_eq!(singularize("swiss"), "swiss");
        assert_eq!(singularize("hummus"), "hummus");
    }

    #[test]
    fn assemble_projects_terminal_state() {
        let mut state = state_with(vec!["eggs"], recipe(vec!["3 eggs"], vec![]));
        state.record_nutrition_facts(NutritionFacts::unavailable()).unwrap();
        state.record_shopping_list(vec![]).unwrap();
        state.record_search_enrichment(vec![]).unwrap();
        let run = assemble(state).unwrap();
        assert_eq!(run.output.recipe.title, "Test Dish");
        assert_eq!(run.output.storage_recommendations, "Refrigerate.");
        assert_eq!(run.output.variations, vec!["Add herbs.".to_string()]);
        assert!(run.output.cooking_tips.is_empty());
        assert!(run.error_log.is_empty());
    }

    #[test]
    fn assemble_fails_without_a_recipe() {
        let input = WorkflowInput::new(
            vec!["eggs".into()],
            BTreeSet::from([Appliance::Stovetop]),
            SkillLevel::Beginner,
            "sk-test",
        );
        let mut state = WorkflowState::seeded(&input);
        state.log_failure(StageFailure {
            stage: Stage::GenerateRecipe,
            message: "model unreachable".into(),
        });
        let err = assemble(state).unwrap_err();
        assert_eq!(err.defect, AssemblyDefect::MissingRecipe);
        assert_eq!(err.error_log.len(), 1);
    }

    #[test]
    fn assemble_rejects_blank_titles_and_empty_steps() {
        let mut blank_title = recipe(vec!["3 eggs"], vec![]);
        blank_title.title = "   ".into();
        let err = assemble(state_with(vec!["eggs"], blank_title)).unwrap_err();
        assert_eq!(err.defect, AssemblyDefect::EmptyTitle);

        let mut no_steps = recipe(vec!["3 eggs"], vec![]);
        no_steps.steps = vec![];
        let err = assemble(state_with(vec!["eggs"], no_steps)).unwrap_err();
        assert_eq!(err.defect, AssemblyDefect::NoSteps);
    }
}

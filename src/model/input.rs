//! The validated input record for a workflow run.
//!
//! `WorkflowInput` carries everything a single run needs: the user's
//! ingredients and kitchen setup, and the credentials for the external
//! services. Credentials travel only inside the input record, never as
//! process-wide state, so runs stay independently testable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the ingredient list accepted for a single run.
pub const MAX_INGREDIENTS: usize = 50;

/// The fixed vocabulary of cooking appliances.
///
/// `NoAppliance` is the explicit sentinel for cold, no-cook preparation;
/// an empty appliance set is rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appliance {
    Oven,
    Stovetop,
    Microwave,
    AirFryer,
    SlowCooker,
    PressureCooker,
    Grill,
    Toaster,
    FoodProcessor,
    Blender,
    NoAppliance,
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Oven => "Oven",
            Self::Stovetop => "Stovetop",
            Self::Microwave => "Microwave",
            Self::AirFryer => "Air Fryer",
            Self::SlowCooker => "Slow Cooker",
            Self::PressureCooker => "Pressure Cooker",
            Self::Grill => "Grill",
            Self::Toaster => "Toaster",
            Self::FoodProcessor => "Food Processor",
            Self::Blender => "Blender",
            Self::NoAppliance => "No appliances (cold preparation)",
        };
        write!(f, "{label}")
    }
}

/// The three supported cooking skill levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        };
        write!(f, "{label}")
    }
}

/// The fixed vocabulary of dietary preferences.
///
/// `Unrestricted` is the explicit "none" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    Keto,
    LowCarb,
    LowSodium,
    NutFree,
    EggFree,
    SoyFree,
    Unrestricted,
}

impl fmt::Display for DietaryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Vegetarian => "Vegetarian",
            Self::Vegan => "Vegan",
            Self::GlutenFree => "Gluten-Free",
            Self::DairyFree => "Dairy-Free",
            Self::Keto => "Keto",
            Self::LowCarb => "Low-Carb",
            Self::LowSodium => "Low-Sodium",
            Self::NutFree => "Nut-Free",
            Self::EggFree => "Egg-Free",
            Self::SoyFree => "Soy-Free",
            Self::Unrestricted => "None",
        };
        write!(f, "{label}")
    }
}

/// Errors raised by input validation, before the pipeline starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The ingredient list was empty after normalization.
    #[error("at least one ingredient is required")]
    NoIngredients,

    /// An ingredient entry was blank or whitespace-only.
    #[error("ingredient entries must not be blank")]
    BlankIngredient,

    /// The ingredient list exceeded the accepted maximum.
    #[error("too many ingredients: {given} given, limit is {limit}")]
    TooManyIngredients { given: usize, limit: usize },

    /// The appliance set was empty.
    #[error("at least one appliance is required (use `Appliance::NoAppliance` for cold preparation)")]
    NoAppliances,

    /// The OpenAI credential was missing or blank.
    #[error("an OpenAI API key is required")]
    MissingOpenAiKey,
}

/// Structured user input for one workflow run.
///
/// Created once per submission, passed by value into the engine, never
/// mutated afterwards. Call [`WorkflowInput::validated`] to normalize and
/// check the record; the engine does this itself at run start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Available ingredients, in the order the user listed them.
    pub ingredients: Vec<String>,
    /// Available cooking appliances.
    pub appliances: BTreeSet<Appliance>,
    /// The user's cooking skill level.
    pub skill_level: SkillLevel,
    /// Dietary preferences to respect.
    pub dietary_preferences: BTreeSet<DietaryPreference>,
    /// Preferred cuisine, if any; `None` means "any cuisine".
    pub cuisine: Option<String>,
    /// Credential for the generative model provider.
    pub openai_key: String,
    /// Optional credential for the search provider; enables enrichment.
    pub tavily_key: Option<String>,
}

impl WorkflowInput {
    /// Creates an input record with the required fields; the optional ones
    /// start empty and can be filled with the `with_*` builders.
    pub fn new(
        ingredients: Vec<String>,
        appliances: BTreeSet<Appliance>,
        skill_level: SkillLevel,
        openai_key: impl Into<String>,
    ) -> Self {
        Self {
            ingredients,
            appliances,
            skill_level,
            dietary_preferences: BTreeSet::new(),
            cuisine: None,
            openai_key: openai_key.into(),
            tavily_key: None,
        }
    }

    /// Sets the dietary preferences.
    pub fn with_dietary_preferences(
        mut self,
        preferences: impl IntoIterator<Item = DietaryPreference>,
    ) -> Self {
        self.dietary_preferences = preferences.into_iter().collect();
        self
    }

    /// Sets the preferred cuisine.
    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    /// Sets the search provider credential.
    pub fn with_tavily_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_key = Some(key.into());
        self
    }

    /// Normalizes the record and checks its invariants.
    ///
    /// Ingredient entries are trimmed and deduplicated case-insensitively,
    /// keeping the first occurrence. Returns the normalized record, or the
    /// first [`ValidationError`] encountered.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if self.ingredients.iter().any(|i| i.trim().is_empty()) {
            return Err(ValidationError::BlankIngredient);
        }

        let mut seen = BTreeSet::new();
        let mut normalized = Vec::with_capacity(self.ingredients.len());
        for ingredient in &self.ingredients {
            let trimmed = ingredient.trim().to_string();
            if seen.insert(trimmed.to_lowercase()) {
                normalized.push(trimmed);
            }
        }
        self.ingredients = normalized;

        if self.ingredients.is_empty() {
            return Err(ValidationError::NoIngredients);
        }
        if self.ingredients.len() > MAX_INGREDIENTS {
            return Err(ValidationError::TooManyIngredients {
                given: self.ingredients.len(),
                limit: MAX_INGREDIENTS,
            });
        }
        if self.appliances.is_empty() {
            return Err(ValidationError::NoAppliances);
        }
        if self.openai_key.trim().is_empty() {
            return Err(ValidationError::MissingOpenAiKey);
        }

        Ok(self)
    }

    /// The enrichment predicate: a search credential is present and
    /// non-empty. Evaluated once at run start and fixed for the run.
    pub fn wants_enrichment(&self) -> bool {
        self.tavily_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input(ingredients: Vec<&str>) -> WorkflowInput {
        WorkflowInput::new(
            ingredients.into_iter().map(String::from).collect(),
            BTreeSet::from([Appliance::Stovetop]),
            SkillLevel::Beginner,
            "sk-test",
        )
    }

    #[test]
    fn validation_rejects_empty_ingredient_list() {
        let err = base_input(vec![]).validated().unwrap_err();
        assert_eq!(err, ValidationError::NoIngredients);
    }

    #[test]
    fn validation_rejects_blank_ingredient() {
        let err = base_input(vec!["eggs", "  "]).validated().unwrap_err();
        assert_eq!(err, ValidationError::BlankIngredient);
    }

    #[test]
    fn validation_deduplicates_case_insensitively_keeping_first() {
        let input = base_input(vec!["Eggs", "flour", "eggs", "FLOUR", "milk"])
            .validated()
            .unwrap();
        assert_eq!(input.ingredients, vec!["Eggs", "flour", "milk"]);
    }

    #[test]
    fn validation_trims_entries() {
        let input = base_input(vec!["  eggs ", "flour"]).validated().unwrap();
        assert_eq!(input.ingredients, vec!["eggs", "flour"]);
    }

    #[test]
    fn validation_rejects_oversized_list() {
        let many: Vec<String> = (0..=MAX_INGREDIENTS).map(|i| format!("item-{i}")).collect();
        let mut input = base_input(vec!["placeholder"]);
        input.ingredients = many;
        let err = input.validated().unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooManyIngredients {
                given: MAX_INGREDIENTS + 1,
                limit: MAX_INGREDIENTS,
            }
        );
    }

    #[test]
    fn validation_rejects_empty_appliance_set() {
        let mut input = base_input(vec!["eggs"]);
        input.appliances.clear();
        assert_eq!(
            input.validated().unwrap_err(),
            ValidationError::NoAppliances
        );
    }

    #[test]
    fn validation_rejects_blank_openai_key() {
        let mut input = base_input(vec!["eggs"]);
        input.openai_key = "   ".to_string();
        assert_eq!(
            input.validated().unwrap_err(),
            ValidationError::MissingOpenAiKey
        );
    }

    #[test]
    fn no_appliance_sentinel_satisfies_the_invariant() {
        let mut input = base_input(vec!["eggs"]);
        input.appliances = BTreeSet::from([Appliance::NoAppliance]);
        assert!(input.validated().is_ok());
    }

    #[test]
    fn enrichment_predicate_requires_nonempty_key() {
        assert!(!base_input(vec!["eggs"]).wants_enrichment());
        assert!(
            !base_input(vec!["eggs"])
                .with_tavily_key("")
                .wants_enrichment()
        );
        assert!(
            base_input(vec!["eggs"])
                .with_tavily_key("tvly-abc")
                .wants_enrichment()
        );
    }
}

//! RC-003: Proportional ingredient scaling.
//!
//! Keeps every ingredient quantity in a fixed mutual ratio while the user
//! retargets a single ingredient. Grams and kilograms are the canonical axis
//! (baker's-percentage convention); volume and count units scale by the same
//! ratio in their own unit but stay out of the total weight.
//!
//! Invalid input never fails: unparsable text floors to the minimum quantity,
//! and an unsafe ratio leaves every quantity untouched.

use super::types::{Ingredient, ScalingPolicy};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Result of committing a pending edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// Every ingredient was rescaled by `ratio`.
    Applied { ratio: f64 },
    /// The ratio failed the safety guard; nothing changed.
    Rejected { ratio: f64 },
    /// No pending text for the ingredient.
    NoPendingValue,
    /// The ingredient id is not part of this recipe.
    UnknownIngredient,
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Scaling state for one ingredients panel.
#[derive(Debug, Clone)]
pub struct ScalingEngine {
    ingredients: Vec<Ingredient>,
    pending: IndexMap<String, String>,
    policy: ScalingPolicy,
}

impl ScalingEngine {
    /// Create an engine over a snapshot of ingredients with default guards.
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self::with_policy(ingredients, ScalingPolicy::default())
    }

    pub fn with_policy(ingredients: Vec<Ingredient>, policy: ScalingPolicy) -> Self {
        Self {
            ingredients,
            pending: IndexMap::new(),
            policy,
        }
    }

    /// Committed ingredients, in display order.
    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn into_ingredients(self) -> Vec<Ingredient> {
        self.ingredients
    }

    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn policy(&self) -> &ScalingPolicy {
        &self.policy
    }

    /// Record in-progress keyboard input. Never touches committed quantities.
    pub fn begin_edit(&mut self, ingredient_id: &str, raw_text: &str) {
        self.pending
            .insert(ingredient_id.to_string(), raw_text.to_string());
    }

    /// Pending (uncommitted) text for an ingredient, if any.
    pub fn pending_text(&self, ingredient_id: &str) -> Option<&str> {
        self.pending.get(ingredient_id).map(String::as_str)
    }

    /// What an input field shows: pending text, else the committed quantity.
    pub fn display_value(&self, ingredient_id: &str) -> Option<String> {
        if let Some(text) = self.pending_text(ingredient_id) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
        self.ingredient(ingredient_id)
            .map(|i| self.format_quantity(i.quantity))
    }

    /// Commit the pending text of one ingredient and rescale the whole recipe.
    pub fn commit_edit(&mut self, ingredient_id: &str) -> EditOutcome {
        let raw = match self.pending.get(ingredient_id) {
            Some(text) if !text.is_empty() => text.clone(),
            _ => return EditOutcome::NoPendingValue,
        };
        let Some(ingredient) = self.ingredient(ingredient_id).cloned() else {
            return EditOutcome::UnknownIngredient;
        };

        let new_quantity = self.parse_quantity(&raw);
        let floor = self.policy.min_quantity;
        let old_grams = ingredient.unit.to_grams(ingredient.quantity).max(floor);
        let new_grams = ingredient.unit.to_grams(new_quantity);
        let ratio = new_grams / old_grams;

        if !self.ratio_is_safe(ratio) {
            warn!(
                ingredient = ingredient_id,
                input = %raw,
                ratio,
                "rejected rescale: ratio outside safe bounds"
            );
            let restored = self.format_quantity(ingredient.quantity);
            self.pending.insert(ingredient_id.to_string(), restored);
            return EditOutcome::Rejected { ratio };
        }

        self.apply_ratio(ratio);
        debug!(ingredient = ingredient_id, ratio, "rescaled recipe");
        EditOutcome::Applied { ratio }
    }

    /// Rescale so the g/kg total equals `target_grams`.
    ///
    /// No-op when the recipe carries no weight ingredients.
    pub fn retarget_total_weight(&mut self, target_grams: f64) -> EditOutcome {
        let current = self.total_weight();
        if current <= 0.0 {
            return EditOutcome::UnknownIngredient;
        }
        let target = if target_grams.is_nan() || target_grams <= 0.0 {
            self.policy.min_quantity
        } else {
            target_grams.max(self.policy.min_quantity)
        };
        let ratio = target / current.max(self.policy.min_quantity);
        if !self.ratio_is_safe(ratio) {
            warn!(target_grams, ratio, "rejected total-weight retarget");
            return EditOutcome::Rejected { ratio };
        }
        self.apply_ratio(ratio);
        debug!(target_grams, ratio, "retargeted total weight");
        EditOutcome::Applied { ratio }
    }

    /// Total weight in grams over g/kg ingredients.
    pub fn total_weight(&self) -> f64 {
        total_weight(&self.ingredients)
    }

    /// Format a quantity the way pending text is displayed.
    pub fn format_quantity(&self, quantity: f64) -> String {
        format!("{:.*}", self.policy.display_decimals, quantity)
    }

    /// Parse user text; failures, NaN and anything below the floor become the floor.
    fn parse_quantity(&self, raw: &str) -> f64 {
        let floor = self.policy.min_quantity;
        let normalized = raw.trim().replace(',', ".");
        match normalized.parse::<f64>() {
            Ok(v) if !v.is_nan() && v > 0.0 => v.max(floor),
            _ => floor,
        }
    }

    fn ratio_is_safe(&self, ratio: f64) -> bool {
        ratio.is_finite() && ratio > 0.0 && ratio <= self.policy.max_ratio
    }

    fn apply_ratio(&mut self, ratio: f64) {
        let floor = self.policy.min_quantity;
        for ing in &mut self.ingredients {
            let scaled = ing.unit.from_grams(ing.unit.to_grams(ing.quantity) * ratio);
            ing.quantity = scaled.max(floor);
        }
        let refreshed: IndexMap<String, String> = self
            .ingredients
            .iter()
            .map(|i| (i.id.clone(), self.format_quantity(i.quantity)))
            .collect();
        self.pending = refreshed;
    }
}

/// Total weight in grams; ingredients in non-weight units are skipped.
pub fn total_weight(ingredients: &[Ingredient]) -> f64 {
    ingredients
        .iter()
        .filter(|i| i.unit.is_weight())
        .map(|i| i.unit.to_grams(i.quantity))
        .sum()
}

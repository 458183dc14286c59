//! RC-001: Recipe snapshot, engine configuration, and session event types.
//!
//! Defines the schema of the recipe snapshot handed to the engine by the
//! fetch layer, the YAML engine configuration, and the journal events emitted
//! by guided cooking sessions. Snapshot and config types derive
//! Serialize/Deserialize for YAML/JSON roundtripping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Recipe snapshot
// ============================================================================

/// Immutable recipe snapshot, the only engine input.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    /// Recipe identifier (opaque, assigned by the catalog)
    pub id: String,

    /// Display title
    pub title: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Number of portions the base quantities yield
    #[serde(default)]
    pub servings: Option<u32>,

    /// Preparation time in minutes
    #[serde(default, alias = "prepTime")]
    pub prep_time: Option<u32>,

    /// Cooking time in minutes
    #[serde(default, alias = "cookTime")]
    pub cook_time: Option<u32>,

    /// Difficulty rating
    #[serde(default)]
    pub difficulty: Option<Difficulty>,

    /// Ingredient list (display order)
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Look up an ingredient by id.
    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    /// Sum of all step durations, in minutes.
    pub fn total_step_minutes(&self) -> u32 {
        self.steps.iter().filter_map(|s| s.duration_minutes).sum()
    }
}

/// A single ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ingredient {
    /// Identifier, unique within the recipe
    pub id: String,

    /// Ingredient name
    pub name: String,

    /// Quantity in `unit` (strictly positive)
    pub quantity: f64,

    /// Display unit
    pub unit: Unit,

    /// Free-form notes ("sifted", "room temperature")
    #[serde(default)]
    pub notes: Option<String>,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.quantity, self.unit, self.name)?;
        if let Some(ref notes) = self.notes {
            if !notes.is_empty() {
                write!(f, " ({})", notes)?;
            }
        }
        Ok(())
    }
}

/// Ingredient unit.
///
/// Only `g` and `kg` take part in weight computations. The French labels of
/// the authoring form are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Millilitre,
    #[serde(rename = "cl")]
    Centilitre,
    #[serde(rename = "l")]
    Litre,
    #[serde(rename = "piece", alias = "pièce")]
    Piece,
    #[serde(rename = "pinch", alias = "pincée")]
    Pinch,
    #[serde(rename = "tablespoon", alias = "c.à.s")]
    Tablespoon,
    #[serde(rename = "teaspoon", alias = "c.à.c")]
    Teaspoon,
}

impl Unit {
    /// Whether this unit participates in the weight model.
    pub fn is_weight(self) -> bool {
        matches!(self, Self::Gram | Self::Kilogram)
    }

    /// Convert a quantity in this unit to grams. Non-weight units pass through.
    pub fn to_grams(self, quantity: f64) -> f64 {
        match self {
            Self::Kilogram => quantity * 1000.0,
            _ => quantity,
        }
    }

    /// Inverse of [`Unit::to_grams`].
    pub fn from_grams(self, grams: f64) -> f64 {
        match self {
            Self::Kilogram => grams / 1000.0,
            _ => grams,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gram => write!(f, "g"),
            Self::Kilogram => write!(f, "kg"),
            Self::Millilitre => write!(f, "ml"),
            Self::Centilitre => write!(f, "cl"),
            Self::Litre => write!(f, "l"),
            Self::Piece => write!(f, "piece"),
            Self::Pinch => write!(f, "pinch"),
            Self::Tablespoon => write!(f, "tablespoon"),
            Self::Teaspoon => write!(f, "teaspoon"),
        }
    }
}

/// A single recipe step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    /// Identifier, unique within the recipe
    pub id: String,

    /// 1-based position, contiguous across the recipe
    pub order: u32,

    /// Short title
    pub title: String,

    /// Full instructions
    #[serde(default)]
    pub description: String,

    /// Suggested timer length, in minutes
    #[serde(default, alias = "duration", alias = "durationMinutes")]
    pub duration_minutes: Option<u32>,

    /// Oven/pan temperature, in °C
    #[serde(default, alias = "temperature", alias = "temperatureCelsius")]
    pub temperature_celsius: Option<i32>,
}

/// Difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[serde(alias = "facile", alias = "Facile")]
    Easy,
    #[serde(alias = "moyen", alias = "Moyen")]
    Medium,
    #[serde(alias = "difficile", alias = "Difficile")]
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

// ============================================================================
// Engine configuration (recette.yaml)
// ============================================================================

/// Engine configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scaling guards
    #[serde(default)]
    pub scaling: ScalingPolicy,

    /// Countdown timer settings
    #[serde(default)]
    pub timer: TimerPolicy,

    /// Session journal settings
    #[serde(default)]
    pub journal: JournalPolicy,
}

/// Numeric guards for proportional scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Smallest quantity any ingredient may hold
    #[serde(default = "default_min_quantity")]
    pub min_quantity: f64,

    /// Largest accepted scaling ratio
    #[serde(default = "default_max_ratio")]
    pub max_ratio: f64,

    /// Decimal places used for pending-text display values
    #[serde(default = "default_display_decimals")]
    pub display_decimals: usize,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_quantity: default_min_quantity(),
            max_ratio: default_max_ratio(),
            display_decimals: default_display_decimals(),
        }
    }
}

fn default_min_quantity() -> f64 {
    0.1
}

fn default_max_ratio() -> f64 {
    1_000_000.0
}

fn default_display_decimals() -> usize {
    1
}

/// Countdown timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPolicy {
    /// Wall-clock period of one tick, in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for TimerPolicy {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

impl TimerPolicy {
    /// Tick period as a Duration (never zero).
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_millis.max(1))
    }
}

fn default_tick_millis() -> u64 {
    1000
}

/// Session journal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalPolicy {
    /// Append session events to the journal
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Journal root directory
    #[serde(default = "default_journal_dir")]
    pub dir: String,
}

impl Default for JournalPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_journal_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_journal_dir() -> String {
    "journal".to_string()
}

// ============================================================================
// Session events
// ============================================================================

/// Guided-cooking event for the JSONL session journal.
///
/// Step indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        recipe: String,
        session_id: String,
        recipe_hash: String,
        step_count: usize,
    },
    StepAdvanced {
        from: usize,
        to: usize,
    },
    StepRetreated {
        from: usize,
        to: usize,
    },
    StepJumped {
        from: usize,
        to: usize,
    },
    CompletionToggled {
        step: usize,
        completed: Vec<usize>,
    },
    TimerStarted {
        step: usize,
        seconds: u64,
    },
    TimerPaused {
        step: usize,
        remaining: u64,
    },
    TimerResumed {
        step: usize,
        remaining: u64,
    },
    TimerReset {
        step: usize,
    },
    TimerExpired {
        step: usize,
    },
    SessionClosed {
        completed: usize,
        step_count: usize,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: SessionEvent,
}

// ============================================================================
// Tests
// ============================================================================

//! RC-009: CLI subcommands — init, validate, show, scale, cook, history, schema, completions.

mod cook;

use crate::core::scaling::{EditOutcome, ScalingEngine};
use crate::core::types::{EngineConfig, Ingredient, Recipe, SessionEvent, TimestampedEvent};
use crate::core::{parser, types};
use crate::journal::{eventlog, hasher};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new recipe project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate a recipe snapshot
    Validate {
        /// Path to the recipe (YAML or JSON)
        #[arg(short, long, default_value = "recipe.yaml")]
        file: PathBuf,
    },

    /// Show a recipe: ingredients, total weight, steps
    Show {
        /// Path to the recipe (YAML or JSON)
        #[arg(short, long, default_value = "recipe.yaml")]
        file: PathBuf,
    },

    /// Rescale every ingredient proportionally
    Scale {
        /// Path to the recipe (YAML or JSON)
        #[arg(short, long, default_value = "recipe.yaml")]
        file: PathBuf,

        /// Ingredient to retarget
        #[arg(short, long, requires = "quantity")]
        ingredient: Option<String>,

        /// New quantity for the ingredient, in its own unit
        #[arg(short, long, requires = "ingredient")]
        quantity: Option<String>,

        /// Retarget the total g/kg weight instead
        #[arg(long, conflicts_with_all = ["ingredient", "quantity"])]
        total_weight: Option<f64>,

        /// Engine config
        #[arg(short, long, default_value = "recette.yaml")]
        config: PathBuf,
    },

    /// Guided cook mode: step through the recipe with timers
    Cook {
        /// Path to the recipe (YAML or JSON)
        #[arg(short, long, default_value = "recipe.yaml")]
        file: PathBuf,

        /// Engine config
        #[arg(short, long, default_value = "recette.yaml")]
        config: PathBuf,

        /// Journal directory (overrides the config)
        #[arg(long)]
        journal_dir: Option<PathBuf>,
    },

    /// Show the session journal of a recipe
    History {
        /// Recipe id
        #[arg(short, long)]
        recipe: String,

        /// Engine config
        #[arg(short, long, default_value = "recette.yaml")]
        config: PathBuf,

        /// Journal directory (overrides the config)
        #[arg(long)]
        journal_dir: Option<PathBuf>,
    },

    /// Print the JSON Schema of the recipe snapshot
    Schema,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Show { file } => cmd_show(&file),
        Commands::Scale {
            file,
            ingredient,
            quantity,
            total_weight,
            config,
        } => cmd_scale(
            &file,
            &config,
            ingredient.as_deref(),
            quantity.as_deref(),
            total_weight,
        ),
        Commands::Cook {
            file,
            config,
            journal_dir,
        } => cook::cmd_cook(&file, &config, journal_dir.as_deref()),
        Commands::History {
            recipe,
            config,
            journal_dir,
        } => cmd_history(journal_dir.as_deref(), &config, &recipe),
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

const RECIPE_TEMPLATE: &str = r#"id: my-recipe
title: My recipe
description: "Scaled by recette"
servings: 4
difficulty: easy

ingredients:
  - id: flour
    name: Flour
    quantity: 200
    unit: g
  - id: sugar
    name: Sugar
    quantity: 100
    unit: g

steps:
  - id: mix
    order: 1
    title: Mix
    description: Mix the dry ingredients.
  - id: bake
    order: 2
    title: Bake
    description: Bake until golden.
    duration_minutes: 20
    temperature_celsius: 180
"#;

const CONFIG_TEMPLATE: &str = r#"scaling:
  min_quantity: 0.1
  max_ratio: 1000000
  display_decimals: 1

timer:
  tick_millis: 1000

journal:
  enabled: true
  dir: journal
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let recipe_path = path.join("recipe.yaml");
    if recipe_path.exists() {
        return Err(format!("{} already exists", recipe_path.display()));
    }

    let config_path = path.join("recette.yaml");
    if !config_path.exists() {
        std::fs::write(&config_path, CONFIG_TEMPLATE)
            .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;
    }
    let config = parser::load_engine_config(Some(&config_path))?;

    let journal_dir = path.join(&config.journal.dir);
    std::fs::create_dir_all(&journal_dir)
        .map_err(|e| format!("cannot create journal dir: {}", e))?;

    std::fs::write(&recipe_path, RECIPE_TEMPLATE)
        .map_err(|e| format!("cannot write {}: {}", recipe_path.display(), e))?;

    println!("Initialized recipe project at {}", path.display());
    println!("  Created: {}", recipe_path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", journal_dir.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let recipe = parser::parse_recipe_file(file)?;
    let errors = parser::validate_recipe(&recipe);

    if errors.is_empty() {
        println!(
            "OK: {} ({} ingredients, {} steps)",
            recipe.title,
            recipe.ingredients.len(),
            recipe.steps.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_show(file: &Path) -> Result<(), String> {
    let recipe = parser::load_recipe(file)?;

    println!("{} [{}]", recipe.title, recipe.id);
    if let Some(ref d) = recipe.description {
        println!("  {}", d);
    }
    let mut meta = Vec::new();
    if let Some(s) = recipe.servings {
        meta.push(format!("{} servings", s));
    }
    if let Some(p) = recipe.prep_time {
        meta.push(format!("prep {} min", p));
    }
    if let Some(c) = recipe.cook_time {
        meta.push(format!("cook {} min", c));
    }
    if let Some(d) = recipe.difficulty {
        meta.push(d.to_string());
    }
    if !meta.is_empty() {
        println!("  {}", meta.join(", "));
    }

    println!();
    println!("Ingredients:");
    for ing in &recipe.ingredients {
        println!("  - {}", ing);
    }
    let engine = ScalingEngine::new(recipe.ingredients.clone());
    println!("Total weight: {:.0} g", engine.total_weight());

    println!();
    println!("Steps:");
    for step in &recipe.steps {
        println!("  {}. {}{}", step.order, step.title, step_badges(step));
    }
    if recipe.total_step_minutes() > 0 {
        println!("Timed steps: {} min", recipe.total_step_minutes());
    }

    println!();
    println!("Fingerprint: {}", hasher::hash_recipe(&recipe)?);
    println!("Source:      {}", hasher::hash_file(file)?);
    Ok(())
}

/// ` (25 min, 180°C)` suffix for a step, or empty.
fn step_badges(step: &types::Step) -> String {
    let mut badges = Vec::new();
    if let Some(d) = step.duration_minutes {
        badges.push(format!("{} min", d));
    }
    if let Some(t) = step.temperature_celsius {
        badges.push(format!("{}°C", t));
    }
    if badges.is_empty() {
        String::new()
    } else {
        format!(" ({})", badges.join(", "))
    }
}

fn cmd_scale(
    file: &Path,
    config: &Path,
    ingredient: Option<&str>,
    quantity: Option<&str>,
    total_weight: Option<f64>,
) -> Result<(), String> {
    let recipe = parser::load_recipe(file)?;
    let config = parser::load_engine_config(Some(config))?;
    let mut engine = ScalingEngine::with_policy(recipe.ingredients.clone(), config.scaling);

    let outcome = match (ingredient, quantity, total_weight) {
        (Some(id), Some(text), None) => {
            engine.begin_edit(id, text);
            match engine.commit_edit(id) {
                EditOutcome::UnknownIngredient => {
                    return Err(format!("unknown ingredient '{}'", id));
                }
                other => other,
            }
        }
        (None, None, Some(grams)) => match engine.retarget_total_weight(grams) {
            EditOutcome::UnknownIngredient => {
                return Err("recipe has no g/kg ingredients to retarget".to_string());
            }
            other => other,
        },
        _ => {
            return Err("pass --ingredient with --quantity, or --total-weight".to_string());
        }
    };

    match outcome {
        EditOutcome::Applied { ratio } => {
            println!("Scaled {} by x{:.4}", recipe.title, ratio);
        }
        EditOutcome::Rejected { ratio } => {
            println!(
                "Rejected: ratio {} is outside safe bounds; quantities unchanged.",
                ratio
            );
        }
        EditOutcome::NoPendingValue => println!("Nothing to scale."),
        EditOutcome::UnknownIngredient => {}
    }
    println!();
    print_scaled(&recipe.ingredients, &engine);
    Ok(())
}

/// Display a before/after table.
fn print_scaled(before: &[Ingredient], engine: &ScalingEngine) {
    let width = before.iter().map(|i| i.name.len()).max().unwrap_or(0);
    for (old, new) in before.iter().zip(engine.ingredients()) {
        println!(
            "  {:<width$}  {:>10} {:<10} -> {:>10} {}",
            old.name,
            engine.format_quantity(old.quantity),
            old.unit.to_string(),
            engine.format_quantity(new.quantity),
            new.unit,
            width = width
        );
    }
    println!();
    println!(
        "Total weight: {:.0} g -> {:.0} g",
        crate::core::scaling::total_weight(before),
        engine.total_weight()
    );
}

/// Journal directory: the explicit flag, else the config's `journal.dir`.
fn resolve_journal_dir(explicit: Option<&Path>, config: &EngineConfig) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.journal.dir))
}

fn history_events(
    journal_dir: Option<&Path>,
    config: &Path,
    recipe_id: &str,
) -> Result<Vec<TimestampedEvent>, String> {
    let config = parser::load_engine_config(Some(config))?;
    eventlog::read_events(&resolve_journal_dir(journal_dir, &config), recipe_id)
}

fn cmd_history(journal_dir: Option<&Path>, config: &Path, recipe_id: &str) -> Result<(), String> {
    let events = history_events(journal_dir, config, recipe_id)?;
    if events.is_empty() {
        println!("No journal for '{}'. Run `recette cook` first.", recipe_id);
        return Ok(());
    }
    println!("Journal: {} ({} events)", recipe_id, events.len());
    for te in &events {
        println!("  {}  {}", te.ts, describe_event(&te.event));
    }
    Ok(())
}

/// One-line human description of a session event (steps shown 1-based).
pub(crate) fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::SessionStarted {
            session_id,
            recipe_hash,
            step_count,
            ..
        } => format!(
            "session {} started ({} steps, {})",
            session_id, step_count, recipe_hash
        ),
        SessionEvent::StepAdvanced { from, to } => {
            format!("advanced: step {} -> {}", from + 1, to + 1)
        }
        SessionEvent::StepRetreated { from, to } => {
            format!("went back: step {} -> {}", from + 1, to + 1)
        }
        SessionEvent::StepJumped { from, to } => {
            format!("jumped: step {} -> {}", from + 1, to + 1)
        }
        SessionEvent::CompletionToggled { step, completed } => format!(
            "toggled step {}: {} completed",
            step + 1,
            completed.len()
        ),
        SessionEvent::TimerStarted { step, seconds } => format!(
            "timer started on step {} ({})",
            step + 1,
            crate::core::timer::format_clock(*seconds)
        ),
        SessionEvent::TimerPaused { step, remaining } => format!(
            "timer paused on step {} ({} left)",
            step + 1,
            crate::core::timer::format_clock(*remaining)
        ),
        SessionEvent::TimerResumed { step, remaining } => format!(
            "timer resumed on step {} ({} left)",
            step + 1,
            crate::core::timer::format_clock(*remaining)
        ),
        SessionEvent::TimerReset { step } => format!("timer reset on step {}", step + 1),
        SessionEvent::TimerExpired { step } => format!("timer expired on step {}", step + 1),
        SessionEvent::SessionClosed {
            completed,
            step_count,
        } => format!("session closed ({}/{} steps completed)", completed, step_count),
    }
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(Recipe);
    let json = serde_json::to_string_pretty(&schema)
        .map_err(|e| format!("JSON serialize error: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn cmd_completions(shell: clap_complete::Shell) {
    use clap::Command;
    let mut cmd = Commands::augment_subcommands(Command::new("recette"));
    clap_complete::generate(shell, &mut cmd, "recette", &mut std::io::stdout());
}

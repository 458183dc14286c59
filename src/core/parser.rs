//! RC-002: Recipe snapshot and engine config loading, validation, normalization.
//!
//! Parses recipe snapshots (YAML, or JSON as served by the catalog API) and
//! validates structural constraints:
//! - Recipe id and title must not be empty
//! - Ingredient ids must be unique; quantities finite and positive
//! - Step ids must be unique; step orders contiguous starting at 1

use super::types::*;
use std::collections::HashSet;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a recipe file from disk. `.json` files go through serde_json,
/// everything else through YAML.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read recipe {}: {}", path.display(), e))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        parse_recipe_json(&content)
    } else {
        parse_recipe(&content)
    }
}

/// Parse a recipe from a YAML string.
pub fn parse_recipe(yaml: &str) -> Result<Recipe, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Parse a recipe from a JSON string (catalog API shape).
pub fn parse_recipe_json(json: &str) -> Result<Recipe, String> {
    serde_json::from_str(json).map_err(|e| format!("JSON parse error: {}", e))
}

/// Validate a parsed recipe. Returns a list of errors (empty = valid).
pub fn validate_recipe(recipe: &Recipe) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if recipe.id.trim().is_empty() {
        errors.push(ValidationError {
            message: "recipe id must not be empty".to_string(),
        });
    }
    if recipe.title.trim().is_empty() {
        errors.push(ValidationError {
            message: format!("recipe '{}' has an empty title", recipe.id),
        });
    }

    let mut seen = HashSet::new();
    for ing in &recipe.ingredients {
        if ing.id.is_empty() {
            errors.push(ValidationError {
                message: format!("ingredient '{}' has an empty id", ing.name),
            });
        } else if !seen.insert(ing.id.as_str()) {
            errors.push(ValidationError {
                message: format!("duplicate ingredient id '{}'", ing.id),
            });
        }
        if ing.name.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("ingredient '{}' has an empty name", ing.id),
            });
        }
        if !ing.quantity.is_finite() || ing.quantity <= 0.0 {
            errors.push(ValidationError {
                message: format!(
                    "ingredient '{}' quantity must be positive, got {}",
                    ing.id, ing.quantity
                ),
            });
        }
    }

    let mut seen = HashSet::new();
    for step in &recipe.steps {
        if !seen.insert(step.id.as_str()) {
            errors.push(ValidationError {
                message: format!("duplicate step id '{}'", step.id),
            });
        }
        if step.title.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("step '{}' has an empty title", step.id),
            });
        }
    }

    let mut orders: Vec<u32> = recipe.steps.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    for (i, order) in orders.iter().enumerate() {
        let expected = i as u32 + 1;
        if *order != expected {
            errors.push(ValidationError {
                message: format!(
                    "step orders must be contiguous from 1: expected {}, got {}",
                    expected, order
                ),
            });
            break;
        }
    }

    errors
}

/// Sort steps by their `order` field.
pub fn normalize_recipe(mut recipe: Recipe) -> Recipe {
    recipe.steps.sort_by_key(|s| s.order);
    recipe
}

/// Load a recipe file, validate it, and normalize step order.
pub fn load_recipe(path: &Path) -> Result<Recipe, String> {
    let recipe = parse_recipe_file(path)?;
    let errors = validate_recipe(&recipe);
    if errors.is_empty() {
        return Ok(normalize_recipe(recipe));
    }
    let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    Err(format!(
        "{} validation error(s): {}",
        errors.len(),
        joined.join("; ")
    ))
}

/// Parse an engine config from a YAML string.
pub fn parse_engine_config(yaml: &str) -> Result<EngineConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("config parse error: {}", e))
}

/// Load the engine config. A missing file yields the defaults.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
    parse_engine_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
id: quatre-quarts
title: Quatre-quarts
ingredients:
  - id: flour
    name: flour
    quantity: 250
    unit: g
  - id: sugar
    name: sugar
    quantity: 250
    unit: g
steps:
  - id: bake
    order: 2
    title: Bake
    duration_minutes: 40
  - id: mix
    order: 1
    title: Mix
"#;

    #[test]
    fn test_rc002_parse_valid() {
        let recipe = parse_recipe(VALID).unwrap();
        assert_eq!(recipe.title, "Quatre-quarts");
        assert!(validate_recipe(&recipe).is_empty());
    }

    #[test]
    fn test_rc002_parse_invalid_yaml() {
        let result = parse_recipe("id: [unclosed");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("YAML parse error"));
    }

    #[test]
    fn test_rc002_normalize_sorts_steps() {
        let recipe = normalize_recipe(parse_recipe(VALID).unwrap());
        let ids: Vec<_> = recipe.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["mix", "bake"]);
    }

    #[test]
    fn test_rc002_empty_id_and_title() {
        let recipe = parse_recipe("id: ''\ntitle: ' '\n").unwrap();
        let errors = validate_recipe(&recipe);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_rc002_duplicate_ingredient() {
        let yaml = r#"
id: r
title: r
ingredients:
  - {id: a, name: a, quantity: 1, unit: g}
  - {id: a, name: b, quantity: 2, unit: g}
"#;
        let errors = validate_recipe(&parse_recipe(yaml).unwrap());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate ingredient id 'a'"));
    }

    #[test]
    fn test_rc002_non_positive_quantity() {
        let yaml = r#"
id: r
title: r
ingredients:
  - {id: a, name: a, quantity: 0, unit: g}
  - {id: b, name: b, quantity: -3, unit: ml}
"#;
        let errors = validate_recipe(&parse_recipe(yaml).unwrap());
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("must be positive")));
    }

    #[test]
    fn test_rc002_step_order_gap() {
        let yaml = r#"
id: r
title: r
steps:
  - {id: a, order: 1, title: a}
  - {id: b, order: 3, title: b}
"#;
        let errors = validate_recipe(&parse_recipe(yaml).unwrap());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected 2, got 3"));
    }

    #[test]
    fn test_rc002_step_order_starts_at_zero() {
        let yaml = r#"
id: r
title: r
steps:
  - {id: a, order: 0, title: a}
"#;
        let errors = validate_recipe(&parse_recipe(yaml).unwrap());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_rc002_duplicate_step_id() {
        let yaml = r#"
id: r
title: r
steps:
  - {id: a, order: 1, title: a}
  - {id: a, order: 2, title: b}
"#;
        let errors = validate_recipe(&parse_recipe(yaml).unwrap());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate step id"));
    }

    #[test]
    fn test_rc002_parse_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.json");
        std::fs::write(
            &path,
            r#"{"id":"r","title":"R","ingredients":[{"id":"a","name":"a","quantity":5,"unit":"kg"}],"steps":[]}"#,
        )
        .unwrap();
        let recipe = parse_recipe_file(&path).unwrap();
        assert_eq!(recipe.ingredients[0].unit, Unit::Kilogram);
    }

    #[test]
    fn test_rc002_load_recipe_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.yaml");
        std::fs::write(&path, "id: r\ntitle: ''\n").unwrap();
        let err = load_recipe(&path).unwrap_err();
        assert!(err.contains("1 validation error(s)"));
    }

    #[test]
    fn test_rc002_load_recipe_missing_file() {
        let result = load_recipe(Path::new("/nonexistent/recipe.yaml"));
        assert!(result.unwrap_err().contains("cannot read recipe"));
    }

    #[test]
    fn test_rc002_load_engine_config_missing() {
        let cfg = load_engine_config(Some(Path::new("/nonexistent/recette.yaml"))).unwrap();
        assert_eq!(cfg.timer.tick_millis, 1000);
        let cfg = load_engine_config(None).unwrap();
        assert!(cfg.journal.enabled);
    }

    #[test]
    fn test_rc002_load_engine_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recette.yaml");
        std::fs::write(&path, "scaling:\n  max_ratio: 50\n").unwrap();
        let cfg = load_engine_config(Some(&path)).unwrap();
        assert_eq!(cfg.scaling.max_ratio, 50.0);
        assert_eq!(cfg.scaling.min_quantity, 0.1);
    }
}

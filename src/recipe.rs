//! Edit recipes: a repeatable list of effects plus adjustment values.
//!
//! ```toml
//! [adjustments]
//! brightness = 1.1
//! width = 800
//! resize_method = "crop"
//!
//! [[effects]]
//! kind = "sepia"
//! intensity = 0.6
//!
//! [[effects]]
//! kind = "color_match"
//! reference = "refs/sunset.jpg"   # relative to the recipe file
//! ```
//!
//! Effects are applied first, in order, each committing a history
//! snapshot. Adjustments are applied afterwards so that geometry set in the
//! recipe survives the geometry reset every effect performs.

use crate::adjustments::Adjustment;
use crate::imaging::Effect;
use crate::imaging::ImageCodec;
use crate::session::{ImageSession, SessionError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("adjustment '{name}' must be a number or string, got {found}")]
    ValueType { name: String, found: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    #[serde(default)]
    pub adjustments: toml::Table,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Recipe {
    pub fn parse(content: &str) -> Result<Self, RecipeError> {
        Ok(toml::from_str(content)?)
    }

    /// Typed adjustments, validated but not yet applied.
    pub fn adjustments(&self) -> Result<Vec<Adjustment>, RecipeError> {
        self.adjustments
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    other => {
                        return Err(RecipeError::ValueType {
                            name: name.clone(),
                            found: other.type_str().to_string(),
                        });
                    }
                };
                Adjustment::parse(name, &text).map_err(|e| RecipeError::Session(e.into()))
            })
            .collect()
    }

    /// Make color-match reference paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for effect in &mut self.effects {
            if let Effect::ColorMatch(params) = effect
                && let Some(path) = params.reference_path.as_mut()
                && path.is_relative()
            {
                *path = base.join(&*path);
            }
        }
    }

    /// Apply every effect, then every adjustment, to a loaded session.
    ///
    /// Adjustments are validated before anything is touched; a failing
    /// effect stops the run with the earlier effects already committed.
    pub fn apply_to<C: ImageCodec>(&self, session: &mut ImageSession<C>) -> Result<(), RecipeError> {
        let adjustments = self.adjustments()?;
        if !session.is_loaded() {
            return Err(SessionError::NoImageLoaded.into());
        }
        for effect in &self.effects {
            session.apply_effect(effect)?;
        }
        for adjustment in adjustments {
            session.set_adjustment(adjustment)?;
        }
        log::info!(
            "recipe applied: {} effect(s), {} adjustment(s)",
            self.effects.len(),
            self.adjustments.len()
        );
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty() && self.effects.is_empty()
    }
}

/// Parse a one-line effect spec: `KIND[:KEY=VALUE,...]`.
///
/// Values are read as TOML scalars, falling back to plain strings, so
/// `blur:radius=3,method=box` and `sepia:intensity=0.5` both work.
pub fn parse_effect_spec(spec: &str) -> Result<Effect, RecipeError> {
    let (kind, params) = spec.split_once(':').unwrap_or((spec, ""));
    let mut table = toml::Table::new();
    table.insert("kind".into(), toml::Value::String(kind.trim().to_string()));
    for pair in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
        table.insert(key.trim().to_string(), scalar(raw.trim()));
    }
    Ok(toml::Value::Table(table).try_into()?)
}

fn scalar(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Read a recipe file, resolving reference paths against its directory.
pub fn load_recipe(path: &Path) -> Result<Recipe, RecipeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut recipe = Recipe::parse(&content)?;
    if let Some(dir) = path.parent() {
        recipe.resolve_paths(dir);
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{Knob, ResizeMethod};
    use crate::imaging::BlockSize;
    use crate::imaging::effects::PixelateParams;
    use crate::test_helpers::{gradient, session_with, solid, write_into};
    use tempfile::TempDir;

    #[test]
    fn parse_effects_and_adjustments() {
        let recipe = Recipe::parse(
            r#"
            [adjustments]
            brightness = 1.2
            width = 32
            resize_method = "crop"

            [[effects]]
            kind = "sepia"
            intensity = 0.5

            [[effects]]
            kind = "pixelate"
            block_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(recipe.effects.len(), 2);
        assert_eq!(recipe.effects[0].name(), "sepia");
        assert_eq!(
            recipe.effects[1],
            Effect::Pixelate(PixelateParams {
                block_size: BlockSize::try_from(4).unwrap()
            })
        );

        let adjustments = recipe.adjustments().unwrap();
        assert!(adjustments.contains(&Adjustment::Tonal(Knob::Brightness, 1.2)));
        assert!(adjustments.contains(&Adjustment::Width(32)));
        assert!(adjustments.contains(&Adjustment::ResizeMethod(ResizeMethod::Crop)));
    }

    #[test]
    fn empty_recipe_is_valid() {
        let recipe = Recipe::parse("").unwrap();
        assert!(recipe.is_empty());
    }

    #[test]
    fn unknown_effect_kind_rejected() {
        let err = Recipe::parse("[[effects]]\nkind = \"lens_flare\"\n").unwrap_err();
        assert!(matches!(err, RecipeError::Toml(_)));
    }

    #[test]
    fn unknown_effect_parameter_rejected() {
        let err = Recipe::parse("[[effects]]\nkind = \"sepia\"\nstrength = 1.0\n").unwrap_err();
        assert!(matches!(err, RecipeError::Toml(_)));
    }

    #[test]
    fn out_of_range_block_size_rejected() {
        let err = Recipe::parse("[[effects]]\nkind = \"pixelate\"\nblock_size = 99\n").unwrap_err();
        assert!(matches!(err, RecipeError::Toml(_)));
    }

    #[test]
    fn unknown_adjustment_rejected() {
        let recipe = Recipe::parse("[adjustments]\nclarity = 1.0\n").unwrap();
        assert!(matches!(
            recipe.adjustments(),
            Err(RecipeError::Session(SessionError::UnknownAdjustment(_)))
        ));
    }

    #[test]
    fn non_scalar_adjustment_rejected() {
        let recipe = Recipe::parse("[adjustments]\nbrightness = [1.0]\n").unwrap();
        assert!(matches!(
            recipe.adjustments(),
            Err(RecipeError::ValueType { .. })
        ));
    }

    #[test]
    fn effect_spec_with_defaults() {
        let effect = parse_effect_spec("sepia").unwrap();
        assert_eq!(effect.name(), "sepia");
    }

    #[test]
    fn effect_spec_with_params() {
        use crate::imaging::BlurKind;
        use crate::imaging::effects::BlurParams;
        let effect = parse_effect_spec("blur:radius=3,method=box").unwrap();
        let Effect::Blur(BlurParams { radius, method }) = effect else {
            panic!("expected blur");
        };
        assert_eq!(radius.value(), 3.0);
        assert_eq!(method, BlurKind::Box);
    }

    #[test]
    fn effect_spec_rejects_bad_input() {
        assert!(parse_effect_spec("pixelate").is_err(), "block_size is required");
        assert!(parse_effect_spec("sepia:amount=1").is_err());
        assert!(parse_effect_spec("swirl").is_err());
        assert!(parse_effect_spec("blur:radius=1e30").is_err());
        assert!(parse_effect_spec("glow:radius=250").is_err());
    }

    #[test]
    fn apply_commits_effects_then_sets_geometry() {
        let recipe = Recipe::parse(
            r#"
            [adjustments]
            width = 8
            height = 8

            [[effects]]
            kind = "invert"

            [[effects]]
            kind = "grayscale"
            "#,
        )
        .unwrap();

        let mut session = session_with(gradient(16, 16));
        recipe.apply_to(&mut session).unwrap();

        assert_eq!(session.history().len(), 3);
        assert_eq!(session.processed(false).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn apply_requires_loaded_image() {
        let recipe = Recipe::parse("[[effects]]\nkind = \"invert\"\n").unwrap();
        let mut session = ImageSession::new();
        assert!(matches!(
            recipe.apply_to(&mut session),
            Err(RecipeError::Session(SessionError::NoImageLoaded))
        ));
    }

    #[test]
    fn load_resolves_reference_relative_to_recipe() {
        let tmp = TempDir::new().unwrap();
        write_into(tmp.path(), "ref.png", &solid(4, 4, [200, 10, 10]));
        let recipe_path = tmp.path().join("look.toml");
        std::fs::write(
            &recipe_path,
            "[[effects]]\nkind = \"color_match\"\nreference = \"ref.png\"\n",
        )
        .unwrap();

        let recipe = load_recipe(&recipe_path).unwrap();
        let Effect::ColorMatch(params) = &recipe.effects[0] else {
            panic!("expected color_match");
        };
        assert_eq!(params.reference_path.as_deref(), Some(tmp.path().join("ref.png").as_path()));

        let mut session = session_with(gradient(8, 8));
        recipe.apply_to(&mut session).unwrap();
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_recipe(Path::new("/nonexistent/recipe.toml")).unwrap_err();
        assert!(matches!(err, RecipeError::Io { .. }));
    }
}

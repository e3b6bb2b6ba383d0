// Sound catalog - static registry of sound definitions grouped by category
// Category order and sound order inside a category are the browse order

pub mod builtin;

use serde::Serialize;

use crate::synth::recipe::SynthesisRecipe;
use crate::synth::resolver;

/// Sound id absent from the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Unknown sound: {0}")]
    UnknownSound(String),
}

/// One placeable sound
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundDefinition {
    pub id: String,
    pub display_name: String,
    /// Owning category id
    pub category: String,
    /// Path relative to the resource root (e.g. "sfx/ui/ui_click.wav")
    pub relative_path: String,
    /// Approximate length in seconds
    pub nominal_duration: f64,
}

/// Group of sounds shown together in the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub display_name: String,
    pub icon: String,
    pub sounds: Vec<SoundDefinition>,
}

/// Read-only registry of categories and their sounds
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    categories: Vec<Category>,
}

impl SoundCatalog {
    /// Create a catalog from an ordered list of categories
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The catalog shipped with the studio
    pub fn builtin() -> Self {
        Self::new(builtin::categories())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Iterate every sound in browse order
    pub fn sounds(&self) -> impl Iterator<Item = &SoundDefinition> {
        self.categories.iter().flat_map(|c| c.sounds.iter())
    }

    pub fn sound_count(&self) -> usize {
        self.categories.iter().map(|c| c.sounds.len()).sum()
    }

    /// Find a sound by id
    pub fn lookup(&self, sound_id: &str) -> Result<&SoundDefinition, LookupError> {
        self.sounds()
            .find(|s| s.id == sound_id)
            .ok_or_else(|| LookupError::UnknownSound(sound_id.to_string()))
    }

    /// Look up a sound and resolve its synthesis recipe
    ///
    /// Returns the recipe and its volume scalar. Resolution itself is pure,
    /// so two calls for the same id return identical recipes.
    pub fn resolve(&self, sound_id: &str) -> Result<(SynthesisRecipe, f32), LookupError> {
        let sound = self.lookup(sound_id)?;
        Ok(resolver::resolve(&sound.category, &sound.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_ids_are_unique() {
        let catalog = SoundCatalog::builtin();
        let mut ids = std::collections::HashSet::new();
        for sound in catalog.sounds() {
            assert!(ids.insert(sound.id.clone()), "duplicate id {}", sound.id);
        }
        assert_eq!(ids.len(), catalog.sound_count());
    }

    #[test]
    fn test_sounds_belong_to_their_category() {
        let catalog = SoundCatalog::builtin();
        for category in catalog.categories() {
            assert!(!category.sounds.is_empty());
            for sound in &category.sounds {
                assert_eq!(sound.category, category.id);
                assert!(sound.nominal_duration > 0.0);
                assert!(sound.relative_path.ends_with(".wav"));
            }
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = SoundCatalog::builtin();
        let click = catalog.lookup("ui_click").unwrap();
        assert_eq!(click.category, "ui");
        assert_eq!(click.relative_path, "sfx/ui/ui_click.wav");
        assert_eq!(click.nominal_duration, 0.1);

        assert_eq!(
            catalog.lookup("does_not_exist"),
            Err(LookupError::UnknownSound("does_not_exist".to_string()))
        );
    }

    #[test]
    fn test_resolve_unknown_sound_fails() {
        let catalog = SoundCatalog::builtin();
        assert!(catalog.resolve("nope").is_err());
        assert!(catalog.resolve("laser_fire").is_ok());
    }

    #[test]
    fn test_browse_order_is_preserved() {
        let catalog = SoundCatalog::builtin();
        let ui = catalog.category("ui").unwrap();
        assert_eq!(ui.sounds[0].id, "ui_click");
        assert_eq!(catalog.categories()[0].id, "ui");
    }
}

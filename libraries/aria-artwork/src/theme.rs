//! Persisted theme preference
//!
//! Every change is written through to the key-value store under
//! [`THEME_KEY`].

use crate::error::Result;
use crate::extractor::ColorExtractor;
use crate::types::{Palette, Rgb, ThemeMode, ThemePreference, PALETTES};
use aria_core::{KeyValueStore, KeyValueStoreExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Storage key for the theme document
pub const THEME_KEY: &str = "theme";

pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    preference: Mutex<ThemePreference>,
}

impl ThemeStore {
    /// Load the persisted preference, or start from defaults
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let preference = match store.load::<ThemePreference>(THEME_KEY) {
            Ok(Some(preference)) => preference,
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable theme preference");
                ThemePreference::default()
            }
        };

        Self {
            store,
            preference: Mutex::new(preference),
        }
    }

    pub fn preference(&self) -> ThemePreference {
        *self.lock()
    }

    pub fn mode(&self) -> ThemeMode {
        self.lock().mode
    }

    /// Accent colour for the current mode
    pub fn accent(&self) -> Rgb {
        self.lock().accent()
    }

    pub fn palettes(&self) -> &'static [Palette] {
        &PALETTES
    }

    // ===== Setters =====

    /// Switch mode by name; unknown names are logged and ignored
    ///
    /// Returns whether the name was accepted.
    pub fn set_mode(&self, mode: &str) -> Result<bool> {
        match mode.parse::<ThemeMode>() {
            Ok(mode) => {
                self.update(|p| p.mode = mode)?;
                info!(mode = mode.as_str(), "Theme mode set");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring theme mode");
                Ok(false)
            }
        }
    }

    pub fn set_album_cover_color(&self, color: Rgb) -> Result<()> {
        debug!(%color, "Album cover colour updated");
        self.update(|p| p.album_cover_color = color)
    }

    pub fn set_material_you_color(&self, color: Rgb) -> Result<()> {
        debug!(%color, "Material You colour updated");
        self.update(|p| p.material_you_color = color)
    }

    // ===== Cover Extraction =====

    /// Derive the album-cover colour from image bytes
    ///
    /// If no colour can be derived the album-cover colour falls back to white
    /// and Material You resets to the default blue. Returns the new accent.
    pub fn apply_cover(&self, bytes: &[u8]) -> Result<Rgb> {
        let derived = ColorExtractor::dominant_color(bytes);
        self.apply_derived(derived)
    }

    /// As [`apply_cover`](Self::apply_cover), fetching the image first
    pub async fn apply_cover_url(
        &self,
        extractor: &ColorExtractor,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<Rgb> {
        let derived = extractor.extract_from_url(http, url).await;
        self.apply_derived(derived)
    }

    fn apply_derived(&self, derived: Result<Rgb>) -> Result<Rgb> {
        match derived {
            Ok(color) => self.update(|p| p.album_cover_color = color)?,
            Err(e) => {
                warn!(error = %e, "Cover colour unavailable, using defaults");
                self.update(|p| {
                    p.album_cover_color = Rgb::WHITE;
                    p.material_you_color = Rgb::DEFAULT_BLUE;
                })?;
            }
        }
        Ok(self.accent())
    }

    fn update(&self, f: impl FnOnce(&mut ThemePreference)) -> Result<()> {
        let mut preference = self.lock();
        let mut next = *preference;
        f(&mut next);
        self.store.save(THEME_KEY, &next)?;
        *preference = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ThemePreference> {
        self.preference
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tests::solid;
    use aria_storage::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get_raw(&self, _key: &str) -> aria_core::Result<Option<String>> {
            Ok(None)
        }

        fn set_raw(&self, _key: &str, _value: &str) -> aria_core::Result<()> {
            Err(aria_core::CoreError::storage("read-only"))
        }

        fn remove(&self, _key: &str) -> aria_core::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_leaves_preference_unchanged() {
        let theme = ThemeStore::load(Arc::new(ReadOnlyStore));

        assert!(theme.set_mode("album_cover").is_err());
        assert_eq!(theme.mode(), ThemeMode::MaterialYou);
        assert!(theme.set_album_cover_color(Rgb(1, 2, 3)).is_err());
        assert_eq!(theme.preference(), ThemePreference::default());
    }

    #[test]
    fn defaults_to_material_you_blue() {
        let theme = ThemeStore::load(store());
        assert_eq!(theme.mode(), ThemeMode::MaterialYou);
        assert_eq!(theme.accent(), Rgb::DEFAULT_BLUE);
        assert_eq!(theme.palettes().len(), 5);
    }

    #[test]
    fn unknown_mode_is_ignored() {
        let theme = ThemeStore::load(store());
        assert!(!theme.set_mode("neon").unwrap());
        assert_eq!(theme.mode(), ThemeMode::MaterialYou);
    }

    #[test]
    fn preference_survives_reload() {
        let backing = store();
        {
            let theme = ThemeStore::load(backing.clone());
            assert!(theme.set_mode("album_cover").unwrap());
            theme.set_album_cover_color(Rgb(10, 20, 30)).unwrap();
        }

        let theme = ThemeStore::load(backing);
        assert_eq!(theme.mode(), ThemeMode::AlbumCover);
        assert_eq!(theme.accent(), Rgb(10, 20, 30));
    }

    #[test]
    fn apply_cover_sets_album_color() {
        let theme = ThemeStore::load(store());
        theme.set_mode("album_cover").unwrap();

        let accent = theme.apply_cover(&solid(4, 4, [180, 30, 90, 255])).unwrap();
        assert_eq!(accent, Rgb(180, 30, 90));
    }

    #[test]
    fn undecodable_cover_falls_back() {
        let theme = ThemeStore::load(store());
        theme.set_material_you_color(Rgb(244, 67, 54)).unwrap();

        let accent = theme.apply_cover(b"nope").unwrap();

        let preference = theme.preference();
        assert_eq!(preference.album_cover_color, Rgb::WHITE);
        assert_eq!(preference.material_you_color, Rgb::DEFAULT_BLUE);
        assert_eq!(accent, Rgb::DEFAULT_BLUE);
    }

    #[test]
    fn corrupt_document_falls_back_to_defaults() {
        let backing = store();
        backing.set_raw(THEME_KEY, "{not json").unwrap();

        let theme = ThemeStore::load(backing);
        assert_eq!(theme.preference(), ThemePreference::default());
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Settings;
use crate::error::SettingsError;

/// Unified config manager.
pub struct ConfigManager {
    path: PathBuf,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigManager {
    /// Load settings once from the default location and cache them.
    pub fn new() -> Self {
        Self::with_path(Settings::default_path())
    }

    pub fn with_path(path: PathBuf) -> Self {
        let settings = Settings::load_from(&path);
        Self {
            path,
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot copy of current settings.
    pub fn get(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn get_shared(&self) -> Arc<RwLock<Settings>> {
        Arc::clone(&self.settings)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Reload settings from disk.
    pub fn reload(&self) {
        let fresh = Settings::load_from(&self.path);
        *self.settings.write() = fresh;
    }

    /// Apply `f` to the cached settings and persist the result.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let snapshot = {
            let mut guard = self.settings.write();
            f(&mut guard);
            guard.clone()
        };
        snapshot.save_to(&self.path)
    }

    // Convenience accessors.

    #[inline]
    pub fn target_language(&self) -> String {
        self.settings.read().target_language.clone()
    }

    #[inline]
    pub fn ocr_language(&self) -> String {
        self.settings.read().ocr_language.clone()
    }

    #[inline]
    pub fn max_history_count(&self) -> usize {
        self.settings.read().max_history_count
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_persists_and_reload_sees_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let manager = ConfigManager::with_path(path.clone());
        assert_eq!(manager.target_language(), "zh");

        manager
            .update(|s| s.target_language = "ja".to_string())
            .unwrap();
        assert_eq!(Settings::load_from(&path).target_language, "ja");

        let other = ConfigManager::with_path(path);
        other.update(|s| s.max_history_count = 3).unwrap();
        manager.reload();
        assert_eq!(manager.max_history_count(), 3);
    }
}

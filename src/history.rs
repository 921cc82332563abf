//! Capture history.
//!
//! Newest-first list of saved screenshots persisted as `history.json` next to the image
//! files. Entries whose image file has vanished are dropped on load; entries pushed past the
//! configured maximum are removed together with their files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ExportError, SettingsError};
use crate::export::{self, ExportFormat};
use crate::pixel_buffer::PixelBuffer;
use crate::settings::defaults::app_data_dir;

pub const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotItem {
    pub id: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub thumbnail_path: Option<PathBuf>,
    pub capture_time: DateTime<Local>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl ScreenshotItem {
    pub fn new(file_path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            file_path,
            thumbnail_path: None,
            capture_time: Local::now(),
            width,
            height,
            ocr_text: None,
            translated_text: None,
            pinned: false,
        }
    }
}

pub struct HistoryStore {
    dir: PathBuf,
    items: Vec<ScreenshotItem>,
    max_count: usize,
}

impl HistoryStore {
    pub fn default_dir() -> PathBuf {
        app_data_dir().join("history")
    }

    /// Load the history kept in `dir`. Never fails; a broken file reads as empty.
    pub fn open(dir: impl Into<PathBuf>, max_count: usize) -> Self {
        let dir = dir.into();
        let mut items = match load_items(&dir.join(HISTORY_FILE_NAME)) {
            Ok(items) => items,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to load history from {}: {}", dir.display(), e);
                Vec::new()
            }
        };
        let before = items.len();
        items.retain(|item| item.file_path.exists());
        if items.len() != before {
            debug!("Pruned {} history entries with missing files", before - items.len());
        }

        let mut store = Self {
            dir,
            items,
            max_count,
        };
        store.trim();
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn items(&self) -> &[ScreenshotItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&ScreenshotItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_max_count(&mut self, max_count: usize) {
        self.max_count = max_count;
        if self.trim() {
            self.save();
        }
    }

    /// Insert at the front, evicting the oldest entries beyond the maximum.
    pub fn add(&mut self, item: ScreenshotItem) {
        self.items.insert(0, item);
        self.trim();
        self.save();
    }

    /// Save `image` and its thumbnail into the history directory and add an entry for it.
    pub fn record(
        &mut self,
        image: &PixelBuffer,
        ocr_text: Option<String>,
        translated_text: Option<String>,
    ) -> Result<ScreenshotItem, ExportError> {
        let mut item = ScreenshotItem::new(PathBuf::new(), image.width(), image.height());
        item.file_path = self.dir.join(format!("{}.png", item.id));
        export::save(image, &item.file_path, ExportFormat::Png)?;

        let thumb_path = self.dir.join(format!("{}_thumb.png", item.id));
        match export::save(&image.thumbnail(), &thumb_path, ExportFormat::Png) {
            Ok(()) => item.thumbnail_path = Some(thumb_path),
            Err(e) => warn!("Failed to write thumbnail: {}", e),
        }

        item.ocr_text = ocr_text;
        item.translated_text = translated_text;
        self.add(item.clone());
        Ok(item)
    }

    pub fn set_pinned(&mut self, id: &str, pinned: bool) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.pinned = pinned;
        self.save();
        true
    }

    /// Remove one entry and its files.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            return false;
        };
        let item = self.items.remove(index);
        delete_files(&item);
        self.save();
        true
    }

    /// Remove every entry and its files.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            delete_files(&item);
        }
        self.save();
    }

    fn trim(&mut self) -> bool {
        if self.items.len() <= self.max_count {
            return false;
        }
        for item in self.items.drain(self.max_count..) {
            delete_files(&item);
        }
        true
    }

    fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!("Failed to save history to {}: {}", self.dir.display(), e);
        }
    }

    fn try_save(&self) -> Result<(), SettingsError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&self.items)?;
        fs::write(self.dir.join(HISTORY_FILE_NAME), json)?;
        Ok(())
    }
}

fn load_items(path: &Path) -> Result<Vec<ScreenshotItem>, SettingsError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn delete_files(item: &ScreenshotItem) {
    for path in std::iter::once(&item.file_path).chain(item.thumbnail_path.as_ref()) {
        if path.exists()
            && let Err(e) = fs::remove_file(path)
        {
            debug!("Could not delete {}: {}", path.display(), e);
        }
    }
}

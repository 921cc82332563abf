use std::path::PathBuf;

use crate::selection::CaptureMode;

// Annotation defaults
pub fn default_stroke_color() -> String {
    "#FFFF0000".to_string()
}

pub fn default_stroke_thickness() -> f32 {
    2.0
}

pub fn default_font_size() -> f32 {
    14.0
}

// Language defaults
pub fn default_ocr_language() -> String {
    "zh-Hans".to_string()
}

pub fn default_source_language() -> String {
    "auto".to_string()
}

pub fn default_target_language() -> String {
    "zh".to_string()
}

// Output defaults
pub fn default_save_format() -> String {
    "png".to_string()
}

pub fn default_jpeg_quality() -> u8 {
    90
}

pub fn default_capture_mode() -> CaptureMode {
    CaptureMode::Region
}

// History defaults
pub fn default_max_history_count() -> usize {
    100
}

pub fn default_keep_history() -> bool {
    true
}

/// User home directory, falling back to the program directory, then cwd.
pub fn home_dir() -> PathBuf {
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home);
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        return exe_dir.to_path_buf();
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Base directory holding `settings.json` and `history.json`.
///
/// `SC_TRANSLATOR_HOME` wins; otherwise the platform config directory.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SC_TRANSLATOR_HOME") {
        return PathBuf::from(dir);
    }
    let base = std::env::var("APPDATA")
        .or_else(|_| std::env::var("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("sc_translator")
}

pub fn default_save_directory() -> PathBuf {
    home_dir().join("Pictures").join("ScreenshotTranslator")
}

pub fn default_ocr_models_dir() -> PathBuf {
    app_data_dir().join("models")
}

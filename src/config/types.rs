use crate::tools::{DEFAULT_TOOL_TIMEOUT, ToolConfig, WidthBounds};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 預設每次回應的最大位元組數（2 MiB）
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl FileTypeTable {
    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_file
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            timeout_secs: DEFAULT_TOOL_TIMEOUT.as_secs(),
        }
    }
}

impl ToolSettings {
    #[must_use]
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig::new(
            &self.ffmpeg,
            &self.ffprobe,
            Duration::from_secs(self.timeout_secs.max(1)),
        )
    }
}

/// 預覽圖網格設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSettings {
    pub rows: u32,
    pub cols: u32,
    /// ffmpeg `-q:v`，2（最好）到 31（最差）
    pub quality: u32,
    pub min_tile_width: u32,
    pub max_tile_width: u32,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        let bounds = WidthBounds::default();
        Self {
            rows: 5,
            cols: 5,
            quality: 4,
            min_tile_width: bounds.min,
            max_tile_width: bounds.max,
        }
    }
}

impl SpriteSettings {
    #[must_use]
    pub const fn width_bounds(&self) -> WidthBounds {
        WidthBounds::new(self.min_tile_width, self.max_tile_width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub chunk_size: u64,
    /// 字幕檔中引用預覽圖時使用的 URL 前綴
    pub preview_url_prefix: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            preview_url_prefix: "/previews".to_string(),
        }
    }
}

/// 使用者設定，存放於 settings.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library_dirs: Vec<PathBuf>,
    pub store_path: PathBuf,
    pub preview_dir: PathBuf,
    pub jobs: usize,
    pub tools: ToolSettings,
    pub sprite: SpriteSettings,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_dirs: Vec::new(),
            store_path: PathBuf::from("assets.json"),
            preview_dir: PathBuf::from("previews"),
            jobs: 1,
            tools: ToolSettings::default(),
            sprite: SpriteSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_type_table: FileTypeTable,
    pub settings: Settings,
    pub settings_path: PathBuf,
    /// 命令列 `--jobs`，只影響本次執行，不寫入設定檔
    pub jobs_override: Option<usize>,
}

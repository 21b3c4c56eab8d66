use super::cue_writer::{synthesize_cues, write_cue_file};
use super::sprite_sheet::{SpriteRequest, SpriteSheet, generate_sprite_sheet};
use crate::config::Settings;
use crate::error::{MediaError, PreviewError};
use crate::store::SourceAsset;
use crate::tools::{ToolConfig, WidthBounds, solve_dividable_width};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// 一部影片的預覽圖與字幕檔位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPaths {
    pub sprite: PathBuf,
    pub cues: PathBuf,
}

impl PreviewPaths {
    #[must_use]
    pub fn exists(&self) -> bool {
        self.sprite.is_file() && self.cues.is_file()
    }

    /// 刪除預覽圖與 cue 檔，不存在的檔案視為已刪除
    pub fn remove(&self) -> std::io::Result<()> {
        for path in [&self.sprite, &self.cues] {
            match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        Ok(())
    }
}

#[must_use]
pub fn preview_paths(preview_dir: &Path, id: u64) -> PreviewPaths {
    PreviewPaths {
        sprite: preview_dir.join(format!("{id}.jpg")),
        cues: preview_dir.join(format!("{id}.vtt")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    pub rows: u32,
    pub cols: u32,
    pub quality: u32,
    pub bounds: WidthBounds,
    /// 字幕檔中預覽圖 URL 的前綴
    pub url_prefix: String,
}

impl PreviewOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            rows: settings.sprite.rows,
            cols: settings.sprite.cols,
            quality: settings.sprite.quality,
            bounds: settings.sprite.width_bounds(),
            url_prefix: settings.server.preview_url_prefix.clone(),
        }
    }

    fn sprite_url(&self, sprite: &Path) -> String {
        let name = sprite
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = self.url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutput {
    pub paths: PreviewPaths,
    pub sheet: SpriteSheet,
    pub cue_count: usize,
}

/// 為單一影片產生預覽圖與對應的 WebVTT
///
/// 縮圖寬度取可整除畫面寬度的值；字幕檔依照實際產生的網格與尺寸寫出。
pub fn generate_preview(
    tools: &ToolConfig,
    asset: &SourceAsset,
    preview_dir: &Path,
    options: &PreviewOptions,
) -> Result<PreviewOutput, PreviewError> {
    if asset.duration == 0 {
        return Err(PreviewError::InvalidDuration);
    }

    let tile_width = solve_dividable_width(asset.width, options.bounds)?;
    debug!(
        "影片 {} 寬 {}，縮圖寬度 {tile_width}",
        asset.id, asset.width
    );

    fs::create_dir_all(preview_dir).map_err(MediaError::from)?;
    let paths = preview_paths(preview_dir, asset.id);

    let request = SpriteRequest {
        source: asset.path.clone(),
        output: paths.sprite.clone(),
        duration: asset.duration,
        tile_width,
        rows: options.rows,
        cols: options.cols,
        quality: options.quality,
    };
    let sheet = generate_sprite_sheet(tools, &request)?;

    let track = synthesize_cues(asset.duration, &sheet, &options.sprite_url(&paths.sprite));
    write_cue_file(&paths.cues, &track)?;

    info!(
        "預覽圖完成: {} ({}x{}, {} 段)",
        asset.path.display(),
        sheet.cols,
        sheet.rows,
        track.cues.len()
    );

    Ok(PreviewOutput {
        paths,
        sheet,
        cue_count: track.cues.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn asset(duration: u64, width: u32) -> SourceAsset {
        SourceAsset {
            id: 7,
            path: PathBuf::from("/videos/a.mp4"),
            size: 1,
            duration,
            width,
            height: 720,
            quality: None,
        }
    }

    #[test]
    fn test_preview_paths_use_asset_id() {
        let paths = preview_paths(Path::new("/data/previews"), 42);
        assert_eq!(paths.sprite, PathBuf::from("/data/previews/42.jpg"));
        assert_eq!(paths.cues, PathBuf::from("/data/previews/42.vtt"));
    }

    #[test]
    fn test_sprite_url_joins_prefix() {
        let mut options = PreviewOptions::from_settings(&Settings::default());
        assert_eq!(options.sprite_url(Path::new("/x/3.jpg")), "/previews/3.jpg");
        options.url_prefix = "https://cdn.example.com/p/".to_string();
        assert_eq!(
            options.sprite_url(Path::new("3.jpg")),
            "https://cdn.example.com/p/3.jpg"
        );
        options.url_prefix.clear();
        assert_eq!(options.sprite_url(Path::new("3.jpg")), "3.jpg");
    }

    #[test]
    fn test_zero_duration_is_rejected_before_tools_run() {
        let dir = TempDir::new().unwrap();
        let options = PreviewOptions::from_settings(&Settings::default());
        let err = generate_preview(&ToolConfig::default(), &asset(0, 1280), dir.path(), &options)
            .unwrap_err();
        assert!(matches!(err, PreviewError::InvalidDuration));
    }

    #[test]
    fn test_width_without_divisor_is_rejected() {
        let dir = TempDir::new().unwrap();
        let options = PreviewOptions::from_settings(&Settings::default());
        let err = generate_preview(&ToolConfig::default(), &asset(60, 853), dir.path(), &options)
            .unwrap_err();
        assert!(matches!(
            err,
            PreviewError::NoDivisorFound { frame_width: 853 }
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

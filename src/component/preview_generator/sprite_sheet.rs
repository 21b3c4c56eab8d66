use crate::error::{MediaError, PreviewError};
use crate::tools::{ToolConfig, probe_image_size, run_ffmpeg};
use log::{debug, warn};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 實際採樣的網格（已依影片長度調整）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteGrid {
    pub rows: u32,
    pub cols: u32,
}

impl SpriteGrid {
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.rows * self.cols
    }
}

/// 預覽圖中單一縮圖的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone)]
pub struct SpriteRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    /// 影片長度（秒）
    pub duration: u64,
    pub tile_width: u32,
    pub rows: u32,
    pub cols: u32,
    /// ffmpeg `-q:v`
    pub quality: u32,
}

/// 產生完成的預覽圖，尺寸皆為實際量測值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSheet {
    pub path: PathBuf,
    pub rows: u32,
    pub cols: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl SpriteSheet {
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.rows * self.cols
    }

    /// 第 `index` 張縮圖的位置，由左至右、由上而下
    #[must_use]
    pub const fn tile_rect(&self, index: u32) -> SpriteRect {
        let cols = if self.cols == 0 { 1 } else { self.cols };
        SpriteRect {
            x: (index % cols) * self.tile_width,
            y: (index / cols) * self.tile_height,
            w: self.tile_width,
            h: self.tile_height,
        }
    }
}

/// 決定實際網格
///
/// 每秒最多取一張，影片短於 `rows * cols` 秒時縮小網格。
pub fn plan_grid(duration: u64, rows: u32, cols: u32) -> Result<SpriteGrid, PreviewError> {
    if duration == 0 {
        return Err(PreviewError::InvalidDuration);
    }
    let rows = u64::from(rows.max(1));
    let cols = u64::from(cols.max(1));

    let cols = cols.min(duration);
    let rows = rows.min((duration / cols).max(1));

    // 兩者都不超過原本的 u32 值
    Ok(SpriteGrid {
        rows: u32::try_from(rows).unwrap_or(u32::MAX),
        cols: u32::try_from(cols).unwrap_or(u32::MAX),
    })
}

/// 用一次 ffmpeg 呼叫產生整張預覽圖
///
/// 以 `fps` 濾鏡平均採樣，`scale` 縮到指定寬度，`tile` 拼成網格。
/// 完成後量測輸出圖片，回傳的縮圖尺寸以實際圖片為準。
pub fn generate_sprite_sheet(
    tools: &ToolConfig,
    request: &SpriteRequest,
) -> Result<SpriteSheet, PreviewError> {
    let grid = plan_grid(request.duration, request.rows, request.cols)?;
    if grid.rows != request.rows || grid.cols != request.cols {
        debug!(
            "影片只有 {}s，網格調整為 {}x{}",
            request.duration, grid.cols, grid.rows
        );
    }

    // 先寫到同目錄的暫存檔，完成後才取代舊的預覽圖
    let partial = partial_path(&request.output);
    let measured = render_and_measure(tools, request, grid, &partial);
    let (image_width, image_height) = match measured {
        Ok(size) => size,
        Err(e) => {
            discard(&partial);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&partial, &request.output) {
        discard(&partial);
        return Err(MediaError::Io(e).into());
    }

    Ok(SpriteSheet {
        path: request.output.clone(),
        rows: grid.rows,
        cols: grid.cols,
        tile_width: image_width / grid.cols,
        tile_height: image_height / grid.rows,
        image_width,
        image_height,
    })
}

fn render_and_measure(
    tools: &ToolConfig,
    request: &SpriteRequest,
    grid: SpriteGrid,
    partial: &Path,
) -> Result<(u32, u32), PreviewError> {
    run_ffmpeg(tools, build_args(request, grid, partial))?;

    if !partial.is_file() {
        return Err(MediaError::tool_failed(
            "ffmpeg",
            Some(0),
            format!("未產生預覽圖: {}", request.output.display()),
        )
        .into());
    }

    Ok(probe_image_size(tools, partial)?)
}

/// `.<stem>.<uuid>.partial.<ext>`，保留副檔名讓 ffmpeg 選用相同的編碼器
fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sprite");
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    let parent = output.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{stem}.{}.partial.{ext}", Uuid::new_v4().simple()))
}

fn build_args(request: &SpriteRequest, grid: SpriteGrid, output: &Path) -> Vec<OsString> {
    let filter = format!(
        "fps={}/{},scale={}:-2,tile={}x{}",
        grid.tile_count(),
        request.duration,
        request.tile_width,
        grid.cols,
        grid.rows
    );

    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(request.source.clone().into_os_string());
    args.extend(
        ["-frames:v", "1", "-an", "-sn", "-dn", "-vf"]
            .iter()
            .map(OsString::from),
    );
    args.push(filter.into());
    args.push("-q:v".into());
    args.push(request.quality.to_string().into());
    args.push("-y".into());
    args.push(output.as_os_str().to_os_string());
    args
}

fn discard(partial: &Path) {
    if !partial.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(partial) {
        warn!("無法刪除不完整的預覽圖 {}: {e}", partial.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SpriteRequest {
        SpriteRequest {
            source: PathBuf::from("/videos/a.mp4"),
            output: PathBuf::from("/previews/1.jpg"),
            duration: 100,
            tile_width: 160,
            rows: 5,
            cols: 5,
            quality: 4,
        }
    }

    #[test]
    fn test_plan_grid_keeps_requested_grid_for_long_videos() {
        assert_eq!(
            plan_grid(100, 5, 5).unwrap(),
            SpriteGrid { rows: 5, cols: 5 }
        );
        assert_eq!(
            plan_grid(25, 5, 5).unwrap(),
            SpriteGrid { rows: 5, cols: 5 }
        );
    }

    #[test]
    fn test_plan_grid_shrinks_for_short_videos() {
        assert_eq!(
            plan_grid(12, 5, 5).unwrap(),
            SpriteGrid { rows: 2, cols: 5 }
        );
        assert_eq!(
            plan_grid(3, 5, 5).unwrap(),
            SpriteGrid { rows: 1, cols: 3 }
        );
        assert_eq!(
            plan_grid(1, 5, 5).unwrap(),
            SpriteGrid { rows: 1, cols: 1 }
        );
    }

    #[test]
    fn test_plan_grid_never_exceeds_one_frame_per_second() {
        for duration in 1..60 {
            let grid = plan_grid(duration, 5, 5).unwrap();
            assert!(u64::from(grid.tile_count()) <= duration);
            assert!(grid.rows >= 1 && grid.cols >= 1);
        }
    }

    #[test]
    fn test_plan_grid_rejects_zero_duration() {
        assert!(matches!(
            plan_grid(0, 5, 5),
            Err(PreviewError::InvalidDuration)
        ));
    }

    #[test]
    fn test_build_args_filter_chain() {
        let args = build_args(
            &request(),
            SpriteGrid { rows: 5, cols: 5 },
            Path::new("/previews/1.jpg"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "fps=25/100,scale=160:-2,tile=5x5");
        let q = args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(args[q + 1], "4");
        assert_eq!(args.last().unwrap(), "/previews/1.jpg");
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i + 1], "/videos/a.mp4");
    }

    #[test]
    fn test_partial_path_is_hidden_sibling_with_same_extension() {
        let partial = partial_path(Path::new("/previews/7.jpg"));
        assert_eq!(partial.parent(), Some(Path::new("/previews")));
        let name = partial.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".7."));
        assert!(name.ends_with(".partial.jpg"));
        assert_ne!(partial, partial_path(Path::new("/previews/7.jpg")));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_regeneration_keeps_previous_sprite() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::TempDir::new().unwrap();
        let previews = tempfile::TempDir::new().unwrap();
        let script = bin.path().join("fake-ffmpeg");
        fs::write(
            &script,
            "#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\nprintf PARTIAL > \"$last\"\nexit 1\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let tools = ToolConfig::new(
            script,
            "/nonexistent/ffprobe",
            std::time::Duration::from_secs(10),
        );

        let output = previews.path().join("7.jpg");
        fs::write(&output, b"previous sprite").unwrap();
        let request = SpriteRequest {
            output: output.clone(),
            ..request()
        };

        let err = generate_sprite_sheet(&tools, &request).unwrap_err();
        assert!(matches!(err, PreviewError::PreviewGenerationFailed(_)));
        assert_eq!(fs::read(&output).unwrap(), b"previous sprite");
        assert_eq!(fs::read_dir(previews.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_tile_rect_is_row_major() {
        let sheet = SpriteSheet {
            path: PathBuf::from("s.jpg"),
            rows: 2,
            cols: 3,
            tile_width: 160,
            tile_height: 90,
            image_width: 480,
            image_height: 180,
        };
        assert_eq!(
            sheet.tile_rect(0),
            SpriteRect { x: 0, y: 0, w: 160, h: 90 }
        );
        assert_eq!(
            sheet.tile_rect(4),
            SpriteRect { x: 160, y: 90, w: 160, h: 90 }
        );
    }
}

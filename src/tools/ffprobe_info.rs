use crate::error::MediaError;
use crate::tools::tool_runner::{ToolConfig, run_ffprobe};
use log::debug;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;

/// 影片長度（四捨五入到整秒）與畫面尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub duration: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片長度與尺寸
///
/// 容器損壞時 ffprobe 會失敗或讀不到長度，回傳 `ProbeFailed`，
/// 呼叫端據此決定是否先重建容器。
pub fn probe_dimensions(tools: &ToolConfig, path: &Path) -> Result<VideoDimensions, MediaError> {
    let stdout = run_probe(tools, path)?;
    let dimensions = parse_dimensions(path, &stdout)?;
    debug!(
        "{}: {}s, {}x{}",
        path.display(),
        dimensions.duration,
        dimensions.width,
        dimensions.height
    );
    Ok(dimensions)
}

/// 取得圖片尺寸（寬, 高），用於量測實際產生的預覽圖
pub fn probe_image_size(tools: &ToolConfig, path: &Path) -> Result<(u32, u32), MediaError> {
    let stdout = run_probe(tools, path)?;
    parse_image_size(path, &stdout)
}

fn run_probe(tools: &ToolConfig, path: &Path) -> Result<String, MediaError> {
    if !path.is_file() {
        return Err(MediaError::AssetMissing(path.to_path_buf()));
    }

    let args = [
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        path.as_os_str(),
    ];

    match run_ffprobe(tools, args) {
        Ok(output) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
        // 程序有執行但失敗，代表檔案本身讀不出來
        Err(MediaError::ToolInvocation {
            exit_code: Some(code),
            detail,
            ..
        }) => Err(probe_failed(path, format!("ffprobe exit {code}: {detail}"))),
        Err(e) => Err(e),
    }
}

fn parse_dimensions(path: &Path, stdout: &str) -> Result<VideoDimensions, MediaError> {
    let probe: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| probe_failed(path, format!("無法解析 ffprobe 輸出: {e}")))?;

    let video_stream = find_video_stream(&probe).ok_or_else(|| probe_failed(path, "找不到視訊串流"))?;

    let (width, height) = stream_size(path, video_stream)?;

    // 優先從 format 取長度，其次從 stream
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds)
        .or_else(|| video_stream.duration.as_deref().and_then(parse_seconds))
        .ok_or_else(|| probe_failed(path, "無法取得影片長度"))?;

    Ok(VideoDimensions {
        duration,
        width,
        height,
    })
}

fn parse_image_size(path: &Path, stdout: &str) -> Result<(u32, u32), MediaError> {
    let probe: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| probe_failed(path, format!("無法解析 ffprobe 輸出: {e}")))?;
    let stream = find_video_stream(&probe).ok_or_else(|| probe_failed(path, "找不到影像串流"))?;
    stream_size(path, stream)
}

fn find_video_stream(probe: &FfprobeOutput) -> Option<&StreamInfo> {
    probe
        .streams
        .as_ref()?
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

fn stream_size(path: &Path, stream: &StreamInfo) -> Result<(u32, u32), MediaError> {
    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(probe_failed(path, "無法取得畫面尺寸")),
    }
}

/// 解析秒數字串並四捨五入（ffprobe 對未知長度會輸出 "N/A"）
fn parse_seconds(raw: &str) -> Option<u64> {
    let seconds: f64 = raw.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.round() as u64)
}

fn probe_failed(path: &Path, reason: impl Into<String>) -> MediaError {
    MediaError::ProbeFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

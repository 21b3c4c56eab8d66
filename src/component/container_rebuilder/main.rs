use super::remux_command::RemuxCommand;
use crate::error::MediaError;
use crate::tools::{ToolConfig, run_ffmpeg};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 暫存檔清理結果；清理失敗不影響重建本身
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStatus {
    Clean,
    Warning(String),
}

impl CleanupStatus {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub path: PathBuf,
    pub temp_cleanup: CleanupStatus,
}

/// 重新封裝影片容器
///
/// 1. 清掉先前中斷時留下的暫存檔
/// 2. stream copy 到同目錄的暫存檔
/// 3. 成功後 rename 取代原檔；過程中原路徑一直存在
///
/// ffmpeg 失敗時刪除不完整的暫存檔並回傳錯誤，原檔保持不變。
pub fn rebuild_container(tools: &ToolConfig, path: &Path) -> Result<RebuildReport, MediaError> {
    if !path.is_file() {
        return Err(MediaError::AssetMissing(path.to_path_buf()));
    }

    let cleanup = sweep_stale_temps(path);
    if let CleanupStatus::Warning(msg) = &cleanup {
        warn!("{msg}");
    }

    let command = RemuxCommand::new(path);
    let temp_path = command.temp_path().to_path_buf();
    debug!("重建容器: {} -> {}", path.display(), temp_path.display());

    if let Err(e) = run_ffmpeg(tools, command.build_args()) {
        if let CleanupStatus::Warning(msg) = remove_temp(&temp_path) {
            warn!("{msg}");
        }
        return Err(e);
    }

    if !temp_path.is_file() {
        return Err(MediaError::tool_failed(
            "ffmpeg",
            Some(0),
            format!("重建後的檔案未建立: {}", temp_path.display()),
        ));
    }

    if let Err(source) = fs::rename(&temp_path, path) {
        log::error!(
            "重建完成但無法取代原檔 {}，新檔留在 {}: {source}",
            path.display(),
            temp_path.display()
        );
        return Err(MediaError::RebuildLeftOrphaned {
            original: path.to_path_buf(),
            temp: temp_path,
            source,
        });
    }

    info!("容器已重建: {}", path.display());

    Ok(RebuildReport {
        path: path.to_path_buf(),
        temp_cleanup: cleanup,
    })
}

/// 刪除同一原檔先前留下的暫存檔
pub fn sweep_stale_temps(path: &Path) -> CleanupStatus {
    let Some(parent) = path.parent() else {
        return CleanupStatus::Clean;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let Ok(entries) = fs::read_dir(parent) else {
        return CleanupStatus::Clean;
    };

    let mut failures = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let candidate = entry.path();
        if !RemuxCommand::is_temp_of(path, &candidate) {
            continue;
        }
        debug!("清除殘留暫存檔: {}", candidate.display());
        if let CleanupStatus::Warning(msg) = remove_temp(&candidate) {
            failures.push(msg);
        }
    }

    if failures.is_empty() {
        CleanupStatus::Clean
    } else {
        CleanupStatus::Warning(failures.join("; "))
    }
}

fn remove_temp(temp_path: &Path) -> CleanupStatus {
    if !temp_path.exists() {
        return CleanupStatus::Clean;
    }
    match fs::remove_file(temp_path) {
        Ok(()) => CleanupStatus::Clean,
        Err(e) => CleanupStatus::Warning(format!("無法刪除暫存檔 {}: {e}", temp_path.display())),
    }
}

//! 函式庫層的錯誤型別
//!
//! 外部工具（ffmpeg / ffprobe）相關的錯誤集中在 [`MediaError`]，
//! 預覽圖流程的錯誤則是 [`PreviewError`]。批次流程與 CLI 使用 `anyhow` 包裝。

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// 找不到執行檔（`exit_code` 為 `None`）或程序以非零狀態結束
    #[error("{tool} 執行失敗: {detail}")]
    ToolInvocation {
        tool: String,
        exit_code: Option<i32>,
        detail: String,
    },

    #[error("{tool} 超過時限 {after:?} 仍未結束，已強制終止")]
    Timeout { tool: String, after: Duration },

    #[error("操作已取消")]
    Cancelled,

    #[error("無法讀取影片資訊 {}: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("檔案不存在: {}", .0.display())]
    AssetMissing(PathBuf),

    /// 重新封裝成功，但新檔無法放回原路徑；原檔未被更動
    #[error(
        "重建完成但無法取代原檔 {}，新檔留在 {}: {source}",
        original.display(),
        temp.display()
    )]
    RebuildLeftOrphaned {
        original: PathBuf,
        temp: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn tool_failed(tool: impl Into<String>, exit_code: Option<i32>, detail: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.into(),
            exit_code,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("找不到可整除畫面寬度 {frame_width} 的縮圖寬度")]
    NoDivisorFound { frame_width: u32 },

    #[error("影片長度未知或為 0，無法生成預覽圖")]
    InvalidDuration,

    #[error("預覽圖生成失敗: {0}")]
    PreviewGenerationFailed(#[source] MediaError),

    #[error("無法寫入字幕檔 {}: {source}", path.display())]
    CueWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<MediaError> for PreviewError {
    fn from(err: MediaError) -> Self {
        Self::PreviewGenerationFailed(err)
    }
}

use crate::tools::QualityTier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 一部來源影片的紀錄
///
/// `duration`（秒）、`width`、`height` 為 0 代表未知。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAsset {
    pub id: u64,
    pub path: PathBuf,
    pub size: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub quality: Option<QualityTier>,
}

impl SourceAsset {
    /// 長度或尺寸未知，需要走修復流程
    #[must_use]
    pub const fn needs_probe(&self) -> bool {
        self.duration == 0 || self.width == 0 || self.height == 0 || self.quality.is_none()
    }

    /// 可以生成預覽圖
    #[must_use]
    pub const fn is_previewable(&self) -> bool {
        self.duration > 0 && self.height > 0 && self.width > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub path: PathBuf,
    pub size: u64,
}

/// 部分更新；`None` 的欄位維持原值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetUpdate {
    pub size: Option<u64>,
    pub duration: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<QualityTier>,
}

impl AssetUpdate {
    pub fn apply_to(&self, asset: &mut SourceAsset) {
        if let Some(size) = self.size {
            asset.size = size;
        }
        if let Some(duration) = self.duration {
            asset.duration = duration;
        }
        if let Some(width) = self.width {
            asset.width = width;
        }
        if let Some(height) = self.height {
            asset.height = height;
        }
        if let Some(quality) = self.quality {
            asset.quality = Some(quality);
        }
    }
}

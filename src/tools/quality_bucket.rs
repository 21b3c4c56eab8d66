use serde::{Deserialize, Serialize};
use std::fmt;

/// 舊擷取設備產生的異常高度，一律視為 480p
const LEGACY_CAPTURE_HEIGHT: u32 = 396;

/// 畫質等級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

/// 由高到低排列，距離相同時取較高的等級
const LADDER: [QualityTier; 4] = [
    QualityTier::P1080,
    QualityTier::P720,
    QualityTier::P480,
    QualityTier::P360,
];

impl QualityTier {
    #[must_use]
    pub const fn pixels(self) -> u32 {
        match self {
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P480 => 480,
            Self::P360 => 360,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.pixels())
    }
}

/// 將畫面高度對應到最接近的畫質等級
#[must_use]
pub fn bucket_quality(height: u32) -> QualityTier {
    if height == LEGACY_CAPTURE_HEIGHT {
        return QualityTier::P480;
    }

    let mut best = LADDER[0];
    for tier in LADDER.into_iter().skip(1) {
        if tier.pixels().abs_diff(height) < best.pixels().abs_diff(height) {
            best = tier;
        }
    }
    best
}

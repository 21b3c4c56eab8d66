use crate::error::PreviewError;

/// 縮圖寬度下限
pub const MIN_TILE_WIDTH: u32 = 20;

/// 每次放寬搜尋範圍的步長
const WIDEN_STEP: u32 = 10;

/// 縮圖寬度的搜尋範圍（含兩端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for WidthBounds {
    fn default() -> Self {
        Self { min: 120, max: 240 }
    }
}

impl WidthBounds {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// 往外放寬一步；上限不超過畫面寬度的一半，下限不低於 `MIN_TILE_WIDTH`
    const fn widen(self, half_width: u32) -> Self {
        let max = if self.max.saturating_add(WIDEN_STEP) < half_width {
            self.max + WIDEN_STEP
        } else {
            self.max
        };
        let min = if self.min > MIN_TILE_WIDTH + WIDEN_STEP {
            self.min - WIDEN_STEP
        } else {
            self.min
        };
        Self { min, max }
    }
}

/// 找出能整除畫面寬度的縮圖寬度
///
/// 在 `[min, max]` 內由大到小找第一個整除 `frame_width` 的值；找不到就放寬
/// 範圍後重試，兩端都無法再放寬時回傳 `NoDivisorFound`。
/// 結果一定落在 `[MIN_TILE_WIDTH, frame_width / 2]`。
pub fn solve_dividable_width(frame_width: u32, bounds: WidthBounds) -> Result<u32, PreviewError> {
    let half_width = frame_width / 2;
    let mut bounds = bounds;

    loop {
        if let Some(width) = largest_divisor_within(frame_width, bounds, half_width) {
            return Ok(width);
        }

        let widened = bounds.widen(half_width);
        if widened == bounds {
            return Err(PreviewError::NoDivisorFound { frame_width });
        }
        bounds = widened;
    }
}

fn largest_divisor_within(frame_width: u32, bounds: WidthBounds, half_width: u32) -> Option<u32> {
    let low = bounds.min.max(MIN_TILE_WIDTH);
    let high = bounds.max.min(half_width);
    if low > high {
        return None;
    }
    (low..=high).rev().find(|&width| frame_width % width == 0)
}

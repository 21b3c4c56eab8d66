//! 批次流程：修復（重建、probe、畫質分級）與預覽圖生成
//!
//! 每部影片獨立處理，失敗只記錄並計數，不會中斷整批。

mod driver;
mod main;
mod summary;

pub use main::{BatchOptions, run_generate_previews, run_probe_and_bucket, run_rebuild};
pub use summary::{BatchSummary, print_summary};

//! 容器重建元件
//!
//! 以 stream copy（不重新編碼）重新封裝影片，修復讀不出長度或尺寸的容器。
//! 先輸出到同目錄的暫存檔，成功後再以 rename 原子地取代原檔。

mod main;
mod remux_command;

pub use main::{CleanupStatus, RebuildReport, rebuild_container, sweep_stale_temps};
pub use remux_command::{REBUILD_TEMP_MARKER, RemuxCommand};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 設定 Ctrl-C 處理器，回傳共用的中斷旗標
///
/// 批次流程在每部影片之間檢查旗標，執行中的外部工具也會被終止。
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在安全關閉...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

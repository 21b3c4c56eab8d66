//! CLI 子命令與互動選單共用的執行入口

use crate::component::batch::{
    BatchOptions, BatchSummary, print_summary, run_generate_previews, run_probe_and_bucket,
    run_rebuild,
};
use crate::component::library_ingest::{IngestSummary, ingest_library};
use crate::component::range_server::{ServerState, serve_blocking};
use crate::config::Config;
use crate::store::JsonAssetStore;
use anyhow::{Context, Result};
use console::style;
use log::info;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn ingest(config: &Config) -> Result<IngestSummary> {
    if config.settings.library_dirs.is_empty() {
        println!("{}", style("尚未設定影片庫資料夾").yellow());
        return Ok(IngestSummary::default());
    }

    let mut store = JsonAssetStore::load(&config.settings.store_path)?;
    let summary = ingest_library(
        &mut store,
        &config.settings.library_dirs,
        &config.file_type_table,
        &config.settings.preview_dir,
    )?;

    println!();
    println!("{}", style("=== 影片庫同步結果 ===").cyan().bold());
    println!("  新增: {} 個", style(summary.added).green());
    println!("  移除: {} 個", style(summary.removed).yellow());
    println!("  更新: {} 個", style(summary.updated).yellow());
    println!("  未變更: {} 個", summary.unchanged);
    Ok(summary)
}

pub fn rebuild(config: &Config, shutdown: &Arc<AtomicBool>, all: bool) -> Result<BatchSummary> {
    let mut store = JsonAssetStore::load(&config.settings.store_path)?;
    let options = BatchOptions::from_config(config, Arc::clone(shutdown));
    let summary = run_rebuild(&mut store, &options, all)?;
    print_summary("容器重建結果", &summary);
    Ok(summary)
}

pub fn probe(config: &Config, shutdown: &Arc<AtomicBool>) -> Result<BatchSummary> {
    let mut store = JsonAssetStore::load(&config.settings.store_path)?;
    let options = BatchOptions::from_config(config, Arc::clone(shutdown));
    let summary = run_probe_and_bucket(&mut store, &options)?;
    print_summary("影片資訊修復結果", &summary);
    Ok(summary)
}

pub fn preview(config: &Config, shutdown: &Arc<AtomicBool>, force: bool) -> Result<BatchSummary> {
    let preview_dir = &config.settings.preview_dir;
    fs::create_dir_all(preview_dir)
        .with_context(|| format!("無法建立預覽圖資料夾: {}", preview_dir.display()))?;
    let mut store = JsonAssetStore::load(&config.settings.store_path)?;
    let options = BatchOptions::from_config(config, Arc::clone(shutdown));
    let summary = run_generate_previews(&mut store, &options, force)?;
    print_summary("預覽圖生成結果", &summary);
    Ok(summary)
}

/// 阻塞直到收到中斷訊號
pub fn serve(config: &Config, shutdown: &Arc<AtomicBool>, bind: Option<&str>) -> Result<()> {
    let bind = bind.unwrap_or(&config.settings.server.bind);
    info!("預覽檔目錄: {}", config.settings.preview_dir.display());
    println!(
        "{}",
        style(format!("伺服器啟動於 {bind}，按 Ctrl-C 停止")).green()
    );
    serve_blocking(
        ServerState::from_settings(&config.settings),
        bind,
        Arc::clone(shutdown),
    )
}

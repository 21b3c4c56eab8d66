use super::driver::{StepOutcome, drive};
use super::summary::BatchSummary;
use crate::component::container_rebuilder::rebuild_container;
use crate::component::preview_generator::{PreviewOptions, generate_preview, preview_paths};
use crate::config::Config;
use crate::error::MediaError;
use crate::store::{AssetStore, AssetUpdate, SourceAsset};
use crate::tools::{ToolConfig, VideoDimensions, bucket_quality, probe_dimensions};
use anyhow::Result;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 批次流程共用設定
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub tools: ToolConfig,
    pub jobs: usize,
    pub preview_dir: PathBuf,
    pub preview: PreviewOptions,
    pub shutdown: Arc<AtomicBool>,
}

impl BatchOptions {
    /// 外部工具會跟著中斷訊號一起終止
    #[must_use]
    pub fn from_config(config: &Config, shutdown: Arc<AtomicBool>) -> Self {
        let settings = &config.settings;
        Self {
            tools: settings.tools.tool_config().with_cancel(Arc::clone(&shutdown)),
            jobs: config.effective_jobs(),
            preview_dir: settings.preview_dir.clone(),
            preview: PreviewOptions::from_settings(settings),
            shutdown,
        }
    }
}

/// 重建容器
///
/// 預設只處理長度或尺寸未知的影片；`all` 為 true 時處理全部。
pub fn run_rebuild<S: AssetStore + ?Sized>(
    store: &mut S,
    options: &BatchOptions,
    all: bool,
) -> Result<BatchSummary> {
    let assets: Vec<SourceAsset> = store
        .list()
        .into_iter()
        .filter(|asset| all || asset.needs_probe())
        .collect();
    info!("重建容器: {} 部影片", assets.len());

    drive(
        store,
        &assets,
        options.jobs,
        &options.shutdown,
        "重建容器中...",
        |asset| {
            rebuild_container(&options.tools, &asset.path)?;
            Ok(StepOutcome::Updated(AssetUpdate {
                size: fs::metadata(&asset.path).ok().map(|m| m.len()),
                ..AssetUpdate::default()
            }))
        },
    )
}

/// 取得長度、尺寸並分級畫質
///
/// 已知長度與尺寸的影片不處理。probe 失敗時先重建容器再 probe 一次。
pub fn run_probe_and_bucket<S: AssetStore + ?Sized>(
    store: &mut S,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let assets: Vec<SourceAsset> = store
        .list()
        .into_iter()
        .filter(SourceAsset::needs_probe)
        .collect();
    info!("修復影片資訊: {} 部影片", assets.len());

    drive(
        store,
        &assets,
        options.jobs,
        &options.shutdown,
        "取得影片資訊中...",
        |asset| {
            let dimensions = probe_with_repair(&options.tools, asset)?;
            let quality = bucket_quality(dimensions.height);
            info!(
                "{}: {}s {}x{} -> {quality}",
                asset.path.display(),
                dimensions.duration,
                dimensions.width,
                dimensions.height
            );
            Ok(StepOutcome::Updated(AssetUpdate {
                size: fs::metadata(&asset.path).ok().map(|m| m.len()),
                duration: Some(dimensions.duration),
                width: Some(dimensions.width),
                height: Some(dimensions.height),
                quality: Some(quality),
            }))
        },
    )
}

fn probe_with_repair(tools: &ToolConfig, asset: &SourceAsset) -> Result<VideoDimensions, MediaError> {
    match probe_dimensions(tools, &asset.path) {
        Err(MediaError::ProbeFailed { reason, .. }) => {
            info!("無法讀取 {}（{reason}），重建容器後重試", asset.path.display());
            rebuild_container(tools, &asset.path)?;
            probe_dimensions(tools, &asset.path)
        }
        result => result,
    }
}

/// 產生預覽圖與字幕檔
///
/// 只處理長度與尺寸已知的影片；兩個檔案都已存在時跳過，除非 `force`。
pub fn run_generate_previews<S: AssetStore + ?Sized>(
    store: &mut S,
    options: &BatchOptions,
    force: bool,
) -> Result<BatchSummary> {
    let assets: Vec<SourceAsset> = store
        .list()
        .into_iter()
        .filter(SourceAsset::is_previewable)
        .collect();
    info!("產生預覽圖: {} 部影片", assets.len());

    drive(
        store,
        &assets,
        options.jobs,
        &options.shutdown,
        "產生預覽圖中...",
        |asset| {
            if !force && preview_paths(&options.preview_dir, asset.id).exists() {
                debug!("預覽圖已存在，跳過: {}", asset.path.display());
                return Ok(StepOutcome::Skipped);
            }
            generate_preview(&options.tools, asset, &options.preview_dir, &options.preview)?;
            Ok(StepOutcome::Completed)
        },
    )
}

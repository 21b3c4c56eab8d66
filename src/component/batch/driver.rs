use super::summary::BatchSummary;
use crate::store::{AssetStore, AssetUpdate, SourceAsset};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 單一影片的處理結果
#[derive(Debug)]
pub enum StepOutcome {
    /// 完成，並寫回紀錄
    Updated(AssetUpdate),
    Completed,
    Skipped,
}

/// 逐一（或以 `jobs` 條執行緒平行）處理影片
///
/// 紀錄的寫回在每部影片完成後進行，以 mutex 保護。
pub fn drive<S, F>(
    store: &mut S,
    assets: &[SourceAsset],
    jobs: usize,
    shutdown: &AtomicBool,
    message: &str,
    work: F,
) -> Result<BatchSummary>
where
    S: AssetStore + ?Sized,
    F: Fn(&SourceAsset) -> Result<StepOutcome> + Sync,
{
    let progress_bar = progress_bar(assets.len(), message);
    let summary = Mutex::new(BatchSummary {
        total: assets.len(),
        ..BatchSummary::default()
    });
    let store = Mutex::new(store);

    let handle = |asset: &SourceAsset| {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }

        let outcome = work(asset).and_then(|outcome| match outcome {
            StepOutcome::Updated(update) => lock(&store)
                .update(asset.id, update)
                .map(|()| StepOutcome::Completed),
            other => Ok(other),
        });

        let mut summary = lock(&summary);
        match outcome {
            Ok(StepOutcome::Skipped) => summary.skipped += 1,
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                error!("處理失敗 {}: {e:#}", asset.path.display());
                summary.failed += 1;
            }
        }
        progress_bar.inc(1);
    };

    if jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("無法建立執行緒池")?;
        pool.install(|| assets.par_iter().for_each(handle));
    } else {
        assets.iter().for_each(handle);
    }

    if shutdown.load(Ordering::SeqCst) {
        warn!("收到中斷訊號，停止處理");
        progress_bar.abandon_with_message("操作已中斷");
    } else {
        progress_bar.finish_with_message("完成");
    }

    Ok(summary.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn progress_bar(len: usize, message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(len as u64);
    if let Ok(progress_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        progress_bar.set_style(progress_style.progress_chars("#>-"));
    }
    progress_bar.set_message(message.to_string());
    progress_bar
}

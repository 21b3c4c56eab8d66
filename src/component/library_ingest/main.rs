use crate::component::preview_generator::preview_paths;
use crate::config::FileTypeTable;
use crate::store::{AssetStore, AssetUpdate, NewAsset};
use crate::tools::scan_video_files;
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// 同步影片庫與紀錄
///
/// - 新檔案加入紀錄，長度與尺寸未知
/// - 檔案已不存在的紀錄刪除
/// - 大小改變的檔案重設長度與尺寸，之後重新 probe
///
/// 被移除或大小改變的紀錄，其預覽圖與 cue 檔一併刪除，
/// 下次批次產生預覽時不會被當成已完成而略過。
pub fn ingest_library<S: AssetStore + ?Sized>(
    store: &mut S,
    library_dirs: &[PathBuf],
    file_type_table: &FileTypeTable,
    preview_dir: &Path,
) -> Result<IngestSummary> {
    let mut found: BTreeMap<PathBuf, u64> = BTreeMap::new();
    for dir in library_dirs {
        if !dir.is_dir() {
            warn!("影片庫資料夾不存在，略過: {}", dir.display());
            continue;
        }
        let files = scan_video_files(dir, file_type_table);
        debug!("{}: {} 個影片檔", dir.display(), files.len());
        found.extend(files.into_iter().map(|f| (f.path, f.size)));
    }

    let mut summary = IngestSummary::default();

    for asset in store.list() {
        if !asset.path.is_file() {
            info!("檔案已刪除，移除紀錄: {}", asset.path.display());
            store.remove(asset.id)?;
            discard_previews(preview_dir, asset.id);
            summary.removed += 1;
            continue;
        }

        let Some(size) = found.remove(&asset.path) else {
            summary.unchanged += 1;
            continue;
        };

        if size == asset.size {
            summary.unchanged += 1;
        } else {
            debug!("檔案大小改變: {}", asset.path.display());
            store.update(
                asset.id,
                AssetUpdate {
                    size: Some(size),
                    duration: Some(0),
                    width: Some(0),
                    height: Some(0),
                    ..AssetUpdate::default()
                },
            )?;
            discard_previews(preview_dir, asset.id);
            summary.updated += 1;
        }
    }

    for (path, size) in found {
        debug!("新增紀錄: {}", path.display());
        store.insert(NewAsset { path, size })?;
        summary.added += 1;
    }

    info!(
        "影片庫同步完成: 新增 {}，移除 {}，更新 {}",
        summary.added, summary.removed, summary.updated
    );
    Ok(summary)
}

fn discard_previews(preview_dir: &Path, id: u64) {
    let paths = preview_paths(preview_dir, id);
    if let Err(e) = paths.remove() {
        warn!("無法刪除過期的預覽 {}: {e}", paths.sprite.display());
    }
}

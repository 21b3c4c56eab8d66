use crate::store::{AssetStore, AssetUpdate, NewAsset, SourceAsset};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    assets: Vec<SourceAsset>,
}

/// 以 JSON 檔保存的紀錄，每次異動後立即寫回
#[derive(Debug)]
pub struct JsonAssetStore {
    path: PathBuf,
    next_id: u64,
    assets: BTreeMap<u64, SourceAsset>,
}

impl JsonAssetStore {
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("無法讀取紀錄檔: {}", path.display()))?;
            if content.trim().is_empty() {
                StoreFile::default()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("無法解析紀錄檔: {}", path.display()))?
            }
        } else {
            StoreFile::default()
        };

        let assets: BTreeMap<u64, SourceAsset> =
            file.assets.into_iter().map(|a| (a.id, a)).collect();
        let next_id = assets
            .keys()
            .next_back()
            .map_or(1, |max| max + 1)
            .max(file.next_id);

        Ok(Self {
            path: path.to_path_buf(),
            next_id,
            assets,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<&SourceAsset> {
        self.assets.values().find(|a| a.path == path)
    }

    fn save(&self) -> Result<()> {
        let file = StoreFile {
            next_id: self.next_id,
            assets: self.assets.values().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file).context("無法序列化紀錄")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("無法建立目錄: {}", parent.display()))?;
        }

        // 先寫暫存檔再改名，避免寫到一半時被讀取
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("無法寫入紀錄檔: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("無法寫入紀錄檔: {}", self.path.display()))?;

        Ok(())
    }
}

impl AssetStore for JsonAssetStore {
    fn list(&self) -> Vec<SourceAsset> {
        self.assets.values().cloned().collect()
    }

    fn get(&self, id: u64) -> Option<SourceAsset> {
        self.assets.get(&id).cloned()
    }

    fn update(&mut self, id: u64, update: AssetUpdate) -> Result<()> {
        let Some(asset) = self.assets.get_mut(&id) else {
            bail!("找不到影片紀錄: {id}");
        };
        update.apply_to(asset);
        self.save()
    }

    fn insert(&mut self, asset: NewAsset) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;
        self.assets.insert(
            id,
            SourceAsset {
                id,
                path: asset.path,
                size: asset.size,
                duration: 0,
                width: 0,
                height: 0,
                quality: None,
            },
        );
        self.save()?;
        Ok(id)
    }

    fn remove(&mut self, id: u64) -> Result<()> {
        if self.assets.remove(&id).is_none() {
            bail!("找不到影片紀錄: {id}");
        }
        self.save()
    }
}

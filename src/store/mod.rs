//! 影片紀錄儲存
//!
//! 預覽與修復流程只需要讀取路徑、長度、尺寸，並寫回修正後的數值；
//! 實際的紀錄管理由外部系統負責，這裡以 [`AssetStore`] 抽象。

mod asset;
mod json_store;

pub use asset::{AssetUpdate, NewAsset, SourceAsset};
pub use json_store::JsonAssetStore;

use anyhow::Result;

pub trait AssetStore: Send {
    fn list(&self) -> Vec<SourceAsset>;
    fn get(&self, id: u64) -> Option<SourceAsset>;
    fn update(&mut self, id: u64, update: AssetUpdate) -> Result<()>;
    fn insert(&mut self, asset: NewAsset) -> Result<u64>;
    fn remove(&mut self, id: u64) -> Result<()>;
}

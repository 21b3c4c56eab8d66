use crate::config::FileTypeTable;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 遞迴掃描資料夾中的影片檔，依路徑排序
///
/// 以 `.` 開頭的檔案（例如重建容器時的暫存檔）不列入。
#[must_use]
pub fn scan_video_files(directory: &Path, file_type_table: &FileTypeTable) -> Vec<VideoFileInfo> {
    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter(|entry| file_type_table.is_video_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    video_files
}

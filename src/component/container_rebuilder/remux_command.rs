use std::ffi::OsString;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 暫存檔名中的標記：`.<stem>.<uuid>.rebuild.<ext>`
pub const REBUILD_TEMP_MARKER: &str = ".rebuild.";

pub struct RemuxCommand {
    source_path: PathBuf,
    temp_path: PathBuf,
}

impl RemuxCommand {
    #[must_use]
    pub fn new(source_path: &Path) -> Self {
        let temp_path = Self::generate_temp_path(source_path);
        Self {
            source_path: source_path.to_path_buf(),
            temp_path,
        }
    }

    /// 與原檔同目錄、同副檔名的隱藏暫存檔，讓 ffmpeg 選用相同的容器格式
    fn generate_temp_path(source_path: &Path) -> PathBuf {
        let file_stem = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let parent = source_path.parent().unwrap_or(Path::new("."));
        let suffix = Uuid::new_v4().simple();

        let name = match source_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{file_stem}.{suffix}{REBUILD_TEMP_MARKER}{ext}"),
            None => format!(".{file_stem}.{suffix}{}", REBUILD_TEMP_MARKER.trim_end_matches('.')),
        };
        parent.join(name)
    }

    /// 判斷檔名是否為指定原檔留下的暫存檔
    ///
    /// 只接受 `.<stem>.<32 位小寫十六進位>.rebuild.<ext>`，
    /// 避免 `a.mp4` 誤刪 `a.b.mp4` 的暫存檔。
    #[must_use]
    pub fn is_temp_of(source_path: &Path, candidate: &Path) -> bool {
        let Some(stem) = source_path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let suffix = match source_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{REBUILD_TEMP_MARKER}{ext}"),
            None => REBUILD_TEMP_MARKER.trim_end_matches('.').to_string(),
        };

        let Some(id) = name
            .strip_prefix('.')
            .and_then(|rest| rest.strip_prefix(stem))
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
        else {
            return false;
        };
        is_simple_uuid(id)
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// 只複製視訊與音訊串流，不重新編碼
    #[must_use]
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-nostdin",
            "-loglevel", "error",
            "-i",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(self.source_path.clone().into_os_string());
        args.extend(
            [
                "-map", "0:v",
                "-map", "0:a?",
                "-c", "copy",
                "-y",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(self.temp_path.clone().into_os_string());
        args
    }
}

fn is_simple_uuid(id: &str) -> bool {
    id.len() == uuid::fmt::Simple::LENGTH
        && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_hidden_sibling_with_same_extension() {
        let cmd = RemuxCommand::new(Path::new("/videos/test.video.mp4"));
        let temp = cmd.temp_path();
        assert_eq!(temp.parent(), Some(Path::new("/videos")));
        let name = temp.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".test.video."));
        assert!(name.ends_with(".rebuild.mp4"));
        assert!(RemuxCommand::is_temp_of(Path::new("/videos/test.video.mp4"), temp));
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let a = RemuxCommand::new(Path::new("/videos/a.mkv"));
        let b = RemuxCommand::new(Path::new("/videos/a.mkv"));
        assert_ne!(a.temp_path(), b.temp_path());
    }

    #[test]
    fn test_is_temp_of_rejects_other_files() {
        let source = Path::new("/videos/a.mp4");
        assert!(!RemuxCommand::is_temp_of(source, Path::new("/videos/a.mp4")));
        assert!(!RemuxCommand::is_temp_of(source, Path::new("/videos/.b.123.rebuild.mp4")));
        assert!(!RemuxCommand::is_temp_of(source, Path::new("/videos/.a.123.rebuild.mkv")));
        assert!(!RemuxCommand::is_temp_of(source, Path::new("/videos/.a.123.rebuild.mp4")));
        assert!(!RemuxCommand::is_temp_of(
            source,
            Path::new("/videos/.a.0123456789ABCDEF0123456789ABCDEF.rebuild.mp4")
        ));
        assert!(RemuxCommand::is_temp_of(
            source,
            Path::new("/videos/.a.0123456789abcdef0123456789abcdef.rebuild.mp4")
        ));
    }

    #[test]
    fn test_is_temp_of_ignores_sibling_with_dotted_stem() {
        let sibling = RemuxCommand::new(Path::new("/videos/a.b.mp4"));
        assert!(!RemuxCommand::is_temp_of(Path::new("/videos/a.mp4"), sibling.temp_path()));
        assert!(RemuxCommand::is_temp_of(Path::new("/videos/a.b.mp4"), sibling.temp_path()));
    }

    #[test]
    fn test_is_temp_of_without_extension() {
        let cmd = RemuxCommand::new(Path::new("/videos/clip"));
        assert!(RemuxCommand::is_temp_of(Path::new("/videos/clip"), cmd.temp_path()));
        assert!(!RemuxCommand::is_temp_of(Path::new("/videos/clip.mp4"), cmd.temp_path()));
    }

    #[test]
    fn test_build_args_stream_copy_into_temp() {
        let cmd = RemuxCommand::new(Path::new("/videos/a.mp4"));
        let args = cmd.build_args();
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input + 1], "/videos/a.mp4");
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:a?"));
        assert_eq!(args.last().unwrap(), &cmd.temp_path().to_string_lossy().into_owned());
    }
}

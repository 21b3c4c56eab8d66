use log::{debug, error};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

const NOT_FOUND_BODY: &str = "404 Not Found";

/// 只支援 `bytes=<start>-`，其他格式一律從 0 開始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeRequest {
    pub start: u64,
}

impl RangeRequest {
    #[must_use]
    pub fn parse(header: Option<&str>) -> Self {
        let Some(raw) = header else {
            return Self::default();
        };
        match parse_open_ended(raw) {
            Some(start) => Self { start },
            None => {
                debug!("無法解析 Range 標頭 {raw:?}，從頭開始");
                Self::default()
            }
        }
    }
}

fn parse_open_ended(raw: &str) -> Option<u64> {
    let start = raw.trim().strip_prefix("bytes=")?.strip_suffix('-')?;
    if start.is_empty() || !start.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    start.parse().ok()
}

/// 與傳輸層無關的回應，由 HTTP 前端轉成實際的 response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl RangeResponse {
    /// 標頭名稱不分大小寫
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::plain(404, NOT_FOUND_BODY)
    }

    #[must_use]
    pub fn internal_error() -> Self {
        Self::plain(500, "500 Internal Server Error")
    }

    fn plain(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "text/plain".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }
}

/// 回傳檔案中從 Range 起點開始、最多 `chunk_size` 位元組的內容
///
/// 一律回 206，播放器依 `Content-Range` 繼續往後要資料。
/// 起點超出檔案大小時從 0 開始。
#[must_use]
pub fn serve_range(path: &Path, range_header: Option<&str>, chunk_size: u64) -> RangeResponse {
    if !path.is_file() {
        debug!("檔案不存在: {}", path.display());
        return RangeResponse::not_found();
    }

    match read_chunk(path, RangeRequest::parse(range_header), chunk_size) {
        Ok(response) => response,
        Err(e) if e.kind() == ErrorKind::NotFound => RangeResponse::not_found(),
        Err(e) => {
            error!("讀取檔案失敗 {}: {e}", path.display());
            RangeResponse::internal_error()
        }
    }
}

fn read_chunk(path: &Path, range: RangeRequest, chunk_size: u64) -> std::io::Result<RangeResponse> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    if size == 0 {
        return Ok(RangeResponse {
            status: 206,
            headers: vec![
                ("Accept-Ranges", "bytes".to_string()),
                ("Content-Range", "bytes */0".to_string()),
                ("Content-Length", "0".to_string()),
                ("Content-Type", content_type),
            ],
            body: Vec::new(),
        });
    }

    let start = if range.start >= size {
        debug!("Range 起點 {} 超出檔案大小 {size}，從頭開始", range.start);
        0
    } else {
        range.start
    };
    let end = start
        .saturating_add(chunk_size.max(1) - 1)
        .min(size - 1);
    let length = end - start + 1;

    file.seek(SeekFrom::Start(start))?;
    let mut body = vec![0; usize::try_from(length).map_err(std::io::Error::other)?];
    file.read_exact(&mut body)?;

    Ok(RangeResponse {
        status: 206,
        headers: vec![
            ("Accept-Ranges", "bytes".to_string()),
            ("Content-Range", format!("bytes {start}-{end}/{size}")),
            ("Content-Length", length.to_string()),
            ("Content-Type", content_type),
        ],
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_file(dir: &TempDir, name: &str, len: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_parse_open_ended_range() {
        assert_eq!(RangeRequest::parse(Some("bytes=100-")).start, 100);
        assert_eq!(RangeRequest::parse(Some(" bytes=0- ")).start, 0);
        assert_eq!(RangeRequest::parse(None).start, 0);
    }

    #[test]
    fn test_parse_unsupported_forms_fall_back_to_zero() {
        for raw in [
            "bytes=100-200",
            "bytes=-500",
            "bytes=0-10,20-",
            "bytes=abc-",
            "bytes=-",
            "items=5-",
            "garbage",
            "",
        ] {
            assert_eq!(RangeRequest::parse(Some(raw)).start, 0, "{raw}");
        }
    }

    #[test]
    fn test_chunk_from_start_offset() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, "clip.mp4", 1000);

        let response = serve_range(&path, Some("bytes=100-"), 10);

        assert_eq!(response.status, 206);
        assert_eq!(response.header("content-range"), Some("bytes 100-109/1000"));
        assert_eq!(response.header("Content-Length"), Some("10"));
        assert_eq!(response.header("Accept-Ranges"), Some("bytes"));
        assert_eq!(response.header("Content-Type"), Some("video/mp4"));
        let expected: Vec<u8> = (100..110).map(|i| (i % 251) as u8).collect();
        assert_eq!(response.body, expected);
    }

    #[test]
    fn test_chunk_is_cut_at_end_of_file() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, "clip.mp4", 1000);

        let response = serve_range(&path, Some("bytes=995-"), 10);

        assert_eq!(response.header("Content-Range"), Some("bytes 995-999/1000"));
        assert_eq!(response.body.len(), 5);
    }

    #[test]
    fn test_start_past_end_restarts_at_zero() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, "clip.mp4", 1000);

        let response = serve_range(&path, Some("bytes=5000-"), 10);

        assert_eq!(response.status, 206);
        assert_eq!(response.header("Content-Range"), Some("bytes 0-9/1000"));
    }

    #[test]
    fn test_missing_file_is_not_found_for_any_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.mp4");
        for range in [None, Some("bytes=0-"), Some("bytes=100-"), Some("junk")] {
            let response = serve_range(&path, range, 10);
            assert_eq!(response.status, 404);
            assert_eq!(response.header("Content-Type"), Some("text/plain"));
            assert_eq!(response.body, b"404 Not Found");
        }
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert_eq!(serve_range(dir.path(), None, 10).status, 404);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, "empty.mkv", 0);

        let response = serve_range(&path, Some("bytes=0-"), 10);

        assert_eq!(response.status, 206);
        assert_eq!(response.header("Content-Range"), Some("bytes */0"));
        assert!(response.body.is_empty());
    }
}

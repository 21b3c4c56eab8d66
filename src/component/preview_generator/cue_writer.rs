use super::sprite_sheet::{SpriteRect, SpriteSheet};
use crate::error::PreviewError;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// 一段時間區間對應的縮圖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    /// 從 1 開始
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub rect: SpriteRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTrack {
    pub sprite_url: String,
    pub cues: Vec<Cue>,
}

impl CueTrack {
    /// 輸出 WebVTT 文字
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("WEBVTT\n");
        for cue in &self.cues {
            let SpriteRect { x, y, w, h } = cue.rect;
            let _ = write!(
                out,
                "\n{}\n{} --> {}\n{}#xywh={x},{y},{w},{h}\n",
                cue.index,
                format_timestamp(cue.start_ms),
                format_timestamp(cue.end_ms),
                self.sprite_url,
            );
        }
        out
    }
}

/// 依預覽圖實際網格產生字幕區段
///
/// 以整數毫秒切分 `[0, duration]`：第 k 個邊界為 `k * duration_ms / n`，
/// 相鄰區段首尾相接，最後一段剛好結束在影片長度。
#[must_use]
pub fn synthesize_cues(duration: u64, sheet: &SpriteSheet, sprite_url: &str) -> CueTrack {
    let count = sheet.tile_count().max(1);
    let total_ms = duration.saturating_mul(1000);
    let boundary = |k: u32| -> u64 {
        let ms = u128::from(total_ms) * u128::from(k) / u128::from(count);
        u64::try_from(ms).unwrap_or(total_ms)
    };

    let cues = (0..count)
        .map(|i| Cue {
            index: i + 1,
            start_ms: boundary(i),
            end_ms: boundary(i + 1),
            rect: sheet.tile_rect(i),
        })
        .collect();

    CueTrack {
        sprite_url: sprite_url.to_string(),
        cues,
    }
}

/// 先寫暫存檔再改名，播放器不會讀到寫一半的檔案
pub fn write_cue_file(path: &Path, track: &CueTrack) -> Result<(), PreviewError> {
    let temp_path = path.with_extension("vtt.tmp");
    let cue_write_failed = |source| PreviewError::CueWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&temp_path, track.render()).map_err(cue_write_failed)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(cue_write_failed(e));
    }
    Ok(())
}

/// `HH:MM:SS.mmm`
#[must_use]
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sheet(rows: u32, cols: u32) -> SpriteSheet {
        SpriteSheet {
            path: PathBuf::from("1.jpg"),
            rows,
            cols,
            tile_width: 160,
            tile_height: 90,
            image_width: 160 * cols,
            image_height: 90 * rows,
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(4_000), "00:00:04.000");
        assert_eq!(format_timestamp(3_723_456), "01:02:03.456");
    }

    #[test]
    fn test_cues_partition_duration() {
        let track = synthesize_cues(100, &sheet(5, 5), "/previews/1.jpg");
        assert_eq!(track.cues.len(), 25);
        assert_eq!(track.cues[0].start_ms, 0);
        assert_eq!(track.cues[0].end_ms, 4_000);
        for pair in track.cues.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
        assert_eq!(track.cues.last().unwrap().end_ms, 100_000);
    }

    #[test]
    fn test_uneven_duration_has_no_drift() {
        let track = synthesize_cues(7, &sheet(1, 3), "s.jpg");
        let bounds: Vec<_> = track.cues.iter().map(|c| (c.start_ms, c.end_ms)).collect();
        assert_eq!(bounds, vec![(0, 2_333), (2_333, 4_666), (4_666, 7_000)]);
    }

    #[test]
    fn test_render_webvtt() {
        let track = synthesize_cues(8, &sheet(1, 2), "/previews/3.jpg");
        let expected = "WEBVTT\n\
            \n1\n00:00:00.000 --> 00:00:04.000\n/previews/3.jpg#xywh=0,0,160,90\n\
            \n2\n00:00:04.000 --> 00:00:08.000\n/previews/3.jpg#xywh=160,0,160,90\n";
        assert_eq!(track.render(), expected);
    }

    #[test]
    fn test_write_cue_file_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.vtt");
        let track = synthesize_cues(10, &sheet(1, 2), "1.jpg");

        write_cue_file(&path, &track).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), track.render());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_cue_file_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/1.vtt");
        let track = synthesize_cues(10, &sheet(1, 2), "1.jpg");
        assert!(matches!(
            write_cue_file(&path, &track),
            Err(PreviewError::CueWriteFailed { .. })
        ));
    }
}

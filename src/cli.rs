use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "video_preview_kit")]
#[command(version, about = "影片預覽圖與 Range 串流工具")]
pub struct Cli {
    /// 設定檔路徑（預設 settings.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 同時處理的影片數量，覆寫設定檔
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// 不指定時開啟互動選單
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// 掃描影片庫並更新紀錄
    Ingest,

    /// 重新封裝影片容器
    Rebuild {
        /// 處理全部影片，而非只有資訊未知的影片
        #[arg(long)]
        all: bool,
    },

    /// 取得長度與尺寸並分級畫質
    Probe,

    /// 產生預覽圖與 WebVTT
    Preview {
        /// 已存在也重新產生
        #[arg(long)]
        force: bool,
    },

    /// 啟動 HTTP 伺服器
    Serve {
        /// 監聽位址，覆寫設定檔
        #[arg(long)]
        bind: Option<String>,
    },
}

mod ffprobe_info;
mod quality_bucket;
mod tool_runner;
mod video_scanner;
mod width_solver;

pub use ffprobe_info::{VideoDimensions, probe_dimensions, probe_image_size};
pub use quality_bucket::{QualityTier, bucket_quality};
pub use tool_runner::{
    DEFAULT_TOOL_TIMEOUT, ToolConfig, ToolOutput, run_ffmpeg, run_ffprobe, run_tool,
};
pub use video_scanner::{VideoFileInfo, scan_video_files};
pub use width_solver::{MIN_TILE_WIDTH, WidthBounds, solve_dividable_width};

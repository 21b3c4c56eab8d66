pub mod load;
pub mod save;
pub mod types;

pub use save::save_settings;
pub use types::{
    Config, DEFAULT_CHUNK_SIZE, FileTypeTable, ServerSettings, Settings, SpriteSettings,
    ToolSettings,
};

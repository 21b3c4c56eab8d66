mod cue_writer;
mod main;
mod sprite_sheet;

pub use cue_writer::{Cue, CueTrack, format_timestamp, synthesize_cues, write_cue_file};
pub use main::{PreviewOptions, PreviewOutput, PreviewPaths, generate_preview, preview_paths};
pub use sprite_sheet::{
    SpriteGrid, SpriteRect, SpriteRequest, SpriteSheet, generate_sprite_sheet, plan_grid,
};

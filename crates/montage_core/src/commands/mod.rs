//! Command construction for the external media tools.

mod builder;

pub use builder::{
    drawtext_caption, filelist_content, AudioBackdrop, FfmpegCommandBuilder, TransformCommand,
};

//! Audio module: decoded PCM buffers, the ffmpeg codec and the final MP3 export.

mod buffer;
pub mod codec;
mod writer;

pub use buffer::{AudioBuffer, CombinedAudio};
pub use codec::{AudioCodec, FfmpegCodec};
pub use writer::{persist_artifact, write_output};

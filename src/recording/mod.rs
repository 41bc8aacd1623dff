//! Recording lifecycle: state machine, strategies, and writer plumbing
//!
//! Two independent strategies implement the recording state: the direct-file
//! strategy hands encoding to an opaque movie-file backend, and the
//! writer-based strategy forwards raw frames to an external frame writer.
//! Exactly one strategy is active per recording session.

mod config;
mod direct;
mod session;
mod state;
mod writer;

#[cfg(feature = "recording")]
mod encoder;
#[cfg(feature = "recording")]
mod movie;

pub use config::{RecordingConfig, RecordingQuality, RecordingStats};
pub use direct::{DirectCompletion, DirectFileSink, MovieFileOutput};
pub use session::{
    default_output_path, remove_stale_recording, RecordingSession, RecordingStrategy,
    RECORDED_FILE_NAME,
};
pub use state::{RecordingPhase, RecordingState};
pub use writer::{FrameWriter, WriterDelegate, WriterSlot};

#[cfg(feature = "recording")]
pub use encoder::{EncodedFrame, H264Encoder};
#[cfg(feature = "recording")]
pub use movie::MovieWriter;

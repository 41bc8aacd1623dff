//! Testing utilities: synthetic capture data and mock collaborators
//!
//! Everything here runs without hardware, so the pipeline can be exercised
//! offline in unit tests, integration tests, and the demo binary.

mod mocks;
mod synthetic;

pub use mocks::{
    FixedOrientation, MockDeviceProvider, MockMovieOutput, MockRequester, NullFaceConsumer,
    NullPlayback, RecordingFaceConsumer, RecordingPlayback, RecordingWriter, ScriptedRecovery,
    WriterLog, WriterLogEntry,
};
pub use synthetic::{synthetic_audio_frame, synthetic_face_region, synthetic_video_frame};

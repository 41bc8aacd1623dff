//! Frame-writer collaborator interface for the writer-based strategy
//!
//! The writer is opaque to this crate: it receives ordered video/audio
//! buffers and a stop signal, and reports completion through a delegate set
//! immediately before stopping.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::errors::CaptureError;
use crate::types::{AudioFrame, VideoFrame};

/// Receives the writer's completion result after `stop`
pub trait WriterDelegate: Send + Sync {
    fn writer_did_finish(&self, result: Result<PathBuf, CaptureError>);
}

/// External encoder/muxer receiving ordered sample buffers
///
/// Both streams carry timestamps from the shared capture clock, so an
/// implementation may interleave them on one time base.
pub trait FrameWriter: Send {
    fn write_video(&mut self, frame: &VideoFrame) -> Result<(), CaptureError>;
    fn write_audio(&mut self, frame: &AudioFrame) -> Result<(), CaptureError>;

    /// Install the completion delegate; the core sets this before stopping
    fn set_delegate(&mut self, delegate: Arc<dyn WriterDelegate>);

    /// Finalize and flush; the result arrives through the delegate
    fn stop(&mut self);
}

/// Shared slot holding the active frame writer
///
/// Frame-delivery queues write through the slot while the camera queue
/// installs and removes writers. Taking the writer out for finalization waits
/// for any in-flight write to finish, so a finalize never races a write.
pub struct WriterSlot {
    inner: Mutex<Option<Box<dyn FrameWriter>>>,
}

impl WriterSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Install a writer for a new recording segment
    pub fn install(&self, writer: Box<dyn FrameWriter>) {
        let mut slot = self.inner.lock().expect("writer slot lock poisoned");
        if slot.is_some() {
            log::warn!("replacing an active frame writer that was never finalized");
        }
        *slot = Some(writer);
    }

    /// Remove the writer, leaving the slot empty
    pub fn take(&self) -> Option<Box<dyn FrameWriter>> {
        self.inner.lock().expect("writer slot lock poisoned").take()
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .lock()
            .expect("writer slot lock poisoned")
            .is_some()
    }

    /// Forward a video frame to the installed writer, if any
    pub fn write_video(&self, frame: &VideoFrame) -> Result<(), CaptureError> {
        if let Some(writer) = self
            .inner
            .lock()
            .expect("writer slot lock poisoned")
            .as_mut()
        {
            writer.write_video(frame)?;
        }
        Ok(())
    }

    /// Forward an audio frame to the installed writer, if any
    pub fn write_audio(&self, frame: &AudioFrame) -> Result<(), CaptureError> {
        if let Some(writer) = self
            .inner
            .lock()
            .expect("writer slot lock poisoned")
            .as_mut()
        {
            writer.write_audio(frame)?;
        }
        Ok(())
    }
}

impl Default for WriterSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WriterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}

//! Output sinks attached to a capture session
//!
//! Each sink consumes one category of captured data and delivers it on a
//! single, fixed serial queue assigned at attach time. Hardware-driven
//! producers push concurrently; the queues serialize per-category handling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::orientation::VideoConnection;
use crate::queues::SerialQueue;
use crate::types::{AudioFrame, FaceRegion, MetadataKind, MetadataObject, VideoFrame};

type VideoHandler = Arc<dyn Fn(VideoFrame) + Send + Sync>;
type AudioHandler = Arc<dyn Fn(AudioFrame) + Send + Sync>;
type MetadataHandler = Arc<dyn Fn(Vec<FaceRegion>) + Send + Sync>;

/// Receives captured video frames on the output queue
///
/// With `discards_late_frames` set, a frame arriving while the previous one is
/// still being handled is dropped instead of queued: bounded staleness is
/// preferred over frame count.
pub struct VideoFrameSink {
    queue: Arc<SerialQueue>,
    handler: VideoHandler,
    discards_late_frames: bool,
    dropped: AtomicU64,
    connection: Arc<VideoConnection>,
}

impl VideoFrameSink {
    pub fn new<F>(queue: Arc<SerialQueue>, discards_late_frames: bool, handler: F) -> Self
    where
        F: Fn(VideoFrame) + Send + Sync + 'static,
    {
        Self {
            queue,
            handler: Arc::new(handler),
            discards_late_frames,
            dropped: AtomicU64::new(0),
            connection: Arc::new(VideoConnection::new(true)),
        }
    }

    /// The frame-delivery connection carrying orientation/mirroring state
    pub fn connection(&self) -> &Arc<VideoConnection> {
        &self.connection
    }

    pub fn deliver(&self, frame: VideoFrame) {
        if self.discards_late_frames && self.queue.pending() > 0 {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!("video sink backed up, dropped frame ({} total)", dropped);
            return;
        }
        let handler = self.handler.clone();
        self.queue.dispatch(move || handler(frame));
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn queue(&self) -> &Arc<SerialQueue> {
        &self.queue
    }
}

/// Receives captured audio buffers on the audio queue
pub struct AudioFrameSink {
    queue: Arc<SerialQueue>,
    handler: AudioHandler,
}

impl AudioFrameSink {
    pub fn new<F>(queue: Arc<SerialQueue>, handler: F) -> Self
    where
        F: Fn(AudioFrame) + Send + Sync + 'static,
    {
        Self {
            queue,
            handler: Arc::new(handler),
        }
    }

    pub fn deliver(&self, frame: AudioFrame) {
        let handler = self.handler.clone();
        self.queue.dispatch(move || handler(frame));
    }

    pub fn queue(&self) -> &Arc<SerialQueue> {
        &self.queue
    }
}

/// Receives face-region metadata on the session queue
///
/// The sink is filtered: only `MetadataKind::Face` objects pass through, the
/// rest are discarded before dispatch.
pub struct FaceMetadataSink {
    queue: Arc<SerialQueue>,
    handler: MetadataHandler,
}

impl FaceMetadataSink {
    pub fn new<F>(queue: Arc<SerialQueue>, handler: F) -> Self
    where
        F: Fn(Vec<FaceRegion>) + Send + Sync + 'static,
    {
        Self {
            queue,
            handler: Arc::new(handler),
        }
    }

    pub fn deliver(&self, objects: Vec<MetadataObject>) {
        let faces: Vec<FaceRegion> = objects
            .into_iter()
            .filter(|o| o.kind == MetadataKind::Face)
            .filter_map(|o| o.face)
            .collect();
        if faces.is_empty() {
            return;
        }
        let handler = self.handler.clone();
        self.queue.dispatch(move || handler(faces));
    }

    pub fn queue(&self) -> &Arc<SerialQueue> {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedRect;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    fn frame(ts: f64) -> VideoFrame {
        VideoFrame::new(vec![0u8; 12], 2, 2, ts, "cam0".to_string())
    }

    #[test]
    fn test_video_sink_delivers_on_its_queue() {
        let queue = Arc::new(SerialQueue::new("test-video"));
        let on_queue = Arc::new(AtomicUsize::new(0));
        let observed = on_queue.clone();
        let check = queue.clone();
        let sink = VideoFrameSink::new(queue.clone(), false, move |_frame| {
            if check.is_current() {
                observed.fetch_add(1, Ordering::SeqCst);
            }
        });

        sink.deliver(frame(0.0));
        queue.dispatch_sync(|| {});
        assert_eq!(on_queue.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_video_sink_discards_late_frames() {
        let queue = Arc::new(SerialQueue::new("test-late"));
        let handled = Arc::new(AtomicUsize::new(0));
        let h = handled.clone();
        let sink = VideoFrameSink::new(queue.clone(), true, move |_frame| {
            thread::sleep(Duration::from_millis(50));
            h.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..10 {
            sink.deliver(frame(i as f64));
        }
        queue.dispatch_sync(|| {});

        assert!(sink.dropped_frames() > 0, "stale frames must be dropped");
        assert!(
            handled.load(Ordering::SeqCst) < 10,
            "not every frame should have been handled"
        );
    }

    #[test]
    fn test_metadata_sink_filters_to_faces() {
        let queue = Arc::new(SerialQueue::new("test-meta"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let sink = FaceMetadataSink::new(queue.clone(), move |faces| {
            s.lock().unwrap().extend(faces);
        });

        let face = FaceRegion {
            bounds: NormalizedRect::new(0.1, 0.1, 0.3, 0.3),
            tracking_id: Some(7),
            timestamp: 0.5,
        };
        sink.deliver(vec![
            MetadataObject::face(face.clone()),
            MetadataObject {
                kind: MetadataKind::Barcode,
                face: None,
            },
        ]);
        queue.dispatch_sync(|| {});

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].tracking_id, Some(7));
    }

    #[test]
    fn test_metadata_sink_skips_empty_batches() {
        let queue = Arc::new(SerialQueue::new("test-meta-empty"));
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sink = FaceMetadataSink::new(queue.clone(), move |_faces| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sink.deliver(vec![MetadataObject {
            kind: MetadataKind::Text,
            face: None,
        }]);
        queue.dispatch_sync(|| {});
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

//! Serial dispatch queues for the capture pipeline
//!
//! The pipeline runs on five independent serial queues so that frame delivery
//! cadence is never throttled by UI interaction or session reconfiguration:
//!
//! - `main`: UI-bound state and session mutations
//! - `camera`: guards the recording-active flag; used synchronously only for
//!   short flag reads/writes
//! - `output`: video frame delivery and writer finalization
//! - `audio`: audio frame delivery
//! - `session`: metadata delivery and session restart
//!
//! Each queue is a dedicated worker thread fed by an unbounded channel, so
//! jobs submitted to one queue execute in submission order and no queue blocks
//! another's forward progress in steady state.

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{unbounded, Sender};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A named serial execution queue backed by one worker thread
pub struct SerialQueue {
    name: String,
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl SerialQueue {
    /// Spawn a new serial queue with the given name
    pub fn new(name: &str) -> Self {
        let (tx, rx) = unbounded::<Job>();
        let (id_tx, id_rx) = crossbeam_channel::bounded(1);
        let thread_name = name.to_string();

        let worker = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _ = id_tx.send(thread::current().id());
                // Drains remaining jobs after the sender closes, then exits.
                while let Ok(job) = rx.recv() {
                    job();
                }
            })
            .expect("failed to spawn serial queue worker");

        let worker_id = id_rx
            .recv()
            .expect("serial queue worker did not report its thread id");

        Self {
            name: name.to_string(),
            tx: Some(tx),
            worker: Some(worker),
            worker_id,
        }
    }

    /// Queue name, used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a job for asynchronous execution in submission order
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(tx) = &self.tx {
            if tx.send(Box::new(f)).is_err() {
                log::warn!("queue '{}' is shut down, dropping job", self.name);
            }
        }
    }

    /// Submit a job and block until it has run, returning its result
    ///
    /// Calling this from the queue's own worker runs the job inline, so a job
    /// may safely re-enter its own queue.
    pub fn dispatch_sync<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if thread::current().id() == self.worker_id {
            return f();
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.dispatch(move || {
            let _ = done_tx.send(f());
        });
        done_rx
            .recv()
            .expect("serial queue worker terminated before completing a sync job")
    }

    /// Number of jobs submitted but not yet started
    pub fn pending(&self) -> usize {
        self.tx.as_ref().map(|tx| tx.len()).unwrap_or(0)
    }

    /// True when called from this queue's worker thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}

/// The five queues coordinating the capture pipeline
#[derive(Debug)]
pub struct QueueSet {
    pub main: Arc<SerialQueue>,
    pub camera: Arc<SerialQueue>,
    pub output: Arc<SerialQueue>,
    pub audio: Arc<SerialQueue>,
    pub session: Arc<SerialQueue>,
}

impl QueueSet {
    pub fn new() -> Self {
        Self {
            main: Arc::new(SerialQueue::new("facecap-main")),
            camera: Arc::new(SerialQueue::new("facecap-camera")),
            output: Arc::new(SerialQueue::new("facecap-output")),
            audio: Arc::new(SerialQueue::new("facecap-audio")),
            session: Arc::new(SerialQueue::new("facecap-session")),
        }
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new()
    }
}

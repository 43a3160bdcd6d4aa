//! Functionality related to multi-threading.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, warn};

/// Type of function accepted as a runnable job for a Thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Message passed from ThreadPool to Threads to give jobs or signal termination.
enum Message {
    NewJob(Job),
    Terminate,
}

/// Long lived Thread type. Each Thread receives commands through a receiver.
#[derive(Debug)]
struct Thread {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    /// Spawn a new thread, or None if the OS refuses.
    fn spawn(id: usize, receiver: Arc<Mutex<Receiver<Message>>>) -> Option<Self> {
        let runner = move || loop {
            // Lock is released before the job runs, so other threads keep taking jobs.
            let recv_result = match receiver.lock() {
                Ok(locked) => locked.recv(),
                Err(_) => break,
            };

            match recv_result {
                Ok(Message::NewJob(job)) => {
                    // A panicking job only loses its own result.
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!("search worker {id}: job panicked");
                    }
                }
                Ok(Message::Terminate) => break,

                // Sender has closed, allow thread graceful exit.
                Err(_) => break,
            }
        };

        match thread::Builder::new()
            .name(format!("search-worker-{id}"))
            .spawn(runner)
        {
            Ok(handle) => Some(Self {
                id,
                handle: Some(handle),
            }),
            Err(err) => {
                error!("failed to spawn search worker {id}: {err}");
                None
            }
        }
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        let handle_opt = self.handle.take();
        if let Some(handle) = handle_opt {
            if handle.join().is_err() {
                warn!("search worker {} exited abnormally", self.id);
            }
        }
    }
}

/// Long-lived thread pool containing n threads for job processing.
///
/// A ThreadPool is expected to live for the duration of the engine and is
/// reused between searches. Jobs are taken in submission order by whichever
/// thread is free. Threads hold no state between jobs.
#[derive(Debug)]
pub struct ThreadPool {
    threads: Vec<Thread>,
    sender: Sender<Message>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `num_threads` persistent worker threads.
    /// At least one thread is always requested.
    pub fn new(num_threads: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Message>();
        let receiver = Arc::new(Mutex::new(receiver));

        let threads: Vec<Thread> = (0..num_threads.max(1))
            .filter_map(|id| Thread::spawn(id, Arc::clone(&receiver)))
            .collect();

        Self { threads, sender }
    }

    /// Number of live worker threads.
    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    /// Send a runnable job to an available Thread in the ThreadPool to run.
    /// Returns false if the pool has no threads to run it.
    pub fn run<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        !self.threads.is_empty() && self.sender.send(Message::NewJob(Box::new(job))).is_ok()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Queued jobs still run before Terminate; they check their own stop flag.
        for _ in 0..self.threads.len() {
            let _ = self.sender.send(Message::Terminate);
        }
        // Threads join as `threads` drops.
    }
}

//! Named worker threads for the frontier schedulers.

use crossbeam_channel::unbounded;
use melif_types::{internal_error, MelifError, MelifResult};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error};

/// Runs a fixed number of identical workers and waits for all of them.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: String,
    workers: usize,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, workers: usize) -> Self {
        Self {
            name: name.into(),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work(worker_id)` on every worker thread.
    ///
    /// The first failure (an error or a panic) calls `halt` once so the other
    /// workers can wind down; it is returned after all workers have exited.
    pub fn run<W, H>(&self, work: W, halt: H) -> MelifResult<()>
    where
        W: Fn(usize) -> MelifResult<()> + Sync,
        H: Fn() + Sync,
    {
        let (tx, rx) = unbounded::<(usize, MelifResult<()>)>();

        thread::scope(|scope| {
            for id in 0..self.workers {
                let tx = tx.clone();
                let work = &work;
                let spawned = thread::Builder::new()
                    .name(format!("{}-{id}", self.name))
                    .spawn_scoped(scope, move || {
                        let outcome = catch_unwind(AssertUnwindSafe(|| work(id)))
                            .unwrap_or_else(|panic| Err(MelifError::WorkerPanic(panic_message(&*panic))));
                        // The receiver outlives every worker
                        let _ = tx.send((id, outcome));
                    });
                if let Err(e) = spawned {
                    halt();
                    return Err(internal_error!("failed to spawn worker {id}: {e}"));
                }
            }
            drop(tx);

            let mut first_error = None;
            for (id, outcome) in rx.iter() {
                match outcome {
                    Ok(()) => debug!(pool = %self.name, worker = id, "worker finished"),
                    Err(err) => {
                        error!(pool = %self.name, worker = id, error = %err, "worker failed");
                        if first_error.is_none() {
                            halt();
                            first_error = Some(err);
                        }
                    }
                }
            }
            first_error.map_or(Ok(()), Err)
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

//! Cancellable run on a background thread.
//!
//! Used by interactive front ends that must keep their own thread free while
//! a kernel samples. State moves NotStarted -> Running -> one of Completed,
//! Failed or Cancelled; progress and the running estimate can be polled at
//! any point.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::cancel::CancellationToken;
use crate::config::SampleConfig;
use crate::error::{Error, Result, WorkerPanic};
use crate::kernel::SamplingKernel;
use crate::problem::ProblemKind;
use crate::progress::{Progress, RunProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Cancelled
        )
    }

    fn of(outcome: &Result<f64>) -> Self {
        match outcome {
            Ok(_) => RunState::Completed,
            Err(e) if e.is_cancelled() => RunState::Cancelled,
            Err(_) => RunState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<Mutex<RunState>>);

impl SharedState {
    fn get(&self) -> RunState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: RunState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Handle to a kernel running on its own thread.
///
/// Dropping the handle cancels the run and waits for the thread.
pub struct BackgroundRun {
    state: SharedState,
    cancel: CancellationToken,
    progress: Progress,
    problem: ProblemKind,
    requested: u64,
    handle: Option<JoinHandle<Result<f64>>>,
}

impl BackgroundRun {
    pub fn spawn(kernel: Arc<dyn SamplingKernel>, config: SampleConfig) -> Result<Self> {
        let state = SharedState(Arc::new(Mutex::new(RunState::NotStarted)));
        let cancel = CancellationToken::new();
        let progress = Progress::new();
        let problem = kernel.problem();

        let handle = {
            let state = state.clone();
            let cancel = cancel.clone();
            let progress = progress.clone();
            thread::Builder::new()
                .name("mc-background".to_string())
                .spawn(move || {
                    state.set(RunState::Running);
                    let outcome = kernel.estimate_tracked(&config, &cancel, &progress);
                    state.set(RunState::of(&outcome));
                    outcome
                })
                .map_err(|e| Error::execution("failed to spawn background run", e))?
        };

        Ok(Self {
            state,
            cancel,
            progress,
            problem,
            requested: config.total_samples(),
            handle: Some(handle),
        })
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Samples drawn so far and the estimate they give.
    pub fn progress(&self) -> RunProgress {
        self.progress.snapshot(self.problem, self.requested)
    }

    /// Request cooperative cancellation; the kernel stops at its next check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the run and return its outcome.
    pub fn join(mut self) -> Result<f64> {
        match self.handle.take() {
            Some(handle) => self.wait(handle),
            None => Err(Error::invalid("background run already joined")),
        }
    }

    fn wait(&self, handle: JoinHandle<Result<f64>>) -> Result<f64> {
        match handle.join() {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.state.set(RunState::Failed);
                Err(Error::execution(
                    "background run panicked",
                    WorkerPanic::from_payload(payload),
                ))
            }
        }
    }
}

impl Drop for BackgroundRun {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            if let Err(e) = self.wait(handle) {
                if !e.is_cancelled() {
                    warn!("background run ended with error: {e}");
                }
            }
        }
    }
}

//! Two-phase resource reload
//!
//! A reload runs in two stages. `prepare` computes whatever a listener needs
//! off the critical path on the prepare executor; `apply` hands the prepared
//! value back and performs the switch on the apply executor. Listeners return
//! a completion future so the host knows when the whole reload is done.

pub mod coordinator;
pub mod pipeline;

pub use coordinator::ReloadCoordinator;
pub use pipeline::{DynReloadListener, ReloadPipeline};

use crate::foundation::identifier::Identifier;
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Unit of work handed to an executor
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs tasks
pub trait Executor: Send + Sync {
    /// Run or schedule `task`
    fn execute(&self, task: Task);
}

/// Executor that runs every task immediately on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Queue of tasks drained by its owning thread
///
/// The render thread drains it between frames, which is what orders apply
/// work after in-flight prepare work and before the next frame renders.
pub struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Run every task queued so far, returning how many ran
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        for task in self.receiver.try_iter() {
            task();
            ran += 1;
        }
        if ran > 0 {
            log::trace!("Task queue ran {ran} tasks");
        }
        ran
    }

    /// Number of tasks waiting
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.pending()).finish()
    }
}

impl Executor for TaskQueue {
    fn execute(&self, task: Task) {
        // The queue owns its receiver, so the channel cannot be disconnected here
        if self.sender.send(task).is_err() {
            log::warn!("Task queue disconnected; task dropped");
        }
    }
}

/// Source of resource pack contents seen by reload listeners
pub trait ResourceManager: Send + Sync {
    /// Names of the active resource packs, highest priority last
    fn resource_packs(&self) -> Vec<String>;
}

/// Resource manager with a fixed pack list
#[derive(Debug, Default, Clone)]
pub struct StaticResourceManager {
    packs: Vec<String>,
}

impl StaticResourceManager {
    /// Create a manager reporting `packs`
    pub fn new(packs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            packs: packs.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResourceManager for StaticResourceManager {
    fn resource_packs(&self) -> Vec<String> {
        self.packs.clone()
    }
}

/// Stage of a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStage {
    /// Off-thread computation
    Prepare,
    /// Switch-over on the apply executor
    Apply,
}

impl fmt::Display for ReloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => f.write_str("prepare"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

/// Reload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReloadError {
    /// A listener could not prepare
    #[error("Listener {listener} failed to prepare: {reason}")]
    PrepareFailed {
        /// Listener id
        listener: Identifier,
        /// Failure description
        reason: String,
    },

    /// An executor dropped a task before running it
    #[error("Listener {listener} {stage} task dropped before completion")]
    TaskDropped {
        /// Listener id
        listener: Identifier,
        /// Stage whose task was lost
        stage: ReloadStage,
    },

    /// An erased listener received a prepared value of the wrong type
    #[error("Listener {0} received a prepared value of the wrong type")]
    PreparedTypeMismatch(Identifier),

    /// Two listeners share one id
    #[error("Reload listener already registered: {0}")]
    DuplicateListener(Identifier),
}

/// Completion signal of an apply stage or a whole reload
pub type ReloadCompletion = BoxFuture<'static, Result<(), ReloadError>>;

/// Participant in the two-phase reload
pub trait ReloadListener: Send + Sync + 'static {
    /// Value handed from `prepare` to `apply`
    type Prepared: Send + 'static;

    /// Stable id the pipeline orders listeners by
    fn id(&self) -> Identifier;

    /// Compute the prepared value; runs on the prepare executor
    fn prepare(&self, manager: &dyn ResourceManager) -> Result<Self::Prepared, ReloadError>;

    /// Schedule the switch-over on `apply_executor`
    fn apply(
        &self,
        prepared: Self::Prepared,
        manager: Arc<dyn ResourceManager>,
        prepare_executor: Arc<dyn Executor>,
        apply_executor: Arc<dyn Executor>,
    ) -> ReloadCompletion;
}

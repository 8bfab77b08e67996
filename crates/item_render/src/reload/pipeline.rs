//! Reload pipeline
//!
//! Holds the registered listeners in id order and drives one reload
//! through all of them.

use super::{Executor, ReloadCompletion, ReloadError, ReloadListener, ReloadStage, ResourceManager};
use crate::foundation::identifier::Identifier;
use futures::channel::oneshot;
use futures::future::{self, try_join_all, FutureExt};
use std::any::Any;
use std::sync::Arc;

/// Type-erased reload listener
///
/// Implemented for every [`ReloadListener`], so listeners with different
/// prepared types can share one pipeline.
pub trait DynReloadListener: Send + Sync {
    /// Listener id
    fn id(&self) -> Identifier;

    /// Prepare, boxing the prepared value
    fn prepare_erased(&self, manager: &dyn ResourceManager) -> Result<Box<dyn Any + Send>, ReloadError>;

    /// Apply a value produced by [`DynReloadListener::prepare_erased`]
    fn apply_erased(
        &self,
        prepared: Box<dyn Any + Send>,
        manager: Arc<dyn ResourceManager>,
        prepare_executor: Arc<dyn Executor>,
        apply_executor: Arc<dyn Executor>,
    ) -> ReloadCompletion;
}

impl<L: ReloadListener> DynReloadListener for L {
    fn id(&self) -> Identifier {
        ReloadListener::id(self)
    }

    fn prepare_erased(&self, manager: &dyn ResourceManager) -> Result<Box<dyn Any + Send>, ReloadError> {
        let prepared = self.prepare(manager)?;
        Ok(Box::new(prepared))
    }

    fn apply_erased(
        &self,
        prepared: Box<dyn Any + Send>,
        manager: Arc<dyn ResourceManager>,
        prepare_executor: Arc<dyn Executor>,
        apply_executor: Arc<dyn Executor>,
    ) -> ReloadCompletion {
        match prepared.downcast::<L::Prepared>() {
            Ok(prepared) => self.apply(*prepared, manager, prepare_executor, apply_executor),
            Err(_) => future::ready(Err(ReloadError::PreparedTypeMismatch(ReloadListener::id(self)))).boxed(),
        }
    }
}

/// Ordered set of reload listeners
#[derive(Default)]
pub struct ReloadPipeline {
    listeners: Vec<Arc<dyn DynReloadListener>>,
}

impl ReloadPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; ids must be unique
    pub fn register<L: ReloadListener>(&mut self, listener: Arc<L>) -> Result<(), ReloadError> {
        let id = ReloadListener::id(listener.as_ref());
        if self.listeners.iter().any(|existing| existing.id() == id) {
            return Err(ReloadError::DuplicateListener(id));
        }

        log::debug!("Registered reload listener {id}");
        self.listeners.push(listener);
        self.listeners.sort_by_key(|listener| listener.id());
        Ok(())
    }

    /// Registered listener ids in reload order
    pub fn listener_ids(&self) -> Vec<Identifier> {
        self.listeners.iter().map(|listener| listener.id()).collect()
    }

    /// Number of listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Start a reload
    ///
    /// Prepare tasks are handed to `prepare_executor` immediately, in listener
    /// order; each one hands its result to the listener's apply stage. The
    /// returned future resolves once every apply stage has completed, or with
    /// the first error.
    pub fn reload(
        &self,
        manager: Arc<dyn ResourceManager>,
        prepare_executor: Arc<dyn Executor>,
        apply_executor: Arc<dyn Executor>,
    ) -> ReloadCompletion {
        log::info!("Starting resource reload across {} listeners", self.listeners.len());

        let mut stages = Vec::with_capacity(self.listeners.len());
        for listener in &self.listeners {
            let (sender, receiver) = oneshot::channel::<ReloadCompletion>();
            let task_listener = Arc::clone(listener);
            let task_manager = Arc::clone(&manager);
            let task_prepare = Arc::clone(&prepare_executor);
            let task_apply = Arc::clone(&apply_executor);

            prepare_executor.execute(Box::new(move || {
                let completion = match task_listener.prepare_erased(task_manager.as_ref()) {
                    Ok(prepared) => task_listener.apply_erased(prepared, task_manager, task_prepare, task_apply),
                    Err(error) => future::ready(Err(error)).boxed(),
                };
                if sender.send(completion).is_err() {
                    log::debug!("Reload for {} abandoned before prepare finished", task_listener.id());
                }
            }));

            let id = listener.id();
            stages.push(async move {
                let completion = receiver.await.map_err(|_| ReloadError::TaskDropped {
                    listener: id,
                    stage: ReloadStage::Prepare,
                })?;
                completion.await
            });
        }

        let count = stages.len();
        async move {
            try_join_all(stages).await?;
            log::info!("Resource reload complete ({count} listeners)");
            Ok(())
        }
        .boxed()
    }
}

//! Reload coordinator
//!
//! Reload listener owned by the item renderer. Prepare has nothing to
//! compute; apply drops the current resource generation on the apply
//! executor so the next render call resolves everything afresh.

use super::{Executor, ReloadCompletion, ReloadError, ReloadListener, ReloadStage, ResourceManager};
use crate::cache::{Invalidation, SharedRenderResources};
use crate::foundation::identifier::Identifier;
use futures::channel::oneshot;
use futures::future::FutureExt;
use std::sync::Arc;

/// Invalidates the renderer's derived resources on reload
#[derive(Debug, Clone)]
pub struct ReloadCoordinator {
    id: Identifier,
    resources: SharedRenderResources,
}

impl ReloadCoordinator {
    /// Coordinator for `resources`, registered under `id`
    pub fn new(id: Identifier, resources: SharedRenderResources) -> Self {
        Self { id, resources }
    }

    /// Invalidate on the calling thread
    ///
    /// Takes the same lock render calls hold, so this waits for an in-flight
    /// render call and the next one sees only the new generation.
    pub fn invalidate_now(&self) -> Invalidation {
        let invalidation = self.resources.lock().invalidate();
        log::info!(
            "Item render resources invalidated: {} derived entries dropped, special model {}, generation {}",
            invalidation.dropped_entries,
            if invalidation.dropped_special_model { "dropped" } else { "not held" },
            invalidation.epoch
        );
        invalidation
    }

    /// Current resource generation
    pub fn generation(&self) -> u64 {
        self.resources.lock().epoch()
    }

    /// Shared state this coordinator invalidates
    pub fn resources(&self) -> &SharedRenderResources {
        &self.resources
    }
}

impl ReloadListener for ReloadCoordinator {
    type Prepared = ();

    fn id(&self) -> Identifier {
        self.id.clone()
    }

    fn prepare(&self, _manager: &dyn ResourceManager) -> Result<(), ReloadError> {
        Ok(())
    }

    fn apply(
        &self,
        _prepared: (),
        _manager: Arc<dyn ResourceManager>,
        _prepare_executor: Arc<dyn Executor>,
        apply_executor: Arc<dyn Executor>,
    ) -> ReloadCompletion {
        let (sender, receiver) = oneshot::channel();
        let coordinator = self.clone();
        apply_executor.execute(Box::new(move || {
            let invalidation = coordinator.invalidate_now();
            if sender.send(invalidation).is_err() {
                log::debug!("Reload completion for {} no longer awaited", coordinator.id);
            }
        }));

        let id = self.id.clone();
        async move {
            receiver.await.map(drop).map_err(|_| ReloadError::TaskDropped {
                listener: id,
                stage: ReloadStage::Apply,
            })
        }
        .boxed()
    }
}

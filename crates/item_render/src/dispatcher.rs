//! Render dispatcher
//!
//! Single entry point for drawing an item stack as an icon. Three
//! independent paths may draw for one call, in this order:
//!
//! 1. **Stand-in**: the item kind has a catalog entry; the host's
//!    block-entity renderer draws it at `stand_in_scale`.
//! 2. **Special model**: the stack is the configured special item; its baked
//!    model is resolved once per generation and drawn by the host's routine.
//! 3. **Capability**: the item kind carries a descriptor that wants dynamic
//!    rendering; cached geometry is drawn at `capability_scale` into the
//!    buffer of the texture's render layer.
//!
//! Paths are not exclusive. Every path that matches draws. Each draw runs
//! inside a [`TransformStack::scoped`] guard, so a failing delegate aborts
//! only its own draw and leaves the stack depth unchanged.

use crate::cache::{ResourceGeneration, SharedRenderResources};
use crate::capability::{CapabilityResolver, ModelContext};
use crate::catalog::RenderableCatalog;
use crate::config::{ConfigError, ItemRenderConfig};
use crate::foundation::math::TransformStack;
use crate::host::{BlockEntityRenderService, ClientServices};
use crate::item::{ItemId, ItemStack, TransformMode};
use crate::reload::ReloadCoordinator;
use crate::render::light::{OverlayCoords, PackedLight};
use crate::render::vertex::DrawTargetProvider;
use crate::render::RenderError;
use std::fmt;
use std::sync::Arc;

/// Counters describing what the dispatcher has done
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Calls to [`RenderDispatcher::render`]
    pub render_calls: u64,
    /// Calls skipped because the block-entity dispatcher was not available yet
    pub skipped_unbound: u64,
    /// Successful stand-in draws
    pub stand_in_draws: u64,
    /// Successful special-model draws
    pub special_draws: u64,
    /// Successful capability draws
    pub capability_draws: u64,
    /// Draws aborted by a failing delegate or resolver
    pub failed_draws: u64,
}

impl DispatchStats {
    /// Successful draws across all paths
    pub fn total_draws(&self) -> u64 {
        self.stand_in_draws + self.special_draws + self.capability_draws
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawPath {
    StandIn,
    Special,
    Capability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawOutcome {
    Skipped,
    Drawn,
    Failed,
}

impl DispatchStats {
    fn record(&mut self, path: DrawPath, outcome: DrawOutcome) {
        match outcome {
            DrawOutcome::Skipped => {}
            DrawOutcome::Failed => self.failed_draws += 1,
            DrawOutcome::Drawn => match path {
                DrawPath::StandIn => self.stand_in_draws += 1,
                DrawPath::Special => self.special_draws += 1,
                DrawPath::Capability => self.capability_draws += 1,
            },
        }
    }
}

/// Dynamic item renderer
///
/// Lives on the render thread. The resource generation it draws from is
/// shared with the [`ReloadCoordinator`] returned by
/// [`RenderDispatcher::reload_coordinator`]; its lock is held for the whole
/// of a render call, so host delegates must not run an inline reload from
/// inside a draw.
pub struct RenderDispatcher {
    config: ItemRenderConfig,
    special_item: ItemId,
    catalog: RenderableCatalog,
    capabilities: CapabilityResolver,
    client: Arc<dyn ClientServices>,
    block_entities: Option<Arc<dyn BlockEntityRenderService>>,
    resources: SharedRenderResources,
    stats: DispatchStats,
}

impl RenderDispatcher {
    /// Create a dispatcher over a frozen catalog and capability set
    ///
    /// The host's block-entity dispatcher is not requested here; it is bound
    /// on the first render call that finds it available.
    pub fn new(
        config: ItemRenderConfig,
        catalog: RenderableCatalog,
        capabilities: CapabilityResolver,
        client: Arc<dyn ClientServices>,
    ) -> Self {
        let special_item = ItemId::new(config.special_item.clone());
        log::info!(
            "Item render dispatcher created: {} stand-ins, {} capabilities, special item {}",
            catalog.len(),
            capabilities.registry().len(),
            special_item
        );

        Self {
            config,
            special_item,
            catalog,
            capabilities,
            client,
            block_entities: None,
            resources: ResourceGeneration::shared(),
            stats: DispatchStats::default(),
        }
    }

    /// Draw `stack` as an icon
    ///
    /// Never fails: missing collaborators and unknown item kinds skip their
    /// path, and delegate errors are logged and counted.
    pub fn render(
        &mut self,
        stack: &ItemStack,
        mode: TransformMode,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) {
        self.stats.render_calls += 1;

        let Some(block_entities) = self.bind_block_entities() else {
            self.stats.skipped_unbound += 1;
            return;
        };

        let resources = Arc::clone(&self.resources);
        let mut generation = resources.lock();

        let outcome = self.draw_stand_in(block_entities.as_ref(), stack, transforms, targets, light, overlay);
        self.stats.record(DrawPath::StandIn, outcome);

        let outcome = self.draw_special(&mut generation, stack, mode, transforms, targets, light, overlay);
        self.stats.record(DrawPath::Special, outcome);

        let outcome = self.draw_capability(&mut generation, stack, transforms, targets, light, overlay);
        self.stats.record(DrawPath::Capability, outcome);
    }

    fn bind_block_entities(&mut self) -> Option<Arc<dyn BlockEntityRenderService>> {
        if self.block_entities.is_none() {
            self.block_entities = self.client.block_entity_render_dispatcher();
            if self.block_entities.is_some() {
                log::debug!("Bound block-entity render dispatcher");
            } else {
                log::trace!("Block-entity render dispatcher not available yet, skipping draws");
            }
        }
        self.block_entities.clone()
    }

    fn draw_stand_in(
        &self,
        service: &dyn BlockEntityRenderService,
        stack: &ItemStack,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> DrawOutcome {
        let Some(stand_in) = self.catalog.lookup(stack.item()) else {
            return DrawOutcome::Skipped;
        };

        let mut scope = transforms.scoped();
        let scale = self.config.stand_in_scale;
        scope.scale(scale, scale, scale);

        log::trace!("Drawing stand-in {} for {}", stand_in.block_entity_type(), stack.item());
        outcome_of(stack, "stand-in", service.render_entity(stand_in, &mut scope, targets, light, overlay))
    }

    fn draw_special(
        &self,
        generation: &mut ResourceGeneration,
        stack: &ItemStack,
        mode: TransformMode,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> DrawOutcome {
        if !stack.is_of(&self.special_item) {
            return DrawOutcome::Skipped;
        }

        let model_id = &self.config.special_model;
        let models = self.client.baked_model_manager();
        let Some(model) = generation.special_model.get_or_resolve(|| {
            log::debug!("Resolving special baked model {model_id}");
            models.model(model_id)
        }) else {
            log::trace!("Special baked model {model_id} not available");
            return DrawOutcome::Skipped;
        };

        let mut scope = transforms.scoped();
        let result = self
            .client
            .special_item_renderer()
            .render(stack, model, mode, &mut scope, targets, light, overlay);
        outcome_of(stack, "special model", result)
    }

    fn draw_capability(
        &self,
        generation: &mut ResourceGeneration,
        stack: &ItemStack,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> DrawOutcome {
        let Some(descriptor) = self.capabilities.resolve(stack) else {
            return DrawOutcome::Skipped;
        };

        let context = ModelContext::EntityModelLoader(self.client.entity_model_loader());
        let resources = match generation.derived.get_or_resolve(stack.item(), descriptor, context) {
            Ok(resources) => resources,
            Err(error) => return outcome_of(stack, "capability", Err(error)),
        };

        let mut scope = transforms.scoped();
        let scale = self.config.capability_scale;
        scope.scale(scale, scale, scale);

        let layer = resources.geometry.layer(&resources.texture);
        log::trace!("Drawing capability geometry for {} into {layer}", stack.item());
        let buffer = targets.buffer(&layer);
        outcome_of(stack, "capability", resources.geometry.render(&scope, buffer, light, overlay))
    }

    /// Shared resource generation
    pub fn resources(&self) -> &SharedRenderResources {
        &self.resources
    }

    /// Reload listener that invalidates this dispatcher's resources
    pub fn reload_coordinator(&self) -> Result<ReloadCoordinator, ConfigError> {
        Ok(ReloadCoordinator::new(
            self.config.reload_listener_id()?,
            Arc::clone(&self.resources),
        ))
    }

    /// Whether the block-entity dispatcher has been bound
    pub fn is_bound(&self) -> bool {
        self.block_entities.is_some()
    }

    /// Counters so far
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Stand-in catalog
    pub fn catalog(&self) -> &RenderableCatalog {
        &self.catalog
    }

    /// Stand-in catalog, for simulation ticks
    pub fn catalog_mut(&mut self) -> &mut RenderableCatalog {
        &mut self.catalog
    }

    /// Active configuration
    pub fn config(&self) -> &ItemRenderConfig {
        &self.config
    }
}

impl fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderDispatcher")
            .field("special_item", &self.special_item)
            .field("catalog", &self.catalog.len())
            .field("capabilities", &self.capabilities.registry().len())
            .field("bound", &self.is_bound())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn outcome_of(stack: &ItemStack, path: &str, result: Result<(), RenderError>) -> DrawOutcome {
    match result {
        Ok(()) => DrawOutcome::Drawn,
        Err(error) => {
            log::warn!("Aborted {path} draw for {}: {error}", stack.item());
            DrawOutcome::Failed
        }
    }
}

//! Host collaborators
//!
//! The renderer never owns the client. Everything it consumes from the
//! host (the block-entity render call, the baked model manager, the entity
//! model loader, the special item routine) comes in through these traits.

pub mod headless;

use crate::catalog::StandIn;
use crate::foundation::identifier::Identifier;
use crate::foundation::math::TransformStack;
use crate::item::{ItemStack, TransformMode};
use crate::render::light::{OverlayCoords, PackedLight};
use crate::render::model::{BakedModel, BakedModelHandle, GeometryHandle, MeshModel};
use crate::render::vertex::DrawTargetProvider;
use crate::render::RenderError;
use std::sync::Arc;

/// Generic block-entity rendering call
pub trait BlockEntityRenderService {
    /// Draw `stand_in` with the current top of `transforms`
    fn render_entity(
        &self,
        stand_in: &dyn StandIn,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError>;
}

/// Lookup of baked models by stable model id
pub trait BakedModelManager {
    /// Baked model registered under `id`, if the current resource pack has one
    fn model(&self, id: &Identifier) -> Option<BakedModelHandle>;
}

/// Entity model loader context handed to capability model resolvers
pub trait EntityModelLoader {
    /// Build the mesh registered for an entity model layer
    fn model_layer(&self, layer: &Identifier) -> Result<MeshModel, RenderError>;
}

/// General model container context handed to capability model resolvers
pub trait ModelContainer {
    /// Geometry registered under `id`
    fn geometry(&self, id: &Identifier) -> Option<GeometryHandle>;
}

/// Dedicated rendering routine for the special baked-model item
pub trait SpecialItemRenderer {
    /// Draw `stack` using its resolved baked model
    fn render(
        &self,
        stack: &ItemStack,
        model: &BakedModel,
        mode: TransformMode,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError>;
}

/// Client-side services the dispatcher pulls its collaborators from
pub trait ClientServices {
    /// Block-entity render dispatcher, or `None` before the client is fully initialized
    fn block_entity_render_dispatcher(&self) -> Option<Arc<dyn BlockEntityRenderService>>;

    /// Baked model manager
    fn baked_model_manager(&self) -> &dyn BakedModelManager;

    /// Entity model loader
    fn entity_model_loader(&self) -> &dyn EntityModelLoader;

    /// Routine used for the special baked-model item
    fn special_item_renderer(&self) -> &dyn SpecialItemRenderer;
}

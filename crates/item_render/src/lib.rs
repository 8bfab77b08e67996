//! # Item Render
//!
//! Dynamic rendering for inventory items whose icon cannot be expressed as a
//! single static baked model.
//!
//! ## Features
//!
//! - **Stand-in rendering**: machines drawn from a shared, simulated instance
//! - **Special baked models**: one designated item drawn through a dedicated routine
//! - **Capability rendering**: items that resolve their own geometry and texture
//! - **Reload-aware caching**: derived resources are dropped atomically on asset reload
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use item_render::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ItemRenderConfig::default();
//! let catalog = RenderableCatalog::with_machine_defaults(&config).expect("catalog");
//! let capabilities = CapabilityRegistry::new();
//! let client = Arc::new(HeadlessClient::new());
//!
//! let mut dispatcher = RenderDispatcher::new(
//!     config,
//!     catalog,
//!     CapabilityResolver::new(capabilities),
//!     client,
//! );
//!
//! let stack = ItemStack::of(ItemId::parse("foundry:drill").expect("id"));
//! let mut transforms = TransformStack::new();
//! let mut targets = RecordingDrawTargets::new();
//! dispatcher.render(
//!     &stack,
//!     TransformMode::Gui,
//!     &mut transforms,
//!     &mut targets,
//!     PackedLight::FULL_BRIGHT,
//!     OverlayCoords::DEFAULT,
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod item;
pub mod render;
pub mod host;
pub mod catalog;
pub mod capability;
pub mod cache;
pub mod reload;

mod dispatcher;

pub use dispatcher::{DispatchStats, RenderDispatcher};

#[cfg(test)]
mod tests;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        RenderDispatcher, DispatchStats,
        foundation::{
            identifier::Identifier,
            math::{Mat4, Vec3, TransformStack},
        },
        config::{Config, ConfigError, ItemRenderConfig},
        item::{ItemId, ItemStack, TransformMode},
        render::{
            light::{PackedLight, OverlayCoords},
            layer::{RenderLayer, LayerKind},
            vertex::{BatchSink, DrawTargetProvider, DrawableTargets, ImmediateDrawTargets, Vertex, VertexConsumer},
            model::{Geometry, GeometryHandle, MeshModel, Cuboid, BakedModel, BakedModelHandle},
            RenderError,
        },
        host::{
            ClientServices, BlockEntityRenderService, BakedModelManager,
            EntityModelLoader, ModelContainer, SpecialItemRenderer,
            headless::{FlushedBatches, HeadlessClient, RecordingDrawTargets},
        },
        catalog::{RenderableCatalog, StandIn, CatalogError},
        capability::{
            CapabilityDescriptor, CapabilityRegistry, CapabilityResolver, ModelContext,
        },
        cache::{DerivedResourceCache, DerivedResources, ResourceGeneration, SharedRenderResources},
        reload::{
            Executor, InlineExecutor, TaskQueue, ReloadListener, ReloadPipeline,
            ReloadCoordinator, ReloadError, ResourceManager,
        },
    };
}

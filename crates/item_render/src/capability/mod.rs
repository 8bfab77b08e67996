//! Dynamic-rendering capability
//!
//! Item kinds opt into capability rendering by registering a
//! [`CapabilityDescriptor`] at startup. Resolution is a pure lookup: the
//! resolver never builds geometry or textures itself, that happens in
//! [`crate::cache::DerivedResourceCache`].

use crate::foundation::identifier::Identifier;
use crate::host::{EntityModelLoader, ModelContainer};
use crate::item::{ItemId, ItemStack};
use crate::render::model::GeometryHandle;
use crate::render::RenderError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Context handed to a capability's model resolver
#[derive(Clone, Copy)]
pub enum ModelContext<'a> {
    /// General model container
    General(&'a dyn ModelContainer),
    /// Entity model loader
    EntityModelLoader(&'a dyn EntityModelLoader),
}

impl fmt::Debug for ModelContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General(_) => f.write_str("ModelContext::General"),
            Self::EntityModelLoader(_) => f.write_str("ModelContext::EntityModelLoader"),
        }
    }
}

/// Geometry resolution function of a capability
pub type ModelResolverFn =
    Arc<dyn Fn(ModelContext<'_>) -> Result<GeometryHandle, RenderError> + Send + Sync>;

/// Resolver building geometry from one named model layer
///
/// An entity model loader builds the layer; a general container is asked for
/// geometry registered under the same id.
pub fn entity_layer_resolver(layer: Identifier) -> ModelResolverFn {
    Arc::new(move |context: ModelContext<'_>| match context {
        ModelContext::EntityModelLoader(loader) => {
            let mesh = loader.model_layer(&layer)?;
            Ok(Arc::new(mesh) as GeometryHandle)
        }
        ModelContext::General(container) => container
            .geometry(&layer)
            .ok_or_else(|| RenderError::MissingModel(layer.clone())),
    })
}

/// Rendering intent declared by a capability-bearing item kind
#[derive(Clone)]
pub struct CapabilityDescriptor {
    render_dynamic_item: bool,
    texture: Identifier,
    resolver: ModelResolverFn,
}

impl CapabilityDescriptor {
    /// Descriptor that wants dynamic rendering
    pub fn new(texture: Identifier, resolver: ModelResolverFn) -> Self {
        Self {
            render_dynamic_item: true,
            texture,
            resolver,
        }
    }

    /// Override whether the item wants custom dynamic rendering
    pub fn with_dynamic_rendering(mut self, enabled: bool) -> Self {
        self.render_dynamic_item = enabled;
        self
    }

    /// Whether the item wants custom dynamic rendering
    pub fn wants_dynamic_render(&self) -> bool {
        self.render_dynamic_item
    }

    /// Texture the geometry samples
    pub fn texture_location(&self) -> &Identifier {
        &self.texture
    }

    /// Run the model resolver
    pub fn resolve_model(&self, context: ModelContext<'_>) -> Result<GeometryHandle, RenderError> {
        (self.resolver)(context)
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("render_dynamic_item", &self.render_dynamic_item)
            .field("texture", &self.texture)
            .finish_non_exhaustive()
    }
}

/// Capability registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The item kind already carries a descriptor
    #[error("Capability already registered for {0}")]
    Duplicate(ItemId),
}

/// Descriptors attached to item kinds at registration time
#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    descriptors: HashMap<ItemId, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `descriptor` to `item`
    pub fn register(&mut self, item: ItemId, descriptor: CapabilityDescriptor) -> Result<(), CapabilityError> {
        if self.descriptors.contains_key(&item) {
            return Err(CapabilityError::Duplicate(item));
        }
        log::debug!("Registered render capability for {item}");
        self.descriptors.insert(item, descriptor);
        Ok(())
    }

    /// Descriptor attached to `item`, whatever its declared intent
    pub fn descriptor(&self, item: &ItemId) -> Option<&CapabilityDescriptor> {
        self.descriptors.get(item)
    }

    /// Number of capability-bearing item kinds
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Query answering "does this stack want capability rendering, and how"
#[derive(Debug, Default, Clone)]
pub struct CapabilityResolver {
    registry: CapabilityRegistry,
}

impl CapabilityResolver {
    /// Wrap a frozen registry
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Descriptor for `stack` if its kind wants dynamic rendering
    pub fn resolve(&self, stack: &ItemStack) -> Option<&CapabilityDescriptor> {
        self.registry
            .descriptor(stack.item())
            .filter(|descriptor| descriptor.wants_dynamic_render())
    }

    /// Underlying registry
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }
}

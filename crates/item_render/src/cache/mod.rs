//! Derived resource cache
//!
//! Geometry and texture bindings are computed once per capability-bearing
//! item kind and remembered until the next resource reload. Keys are item
//! kinds, never stacks, so the cache is bounded by the number of distinct
//! kinds rather than by inventory size.
//!
//! Everything that a reload must drop lives together in one
//! [`ResourceGeneration`] behind one lock. The dispatcher holds that lock for
//! a whole render call and the reload coordinator takes it to invalidate, so
//! a render call sees either the old generation or the new one, never a mix.

use crate::capability::{CapabilityDescriptor, ModelContext};
use crate::foundation::identifier::Identifier;
use crate::item::ItemId;
use crate::render::model::{BakedModelHandle, GeometryHandle};
use crate::render::RenderError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Geometry and texture resolved for one item kind
#[derive(Debug, Clone)]
pub struct DerivedResources {
    /// Resolved geometry
    pub geometry: GeometryHandle,
    /// Texture the geometry samples
    pub texture: Identifier,
}

/// Lazily populated per-kind geometry and texture maps
#[derive(Debug, Default)]
pub struct DerivedResourceCache {
    geometry: HashMap<ItemId, GeometryHandle>,
    textures: HashMap<ItemId, Identifier>,
    resolutions: usize,
}

impl DerivedResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry for `key`, running the descriptor's resolver on a miss
    ///
    /// A failed resolution is not remembered; the next call tries again.
    pub fn get_geometry(
        &mut self,
        key: &ItemId,
        descriptor: &CapabilityDescriptor,
        context: ModelContext<'_>,
    ) -> Result<GeometryHandle, RenderError> {
        if let Some(geometry) = self.geometry.get(key) {
            return Ok(Arc::clone(geometry));
        }

        log::debug!("Derived geometry miss for {key}, resolving via {context:?}");
        self.resolutions += 1;
        let geometry = descriptor.resolve_model(context)?;
        self.geometry.insert(key.clone(), Arc::clone(&geometry));
        Ok(geometry)
    }

    /// Texture for `key`, read from the descriptor on a miss
    pub fn get_texture(&mut self, key: &ItemId, descriptor: &CapabilityDescriptor) -> Identifier {
        self.textures
            .entry(key.clone())
            .or_insert_with(|| descriptor.texture_location().clone())
            .clone()
    }

    /// Geometry and texture for `key`
    pub fn get_or_resolve(
        &mut self,
        key: &ItemId,
        descriptor: &CapabilityDescriptor,
        context: ModelContext<'_>,
    ) -> Result<DerivedResources, RenderError> {
        let geometry = self.get_geometry(key, descriptor, context)?;
        let texture = self.get_texture(key, descriptor);
        Ok(DerivedResources { geometry, texture })
    }

    /// Drop every entry, returning how many item kinds were cached
    pub fn invalidate_all(&mut self) -> usize {
        let dropped = self.geometry.len().max(self.textures.len());
        self.geometry.clear();
        self.textures.clear();
        dropped
    }

    /// Whether `key` has cached geometry
    pub fn contains(&self, key: &ItemId) -> bool {
        self.geometry.contains_key(key)
    }

    /// Number of item kinds with cached geometry
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty() && self.textures.is_empty()
    }

    /// Resolver invocations since construction; survives invalidation
    pub fn resolution_count(&self) -> usize {
        self.resolutions
    }
}

/// A value resolved on first use and reset on reload
#[derive(Debug)]
pub struct LazySlot<T> {
    value: Option<T>,
}

impl<T> LazySlot<T> {
    /// Create an unresolved slot
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Resolved value, running `resolve` first if the slot is empty
    ///
    /// If `resolve` yields nothing the slot stays unresolved.
    pub fn get_or_resolve(&mut self, resolve: impl FnOnce() -> Option<T>) -> Option<&T> {
        if self.value.is_none() {
            self.value = resolve();
        }
        self.value.as_ref()
    }

    /// Back to unresolved; returns whether a value was dropped
    pub fn reset(&mut self) -> bool {
        self.value.take().is_some()
    }

    /// Whether a value is held
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for LazySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`ResourceGeneration::invalidate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    /// Item kinds whose derived resources were dropped
    pub dropped_entries: usize,
    /// Whether the special baked model was held
    pub dropped_special_model: bool,
    /// Generation now current
    pub epoch: u64,
}

/// All state tied to one resource-pack generation
#[derive(Debug, Default)]
pub struct ResourceGeneration {
    /// Capability-derived geometry and textures
    pub derived: DerivedResourceCache,
    /// Baked model of the special item
    pub special_model: LazySlot<BakedModelHandle>,
    epoch: u64,
}

impl ResourceGeneration {
    /// Fresh generation wrapped for sharing between renderer and reload
    pub fn shared() -> SharedRenderResources {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Drop everything derived and advance the epoch
    pub fn invalidate(&mut self) -> Invalidation {
        let dropped_entries = self.derived.invalidate_all();
        let dropped_special_model = self.special_model.reset();
        self.epoch += 1;
        Invalidation {
            dropped_entries,
            dropped_special_model,
            epoch: self.epoch,
        }
    }

    /// Number of completed invalidations
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Generation shared by the dispatcher and the reload coordinator
pub type SharedRenderResources = Arc<Mutex<ResourceGeneration>>;

//! Headless host
//!
//! In-process implementations of every host collaborator. They draw into
//! CPU-side vertex buffers and record what was asked of them, which is what
//! the preview app prints and what the dispatcher tests assert on.

use super::{
    BakedModelManager, BlockEntityRenderService, ClientServices, EntityModelLoader,
    ModelContainer, SpecialItemRenderer,
};
use crate::catalog::StandIn;
use crate::foundation::identifier::Identifier;
use crate::foundation::math::{Mat4, TransformStack, Vec3};
use crate::item::{ItemStack, TransformMode};
use crate::render::layer::RenderLayer;
use crate::render::light::{OverlayCoords, PackedLight};
use crate::render::model::{BakedModel, BakedModelHandle, Geometry, GeometryHandle, MeshModel};
use crate::render::vertex::{BatchSink, DrawTargetProvider, ImmediateDrawTargets, Vertex, VertexConsumer};
use crate::render::RenderError;
use nalgebra::Rotation3;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Draw target provider that keeps every vertex it is given
#[derive(Debug, Default)]
pub struct RecordingDrawTargets {
    buffers: HashMap<RenderLayer, Vec<Vertex>>,
    requests: Vec<RenderLayer>,
}

impl RecordingDrawTargets {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in the order buffers were requested
    pub fn buffer_requests(&self) -> &[RenderLayer] {
        &self.requests
    }

    /// Vertices written to `layer`
    pub fn vertices(&self, layer: &RenderLayer) -> &[Vertex] {
        self.buffers.get(layer).map(Vec::as_slice).unwrap_or_default()
    }

    /// Raw vertex bytes for `layer`, as they would be uploaded
    pub fn bytes(&self, layer: &RenderLayer) -> &[u8] {
        bytemuck::cast_slice(self.vertices(layer))
    }

    /// Vertices written across all layers
    pub fn total_vertices(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    /// Number of distinct layers drawn into
    pub fn layer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Forget everything, as at the start of a new frame
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.requests.clear();
    }
}

impl DrawTargetProvider for RecordingDrawTargets {
    fn buffer(&mut self, layer: &RenderLayer) -> &mut dyn VertexConsumer {
        self.requests.push(layer.clone());
        self.buffers.entry(layer.clone()).or_default()
    }
}

impl ImmediateDrawTargets for RecordingDrawTargets {
    /// Flushes layers in the order they were first requested
    fn flush_into(&mut self, sink: &mut dyn BatchSink) -> usize {
        let mut flushed = 0;
        for layer in self.requests.drain(..) {
            let Some(vertices) = self.buffers.remove(&layer) else {
                continue;
            };
            if !vertices.is_empty() {
                sink.submit(&layer, &vertices);
                flushed += vertices.len();
            }
        }
        self.buffers.clear();
        flushed
    }
}

/// One flushed layer buffer
#[derive(Debug, Clone, PartialEq)]
pub struct FlushedBatch {
    /// Layer the vertices were batched for
    pub layer: RenderLayer,
    /// Vertex count
    pub vertices: usize,
    /// Size of the vertex data as uploaded
    pub bytes: usize,
}

/// Sink that records what each flush submitted
#[derive(Debug, Default)]
pub struct FlushedBatches {
    batches: Vec<FlushedBatch>,
}

impl FlushedBatches {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches submitted so far
    pub fn batches(&self) -> &[FlushedBatch] {
        &self.batches
    }

    /// Vertices submitted across all batches
    pub fn total_vertices(&self) -> usize {
        self.batches.iter().map(|batch| batch.vertices).sum()
    }

    /// Bytes submitted across all batches
    pub fn total_bytes(&self) -> usize {
        self.batches.iter().map(|batch| batch.bytes).sum()
    }

    /// Forget submitted batches
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl BatchSink for FlushedBatches {
    fn submit(&mut self, layer: &RenderLayer, vertices: &[Vertex]) {
        self.batches.push(FlushedBatch {
            layer: layer.clone(),
            vertices: vertices.len(),
            bytes: bytemuck::cast_slice::<Vertex, u8>(vertices).len(),
        });
    }
}

/// One call into [`HeadlessBlockEntityRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDrawRecord {
    /// Block-entity type of the stand-in
    pub block_entity_type: Identifier,
    /// Transform stack depth at the time of the call
    pub depth: usize,
    /// Top transform at the time of the call
    pub transform: Mat4,
    /// Light passed through
    pub light: PackedLight,
    /// Overlay passed through
    pub overlay: OverlayCoords,
}

/// Block-entity renderer drawing registered meshes per block-entity type
#[derive(Debug, Default)]
pub struct HeadlessBlockEntityRenderer {
    meshes: RwLock<HashMap<Identifier, (MeshModel, Identifier)>>,
    failing: RwLock<HashSet<Identifier>>,
    records: Mutex<Vec<EntityDrawRecord>>,
}

impl HeadlessBlockEntityRenderer {
    /// Create a renderer with no meshes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mesh and texture drawn for a block-entity type
    pub fn register_mesh(&self, type_id: Identifier, mesh: MeshModel, texture: Identifier) {
        self.meshes.write().insert(type_id, (mesh, texture));
    }

    /// Make every draw of `type_id` fail after pushing a transform
    pub fn fail_for(&self, type_id: Identifier) {
        self.failing.write().insert(type_id);
    }

    /// Calls received so far
    pub fn records(&self) -> Vec<EntityDrawRecord> {
        self.records.lock().clone()
    }

    /// Number of calls received so far
    pub fn draw_count(&self) -> usize {
        self.records.lock().len()
    }
}

impl BlockEntityRenderService for HeadlessBlockEntityRenderer {
    fn render_entity(
        &self,
        stand_in: &dyn StandIn,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError> {
        let type_id = stand_in.block_entity_type().clone();
        self.records.lock().push(EntityDrawRecord {
            block_entity_type: type_id.clone(),
            depth: transforms.depth(),
            transform: *transforms.top(),
            light,
            overlay,
        });

        if self.failing.read().contains(&type_id) {
            // Leave the stack unbalanced, like a renderer that bailed halfway
            transforms.push();
            return Err(RenderError::DrawFailed {
                target: type_id.to_string(),
                reason: "block entity renderer failed".to_string(),
            });
        }

        let meshes = self.meshes.read();
        if let Some((mesh, texture)) = meshes.get(&type_id) {
            let yaw = (-stand_in.facing().yaw_degrees()).to_radians();
            transforms.push();
            transforms.translate(stand_in.position().to_offset());
            transforms.multiply(&Rotation3::from_axis_angle(&Vec3::y_axis(), yaw).to_homogeneous());
            transforms.multiply(&stand_in.part_pose());
            let result = mesh.render(transforms, targets.buffer(&mesh.layer(texture)), light, overlay);
            transforms.pop();
            result?;
        }
        Ok(())
    }
}

/// Baked model manager backed by a swappable map
#[derive(Debug, Default)]
pub struct HeadlessModelManager {
    models: RwLock<HashMap<Identifier, BakedModelHandle>>,
    lookups: AtomicUsize,
}

impl HeadlessModelManager {
    /// Register or replace a model, as a resource pack switch would
    pub fn insert(&self, model: BakedModel) {
        self.models.write().insert(model.id.clone(), Arc::new(model));
    }

    /// Drop a model
    pub fn remove(&self, id: &Identifier) {
        self.models.write().remove(id);
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl BakedModelManager for HeadlessModelManager {
    fn model(&self, id: &Identifier) -> Option<BakedModelHandle> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.models.read().get(id).cloned()
    }
}

impl ModelContainer for HeadlessModelManager {
    fn geometry(&self, id: &Identifier) -> Option<GeometryHandle> {
        self.models
            .read()
            .get(id)
            .map(|model| Arc::new(model.mesh.clone()) as GeometryHandle)
    }
}

/// Entity model loader backed by a swappable map of layers
#[derive(Debug, Default)]
pub struct HeadlessEntityModelLoader {
    layers: RwLock<HashMap<Identifier, MeshModel>>,
    lookups: AtomicUsize,
}

impl HeadlessEntityModelLoader {
    /// Register or replace a model layer
    pub fn insert(&self, layer: Identifier, mesh: MeshModel) {
        self.layers.write().insert(layer, mesh);
    }

    /// Number of layer builds served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl EntityModelLoader for HeadlessEntityModelLoader {
    fn model_layer(&self, layer: &Identifier) -> Result<MeshModel, RenderError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.layers
            .read()
            .get(layer)
            .cloned()
            .ok_or_else(|| RenderError::MissingModelLayer(layer.clone()))
    }
}

/// One call into [`HeadlessSpecialRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialDrawRecord {
    /// Baked model drawn
    pub model: Identifier,
    /// Display context passed through
    pub mode: TransformMode,
    /// Transform stack depth at the time of the call
    pub depth: usize,
}

/// Special item routine: applies the model's display transform and draws its mesh
#[derive(Debug, Default)]
pub struct HeadlessSpecialRenderer {
    records: Mutex<Vec<SpecialDrawRecord>>,
}

impl HeadlessSpecialRenderer {
    /// Calls received so far
    pub fn records(&self) -> Vec<SpecialDrawRecord> {
        self.records.lock().clone()
    }

    /// Number of calls received so far
    pub fn draw_count(&self) -> usize {
        self.records.lock().len()
    }
}

impl SpecialItemRenderer for HeadlessSpecialRenderer {
    fn render(
        &self,
        _stack: &ItemStack,
        model: &BakedModel,
        mode: TransformMode,
        transforms: &mut TransformStack,
        targets: &mut dyn DrawTargetProvider,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError> {
        self.records.lock().push(SpecialDrawRecord {
            model: model.id.clone(),
            mode,
            depth: transforms.depth(),
        });

        model.display_for(mode).apply(transforms);
        let layer = model.mesh.layer(&model.texture);
        model.mesh.render(transforms, targets.buffer(&layer), light, overlay)
    }
}

/// Complete headless client
///
/// Starts initialized; [`HeadlessClient::uninitialized`] models the window
/// between renderer construction and client start-up where the block-entity
/// dispatcher does not exist yet.
#[derive(Debug)]
pub struct HeadlessClient {
    block_entities: Arc<HeadlessBlockEntityRenderer>,
    models: HeadlessModelManager,
    entity_models: HeadlessEntityModelLoader,
    special: HeadlessSpecialRenderer,
    initialized: AtomicBool,
    dispatcher_requests: AtomicUsize,
}

impl HeadlessClient {
    /// Create an initialized client with empty registries
    pub fn new() -> Self {
        Self {
            block_entities: Arc::new(HeadlessBlockEntityRenderer::new()),
            models: HeadlessModelManager::default(),
            entity_models: HeadlessEntityModelLoader::default(),
            special: HeadlessSpecialRenderer::default(),
            initialized: AtomicBool::new(true),
            dispatcher_requests: AtomicUsize::new(0),
        }
    }

    /// Create a client whose block-entity dispatcher is not available yet
    pub fn uninitialized() -> Self {
        let client = Self::new();
        client.set_initialized(false);
        client
    }

    /// Flip client initialization
    pub fn set_initialized(&self, initialized: bool) {
        self.initialized.store(initialized, Ordering::Release);
    }

    /// Block-entity renderer
    pub fn block_entities(&self) -> &HeadlessBlockEntityRenderer {
        &self.block_entities
    }

    /// Baked model manager
    pub fn models(&self) -> &HeadlessModelManager {
        &self.models
    }

    /// Entity model loader
    pub fn entity_models(&self) -> &HeadlessEntityModelLoader {
        &self.entity_models
    }

    /// Special item routine
    pub fn special(&self) -> &HeadlessSpecialRenderer {
        &self.special
    }

    /// Number of times the block-entity dispatcher was requested
    pub fn dispatcher_requests(&self) -> usize {
        self.dispatcher_requests.load(Ordering::Relaxed)
    }
}

impl Default for HeadlessClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientServices for HeadlessClient {
    fn block_entity_render_dispatcher(&self) -> Option<Arc<dyn BlockEntityRenderService>> {
        self.dispatcher_requests.fetch_add(1, Ordering::Relaxed);
        if self.initialized.load(Ordering::Acquire) {
            Some(Arc::clone(&self.block_entities) as Arc<dyn BlockEntityRenderService>)
        } else {
            None
        }
    }

    fn baked_model_manager(&self) -> &dyn BakedModelManager {
        &self.models
    }

    fn entity_model_loader(&self) -> &dyn EntityModelLoader {
        &self.entity_models
    }

    fn special_item_renderer(&self) -> &dyn SpecialItemRenderer {
        &self.special
    }
}

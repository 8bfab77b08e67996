//! Dispatcher scenarios against the headless host

use crate::capability::{entity_layer_resolver, CapabilityDescriptor, CapabilityRegistry, CapabilityResolver};
use crate::catalog::RenderableCatalog;
use crate::config::ItemRenderConfig;
use crate::foundation::identifier::Identifier;
use crate::foundation::logging;
use crate::foundation::math::{Mat4, TransformStack, Vec3};
use crate::host::headless::{HeadlessClient, RecordingDrawTargets};
use crate::item::{ItemId, ItemStack, TransformMode};
use crate::reload::{
    InlineExecutor, ReloadCoordinator, ReloadPipeline, StaticResourceManager, TaskQueue,
};
use crate::render::layer::{LayerKind, RenderLayer};
use crate::render::light::{OverlayCoords, PackedLight};
use crate::render::model::{BakedModel, Cuboid, MeshModel};
use crate::RenderDispatcher;
use approx::assert_relative_eq;
use futures::FutureExt;
use std::sync::Arc;

const DRILL_HEADS: [&str; 5] = ["simple", "iron", "gold", "diamond", "netherite"];

fn id(text: &str) -> Identifier {
    Identifier::parse(text).unwrap()
}

fn item(text: &str) -> ItemId {
    ItemId::parse(text).unwrap()
}

fn cube(name: &str, size: f32) -> MeshModel {
    MeshModel::new(name, LayerKind::EntitySolid)
        .with_cuboid(Cuboid::from_origin(Vec3::zeros(), Vec3::new(size, size, size)))
}

fn head_item(kind: &str) -> ItemId {
    item(&format!("foundry:{kind}_drill_head"))
}

fn head_layer(kind: &str) -> Identifier {
    id(&format!("foundry:drill_head/{kind}"))
}

fn head_texture(kind: &str) -> Identifier {
    id(&format!("foundry:textures/entity/drill_head/{kind}.png"))
}

fn head_descriptor(kind: &str) -> CapabilityDescriptor {
    CapabilityDescriptor::new(head_texture(kind), entity_layer_resolver(head_layer(kind)))
}

/// Client with meshes for every machine, every drill head and the scanner model
fn populated_client() -> HeadlessClient {
    let client = HeadlessClient::new();
    for machine in ["wind_turbine", "oil_pump_jack", "drill"] {
        client.block_entities().register_mesh(
            id(&format!("foundry:{machine}")),
            cube(machine, 16.0),
            id(&format!("foundry:textures/block/{machine}.png")),
        );
    }
    for kind in DRILL_HEADS {
        client.entity_models().insert(head_layer(kind), cube(kind, 8.0));
    }
    client.models().insert(BakedModel::new(
        id("foundry:item/seismic_scanner_base"),
        id("foundry:textures/item/seismic_scanner.png"),
        cube("seismic_scanner", 12.0),
    ));
    client
}

fn drill_head_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    for kind in DRILL_HEADS {
        registry.register(head_item(kind), head_descriptor(kind)).unwrap();
    }
    registry
}

struct Harness {
    client: Arc<HeadlessClient>,
    dispatcher: RenderDispatcher,
    transforms: TransformStack,
    targets: RecordingDrawTargets,
}

impl Harness {
    fn new(client: HeadlessClient, registry: CapabilityRegistry) -> Self {
        logging::init_for_tests();
        let config = ItemRenderConfig::default();
        let catalog = RenderableCatalog::with_machine_defaults(&config).unwrap();
        let client = Arc::new(client);
        let dispatcher = RenderDispatcher::new(
            config,
            catalog,
            CapabilityResolver::new(registry),
            Arc::clone(&client) as Arc<dyn crate::host::ClientServices>,
        );
        Self {
            client,
            dispatcher,
            transforms: TransformStack::new(),
            targets: RecordingDrawTargets::new(),
        }
    }

    fn standard() -> Self {
        Self::new(populated_client(), drill_head_registry())
    }

    fn render(&mut self, stack: &ItemStack) {
        self.render_as(stack, TransformMode::Gui);
    }

    fn render_as(&mut self, stack: &ItemStack, mode: TransformMode) {
        self.dispatcher.render(
            stack,
            mode,
            &mut self.transforms,
            &mut self.targets,
            PackedLight::FULL_BRIGHT,
            OverlayCoords::DEFAULT,
        );
    }

    fn resolutions(&self) -> usize {
        self.dispatcher.resources().lock().derived.resolution_count()
    }

    fn coordinator(&self) -> ReloadCoordinator {
        self.dispatcher.reload_coordinator().unwrap()
    }

    fn reload_inline(&self) {
        let mut pipeline = ReloadPipeline::new();
        pipeline.register(Arc::new(self.coordinator())).unwrap();
        let result = pipeline
            .reload(
                Arc::new(StaticResourceManager::new(["vanilla", "foundry"])),
                Arc::new(InlineExecutor),
                Arc::new(InlineExecutor),
            )
            .now_or_never();
        assert_eq!(result, Some(Ok(())));
    }
}

#[test]
fn test_unknown_item_draws_nothing() {
    let mut harness = Harness::standard();
    harness.render(&ItemStack::of(item("minecraft:stone")));

    let stats = harness.dispatcher.stats();
    assert_eq!(stats.render_calls, 1);
    assert_eq!(stats.total_draws(), 0);
    assert_eq!(stats.failed_draws, 0);
    assert_eq!(harness.client.block_entities().draw_count(), 0);
    assert_eq!(harness.client.special().draw_count(), 0);
    assert!(harness.targets.buffer_requests().is_empty());
    assert_eq!(harness.transforms.depth(), 1);
}

#[test]
fn test_stand_in_draws_once_with_balanced_stack() {
    let mut harness = Harness::standard();
    harness.transforms.push();
    harness.transforms.translate(Vec3::new(3.0, 0.0, 0.0));

    for (index, machine) in ["wind_turbine", "oil_pump_jack", "drill"].iter().enumerate() {
        let before = harness.transforms.depth();
        harness.render(&ItemStack::of(item(&format!("foundry:{machine}"))));
        assert_eq!(harness.transforms.depth(), before);
        assert_eq!(harness.client.block_entities().draw_count(), index + 1);
    }

    assert_eq!(harness.dispatcher.stats().stand_in_draws, 3);
    assert_eq!(harness.targets.total_vertices(), 3 * 24);
}

#[test]
fn test_drill_scenario() {
    let mut harness = Harness::standard();
    harness.render(&ItemStack::of(item("foundry:drill")));

    let records = harness.client.block_entities().records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.block_entity_type, id("foundry:drill"));
    assert_eq!(record.depth, 2);
    assert_relative_eq!(record.transform, Mat4::new_scaling(0.5), epsilon = 1e-6);
    assert_eq!(record.light, PackedLight::FULL_BRIGHT);
    assert_eq!(record.overlay, OverlayCoords::DEFAULT);

    let stats = harness.dispatcher.stats();
    assert_eq!(stats.stand_in_draws, 1);
    assert_eq!(stats.special_draws, 0);
    assert_eq!(stats.capability_draws, 0);
    assert_eq!(harness.client.models().lookup_count(), 0);
    assert_eq!(harness.transforms.depth(), 1);

    // The stand-in sits at the origin and fits the half-size icon cube
    let layer = RenderLayer::entity_solid(id("foundry:textures/block/drill.png"));
    let max_x = harness
        .targets
        .vertices(&layer)
        .iter()
        .map(|v| v.position[0])
        .fold(f32::MIN, f32::max);
    assert_relative_eq!(max_x, 0.5);
}

#[test]
fn test_capability_resolves_once_per_kind() {
    let mut harness = Harness::standard();
    harness.render(&ItemStack::new(head_item("iron"), 1));
    harness.render(&ItemStack::new(head_item("iron"), 64));

    assert_eq!(harness.resolutions(), 1);
    assert_eq!(harness.client.entity_models().lookup_count(), 1);
    assert_eq!(harness.dispatcher.stats().capability_draws, 2);

    let layer = RenderLayer::entity_solid(head_texture("iron"));
    assert_eq!(harness.targets.buffer_requests(), &[layer.clone(), layer.clone()]);
    assert_eq!(harness.targets.vertices(&layer).len(), 48);

    // Scaled to half: an 8px head spans a quarter block
    let max_y = harness.targets.vertices(&layer).iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
    assert_relative_eq!(max_y, 0.25);
}

#[test]
fn test_reload_forces_single_re_resolution() {
    let mut harness = Harness::standard();
    let stack = ItemStack::of(head_item("gold"));
    harness.render(&stack);
    assert_eq!(harness.resolutions(), 1);

    harness.reload_inline();
    assert!(harness.dispatcher.resources().lock().derived.is_empty());

    harness.render(&stack);
    assert_eq!(harness.resolutions(), 2);
    harness.render(&stack);
    assert_eq!(harness.resolutions(), 2);
    assert_eq!(harness.coordinator().generation(), 1);
}

#[test]
fn test_reload_picks_up_replaced_geometry() {
    let mut harness = Harness::standard();
    let stack = ItemStack::of(head_item("simple"));
    harness.render(&stack);

    // A resource pack switch replaces the layer with a two-box model
    harness.client.entity_models().insert(
        head_layer("simple"),
        cube("simple", 8.0).with_cuboid(Cuboid::from_origin(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))),
    );
    harness.targets.clear();
    harness.render(&stack);
    assert_eq!(harness.targets.total_vertices(), 24);

    harness.reload_inline();
    harness.targets.clear();
    harness.render(&stack);
    assert_eq!(harness.targets.total_vertices(), 48);
}

#[test]
fn test_double_reload_is_idempotent() {
    let mut harness = Harness::standard();
    harness.render(&ItemStack::of(head_item("diamond")));
    harness.render(&ItemStack::of(item("foundry:seismic_scanner")));

    let coordinator = harness.coordinator();
    let first = coordinator.invalidate_now();
    assert_eq!(first.dropped_entries, 1);
    assert!(first.dropped_special_model);

    let second = coordinator.invalidate_now();
    assert_eq!(second.dropped_entries, 0);
    assert!(!second.dropped_special_model);
    assert!(harness.dispatcher.resources().lock().derived.is_empty());

    harness.reload_inline();
    harness.reload_inline();
    assert_eq!(coordinator.generation(), 4);
}

#[test]
fn test_unwanted_capability_draws_nothing() {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(head_item("simple"), head_descriptor("simple").with_dynamic_rendering(false))
        .unwrap();
    let mut harness = Harness::new(populated_client(), registry);

    harness.render(&ItemStack::of(head_item("simple")));

    assert_eq!(harness.dispatcher.stats().total_draws(), 0);
    assert_eq!(harness.resolutions(), 0);
    assert!(harness.targets.buffer_requests().is_empty());
}

#[test]
fn test_batch_after_queued_reload_resolves_once_per_kind() {
    let mut harness = Harness::standard();
    for kind in DRILL_HEADS {
        harness.render(&ItemStack::of(head_item(kind)));
    }
    assert_eq!(harness.resolutions(), 5);

    let mut pipeline = ReloadPipeline::new();
    pipeline.register(Arc::new(harness.coordinator())).unwrap();
    let apply_queue = Arc::new(TaskQueue::new());
    let mut completion = pipeline.reload(
        Arc::new(StaticResourceManager::default()),
        Arc::new(InlineExecutor),
        apply_queue.clone(),
    );
    assert!((&mut completion).now_or_never().is_none());

    // The render thread drains its queue before the next frame
    apply_queue.run_pending();
    assert_eq!(completion.now_or_never(), Some(Ok(())));

    for index in 0..1000 {
        let kind = DRILL_HEADS[index % DRILL_HEADS.len()];
        harness.render(&ItemStack::of(head_item(kind)));
    }

    assert_eq!(harness.resolutions(), 10);
    assert_eq!(harness.dispatcher.stats().capability_draws, 1005);
}

#[test]
fn test_deferred_binding() {
    let mut harness = Harness::new(
        {
            let client = populated_client();
            client.set_initialized(false);
            client
        },
        drill_head_registry(),
    );
    let drill = ItemStack::of(item("foundry:drill"));

    harness.render(&drill);
    assert!(!harness.dispatcher.is_bound());
    assert_eq!(harness.dispatcher.stats().skipped_unbound, 1);
    assert_eq!(harness.client.block_entities().draw_count(), 0);

    harness.render(&ItemStack::of(head_item("iron")));
    assert_eq!(harness.dispatcher.stats().skipped_unbound, 2);
    assert_eq!(harness.resolutions(), 0);

    harness.client.set_initialized(true);
    harness.render(&drill);
    assert!(harness.dispatcher.is_bound());
    assert_eq!(harness.client.block_entities().draw_count(), 1);

    harness.render(&drill);
    assert_eq!(harness.client.dispatcher_requests(), 3);
}

#[test]
fn test_failing_delegate_keeps_depth_and_other_paths() {
    let mut registry = drill_head_registry();
    registry
        .register(item("foundry:drill"), head_descriptor("netherite"))
        .unwrap();
    let mut harness = Harness::new(populated_client(), registry);
    harness.client.block_entities().fail_for(id("foundry:drill"));

    harness.render(&ItemStack::of(item("foundry:drill")));

    let stats = harness.dispatcher.stats();
    assert_eq!(harness.transforms.depth(), 1);
    assert_eq!(stats.failed_draws, 1);
    assert_eq!(stats.stand_in_draws, 0);
    assert_eq!(stats.capability_draws, 1);
    assert_relative_eq!(*harness.transforms.top(), Mat4::identity());
}

#[test]
fn test_stand_in_and_capability_both_draw() {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(item("foundry:drill"), head_descriptor("simple"))
        .unwrap();
    let mut harness = Harness::new(populated_client(), registry);

    harness.render(&ItemStack::of(item("foundry:drill")));

    let stats = harness.dispatcher.stats();
    assert_eq!(stats.stand_in_draws, 1);
    assert_eq!(stats.capability_draws, 1);
    assert_eq!(harness.targets.layer_count(), 2);
}

#[test]
fn test_special_model_resolved_lazily_once_per_generation() {
    let mut harness = Harness::standard();
    let scanner = ItemStack::of(item("foundry:seismic_scanner"));

    harness.render_as(&scanner, TransformMode::FirstPersonRightHand);
    harness.render_as(&scanner, TransformMode::Ground);
    assert_eq!(harness.client.models().lookup_count(), 1);

    let records = harness.client.special().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].model, id("foundry:item/seismic_scanner_base"));
    assert_eq!(records[0].mode, TransformMode::FirstPersonRightHand);
    assert_eq!(records[1].mode, TransformMode::Ground);
    assert_eq!(records[0].depth, 2);
    assert_eq!(harness.transforms.depth(), 1);
    assert_eq!(harness.dispatcher.stats().special_draws, 2);

    harness.reload_inline();
    harness.render(&scanner);
    assert_eq!(harness.client.models().lookup_count(), 2);
}

#[test]
fn test_missing_special_model_retried() {
    let mut harness = Harness::standard();
    harness.client.models().remove(&id("foundry:item/seismic_scanner_base"));
    let scanner = ItemStack::of(item("foundry:seismic_scanner"));

    harness.render(&scanner);
    harness.render(&scanner);
    assert_eq!(harness.client.special().draw_count(), 0);
    assert_eq!(harness.client.models().lookup_count(), 2);
    assert_eq!(harness.dispatcher.stats().failed_draws, 0);
    assert!(!harness.dispatcher.resources().lock().special_model.is_resolved());
}

#[test]
fn test_unresolvable_capability_is_counted_not_cached() {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(item("foundry:mystery_drill_head"), head_descriptor("mystery"))
        .unwrap();
    let mut harness = Harness::new(populated_client(), registry);
    let stack = ItemStack::of(item("foundry:mystery_drill_head"));

    harness.render(&stack);
    harness.render(&stack);

    assert_eq!(harness.dispatcher.stats().failed_draws, 2);
    assert_eq!(harness.resolutions(), 2);
    assert!(harness.targets.buffer_requests().is_empty());
    assert_eq!(harness.transforms.depth(), 1);
}

#[test]
fn test_invalidation_from_other_thread_never_tears() {
    let mut harness = Harness::standard();
    let coordinator = harness.coordinator();

    let invalidator = std::thread::spawn(move || {
        for _ in 0..100 {
            coordinator.invalidate_now();
            std::thread::yield_now();
        }
        coordinator.generation()
    });

    for index in 0..1000 {
        let kind = DRILL_HEADS[index % DRILL_HEADS.len()];
        harness.render(&ItemStack::of(head_item(kind)));
    }
    let generation = invalidator.join().unwrap();

    let stats = harness.dispatcher.stats();
    assert_eq!(generation, 100);
    assert_eq!(stats.capability_draws, 1000);
    assert_eq!(stats.failed_draws, 0);
    assert!(harness.resolutions() <= 5 * 101);
}

#[test]
fn test_catalog_ticks_animate_stand_in_draw() {
    let mut harness = Harness::standard();
    let turbine = ItemStack::of(item("foundry:wind_turbine"));
    let layer = RenderLayer::entity_solid(id("foundry:textures/block/wind_turbine.png"));
    let min_x = |targets: &RecordingDrawTargets| {
        targets
            .vertices(&layer)
            .iter()
            .map(|vertex| vertex.position[0])
            .fold(f32::MAX, f32::min)
    };

    harness.render(&turbine);
    assert_relative_eq!(min_x(&harness.targets), 0.0, epsilon = 1e-4);

    // Ten ticks turn the blades by 45 degrees
    for _ in 0..10 {
        harness.dispatcher.catalog_mut().tick_all();
    }
    harness.targets.clear();
    harness.render(&turbine);

    assert_eq!(harness.client.block_entities().draw_count(), 2);
    let expected = -16.0 * 45f32.to_radians().sin() * harness.dispatcher.config().stand_in_scale;
    assert_relative_eq!(min_x(&harness.targets), expected, epsilon = 1e-4);
}

//! Icon preview application
//!
//! Drives the item renderer against the headless host: renders an inventory
//! worth of icons for a few frames, reloads resources halfway through with
//! the apply stage queued on the render thread, and logs what was drawn.
//!
//! Usage: `icon_preview [config.toml|config.ron]`

use futures::FutureExt;
use item_render::capability::{entity_layer_resolver, CapabilityError};
use item_render::catalog::CatalogError;
use item_render::foundation::logging;
use item_render::prelude::*;
use item_render::reload::{ReloadCompletion, StaticResourceManager};
use std::sync::Arc;
use thiserror::Error;

const FRAMES: usize = 6;
const RELOAD_FRAME: usize = 3;
const DRILL_HEADS: [&str; 4] = ["simple", "iron", "diamond", "netherite"];

#[derive(Error, Debug)]
enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Reload error: {0}")]
    Reload(#[from] ReloadError),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] item_render::foundation::identifier::IdentifierError),
}

struct PreviewApp {
    client: Arc<HeadlessClient>,
    dispatcher: RenderDispatcher,
    pipeline: ReloadPipeline,
    apply_queue: Arc<TaskQueue>,
    inventory: Vec<ItemStack>,
    targets: DrawableTargets<RecordingDrawTargets, FlushedBatches>,
    pending_reload: Option<ReloadCompletion>,
}

impl PreviewApp {
    fn new(config: ItemRenderConfig) -> Result<Self, AppError> {
        config.validate()?;

        let client = Arc::new(HeadlessClient::uninitialized());
        populate_host(&client, &config)?;

        let mut capabilities = CapabilityRegistry::new();
        for kind in DRILL_HEADS {
            let descriptor = CapabilityDescriptor::new(
                config.item_id(&format!("textures/entity/drill_head/{kind}.png"))?,
                entity_layer_resolver(config.item_id(&format!("drill_head/{kind}"))?),
            );
            capabilities.register(drill_head(&config, kind)?, descriptor)?;
        }

        let catalog = RenderableCatalog::with_machine_defaults(&config)?;
        let inventory = inventory(&config)?;
        let dispatcher = RenderDispatcher::new(
            config,
            catalog,
            CapabilityResolver::new(capabilities),
            Arc::clone(&client) as Arc<dyn ClientServices>,
        );

        let mut pipeline = ReloadPipeline::new();
        pipeline.register(Arc::new(dispatcher.reload_coordinator()?))?;

        Ok(Self {
            client,
            dispatcher,
            pipeline,
            apply_queue: Arc::new(TaskQueue::new()),
            inventory,
            targets: DrawableTargets::new(RecordingDrawTargets::new(), FlushedBatches::new()),
            pending_reload: None,
        })
    }

    fn run(&mut self) -> Result<(), AppError> {
        for frame in 0..FRAMES {
            // The client finishes starting up after the first frame
            if frame == 1 {
                self.client.set_initialized(true);
            }
            if frame == RELOAD_FRAME {
                self.start_reload();
            }

            self.apply_queue.run_pending();
            self.poll_reload()?;
            self.dispatcher.catalog_mut().tick_all();
            self.render_frame(frame);
        }

        let stats = self.dispatcher.stats();
        log::info!(
            "Done: {} render calls, {} skipped before binding, {} stand-in / {} special / {} capability draws, {} failed",
            stats.render_calls,
            stats.skipped_unbound,
            stats.stand_in_draws,
            stats.special_draws,
            stats.capability_draws,
            stats.failed_draws
        );
        Ok(())
    }

    fn start_reload(&mut self) {
        log::info!("Resource pack change requested");
        self.pending_reload = Some(self.pipeline.reload(
            Arc::new(StaticResourceManager::new(["vanilla", "foundry"])),
            Arc::new(InlineExecutor),
            Arc::clone(&self.apply_queue) as Arc<dyn Executor>,
        ));
    }

    fn poll_reload(&mut self) -> Result<(), AppError> {
        let Some(mut completion) = self.pending_reload.take() else {
            return Ok(());
        };
        match (&mut completion).now_or_never() {
            Some(result) => result?,
            None => self.pending_reload = Some(completion),
        }
        Ok(())
    }

    fn render_frame(&mut self, frame: usize) {
        let mut transforms = TransformStack::new();
        for stack in &self.inventory {
            self.dispatcher.render(
                stack,
                TransformMode::Gui,
                &mut transforms,
                &mut self.targets,
                PackedLight::FULL_BRIGHT,
                OverlayCoords::DEFAULT,
            );
        }

        // Icons are drawn as one GUI batch at the end of the frame
        let drawn = self.targets.draw();
        for batch in self.targets.sink().batches() {
            log::debug!("Frame {frame}: {} vertices ({} bytes) into {}", batch.vertices, batch.bytes, batch.layer);
        }

        let resources = self.dispatcher.resources().lock();
        log::info!(
            "Frame {frame}: {} icons, {drawn} vertices in {} layers, {} geometry resolutions, generation {}",
            self.inventory.len(),
            self.targets.sink().batches().len(),
            resources.derived.resolution_count(),
            resources.epoch()
        );
        drop(resources);
        self.targets.sink_mut().clear();
    }
}

fn drill_head(config: &ItemRenderConfig, kind: &str) -> Result<ItemId, AppError> {
    Ok(ItemId::new(config.item_id(&format!("{kind}_drill_head"))?))
}

/// A hotbar's worth of machines, drill heads and the scanner, with repeats
fn inventory(config: &ItemRenderConfig) -> Result<Vec<ItemStack>, AppError> {
    let mut stacks = Vec::new();
    for machine in ["wind_turbine", "oil_pump_jack", "drill"] {
        stacks.push(ItemStack::of(ItemId::new(config.item_id(machine)?)));
    }
    for kind in DRILL_HEADS {
        stacks.push(ItemStack::new(drill_head(config, kind)?, 1));
        stacks.push(ItemStack::new(drill_head(config, kind)?, 16));
    }
    stacks.push(ItemStack::of(ItemId::new(config.special_item.clone())));
    stacks.push(ItemStack::new(ItemId::parse("minecraft:stone")?, 64));
    Ok(stacks)
}

fn box_model(name: &str, size: f32) -> MeshModel {
    MeshModel::new(name, LayerKind::EntityCutoutNoCull)
        .with_cuboid(Cuboid::from_origin(Vec3::new(-size / 2.0, 0.0, -size / 2.0), Vec3::new(size, size, size)))
}

fn populate_host(client: &HeadlessClient, config: &ItemRenderConfig) -> Result<(), AppError> {
    for (machine, size) in [("wind_turbine", 14.0), ("oil_pump_jack", 16.0), ("drill", 12.0)] {
        client.block_entities().register_mesh(
            config.item_id(machine)?,
            box_model(machine, size),
            config.item_id(&format!("textures/block/{machine}.png"))?,
        );
    }
    for kind in DRILL_HEADS {
        client
            .entity_models()
            .insert(config.item_id(&format!("drill_head/{kind}"))?, box_model(kind, 6.0));
    }
    client.models().insert(BakedModel::new(
        config.special_model.clone(),
        config.item_id("textures/item/seismic_scanner.png")?,
        box_model("seismic_scanner", 10.0),
    ));
    Ok(())
}

fn load_config() -> Result<ItemRenderConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {path}");
            Ok(ItemRenderConfig::load_from_file(&path)?)
        }
        None => Ok(ItemRenderConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    log::info!("Starting icon preview");

    let config = load_config()?;
    let mut app = PreviewApp::new(config)?;
    app.run()?;

    log::info!("Icon preview finished");
    Ok(())
}

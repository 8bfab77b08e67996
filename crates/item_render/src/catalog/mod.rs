//! Renderable catalog
//!
//! Fixed table from item kind to the stand-in drawn for it. The table is
//! built once during startup and handed to the dispatcher; after that it
//! is only read.

pub mod stand_in;

pub use stand_in::{BlockPos, DrillStandIn, Facing, OilPumpJackStandIn, StandIn, WindTurbineStandIn};

use crate::config::{ConfigError, ItemRenderConfig};
use crate::item::ItemId;
use std::collections::HashMap;
use thiserror::Error;

/// Catalog construction errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A second stand-in was registered for one item kind
    #[error("Stand-in already registered for {0}")]
    DuplicateStandIn(ItemId),

    /// Item ids could not be derived from the configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Builder collecting stand-ins before the catalog is frozen
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: HashMap<ItemId, Box<dyn StandIn>>,
}

impl CatalogBuilder {
    /// Register the stand-in drawn for `item`
    pub fn register(mut self, item: ItemId, stand_in: impl StandIn + 'static) -> Result<Self, CatalogError> {
        if self.entries.contains_key(&item) {
            return Err(CatalogError::DuplicateStandIn(item));
        }
        self.entries.insert(item, Box::new(stand_in));
        Ok(self)
    }

    /// Freeze the table
    pub fn build(self) -> RenderableCatalog {
        log::info!("Renderable catalog built with {} stand-ins", self.entries.len());
        RenderableCatalog { entries: self.entries }
    }
}

/// Item kind to stand-in table
#[derive(Debug, Default)]
pub struct RenderableCatalog {
    entries: HashMap<ItemId, Box<dyn StandIn>>,
}

impl RenderableCatalog {
    /// Start an empty catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Catalog with the wind turbine, oil pump jack and drill machines
    ///
    /// Each item id doubles as its stand-in's block-entity type.
    pub fn with_machine_defaults(config: &ItemRenderConfig) -> Result<Self, CatalogError> {
        let wind_turbine = config.item_id("wind_turbine")?;
        let oil_pump_jack = config.item_id("oil_pump_jack")?;
        let drill = config.item_id("drill")?;

        Ok(Self::builder()
            .register(ItemId::new(wind_turbine.clone()), WindTurbineStandIn::new(wind_turbine))?
            .register(ItemId::new(oil_pump_jack.clone()), OilPumpJackStandIn::new(oil_pump_jack))?
            .register(ItemId::new(drill.clone()), DrillStandIn::new(drill))?
            .build())
    }

    /// Stand-in registered for `item`
    pub fn lookup(&self, item: &ItemId) -> Option<&dyn StandIn> {
        self.entries.get(item).map(|stand_in| stand_in.as_ref())
    }

    /// Mutable access for simulation ticks
    pub fn lookup_mut(&mut self, item: &ItemId) -> Option<&mut (dyn StandIn + 'static)> {
        self.entries.get_mut(item).map(|stand_in| stand_in.as_mut())
    }

    /// Advance every stand-in by one tick
    pub fn tick_all(&mut self) {
        for stand_in in self.entries.values_mut() {
            stand_in.tick();
        }
    }

    /// Whether `item` has a stand-in
    pub fn contains(&self, item: &ItemId) -> bool {
        self.entries.contains_key(item)
    }

    /// Number of stand-ins
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Stand-in machines
//!
//! Each stand-in is a simulated machine in its canonical default state,
//! parked at the origin. It is a rendering source only: nothing about the
//! rendered stack flows into it.

use crate::foundation::identifier::Identifier;
use crate::foundation::math::{Mat4, Vec3};
use nalgebra::Rotation3;
use crate::item::ItemId;
use std::fmt;

/// Integer block position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// The world origin, where every stand-in lives
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position as a translation in block units
    #[allow(clippy::cast_precision_loss)]
    pub fn to_offset(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Horizontal facing of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Towards -Z
    #[default]
    North,
    /// Towards +X
    East,
    /// Towards +Z
    South,
    /// Towards -X
    West,
}

impl Facing {
    /// Yaw in degrees, north being zero
    pub fn yaw_degrees(self) -> f32 {
        match self {
            Self::North => 0.0,
            Self::East => 90.0,
            Self::South => 180.0,
            Self::West => 270.0,
        }
    }
}

/// A simulated object used as the rendering source for an item icon
pub trait StandIn: fmt::Debug + Send {
    /// Block-entity type the host renderer dispatches on
    fn block_entity_type(&self) -> &Identifier;

    /// Position of the stand-in; always the origin
    fn position(&self) -> BlockPos {
        BlockPos::ORIGIN
    }

    /// Facing of the simulated machine
    fn facing(&self) -> Facing;

    /// Model-space pose of the animated part for the current simulation state
    fn part_pose(&self) -> Mat4 {
        Mat4::identity()
    }

    /// Advance the simulation by one tick
    fn tick(&mut self);
}

/// Wind turbine with free-spinning blades
#[derive(Debug, Clone, PartialEq)]
pub struct WindTurbineStandIn {
    block_entity_type: Identifier,
    /// Horizontal facing
    pub facing: Facing,
    /// Blade rotation in degrees, `[0, 360)`
    pub blade_angle: f32,
    /// Degrees the blades turn per tick
    pub blade_speed: f32,
}

impl WindTurbineStandIn {
    /// Default blade speed in degrees per tick
    pub const DEFAULT_BLADE_SPEED: f32 = 4.5;

    /// Create a turbine in its default state
    pub fn new(block_entity_type: Identifier) -> Self {
        Self {
            block_entity_type,
            facing: Facing::default(),
            blade_angle: 0.0,
            blade_speed: Self::DEFAULT_BLADE_SPEED,
        }
    }
}

impl Default for WindTurbineStandIn {
    fn default() -> Self {
        Self::new(Identifier::from_static("foundry", "wind_turbine"))
    }
}

impl StandIn for WindTurbineStandIn {
    fn block_entity_type(&self) -> &Identifier {
        &self.block_entity_type
    }

    fn facing(&self) -> Facing {
        self.facing
    }

    /// Blades spin about the hub axis through the origin
    fn part_pose(&self) -> Mat4 {
        Rotation3::from_axis_angle(&Vec3::z_axis(), self.blade_angle.to_radians()).to_homogeneous()
    }

    fn tick(&mut self) {
        self.blade_angle = (self.blade_angle + self.blade_speed).rem_euclid(360.0);
    }
}

/// Oil pump jack driven by a rotating crank
#[derive(Debug, Clone, PartialEq)]
pub struct OilPumpJackStandIn {
    block_entity_type: Identifier,
    /// Horizontal facing
    pub facing: Facing,
    /// Crank rotation in degrees, `[0, 360)`
    pub crank_angle: f32,
    /// Whether the pump is running; idle in the default state
    pub running: bool,
}

impl OilPumpJackStandIn {
    /// Degrees the crank turns per running tick
    pub const CRANK_SPEED: f32 = 6.0;

    /// Create a pump jack in its default state
    pub fn new(block_entity_type: Identifier) -> Self {
        Self {
            block_entity_type,
            facing: Facing::default(),
            crank_angle: 0.0,
            running: false,
        }
    }

    /// Vertical offset of the horse head for the current crank angle
    pub fn head_offset(&self) -> f32 {
        self.crank_angle.to_radians().sin() * 0.25
    }
}

impl Default for OilPumpJackStandIn {
    fn default() -> Self {
        Self::new(Identifier::from_static("foundry", "oil_pump_jack"))
    }
}

impl StandIn for OilPumpJackStandIn {
    fn block_entity_type(&self) -> &Identifier {
        &self.block_entity_type
    }

    fn facing(&self) -> Facing {
        self.facing
    }

    fn part_pose(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(0.0, self.head_offset(), 0.0))
    }

    fn tick(&mut self) {
        if self.running {
            self.crank_angle = (self.crank_angle + Self::CRANK_SPEED).rem_euclid(360.0);
        }
    }
}

/// Drill with a swappable head
#[derive(Debug, Clone, PartialEq)]
pub struct DrillStandIn {
    block_entity_type: Identifier,
    /// Horizontal facing
    pub facing: Facing,
    /// Installed drill head item, empty in the default state
    pub drill_head: Option<ItemId>,
    /// Whether the drill is running
    pub drilling: bool,
    /// How far the head has travelled below the frame, in blocks
    pub head_depth: f32,
}

impl DrillStandIn {
    /// Blocks the head travels per drilling tick
    pub const DRILL_SPEED: f32 = 0.05;

    /// Deepest the head travels
    pub const MAX_DEPTH: f32 = 64.0;

    /// Create a drill in its default state
    pub fn new(block_entity_type: Identifier) -> Self {
        Self {
            block_entity_type,
            facing: Facing::default(),
            drill_head: None,
            drilling: false,
            head_depth: 0.0,
        }
    }
}

impl Default for DrillStandIn {
    fn default() -> Self {
        Self::new(Identifier::from_static("foundry", "drill"))
    }
}

impl StandIn for DrillStandIn {
    fn block_entity_type(&self) -> &Identifier {
        &self.block_entity_type
    }

    fn facing(&self) -> Facing {
        self.facing
    }

    fn part_pose(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(0.0, -self.head_depth, 0.0))
    }

    fn tick(&mut self) {
        if self.drilling && self.drill_head.is_some() {
            self.head_depth = (self.head_depth + Self::DRILL_SPEED).min(Self::MAX_DEPTH);
        }
    }
}

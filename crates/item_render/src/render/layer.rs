//! Render layers
//!
//! A layer pairs a pipeline configuration with the texture it samples. Draw
//! target providers hand out one vertex buffer per distinct layer.

use crate::foundation::identifier::Identifier;
use std::fmt;

/// Pipeline configuration of a render layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Opaque, back-face culled
    EntitySolid,
    /// Alpha-tested, both faces drawn
    EntityCutoutNoCull,
    /// Alpha-blended, sorted
    EntityTranslucent,
}

impl LayerKind {
    /// Stable name used in logs and debug output
    pub fn name(self) -> &'static str {
        match self {
            Self::EntitySolid => "entity_solid",
            Self::EntityCutoutNoCull => "entity_cutout_no_cull",
            Self::EntityTranslucent => "entity_translucent",
        }
    }
}

/// A pipeline configuration bound to a texture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderLayer {
    /// Pipeline configuration
    pub kind: LayerKind,
    /// Sampled texture
    pub texture: Identifier,
}

impl RenderLayer {
    /// Create a layer
    pub fn new(kind: LayerKind, texture: Identifier) -> Self {
        Self { kind, texture }
    }

    /// Opaque entity layer
    pub fn entity_solid(texture: Identifier) -> Self {
        Self::new(LayerKind::EntitySolid, texture)
    }

    /// Alpha-tested entity layer without culling
    pub fn entity_cutout_no_cull(texture: Identifier) -> Self {
        Self::new(LayerKind::EntityCutoutNoCull, texture)
    }

    /// Alpha-blended entity layer
    pub fn entity_translucent(texture: Identifier) -> Self {
        Self::new(LayerKind::EntityTranslucent, texture)
    }

    /// Whether geometry on this layer needs blending
    pub fn is_translucent(&self) -> bool {
        self.kind == LayerKind::EntityTranslucent
    }
}

impl fmt::Display for RenderLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.name(), self.texture)
    }
}

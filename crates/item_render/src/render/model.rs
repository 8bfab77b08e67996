//! Geometry handles and baked models
//!
//! [`Geometry`] is what capability model resolvers produce and what the
//! derived resource cache stores. [`MeshModel`] is the cuboid model used by
//! entity-style geometry; [`BakedModel`] is the opaque handle the host's
//! model manager hands out.

use super::layer::{LayerKind, RenderLayer};
use super::light::{OverlayCoords, PackedLight};
use super::vertex::{Vertex, VertexConsumer};
use super::RenderError;
use crate::foundation::identifier::Identifier;
use crate::foundation::math::{Point3, TransformStack, Vec3};
use crate::item::TransformMode;
use nalgebra::Rotation3;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Model units per block
const PIXELS_PER_UNIT: f32 = 16.0;

/// Drawable geometry resolved for an item kind
pub trait Geometry: fmt::Debug + Send + Sync {
    /// Render layer this geometry uses when sampling `texture`
    fn layer(&self, texture: &Identifier) -> RenderLayer;

    /// Emit vertices into `buffer` using the top of `transforms`
    fn render(
        &self,
        transforms: &TransformStack,
        buffer: &mut dyn VertexConsumer,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError>;
}

/// Shared geometry handle
pub type GeometryHandle = Arc<dyn Geometry>;

/// Axis-aligned box in pixel units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Cuboid {
    /// Create a cuboid from two opposite corners in any order
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Create a cuboid from an origin and a size, matching model-part notation
    pub fn from_origin(origin: Vec3, size: Vec3) -> Self {
        Self::new(origin, origin + size)
    }

    /// Corner quads as (normal, corners) pairs in block units
    fn faces(&self) -> [(Vec3, [Vec3; 4]); 6] {
        let (lo, hi) = (self.min / PIXELS_PER_UNIT, self.max / PIXELS_PER_UNIT);
        let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        [
            (-Vec3::y(), [v(lo.x, lo.y, lo.z), v(hi.x, lo.y, lo.z), v(hi.x, lo.y, hi.z), v(lo.x, lo.y, hi.z)]),
            (Vec3::y(), [v(lo.x, hi.y, hi.z), v(hi.x, hi.y, hi.z), v(hi.x, hi.y, lo.z), v(lo.x, hi.y, lo.z)]),
            (-Vec3::z(), [v(hi.x, lo.y, lo.z), v(lo.x, lo.y, lo.z), v(lo.x, hi.y, lo.z), v(hi.x, hi.y, lo.z)]),
            (Vec3::z(), [v(lo.x, lo.y, hi.z), v(hi.x, lo.y, hi.z), v(hi.x, hi.y, hi.z), v(lo.x, hi.y, hi.z)]),
            (-Vec3::x(), [v(lo.x, lo.y, lo.z), v(lo.x, lo.y, hi.z), v(lo.x, hi.y, hi.z), v(lo.x, hi.y, lo.z)]),
            (Vec3::x(), [v(hi.x, lo.y, hi.z), v(hi.x, lo.y, lo.z), v(hi.x, hi.y, lo.z), v(hi.x, hi.y, hi.z)]),
        ]
    }
}

const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Cuboid mesh drawn as entity geometry
#[derive(Debug, Clone, PartialEq)]
pub struct MeshModel {
    /// Debug name
    pub name: String,
    /// Pipeline configuration for [`Geometry::layer`]
    pub layer_kind: LayerKind,
    /// Boxes making up the model
    pub cuboids: Vec<Cuboid>,
    /// RGBA tint applied to every vertex
    pub color: [f32; 4],
}

impl MeshModel {
    /// Create an empty, untinted model
    pub fn new(name: impl Into<String>, layer_kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            layer_kind,
            cuboids: Vec::new(),
            color: [1.0; 4],
        }
    }

    /// Add a cuboid
    pub fn with_cuboid(mut self, cuboid: Cuboid) -> Self {
        self.cuboids.push(cuboid);
        self
    }

    /// Number of vertices one render emits
    pub fn vertex_count(&self) -> usize {
        self.cuboids.len() * 24
    }
}

impl Geometry for MeshModel {
    fn layer(&self, texture: &Identifier) -> RenderLayer {
        RenderLayer::new(self.layer_kind, texture.clone())
    }

    fn render(
        &self,
        transforms: &TransformStack,
        buffer: &mut dyn VertexConsumer,
        light: PackedLight,
        overlay: OverlayCoords,
    ) -> Result<(), RenderError> {
        let matrix = transforms.top();
        for cuboid in &self.cuboids {
            for (normal, corners) in cuboid.faces() {
                let normal = matrix.transform_vector(&normal);
                let normal = normal.try_normalize(f32::EPSILON).unwrap_or(normal);
                for (corner, uv) in corners.iter().zip(FACE_UVS) {
                    let position = matrix.transform_point(&Point3::from(*corner));
                    buffer.vertex(Vertex {
                        position: [position.x, position.y, position.z],
                        color: self.color,
                        uv,
                        overlay: overlay.0,
                        light: light.0,
                        normal: [normal.x, normal.y, normal.z],
                    });
                }
            }
        }
        log::trace!("Rendered mesh '{}' ({} vertices)", self.name, self.vertex_count());
        Ok(())
    }
}

/// Per-context display adjustment of a baked model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    /// Euler rotation in degrees
    pub rotation: Vec3,
    /// Translation in pixel units
    pub translation: Vec3,
    /// Scale factors
    pub scale: Vec3,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self {
            rotation: Vec3::zeros(),
            translation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl DisplayTransform {
    /// Apply translation, rotation and scale to the top of `transforms`
    pub fn apply(&self, transforms: &mut TransformStack) {
        transforms.translate(self.translation / PIXELS_PER_UNIT);
        let rotation = Rotation3::from_euler_angles(
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        transforms.multiply(&rotation.to_homogeneous());
        transforms.scale(self.scale.x, self.scale.y, self.scale.z);
    }
}

/// Baked item model supplied by the host's model manager
#[derive(Debug, Clone, PartialEq)]
pub struct BakedModel {
    /// Model id
    pub id: Identifier,
    /// Atlas texture the model samples
    pub texture: Identifier,
    /// Geometry
    pub mesh: MeshModel,
    /// Display transforms by context; missing contexts use the identity
    pub display: HashMap<TransformMode, DisplayTransform>,
}

impl BakedModel {
    /// Create a model without display transforms
    pub fn new(id: Identifier, texture: Identifier, mesh: MeshModel) -> Self {
        Self {
            id,
            texture,
            mesh,
            display: HashMap::new(),
        }
    }

    /// Display transform for `mode`
    pub fn display_for(&self, mode: TransformMode) -> DisplayTransform {
        self.display.get(&mode).copied().unwrap_or_default()
    }
}

/// Shared baked model handle
pub type BakedModelHandle = Arc<BakedModel>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_block() -> MeshModel {
        MeshModel::new("block", LayerKind::EntitySolid)
            .with_cuboid(Cuboid::from_origin(Vec3::zeros(), Vec3::new(16.0, 16.0, 16.0)))
    }

    #[test]
    fn test_cuboid_normalizes_corners() {
        let cuboid = Cuboid::new(Vec3::new(4.0, 0.0, 8.0), Vec3::new(0.0, 2.0, 1.0));
        assert_eq!(cuboid.min, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(cuboid.max, Vec3::new(4.0, 2.0, 8.0));
    }

    #[test]
    fn test_render_emits_24_vertices_per_cuboid() {
        let model = unit_block().with_cuboid(Cuboid::from_origin(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        let mut buffer: Vec<Vertex> = Vec::new();
        model
            .render(&TransformStack::new(), &mut buffer, PackedLight::FULL_BRIGHT, OverlayCoords::DEFAULT)
            .unwrap();

        assert_eq!(buffer.len(), model.vertex_count());
        assert_eq!(buffer.len(), 48);
        assert!(buffer.iter().all(|v| v.light == PackedLight::FULL_BRIGHT.0));
        assert!(buffer.iter().all(|v| v.overlay == OverlayCoords::DEFAULT.0));
    }

    #[test]
    fn test_render_applies_top_transform() {
        let mut transforms = TransformStack::new();
        transforms.scale(0.5, 0.5, 0.5);

        let mut buffer: Vec<Vertex> = Vec::new();
        unit_block()
            .render(&transforms, &mut buffer, PackedLight::default(), OverlayCoords::DEFAULT)
            .unwrap();

        let max_x = buffer.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_relative_eq!(max_x, 0.5);

        // Normals stay unit length under uniform scale
        for v in &buffer {
            let n = Vec3::new(v.normal[0], v.normal[1], v.normal[2]);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_layer_binds_texture() {
        let texture = Identifier::parse("foundry:textures/entity/drill_head.png").unwrap();
        let layer = unit_block().layer(&texture);
        assert_eq!(layer.kind, LayerKind::EntitySolid);
        assert_eq!(layer.texture, texture);
    }

    #[test]
    fn test_display_transform_defaults_to_identity() {
        let model = BakedModel::new(
            Identifier::parse("foundry:item/seismic_scanner_base").unwrap(),
            Identifier::parse("foundry:textures/item/seismic_scanner.png").unwrap(),
            unit_block(),
        );
        let mut transforms = TransformStack::new();
        model.display_for(TransformMode::Gui).apply(&mut transforms);
        assert_relative_eq!(*transforms.top(), crate::foundation::math::Mat4::identity(), epsilon = 1e-6);
    }
}

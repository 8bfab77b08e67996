//! Vertex format and draw target abstractions
//!
//! Dispatcher draws only append to the buffers a [`DrawTargetProvider`]
//! hands out. Hosts that draw icons outside their normal world pass wrap an
//! [`ImmediateDrawTargets`] provider in [`DrawableTargets`] and call
//! [`DrawableTargets::draw`] once the batch is complete.

use super::layer::RenderLayer;
use bytemuck::{Pod, Zeroable};

/// Entity vertex as written into a layer buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position after the model transform
    pub position: [f32; 3],
    /// RGBA tint
    pub color: [f32; 4],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Packed overlay coordinates
    pub overlay: u32,
    /// Packed lightmap coordinates
    pub light: u32,
    /// Normal after the model transform
    pub normal: [f32; 3],
}

/// Sink for vertices of a single render layer
pub trait VertexConsumer {
    /// Append one vertex
    fn vertex(&mut self, vertex: Vertex);
}

impl VertexConsumer for Vec<Vertex> {
    fn vertex(&mut self, vertex: Vertex) {
        self.push(vertex);
    }
}

/// Provider of per-layer vertex buffers for the current frame
pub trait DrawTargetProvider {
    /// Buffer collecting geometry for `layer`
    fn buffer(&mut self, layer: &RenderLayer) -> &mut dyn VertexConsumer;
}

/// Receiver of flushed layer buffers, e.g. a GPU upload path
pub trait BatchSink {
    /// Take the vertices batched for `layer`
    fn submit(&mut self, layer: &RenderLayer, vertices: &[Vertex]);
}

/// Draw target provider that batches per layer until flushed
pub trait ImmediateDrawTargets: DrawTargetProvider {
    /// Hand every non-empty buffer to `sink` and empty it
    ///
    /// Returns the number of vertices flushed.
    fn flush_into(&mut self, sink: &mut dyn BatchSink) -> usize;
}

/// Provider wrapper that can be drawn on demand
///
/// Forwards buffer requests to the wrapped provider; [`DrawableTargets::draw`]
/// flushes whatever has been batched into the sink.
#[derive(Debug)]
pub struct DrawableTargets<P, S> {
    source: P,
    sink: S,
}

impl<P: ImmediateDrawTargets, S: BatchSink> DrawableTargets<P, S> {
    /// Wrap `source`, flushing into `sink`
    pub fn new(source: P, sink: S) -> Self {
        Self { source, sink }
    }

    /// Flush all batched geometry, returning the vertex count drawn
    pub fn draw(&mut self) -> usize {
        let flushed = self.source.flush_into(&mut self.sink);
        log::trace!("Drew {flushed} batched vertices");
        flushed
    }

    /// Wrapped provider
    pub fn source(&self) -> &P {
        &self.source
    }

    /// Sink receiving flushed buffers
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Sink receiving flushed buffers, for resetting between frames
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<P: ImmediateDrawTargets, S> DrawTargetProvider for DrawableTargets<P, S> {
    fn buffer(&mut self, layer: &RenderLayer) -> &mut dyn VertexConsumer {
        self.source.buffer(layer)
    }
}

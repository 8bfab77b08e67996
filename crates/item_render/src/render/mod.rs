//! Rendering primitives consumed and produced by the item renderer
//!
//! Light/overlay packing, render layers, vertices and draw targets, and the
//! geometry abstraction capability items resolve to.

pub mod light;
pub mod layer;
pub mod vertex;
pub mod model;

use crate::foundation::identifier::Identifier;
use thiserror::Error;

/// Rendering errors
///
/// None of these escape the dispatcher; each one aborts only the draw it
/// was raised for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A draw delegate reported a failure
    #[error("Draw failed for {target}: {reason}")]
    DrawFailed {
        /// What was being drawn
        target: String,
        /// Failure description from the delegate
        reason: String,
    },

    /// An entity model layer was requested that the loader does not know
    #[error("Entity model layer not found: {0}")]
    MissingModelLayer(Identifier),

    /// A model id was requested that the model container does not know
    #[error("Model not found: {0}")]
    MissingModel(Identifier),
}

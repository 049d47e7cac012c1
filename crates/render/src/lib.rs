//! Transforms and bitmap rendering.
//!
//! A [`Transform`] describes non-destructive edits to an original image. A
//! [`Renderer`] turns a source image plus a transform (and an optional
//! bounding height) into a new encoded image. [`ImageRenderer`] is the real
//! implementation; a recording mock is available behind the `mock` feature.

mod encoding;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod render;
mod transform;

pub use crate::encoding::Encoding;
use crate::error::Result;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{MockRenderer, RenderCall};
pub use crate::render::ImageRenderer;
pub use crate::transform::Transform;
use async_trait::async_trait;
use std::sync::Arc;

pub type RendererHandle = Arc<dyn Renderer + Send + Sync>;

/// Produces a new image from a source image and a transform.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `source` through `transform`.
    ///
    /// With `height` set, the output is scaled down (never up) to fit that
    /// height, preserving the aspect ratio. Without it, the output keeps the
    /// source dimensions.
    async fn render(&self, source: Arc<[u8]>, transform: &Transform, height: Option<u32>) -> Result<Vec<u8>>;
}

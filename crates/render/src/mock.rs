//! Recording renderer for testing.

use crate::error::{ErrorKind, Result};
use crate::{Renderer, Transform};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Arguments of a single [`MockRenderer::render`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub source: Vec<u8>,
    pub transform: Transform,
    pub height: Option<u32>,
}

/// Renderer for testing.
///
/// Doesn't decode anything: the output is a deterministic byte string built
/// from the call arguments (see [`MockRenderer::expected`]), so tests can
/// tell which source, transform and height an artifact was rendered from.
/// Every call is recorded, including failed ones.
#[derive(Default)]
pub struct MockRenderer {
    failing: bool,
    calls: Mutex<Vec<RenderCall>>,
}

impl MockRenderer {
    /// A renderer that rejects every source with [`ErrorKind::Decode`].
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    /// The output [`render`](Renderer::render) produces for these arguments.
    pub fn expected(source: &[u8], transform: &Transform, height: Option<u32>) -> Vec<u8> {
        let mut out = format!("rendered:{transform:?}@{height:?}:").into_bytes();
        out.extend_from_slice(source);
        out
    }

    /// Every call made so far, oldest first.
    pub async fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().await.clone()
    }

    /// Number of calls made so far.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(&self, source: Arc<[u8]>, transform: &Transform, height: Option<u32>) -> Result<Vec<u8>> {
        self.calls.lock().await.push(RenderCall { source: source.to_vec(), transform: *transform, height });
        if self.failing {
            exn::bail!(ErrorKind::Decode);
        }
        Ok(Self::expected(&source, transform, height))
    }
}

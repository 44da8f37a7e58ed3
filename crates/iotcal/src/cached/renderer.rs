//! Cached image renderer decorator.

use std::sync::Arc;

use async_trait::async_trait;
use iotcal_core::cache::{CacheConfig, FunctionCache};

use crate::error::Result;
use crate::models::{DashboardImage, DashboardInputs};
use crate::sources::{ClearCache, ImageRenderer};

/// Reuses the last image drawn from identical inputs.
pub struct CachedImageRenderer<R> {
    renderer: Arc<R>,
    cache: FunctionCache<DashboardInputs, DashboardImage>,
}

impl<R: ImageRenderer> CachedImageRenderer<R> {
    pub fn new(renderer: Arc<R>, config: CacheConfig) -> Self {
        Self {
            renderer,
            cache: FunctionCache::new("ImageRenderer::render", config),
        }
    }
}

#[async_trait]
impl<R> ImageRenderer for CachedImageRenderer<R>
where
    R: ImageRenderer + 'static,
{
    async fn render(&self, inputs: &DashboardInputs) -> Result<DashboardImage> {
        self.cache
            .try_call_async(inputs, || self.renderer.render(inputs))
            .await
    }
}

impl<R: ImageRenderer> ClearCache for CachedImageRenderer<R> {
    fn clear_cache(&self) {
        self.cache.clear_cache();
    }
}

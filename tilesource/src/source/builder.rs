//! Builder for [`GeometrySource`].

use std::sync::Arc;

use super::{GeometrySource, GeometrySourceOptions, SourceError};
use crate::executor::WorkerPoolConfig;
use crate::provider::TileProvider;
use crate::renderer::NativeRenderer;

/// Collects the collaborators and settings of a source.
///
/// ```ignore
/// let source = GeometrySource::builder("roads", provider, renderer)
///     .options(GeometrySourceOptions::default().with_max_zoom(16))
///     .pool_config(WorkerPoolConfig::new(4, 200))
///     .build()?;
/// ```
pub struct GeometrySourceBuilder {
    id: String,
    provider: Arc<dyn TileProvider>,
    renderer: Arc<dyn NativeRenderer>,
    options: GeometrySourceOptions,
    pool: WorkerPoolConfig,
}

impl GeometrySourceBuilder {
    pub fn new(
        id: impl Into<String>,
        provider: Arc<dyn TileProvider>,
        renderer: Arc<dyn NativeRenderer>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            renderer,
            options: GeometrySourceOptions::default(),
            pool: WorkerPoolConfig::default(),
        }
    }

    pub fn options(mut self, options: GeometrySourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pool_config(mut self, config: WorkerPoolConfig) -> Self {
        self.pool = config;
        self
    }

    /// Starts the workers and attaches the source to its renderer.
    pub fn build(self) -> Result<Arc<GeometrySource>, SourceError> {
        GeometrySource::start(
            self.id,
            self.options,
            self.pool,
            self.provider,
            self.renderer,
        )
    }
}

use crate::config::toml_config::MirrorConfig;
use crate::core::assembler::DomainMirrorAssembler;
use crate::core::cache::MirrorCache;
use crate::core::classifier::Classifier;
use crate::core::completeness::CompletenessChecker;
use crate::core::scanner::TypeCatalogScanner;
use crate::domain::mirror::DomainMirrorGraph;
use crate::domain::ports::{GenericResolutionOverride, TypeDiscovery, TypeLoader};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;
use std::time::Instant;

/// scan → classify → build members → assemble → validate
pub struct MirrorEngine<D: TypeDiscovery + 'static> {
    discovery: Arc<D>,
    config: MirrorConfig,
    resolution_override: Option<Arc<dyn GenericResolutionOverride>>,
    loader: Option<Arc<dyn TypeLoader>>,
}

impl<D: TypeDiscovery + 'static> MirrorEngine<D> {
    pub fn new(discovery: Arc<D>, config: MirrorConfig) -> Self {
        Self {
            discovery,
            config,
            resolution_override: None,
            loader: None,
        }
    }

    pub fn with_override(mut self, resolution_override: Arc<dyn GenericResolutionOverride>) -> Self {
        self.resolution_override = Some(resolution_override);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn TypeLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// 執行整個管線，成功時回傳完整且通過完整性檢查的 graph
    pub async fn run(&self) -> Result<Arc<DomainMirrorGraph>> {
        let started = Instant::now();
        tracing::info!("🚀 Starting domain mirror build...");

        // 設定錯誤在掃描前就失敗
        self.config.validate()?;
        let markers = &self.config.markers;
        let conventions = &self.config.conventions;

        let mut scanner = TypeCatalogScanner::new(Arc::clone(&self.discovery), markers.clone());
        if let Some(loader) = &self.loader {
            scanner = scanner.with_loader(Arc::clone(loader));
        }
        let catalog = scanner.scan(self.config.roots()).await?;

        let classified = Classifier::new(markers).classify(&catalog);

        let graph = DomainMirrorAssembler::new(&catalog, markers, conventions)
            .with_override(self.resolution_override.as_deref())
            .assemble(&classified)?;

        CompletenessChecker::new(markers, conventions).check(&graph)?;

        tracing::info!(
            "🎉 Domain mirror built: {} type(s) in {:.2?}",
            graph.len(),
            started.elapsed()
        );
        Ok(Arc::new(graph))
    }

    /// 建構成功才替換 cache 內容；失敗時保留先前的 graph
    pub async fn refresh(&self, cache: &MirrorCache) -> Result<Arc<DomainMirrorGraph>> {
        match self.run().await {
            Ok(graph) => {
                cache.install(Arc::clone(&graph));
                Ok(graph)
            }
            Err(e) => {
                tracing::error!("❌ Mirror build failed, cache left unchanged: {}", e);
                Err(e)
            }
        }
    }
}

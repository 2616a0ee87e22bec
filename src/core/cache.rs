use crate::domain::mirror::DomainMirrorGraph;
use crate::utils::error::{MirrorError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL: Lazy<MirrorCache> = Lazy::new(MirrorCache::new);

/// 持有最新一份完整驗證過的 graph
///
/// 讀者拿到的是 `Arc` 快照，替換時整份交換，不會看到建構到一半的 graph。
#[derive(Debug, Default)]
pub struct MirrorCache {
    graph: RwLock<Option<Arc<DomainMirrorGraph>>>,
}

impl MirrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 行程共用的 cache
    pub fn global() -> &'static MirrorCache {
        &GLOBAL
    }

    /// 原子地替換，回傳先前的 graph
    pub fn install(&self, graph: Arc<DomainMirrorGraph>) -> Option<Arc<DomainMirrorGraph>> {
        let previous = self.graph.write().replace(graph);
        tracing::debug!("Mirror cache updated (replaced: {})", previous.is_some());
        previous
    }

    pub fn current(&self) -> Result<Arc<DomainMirrorGraph>> {
        self.graph
            .read()
            .clone()
            .ok_or(MirrorError::CacheNotInitializedError)
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.read().is_some()
    }

    pub fn teardown(&self) -> Option<Arc<DomainMirrorGraph>> {
        self.graph.write().take()
    }
}

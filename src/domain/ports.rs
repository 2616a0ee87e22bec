use crate::core::generics::Resolution;
use crate::domain::mirror::Capability;
use crate::domain::model::TypeDescriptor;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 掃描某個 capability 時傳給探索元件的查詢
#[derive(Debug, Clone)]
pub struct CapabilityQuery {
    pub capability: Capability,
    /// marker 型別的完整名稱；`Enum` 沒有 marker
    pub marker: Option<String>,
}

/// Alternate type loading for isolated or dynamic environments.
/// Handed to the discovery collaborator untouched.
pub trait TypeLoader: Send + Sync {
    fn load(&self, type_name: &str) -> Option<TypeDescriptor>;
}

/// Host type-introspection collaborator.
#[async_trait]
pub trait TypeDiscovery: Send + Sync {
    /// 回傳 roots 之下滿足 capability 的所有型別
    async fn discover(
        &self,
        roots: &[String],
        query: &CapabilityQuery,
        loader: Option<&dyn TypeLoader>,
    ) -> Result<Vec<TypeDescriptor>>;

    /// 依名稱載入任意型別 (ancestors、成員型別、marker 本身)
    fn lookup(&self, type_name: &str, loader: Option<&dyn TypeLoader>) -> Option<TypeDescriptor>;
}

/// Consulted before the built-in resolver, for hosts whose generic usage
/// information is not available at scan time.
pub trait GenericResolutionOverride: Send + Sync {
    fn resolve(&self, concrete: &str, declaration: &str, slot: usize) -> Option<Resolution>;
}

#[async_trait]
impl<T: TypeDiscovery + ?Sized> TypeDiscovery for Arc<T> {
    async fn discover(
        &self,
        roots: &[String],
        query: &CapabilityQuery,
        loader: Option<&dyn TypeLoader>,
    ) -> Result<Vec<TypeDescriptor>> {
        (**self).discover(roots, query, loader).await
    }

    fn lookup(&self, type_name: &str, loader: Option<&dyn TypeLoader>) -> Option<TypeDescriptor> {
        (**self).lookup(type_name, loader)
    }
}

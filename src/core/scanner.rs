use crate::config::conventions::MarkerSet;
use crate::core::catalog::TypeCatalog;
use crate::domain::mirror::Capability;
use crate::domain::model::{TypeDescriptor, TypeRef};
use crate::domain::ports::{CapabilityQuery, TypeDiscovery, TypeLoader};
use crate::utils::error::{MirrorError, Result};
use crate::utils::validation::validate_roots;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tokio::task::JoinSet;

/// 型別目錄掃描器
///
/// 各 capability bucket 彼此獨立，平行探索；全部完成之後才建立目錄。
pub struct TypeCatalogScanner<D: TypeDiscovery + 'static> {
    discovery: Arc<D>,
    markers: MarkerSet,
    loader: Option<Arc<dyn TypeLoader>>,
}

impl<D: TypeDiscovery + 'static> TypeCatalogScanner<D> {
    pub fn new(discovery: Arc<D>, markers: MarkerSet) -> Self {
        Self {
            discovery,
            markers,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn TypeLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub async fn scan(&self, roots: &[String]) -> Result<TypeCatalog> {
        validate_roots(roots)?;
        tracing::info!("🔍 Scanning {} root namespace(s): {}", roots.len(), roots.join(", "));

        let roots: Arc<[String]> = roots.to_vec().into();
        let mut tasks = JoinSet::new();
        for capability in Capability::ALL {
            let query = CapabilityQuery {
                capability,
                marker: self.markers.marker_for(capability).map(str::to_string),
            };
            let discovery = Arc::clone(&self.discovery);
            let loader = self.loader.clone();
            let roots = Arc::clone(&roots);
            tasks.spawn(async move {
                let found = discovery
                    .discover(&roots, &query, loader.as_deref())
                    .await;
                (query.capability, found)
            });
        }

        // barrier: 所有 bucket 完成後才繼續
        let mut buckets: BTreeMap<Capability, BTreeSet<String>> = BTreeMap::new();
        let mut discovered: BTreeMap<String, TypeDescriptor> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (capability, found) = joined.map_err(|e| MirrorError::DiscoveryError {
                message: format!("discovery task failed: {}", e),
            })?;
            let found = found?;
            tracing::debug!("{:?}: {} type(s)", capability, found.len());
            let names = buckets.entry(capability).or_default();
            for descriptor in found {
                names.insert(descriptor.name.clone());
                discovered.entry(descriptor.name.clone()).or_insert(descriptor);
            }
        }

        let types = self.close_over_references(discovered);
        let catalog = TypeCatalog::new(buckets, types);
        tracing::info!(
            "📚 Catalog holds {} type(s) across {} bucket(s)",
            catalog.len(),
            catalog.buckets().len()
        );
        Ok(catalog)
    }

    /// 把 ancestors、成員型別與 marker 型別一併載入目錄
    fn close_over_references(
        &self,
        mut types: BTreeMap<String, TypeDescriptor>,
    ) -> BTreeMap<String, TypeDescriptor> {
        let mut pending: VecDeque<String> = VecDeque::new();
        for descriptor in types.values() {
            referenced_names(descriptor, &mut pending);
        }
        pending.extend(self.markers.all_markers().into_iter().map(str::to_string));

        let mut missing: BTreeSet<String> = BTreeSet::new();
        while let Some(name) = pending.pop_front() {
            if types.contains_key(&name) || missing.contains(&name) {
                continue;
            }
            match self.discovery.lookup(&name, self.loader.as_deref()) {
                Some(descriptor) => {
                    referenced_names(&descriptor, &mut pending);
                    types.insert(name, descriptor);
                }
                None => {
                    missing.insert(name);
                }
            }
        }

        if !missing.is_empty() {
            tracing::debug!("{} referenced type(s) are external to the catalog", missing.len());
        }
        types
    }
}

fn referenced_names(descriptor: &TypeDescriptor, out: &mut VecDeque<String>) {
    let mut push = |type_ref: &TypeRef| collect_names(type_ref, out);
    descriptor.direct_supertypes().for_each(&mut push);
    for param in &descriptor.type_params {
        param.bounds.iter().for_each(&mut push);
    }
    for field in &descriptor.fields {
        push(&field.type_ref);
    }
    for method in &descriptor.methods {
        method.return_type.iter().for_each(&mut push);
        for param in &method.parameters {
            push(&param.type_ref);
        }
    }
}

fn collect_names(type_ref: &TypeRef, out: &mut VecDeque<String>) {
    match type_ref {
        TypeRef::Named { name, args } => {
            out.push_back(name.clone());
            for arg in args {
                collect_names(arg, out);
            }
        }
        TypeRef::Array { component } => collect_names(component, out),
        TypeRef::Wildcard { upper: Some(upper) } => collect_names(upper, out),
        TypeRef::Variable { .. } | TypeRef::Wildcard { upper: None } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::static_catalog::StaticCatalog;

    fn shop() -> StaticCatalog {
        let markers = MarkerSet::default();
        StaticCatalog::new(
            vec![
                TypeDescriptor::interface(&markers.entity)
                    .type_param(crate::domain::model::TypeParameter::new("ID")),
                TypeDescriptor::interface(&markers.value_object),
                TypeDescriptor::class("shop.Money").implements(TypeRef::named(&markers.value_object)),
                TypeDescriptor::class("shop.Line")
                    .implements(TypeRef::generic(&markers.entity, vec![TypeRef::named("java.lang.Long")]))
                    .field(crate::domain::model::FieldDescriptor::new(
                        "price",
                        TypeRef::named("shop.Money"),
                    )),
                TypeDescriptor::class("other.Stray").implements(TypeRef::named(&markers.value_object)),
            ],
            markers,
        )
    }

    #[tokio::test]
    async fn test_scan_groups_types_by_capability() {
        let scanner = TypeCatalogScanner::new(Arc::new(shop()), MarkerSet::default());
        let catalog = scanner.scan(&["shop".to_string()]).await.unwrap();

        let entities: Vec<&str> = catalog.bucket(Capability::Entity).collect();
        assert_eq!(entities, vec!["shop.Line"]);
        let values: Vec<&str> = catalog.bucket(Capability::ValueObject).collect();
        assert_eq!(values, vec!["shop.Money"]);
        // marker 型別經由 lookup 進入目錄
        assert!(catalog.contains("domain.types.Entity"));
        assert!(!catalog.contains("other.Stray"));
    }

    #[tokio::test]
    async fn test_scan_rejects_invalid_roots_before_discovery() {
        let scanner = TypeCatalogScanner::new(Arc::new(shop()), MarkerSet::default());
        let err = scanner.scan(&["shop..web".to_string()]).await.unwrap_err();
        assert!(matches!(err, MirrorError::InvalidNamespaceError { .. }));

        let err = scanner.scan(&[]).await.unwrap_err();
        assert!(matches!(err, MirrorError::NoRootsError));
    }
}

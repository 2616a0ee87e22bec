use crate::config::conventions::MarkerSet;
use crate::domain::mirror::Capability;
use crate::domain::model::{TypeDescriptor, TypeKind};
use crate::domain::ports::{CapabilityQuery, TypeDiscovery, TypeLoader};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;

/// 以記憶體中的型別描述清單實作 `TypeDiscovery`
///
/// 描述清單可以由宿主端的 introspection 工具匯出成 JSON 再載入。
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    types: BTreeMap<String, TypeDescriptor>,
    markers: MarkerSet,
}

impl StaticCatalog {
    pub fn new(descriptors: Vec<TypeDescriptor>, markers: MarkerSet) -> Self {
        let types = descriptors
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect();
        Self { types, markers }
    }

    /// 從 JSON 陣列 (TypeDescriptor[]) 載入
    pub fn from_json_str(content: &str, markers: MarkerSet) -> Result<Self> {
        let descriptors: Vec<TypeDescriptor> = serde_json::from_str(content)?;
        Ok(Self::new(descriptors, markers))
    }

    pub fn from_file<P: AsRef<Path>>(path: P, markers: MarkerSet) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, markers)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn get(&self, type_name: &str, loader: Option<&dyn TypeLoader>) -> Option<TypeDescriptor> {
        self.types
            .get(type_name)
            .cloned()
            .or_else(|| loader.and_then(|l| l.load(type_name)))
    }

    fn under_roots(type_name: &str, roots: &[String]) -> bool {
        roots.iter().any(|root| {
            type_name
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    fn reaches(&self, type_name: &str, marker: &str, loader: Option<&dyn TypeLoader>) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([type_name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(descriptor) = self.get(&current, loader) else {
                continue;
            };
            for supertype in descriptor.direct_supertypes() {
                if let Some(name) = supertype.raw_name() {
                    if name == marker {
                        return true;
                    }
                    queue.push_back(name.to_string());
                }
            }
        }
        false
    }
}

#[async_trait]
impl TypeDiscovery for StaticCatalog {
    async fn discover(
        &self,
        roots: &[String],
        query: &CapabilityQuery,
        loader: Option<&dyn TypeLoader>,
    ) -> Result<Vec<TypeDescriptor>> {
        let found = self
            .types
            .values()
            .filter(|d| Self::under_roots(&d.name, roots))
            .filter(|d| !self.markers.is_marker(&d.name))
            .filter(|d| match (query.capability, query.marker.as_deref()) {
                (Capability::Enum, _) => d.kind == TypeKind::Enum,
                (_, Some(marker)) => self.reaches(&d.name, marker, loader),
                (_, None) => false,
            })
            .cloned()
            .collect();
        Ok(found)
    }

    fn lookup(&self, type_name: &str, loader: Option<&dyn TypeLoader>) -> Option<TypeDescriptor> {
        self.get(type_name, loader)
    }
}

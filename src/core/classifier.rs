use crate::config::conventions::MarkerSet;
use crate::core::catalog::TypeCatalog;
use crate::domain::mirror::{Capability, DomainTypeKind};
use std::collections::BTreeMap;

/// 具體度由高到低；同時落在多個 bucket 的型別取第一個
pub const SPECIFICITY: [(Capability, DomainTypeKind); 15] = [
    (Capability::Enum, DomainTypeKind::Enum),
    (Capability::AggregateRoot, DomainTypeKind::AggregateRoot),
    (Capability::Entity, DomainTypeKind::Entity),
    (Capability::Identity, DomainTypeKind::Identity),
    (Capability::DomainEvent, DomainTypeKind::DomainEvent),
    (Capability::DomainCommand, DomainTypeKind::DomainCommand),
    (Capability::ValueObject, DomainTypeKind::ValueObject),
    (Capability::ReadModel, DomainTypeKind::ReadModel),
    (Capability::Repository, DomainTypeKind::Repository),
    (Capability::QueryHandler, DomainTypeKind::QueryHandler),
    (Capability::QueryClient, DomainTypeKind::QueryClient),
    (Capability::ApplicationService, DomainTypeKind::ApplicationService),
    (Capability::DomainService, DomainTypeKind::DomainService),
    (Capability::OutboundService, DomainTypeKind::OutboundService),
    (Capability::ServiceKind, DomainTypeKind::GenericServiceKind),
];

/// 把掃描 bucket 轉成每個型別唯一的 `DomainTypeKind`
pub struct Classifier<'a> {
    markers: &'a MarkerSet,
}

impl<'a> Classifier<'a> {
    pub fn new(markers: &'a MarkerSet) -> Self {
        Self { markers }
    }

    /// 完整 (barrier 之後) 的目錄 → 型別名稱到唯一標籤
    ///
    /// Marker 型別本身不分類；不在任何 bucket 的型別不會出現。
    pub fn classify(&self, catalog: &TypeCatalog) -> BTreeMap<String, DomainTypeKind> {
        let mut claims: BTreeMap<&str, Vec<Capability>> = BTreeMap::new();
        for (capability, _) in SPECIFICITY {
            for name in catalog.bucket(capability) {
                if !self.markers.is_marker(name) {
                    claims.entry(name).or_default().push(capability);
                }
            }
        }

        let classified: BTreeMap<String, DomainTypeKind> = claims
            .into_iter()
            .filter_map(|(name, capabilities)| {
                let (winner, rest) = capabilities.split_first()?;
                if !rest.is_empty() {
                    tracing::debug!("{} classified as {:?}, also matched {:?}", name, winner, rest);
                }
                Some((name.to_string(), kind_of(*winner)))
            })
            .collect();

        tracing::info!("🏷️ Classified {} domain type(s)", classified.len());
        classified
    }
}

fn kind_of(capability: Capability) -> DomainTypeKind {
    SPECIFICITY
        .iter()
        .find(|(c, _)| *c == capability)
        .map(|(_, kind)| *kind)
        .unwrap_or(DomainTypeKind::GenericServiceKind)
}

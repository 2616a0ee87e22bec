use crate::domain::mirror::Capability;
use serde::{Deserialize, Serialize};

/// Capability marker 型別與 marker 註解的名稱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    pub aggregate_root: String,
    pub entity: String,
    pub value_object: String,
    pub identity: String,
    pub domain_event: String,
    pub domain_command: String,
    pub repository: String,
    pub application_service: String,
    pub domain_service: String,
    pub outbound_service: String,
    pub query_client: String,
    pub query_handler: String,
    pub read_model: String,
    pub service_kind: String,

    pub identity_annotation: String,
    pub concurrency_annotation: String,
    pub publishes_annotation: String,
    pub publishes_attribute: String,
    pub listens_annotation: String,
    pub listens_attribute: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            aggregate_root: "domain.types.AggregateRoot".to_string(),
            entity: "domain.types.Entity".to_string(),
            value_object: "domain.types.ValueObject".to_string(),
            identity: "domain.types.Identity".to_string(),
            domain_event: "domain.types.DomainEvent".to_string(),
            domain_command: "domain.types.DomainCommand".to_string(),
            repository: "domain.types.Repository".to_string(),
            application_service: "domain.types.ApplicationService".to_string(),
            domain_service: "domain.types.DomainService".to_string(),
            outbound_service: "domain.types.OutboundService".to_string(),
            query_client: "domain.types.QueryClient".to_string(),
            query_handler: "domain.types.QueryHandler".to_string(),
            read_model: "domain.types.ReadModel".to_string(),
            service_kind: "domain.types.ServiceKind".to_string(),

            identity_annotation: "domain.annotations.Identity".to_string(),
            concurrency_annotation: "domain.annotations.ConcurrencyVersion".to_string(),
            publishes_annotation: "domain.annotations.Publishes".to_string(),
            publishes_attribute: "domainEventTypes".to_string(),
            listens_annotation: "domain.annotations.ListensTo".to_string(),
            listens_attribute: "domainEventType".to_string(),
        }
    }
}

impl MarkerSet {
    /// capability 對應的 marker 型別；`Enum` 沒有 marker
    pub fn marker_for(&self, capability: Capability) -> Option<&str> {
        let marker = match capability {
            Capability::AggregateRoot => &self.aggregate_root,
            Capability::Entity => &self.entity,
            Capability::ValueObject => &self.value_object,
            Capability::Identity => &self.identity,
            Capability::DomainEvent => &self.domain_event,
            Capability::DomainCommand => &self.domain_command,
            Capability::Repository => &self.repository,
            Capability::ApplicationService => &self.application_service,
            Capability::DomainService => &self.domain_service,
            Capability::OutboundService => &self.outbound_service,
            Capability::QueryClient => &self.query_client,
            Capability::QueryHandler => &self.query_handler,
            Capability::ReadModel => &self.read_model,
            Capability::ServiceKind => &self.service_kind,
            Capability::Enum => return None,
        };
        Some(marker.as_str())
    }

    pub fn all_markers(&self) -> Vec<&str> {
        Capability::ALL
            .iter()
            .filter_map(|c| self.marker_for(*c))
            .collect()
    }

    pub fn is_marker(&self, type_name: &str) -> bool {
        Capability::ALL
            .iter()
            .any(|c| self.marker_for(*c) == Some(type_name))
    }
}

/// 宿主型別系統的慣例：容器、字串、約束方言與白名單
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConventions {
    pub container_types: Vec<String>,
    pub map_types: Vec<String>,
    pub char_sequence_types: Vec<String>,
    pub constraint_dialects: Vec<String>,
    pub foundational_types: Vec<String>,
    pub getter_prefixes: Vec<String>,
    pub setter_prefix: String,
}

impl Default for HostConventions {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            container_types: strings(&[
                "java.util.Collection",
                "java.util.List",
                "java.util.Set",
                "java.util.SortedSet",
                "java.util.Queue",
                "java.util.Optional",
                "java.lang.Iterable",
            ]),
            map_types: strings(&["java.util.Map", "java.util.SortedMap"]),
            char_sequence_types: strings(&["java.lang.String", "java.lang.CharSequence"]),
            constraint_dialects: strings(&[
                "jakarta.validation.constraints.",
                "javax.validation.constraints.",
            ]),
            foundational_types: strings(&[
                "java.lang.Object",
                "java.lang.Enum",
                "java.lang.Record",
                "java.io.Serializable",
            ]),
            getter_prefixes: strings(&["get", "is"]),
            setter_prefix: "set".to_string(),
        }
    }
}

impl HostConventions {
    pub fn is_container(&self, type_name: &str) -> bool {
        self.container_types.iter().any(|t| t == type_name)
    }

    pub fn is_map(&self, type_name: &str) -> bool {
        self.map_types.iter().any(|t| t == type_name)
    }

    pub fn is_char_sequence(&self, type_name: &str) -> bool {
        self.char_sequence_types.iter().any(|t| t == type_name)
    }

    pub fn is_foundational(&self, type_name: &str) -> bool {
        self.foundational_types.iter().any(|t| t == type_name)
    }
}

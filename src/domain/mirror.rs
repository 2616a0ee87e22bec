use crate::domain::model::AccessLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 可辨識的領域建模能力 (capability marker)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    AggregateRoot,
    Entity,
    ValueObject,
    Identity,
    DomainEvent,
    DomainCommand,
    Repository,
    ApplicationService,
    DomainService,
    OutboundService,
    QueryClient,
    QueryHandler,
    ReadModel,
    Enum,
    ServiceKind,
}

impl Capability {
    pub const ALL: [Capability; 15] = [
        Capability::AggregateRoot,
        Capability::Entity,
        Capability::ValueObject,
        Capability::Identity,
        Capability::DomainEvent,
        Capability::DomainCommand,
        Capability::Repository,
        Capability::ApplicationService,
        Capability::DomainService,
        Capability::OutboundService,
        Capability::QueryClient,
        Capability::QueryHandler,
        Capability::ReadModel,
        Capability::Enum,
        Capability::ServiceKind,
    ];
}

/// 分類後每個型別唯一的變體標籤
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTypeKind {
    AggregateRoot,
    Entity,
    ValueObject,
    Identity,
    DomainEvent,
    DomainCommand,
    Repository,
    ApplicationService,
    DomainService,
    OutboundService,
    QueryClient,
    QueryHandler,
    ReadModel,
    Enum,
    GenericServiceKind,
}

impl DomainTypeKind {
    pub fn is_service(self) -> bool {
        matches!(
            self,
            DomainTypeKind::Repository
                | DomainTypeKind::ApplicationService
                | DomainTypeKind::DomainService
                | DomainTypeKind::OutboundService
                | DomainTypeKind::QueryClient
                | DomainTypeKind::QueryHandler
                | DomainTypeKind::GenericServiceKind
        )
    }
}

impl fmt::Display for DomainTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
    IsGreaterOrEqual,
    IsGreaterOrEqualNonDecimal,
    IsLessOrEqual,
    IsLessOrEqualNonDecimal,
    IsGreaterThan,
    IsLessThan,
    IsNegative,
    IsNegativeOrZero,
    IsPositive,
    IsPositiveOrZero,
    HasSize,
    HasLength,
    HasMaxDigits,
    IsPast,
    IsPastOrPresent,
    IsFuture,
    IsFutureOrPresent,
    RegEx,
    IsNotEmpty,
    IsNotEmptyIterable,
    IsNotBlank,
    IsValidEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionMirror {
    pub kind: AssertionKind,
    pub min: Option<String>,
    pub max: Option<String>,
    /// 僅 `RegEx` 使用
    pub pattern: Option<String>,
    pub message: String,
}

/// 解析後的成員型別
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeMirror {
    Scalar {
        name: String,
    },
    Container {
        container: String,
        element: Box<TypeMirror>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        element_assertions: Vec<AssertionMirror>,
    },
    Map {
        container: String,
        key: Box<TypeMirror>,
        value: Box<TypeMirror>,
    },
    Domain {
        name: String,
    },
    Unknown,
}

impl TypeMirror {
    /// 型別名稱；容器與 map 回傳容器名稱
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeMirror::Scalar { name } | TypeMirror::Domain { name } => Some(name),
            TypeMirror::Container { container, .. } | TypeMirror::Map { container, .. } => {
                Some(container)
            }
            TypeMirror::Unknown => None,
        }
    }

    /// 所有 (含巢狀) 的領域型別參照
    pub fn domain_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_domain_references(&mut refs);
        refs
    }

    fn collect_domain_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            TypeMirror::Domain { name } => refs.push(name),
            TypeMirror::Container { element, .. } => element.collect_domain_references(refs),
            TypeMirror::Map { key, value, .. } => {
                key.collect_domain_references(refs);
                value.collect_domain_references(refs);
            }
            TypeMirror::Scalar { .. } | TypeMirror::Unknown => {}
        }
    }

    /// 比較簽章用的形狀：忽略元素約束
    pub fn same_shape(&self, other: &TypeMirror) -> bool {
        match (self, other) {
            (
                TypeMirror::Container {
                    container: a,
                    element: ea,
                    ..
                },
                TypeMirror::Container {
                    container: b,
                    element: eb,
                    ..
                },
            ) => a == b && ea.same_shape(eb),
            (
                TypeMirror::Map {
                    container: a,
                    key: ka,
                    value: va,
                },
                TypeMirror::Map {
                    container: b,
                    key: kb,
                    value: vb,
                },
            ) => a == b && ka.same_shape(kb) && va.same_shape(vb),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for TypeMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeMirror::Scalar { name } | TypeMirror::Domain { name } => write!(f, "{}", name),
            TypeMirror::Container {
                container, element, ..
            } => write!(f, "{}<{}>", container, element),
            TypeMirror::Map {
                container,
                key,
                value,
            } => write!(f, "{}<{}, {}>", container, key, value),
            TypeMirror::Unknown => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMirror {
    pub name: String,
    pub declared_by: String,
    pub type_mirror: TypeMirror,
    pub access: AccessLevel,
    pub modifiable: bool,
    pub publicly_readable: bool,
    pub publicly_writable: bool,
    pub is_static: bool,
    pub hidden: bool,
    pub assertions: Vec<AssertionMirror>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMirror {
    pub name: String,
    pub type_mirror: TypeMirror,
    pub assertions: Vec<AssertionMirror>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMirror {
    pub name: String,
    pub declared_by: String,
    pub access: AccessLevel,
    #[serde(default)]
    pub is_static: bool,
    pub parameters: Vec<ParameterMirror>,
    /// `None` 表示 void
    pub return_type: Option<TypeMirror>,
    pub overridden: bool,
    pub published_events: Vec<String>,
    pub listened_event: Option<String>,
}

impl MethodMirror {
    /// 完全相同的簽章：名稱、回傳型別、位置參數型別
    pub fn same_signature(&self, other: &MethodMirror) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && match (&self.return_type, &other.return_type) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_shape(b),
                _ => false,
            }
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.type_mirror.same_shape(&b.type_mirror))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRelations {
    pub identity_field: Option<String>,
    pub concurrency_field: Option<String>,
    pub identity_type: Option<String>,
    /// `identity_type` 是領域型別 (非純量)，需通過完整性檢查
    #[serde(default)]
    pub identity_type_is_domain: bool,
}

/// 各變體專屬的屬性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DomainTypeVariant {
    AggregateRoot(EntityRelations),
    Entity(EntityRelations),
    ValueObject,
    Identity {
        value_type: Option<String>,
        #[serde(default)]
        value_type_is_domain: bool,
    },
    DomainEvent,
    DomainCommand { target_type: Option<String> },
    Repository { managed_aggregate_type: Option<String> },
    ApplicationService,
    DomainService,
    OutboundService,
    QueryClient { read_model_type: Option<String> },
    QueryHandler { read_model_type: Option<String> },
    ReadModel,
    Enum { options: Vec<String> },
    GenericServiceKind,
}

impl DomainTypeVariant {
    pub fn kind(&self) -> DomainTypeKind {
        match self {
            DomainTypeVariant::AggregateRoot(_) => DomainTypeKind::AggregateRoot,
            DomainTypeVariant::Entity(_) => DomainTypeKind::Entity,
            DomainTypeVariant::ValueObject => DomainTypeKind::ValueObject,
            DomainTypeVariant::Identity { .. } => DomainTypeKind::Identity,
            DomainTypeVariant::DomainEvent => DomainTypeKind::DomainEvent,
            DomainTypeVariant::DomainCommand { .. } => DomainTypeKind::DomainCommand,
            DomainTypeVariant::Repository { .. } => DomainTypeKind::Repository,
            DomainTypeVariant::ApplicationService => DomainTypeKind::ApplicationService,
            DomainTypeVariant::DomainService => DomainTypeKind::DomainService,
            DomainTypeVariant::OutboundService => DomainTypeKind::OutboundService,
            DomainTypeVariant::QueryClient { .. } => DomainTypeKind::QueryClient,
            DomainTypeVariant::QueryHandler { .. } => DomainTypeKind::QueryHandler,
            DomainTypeVariant::ReadModel => DomainTypeKind::ReadModel,
            DomainTypeVariant::Enum { .. } => DomainTypeKind::Enum,
            DomainTypeVariant::GenericServiceKind => DomainTypeKind::GenericServiceKind,
        }
    }

    /// 變體關係所參照的型別名稱 (關係名稱, 型別名稱)
    pub fn relation_references(&self) -> Vec<(&'static str, &str)> {
        let mut refs = Vec::new();
        match self {
            DomainTypeVariant::AggregateRoot(EntityRelations {
                identity_type: Some(t),
                identity_type_is_domain: true,
                ..
            })
            | DomainTypeVariant::Entity(EntityRelations {
                identity_type: Some(t),
                identity_type_is_domain: true,
                ..
            }) => refs.push(("identity type", t.as_str())),
            DomainTypeVariant::Identity {
                value_type: Some(t),
                value_type_is_domain: true,
            } => refs.push(("value type", t.as_str())),
            DomainTypeVariant::DomainCommand {
                target_type: Some(t),
            } => refs.push(("target type", t.as_str())),
            DomainTypeVariant::Repository {
                managed_aggregate_type: Some(t),
            } => refs.push(("managed aggregate", t.as_str())),
            DomainTypeVariant::QueryClient {
                read_model_type: Some(t),
            }
            | DomainTypeVariant::QueryHandler {
                read_model_type: Some(t),
            } => refs.push(("read model", t.as_str())),
            _ => {}
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTypeMirror {
    pub type_name: String,
    pub is_abstract: bool,
    pub fields: Vec<FieldMirror>,
    pub methods: Vec<MethodMirror>,
    /// 最具體的在前
    pub ancestors: Vec<String>,
    pub interfaces: Vec<String>,
    pub variant: DomainTypeVariant,
}

impl DomainTypeMirror {
    pub fn kind(&self) -> DomainTypeKind {
        self.variant.kind()
    }

    pub fn field(&self, name: &str) -> Option<&FieldMirror> {
        self.fields.iter().find(|f| f.name == name && !f.hidden)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodMirror> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn entity_relations(&self) -> Option<&EntityRelations> {
        match &self.variant {
            DomainTypeVariant::AggregateRoot(relations) | DomainTypeVariant::Entity(relations) => {
                Some(relations)
            }
            _ => None,
        }
    }

    pub fn identity_field(&self) -> Option<&FieldMirror> {
        let name = self.entity_relations()?.identity_field.as_deref()?;
        self.field(name)
    }

    pub fn concurrency_field(&self) -> Option<&FieldMirror> {
        let name = self.entity_relations()?.concurrency_field.as_deref()?;
        self.field(name)
    }

    pub fn is_subtype_of(&self, type_name: &str) -> bool {
        self.ancestors.iter().any(|a| a == type_name)
    }
}

/// 建構過程中被丟棄的成員或型別
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    pub type_name: String,
    pub member: Option<String>,
    pub message: String,
}

/// 組裝完成、驗證過的不可變 mirror 圖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMirrorGraph {
    types: BTreeMap<String, DomainTypeMirror>,
    diagnostics: Vec<BuildDiagnostic>,
    built_at: DateTime<Utc>,
}

impl DomainMirrorGraph {
    pub fn new(types: BTreeMap<String, DomainTypeMirror>, diagnostics: Vec<BuildDiagnostic>) -> Self {
        Self {
            types,
            diagnostics,
            built_at: Utc::now(),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&DomainTypeMirror> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn of_kind(&self, kind: DomainTypeKind) -> impl Iterator<Item = &DomainTypeMirror> {
        self.types.values().filter(move |t| t.kind() == kind)
    }

    pub fn aggregate_roots(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::AggregateRoot)
    }

    pub fn entities(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::Entity)
    }

    pub fn value_objects(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::ValueObject)
    }

    pub fn identities(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::Identity)
    }

    pub fn domain_events(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::DomainEvent)
    }

    pub fn domain_commands(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::DomainCommand)
    }

    pub fn repositories(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::Repository)
    }

    pub fn read_models(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::ReadModel)
    }

    pub fn enums(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.of_kind(DomainTypeKind::Enum)
    }

    pub fn services(&self) -> impl Iterator<Item = &DomainTypeMirror> {
        self.types.values().filter(|t| t.kind().is_service())
    }

    pub fn entity_relations(&self, type_name: &str) -> Option<&EntityRelations> {
        self.get(type_name)?.entity_relations()
    }

    /// 管理指定 aggregate 的 repositories
    pub fn repository_for<'a>(
        &'a self,
        aggregate: &'a str,
    ) -> impl Iterator<Item = &'a DomainTypeMirror> {
        self.repositories().filter(move |r| {
            matches!(
                &r.variant,
                DomainTypeVariant::Repository { managed_aggregate_type: Some(t) } if t == aggregate
            )
        })
    }

    pub fn subtypes_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a DomainTypeMirror> {
        self.types.values().filter(move |t| t.is_subtype_of(type_name))
    }

    /// 發布指定事件的方法 (型別名稱, 方法名稱)
    pub fn publishers_of(&self, event: &str) -> Vec<(&str, &str)> {
        self.types
            .values()
            .flat_map(|t| {
                t.methods
                    .iter()
                    .filter(|m| !m.overridden && m.published_events.iter().any(|e| e == event))
                    .map(move |m| (t.type_name.as_str(), m.name.as_str()))
            })
            .collect()
    }

    pub fn listeners_of(&self, event: &str) -> Vec<(&str, &str)> {
        self.types
            .values()
            .flat_map(|t| {
                t.methods
                    .iter()
                    .filter(|m| !m.overridden && m.listened_event.as_deref() == Some(event))
                    .map(move |m| (t.type_name.as_str(), m.name.as_str()))
            })
            .collect()
    }
}

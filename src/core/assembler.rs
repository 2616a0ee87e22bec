use crate::config::conventions::{HostConventions, MarkerSet};
use crate::core::catalog::TypeCatalog;
use crate::core::generics::GenericParameterResolver;
use crate::core::members::{MemberMirrorBuilder, MemberMirrors};
use crate::domain::mirror::{
    BuildDiagnostic, DomainMirrorGraph, DomainTypeKind, DomainTypeMirror, DomainTypeVariant,
    EntityRelations,
};
use crate::domain::model::TypeRef;
use crate::domain::ports::GenericResolutionOverride;
use crate::utils::error::{ErrorCategory, MirrorError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// 分類結果 + 成員 mirrors → `DomainMirrorGraph`
pub struct DomainMirrorAssembler<'a> {
    catalog: &'a TypeCatalog,
    markers: &'a MarkerSet,
    conventions: &'a HostConventions,
    resolution_override: Option<&'a dyn GenericResolutionOverride>,
}

impl<'a> DomainMirrorAssembler<'a> {
    pub fn new(catalog: &'a TypeCatalog, markers: &'a MarkerSet, conventions: &'a HostConventions) -> Self {
        Self {
            catalog,
            markers,
            conventions,
            resolution_override: None,
        }
    }

    pub fn with_override(mut self, resolution_override: Option<&'a dyn GenericResolutionOverride>) -> Self {
        self.resolution_override = resolution_override;
        self
    }

    /// 單一型別失敗只丟棄該型別；marker 宣告本身不合法則整體失敗
    pub fn assemble(&self, classified: &BTreeMap<String, DomainTypeKind>) -> Result<DomainMirrorGraph> {
        let resolver = match self.resolution_override {
            Some(o) => GenericParameterResolver::new(self.catalog).with_override(o),
            None => GenericParameterResolver::new(self.catalog),
        };
        let domain_types: BTreeSet<String> = classified.keys().cloned().collect();
        let builder = MemberMirrorBuilder::new(
            self.catalog,
            &resolver,
            self.conventions,
            self.markers,
            &domain_types,
        );

        let mut types = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for (name, kind) in classified {
            match self.assemble_type(name, *kind, &resolver, &builder) {
                Ok((mirror, members)) => {
                    diagnostics.extend(members.diagnostics);
                    types.insert(name.clone(), mirror);
                }
                Err(e) if e.category() == ErrorCategory::Resolution => return Err(e),
                Err(e) => {
                    tracing::warn!("⚠️ Dropping type {}: {}", name, e);
                    diagnostics.push(BuildDiagnostic {
                        type_name: name.clone(),
                        member: None,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "🧩 Assembled {} type mirror(s), {} diagnostic(s)",
            types.len(),
            diagnostics.len()
        );
        Ok(DomainMirrorGraph::new(types, diagnostics))
    }

    fn assemble_type(
        &self,
        name: &str,
        kind: DomainTypeKind,
        resolver: &GenericParameterResolver<'_>,
        builder: &MemberMirrorBuilder<'_>,
    ) -> Result<(DomainTypeMirror, MemberMirrors)> {
        let descriptor = self
            .catalog
            .descriptor(name)
            .ok_or_else(|| MirrorError::TypeBuildError {
                type_name: name.to_string(),
                message: "descriptor missing from the catalog".to_string(),
            })?;
        let mut members = builder.build(name);
        let relation = |marker: &str, slot: usize| self.relation(resolver, name, marker, slot);

        let variant = match kind {
            DomainTypeKind::AggregateRoot | DomainTypeKind::Entity => {
                let identity_type = relation(self.markers.entity.as_str(), 0)?;
                let relations = EntityRelations {
                    identity_field: builder.select_identity_field(&members, identity_type.as_deref()),
                    concurrency_field: builder.select_concurrency_field(&members),
                    identity_type_is_domain: identity_type
                        .as_deref()
                        .is_some_and(|t| builder.is_domain_type(t)),
                    identity_type,
                };
                if kind == DomainTypeKind::AggregateRoot {
                    DomainTypeVariant::AggregateRoot(relations)
                } else {
                    DomainTypeVariant::Entity(relations)
                }
            }
            DomainTypeKind::Identity => {
                let value_type = relation(self.markers.identity.as_str(), 0)?;
                DomainTypeVariant::Identity {
                    value_type_is_domain: value_type
                        .as_deref()
                        .is_some_and(|t| builder.is_domain_type(t)),
                    value_type,
                }
            }
            DomainTypeKind::DomainCommand => DomainTypeVariant::DomainCommand {
                target_type: relation(self.markers.domain_command.as_str(), 0)?,
            },
            DomainTypeKind::Repository => DomainTypeVariant::Repository {
                managed_aggregate_type: relation(self.markers.repository.as_str(), 1)?,
            },
            DomainTypeKind::QueryClient => DomainTypeVariant::QueryClient {
                read_model_type: relation(self.markers.query_client.as_str(), 0)?,
            },
            DomainTypeKind::QueryHandler => DomainTypeVariant::QueryHandler {
                read_model_type: relation(self.markers.query_handler.as_str(), 0)?,
            },
            DomainTypeKind::Enum => DomainTypeVariant::Enum {
                options: descriptor.enum_constants.clone(),
            },
            DomainTypeKind::ValueObject => DomainTypeVariant::ValueObject,
            DomainTypeKind::DomainEvent => DomainTypeVariant::DomainEvent,
            DomainTypeKind::ReadModel => DomainTypeVariant::ReadModel,
            DomainTypeKind::ApplicationService => DomainTypeVariant::ApplicationService,
            DomainTypeKind::DomainService => DomainTypeVariant::DomainService,
            DomainTypeKind::OutboundService => DomainTypeVariant::OutboundService,
            DomainTypeKind::GenericServiceKind => DomainTypeVariant::GenericServiceKind,
        };

        let mirror = DomainTypeMirror {
            type_name: name.to_string(),
            is_abstract: descriptor.is_abstract,
            fields: std::mem::take(&mut members.fields),
            methods: std::mem::take(&mut members.methods),
            ancestors: self.catalog.ancestors(name),
            interfaces: descriptor
                .interfaces
                .iter()
                .filter_map(TypeRef::raw_name)
                .map(str::to_string)
                .collect(),
            variant,
        };
        tracing::debug!("{} assembled as {}", name, mirror.kind());
        Ok((mirror, members))
    }

    /// 經由 marker 的泛型 slot 解析衍生關係；marker 非泛型或 slot 不存在時為 `None`
    fn relation(
        &self,
        resolver: &GenericParameterResolver<'_>,
        name: &str,
        marker: &str,
        slot: usize,
    ) -> Result<Option<String>> {
        let declares_slot = self
            .catalog
            .descriptor(marker)
            .is_some_and(|d| slot < d.type_params.len());
        if !declares_slot || !self.catalog.is_subtype(name, marker) {
            return Ok(None);
        }
        let resolution = resolver.resolve(name, marker, slot)?;
        Ok(resolution.type_name().map(str::to_string))
    }
}

use crate::config::conventions::{HostConventions, MarkerSet};
use crate::core::assertions::AssertionMirrorBuilder;
use crate::core::catalog::TypeCatalog;
use crate::core::generics::GenericParameterResolver;
use crate::domain::mirror::{BuildDiagnostic, FieldMirror, MethodMirror, ParameterMirror, TypeMirror};
use crate::domain::model::{
    AccessLevel, Annotation, FieldDescriptor, MethodDescriptor, TypeDescriptor, TypeKind, TypeRef,
};
use crate::utils::error::{MirrorError, Result};
use std::collections::BTreeSet;

/// 單一型別整個繼承階層的成員 mirrors
#[derive(Debug, Clone, Default)]
pub struct MemberMirrors {
    pub fields: Vec<FieldMirror>,
    pub methods: Vec<MethodMirror>,
    pub diagnostics: Vec<BuildDiagnostic>,
    /// 帶有 identity marker 註解的欄位 (宣告型別, 欄位名稱)
    identity_marked: BTreeSet<(String, String)>,
    /// 帶有 concurrency-version marker 註解的欄位 (含被遮蔽的)
    concurrency_marked: Vec<String>,
}

pub struct MemberMirrorBuilder<'a> {
    catalog: &'a TypeCatalog,
    resolver: &'a GenericParameterResolver<'a>,
    assertions: AssertionMirrorBuilder<'a>,
    conventions: &'a HostConventions,
    markers: &'a MarkerSet,
    domain_types: &'a BTreeSet<String>,
}

impl<'a> MemberMirrorBuilder<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        resolver: &'a GenericParameterResolver<'a>,
        conventions: &'a HostConventions,
        markers: &'a MarkerSet,
        domain_types: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            assertions: AssertionMirrorBuilder::new(conventions),
            conventions,
            markers,
            domain_types,
        }
    }

    /// 建立 `type_name` 全階層的欄位與方法 mirrors
    ///
    /// 單一成員失敗只會丟棄該成員並留下診斷。
    pub fn build(&self, type_name: &str) -> MemberMirrors {
        let mut members = MemberMirrors::default();
        if !self.catalog.contains(type_name) {
            members.diagnostics.push(BuildDiagnostic {
                type_name: type_name.to_string(),
                member: None,
                message: "type cannot be introspected, members left empty".to_string(),
            });
            return members;
        }

        let class_chain: Vec<&TypeDescriptor> = self
            .catalog
            .class_chain(type_name)
            .iter()
            .filter_map(|name| self.catalog.descriptor(name))
            .collect();
        let hierarchy: Vec<&TypeDescriptor> = std::iter::once(type_name.to_string())
            .chain(self.catalog.ancestors(type_name))
            .filter_map(|name| self.catalog.descriptor(&name))
            .collect();

        for declaring in &class_chain {
            for field in declaring.fields.iter().filter(|f| !f.synthetic) {
                match self.build_field(type_name, declaring, field, &hierarchy) {
                    Ok(mirror) => {
                        if field.has_annotation(&self.markers.identity_annotation) {
                            members
                                .identity_marked
                                .insert((declaring.name.clone(), field.name.clone()));
                        }
                        if field.has_annotation(&self.markers.concurrency_annotation) {
                            members.concurrency_marked.push(field.name.clone());
                        }
                        members.fields.push(mirror);
                    }
                    Err(e) => drop_member(&mut members, type_name, &field.name, e),
                }
            }
        }

        for declaring in &hierarchy {
            for method in declaring.methods.iter().filter(|m| !m.synthetic) {
                match self.build_method(type_name, declaring, method) {
                    Ok(mirror) => members.methods.push(mirror),
                    Err(e) => drop_member(&mut members, type_name, &method.name, e),
                }
            }
        }

        self.mark_hidden_fields(&mut members.fields);
        self.mark_overridden_methods(&mut members.methods);
        tracing::debug!(
            "{}: {} field(s), {} method(s), {} dropped",
            type_name,
            members.fields.len(),
            members.methods.len(),
            members.diagnostics.len()
        );
        members
    }

    fn build_field(
        &self,
        concrete: &str,
        declaring: &TypeDescriptor,
        field: &FieldDescriptor,
        hierarchy: &[&TypeDescriptor],
    ) -> Result<FieldMirror> {
        let resolved =
            self.resolver
                .resolve_member_type(concrete, &declaring.name, &[], &field.type_ref)?;
        let type_mirror = self.type_mirror(&resolved, &field.element_annotations);
        let assertions = self.assertions.build_all(&field.annotations, &type_mirror);

        let is_public = field.access == AccessLevel::Public;
        let publicly_readable = is_public || has_getter(declaring, field, hierarchy, self.conventions);
        let publicly_writable =
            (is_public && !field.is_final) || has_setter(field, hierarchy, self.conventions);

        Ok(FieldMirror {
            name: field.name.clone(),
            declared_by: declaring.name.clone(),
            type_mirror,
            access: field.access,
            modifiable: !field.is_final,
            publicly_readable,
            publicly_writable,
            is_static: field.is_static,
            hidden: false,
            assertions,
        })
    }

    fn build_method(
        &self,
        concrete: &str,
        declaring: &TypeDescriptor,
        method: &MethodDescriptor,
    ) -> Result<MethodMirror> {
        let parameters = method
            .parameters
            .iter()
            .map(|param| {
                let resolved = self.resolver.resolve_member_type(
                    concrete,
                    &declaring.name,
                    &method.type_params,
                    &param.type_ref,
                )?;
                let type_mirror = self.type_mirror(&resolved, &[]);
                let assertions = self.assertions.build_all(&param.annotations, &type_mirror);
                Ok(ParameterMirror {
                    name: param.name.clone(),
                    type_mirror,
                    assertions,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let return_type = method
            .return_type
            .as_ref()
            .map(|r| {
                self.resolver
                    .resolve_member_type(concrete, &declaring.name, &method.type_params, r)
                    .map(|resolved| self.type_mirror(&resolved, &[]))
            })
            .transpose()?;

        let published_events = find_annotation(&method.annotations, &self.markers.publishes_annotation)
            .and_then(|a| a.attributes.get(&self.markers.publishes_attribute))
            .map(|v| v.as_list())
            .unwrap_or_default();
        let listened_event = find_annotation(&method.annotations, &self.markers.listens_annotation)
            .and_then(|a| a.text(&self.markers.listens_attribute))
            .map(str::to_string);

        Ok(MethodMirror {
            name: method.name.clone(),
            declared_by: declaring.name.clone(),
            access: method.access,
            is_static: method.is_static,
            parameters,
            return_type,
            overridden: false,
            published_events,
            listened_event,
        })
    }

    /// 已解析的 `TypeRef` → `TypeMirror`
    pub fn type_mirror(&self, resolved: &TypeRef, element_annotations: &[Annotation]) -> TypeMirror {
        match resolved {
            TypeRef::Wildcard { upper: Some(upper) } => self.type_mirror(upper, element_annotations),
            TypeRef::Wildcard { upper: None } | TypeRef::Variable { .. } => TypeMirror::Unknown,
            TypeRef::Array { component } => self.container("[]", component, element_annotations),
            TypeRef::Named { name, args } if self.conventions.is_map(name) => TypeMirror::Map {
                container: name.clone(),
                key: Box::new(self.arg_mirror(args.first())),
                value: Box::new(self.arg_mirror(args.get(1))),
            },
            TypeRef::Named { name, args } if self.conventions.is_container(name) => match args.first() {
                Some(element) => self.container(name, element, element_annotations),
                None => self.container(name, &TypeRef::Wildcard { upper: None }, element_annotations),
            },
            TypeRef::Named { name, .. } if self.is_domain_type(name) => {
                TypeMirror::Domain { name: name.clone() }
            }
            TypeRef::Named { name, .. } => TypeMirror::Scalar { name: name.clone() },
        }
    }

    fn container(&self, container: &str, element: &TypeRef, element_annotations: &[Annotation]) -> TypeMirror {
        let element = self.type_mirror(element, &[]);
        let element_assertions = self.assertions.build_all(element_annotations, &element);
        TypeMirror::Container {
            container: container.to_string(),
            element: Box::new(element),
            element_assertions,
        }
    }

    fn arg_mirror(&self, arg: Option<&TypeRef>) -> TypeMirror {
        arg.map(|a| self.type_mirror(a, &[])).unwrap_or(TypeMirror::Unknown)
    }

    /// 已分類，或目錄顯示它滿足任一 capability marker
    pub fn is_domain_type(&self, type_name: &str) -> bool {
        self.domain_types.contains(type_name)
            || self
                .catalog
                .satisfies_any(type_name, &self.markers.all_markers())
    }

    /// 欄位 F (宣告於 A) 在 A 的嚴格子型別也宣告同名欄位時被遮蔽
    fn mark_hidden_fields(&self, fields: &mut [FieldMirror]) {
        let shadowed: Vec<bool> = fields
            .iter()
            .map(|field| {
                fields.iter().any(|other| {
                    other.name == field.name
                        && other.declared_by != field.declared_by
                        && self.catalog.is_subtype(&other.declared_by, &field.declared_by)
                })
            })
            .collect();
        for (field, hidden) in fields.iter_mut().zip(shadowed) {
            field.hidden = hidden;
        }
    }

    /// 子型別有完全相同簽章且存取層級不更嚴格的實例方法時，祖先的方法被覆寫
    ///
    /// static 與 private 方法不參與覆寫。覆寫者未自行標註事件時沿用祖先的事件註解。
    fn mark_overridden_methods(&self, methods: &mut [MethodMirror]) {
        let overriders: Vec<Option<usize>> = methods
            .iter()
            .map(|method| {
                if method.is_static || method.access == AccessLevel::Private {
                    return None;
                }
                methods.iter().rposition(|other| {
                    !other.is_static
                        && other.declared_by != method.declared_by
                        && self.catalog.is_subtype(&other.declared_by, &method.declared_by)
                        && other.access >= method.access
                        && other.same_signature(method)
                })
            })
            .collect();

        // 取最近的覆寫者；由祖先往子型別傳遞，註解可逐層沿用
        for (index, overrider) in overriders.iter().enumerate().rev() {
            let Some(overrider) = *overrider else { continue };
            methods[index].overridden = true;
            let (published, listened) = (
                methods[index].published_events.clone(),
                methods[index].listened_event.clone(),
            );
            let target = &mut methods[overrider];
            if target.published_events.is_empty() {
                target.published_events = published;
            }
            if target.listened_event.is_none() {
                target.listened_event = listened;
            }
        }
    }

    /// Identity 欄位：唯一候選直接選中；多個候選時只接受唯一被標記者
    pub fn select_identity_field(&self, members: &MemberMirrors, identity_type: Option<&str>) -> Option<String> {
        let candidates: Vec<&FieldMirror> = members
            .fields
            .iter()
            .filter(|f| !f.hidden && !f.is_static)
            .filter(|f| match &f.type_mirror {
                TypeMirror::Scalar { name } | TypeMirror::Domain { name } => {
                    identity_type == Some(name.as_str())
                        || (name != &self.markers.identity
                            && self.catalog.is_subtype(name, &self.markers.identity))
                }
                _ => false,
            })
            .collect();

        match candidates.as_slice() {
            [] => None,
            [only] => Some(only.name.clone()),
            many => {
                let marked: Vec<&&FieldMirror> = many
                    .iter()
                    .filter(|f| {
                        members
                            .identity_marked
                            .contains(&(f.declared_by.clone(), f.name.clone()))
                    })
                    .collect();
                match marked.as_slice() {
                    [only] => Some(only.name.clone()),
                    _ => {
                        tracing::debug!(
                            "{} identity candidates without a unique marker, none selected",
                            many.len()
                        );
                        None
                    }
                }
            }
        }
    }

    /// 整個階層恰好一個 concurrency-version 欄位時才選中
    pub fn select_concurrency_field(&self, members: &MemberMirrors) -> Option<String> {
        match members.concurrency_marked.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }
}

fn drop_member(members: &mut MemberMirrors, type_name: &str, member: &str, cause: MirrorError) {
    let error = MirrorError::MemberBuildError {
        type_name: type_name.to_string(),
        member: member.to_string(),
        message: cause.to_string(),
    };
    tracing::warn!("⚠️ {}", error);
    members.diagnostics.push(BuildDiagnostic {
        type_name: type_name.to_string(),
        member: Some(member.to_string()),
        message: cause.to_string(),
    });
}

fn find_annotation<'n>(annotations: &'n [Annotation], name: &str) -> Option<&'n Annotation> {
    annotations.iter().find(|a| a.name == name)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_public_instance(method: &MethodDescriptor) -> bool {
    method.access == AccessLevel::Public && !method.is_static
}

fn has_getter(
    declaring: &TypeDescriptor,
    field: &FieldDescriptor,
    hierarchy: &[&TypeDescriptor],
    conventions: &HostConventions,
) -> bool {
    let capitalized = capitalize(&field.name);
    let accepted: Vec<String> = conventions
        .getter_prefixes
        .iter()
        .map(|prefix| format!("{}{}", prefix, capitalized))
        .collect();
    let record_accessor = declaring.kind == TypeKind::Record;
    hierarchy.iter().flat_map(|t| t.methods.iter()).any(|m| {
        is_public_instance(m)
            && m.parameters.is_empty()
            && m.return_type.is_some()
            && (accepted.contains(&m.name) || (record_accessor && m.name == field.name))
    })
}

fn has_setter(field: &FieldDescriptor, hierarchy: &[&TypeDescriptor], conventions: &HostConventions) -> bool {
    if field.is_final {
        return false;
    }
    let setter = format!("{}{}", conventions.setter_prefix, capitalize(&field.name));
    hierarchy
        .iter()
        .flat_map(|t| t.methods.iter())
        .any(|m| is_public_instance(m) && m.parameters.len() == 1 && m.name == setter)
}

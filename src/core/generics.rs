use crate::core::catalog::TypeCatalog;
use crate::domain::model::{TypeDescriptor, TypeParameter, TypeRef};
use crate::domain::ports::GenericResolutionOverride;
use crate::utils::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 泛型參數解析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 在繼承鏈上找到具體綁定
    Concrete(TypeRef),
    /// 沒有綁定，退回變數宣告的第一個 bound
    Bound(TypeRef),
    /// 既無綁定也無 bound，呼叫端視為未知 / top type
    Unresolved,
}

impl Resolution {
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            Resolution::Concrete(t) | Resolution::Bound(t) => Some(t),
            Resolution::Unresolved => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_ref().and_then(TypeRef::raw_name)
    }

    pub fn into_type_ref(self) -> Option<TypeRef> {
        match self {
            Resolution::Concrete(t) | Resolution::Bound(t) => Some(t),
            Resolution::Unresolved => None,
        }
    }
}

/// 解析結果連同實際下降的層數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTrace {
    pub resolution: Resolution,
    pub steps: usize,
}

/// 沿繼承 / 介面鏈把泛型宣告上的型別變數解析到具體型別
///
/// 純函式：相同的 (concrete, declaration, slot) 永遠得到相同結果，
/// 走訪步數上限為連接鏈的長度。
pub struct GenericParameterResolver<'a> {
    catalog: &'a TypeCatalog,
    resolution_override: Option<&'a dyn GenericResolutionOverride>,
}

impl<'a> GenericParameterResolver<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            catalog,
            resolution_override: None,
        }
    }

    pub fn with_override(mut self, resolution_override: &'a dyn GenericResolutionOverride) -> Self {
        self.resolution_override = Some(resolution_override);
        self
    }

    pub fn resolve(&self, concrete: &str, declaration: &str, slot: usize) -> Result<Resolution> {
        self.trace(concrete, declaration, slot).map(|t| t.resolution)
    }

    /// `resolve` 加上步數，先檢查宣告的前置條件
    pub fn trace(&self, concrete: &str, declaration: &str, slot: usize) -> Result<ResolutionTrace> {
        let descriptor = self.declaration(declaration)?;
        if descriptor.type_params.is_empty() {
            return Err(MirrorError::NotGenericError {
                declaration: declaration.to_string(),
            });
        }
        if !(descriptor.is_interface() || descriptor.is_abstract) {
            return Err(MirrorError::NotAbstractDeclarationError {
                declaration: declaration.to_string(),
            });
        }
        if slot >= descriptor.type_params.len() {
            return Err(MirrorError::SlotOutOfRangeError {
                declaration: declaration.to_string(),
                slot,
                count: descriptor.type_params.len(),
            });
        }

        if let Some(resolution) = self.consult_override(concrete, declaration, slot) {
            return Ok(ResolutionTrace {
                resolution,
                steps: 0,
            });
        }
        Ok(self.descend(concrete, descriptor, slot))
    }

    /// 解析宣告於 `declaring` 的型別變數，不要求宣告為抽象
    pub fn resolve_variable(
        &self,
        concrete: &str,
        declaring: &str,
        variable: &str,
    ) -> Result<Resolution> {
        let descriptor = self.declaration(declaring)?;
        let slot = descriptor.type_param_index(variable).ok_or_else(|| {
            MirrorError::UnboundVariableError {
                variable: variable.to_string(),
                declaring_type: declaring.to_string(),
            }
        })?;
        if let Some(resolution) = self.consult_override(concrete, declaring, slot) {
            return Ok(resolution);
        }
        Ok(self.descend(concrete, descriptor, slot).resolution)
    }

    /// 從 `concrete` 的角度解析一個成員型別中的所有型別變數
    ///
    /// `method_params` 是方法層級的型別參數，它們退回各自的 bound。
    /// 無法解析的變數變成 `Wildcard { upper: None }` (未知)。
    pub fn resolve_member_type(
        &self,
        concrete: &str,
        declaring: &str,
        method_params: &[TypeParameter],
        type_ref: &TypeRef,
    ) -> Result<TypeRef> {
        match type_ref {
            TypeRef::Variable { name } => {
                if let Some(param) = method_params.iter().find(|p| &p.name == name) {
                    return Ok(first_bound(param).unwrap_or(UNKNOWN));
                }
                let resolution = self.resolve_variable(concrete, declaring, name)?;
                Ok(resolution.into_type_ref().unwrap_or(UNKNOWN))
            }
            TypeRef::Named { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.resolve_member_type(concrete, declaring, method_params, a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeRef::generic(name.clone(), args))
            }
            TypeRef::Array { component } => Ok(TypeRef::array(self.resolve_member_type(
                concrete,
                declaring,
                method_params,
                component,
            )?)),
            TypeRef::Wildcard { upper: Some(upper) } => {
                self.resolve_member_type(concrete, declaring, method_params, upper)
            }
            TypeRef::Wildcard { upper: None } => Ok(UNKNOWN),
        }
    }

    fn declaration(&self, name: &str) -> Result<&'a TypeDescriptor> {
        self.catalog
            .descriptor(name)
            .ok_or_else(|| MirrorError::UnknownTypeError {
                name: name.to_string(),
            })
    }

    fn consult_override(&self, concrete: &str, declaration: &str, slot: usize) -> Option<Resolution> {
        self.resolution_override
            .and_then(|o| o.resolve(concrete, declaration, slot))
    }

    /// 連接 `concrete` 與 `declaration` 的鏈：由最一般 (宣告本身) 到最具體，去重
    fn connecting_chain(&self, concrete: &str, declaration: &str) -> Vec<String> {
        let members: Vec<String> = std::iter::once(concrete.to_string())
            .chain(self.catalog.ancestors(concrete))
            .filter(|t| self.catalog.is_subtype(t, declaration))
            .collect();
        if !members.iter().any(|m| m == declaration) {
            return Vec::new();
        }

        let depth = |t: &str| {
            members
                .iter()
                .filter(|other| other.as_str() != t && self.catalog.is_subtype(t, other))
                .count()
        };
        let mut ranked: Vec<(usize, String)> =
            members.iter().map(|m| (depth(m.as_str()), m.clone())).collect();
        ranked.sort();
        ranked.into_iter().map(|(_, name)| name).collect()
    }

    fn descend(&self, concrete: &str, declaration: &TypeDescriptor, slot: usize) -> ResolutionTrace {
        let chain = self.connecting_chain(concrete, &declaration.name);
        let mut declaring = declaration.name.clone();
        let mut term = TypeRef::var(declaration.type_params[slot].name.clone());
        let mut visited: HashSet<(String, String)> = HashSet::new();
        let mut steps = 0;

        for type_name in chain.iter().skip(1) {
            let Some(usage) = self.usage_of(type_name, &declaring) else {
                continue;
            };
            if !visited.insert((type_name.clone(), term.to_string())) {
                tracing::debug!(
                    "Revisited {} at {} while resolving {}, stopping",
                    term,
                    type_name,
                    concrete
                );
                break;
            }
            steps += 1;
            let Some(owner) = self.catalog.descriptor(&declaring) else {
                break;
            };
            if usage.args().len() != owner.type_params.len() {
                // raw usage: the binding is lost at this level
                break;
            }
            let bindings: BTreeMap<&str, &TypeRef> = owner
                .type_params
                .iter()
                .map(|p| p.name.as_str())
                .zip(usage.args())
                .collect();
            term = term.substitute(&bindings);
            declaring = type_name.clone();

            if !term.contains_variables() {
                return ResolutionTrace {
                    resolution: Resolution::Concrete(term),
                    steps,
                };
            }
        }

        ResolutionTrace {
            resolution: self.fallback(&declaring, &term),
            steps,
        }
    }

    /// `type_name` 對 `supertype` 的直接使用位置
    fn usage_of(&self, type_name: &str, supertype: &str) -> Option<&'a TypeRef> {
        self.catalog
            .descriptor(type_name)?
            .direct_supertypes()
            .find(|usage| usage.raw_name() == Some(supertype))
    }

    fn fallback(&self, declaring: &str, term: &TypeRef) -> Resolution {
        match self.erase_to_bounds(declaring, term) {
            Some(bound) => Resolution::Bound(bound),
            None => Resolution::Unresolved,
        }
    }

    fn erase_to_bounds(&self, declaring: &str, term: &TypeRef) -> Option<TypeRef> {
        match term {
            TypeRef::Variable { name } => self
                .catalog
                .descriptor(declaring)?
                .type_params
                .iter()
                .find(|p| &p.name == name)
                .and_then(first_bound),
            TypeRef::Named { .. } => Some(term.erased()),
            TypeRef::Array { component } => self
                .erase_to_bounds(declaring, component)
                .map(TypeRef::array),
            TypeRef::Wildcard { upper } => upper
                .as_ref()
                .and_then(|u| self.erase_to_bounds(declaring, u)),
        }
    }
}

const UNKNOWN: TypeRef = TypeRef::Wildcard { upper: None };

/// 第一個 bound；參數化的 bound 取其原始型別，變數 bound 無法使用
fn first_bound(param: &TypeParameter) -> Option<TypeRef> {
    match param.bounds.first()? {
        TypeRef::Variable { .. } => None,
        bound if bound.is_parametric() => Some(bound.erased()),
        bound => Some(bound.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TypeDescriptor;

    fn catalog(descriptors: Vec<TypeDescriptor>) -> TypeCatalog {
        TypeCatalog::from_descriptors(descriptors, BTreeMap::new())
    }

    fn string() -> TypeRef {
        TypeRef::named("java.lang.String")
    }

    fn integer() -> TypeRef {
        TypeRef::named("java.lang.Integer")
    }

    #[test]
    fn test_binding_on_intermediate_reaches_leaf() {
        // Base<T>, Mid implements Base<String>, Leaf extends Mid
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Mid").implements(TypeRef::generic("g.Base", vec![string()])),
            TypeDescriptor::class("g.Leaf").extends(TypeRef::named("g.Mid")),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert_eq!(
            resolver.resolve("g.Leaf", "g.Base", 0).unwrap(),
            Resolution::Concrete(string())
        );
    }

    #[test]
    fn test_variable_propagates_transitively() {
        // Mid<T> extends Base<T>, Leaf extends Mid<Integer>
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Mid")
                .abstract_()
                .type_param(TypeParameter::new("T"))
                .implements(TypeRef::generic("g.Base", vec![TypeRef::var("T")])),
            TypeDescriptor::class("g.Leaf").extends(TypeRef::generic("g.Mid", vec![integer()])),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert_eq!(
            resolver.resolve("g.Leaf", "g.Base", 0).unwrap(),
            Resolution::Concrete(integer())
        );
    }

    #[test]
    fn test_renamed_and_reordered_variables() {
        // Repo<ID, A>; Crud<X, Y> extends Repo<Y, X>; OrderRepo extends Crud<Order, Long>
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Repo")
                .type_param(TypeParameter::new("ID"))
                .type_param(TypeParameter::new("A")),
            TypeDescriptor::interface("g.Crud")
                .type_param(TypeParameter::new("X"))
                .type_param(TypeParameter::new("Y"))
                .implements(TypeRef::generic(
                    "g.Repo",
                    vec![TypeRef::var("Y"), TypeRef::var("X")],
                )),
            TypeDescriptor::interface("g.OrderRepo").implements(TypeRef::generic(
                "g.Crud",
                vec![TypeRef::named("g.Order"), TypeRef::named("java.lang.Long")],
            )),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert_eq!(
            resolver.resolve("g.OrderRepo", "g.Repo", 0).unwrap().type_name(),
            Some("java.lang.Long")
        );
        assert_eq!(
            resolver.resolve("g.OrderRepo", "g.Repo", 1).unwrap().type_name(),
            Some("g.Order")
        );
    }

    #[test]
    fn test_parametric_binding_keeps_descending() {
        // Base<T>; Mid<U> implements Base<List<U>>; Leaf extends Mid<String>
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Mid")
                .abstract_()
                .type_param(TypeParameter::new("U"))
                .implements(TypeRef::generic(
                    "g.Base",
                    vec![TypeRef::generic("java.util.List", vec![TypeRef::var("U")])],
                )),
            TypeDescriptor::class("g.Leaf").extends(TypeRef::generic("g.Mid", vec![string()])),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        let resolved = resolver.resolve("g.Leaf", "g.Base", 0).unwrap();
        assert_eq!(
            resolved,
            Resolution::Concrete(TypeRef::generic("java.util.List", vec![string()]))
        );
    }

    #[test]
    fn test_unbound_variable_falls_back_to_bound() {
        // Base<T>; Mid<U extends Comparable<U>> implements Base<U>; Leaf extends Mid (raw)
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Mid")
                .abstract_()
                .type_param(TypeParameter::bounded(
                    "U",
                    TypeRef::generic("java.lang.Comparable", vec![TypeRef::var("U")]),
                ))
                .implements(TypeRef::generic("g.Base", vec![TypeRef::var("U")])),
            TypeDescriptor::class("g.Leaf").extends(TypeRef::named("g.Mid")),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert_eq!(
            resolver.resolve("g.Leaf", "g.Base", 0).unwrap(),
            Resolution::Bound(TypeRef::named("java.lang.Comparable"))
        );
    }

    #[test]
    fn test_no_binding_and_no_bound_is_unresolved() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Leaf").implements(TypeRef::named("g.Base")),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert_eq!(
            resolver.resolve("g.Leaf", "g.Base", 0).unwrap(),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_unrelated_declaration_terminates_without_error() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.A").extends(TypeRef::named("g.B")),
            TypeDescriptor::class("g.B").extends(TypeRef::named("g.A")),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        let trace = resolver.trace("g.A", "g.Base", 0).unwrap();
        assert_eq!(trace.resolution, Resolution::Unresolved);
        assert_eq!(trace.steps, 0);
    }

    #[test]
    fn test_steps_bounded_by_hierarchy_depth() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.L1")
                .abstract_()
                .type_param(TypeParameter::new("A"))
                .implements(TypeRef::generic("g.Base", vec![TypeRef::var("A")])),
            TypeDescriptor::class("g.L2")
                .abstract_()
                .type_param(TypeParameter::new("B"))
                .extends(TypeRef::generic("g.L1", vec![TypeRef::var("B")])),
            TypeDescriptor::class("g.L3").extends(TypeRef::generic("g.L2", vec![string()])),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        let trace = resolver.trace("g.L3", "g.Base", 0).unwrap();
        assert_eq!(trace.resolution, Resolution::Concrete(string()));
        assert!(trace.steps <= catalog.ancestors("g.L3").len());
    }

    #[test]
    fn test_diamond_is_deterministic() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::interface("g.Left")
                .type_param(TypeParameter::new("L"))
                .implements(TypeRef::generic("g.Base", vec![TypeRef::var("L")])),
            TypeDescriptor::interface("g.Right")
                .type_param(TypeParameter::new("R"))
                .implements(TypeRef::generic("g.Base", vec![TypeRef::var("R")])),
            TypeDescriptor::class("g.Leaf")
                .implements(TypeRef::generic("g.Left", vec![string()]))
                .implements(TypeRef::generic("g.Right", vec![string()])),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        let first = resolver.resolve("g.Leaf", "g.Base", 0).unwrap();
        let second = resolver.resolve("g.Leaf", "g.Base", 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Resolution::Concrete(string()));
    }

    #[test]
    fn test_preconditions_are_fatal() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Plain"),
            TypeDescriptor::class("g.Concrete").type_param(TypeParameter::new("T")),
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        assert!(matches!(
            resolver.resolve("g.X", "g.Plain", 0),
            Err(MirrorError::NotGenericError { .. })
        ));
        assert!(matches!(
            resolver.resolve("g.X", "g.Concrete", 0),
            Err(MirrorError::NotAbstractDeclarationError { .. })
        ));
        assert!(matches!(
            resolver.resolve("g.X", "g.Base", 1),
            Err(MirrorError::SlotOutOfRangeError { slot: 1, count: 1, .. })
        ));
        assert!(matches!(
            resolver.resolve("g.X", "g.Missing", 0),
            Err(MirrorError::UnknownTypeError { .. })
        ));
    }

    struct FixedOverride;

    impl GenericResolutionOverride for FixedOverride {
        fn resolve(&self, concrete: &str, _declaration: &str, _slot: usize) -> Option<Resolution> {
            (concrete == "g.Leaf").then(|| Resolution::Concrete(TypeRef::named("g.Overridden")))
        }
    }

    #[test]
    fn test_override_is_consulted_first() {
        let catalog = catalog(vec![
            TypeDescriptor::interface("g.Base").type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Leaf").implements(TypeRef::generic("g.Base", vec![string()])),
            TypeDescriptor::class("g.Other").implements(TypeRef::generic("g.Base", vec![string()])),
        ]);
        let fixed = FixedOverride;
        let resolver = GenericParameterResolver::new(&catalog).with_override(&fixed);

        assert_eq!(
            resolver.resolve("g.Leaf", "g.Base", 0).unwrap().type_name(),
            Some("g.Overridden")
        );
        assert_eq!(
            resolver.resolve("g.Other", "g.Base", 0).unwrap().type_name(),
            Some("java.lang.String")
        );
    }

    #[test]
    fn test_resolve_member_type_substitutes_nested_variables() {
        let catalog = catalog(vec![
            TypeDescriptor::class("g.Holder")
                .abstract_()
                .type_param(TypeParameter::new("T")),
            TypeDescriptor::class("g.Names").extends(TypeRef::generic("g.Holder", vec![string()])),
        ]);
        let resolver = GenericParameterResolver::new(&catalog);

        let resolved = resolver
            .resolve_member_type(
                "g.Names",
                "g.Holder",
                &[],
                &TypeRef::generic("java.util.List", vec![TypeRef::var("T")]),
            )
            .unwrap();
        assert_eq!(resolved.to_string(), "java.util.List<java.lang.String>");

        let err = resolver
            .resolve_member_type("g.Names", "g.Holder", &[], &TypeRef::var("Q"))
            .unwrap_err();
        assert!(matches!(err, MirrorError::UnboundVariableError { .. }));
    }
}

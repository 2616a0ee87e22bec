use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 宿主型別系統中的一個型別使用位置 (supertype 子句、欄位、參數、回傳值)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    Variable {
        name: String,
    },
    Array {
        component: Box<TypeRef>,
    },
    Wildcard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeRef::Variable { name: name.into() }
    }

    pub fn array(component: TypeRef) -> Self {
        TypeRef::Array {
            component: Box::new(component),
        }
    }

    /// 名稱型別的原始名稱 (不含型別參數)
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_parametric(&self) -> bool {
        !self.args().is_empty()
    }

    /// 去掉型別參數後的原始型別
    pub fn erased(&self) -> TypeRef {
        match self {
            TypeRef::Named { name, .. } => TypeRef::named(name.clone()),
            TypeRef::Array { component } => TypeRef::array(component.erased()),
            other => other.clone(),
        }
    }

    pub fn contains_variables(&self) -> bool {
        match self {
            TypeRef::Variable { .. } => true,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::contains_variables),
            TypeRef::Array { component } => component.contains_variables(),
            TypeRef::Wildcard { upper } => upper.as_ref().is_some_and(|u| u.contains_variables()),
        }
    }

    /// 以 `bindings` 取代型別變數，未綁定的變數保持原樣
    pub fn substitute(&self, bindings: &BTreeMap<&str, &TypeRef>) -> TypeRef {
        match self {
            TypeRef::Variable { name } => bindings
                .get(name.as_str())
                .map(|bound| (*bound).clone())
                .unwrap_or_else(|| self.clone()),
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Array { component } => TypeRef::array(component.substitute(bindings)),
            TypeRef::Wildcard { upper } => TypeRef::Wildcard {
                upper: upper.as_ref().map(|u| Box::new(u.substitute(bindings))),
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            TypeRef::Named { name, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}<{}>", name, rendered.join(", "))
            }
            TypeRef::Variable { name } => write!(f, "{}", name),
            TypeRef::Array { component } => write!(f, "{}[]", component),
            TypeRef::Wildcard { upper: None } => write!(f, "?"),
            TypeRef::Wildcard { upper: Some(u) } => write!(f, "? extends {}", u),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Package,
    Protected,
    Public,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Package
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

impl Default for TypeKind {
    fn default() -> Self {
        TypeKind::Class
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Text(String),
    List(Vec<String>),
}

impl AnnotationValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(s) => Some(s),
            AnnotationValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Vec<String> {
        match self {
            AnnotationValue::Text(s) => vec![s.clone()],
            AnnotationValue::List(items) => items.clone(),
        }
    }
}

/// 宣告式 metadata (註解)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.to_string(), AnnotationValue::Text(value.into()));
        self
    }

    pub fn with_list(mut self, key: &str, values: &[&str]) -> Self {
        self.attributes.insert(
            key.to_string(),
            AnnotationValue::List(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AnnotationValue::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<TypeRef>,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded(name: impl Into<String>, bound: TypeRef) -> Self {
        Self {
            name: name.into(),
            bounds: vec![bound],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// 作用在容器元素型別上的約束
    #[serde(default)]
    pub element_annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            access: AccessLevel::Private,
            is_static: false,
            is_final: false,
            synthetic: false,
            annotations: Vec::new(),
            element_annotations: Vec::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.access = AccessLevel::Public;
        self
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn element_annotated(mut self, annotation: Annotation) -> Self {
        self.element_annotations.push(annotation);
        self
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub access: AccessLevel,
    /// 方法層級的型別參數
    #[serde(default)]
    pub type_params: Vec<TypeParameter>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// `None` 表示 void
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: AccessLevel::Public,
            type_params: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            is_static: false,
            is_abstract: false,
            synthetic: false,
            annotations: Vec::new(),
        }
    }

    pub fn returns(mut self, type_ref: TypeRef) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn param(mut self, name: &str, type_ref: TypeRef) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, type_ref));
        self
    }

    pub fn access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn type_param(mut self, param: TypeParameter) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// 宿主型別系統中單一型別的唯讀描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub type_params: Vec<TypeParameter>,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            enum_constants: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        let mut descriptor = Self::with_kind(name, TypeKind::Interface);
        descriptor.is_abstract = true;
        descriptor
    }

    pub fn enumeration(name: impl Into<String>, constants: &[&str]) -> Self {
        let mut descriptor = Self::with_kind(name, TypeKind::Enum);
        descriptor.enum_constants = constants.iter().map(|c| c.to_string()).collect();
        descriptor
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Record)
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn type_param(mut self, param: TypeParameter) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// 直接的 supertype 使用位置：先 superclass，再 interfaces
    pub fn direct_supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    pub fn type_param_index(&self, variable: &str) -> Option<usize> {
        self.type_params.iter().position(|p| p.name == variable)
    }

    /// 命名空間 (最後一個 `.` 之前的部分)
    pub fn namespace(&self) -> &str {
        self.name.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_nested_variables() {
        let list_of_t = TypeRef::generic("java.util.List", vec![TypeRef::var("T")]);
        let string = TypeRef::named("java.lang.String");
        let mut bindings = BTreeMap::new();
        bindings.insert("T", &string);

        let substituted = list_of_t.substitute(&bindings);
        assert_eq!(substituted.to_string(), "java.util.List<java.lang.String>");
        assert!(!substituted.contains_variables());
    }

    #[test]
    fn test_type_ref_json_shape() {
        let json = serde_json::json!({
            "kind": "named",
            "name": "shop.Repository",
            "args": [{"kind": "variable", "name": "ID"}, {"kind": "named", "name": "shop.Order"}]
        });
        let parsed: TypeRef = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.raw_name(), Some("shop.Repository"));
        assert_eq!(parsed.args().len(), 2);
        assert!(parsed.contains_variables());
    }

    #[test]
    fn test_access_level_ordering() {
        assert!(AccessLevel::Private < AccessLevel::Package);
        assert!(AccessLevel::Protected < AccessLevel::Public);
    }

    #[test]
    fn test_namespace_of_descriptor() {
        assert_eq!(TypeDescriptor::class("shop.order.Order").namespace(), "shop.order");
        assert_eq!(TypeDescriptor::class("Order").namespace(), "");
    }
}

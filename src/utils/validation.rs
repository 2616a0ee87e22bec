use crate::utils::error::{MirrorError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NAMESPACE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("namespace grammar is a valid regex")
});

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 檢查單一命名空間是否符合 `a.b.c` 文法
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.trim().is_empty() {
        return Err(MirrorError::InvalidNamespaceError {
            namespace: namespace.to_string(),
            reason: "namespace cannot be empty".to_string(),
        });
    }

    if !NAMESPACE_GRAMMAR.is_match(namespace) {
        return Err(MirrorError::InvalidNamespaceError {
            namespace: namespace.to_string(),
            reason: "expected dot-separated identifiers".to_string(),
        });
    }

    Ok(())
}

/// 掃描前的 roots 檢查：至少一個，全部合法
pub fn validate_roots(roots: &[String]) -> Result<()> {
    if roots.is_empty() {
        return Err(MirrorError::NoRootsError);
    }
    for root in roots {
        validate_namespace(root)?;
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MirrorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 型別名稱 (marker 等) 也必須符合命名空間文法
pub fn validate_type_name(field_name: &str, value: &str) -> Result<()> {
    validate_namespace(value).map_err(|_| MirrorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: "Not a fully-qualified type name".to_string(),
    })
}

pub fn validate_unique(field_name: &str, values: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(*value) {
            return Err(MirrorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.to_string(),
                reason: "Value is used more than once".to_string(),
            });
        }
    }
    Ok(())
}

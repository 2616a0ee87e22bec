use crate::config::conventions::{HostConventions, MarkerSet};
use crate::utils::error::{MirrorError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_roots, validate_type_name, validate_unique, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern is valid"));

/// `mirror.toml` 的完整內容；每個區段都有預設值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub scan: ScanConfig,
    pub markers: MarkerSet,
    pub conventions: HostConventions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl MirrorConfig {
    pub fn with_roots(roots: Vec<String>) -> Self {
        Self {
            scan: ScanConfig { roots },
            ..Self::default()
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MirrorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DOMAIN_ROOT})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// CLI 的 `--root` 會附加在設定檔的 roots 之後，重複的略過
    pub fn merge_roots(&mut self, extra: &[String]) {
        for root in extra {
            if !self.scan.roots.contains(root) {
                self.scan.roots.push(root.clone());
            }
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.scan.roots
    }
}

impl Validate for MirrorConfig {
    fn validate(&self) -> Result<()> {
        validate_roots(&self.scan.roots)?;

        let markers = self.markers.all_markers();
        for marker in &markers {
            validate_type_name("markers", marker)?;
        }
        validate_unique("markers", &markers)?;

        for (field, value) in [
            ("markers.identity_annotation", &self.markers.identity_annotation),
            ("markers.concurrency_annotation", &self.markers.concurrency_annotation),
            ("markers.publishes_annotation", &self.markers.publishes_annotation),
            ("markers.listens_annotation", &self.markers.listens_annotation),
        ] {
            validate_type_name(field, value)?;
        }
        validate_non_empty_string("markers.publishes_attribute", &self.markers.publishes_attribute)?;
        validate_non_empty_string("markers.listens_attribute", &self.markers.listens_attribute)?;

        if self.conventions.constraint_dialects.is_empty() {
            return Err(MirrorError::ConfigValidationError {
                field: "conventions.constraint_dialects".to_string(),
                message: "at least one constraint dialect prefix is required".to_string(),
            });
        }
        Ok(())
    }
}

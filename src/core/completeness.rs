use crate::config::conventions::{HostConventions, MarkerSet};
use crate::domain::mirror::DomainMirrorGraph;
use crate::utils::error::{MirrorError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 一個不存在於圖中的型別，以及所有參照它的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub missing_type: String,
    pub referenced_from: Vec<String>,
}

/// 一次走訪收集到的所有違規，每個缺少的型別只出現一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub violations: Vec<Violation>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn missing_types(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.missing_type.as_str())
    }
}

impl fmt::Display for CompletenessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} missing type(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(
                f,
                "; {} (referenced from {})",
                violation.missing_type,
                violation.referenced_from.join(", ")
            )?;
        }
        Ok(())
    }
}

pub struct CompletenessChecker<'a> {
    markers: &'a MarkerSet,
    conventions: &'a HostConventions,
}

impl<'a> CompletenessChecker<'a> {
    pub fn new(markers: &'a MarkerSet, conventions: &'a HostConventions) -> Self {
        Self {
            markers,
            conventions,
        }
    }

    /// 不完整時回傳 `IncompleteModelError`，帶著完整報告
    pub fn check(&self, graph: &DomainMirrorGraph) -> Result<()> {
        let report = self.report(graph);
        if report.is_complete() {
            tracing::info!("✅ Domain model is complete ({} types)", graph.len());
            Ok(())
        } else {
            tracing::warn!("❌ {}", report);
            Err(MirrorError::IncompleteModelError(report))
        }
    }

    /// 走訪整張圖一次，收集所有無法解析的型別參照
    pub fn report(&self, graph: &DomainMirrorGraph) -> CompletenessReport {
        let mut missing: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut note = |name: &str, site: String| {
            if !self.is_known(graph, name) {
                missing.entry(name.to_string()).or_default().insert(site);
            }
        };

        for mirror in graph.iter() {
            let owner = &mirror.type_name;
            for field in &mirror.fields {
                for name in field.type_mirror.domain_references() {
                    note(name, format!("{}.{}", owner, field.name));
                }
            }
            for method in &mirror.methods {
                for param in &method.parameters {
                    for name in param.type_mirror.domain_references() {
                        note(name, format!("{}.{}({})", owner, method.name, param.name));
                    }
                }
                if let Some(return_type) = &method.return_type {
                    for name in return_type.domain_references() {
                        note(name, format!("{}.{}() return", owner, method.name));
                    }
                }
                for event in &method.published_events {
                    note(event, format!("{}.{} publishes", owner, method.name));
                }
                if let Some(event) = &method.listened_event {
                    note(event, format!("{}.{} listens", owner, method.name));
                }
            }
            for (relation, name) in mirror.variant.relation_references() {
                note(name, format!("{} {}", owner, relation));
            }
        }

        CompletenessReport {
            violations: missing
                .into_iter()
                .map(|(missing_type, sites)| Violation {
                    missing_type,
                    referenced_from: sites.into_iter().collect(),
                })
                .collect(),
        }
    }

    fn is_known(&self, graph: &DomainMirrorGraph, name: &str) -> bool {
        graph.contains(name) || self.conventions.is_foundational(name) || self.markers.is_marker(name)
    }
}

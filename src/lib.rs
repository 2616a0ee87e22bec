pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::StaticCatalog;
pub use config::{HostConventions, MarkerSet, MirrorConfig};
pub use crate::core::{cache::MirrorCache, engine::MirrorEngine, generics::GenericParameterResolver};
pub use domain::mirror::{DomainMirrorGraph, DomainTypeKind, DomainTypeMirror, DomainTypeVariant};
pub use utils::error::{MirrorError, Result};

pub mod assembler;
pub mod assertions;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod completeness;
pub mod engine;
pub mod generics;
pub mod members;
pub mod scanner;

pub use crate::domain::mirror::DomainMirrorGraph;
pub use crate::domain::ports::{GenericResolutionOverride, TypeDiscovery, TypeLoader};
pub use crate::utils::error::Result;

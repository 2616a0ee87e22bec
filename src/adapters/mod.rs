// Adapters layer: concrete implementations of the collaborator ports

pub mod static_catalog;

pub use static_catalog::StaticCatalog;

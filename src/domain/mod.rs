// Domain layer: host type model, mirrors and collaborator ports.

pub mod mirror;
pub mod model;
pub mod ports;

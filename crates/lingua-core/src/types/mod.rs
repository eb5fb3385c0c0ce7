//! Host classes and the native type registry

mod class;
mod registry;

pub use class::{ClassBuilder, HostClass};
pub use registry::{TypeRegistry, TypeRegistryBuilder};

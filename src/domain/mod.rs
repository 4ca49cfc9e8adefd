//! Domain layer - pure business logic with no I/O dependencies.

pub mod enrollment;
pub mod foundation;
pub mod membership;
pub mod organization;
pub mod subscription;

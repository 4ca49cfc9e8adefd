//! Command handlers, grouped by flow.

pub mod enrollment;
pub mod invitation;
pub mod subscription;

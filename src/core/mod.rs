// src/core/mod.rs — Routing core

pub mod classifier;
pub mod context;
pub mod image;
pub mod nutrition;
pub mod router;
pub mod types;

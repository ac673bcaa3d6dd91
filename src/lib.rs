// src/lib.rs — Library root for calai

pub mod capability;
pub mod cli;
pub mod core;
pub mod infra;
pub mod session;
pub mod util;

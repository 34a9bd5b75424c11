// crates/engine/src/adapters/mod.rs

//! Ready-made implementations of the host seams in `domain::collaborators`.

pub mod events;
pub mod resources;

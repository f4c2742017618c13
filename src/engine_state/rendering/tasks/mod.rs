//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `MeshJob`: builds the mesh of one chunk from an owned copy of its blocks

pub mod chunk_mesh_generation_task;

pub use chunk_mesh_generation_task::{MeshJob, MeshResult};

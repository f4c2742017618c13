//! # Engine State Module
//!
//! The subsystems of the voxel world and the façade that composes them.
//!
//! ## Key Components
//!
//! * `voxels` - Block data, chunk storage, terrain generation and water
//! * `rendering` - Greedy meshing, the mesh scheduler and the uploader seam
//! * `task_management` - The worker pool and work queues used by the scheduler
//! * `world` - The [`World`] façade the host drives once per frame
//!
//! ## Architecture
//!
//! Dependencies point one way: the chunk store knows nothing of meshing, the
//! mesher knows nothing of the store, and the scheduler moves owned copies of
//! chunk data between them. Only [`World`] sees every subsystem.

pub mod rendering;
pub mod task_management;
pub mod voxels;
pub mod world;

pub use world::{World, WorldStats};

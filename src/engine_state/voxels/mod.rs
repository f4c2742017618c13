//! # Voxel Data
//!
//! Block storage, procedural generation and the liquid simulation.
//!
//! ## Architecture
//!
//! * **Block**: identifiers, render groups and the registry seam
//! * **Chunk**: one full-height column of blocks with its lifecycle flags
//! * **ChunkStore**: the sparse chunk map with dirty tracking
//! * **Terrain**: deterministic, chunk-local generation
//! * **Water**: flood-queue level relaxation
//! * **Snapshot**: the flat block-edit list used for save/load
//!
//! ## Data Flow
//!
//! 1. The world asks the store for a block, generating the chunk if needed
//! 2. Writes dirty the owning chunk and any neighbour sharing the edited border
//! 3. The scheduler drains the dirty log and remeshes
//! 4. Water-adjacent writes wake the water system, which writes back through
//!    the same store surface

pub mod block;
pub mod chunk;
pub mod chunk_store;
pub mod snapshot;
pub mod terrain;
pub mod water;

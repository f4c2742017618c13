//! # Task System Core Trait
//!
//! A `Task` is a self-contained unit of work executed on a worker thread. It is
//! moved to the worker by value and its output is moved back the same way, so
//! neither side shares memory with the other.
//!
//! ## Task Lifecycle
//! 1. A task is created on the coordinating thread and published through
//!    `TaskManager::publish_task()`
//! 2. `process()` runs on a worker thread and consumes the task
//! 3. The output is collected on the coordinating thread with
//!    `TaskManager::collect_completed()`

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Must own all the data it reads; no references into state that the
///   coordinating thread keeps mutating
/// - Should be coarse-grained enough to amortize the channel round trip
pub trait Task: Send + 'static {
    /// The value handed back to the coordinating thread.
    type Output: Send + 'static;

    /// Performs the work.
    ///
    /// Runs on a worker thread, or on the calling thread when no workers are
    /// available; it must behave identically in both places.
    fn process(self) -> Self::Output;
}

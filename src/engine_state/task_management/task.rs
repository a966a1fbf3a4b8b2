//! # Task System Core Traits
//!
//! ## Core Components
//! - `Task`: A unit of work executed on a worker thread
//! - `TaskResult`: What a task hands back to the main thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread
//! 5. The result can spawn new tasks or issue render commands
//!
//! Tasks own the shared handles they need (world, chunk, coalescing sets), so results
//! carry no references back into engine state.

use crate::engine_state::rendering::RenderCommand;

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should be self-contained and coarse-grained: generating or remeshing one
/// chunk, not sampling one voxel.
pub trait Task: Send {
    /// Does the work. Runs on a worker thread.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be handled on the main thread.
    fn process(&self) -> Box<dyn TaskResult>;
}

/// The result of processing a `Task`.
pub trait TaskResult: Send {
    /// Handles the result on the main thread.
    ///
    /// # Returns
    /// A tuple containing:
    /// 1. Follow-up tasks to schedule (can be empty)
    /// 2. Render commands to apply to the main thread's render resources (can be empty)
    ///
    /// Runs on the main thread; keep it fast.
    fn handle_result(self: Box<Self>) -> (Vec<Box<dyn Task>>, Vec<RenderCommand>);
}

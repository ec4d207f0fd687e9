//! executor - where deferred per-tunnel work runs

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks eventually, on whatever thread suits the implementation.
pub trait TaskExecutor: Send + Sync {
    /// Returns false if the task was refused, in which case it has been dropped.
    fn defer(&self, task: Task) -> bool;
}

/// Spawns each task onto the async-std runtime.
#[derive(Clone, Copy, Default)]
pub struct AsyncStdExecutor;

impl TaskExecutor for AsyncStdExecutor {
    fn defer(&self, task: Task) -> bool {
        let _handle = async_std::task::spawn(async move { task() });
        true
    }
}

#[cfg(test)]
pub use manual::ManualExecutor;

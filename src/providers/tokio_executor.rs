use std::future::Future;

use tokio::runtime::Handle;

use super::executor::{Executor, TaskHandle};

#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        TokioExecutor { handle }
    }

    /// Uses the runtime the caller is running on. Panics outside a runtime.
    pub fn current() -> Self {
        TokioExecutor::new(Handle::current())
    }
}

impl Executor for TokioExecutor {
    fn submit<F>(&self, work: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let join = self.handle.spawn(work);
        TaskHandle::new(async move {
            if let Err(e) = join.await {
                tracing::error!("background task failed: {}", e);
            }
        })
    }
}

use std::future::Future;
use std::pin::Pin;

/// Runs units of work off the command-dispatch path.
pub trait Executor: Send + Sync {
    fn submit<F>(&self, work: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Completion handle for submitted work. Dropping it does not cancel the work.
pub struct TaskHandle {
    completion: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl TaskHandle {
    pub fn new(completion: impl Future<Output = ()> + Send + 'static) -> Self {
        TaskHandle {
            completion: Box::pin(completion),
        }
    }

    pub async fn wait(self) {
        self.completion.await
    }
}

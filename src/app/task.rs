// SPDX-License-Identifier: GPL-3.0-only

//! Deferred effects returned from `update`
//!
//! A task is at most one future that resolves to the next message. The
//! terminal front-end spawns it on the runtime and feeds the message back;
//! headless callers simply await it.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;

#[must_use = "a task does nothing unless it is run"]
pub struct Task<M> {
    future: Option<BoxFuture<'static, M>>,
}

impl<M: Send + 'static> Task<M> {
    /// No follow-up work
    pub fn none() -> Self {
        Self { future: None }
    }

    /// Produce `message` immediately
    pub fn done(message: M) -> Self {
        Self {
            future: Some(futures::future::ready(message).boxed()),
        }
    }

    /// Run `future` and turn its output into a message
    pub fn perform<T, F>(future: F, map: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: Some(future.map(map).boxed()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.future.is_none()
    }

    pub fn into_future(self) -> Option<BoxFuture<'static, M>> {
        self.future
    }

    /// Await the task in place
    pub async fn run(self) -> Option<M> {
        match self.future {
            Some(future) => Some(future.await),
            None => None,
        }
    }
}

impl<M> std::fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("pending", &self.future.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tasks_resolve_to_their_message() {
        assert_eq!(Task::done(7u32).run().await, Some(7));
        assert_eq!(Task::perform(async { 20u32 }, |n| n + 1).run().await, Some(21));
        assert_eq!(Task::<u32>::none().run().await, None);
    }
}

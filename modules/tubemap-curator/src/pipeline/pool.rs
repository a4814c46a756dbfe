use std::future::Future;
use std::ops::ControlFlow;

use futures::stream::{self, StreamExt};

use tubemap_common::config::clamp_workers;

/// Bounded concurrent executor shared by collection and verification.
///
/// Tasks run as futures on the current task via `buffer_unordered`, so at
/// most `width` collaborator calls are in flight. Results come back in
/// completion order.
#[derive(Debug, Clone, Copy)]
pub struct TaskPool {
    width: usize,
}

impl TaskPool {
    pub fn new(width: usize) -> Self {
        Self {
            width: clamp_workers(width),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `task` over every item and collect all results.
    pub async fn run<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        stream::iter(items)
            .map(task)
            .buffer_unordered(self.width)
            .collect()
            .await
    }

    /// Run `task` over the items, handing each result to `sink` as it
    /// completes. When `sink` breaks, the stream is dropped: in-flight
    /// tasks are cancelled and unscheduled items never start. Returns the
    /// number of results the sink saw.
    pub async fn run_until<I, F, Fut, T, S>(&self, items: I, task: F, mut sink: S) -> usize
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
        S: FnMut(T) -> ControlFlow<()>,
    {
        let mut results = stream::iter(items).map(task).buffer_unordered(self.width);
        let mut seen = 0;
        while let Some(result) = results.next().await {
            seen += 1;
            if sink(result).is_break() {
                break;
            }
        }
        seen
    }
}

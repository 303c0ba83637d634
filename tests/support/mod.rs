//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod server;

use std::future::Future;

use optimistic_rust::{Task, TaskList};
use tokio::sync::oneshot;

/// Settles a confirmation by hand, so tests decide the order.
pub struct Reply<T> {
    tx: oneshot::Sender<Result<T, String>>,
}

impl<T> Reply<T> {
    pub fn ok(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn fail(self, message: &str) {
        let _ = self.tx.send(Err(message.to_string()));
    }
}

/// A confirm future that waits for its [`Reply`].
pub fn manual<T: Send + 'static>() -> (
    Reply<T>,
    impl Future<Output = Result<T, String>> + Send + 'static,
) {
    let (tx, rx) = oneshot::channel();
    let confirm = async move {
        rx.await
            .unwrap_or_else(|_| Err("reply dropped".to_string()))
    };
    (Reply { tx }, confirm)
}

pub fn task(id: &str, title: &str) -> Task {
    Task::new(id, title)
}

pub fn tasks(entries: &[(&str, &str)]) -> Vec<Task> {
    entries.iter().map(|(id, title)| task(id, title)).collect()
}

pub fn ids(list: &TaskList) -> Vec<String> {
    list.items().into_iter().map(|t| t.id).collect()
}

pub fn titles(list: &TaskList) -> Vec<String> {
    list.items().into_iter().map(|t| t.title).collect()
}

//! Fake task API with latency, for end-to-end scenarios.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use optimistic_rust::Task;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

#[derive(Clone)]
pub struct FakeServer {
    latency: Duration,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl FakeServer {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(100)),
        }
    }

    /// Make every following call fail with a 500.
    pub fn go_down(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn come_back(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Assigns a server id and creation timestamp.
    pub fn create(&self, draft: Task) -> impl Future<Output = Result<Task, ApiError>> + Send + 'static {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.respond(move || Task {
            id: format!("task-{}", id),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            ..draft
        })
    }

    pub fn save(&self, task: Task) -> impl Future<Output = Result<Task, ApiError>> + Send + 'static {
        self.respond(move || Task {
            updated_at: Some("2024-01-02T00:00:00Z".to_string()),
            ..task
        })
    }

    pub fn delete(&self, _id: &str) -> impl Future<Output = Result<(), ApiError>> + Send + 'static {
        self.respond(|| ())
    }

    fn respond<T, F>(&self, reply: F) -> impl Future<Output = Result<T, ApiError>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.load(Ordering::SeqCst);
        let latency = self.latency;
        async move {
            tokio::time::sleep(latency).await;
            if failing {
                Err(ApiError {
                    status: 500,
                    message: "internal error".to_string(),
                })
            } else {
                Ok(reply())
            }
        }
    }
}

//! Walk a task list through a confirmed add, a server-side edit, a failed
//! delete and a timeout.
//!
//! Run with `RUST_LOG=optimistic_rust=debug cargo run --example tasks` to see
//! the engine's own logs next to the printed state.

use std::time::Duration;

use optimistic_rust::timeout::within;
use optimistic_rust::{EmitterBridge, OptimisticConfig, Task, TaskList, TaskPatch, TaskStatus, Transition};
use tracing_subscriber::EnvFilter;

async fn create(draft: Task) -> Result<Task, String> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(Task {
        id: "task-1".to_string(),
        created_at: Some("2024-01-01T00:00:00Z".to_string()),
        ..draft
    })
}

async fn complete(task: Task) -> Result<Task, String> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    Ok(Task {
        status: TaskStatus::Completed,
        completed_at: Some("2024-01-01T00:05:00Z".to_string()),
        ..task
    })
}

async fn delete(_id: String) -> Result<(), String> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    Err("403: only the owner can delete this task".to_string())
}

fn show(label: &str, tasks: &TaskList) {
    let state = tasks.state();
    println!(
        "{:<10} items={:?} pending={:?} error={:?}",
        label,
        state.items.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
        state.optimistic_ids,
        state.error.map(|e| e.to_string()),
    );
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = OptimisticConfig::from_json(r#"{ "rollback": "isolated" }"#)
        .map_err(|e| e.to_string())?;
    let tasks = TaskList::builder(vec![])
        .config(config)
        .on_error(|err, _| eprintln!("toast: {}", err))
        .build();

    let bridge = EmitterBridge::new("tasks");
    bridge.on(Transition::RolledBack, |payload| {
        println!("event tasks.rolled_back {}", payload);
    });
    let _forwarding = bridge.attach(tasks.observers());

    let draft = Task::new("tmp-1", "Buy milk");
    let pending = tasks.add_item(draft.clone(), || create(draft));
    show("added", &tasks);
    let created = pending.await.ok_or("create failed")?;
    show("confirmed", &tasks);

    let current = tasks.get(&created.id).ok_or("task vanished")?;
    tasks
        .update_item(&created.id, TaskPatch::status(TaskStatus::Completed), || {
            complete(current)
        })
        .await;
    show("completed", &tasks);

    let id = created.id.clone();
    let pending = tasks.remove_item(&created.id, || delete(id));
    show("removing", &tasks);
    pending.await;
    show("restored", &tasks);

    let stuck = tasks.update_item(&created.id, TaskPatch::title("Buy oat milk"), || {
        within(Duration::from_millis(100), std::future::pending::<Result<Task, String>>())
    });
    stuck.await;
    show("timed out", &tasks);

    // emitter listeners run on their own threads
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}

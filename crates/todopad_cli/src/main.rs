//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `todopad_core` linkage.
//! - Exercise the store end to end (in memory) for quick local sanity checks.

use std::error::Error;
use todopad_core::TaskService;

fn main() {
    println!("todopad_core ping={}", todopad_core::ping());
    println!("todopad_core version={}", todopad_core::core_version());

    if let Err(err) = store_smoke() {
        eprintln!("store smoke failed: {err}");
        std::process::exit(1);
    }
}

fn store_smoke() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let service = TaskService::open_in_memory()?;

    runtime.block_on(async {
        let id = service
            .add_task("smoke task")
            .await?
            .ok_or("blank title rejected")?;
        service.toggle_task_done(id).await?;

        for task in service.list_tasks().await? {
            println!(
                "task id={} done={} priority={} title={}",
                task.id,
                task.is_done,
                task.priority.label(),
                task.title
            );
        }

        Ok(())
    })
}

// Background task spawning for fire-and-forget engine work

use std::future::Future;

use tokio::runtime::{Builder, Handle};

/// Run `task` without blocking the caller.
///
/// Uses the ambient Tokio runtime when the caller is inside one. Hosts that
/// drive the engines from plain threads get a dedicated thread with its own
/// current-thread runtime instead.
pub fn spawn_background<F>(name: &str, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        handle.spawn(task);
        return;
    }

    let thread_name = name.to_string();
    let spawned = std::thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || match Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt.block_on(task),
            Err(err) => log::error!(
                "[Background] Failed to create runtime for {}: {}",
                thread_name,
                err
            ),
        });

    if let Err(err) = spawned {
        log::error!("[Background] Failed to spawn thread {}: {}", name, err);
    }
}

//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! The WiFi and lwIP stacks live on the PRO core; the job scheduler runs
//! on the APP core so a busy radio never delays a control tick.
//!
//! ESP-IDF maps `std::thread` onto pthreads, which are FreeRTOS tasks.
//! `esp_pthread_set_cfg()` configures the *next* `pthread_create()` from
//! the calling thread, so the config→spawn pair must not interleave with
//! other spawns on that thread.

use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0: WiFi, lwIP, the HTTP server.
    Pro = 0,
    /// Core 1: the job scheduler.
    App = 1,
}

/// How a pinned thread should be created.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
    /// NUL-terminated, e.g. `"jobs\0"`.
    pub name: &'static str,
}

impl TaskSpec {
    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

#[derive(Debug)]
pub enum SpawnError {
    /// `esp_pthread_set_cfg` returned this code.
    PthreadConfig(i32),
    Thread(std::io::Error),
}

impl core::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PthreadConfig(rc) => write!(f, "esp_pthread_set_cfg failed (rc={})", rc),
            Self::Thread(e) => write!(f, "thread creation failed: {}", e),
        }
    }
}

impl core::error::Error for SpawnError {}

/// Spawn `f` on `task.core` with the given priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(task: TaskSpec, f: impl FnOnce() + Send + 'static) -> Result<JoinHandle<()>, SpawnError> {
    // SAFETY: the config is fully initialised and `name` is a 'static
    // NUL-terminated string that outlives the created task.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = task.core as i32;
        cfg.prio = i32::from(task.priority);
        cfg.stack_size = (task.stack_kb * 1024) as i32;
        cfg.thread_name = task.name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(SpawnError::PthreadConfig(ret));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        task.display_name(),
        task.core,
        task.priority,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(task.display_name().into())
        .spawn(f)
        .map_err(SpawnError::Thread)
}

/// Host fallback: no core affinity or priority, only the stack size.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(task: TaskSpec, f: impl FnOnce() + Send + 'static) -> Result<JoinHandle<()>, SpawnError> {
    log::info!("Spawning '{}' (sim, stack={}KB)", task.display_name(), task.stack_kb);

    std::thread::Builder::new()
        .name(task.display_name().into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
        .map_err(SpawnError::Thread)
}

//! Host shutdown hooks

use std::sync::Mutex;

type Hook = Box<dyn FnOnce() + Send>;

/// Callbacks the host runs once before exiting
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<Hook>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shutdown_hook(&self, hook: Hook) {
        self.lock().push(hook);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run and forget every registered hook, in registration order
    pub fn run(&self) {
        let hooks: Vec<Hook> = self.lock().drain(..).collect();
        log::debug!("Running {} shutdown hook(s)", hooks.len());
        for hook in hooks {
            hook();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Hook>> {
        self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

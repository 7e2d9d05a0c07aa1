use std::sync::{Arc, Mutex, MutexGuard};

use super::session::Session;

/// Session shared between the line editor's completer and the REPL loop.
///
/// Access is serialized: a suggestion pass and an execution never overlap.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    /// Wrap a session for sharing.
    ///
    /// * `session` - The session to share
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session
    ///
    /// A panic inside a user runner poisons the lock; the session itself is
    /// still consistent, so the guard is recovered.
    ///
    /// # Returns
    /// * `MutexGuard<Session>` - Exclusive access until dropped
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Name of the root command
    pub fn root_name(&self) -> String {
        let session = self.lock();
        let tree = session.tree();
        tree.node(tree.root()).name().to_string()
    }
}

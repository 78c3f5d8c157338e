//! CLI session latch owned by an adapter.

use std::sync::Mutex;

/// Holds the provider-side session id used for `--resume`.
///
/// The first id reported by the CLI is latched and kept for the adapter's
/// lifetime; later ids are ignored until [`SessionSlot::clear`].
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Mutex<Option<String>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `id` if no session is latched yet. Returns true when stored.
    pub fn latch(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return false;
        }
        *guard = Some(id.to_string());
        true
    }

    pub fn get(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_first_id_only() {
        let slot = SessionSlot::new();
        assert!(!slot.is_set());
        assert!(slot.latch("a"));
        assert!(!slot.latch("b"));
        assert_eq!(slot.get().as_deref(), Some("a"));
    }

    #[test]
    fn clear_allows_new_latch() {
        let slot = SessionSlot::new();
        slot.latch("a");
        slot.clear();
        assert!(slot.get().is_none());
        assert!(slot.latch("b"));
        assert_eq!(slot.get().as_deref(), Some("b"));
    }

    #[test]
    fn ignores_empty_ids() {
        let slot = SessionSlot::new();
        assert!(!slot.latch(""));
        assert!(!slot.is_set());
    }
}

//! # Scoped Event Listeners
//!
//! Window-level listeners (global key bindings, page scroll) must live
//! exactly as long as the component that needs them. Installing one hands
//! back a guard; dropping the guard uninstalls it, whichever way the owner
//! goes away, including an unmount in the middle of a zoom animation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Window event a listener is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    Scroll,
}

/// Tracks which window listeners are currently installed
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    installed: Rc<RefCell<HashMap<ListenerKind, usize>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a listener; it stays installed until the guard is dropped
    pub fn install(&self, kind: ListenerKind) -> ListenerGuard {
        *self.installed.borrow_mut().entry(kind).or_insert(0) += 1;
        tracing::trace!(?kind, "listener installed");

        ListenerGuard {
            installed: Rc::clone(&self.installed),
            kind,
        }
    }

    pub fn is_installed(&self, kind: ListenerKind) -> bool {
        self.count(kind) > 0
    }

    pub fn count(&self, kind: ListenerKind) -> usize {
        self.installed.borrow().get(&kind).copied().unwrap_or(0)
    }
}

/// Installed listener; uninstalls on drop
#[derive(Debug)]
pub struct ListenerGuard {
    installed: Rc<RefCell<HashMap<ListenerKind, usize>>>,
    kind: ListenerKind,
}

impl ListenerGuard {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut installed = self.installed.borrow_mut();
        if let Some(count) = installed.get_mut(&self.kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                installed.remove(&self.kind);
            }
        }
        tracing::trace!(kind = ?self.kind, "listener removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let registry = ListenerRegistry::new();
        let guard = registry.install(ListenerKind::Scroll);

        assert!(registry.is_installed(ListenerKind::Scroll));
        assert!(!registry.is_installed(ListenerKind::KeyDown));

        drop(guard);
        assert!(!registry.is_installed(ListenerKind::Scroll));
    }

    #[test]
    fn test_guards_are_counted() {
        let registry = ListenerRegistry::new();
        let first = registry.install(ListenerKind::KeyDown);
        let second = registry.install(ListenerKind::KeyDown);
        assert_eq!(registry.count(ListenerKind::KeyDown), 2);

        drop(first);
        assert!(registry.is_installed(ListenerKind::KeyDown));
        drop(second);
        assert_eq!(registry.count(ListenerKind::KeyDown), 0);
    }
}

//! Global key event fan-out.
//!
//! The host owns a [`KeyboardHub`] and broadcasts every key event it reads.
//! Components subscribe with [`KeyboardHub::listen`]; the returned
//! [`KeyListener`] unregisters itself when dropped, including while
//! unwinding from a panic.
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};

use crossterm::event::KeyEvent;

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    senders: Vec<(u64, Sender<KeyEvent>)>,
}

/// Single-threaded broadcaster of key events to scoped listeners.
#[derive(Debug, Clone, Default)]
pub struct KeyboardHub {
    registry: Rc<RefCell<Registry>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to key events until the returned listener is dropped.
    pub fn listen(&self) -> KeyListener {
        let (tx, rx) = mpsc::channel();
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.senders.push((id, tx));
        crate::perf::log_event("keyboard.listen", format!("id={id}"));
        KeyListener {
            id,
            registry: Rc::downgrade(&self.registry),
            rx,
        }
    }

    /// Deliver `key` to every live listener.
    pub fn broadcast(&self, key: KeyEvent) {
        self.registry
            .borrow_mut()
            .senders
            .retain(|(_, tx)| tx.send(key).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().senders.len()
    }
}

/// A live key subscription.
#[derive(Debug)]
pub struct KeyListener {
    id: u64,
    registry: Weak<RefCell<Registry>>,
    rx: Receiver<KeyEvent>,
}

impl KeyListener {
    /// Key events received since the last call, oldest first.
    pub fn pending(&self) -> Vec<KeyEvent> {
        self.rx.try_iter().collect()
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // A drop during a broadcast already holds the borrow; the dead
        // sender is pruned by that broadcast instead.
        if let Ok(mut registry) = registry.try_borrow_mut() {
            registry.senders.retain(|(id, _)| *id != self.id);
        }
        crate::perf::log_event("keyboard.release", format!("id={}", self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_listener_receives_broadcasts_in_order() {
        let hub = KeyboardHub::new();
        let listener = hub.listen();
        hub.broadcast(press('b'));
        hub.broadcast(press('i'));

        let codes = listener
            .pending()
            .into_iter()
            .map(|k| k.code)
            .collect::<Vec<_>>();
        assert_eq!(codes, vec![KeyCode::Char('b'), KeyCode::Char('i')]);
        assert!(listener.pending().is_empty());
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = KeyboardHub::new();
        let first = hub.listen();
        let second = hub.listen();
        assert_eq!(hub.listener_count(), 2);

        drop(first);
        assert_eq!(hub.listener_count(), 1);
        hub.broadcast(press('u'));
        assert_eq!(second.pending().len(), 1);
    }

    #[test]
    fn test_panic_unwinding_releases_listener() {
        let hub = KeyboardHub::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _listener = hub.listen();
            assert_eq!(hub.listener_count(), 1);
            panic!("component failed while mounted");
        }));
        assert!(result.is_err());
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_listener_outliving_hub_drops_cleanly() {
        let hub = KeyboardHub::new();
        let listener = hub.listen();
        drop(hub);
        assert!(listener.pending().is_empty());
    }
}

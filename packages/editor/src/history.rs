//! # History
//!
//! Debounced, bounded undo/redo over a store's text form.
//!
//! ## Design
//!
//! - Entries are text snapshots (`DocumentStore::read`), so an override held
//!   mid-edit is captured like any other state
//! - Every committed change (re)schedules one capture; a burst of changes
//!   inside the quiet period yields a single entry
//! - At most `capacity` undo steps are kept; the oldest entry is evicted
//! - Capturing after an undo discards the redo tail
//! - Undo and redo feed the entry back through `DocumentStore::write`; those
//!   writes are not captured again
//!
//! ```text
//!  entries:  [ e0 ][ e1 ][ e2 ][ e3 ]
//!                         ↑
//!                       cursor      undo ← → redo
//! ```

use crate::debounce::{Clock, Debouncer};
use crate::document::{DocumentStore, StoreId, SubscriptionId};
use crate::errors::EditorError;
use crate::format::DataFormat;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Default number of undo steps
pub const DEFAULT_CAPACITY: usize = 150;

/// Default quiet period before a capture
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Undo steps kept
    pub capacity: usize,

    /// Quiet period before a change is captured
    pub debounce: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Shared between the manager and its store listener
#[derive(Debug)]
struct CaptureState {
    debouncer: Debouncer,

    /// Set while undo/redo writes to the store
    suppressed: bool,
}

/// Undo/redo log attached to exactly one [`DocumentStore`]
#[derive(Debug)]
pub struct HistoryManager {
    store_id: StoreId,
    subscription: SubscriptionId,
    entries: VecDeque<String>,
    cursor: usize,
    capacity: usize,
    state: Rc<RefCell<CaptureState>>,
    clock: Rc<dyn Clock>,
}

impl HistoryManager {
    /// Start recording `store`; its current text is the initial entry
    pub fn attach(
        store: &mut DocumentStore,
        config: &HistoryConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, EditorError> {
        let initial = store.read()?;
        let state = Rc::new(RefCell::new(CaptureState {
            debouncer: Debouncer::new(config.debounce),
            suppressed: false,
        }));

        let listener_state = Rc::clone(&state);
        let listener_clock = Rc::clone(&clock);
        let subscription = store.subscribe(move |_| {
            let mut state = listener_state.borrow_mut();
            if !state.suppressed {
                state.debouncer.schedule(listener_clock.now());
            }
        });

        tracing::debug!(
            "History attached to {} (capacity {}, debounce {:?})",
            store.id(),
            config.capacity,
            config.debounce
        );

        Ok(Self {
            store_id: store.id(),
            subscription,
            entries: VecDeque::from([initial]),
            cursor: 0,
            capacity: config.capacity,
            state,
            clock,
        })
    }

    /// Stop recording; the store keeps its current content
    pub fn detach(self, store: &mut DocumentStore) -> bool {
        store.unsubscribe(self.subscription)
    }

    /// Capture if the quiet period has elapsed; returns whether an entry was added
    pub fn poll(&mut self, store: &DocumentStore) -> Result<bool, EditorError> {
        self.check_store(store)?;
        let due = self.state.borrow().debouncer.is_due(self.clock.now());
        if due {
            self.capture(store)
        } else {
            Ok(false)
        }
    }

    /// Capture a pending change right away
    pub fn flush(&mut self, store: &DocumentStore) -> Result<bool, EditorError> {
        self.check_store(store)?;
        if self.has_pending() {
            self.capture(store)
        } else {
            Ok(false)
        }
    }

    /// A change is waiting for its quiet period to end
    pub fn has_pending(&self) -> bool {
        self.state.borrow().debouncer.is_pending()
    }

    /// An entry exists behind the cursor (a pending change is not counted yet)
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.cursor - 1
    }

    /// Text the store held at the cursor position
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step back one entry; returns `false` when there is nothing to undo
    pub fn undo(&mut self, store: &mut DocumentStore) -> Result<bool, EditorError> {
        self.flush(store)?;
        if self.cursor == 0 {
            return Ok(false);
        }
        self.cursor -= 1;
        tracing::debug!("{}: undo to entry {}", self.store_id, self.cursor);
        self.restore(store);
        Ok(true)
    }

    /// Step forward one entry; returns `false` when there is nothing to redo
    pub fn redo(&mut self, store: &mut DocumentStore) -> Result<bool, EditorError> {
        self.flush(store)?;
        if !self.can_redo() {
            return Ok(false);
        }
        self.cursor += 1;
        tracing::debug!("{}: redo to entry {}", self.store_id, self.cursor);
        self.restore(store);
        Ok(true)
    }

    /// Forget everything; the store's current text becomes the only entry
    pub fn clear(&mut self, store: &DocumentStore) -> Result<(), EditorError> {
        self.check_store(store)?;
        let text = store.read()?;
        self.state.borrow_mut().debouncer.cancel();
        self.entries.clear();
        self.entries.push_back(text);
        self.cursor = 0;
        Ok(())
    }

    /// Rewrite every entry from one text format into another.
    ///
    /// Entries that do not parse under `from` (captured overrides) are kept
    /// verbatim.
    pub fn reencode(&mut self, from: &dyn DataFormat, to: &dyn DataFormat) {
        for entry in self.entries.iter_mut() {
            match from.parse(entry).and_then(|value| to.stringify(&value)) {
                Ok(text) => *entry = text,
                Err(e) => tracing::debug!("{}: keeping entry as is: {}", self.store_id, e),
            }
        }
    }

    fn capture(&mut self, store: &DocumentStore) -> Result<bool, EditorError> {
        self.state.borrow_mut().debouncer.cancel();
        let text = store.read()?;
        if self.current() == Some(text.as_str()) {
            tracing::trace!("{}: capture skipped, text unchanged", self.store_id);
            return Ok(false);
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(text);
        self.cursor += 1;
        while self.entries.len() > self.capacity + 1 {
            self.entries.pop_front();
            self.cursor -= 1;
        }
        tracing::debug!("{}: captured entry {} of {}", self.store_id, self.cursor, self.entries.len());
        Ok(true)
    }

    fn restore(&mut self, store: &mut DocumentStore) {
        let Some(text) = self.entries.get(self.cursor) else {
            return;
        };
        self.state.borrow_mut().suppressed = true;
        store.write(text);
        self.state.borrow_mut().suppressed = false;
    }

    fn check_store(&self, store: &DocumentStore) -> Result<(), EditorError> {
        if store.id() != self.store_id {
            return Err(EditorError::ForeignStore {
                expected: self.store_id,
                actual: store.id(),
            });
        }
        Ok(())
    }
}

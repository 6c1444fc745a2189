/// Keeps the rendered log in step with the stored one.
///
/// The popup renders the stored backlog once, then every `onChanged`
/// notification for the log key carries the whole new sequence. The
/// reconciler works out which visible entries have not been shown yet and
/// remembers where it stopped, so each entry is rendered at most once.
use std::cell::RefCell;
use std::rc::Rc;

use crate::logger::{LogEntry, LogStore, LOG_STORAGE_KEY, decode_logs};
use crate::storage::{ChangeSet, StorageArea};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogReconciler {
    /// Visible entries in the sequence at the last reconciliation
    rendered: usize,
    /// Last visible entry handed out for rendering
    last: Option<LogEntry>,
}

fn visible(entries: &[LogEntry]) -> Vec<&LogEntry> {
    entries.iter().filter(|entry| !entry.hidden).collect()
}

impl LogReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial backlog: every visible entry, in order.
    pub fn load(&mut self, entries: &[LogEntry]) -> Vec<LogEntry> {
        let shown: Vec<LogEntry> = visible(entries).into_iter().cloned().collect();
        self.rendered = shown.len();
        self.last = shown.last().cloned();
        shown
    }

    /// Entries of `entries` (a notification's new value) not rendered yet.
    pub fn apply(&mut self, entries: &[LogEntry]) -> Vec<LogEntry> {
        let visible = visible(entries);

        let start = match self.marker_position(&visible) {
            Some(position) => position + 1,
            // The marker is gone (cleared, or overwritten by another
            // context): fall back to the count, clamped to what's there.
            None => self.rendered.min(visible.len()),
        };

        let delta: Vec<LogEntry> = visible[start..].iter().map(|entry| (*entry).clone()).collect();

        self.rendered = visible.len();
        self.last = visible.last().map(|entry| (*entry).clone());
        delta
    }

    pub fn rendered(&self) -> usize {
        self.rendered
    }

    // Appends only ever move the marker towards the front (through eviction),
    // so it can't sit past its old slot.
    fn marker_position(&self, visible: &[&LogEntry]) -> Option<usize> {
        let last = self.last.as_ref()?;
        let bound = self.rendered.min(visible.len());
        visible[..bound].iter().rposition(|entry| *entry == last)
    }
}

/// Live subscription of a popup to the stored log
#[derive(Clone)]
pub struct LogFeed {
    reconciler: Rc<RefCell<LogReconciler>>,
}

impl LogFeed {
    pub fn rendered(&self) -> usize {
        self.reconciler.borrow().rendered()
    }
}

/// Render the backlog through `sink`, then keep feeding it new entries.
///
/// A failed initial read is logged and treated as an empty backlog; the
/// subscription is registered either way.
pub async fn watch_logs<S, F>(store: &LogStore<S>, sink: F) -> LogFeed
where
    S: StorageArea,
    F: Fn(Vec<LogEntry>) + 'static,
{
    let reconciler = Rc::new(RefCell::new(LogReconciler::new()));
    let sink = Rc::new(sink);

    match store.get_logs().await {
        Ok(logs) => {
            let backlog = reconciler.borrow_mut().load(&logs);
            if !backlog.is_empty() {
                sink(backlog);
            }
        }
        Err(e) => log::error!("Failed to load logs: {}", e),
    }

    let listener_state = reconciler.clone();
    store.area().on_changed(Rc::new(move |changes: &ChangeSet| {
        let Some(change) = changes.get(LOG_STORAGE_KEY) else {
            return;
        };
        let entries = decode_logs(change.new_value.clone());
        let delta = listener_state.borrow_mut().apply(&entries);
        if !delta.is_empty() {
            sink(delta);
        }
    }));

    LogFeed { reconciler }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogLevel, LogSource, MAX_LOG_SIZE, push_capped};
    use crate::storage::{MemoryStorage, Storage};
    use pollster::block_on;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(message, LogLevel::Info, LogSource::Popup)
    }

    fn hidden(message: &str) -> LogEntry {
        entry(message).with_hidden(true)
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_load_skips_hidden_entries() {
        let backlog = vec![entry("a"), hidden("b"), entry("c"), hidden("d"), entry("e")];
        let mut reconciler = LogReconciler::new();

        let shown = reconciler.load(&backlog);

        assert_eq!(messages(&shown), vec!["a", "c", "e"]);
        assert_eq!(reconciler.rendered(), 3);
    }

    #[test]
    fn test_apply_renders_only_new_entry() {
        let mut logs = vec![entry("a"), entry("b")];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        logs.push(entry("c"));
        let delta = reconciler.apply(&logs);

        assert_eq!(messages(&delta), vec!["c"]);
    }

    #[test]
    fn test_repeated_notifications_do_not_duplicate() {
        let mut logs = vec![entry("a")];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        logs.push(entry("b"));
        assert_eq!(messages(&reconciler.apply(&logs)), vec!["b"]);

        logs.push(entry("c"));
        assert_eq!(messages(&reconciler.apply(&logs)), vec!["c"]);

        // Same value delivered again
        assert!(reconciler.apply(&logs).is_empty());
    }

    #[test]
    fn test_hidden_appends_are_not_rendered() {
        let mut logs = vec![entry("a")];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        logs.push(hidden("internal"));
        assert!(reconciler.apply(&logs).is_empty());

        logs.push(entry("b"));
        assert_eq!(messages(&reconciler.apply(&logs)), vec!["b"]);
    }

    #[test]
    fn test_identical_entries_without_ids_are_each_rendered() {
        let mut original = entry("toggled");
        original.id = None;
        let twin = original.clone();

        let mut logs = vec![original];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        // Only position tells these two apart
        logs.push(twin);
        assert_eq!(reconciler.apply(&logs).len(), 1);
    }

    #[test]
    fn test_cleared_sequence_renders_nothing() {
        let logs = vec![entry("a"), entry("b"), entry("c")];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        assert!(reconciler.apply(&[]).is_empty());
        assert_eq!(reconciler.rendered(), 0);

        // Logging resumes after the clear
        let fresh = vec![entry("d")];
        assert_eq!(messages(&reconciler.apply(&fresh)), vec!["d"]);
    }

    #[test]
    fn test_stale_count_past_new_length_renders_nothing() {
        let logs = vec![entry("a"), entry("b"), entry("c"), entry("d")];
        let mut reconciler = LogReconciler::new();
        reconciler.load(&logs);

        // Another context rewrote the log with fewer, unrelated entries
        let rewritten = vec![entry("x"), entry("y")];
        assert!(reconciler.apply(&rewritten).is_empty());
    }

    #[test]
    fn test_eviction_at_capacity_keeps_new_entries() {
        let mut logs: Vec<LogEntry> = (0..MAX_LOG_SIZE).map(|i| entry(&format!("old {}", i))).collect();
        let mut reconciler = LogReconciler::new();
        assert_eq!(reconciler.load(&logs).len(), MAX_LOG_SIZE);

        push_capped(&mut logs, entry("new 0"));
        assert_eq!(messages(&reconciler.apply(&logs)), vec!["new 0"]);

        push_capped(&mut logs, entry("new 1"));
        push_capped(&mut logs, entry("new 2"));
        assert_eq!(messages(&reconciler.apply(&logs)), vec!["new 1", "new 2"]);
    }

    #[test]
    fn test_append_racing_a_clear_is_rendered_once() {
        let area = MemoryStorage::new();
        let store = LogStore::new(area.clone());
        block_on(store.log_info("a", LogSource::Popup, false)).unwrap();
        block_on(store.log_info("b", LogSource::Popup, false)).unwrap();

        let rendered: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = rendered.clone();
        block_on(watch_logs(&store, move |entries: Vec<LogEntry>| {
            sink.borrow_mut().extend(entries.into_iter().map(|e| e.message));
        }));

        // The user wipes the view; another context appends before the removal lands
        rendered.borrow_mut().clear();
        block_on(store.log_info("c", LogSource::Background, false)).unwrap();
        assert_eq!(*rendered.borrow(), vec!["c"]);

        block_on(store.clear_logs()).unwrap();
        block_on(store.log_info("d", LogSource::Background, false)).unwrap();
        assert_eq!(*rendered.borrow(), vec!["c", "d"]);
    }

    #[test]
    fn test_failed_clear_does_not_render_backlog_again() {
        let area = MemoryStorage::new();
        let store = LogStore::new(area.clone());
        block_on(store.log_info("a", LogSource::Popup, false)).unwrap();

        let rendered: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = rendered.clone();
        block_on(watch_logs(&store, move |entries: Vec<LogEntry>| {
            sink.borrow_mut().extend(entries.into_iter().map(|e| e.message));
        }));

        rendered.borrow_mut().clear();
        area.fail_with("unavailable");
        assert!(block_on(store.clear_logs()).is_err());
        area.recover();

        block_on(store.log_info("b", LogSource::Popup, false)).unwrap();
        assert_eq!(*rendered.borrow(), vec!["b"]);
    }

    #[test]
    fn test_watch_logs_end_to_end() {
        let area = MemoryStorage::new();
        let store = LogStore::new(area.clone());

        block_on(store.log_info("backlog 1", LogSource::Background, false)).unwrap();
        block_on(store.log_info("backlog hidden", LogSource::Background, true)).unwrap();
        block_on(store.log_info("backlog 2", LogSource::Content, false)).unwrap();

        let rendered: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let batches = Rc::new(RefCell::new(0));

        let sink_rendered = rendered.clone();
        let sink_batches = batches.clone();
        let feed = block_on(watch_logs(&store, move |entries: Vec<LogEntry>| {
            *sink_batches.borrow_mut() += 1;
            sink_rendered
                .borrow_mut()
                .extend(entries.into_iter().map(|e| e.message));
        }));

        assert_eq!(*rendered.borrow(), vec!["backlog 1", "backlog 2"]);
        assert_eq!(feed.rendered(), 2);

        block_on(store.log_info("live 1", LogSource::Popup, false)).unwrap();
        block_on(store.log_info("live hidden", LogSource::Popup, true)).unwrap();
        block_on(store.log_warn("live 2", LogSource::Content, None, false)).unwrap();

        // Unrelated keys don't reach the sink
        block_on(Storage::new(area.clone()).set_enabled(true)).unwrap();

        assert_eq!(*rendered.borrow(), vec!["backlog 1", "backlog 2", "live 1", "live 2"]);
        assert_eq!(*batches.borrow(), 3);

        block_on(store.clear_logs()).unwrap();
        assert_eq!(feed.rendered(), 0);
        block_on(store.log_info("after clear", LogSource::Popup, false)).unwrap();

        assert_eq!(rendered.borrow().last().map(String::as_str), Some("after clear"));
        assert_eq!(rendered.borrow().len(), 5);
    }

    #[test]
    fn test_watch_logs_survives_failed_initial_read() {
        let area = MemoryStorage::new();
        let store = LogStore::new(area.clone());
        area.fail_with("unavailable");

        let rendered: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = rendered.clone();
        let feed = block_on(watch_logs(&store, move |entries: Vec<LogEntry>| {
            sink.borrow_mut().extend(entries.into_iter().map(|e| e.message));
        }));
        assert_eq!(feed.rendered(), 0);

        area.recover();
        block_on(store.log_info("recovered", LogSource::Popup, false)).unwrap();

        assert_eq!(*rendered.borrow(), vec!["recovered"]);
    }
}

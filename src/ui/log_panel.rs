/// Log panel at the bottom of the popup
use std::rc::Rc;

use yew::prelude::*;

use crate::logger::{LogEntry, LogLevel, push_capped};

/// Entries rendered so far, in the order they arrived, capped like the stored log
#[derive(Debug, Default, PartialEq)]
pub struct LogView {
    pub entries: Rc<Vec<LogEntry>>,
}

pub enum LogAction {
    Append(Vec<LogEntry>),
    Clear,
}

impl Reducible for LogView {
    type Action = LogAction;

    fn reduce(self: Rc<Self>, action: LogAction) -> Rc<Self> {
        match action {
            LogAction::Append(new_entries) => {
                let mut entries = (*self.entries).clone();
                for entry in new_entries {
                    push_capped(&mut entries, entry);
                }
                Rc::new(LogView {
                    entries: Rc::new(entries),
                })
            }
            LogAction::Clear => Rc::new(LogView::default()),
        }
    }
}

fn level_class(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "text-body",
        LogLevel::Warn => "text-warning",
        LogLevel::Error => "text-danger",
    }
}

#[derive(Properties, PartialEq)]
pub struct LogPanelProps {
    pub entries: Rc<Vec<LogEntry>>,
    #[prop_or_default]
    pub issues_url: Option<String>,
    pub open: bool,
    pub on_toggle: Callback<MouseEvent>,
    pub on_clear: Callback<MouseEvent>,
}

#[function_component(LogPanel)]
pub fn log_panel(props: &LogPanelProps) -> Html {
    let message_ref = use_node_ref();

    // Keep the newest line in view
    {
        let message_ref = message_ref.clone();
        use_effect_with((props.entries.len(), props.open), move |_| {
            if let Some(element) = message_ref.cast::<web_sys::Element>() {
                element.set_scroll_top(element.scroll_height());
            }
            || ()
        });
    }

    html! {
        <section class={classes!("log-panel", props.open.then_some("open"))}>
            <div class="log-panel-bar">
                <button class="btn btn-sm btn-link" onclick={props.on_toggle.clone()}>
                    {if props.open { "Hide log" } else { "Show log" }}
                </button>
                <span class="log-count small text-muted">{format!("{} entries", props.entries.len())}</span>
                <button
                    id="clear-button"
                    class="btn btn-sm btn-link"
                    onclick={props.on_clear.clone()}
                    disabled={props.entries.is_empty()}
                >
                    {"Clear"}
                </button>
            </div>

            if props.open {
                <div id="message" class="log-messages" ref={message_ref}>
                    {for props.entries.iter().map(|entry| log_line(entry, props.issues_url.as_deref()))}
                </div>
            }
        </section>
    }
}

fn log_line(entry: &LogEntry, issues_url: Option<&str>) -> Html {
    let report_link = match (entry.level, issues_url) {
        (LogLevel::Error, Some(url)) => html! {
            <>
                <span>{" - "}</span>
                <a href={url.to_string()} target="_blank" rel="noopener noreferrer" class="text-danger">
                    {"Report an issue"}
                </a>
            </>
        },
        _ => html! {},
    };

    html! {
        <p class={classes!("m-0", "small", level_class(entry.level))}>
            <span class="opacity-50">{format!("[{}][{}] ", entry.timestamp, entry.source.label())}</span>
            <span>{&entry.message}</span>
            if let Some(detail) = &entry.detail {
                <span class="opacity-75">{format!(" ({})", detail)}</span>
            }
            {report_link}
        </p>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogSource, MAX_LOG_SIZE};

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(message, LogLevel::Info, LogSource::Popup)
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let view = Rc::new(LogView::default());

        let view = view.reduce(LogAction::Append(vec![entry("a"), entry("b")]));
        let view = view.reduce(LogAction::Append(vec![entry("c")]));

        let messages: Vec<&str> = view.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_view_drops_oldest_past_capacity() {
        let mut view = Rc::new(LogView::default());
        for i in 0..MAX_LOG_SIZE + 5 {
            view = view.reduce(LogAction::Append(vec![entry(&format!("event {}", i))]));
        }

        assert_eq!(view.entries.len(), MAX_LOG_SIZE);
        assert_eq!(view.entries[0].message, "event 5");
    }

    #[test]
    fn test_clear_empties_view() {
        let view = Rc::new(LogView::default()).reduce(LogAction::Append(vec![entry("a")]));

        let view = view.reduce(LogAction::Clear);

        assert!(view.entries.is_empty());
    }

    #[test]
    fn test_level_class() {
        assert_eq!(level_class(LogLevel::Info), "text-body");
        assert_eq!(level_class(LogLevel::Warn), "text-warning");
        assert_eq!(level_class(LogLevel::Error), "text-danger");
    }
}

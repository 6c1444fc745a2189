/// Popup UI: enable switch, theme menu, tabs and the log panel

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::bridge::{self, ChromeStorage};
use crate::info::ExtensionMetadata;
use crate::logger::{LogLevel, LogSource, LogStore};
use crate::reconciler::watch_logs;
use crate::settings::{Settings, Theme};
use crate::storage::{Storage, StorageError};
use crate::ui::components::{DocumentTab, InfoTab, VersionTab};
use crate::ui::log_panel::{LogAction, LogPanel, LogView};
use crate::ui::theme::apply_theme;

#[derive(Clone, Copy, PartialEq)]
enum ActiveTab {
    Info,
    Document,
    Version,
}

impl ActiveTab {
    const ALL: [ActiveTab; 3] = [ActiveTab::Info, ActiveTab::Document, ActiveTab::Version];

    fn label(&self) -> &'static str {
        match self {
            ActiveTab::Info => "Info",
            ActiveTab::Document => "Docs",
            ActiveTab::Version => "Versions",
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

#[function_component(App)]
pub fn app() -> Html {
    let manifest = use_memo((), |_| bridge::manifest());
    let metadata = use_memo((), |_| ExtensionMetadata::embedded());
    let log_view = use_reducer(LogView::default);
    let enabled = use_state(|| false);
    let settings = use_state(Settings::default);
    let error = use_state(|| None::<String>);
    let active_tab = use_state(|| ActiveTab::Info);
    let panel_open = use_state(|| false);
    let theme_menu_open = use_state(|| false);
    let more_menu_open = use_state(|| false);

    let name = manifest.display_name().to_string();

    // Render the stored log, start following it, then load settings
    {
        let dispatcher = log_view.dispatcher();
        let enabled = enabled.clone();
        let settings = settings.clone();
        let error = error.clone();
        let name = name.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let store = LogStore::new(ChromeStorage);
                let live = watch_logs(&store, move |entries| {
                    dispatcher.dispatch(LogAction::Append(entries));
                })
                .await;
                log::debug!("Rendered {} stored log entries", live.rendered());

                match load_state(&Storage::new(ChromeStorage)).await {
                    Ok((loaded, is_enabled)) => {
                        apply_theme(loaded.theme);
                        settings.set(loaded);
                        enabled.set(is_enabled);
                        show_log(format!("{} is currently {}", name, on_off(is_enabled)), None).await;
                    }
                    Err(e) => {
                        log::error!("Failed to load settings: {}", e);
                        error.set(Some("Failed to load settings".to_string()));
                        show_log("Failed to load settings", Some(&e)).await;
                    }
                }
            });
            || ()
        });
    }

    let on_enabled_change = {
        let enabled = enabled.clone();
        let error = error.clone();
        let name = name.clone();

        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let checked = input.checked();
            enabled.set(checked);

            let enabled = enabled.clone();
            let error = error.clone();
            let name = name.clone();
            spawn_local(async move {
                let saved = Storage::new(ChromeStorage).set_enabled(checked).await;
                enabled.set(switch_state(checked, &saved));
                match saved {
                    Ok(()) => {
                        error.set(None);
                        show_log(format!("{} is now {}", name, on_off(checked)), None).await;
                    }
                    Err(e) => {
                        log::error!("Failed to save enabled state: {}", e);
                        error.set(Some("Failed to save enabled state".to_string()));
                        show_log("Failed to save enabled state", Some(&e)).await;
                    }
                }
            });
        })
    };

    let on_theme_select = {
        let settings = settings.clone();
        let error = error.clone();
        let theme_menu_open = theme_menu_open.clone();

        move |theme: Theme| {
            let settings = settings.clone();
            let error = error.clone();
            let theme_menu_open = theme_menu_open.clone();

            Callback::from(move |_: MouseEvent| {
                apply_theme(theme);
                theme_menu_open.set(false);

                // Merge into what we loaded; the store replaces the whole record
                let updated = settings.with_theme(theme);
                settings.set(updated.clone());

                let error = error.clone();
                spawn_local(async move {
                    match Storage::new(ChromeStorage).set_settings(&updated).await {
                        Ok(()) => {
                            show_log(format!("Theme changed to {}", theme.as_str()), None).await;
                        }
                        Err(e) => {
                            log::error!("Failed to save theme: {}", e);
                            error.set(Some("Failed to save theme setting".to_string()));
                            show_log("Failed to save theme setting", Some(&e)).await;
                        }
                    }
                });
            })
        }
    };

    // The removal notification brings the feed back to zero on its own
    let on_clear = {
        let dispatcher = log_view.dispatcher();
        let error = error.clone();

        Callback::from(move |_: MouseEvent| {
            dispatcher.dispatch(LogAction::Clear);

            let error = error.clone();
            spawn_local(async move {
                if let Err(e) = LogStore::new(ChromeStorage).clear_logs().await {
                    log::error!("Failed to clear logs: {}", e);
                    error.set(Some("Failed to clear logs".to_string()));
                }
            });
        })
    };

    let on_new_tab = {
        let more_menu_open = more_menu_open.clone();
        Callback::from(move |_: MouseEvent| {
            more_menu_open.set(false);
            bridge::open_tab("popup.html");
        })
    };

    let on_tab_click = {
        let active_tab = active_tab.clone();
        move |tab: ActiveTab| {
            let active_tab = active_tab.clone();
            Callback::from(move |_: MouseEvent| {
                active_tab.set(tab);
            })
        }
    };

    html! {
        <div class="popup">
            <header id="header" class="popup-header d-flex align-items-center">
                <h1 id="title-header" class="popup-title">{&name}</h1>

                <div class="header-actions ms-auto">
                    <button id="theme-button" class="icon-button" title="Theme" onclick={toggle(&theme_menu_open)}>
                        {"◐"}
                    </button>
                    if *theme_menu_open {
                        <div id="theme-menu" class="menu theme-menu">
                            {for Theme::ALL.iter().map(|theme| html! {
                                <button
                                    class={classes!("theme-option", (settings.theme == *theme).then_some("active"))}
                                    onclick={on_theme_select(*theme)}
                                >
                                    {theme.label()}
                                </button>
                            })}
                        </div>
                    }

                    <button id="more-button" class="icon-button" title="More" onclick={toggle(&more_menu_open)}>
                        {"⋯"}
                    </button>
                    if *more_menu_open {
                        <div id="more-menu" class="menu more-menu">
                            <button id="new-tab-button" onclick={on_new_tab}>{"Open in new tab"}</button>
                        </div>
                    }
                </div>
            </header>

            <div class="form-check form-switch enabled-switch">
                <input
                    class="form-check-input"
                    type="checkbox"
                    id="enabled"
                    checked={*enabled}
                    onchange={on_enabled_change}
                />
                <label id="enabled-label" class="form-check-label" for="enabled">
                    {format!("Enable {}", name)}
                </label>
            </div>

            if let Some(message) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={message} inline={true}>
                </Alert>
            }

            // Tab navigation
            <div id="tab-menu" class="pf-v5-c-tabs tabs-nav">
                <ul class="pf-v5-c-tabs__list">
                    {for ActiveTab::ALL.iter().map(|tab| html! {
                        <li class={if *active_tab == *tab { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                            <button class="pf-v5-c-tabs__link" onclick={on_tab_click(*tab)}>
                                <span class="pf-v5-c-tabs__item-text">{tab.label()}</span>
                            </button>
                        </li>
                    })}
                </ul>
            </div>

            <div class="tab-pane-content">
                {match *active_tab {
                    ActiveTab::Info => html! {
                        <InfoTab manifest={(*manifest).clone()} metadata={(*metadata).clone()} />
                    },
                    ActiveTab::Document => html! { <DocumentTab /> },
                    ActiveTab::Version => html! {
                        <VersionTab current_version={manifest.version.clone()} />
                    },
                }}
            </div>

            <LogPanel
                entries={log_view.entries.clone()}
                issues_url={metadata.issues_link()}
                open={*panel_open}
                on_toggle={toggle(&panel_open)}
                on_clear={on_clear}
            />
        </div>
    }
}

// Helper functions

fn toggle(flag: &UseStateHandle<bool>) -> Callback<MouseEvent> {
    let flag = flag.clone();
    Callback::from(move |_: MouseEvent| {
        flag.set(!*flag);
    })
}

/// The switch only keeps a flip that made it to storage.
fn switch_state(checked: bool, saved: &Result<(), StorageError>) -> bool {
    if saved.is_ok() { checked } else { !checked }
}

async fn load_state(storage: &Storage<ChromeStorage>) -> Result<(Settings, bool), StorageError> {
    let settings = storage.get_settings().await?;
    let enabled = storage.is_enabled().await?;
    Ok((settings, enabled))
}

/// Record a popup event; a failure here is only reported to the console.
async fn show_log(message: impl Into<String>, error: Option<&StorageError>) {
    let level = if error.is_some() { LogLevel::Error } else { LogLevel::Info };
    let detail = error.map(|e| e.to_string());

    let store = LogStore::new(ChromeStorage);
    if let Err(e) = store.add_log(message, level, LogSource::Popup, detail, false).await {
        log::error!("Failed to save log entry: {}", e);
    }
}

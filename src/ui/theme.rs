/// Applying the theme preference to the popup document
use crate::settings::Theme;

/// Concrete light/dark choice; `System` is resolved once, no live tracking.
pub fn resolve(theme: Theme, prefers_dark: bool) -> Theme {
    match theme {
        Theme::System if prefers_dark => Theme::Dark,
        Theme::System => Theme::Light,
        other => other,
    }
}

fn prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// Set `theme-light`/`theme-dark` on `<body>` and `data-bs-theme` on `<html>`.
pub fn apply_theme(theme: Theme) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let resolved = resolve(theme, prefers_dark());

    if let Some(body) = document.body() {
        let classes = body.class_list();
        let _ = classes.remove_2("theme-light", "theme-dark");
        let _ = classes.add_1(&format!("theme-{}", resolved.as_str()));
    }
    if let Some(root) = document.document_element() {
        let _ = root.set_attribute("data-bs-theme", resolved.as_str());
    }
}

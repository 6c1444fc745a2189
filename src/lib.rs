/// Popup Console - browser extension popup, background logger and settings store
/// Built with Rust + WASM + Yew

mod background;
pub mod bridge;
pub mod docs;
pub mod info;
pub mod logger;
pub mod reconciler;
pub mod settings;
pub mod storage;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    // Avoid a flash of unstyled content until the stored theme is loaded
    ui::theme::apply_theme(settings::Theme::default());
    yew::Renderer::<ui::popup::App>::new().render();
}

// Record install/update events from the service worker
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

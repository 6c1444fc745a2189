/// UI module exports
pub mod components;
pub mod log_panel;
pub mod popup;
pub mod theme;

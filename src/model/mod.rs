pub mod config;
pub mod lifecycle;
pub mod mode;
pub mod panel;
pub mod theme;

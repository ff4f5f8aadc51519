pub mod config;
pub mod editor;
pub mod editor_display;
pub mod host;
pub mod paragraph;
pub mod render;
pub mod scheduler;
pub mod services;
pub mod theme;

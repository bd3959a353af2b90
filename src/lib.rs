pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod labels;
pub mod map;
pub mod scheduler;
pub mod ui;

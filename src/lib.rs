pub mod app;
pub mod canvas;
pub mod channels;
pub mod config;
pub mod github;
pub mod shared;
pub mod store;

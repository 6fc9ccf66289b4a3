pub mod codec;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod loader;
pub mod processing;
pub mod scan;
pub mod state;
pub mod viewer;
pub mod worker;

pub mod cancel;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod reporter;

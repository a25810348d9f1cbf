pub mod app;
pub mod backend;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod io;
pub mod pipeline;
pub mod prelude;

// Host-facing entry points.

pub mod simple;

pub use simple::{init_logging, start_session};

// Local HTTP surface for in-memory audio blobs.

pub mod handler;

pub use handler::ObjectUrlServer;

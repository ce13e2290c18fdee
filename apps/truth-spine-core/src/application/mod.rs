//! Application layer.
//!
//! The HTTP/gRPC surface itself is out of scope here; this layer is reduced
//! to the thin, serializable DTOs the core hands back across whatever
//! adapter a deployment puts in front of it.

pub mod dto;

pub use dto::*;

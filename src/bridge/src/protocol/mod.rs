//! Network bridging protocol.
//!
//! - `parser`: splits a datagram into [`Frame`]s
//! - `ingress`: validates frames and pushes them into the bridging queues

mod ingress;
mod parser;

pub use ingress::{Ingress, IngressStats};
pub use parser::{Frame, FrameParser};

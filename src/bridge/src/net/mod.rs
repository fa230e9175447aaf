//! Network receive path.
//!
//! The platform owns the smoltcp interface and socket set; the bridge only
//! needs a bound UDP socket to drain into its [`Ingress`](crate::protocol::Ingress).

mod udp;

pub use ps2bridge_common::NetError;
pub use udp::UdpListener;

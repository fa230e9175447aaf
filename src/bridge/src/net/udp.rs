//! UDP listener feeding received datagrams into the ingress.

use log::{debug, info};
use smoltcp::socket::udp;

use super::NetError;
use crate::protocol::{Ingress, IngressStats};

/// Drains a smoltcp UDP socket into an [`Ingress`].
///
/// Datagrams are parsed in place from the socket's receive buffer, so the
/// largest one accepted is bounded only by that buffer.
pub struct UdpListener {
    port: u16,
}

impl UdpListener {
    /// Listener for the given local port.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Local port this listener binds.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bind `socket` to the listener's port. An open socket is left alone.
    pub fn bind(&self, socket: &mut udp::Socket<'_>) -> Result<(), NetError> {
        if socket.is_open() {
            return Ok(());
        }
        socket.bind(self.port).map_err(|e| {
            debug!("udp: bind to port {} failed: {:?}", self.port, e);
            NetError::BindFailed
        })?;
        info!("udp: listening on port {}", self.port);
        Ok(())
    }

    /// Hand every datagram waiting in `socket` to `ingress`.
    pub fn poll(&self, socket: &mut udp::Socket<'_>, ingress: &Ingress) -> IngressStats {
        let mut stats = IngressStats::default();
        while let Ok((datagram, meta)) = socket.recv() {
            debug!("udp: {} bytes from {}", datagram.len(), meta.endpoint);
            stats.merge(ingress.handle_datagram(datagram));
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BridgeQueue;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use smoltcp::iface::{Config, Interface, SocketSet};
    use smoltcp::phy::{Loopback, Medium};
    use smoltcp::time::Instant;
    use smoltcp::wire::{EthernetAddress, IpAddress, IpCidr, IpEndpoint};

    fn socket() -> udp::Socket<'static> {
        let rx = udp::PacketBuffer::new(vec![udp::PacketMetadata::EMPTY; 4], vec![0; 1024]);
        let tx = udp::PacketBuffer::new(vec![udp::PacketMetadata::EMPTY; 4], vec![0; 1024]);
        udp::Socket::new(rx, tx)
    }

    fn ingress() -> Ingress {
        Ingress::new(
            Arc::new(BridgeQueue::new(30)),
            Arc::new(BridgeQueue::new(30)),
        )
    }

    #[test]
    fn test_bind_default_port() {
        let listener = UdpListener::new(3252);
        let mut socket = socket();
        assert_eq!(listener.bind(&mut socket), Ok(()));
        assert!(socket.is_open());
        assert_eq!(socket.endpoint().port, 3252);
        // Binding again is a no-op.
        assert_eq!(listener.bind(&mut socket), Ok(()));
    }

    #[test]
    fn test_bind_port_zero_fails() {
        let listener = UdpListener::new(0);
        let mut socket = socket();
        assert_eq!(listener.bind(&mut socket), Err(NetError::BindFailed));
    }

    #[test]
    fn test_poll_empty_socket() {
        let listener = UdpListener::new(3252);
        let mut socket = socket();
        listener.bind(&mut socket).unwrap();
        assert_eq!(listener.poll(&mut socket, &ingress()), IngressStats::default());
    }

    #[test]
    fn test_poll_reads_datagram_beyond_512_bytes() {
        let mut device = Loopback::new(Medium::Ethernet);
        let config = Config::new(EthernetAddress([0x02, 0, 0, 0, 0, 0x01]).into());
        let mut iface = Interface::new(config, &mut device, Instant::from_millis(0));
        iface.update_ip_addrs(|addrs| {
            addrs.push(IpCidr::new(IpAddress::v4(127, 0, 0, 1), 8)).unwrap();
        });

        let listener = UdpListener::new(3252);
        let mut sockets = SocketSet::new(vec![]);
        let bridge = sockets.add(socket());
        let sender = sockets.add(socket());
        listener.bind(sockets.get_mut::<udp::Socket>(bridge)).unwrap();

        // 100 mouse frames, 600 bytes.
        let frame = [b'M', 4, 0x08, 0x01, 0x00, 0x00];
        let datagram: Vec<u8> = frame.iter().copied().cycle().take(600).collect();
        {
            let sender = sockets.get_mut::<udp::Socket>(sender);
            sender.bind(49152).unwrap();
            sender
                .send_slice(&datagram, IpEndpoint::new(IpAddress::v4(127, 0, 0, 1), 3252))
                .unwrap();
        }
        for second in 0..10 {
            iface.poll(Instant::from_secs(second), &mut device, &mut sockets);
            if sockets.get_mut::<udp::Socket>(bridge).can_recv() {
                break;
            }
        }

        let mouse = Arc::new(BridgeQueue::new(30));
        let ingress = Ingress::new(Arc::new(BridgeQueue::new(30)), mouse.clone());
        let socket = sockets.get_mut::<udp::Socket>(bridge);
        let stats = listener.poll(socket, &ingress);
        assert_eq!(stats.accepted, 30);
        assert_eq!(stats.dropped, 70);
        assert_eq!(mouse.len(), 30);
        assert!(!socket.can_recv());
    }
}

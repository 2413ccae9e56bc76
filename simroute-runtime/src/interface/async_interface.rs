use crate::interface::NetworkInterface;
use crate::time::Instant;
use crate::{InterfaceConfig, Result};
use simroute_packets::{EthernetFrame, Ipv4Packet, MacAddr};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::Duration;

/// A `NetworkInterface` whose received datagrams are buffered rather than returned, so an owner
/// can drain several interfaces with `maybe_receive` in whatever order it likes.
#[derive(Debug)]
pub struct AsyncNetworkInterface {
    inner: NetworkInterface,
    inbound: VecDeque<Ipv4Packet>,
}

impl AsyncNetworkInterface {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        NetworkInterface::new(mac, ip).into()
    }

    pub fn with_config(mac: MacAddr, ip: Ipv4Addr, config: InterfaceConfig) -> Self {
        NetworkInterface::with_config(mac, ip, config).into()
    }

    /// Takes in one frame from the link, buffering the IPv4 datagram it carried.
    pub fn recv_frame(&mut self, frame: EthernetFrame) -> Result<()> {
        if let Some(datagram) = self.inner.recv_frame(frame)? {
            self.inbound.push_back(datagram);
        }
        Ok(())
    }

    /// Pops the oldest buffered datagram. Never blocks.
    pub fn maybe_receive(&mut self) -> Option<Ipv4Packet> {
        self.inbound.pop_front()
    }

    pub fn send_datagram(&mut self, datagram: Ipv4Packet, next_hop: Ipv4Addr) {
        self.inner.send_datagram(datagram, next_hop)
    }

    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.inner.maybe_send()
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.inner.tick(elapsed)
    }

    pub fn mac_addr(&self) -> MacAddr {
        self.inner.mac_addr()
    }

    pub fn ip_addr(&self) -> Ipv4Addr {
        self.inner.ip_addr()
    }

    pub fn now(&self) -> Instant {
        self.inner.now()
    }

    pub fn config(&self) -> &InterfaceConfig {
        self.inner.config()
    }
}

impl From<NetworkInterface> for AsyncNetworkInterface {
    fn from(inner: NetworkInterface) -> Self {
        AsyncNetworkInterface {
            inner,
            inbound: VecDeque::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL_MAC: MacAddr = MacAddr {
        bytes: [0x02, 0, 0, 0, 0, 0x01],
    };
    const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const PEER_MAC: MacAddr = MacAddr {
        bytes: [0x02, 0, 0, 0, 0, 0x02],
    };

    fn frame_with_ttl(ttl: u8) -> EthernetFrame {
        let mut datagram = Ipv4Packet::empty();
        datagram.set_ttl(ttl);
        datagram.set_checksum();
        let mut frame = EthernetFrame::encap_ipv4(datagram);
        frame.set_dest_mac(LOCAL_MAC);
        frame.set_src_mac(PEER_MAC);
        frame
    }

    #[test]
    fn buffers_in_arrival_order() {
        let mut interface = AsyncNetworkInterface::new(LOCAL_MAC, LOCAL_IP);
        assert!(interface.maybe_receive().is_none());

        interface.recv_frame(frame_with_ttl(1)).unwrap();
        interface.recv_frame(frame_with_ttl(2)).unwrap();

        assert_eq!(interface.maybe_receive().map(|d| d.ttl()), Some(1));
        assert_eq!(interface.maybe_receive().map(|d| d.ttl()), Some(2));
        assert!(interface.maybe_receive().is_none());
    }

    #[test]
    fn wraps_existing_interface() {
        let mut inner = NetworkInterface::new(LOCAL_MAC, LOCAL_IP);
        inner.tick(Duration::from_secs(3));

        let interface = AsyncNetworkInterface::from(inner);
        assert_eq!(interface.now(), Instant::from_millis(3_000));
        assert_eq!(interface.mac_addr(), LOCAL_MAC);
        assert_eq!(interface.ip_addr(), LOCAL_IP);
    }
}

use crate::arp::AddressResolver;
use crate::time::Instant;
use crate::{InterfaceConfig, Result};
use simroute_packets::{EthernetFrame, Ipv4Packet, MacAddr};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::Duration;

/// One Ethernet attached IPv4 interface.
///
/// Outgoing datagrams become frames (or wait on address resolution) and land in an outbound
/// FIFO that the owner drains with `maybe_send`. Received frames are handed to `recv_frame`;
/// any IPv4 datagram they carry is returned, and any frames they cause to be sent join the
/// outbound FIFO.
#[derive(Debug)]
pub struct NetworkInterface {
    resolver: AddressResolver,
    outbound: VecDeque<EthernetFrame>,
    now: Instant,
}

impl NetworkInterface {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self::with_config(mac, ip, InterfaceConfig::default())
    }

    pub fn with_config(mac: MacAddr, ip: Ipv4Addr, config: InterfaceConfig) -> Self {
        NetworkInterface {
            resolver: AddressResolver::new(mac, ip, config),
            outbound: VecDeque::new(),
            now: Instant::ZERO,
        }
    }

    /// Sends `datagram` to `next_hop`, which must be on this interface's link.
    pub fn send_datagram(&mut self, datagram: Ipv4Packet, next_hop: Ipv4Addr) {
        if let Some(frame) = self.resolver.resolve_and_queue(datagram, next_hop, self.now) {
            self.outbound.push_back(frame);
        }
    }

    /// Takes in one frame from the link. Returns the IPv4 datagram it carried, if any.
    pub fn recv_frame(&mut self, frame: EthernetFrame) -> Result<Option<Ipv4Packet>> {
        let handled = self.resolver.handle_frame(frame, self.now)?;
        self.outbound.extend(handled.outbound);
        Ok(handled.datagram)
    }

    /// Pops the next frame to put on the wire.
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.outbound.pop_front()
    }

    /// Advances this interface's clock.
    pub fn tick(&mut self, elapsed: Duration) {
        self.now = self.now + elapsed;
    }

    pub fn mac_addr(&self) -> MacAddr {
        self.resolver.mac_addr()
    }

    pub fn ip_addr(&self) -> Ipv4Addr {
        self.resolver.ip_addr()
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn config(&self) -> &InterfaceConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }
}

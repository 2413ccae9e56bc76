use crate::processor::Processor;
use simroute_packets::Ipv4Packet;
use tracing::debug;

/// Decrements the TTL of an IPv4 packet and recomputes its header checksum.
///
/// A packet whose TTL would reach zero is dropped.
#[derive(Debug, Default)]
pub struct DecIpv4HopLimit {}

impl DecIpv4HopLimit {
    pub fn new() -> DecIpv4HopLimit {
        DecIpv4HopLimit {}
    }
}

impl Processor for DecIpv4HopLimit {
    type Input = Ipv4Packet;
    type Output = Ipv4Packet;

    fn process(&mut self, mut packet: Self::Input) -> Option<Self::Output> {
        match packet.ttl() {
            0 | 1 => {
                debug!(src = %packet.src_addr(), dest = %packet.dest_addr(), "TTL exhausted, dropping");
                None
            }
            ttl => {
                packet.set_ttl(ttl - 1);
                packet.set_checksum();
                Some(packet)
            }
        }
    }
}

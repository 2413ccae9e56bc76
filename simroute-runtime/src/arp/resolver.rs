use crate::arp::{ArpCache, PendingTable, RequestState};
use crate::classifier::{Classifier, EtherClass, EtherTypeClassifier};
use crate::time::Instant;
use crate::{Error, InterfaceConfig, Result, StalePending};
use simroute_packets::{ArpFrame, ArpOp, EthernetFrame, Ipv4Packet, MacAddr};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::{debug, trace, warn};

/// What came out of one received frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Handled {
    /// The IPv4 datagram the frame carried, if it carried one.
    pub datagram: Option<Ipv4Packet>,
    /// Frames to put on the wire as a result: an ARP reply and/or datagrams released from
    /// the pending queue, in transmission order.
    pub outbound: Vec<EthernetFrame>,
}

/// Translates next hop IPv4 addresses into Ethernet addresses for one interface, holding
/// datagrams back until their next hop is known.
#[derive(Debug)]
pub struct AddressResolver {
    mac: MacAddr,
    ip: Ipv4Addr,
    config: InterfaceConfig,
    cache: ArpCache,
    pending: PendingTable,
}

impl AddressResolver {
    pub fn new(mac: MacAddr, ip: Ipv4Addr, config: InterfaceConfig) -> Self {
        AddressResolver {
            mac,
            ip,
            config,
            cache: ArpCache::new(),
            pending: PendingTable::new(),
        }
    }

    pub fn mac_addr(&self) -> MacAddr {
        self.mac
    }

    pub fn ip_addr(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArpCache {
        &self.cache
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Frames `datagram` for `next_hop` if its link address is known. Otherwise the datagram
    /// is queued, and an ARP request is returned when none is outstanding for `next_hop`.
    pub fn resolve_and_queue(
        &mut self,
        datagram: Ipv4Packet,
        next_hop: Ipv4Addr,
        now: Instant,
    ) -> Option<EthernetFrame> {
        if let Some(dest) = self.cache.lookup(next_hop, now) {
            trace!(%next_hop, %dest, "cache hit");
            return Some(self.datagram_frame(datagram, dest));
        }

        let interval = self.config.arp_retry_interval;
        let (state, pending) = self.pending.begin_request(next_hop, now, interval);

        if state == RequestState::Retry && self.config.stale_pending == StalePending::Drop {
            if !pending.datagrams.is_empty() {
                debug!(
                    %next_hop,
                    dropped = pending.datagrams.len(),
                    "discarding datagrams queued under the previous request"
                );
            }
            pending.datagrams.clear();
        }

        if let Some(limit) = self.config.max_pending_per_address {
            if pending.datagrams.len() >= limit.get() {
                warn!(%next_hop, limit = limit.get(), "pending queue full, dropping oldest datagram");
                pending.datagrams.pop_front();
            }
        }
        pending.datagrams.push_back(datagram);

        match state {
            RequestState::Outstanding => {
                trace!(%next_hop, "request outstanding, datagram queued");
                None
            }
            RequestState::First | RequestState::Retry => {
                debug!(%next_hop, retry = state == RequestState::Retry, "sending ARP request");
                Some(self.request_frame(next_hop))
            }
        }
    }

    /// Interprets one received frame.
    ///
    /// IPv4 datagrams are handed back to the caller. ARP messages teach us the sender's mapping,
    /// get answered if they ask for our address, and release whatever was waiting on the
    /// sender. Frames addressed to another station are ignored.
    pub fn handle_frame(&mut self, frame: EthernetFrame, now: Instant) -> Result<Handled> {
        let dest = frame.dest_mac();
        if dest != self.mac && !dest.is_broadcast() {
            trace!(%dest, "ignoring frame for another station");
            return Ok(Handled::default());
        }

        match EtherTypeClassifier.classify(&frame) {
            EtherClass::Ipv4 => {
                let datagram = Ipv4Packet::try_from(frame)?;
                if !datagram.validate_checksum() {
                    return Err(Error::Malformed("IPv4 header checksum is invalid"));
                }
                Ok(Handled {
                    datagram: Some(datagram),
                    outbound: Vec::new(),
                })
            }
            EtherClass::Arp => self.handle_arp(ArpFrame::try_from(frame)?, now),
            EtherClass::Other(ether_type) => {
                trace!(ether_type, "ignoring frame with unsupported ether type");
                Ok(Handled::default())
            }
        }
    }

    fn handle_arp(&mut self, arp: ArpFrame, now: Instant) -> Result<Handled> {
        if !arp.is_ethernet_ipv4() {
            return Err(Error::Malformed("ARP message is not Ethernet/IPv4"));
        }
        let op = ArpOp::try_from(arp.opcode())?;
        let sender_mac = arp.sender_mac_addr()?;
        let sender_ip = arp.sender_ipv4_addr()?;
        let target_ip = arp.target_ipv4_addr()?;

        let expires_at = now + self.config.mapping_lifetime;
        debug!(%sender_ip, %sender_mac, %expires_at, "learned mapping");
        self.cache.insert(sender_ip, sender_mac, expires_at);

        let mut outbound = Vec::new();
        if op == ArpOp::Request && target_ip == self.ip {
            debug!(to = %sender_ip, "sending ARP reply");
            let mut reply = ArpFrame::ipv4(ArpOp::Reply, self.mac, self.ip, sender_mac, sender_ip);
            reply.set_dest_mac(sender_mac);
            outbound.push(reply.frame());
        }

        if let Some(queued) = self.pending.resolve(sender_ip) {
            debug!(next_hop = %sender_ip, count = queued.len(), "flushing pending datagrams");
            for datagram in queued {
                outbound.push(self.datagram_frame(datagram, sender_mac));
            }
        }

        Ok(Handled {
            datagram: None,
            outbound,
        })
    }

    fn datagram_frame(&self, datagram: Ipv4Packet, dest: MacAddr) -> EthernetFrame {
        let mut frame = EthernetFrame::encap_ipv4(datagram);
        frame.set_dest_mac(dest);
        frame.set_src_mac(self.mac);
        frame
    }

    fn request_frame(&self, target_ip: Ipv4Addr) -> EthernetFrame {
        let mut request =
            ArpFrame::ipv4(ArpOp::Request, self.mac, self.ip, MacAddr::ZERO, target_ip);
        request.set_dest_mac(MacAddr::BROADCAST);
        request.frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simroute_packets::{IpProtocol, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
    use std::num::NonZeroUsize;

    const LOCAL_MAC: MacAddr = MacAddr {
        bytes: [0x02, 0, 0, 0, 0, 0x01],
    };
    const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(4, 3, 2, 1);
    const PEER_MAC: MacAddr = MacAddr {
        bytes: [0x02, 0, 0, 0, 0, 0x02],
    };
    const PEER_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 1);

    fn resolver() -> AddressResolver {
        AddressResolver::new(LOCAL_MAC, LOCAL_IP, InterfaceConfig::default())
    }

    fn at(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    fn datagram(ttl: u8) -> Ipv4Packet {
        let mut datagram = Ipv4Packet::empty();
        datagram.set_src_addr(LOCAL_IP);
        datagram.set_dest_addr(Ipv4Addr::new(13, 12, 11, 10));
        datagram.set_protocol(IpProtocol::UDP);
        datagram.set_ttl(ttl);
        datagram.set_payload(&[0xde, 0xad, 0xbe, 0xef]);
        datagram.set_checksum();
        datagram
    }

    fn reply_from_peer() -> EthernetFrame {
        let mut reply = ArpFrame::ipv4(ArpOp::Reply, PEER_MAC, PEER_IP, LOCAL_MAC, LOCAL_IP);
        reply.set_dest_mac(LOCAL_MAC);
        reply.frame()
    }

    #[test]
    fn first_send_emits_request() {
        let mut resolver = resolver();
        let frame = resolver
            .resolve_and_queue(datagram(64), PEER_IP, at(0))
            .unwrap();

        assert_eq!(frame.dest_mac(), MacAddr::BROADCAST);
        assert_eq!(frame.src_mac(), LOCAL_MAC);
        assert_eq!(frame.ether_type(), ARP_ETHER_TYPE);

        let arp = ArpFrame::try_from(frame).unwrap();
        assert_eq!(arp.opcode(), ArpOp::Request as u16);
        assert_eq!(arp.sender_mac_addr(), Ok(LOCAL_MAC));
        assert_eq!(arp.sender_ipv4_addr(), Ok(LOCAL_IP));
        assert_eq!(arp.target_mac_addr(), Ok(MacAddr::ZERO));
        assert_eq!(arp.target_ipv4_addr(), Ok(PEER_IP));
        assert_eq!(resolver.pending().queued(), 1);
    }

    #[test]
    fn request_is_not_repeated_within_interval() {
        let mut resolver = resolver();
        assert!(resolver.resolve_and_queue(datagram(1), PEER_IP, at(0)).is_some());
        assert!(resolver.resolve_and_queue(datagram(2), PEER_IP, at(4_990)).is_none());
        assert!(resolver.resolve_and_queue(datagram(3), PEER_IP, at(5_000)).is_none());
        assert!(resolver.resolve_and_queue(datagram(4), PEER_IP, at(5_001)).is_some());
        assert_eq!(resolver.pending().queued(), 4);
    }

    #[test]
    fn reply_flushes_queue_in_order() {
        let mut resolver = resolver();
        resolver.resolve_and_queue(datagram(10), PEER_IP, at(0));
        resolver.resolve_and_queue(datagram(20), PEER_IP, at(10));

        let handled = resolver.handle_frame(reply_from_peer(), at(20)).unwrap();
        assert_eq!(handled.datagram, None);
        assert_eq!(handled.outbound.len(), 2);
        for (frame, ttl) in handled.outbound.into_iter().zip(&[10u8, 20]) {
            assert_eq!(frame.dest_mac(), PEER_MAC);
            assert_eq!(frame.src_mac(), LOCAL_MAC);
            assert_eq!(frame.ether_type(), IPV4_ETHER_TYPE);
            let sent = Ipv4Packet::try_from(frame).unwrap();
            assert_eq!(sent, datagram(*ttl));
        }
        assert!(resolver.pending().is_empty());

        let direct = resolver
            .resolve_and_queue(datagram(30), PEER_IP, at(30))
            .unwrap();
        assert_eq!(direct.dest_mac(), PEER_MAC);
        assert_eq!(direct.ether_type(), IPV4_ETHER_TYPE);
    }

    #[test]
    fn answers_requests_for_own_address() {
        let mut resolver = resolver();
        let mut request = ArpFrame::ipv4(ArpOp::Request, PEER_MAC, PEER_IP, MacAddr::ZERO, LOCAL_IP);
        request.set_dest_mac(MacAddr::BROADCAST);

        let handled = resolver.handle_frame(request.frame(), at(0)).unwrap();
        assert_eq!(handled.outbound.len(), 1);

        let frame = handled.outbound.into_iter().next().unwrap();
        assert_eq!(frame.dest_mac(), PEER_MAC);
        assert_eq!(frame.src_mac(), LOCAL_MAC);
        let reply = ArpFrame::try_from(frame).unwrap();
        assert_eq!(reply.opcode(), ArpOp::Reply as u16);
        assert_eq!(reply.sender_mac_addr(), Ok(LOCAL_MAC));
        assert_eq!(reply.sender_ipv4_addr(), Ok(LOCAL_IP));
        assert_eq!(reply.target_mac_addr(), Ok(PEER_MAC));
        assert_eq!(reply.target_ipv4_addr(), Ok(PEER_IP));

        // The asker is learned as well
        assert!(resolver.resolve_and_queue(datagram(5), PEER_IP, at(1)).is_some());
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn learns_from_requests_for_other_addresses() {
        let mut resolver = resolver();
        let mut request = ArpFrame::ipv4(
            ArpOp::Request,
            PEER_MAC,
            PEER_IP,
            MacAddr::ZERO,
            Ipv4Addr::new(4, 3, 2, 9),
        );
        request.set_dest_mac(MacAddr::BROADCAST);

        let handled = resolver.handle_frame(request.frame(), at(0)).unwrap();
        assert!(handled.outbound.is_empty());
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn mappings_expire() {
        let mut resolver = resolver();
        resolver.handle_frame(reply_from_peer(), at(0)).unwrap();

        let frame = resolver
            .resolve_and_queue(datagram(1), PEER_IP, at(29_999))
            .unwrap();
        assert_eq!(frame.ether_type(), IPV4_ETHER_TYPE);

        let frame = resolver
            .resolve_and_queue(datagram(2), PEER_IP, at(30_000))
            .unwrap();
        assert_eq!(frame.ether_type(), ARP_ETHER_TYPE);
    }

    #[test]
    fn stale_datagrams_dropped_on_retry() {
        let config = InterfaceConfig::new().stale_pending(StalePending::Drop);
        let mut resolver = AddressResolver::new(LOCAL_MAC, LOCAL_IP, config);

        resolver.resolve_and_queue(datagram(1), PEER_IP, at(0));
        resolver.resolve_and_queue(datagram(2), PEER_IP, at(1_000));
        assert!(resolver.resolve_and_queue(datagram(3), PEER_IP, at(6_000)).is_some());
        assert_eq!(resolver.pending().queued(), 1);

        let handled = resolver.handle_frame(reply_from_peer(), at(6_100)).unwrap();
        assert_eq!(handled.outbound.len(), 1);
        let sent = Ipv4Packet::try_from(handled.outbound[0].clone()).unwrap();
        assert_eq!(sent.ttl(), 3);
    }

    #[test]
    fn bounded_queue_drops_oldest() {
        let limit = NonZeroUsize::new(2).unwrap();
        let config = InterfaceConfig::new().max_pending_per_address(limit);
        let mut resolver = AddressResolver::new(LOCAL_MAC, LOCAL_IP, config);
        for ttl in 1..=3 {
            resolver.resolve_and_queue(datagram(ttl), PEER_IP, at(0));
        }

        let handled = resolver.handle_frame(reply_from_peer(), at(1)).unwrap();
        let ttls: Vec<u8> = handled
            .outbound
            .into_iter()
            .map(|frame| Ipv4Packet::try_from(frame).unwrap().ttl())
            .collect();
        assert_eq!(ttls, vec![2, 3]);
    }

    #[test]
    fn ignores_frames_for_other_stations() {
        let mut resolver = resolver();
        let mut reply = ArpFrame::ipv4(ArpOp::Reply, PEER_MAC, PEER_IP, LOCAL_MAC, LOCAL_IP);
        reply.set_dest_mac(MacAddr::new([0x02, 0, 0, 0, 0, 0x99]));

        let handled = resolver.handle_frame(reply.frame(), at(0)).unwrap();
        assert_eq!(handled, Handled::default());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn hands_back_datagrams() {
        let mut resolver = resolver();
        let mut frame = EthernetFrame::encap_ipv4(datagram(64));
        frame.set_dest_mac(LOCAL_MAC);
        frame.set_src_mac(PEER_MAC);

        let handled = resolver.handle_frame(frame, at(0)).unwrap();
        assert_eq!(handled.datagram, Some(datagram(64)));
        assert!(handled.outbound.is_empty());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut resolver = resolver();
        let mut bad = datagram(64);
        bad.set_ttl(63);
        let mut frame = EthernetFrame::encap_ipv4(bad);
        frame.set_dest_mac(LOCAL_MAC);

        assert!(matches!(
            resolver.handle_frame(frame, at(0)),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_opcode() {
        let mut resolver = resolver();
        let mut arp = ArpFrame::ipv4(ArpOp::Reply, PEER_MAC, PEER_IP, LOCAL_MAC, LOCAL_IP);
        arp.set_opcode(9);
        arp.set_dest_mac(LOCAL_MAC);

        assert!(matches!(
            resolver.handle_frame(arp.frame(), at(0)),
            Err(Error::Malformed(_))
        ));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn ignores_other_ether_types() {
        let mut resolver = resolver();
        let frame = EthernetFrame::new(LOCAL_MAC, PEER_MAC, 0x86DD, &[0; 40]);
        let handled = resolver.handle_frame(frame, at(0)).unwrap();
        assert_eq!(handled, Handled::default());
    }
}

use crate::time::Instant;
use simroute_packets::Ipv4Packet;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Datagrams waiting for one next hop to resolve, and when we last asked for it.
#[derive(Debug, Clone)]
pub struct PendingResolution {
    pub datagrams: VecDeque<Ipv4Packet>,
    pub last_request: Instant,
}

impl PendingResolution {
    /// True once strictly more than `interval` has passed since the last request.
    pub fn retry_due(&self, now: Instant, interval: Duration) -> bool {
        now.duration_since(self.last_request) > interval
    }
}

/// Whether a new datagram for a next hop needs an ARP request to go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// No request was outstanding for this next hop.
    First,
    /// The outstanding request is older than the retry interval.
    Retry,
    /// A recent request is still outstanding.
    Outstanding,
}

/// All unresolved next hops of one interface. At most one request is outstanding per address.
#[derive(Debug, Default)]
pub struct PendingTable {
    waiting: HashMap<Ipv4Addr, PendingResolution>,
}

impl PendingTable {
    pub fn new() -> Self {
        PendingTable {
            waiting: HashMap::new(),
        }
    }

    /// Decides whether a request for `next_hop` is due at `now`, and if so records `now` as the
    /// time of that request. The record is created on first use.
    pub fn begin_request(
        &mut self,
        next_hop: Ipv4Addr,
        now: Instant,
        interval: Duration,
    ) -> (RequestState, &mut PendingResolution) {
        match self.waiting.entry(next_hop) {
            Entry::Vacant(vacant) => (
                RequestState::First,
                vacant.insert(PendingResolution {
                    datagrams: VecDeque::new(),
                    last_request: now,
                }),
            ),
            Entry::Occupied(occupied) => {
                let pending = occupied.into_mut();
                if pending.retry_due(now, interval) {
                    pending.last_request = now;
                    (RequestState::Retry, pending)
                } else {
                    (RequestState::Outstanding, pending)
                }
            }
        }
    }

    /// Removes the record for `ip` and hands back its datagrams in the order they were queued.
    pub fn resolve(&mut self, ip: Ipv4Addr) -> Option<VecDeque<Ipv4Packet>> {
        self.waiting.remove(&ip).map(|pending| pending.datagrams)
    }

    pub fn get(&self, ip: Ipv4Addr) -> Option<&PendingResolution> {
        self.waiting.get(&ip)
    }

    pub fn is_pending(&self, ip: Ipv4Addr) -> bool {
        self.waiting.contains_key(&ip)
    }

    /// Number of datagrams queued across every next hop.
    pub fn queued(&self) -> usize {
        self.waiting.values().map(|pending| pending.datagrams.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

use crate::classifier::Classifier;
use crate::{Error, Result};
use simroute_packets::Ipv4Packet;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

const MAX_PREFIX_LENGTH: u8 = 32;

/// Keeps the top `prefix_length` bits of `addr`.
pub fn mask(addr: Ipv4Addr, prefix_length: u8) -> Ipv4Addr {
    let bits = u32::from(addr);
    let masked = match prefix_length {
        0 => 0,
        len if len >= MAX_PREFIX_LENGTH => bits,
        len => bits & (u32::max_value() << (MAX_PREFIX_LENGTH - len)),
    };
    Ipv4Addr::from(masked)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    /// Stored already masked to `prefix_length`.
    pub prefix: Ipv4Addr,
    pub prefix_length: u8,
    /// `None` when the destination is directly attached to `interface`.
    pub next_hop: Option<Ipv4Addr>,
    pub interface: usize,
}

impl RouteEntry {
    /// Where a datagram for `dest` goes next on this route's link.
    pub fn next_hop_for(&self, dest: Ipv4Addr) -> Ipv4Addr {
        self.next_hop.unwrap_or(dest)
    }

    pub fn matches(&self, dest: Ipv4Addr) -> bool {
        mask(dest, self.prefix_length) == self.prefix
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{} => ", self.prefix, self.prefix_length)?;
        match self.next_hop {
            Some(next_hop) => write!(f, "{} ", next_hop)?,
            None => write!(f, "(direct) ")?,
        }
        write!(f, "on interface {}", self.interface)
    }
}

/// Longest prefix match over static routes.
///
/// Entries live in one hash map per prefix length, keyed by the masked prefix. A lookup probes
/// the lengths from 32 down to 0 and the first hit is the most specific route. Two entries of
/// the same length can never share a masked prefix, so there is nothing left to break ties on.
#[derive(Debug, Clone)]
pub struct RouteTable {
    slots: Vec<HashMap<u32, RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        RouteTable {
            slots: vec![HashMap::new(); MAX_PREFIX_LENGTH as usize + 1],
        }
    }

    pub fn insert(
        &mut self,
        prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface: usize,
    ) -> Result<&RouteEntry> {
        if prefix_length > MAX_PREFIX_LENGTH {
            return Err(Error::InvalidPrefixLength(prefix_length));
        }
        let prefix = mask(prefix, prefix_length);
        let slot = &mut self.slots[prefix_length as usize];
        let key = u32::from(prefix);
        if slot.contains_key(&key) {
            return Err(Error::DuplicateRoute {
                prefix,
                prefix_length,
            });
        }
        Ok(slot.entry(key).or_insert(RouteEntry {
            prefix,
            prefix_length,
            next_hop,
            interface,
        }))
    }

    pub fn find_match(&self, dest: Ipv4Addr) -> Option<&RouteEntry> {
        (0..=MAX_PREFIX_LENGTH)
            .rev()
            .find_map(|len| self.slots[len as usize].get(&u32::from(mask(dest, len))))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every route, most specific first.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.slots.iter().rev().flat_map(HashMap::values)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts datagrams by the route that should carry them.
impl Classifier for RouteTable {
    type Packet = Ipv4Packet;
    type Class = Option<RouteEntry>;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        self.find_match(packet.dest_addr()).copied()
    }
}

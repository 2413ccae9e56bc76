use crate::time::Instant;
use simroute_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub mac: MacAddr,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Learned IPv4 to MAC translations for a single interface.
#[derive(Debug, Default)]
pub struct ArpCache {
    entries: HashMap<Ipv4Addr, CacheEntry>,
}

impl ArpCache {
    pub fn new() -> Self {
        ArpCache {
            entries: HashMap::new(),
        }
    }

    /// Records a mapping, replacing any previous one for the same address.
    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr, expires_at: Instant) {
        self.entries.insert(ip, CacheEntry { mac, expires_at });
    }

    /// Returns the live mapping for `ip`. An expired entry is evicted and reported as missing.
    pub fn lookup(&mut self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        match self.entries.get(&ip) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(&ip);
                None
            }
            Some(entry) => Some(entry.mac),
            None => None,
        }
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.entries.contains_key(&ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use crate::classifier::Classifier;
use crate::interface::AsyncNetworkInterface;
use crate::processor::{DecIpv4HopLimit, Processor};
use crate::router::{RouteEntry, RouteTable};
use crate::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, trace};

/// Running totals of what `route` did with the datagrams it drained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    pub forwarded: u64,
    pub dropped_ttl: u64,
    pub dropped_no_route: u64,
}

/// Forwards datagrams between the interfaces it owns by longest prefix match.
#[derive(Debug)]
pub struct Router {
    interfaces: Vec<AsyncNetworkInterface>,
    table: RouteTable,
    hop_limit: DecIpv4HopLimit,
    stats: RouterStats,
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            table: RouteTable::new(),
            hop_limit: DecIpv4HopLimit::new(),
            stats: RouterStats::default(),
        }
    }

    /// Takes ownership of `interface` and returns the index routes use to refer to it.
    pub fn add_interface(&mut self, interface: AsyncNetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&self, index: usize) -> Option<&AsyncNetworkInterface> {
        self.interfaces.get(index)
    }

    pub fn interface_mut(&mut self, index: usize) -> Option<&mut AsyncNetworkInterface> {
        self.interfaces.get_mut(index)
    }

    pub fn interfaces(&self) -> usize {
        self.interfaces.len()
    }

    /// Adds a static route. `next_hop` is `None` for a network attached directly to `interface`.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface: usize,
    ) -> Result<()> {
        if interface >= self.interfaces.len() {
            return Err(Error::UnknownInterface(interface));
        }
        let entry = self.table.insert(prefix, prefix_length, next_hop, interface)?;
        debug!(route = %entry, "added route");
        Ok(())
    }

    pub fn find_match(&self, dest: Ipv4Addr) -> Option<&RouteEntry> {
        self.table.find_match(dest)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Drains every interface in index order and forwards what it received.
    pub fn route(&mut self) {
        for index in 0..self.interfaces.len() {
            while let Some(datagram) = self.interfaces[index].maybe_receive() {
                let dest = datagram.dest_addr();
                let datagram = match self.hop_limit.process(datagram) {
                    Some(datagram) => datagram,
                    None => {
                        self.stats.dropped_ttl += 1;
                        continue;
                    }
                };
                let entry = match self.table.classify(&datagram) {
                    Some(entry) => entry,
                    None => {
                        debug!(%dest, "no route, dropping");
                        self.stats.dropped_no_route += 1;
                        continue;
                    }
                };
                let next_hop = entry.next_hop_for(dest);
                trace!(%dest, %next_hop, from = index, to = entry.interface, "forwarding");
                self.interfaces[entry.interface].send_datagram(datagram, next_hop);
                self.stats.forwarded += 1;
            }
        }
    }

    /// Advances the clock of every interface.
    pub fn tick(&mut self, elapsed: Duration) {
        for interface in self.interfaces.iter_mut() {
            interface.tick(elapsed);
        }
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

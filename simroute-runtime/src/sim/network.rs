use crate::interface::AsyncNetworkInterface;
use crate::router::Router;
use crate::sim::{random_private_mac, random_router_mac};
use crate::{InterfaceConfig, Result};
use rand::Rng;
use simroute_packets::{EthernetFrame, IpProtocol, Ipv4Packet, MacAddr};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;
use tracing::{trace, warn};

/// A host expectation that did not hold once the simulation finished.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("host {host} received an unexpected datagram: {datagram:?}")]
    Unexpected { host: String, datagram: Ipv4Packet },

    #[error("host {host} did not receive an expected datagram: {datagram:?}")]
    Missing { host: String, datagram: Ipv4Packet },

    #[error("no host named {0}")]
    UnknownHost(String),
}

/// An end host with one interface and a single next hop for everything it sends.
#[derive(Debug)]
pub struct Host {
    name: String,
    address: Ipv4Addr,
    next_hop: Ipv4Addr,
    interface: AsyncNetworkInterface,
    expecting: Vec<Ipv4Packet>,
}

impl Host {
    pub fn new(
        name: &str,
        mac: MacAddr,
        address: Ipv4Addr,
        next_hop: Ipv4Addr,
        config: InterfaceConfig,
    ) -> Self {
        Host {
            name: name.to_string(),
            address,
            next_hop,
            interface: AsyncNetworkInterface::with_config(mac, address, config),
            expecting: Vec::new(),
        }
    }

    /// Sends a datagram with a random payload to `dest` and returns a copy of it.
    pub fn send_to(&mut self, dest: Ipv4Addr, ttl: u8) -> Ipv4Packet {
        let payload = format!("random payload: {{{}}}", rand::thread_rng().gen::<u32>());
        let mut datagram = Ipv4Packet::empty();
        datagram.set_src_addr(self.address);
        datagram.set_dest_addr(dest);
        datagram.set_protocol(IpProtocol::UDP);
        datagram.set_ttl(ttl);
        datagram.set_payload(payload.as_bytes());
        datagram.set_checksum();
        trace!(host = %self.name, %dest, next_hop = %self.next_hop, "sending datagram");
        self.interface.send_datagram(datagram.clone(), self.next_hop);
        datagram
    }

    /// The host must receive `datagram` before the next check.
    pub fn expect(&mut self, datagram: Ipv4Packet) {
        self.expecting.push(datagram);
    }

    /// Drains everything received and matches it against the expectations.
    pub fn check(&mut self) -> std::result::Result<(), CheckError> {
        while let Some(datagram) = self.interface.maybe_receive() {
            match self.expecting.iter().position(|expected| *expected == datagram) {
                Some(index) => {
                    self.expecting.remove(index);
                }
                None => {
                    return Err(CheckError::Unexpected {
                        host: self.name.clone(),
                        datagram,
                    })
                }
            }
        }
        if !self.expecting.is_empty() {
            return Err(CheckError::Missing {
                host: self.name.clone(),
                datagram: self.expecting.remove(0),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn interface(&self) -> &AsyncNetworkInterface {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut AsyncNetworkInterface {
        &mut self.interface
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Station {
    Router(usize),
    Host(String),
}

/// A router, the hosts around it, and the links joining them.
///
/// Each link is a shared segment: every frame one station sends is delivered to every other
/// station on the same segment, which then filters on the destination address.
#[derive(Debug)]
pub struct Network {
    router: Router,
    port_names: Vec<String>,
    hosts: BTreeMap<String, Host>,
    segments: Vec<Vec<Station>>,
    step_duration: Duration,
}

impl Network {
    pub fn new() -> Self {
        Network {
            router: Router::new(),
            port_names: Vec::new(),
            hosts: BTreeMap::new(),
            segments: Vec::new(),
            step_duration: Duration::from_millis(0),
        }
    }

    /// Adds a named router interface and returns its index.
    pub fn add_port(&mut self, name: &str, interface: AsyncNetworkInterface) -> usize {
        self.port_names.push(name.to_string());
        self.router.add_interface(interface)
    }

    pub fn port(&self, name: &str) -> Option<usize> {
        self.port_names.iter().position(|port| port == name)
    }

    pub fn port_name(&self, index: usize) -> Option<&str> {
        self.port_names.get(index).map(String::as_str)
    }

    pub fn add_host(&mut self, host: Host) {
        self.hosts.insert(host.name().to_string(), host);
    }

    /// Joins a router port and some hosts on one segment.
    pub fn connect(&mut self, port: usize, hosts: &[&str]) {
        let mut segment = vec![Station::Router(port)];
        segment.extend(hosts.iter().map(|name| Station::Host(name.to_string())));
        self.segments.push(segment);
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn add_route(
        &mut self,
        prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        port: usize,
    ) -> Result<()> {
        self.router.add_route(prefix, prefix_length, next_hop, port)
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    pub fn host_mut(&mut self, name: &str) -> Option<&mut Host> {
        self.hosts.get_mut(name)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// Simulated time that passes after every scheduling step.
    pub fn set_step_duration(&mut self, step_duration: Duration) {
        self.step_duration = step_duration;
    }

    /// `from` sends a datagram to `to`, and `to` is told to expect it after one hop.
    pub fn send_routed(&mut self, from: &str, to: &str) -> std::result::Result<(), CheckError> {
        let dest = self
            .host(to)
            .map(Host::address)
            .ok_or_else(|| CheckError::UnknownHost(to.to_string()))?;
        let sender = self
            .host_mut(from)
            .ok_or_else(|| CheckError::UnknownHost(from.to_string()))?;
        let mut expected = sender.send_to(dest, 64);
        expected.set_ttl(63);
        expected.set_checksum();
        self.host_mut(to)
            .ok_or_else(|| CheckError::UnknownHost(to.to_string()))?
            .expect(expected);
        Ok(())
    }

    /// Moves every queued frame across every segment.
    pub fn exchange_frames(&mut self) {
        for index in 0..self.segments.len() {
            let segment = self.segments[index].clone();
            for (position, source) in segment.iter().enumerate() {
                while let Some(frame) = self.station_mut(source).and_then(|s| s.maybe_send()) {
                    for (other, dest) in segment.iter().enumerate() {
                        if other != position {
                            self.deliver(source, dest, frame.clone());
                        }
                    }
                }
            }
        }
    }

    /// Runs `steps` rounds of routing and frame exchange, then checks every host.
    pub fn simulate(&mut self, steps: usize) -> std::result::Result<(), CheckError> {
        for _ in 0..steps {
            self.router.route();
            self.exchange_frames();
            if self.step_duration > Duration::from_millis(0) {
                self.router.tick(self.step_duration);
                for host in self.hosts.values_mut() {
                    host.interface_mut().tick(self.step_duration);
                }
            }
        }
        for host in self.hosts.values_mut() {
            host.check()?;
        }
        Ok(())
    }

    fn station_mut(&mut self, station: &Station) -> Option<&mut AsyncNetworkInterface> {
        match station {
            Station::Router(port) => self.router.interface_mut(*port),
            Station::Host(name) => self.hosts.get_mut(name).map(Host::interface_mut),
        }
    }

    fn station_name(&self, station: &Station) -> String {
        match station {
            Station::Router(port) => format!("router.{}", self.port_name(*port).unwrap_or("?")),
            Station::Host(name) => name.clone(),
        }
    }

    fn deliver(&mut self, source: &Station, dest: &Station, frame: EthernetFrame) {
        let from = self.station_name(source);
        let to = self.station_name(dest);
        trace!(%from, %to, ?frame, "transferring frame");
        if let Some(interface) = self.station_mut(dest) {
            if let Err(e) = interface.recv_frame(frame) {
                warn!(%from, %to, error = %e, "dropping malformed frame");
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

/// The multi-subnet topology of the router scenarios.
///
/// Router ports: default, eth0 through eth4, uun3, hs4 and mit5. Hosts: applesauce (10.0.0.2),
/// default_router (171.67.76.1), cherrypie (192.168.0.2), hs_router (143.195.0.1), dm42 and
/// dm43 sharing a segment (198.178.229.42 and .43), blueberrymuffin (100.70.0.2),
/// doughnut (100.70.1.2), and sadlittlehost (200.0.0.1) which no route reaches. There is no
/// default route.
pub fn reference_network(config: InterfaceConfig) -> Network {
    let mut rng = rand::thread_rng();
    let mut network = Network::new();

    let ports = [
        ("default", Ipv4Addr::new(171, 67, 76, 46)),
        ("eth0", Ipv4Addr::new(10, 0, 0, 1)),
        ("eth1", Ipv4Addr::new(172, 16, 0, 1)),
        ("eth2", Ipv4Addr::new(192, 168, 0, 1)),
        ("uun3", Ipv4Addr::new(198, 178, 229, 1)),
        ("hs4", Ipv4Addr::new(143, 195, 0, 2)),
        ("mit5", Ipv4Addr::new(128, 30, 76, 255)),
        ("eth3", Ipv4Addr::new(100, 70, 0, 1)),
        ("eth4", Ipv4Addr::new(100, 70, 1, 1)),
    ];
    for (name, address) in ports.iter() {
        let mac = random_router_mac(&mut rng);
        network.add_port(
            name,
            AsyncNetworkInterface::with_config(mac, *address, config.clone()),
        );
    }

    let unspecified = Ipv4Addr::UNSPECIFIED;
    let hosts = [
        ("applesauce", Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 1)),
        ("default_router", Ipv4Addr::new(171, 67, 76, 1), unspecified),
        ("cherrypie", Ipv4Addr::new(192, 168, 0, 2), Ipv4Addr::new(192, 168, 0, 1)),
        ("hs_router", Ipv4Addr::new(143, 195, 0, 1), unspecified),
        ("dm42", Ipv4Addr::new(198, 178, 229, 42), Ipv4Addr::new(198, 178, 229, 1)),
        ("dm43", Ipv4Addr::new(198, 178, 229, 43), Ipv4Addr::new(198, 178, 229, 1)),
        ("blueberrymuffin", Ipv4Addr::new(100, 70, 0, 2), Ipv4Addr::new(100, 70, 0, 1)),
        ("doughnut", Ipv4Addr::new(100, 70, 1, 2), Ipv4Addr::new(100, 70, 1, 1)),
        ("sadlittlehost", Ipv4Addr::new(200, 0, 0, 1), Ipv4Addr::new(200, 0, 0, 2)),
    ];
    for (name, address, next_hop) in hosts.iter() {
        let mac = random_private_mac(&mut rng);
        network.add_host(Host::new(name, mac, *address, *next_hop, config.clone()));
    }

    let hs_router = Ipv4Addr::new(143, 195, 0, 1);
    let routes = [
        (Ipv4Addr::new(10, 0, 0, 0), 8, None, "eth0"),
        (Ipv4Addr::new(172, 16, 0, 0), 16, None, "eth1"),
        (Ipv4Addr::new(192, 168, 0, 0), 24, None, "eth2"),
        (Ipv4Addr::new(198, 178, 229, 0), 24, None, "uun3"),
        (Ipv4Addr::new(143, 195, 0, 0), 17, Some(hs_router), "hs4"),
        (Ipv4Addr::new(143, 195, 128, 0), 18, Some(hs_router), "hs4"),
        (Ipv4Addr::new(143, 195, 192, 0), 19, Some(hs_router), "hs4"),
        (Ipv4Addr::new(128, 30, 76, 255), 16, Some(Ipv4Addr::new(128, 30, 0, 1)), "mit5"),
        (Ipv4Addr::new(100, 70, 0, 0), 16, None, "eth3"),
        (Ipv4Addr::new(100, 70, 1, 0), 24, None, "eth4"),
    ];
    for (prefix, prefix_length, next_hop, port) in routes.iter() {
        if let Some(port) = network.port(port) {
            if let Err(e) = network.add_route(*prefix, *prefix_length, *next_hop, port) {
                warn!(error = %e, "reference route rejected");
            }
        }
    }

    let segments: [(&str, &[&str]); 7] = [
        ("default", &["default_router"]),
        ("eth0", &["applesauce"]),
        ("eth2", &["cherrypie"]),
        ("hs4", &["hs_router"]),
        ("uun3", &["dm42", "dm43"]),
        ("eth3", &["blueberrymuffin"]),
        ("eth4", &["doughnut"]),
    ];
    for (port, hosts) in segments.iter() {
        if let Some(port) = network.port(port) {
            network.connect(port, hosts);
        }
    }

    network
}

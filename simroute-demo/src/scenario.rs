use cidr::{Cidr, Ipv4Cidr};
use simroute_runtime::router::RouterStats;
use simroute_runtime::sim::{reference_network, CheckError, Network};
use simroute_runtime::InterfaceConfig;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// applesauce and cherrypie exchange one datagram each way through the router.
    TwoHosts,
    /// cherrypie sends to a host no route reaches.
    NoRoute,
}

impl Scenario {
    pub const NAMES: &'static [&'static str] = &["two-hosts", "no-route", "all"];

    /// The scenarios selected by a command line name.
    pub fn select(name: &str) -> Option<Vec<Scenario>> {
        match name {
            "two-hosts" => Some(vec![Scenario::TwoHosts]),
            "no-route" => Some(vec![Scenario::NoRoute]),
            "all" => Some(vec![Scenario::TwoHosts, Scenario::NoRoute]),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scenario::TwoHosts => write!(f, "two-hosts"),
            Scenario::NoRoute => write!(f, "no-route"),
        }
    }
}

/// An extra static route, written `CIDR=PORT` or `CIDR=PORT@NEXT_HOP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub cidr: Ipv4Cidr,
    pub port: String,
    pub next_hop: Option<Ipv4Addr>,
}

impl FromStr for RouteSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut halves = s.splitn(2, '=');
        let cidr = halves.next().unwrap_or_default();
        let target = halves
            .next()
            .ok_or_else(|| format!("{}: expected CIDR=PORT[@NEXT_HOP]", s))?;
        // Ipv4Cidr also takes short forms like 10/8; only dotted quads are accepted here
        let address = cidr.split('/').next().unwrap_or_default();
        address
            .parse::<Ipv4Addr>()
            .map_err(|e| format!("{}: bad prefix address {}: {}", s, address, e))?;
        let cidr = cidr
            .parse::<Ipv4Cidr>()
            .map_err(|e| format!("{}: bad prefix {}: {}", s, cidr, e))?;

        let mut parts = target.splitn(2, '@');
        let port = parts.next().unwrap_or_default();
        if port.is_empty() {
            return Err(format!("{}: missing port name", s));
        }
        let next_hop = match parts.next() {
            Some(next_hop) => Some(
                next_hop
                    .parse::<Ipv4Addr>()
                    .map_err(|e| format!("{}: bad next hop {}: {}", s, next_hop, e))?,
            ),
            None => None,
        };

        Ok(RouteSpec {
            cidr,
            port: port.to_string(),
            next_hop,
        })
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("no router port named {0}")]
    UnknownPort(String),

    #[error(transparent)]
    Route(#[from] simroute_runtime::Error),

    #[error(transparent)]
    Check(#[from] CheckError),
}

#[derive(Debug, Clone)]
pub struct Options {
    pub steps: usize,
    pub step_duration: Duration,
    pub config: InterfaceConfig,
    pub routes: Vec<RouteSpec>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            steps: 256,
            step_duration: Duration::from_millis(0),
            config: InterfaceConfig::default(),
            routes: Vec::new(),
        }
    }
}

fn build_network(options: &Options) -> Result<Network, ScenarioError> {
    let mut network = reference_network(options.config.clone());
    network.set_step_duration(options.step_duration);
    for route in &options.routes {
        let port = network
            .port(&route.port)
            .ok_or_else(|| ScenarioError::UnknownPort(route.port.clone()))?;
        network.add_route(
            route.cidr.first_address(),
            route.cidr.network_length(),
            route.next_hop,
            port,
        )?;
    }
    Ok(network)
}

/// Sends from `from` to `to` without expecting delivery.
fn send_unrouted(network: &mut Network, from: &str, to: &str) -> Result<(), CheckError> {
    let dest = network
        .host(to)
        .map(|host| host.address())
        .ok_or_else(|| CheckError::UnknownHost(to.to_string()))?;
    let sender = network
        .host_mut(from)
        .ok_or_else(|| CheckError::UnknownHost(from.to_string()))?;
    sender.send_to(dest, 64);
    Ok(())
}

/// Runs `scenario` on a fresh reference network and returns what the router did.
pub fn run(scenario: Scenario, options: &Options) -> Result<RouterStats, ScenarioError> {
    let mut network = build_network(options)?;
    match scenario {
        Scenario::TwoHosts => {
            network.send_routed("applesauce", "cherrypie")?;
            network.send_routed("cherrypie", "applesauce")?;
        }
        Scenario::NoRoute => {
            send_unrouted(&mut network, "cherrypie", "sadlittlehost")?;
        }
    }
    info!(%scenario, steps = options.steps, "simulating");
    network.simulate(options.steps)?;
    Ok(network.router().stats())
}

/// Processors are the unit of transformation applied to a packet as it moves through the router. A processor
/// takes ownership of a packet and either hands back a (possibly modified) packet or drops it by returning
/// `None`. The router runs every forwarded datagram through `DecIpv4HopLimit` before choosing where it goes.
pub mod processor;

/// Classifiers look at a packet by reference and tell the caller which group it belongs to. The route table
/// is a classifier from datagrams to routes, and interfaces classify inbound frames by ether type.
pub mod classifier;

/// Address resolution: the per-interface IPv4 to Ethernet cache, the queue of datagrams waiting on a
/// resolution, and the resolver state machine that ties them together.
pub mod arp;

/// Network interfaces sit between the router (or a host) and a simulated link. They turn datagrams into
/// frames, resolving next hops as needed, and turn received frames back into datagrams.
pub mod interface;

/// The longest-prefix-match route table and the router that forwards datagrams between interfaces.
pub mod router;

mod config;
pub use self::config::*;

mod error;
pub use self::error::*;

pub mod time;

/// A small simulated network: end hosts, a router, and the segments that join them, stepped in
/// simulated time and checked against what each host expected to receive.
pub mod sim;

/// Utility module
pub mod utils;

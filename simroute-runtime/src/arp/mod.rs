/// Address resolution for one interface, per RFC 826
/// https://tools.ietf.org/html/rfc826
///
/// There are three pieces:
/// ArpCache: learned IPv4 to MAC mappings, each valid until an absolute expiry time.
/// PendingTable: datagrams waiting on a mapping, and when their next hop was last asked for.
/// AddressResolver: sends requests and replies, learns from every ARP message it hears, and
/// releases waiting datagrams once their next hop resolves.
///
/// Entries are only ever created by a send or a receive, and expiry is checked when an entry
/// is looked up. There are no timers.
mod cache;
pub use self::cache::*;

mod pending;
pub use self::pending::*;

mod resolver;
pub use self::resolver::*;

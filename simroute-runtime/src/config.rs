use std::num::NonZeroUsize;
use std::time::Duration;

/// What happens to datagrams already waiting on a resolution when the ARP request for
/// their next hop is retransmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePending {
    /// Keep them queued behind the new request.
    Keep,
    /// Discard them; only datagrams sent after the retransmission are delivered.
    Drop,
}

/// Per-interface address resolution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub arp_retry_interval: Duration,
    pub mapping_lifetime: Duration,
    pub stale_pending: StalePending,
    pub max_pending_per_address: Option<NonZeroUsize>,
}

impl InterfaceConfig {
    pub const DEFAULT_ARP_RETRY_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAPPING_LIFETIME: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        InterfaceConfig {
            arp_retry_interval: Self::DEFAULT_ARP_RETRY_INTERVAL,
            mapping_lifetime: Self::DEFAULT_MAPPING_LIFETIME,
            stale_pending: StalePending::Keep,
            max_pending_per_address: None,
        }
    }

    pub fn arp_retry_interval(self, interval: Duration) -> Self {
        InterfaceConfig {
            arp_retry_interval: interval,
            ..self
        }
    }

    pub fn mapping_lifetime(self, lifetime: Duration) -> Self {
        InterfaceConfig {
            mapping_lifetime: lifetime,
            ..self
        }
    }

    pub fn stale_pending(self, policy: StalePending) -> Self {
        InterfaceConfig {
            stale_pending: policy,
            ..self
        }
    }

    pub fn max_pending_per_address(self, limit: NonZeroUsize) -> Self {
        InterfaceConfig {
            max_pending_per_address: Some(limit),
            ..self
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

use rand::Rng;
use simroute_packets::MacAddr;

/// A random locally administered unicast address.
pub fn random_private_mac<R: Rng>(rng: &mut R) -> MacAddr {
    let mut bytes = [0u8; 6];
    rng.fill(&mut bytes);
    bytes[0] |= 0x02;
    bytes[0] &= 0xfe;
    MacAddr::new(bytes)
}

/// A random address under the 02:00:00 prefix, so router ports stand out in logs.
pub fn random_router_mac<R: Rng>(rng: &mut R) -> MacAddr {
    let mut bytes = [0u8; 6];
    rng.fill(&mut bytes[3..]);
    bytes[0] = 0x02;
    MacAddr::new(bytes)
}

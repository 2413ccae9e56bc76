use crate::classifier::Classifier;
use simroute_packets::{EthernetFrame, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherClass {
    Ipv4,
    Arp,
    Other(u16),
}

/// Classifies an EthernetFrame by the EtherType field of its header.
/// https://en.wikipedia.org/wiki/EtherType
#[derive(Default)]
pub struct EtherTypeClassifier;

impl Classifier for EtherTypeClassifier {
    type Packet = EthernetFrame;
    type Class = EtherClass;

    fn classify(&self, frame: &Self::Packet) -> Self::Class {
        match frame.ether_type() {
            IPV4_ETHER_TYPE => EtherClass::Ipv4,
            ARP_ETHER_TYPE => EtherClass::Arp,
            other => EtherClass::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_ether_type() {
        let data_v4: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x00,
        ];
        let data_arp: Vec<u8> = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x06,
        ];
        let data_v6: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x86, 0xDD,
        ];

        let classifier = EtherTypeClassifier;
        let classify = |data| classifier.classify(&EthernetFrame::from_buffer(data, 0).unwrap());

        assert_eq!(classify(data_v4), EtherClass::Ipv4);
        assert_eq!(classify(data_arp), EtherClass::Arp);
        assert_eq!(classify(data_v6), EtherClass::Other(0x86DD));
    }
}

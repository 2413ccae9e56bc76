//! # What are they for?
//!
//! Classifiers are very similar to processors, but are used to differentiate a stream of packets. As such, they take each packet by reference,
//! and are not able to modify it. Classifiers are able to return any type, but generally return an Enum that tells the caller which group
//! each packet belongs to. The route table is itself a classifier from datagrams to the route that should carry them.
mod ether_type;
pub use self::ether_type::*;

/// Determines the kind of packet we have. The caller then acts on `Classifier::Class` to send the
/// packet down the appropriate path.
pub trait Classifier {
    type Packet: Send + Clone;
    type Class: Sized;

    fn classify(&self, packet: &Self::Packet) -> Self::Class;
}

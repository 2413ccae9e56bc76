use crate::interface::NetworkInterface;
use crate::InterfaceConfig;
use simroute_packets::{EthernetFrame, Ipv4Packet, MacAddr};
use std::net::Ipv4Addr;
use std::time::Duration;

/// The utils::test::harness module drives a single `NetworkInterface` through a script of steps.
/// Tests should be expressed with the typical "Given, When, Then" structure
/// (https://martinfowler.com/bliki/GivenWhenThen.html).

/// "Given" refers to the state of the world before the behavior under test runs.
/// Here that is a fresh interface with a link address, an IPv4 address and a configuration.

/// "When" refers to the behavior under test.
/// These are the `send_datagram`, `receive_frame` and `tick` steps.

/// "Then" refers to the expected changes to the system due to executing the behavior under test
/// against the initial context.
/// These are the `expect_frame`, `expect_any_frame` and `expect_no_frame` steps, which look at
/// what the interface wants to put on the wire.

/// Every step panics with the harness name and the step number when its expectation fails, and
/// returns the harness so steps can be chained.
pub struct InterfaceHarness {
    name: String,
    interface: NetworkInterface,
    step: usize,
}

impl InterfaceHarness {
    pub fn new(name: &str, mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self::with_config(name, mac, ip, InterfaceConfig::default())
    }

    pub fn with_config(name: &str, mac: MacAddr, ip: Ipv4Addr, config: InterfaceConfig) -> Self {
        InterfaceHarness {
            name: name.to_string(),
            interface: NetworkInterface::with_config(mac, ip, config),
            step: 0,
        }
    }

    pub fn send_datagram(&mut self, datagram: Ipv4Packet, next_hop: Ipv4Addr) -> &mut Self {
        self.step += 1;
        self.interface.send_datagram(datagram, next_hop);
        self
    }

    /// Delivers `frame` and checks what the interface handed back.
    pub fn receive_frame(
        &mut self,
        frame: EthernetFrame,
        expected: Option<Ipv4Packet>,
    ) -> &mut Self {
        self.step += 1;
        match self.interface.recv_frame(frame) {
            Ok(received) => {
                if received != expected {
                    self.fail(format!(
                        "expected to receive {:?}, got {:?}",
                        expected, received
                    ));
                }
            }
            Err(e) => self.fail(format!("frame was rejected: {}", e)),
        }
        self
    }

    pub fn tick(&mut self, millis: u64) -> &mut Self {
        self.step += 1;
        self.interface.tick(Duration::from_millis(millis));
        self
    }

    pub fn expect_frame(&mut self, expected: EthernetFrame) -> &mut Self {
        self.step += 1;
        match self.interface.maybe_send() {
            Some(frame) if frame == expected => {}
            Some(frame) => self.fail(format!("expected {:?}, sent {:?}", expected, frame)),
            None => self.fail(format!("expected {:?}, nothing was sent", expected)),
        }
        self
    }

    /// Passes as long as some frame was sent, whatever it holds.
    pub fn expect_any_frame(&mut self) -> &mut Self {
        self.step += 1;
        if self.interface.maybe_send().is_none() {
            self.fail("expected a frame, nothing was sent".to_string());
        }
        self
    }

    pub fn expect_no_frame(&mut self) -> &mut Self {
        self.step += 1;
        if let Some(frame) = self.interface.maybe_send() {
            self.fail(format!("expected no frame, sent {:?}", frame));
        }
        self
    }

    pub fn interface(&self) -> &NetworkInterface {
        &self.interface
    }

    fn fail(&self, reason: String) {
        panic!("{}: step {}: {}", self.name, self.step, reason);
    }
}

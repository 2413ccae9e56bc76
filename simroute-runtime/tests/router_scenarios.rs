use simroute_packets::Ipv4Packet;
use simroute_runtime::{
    router::RouterStats,
    sim::{reference_network, CheckError, Network},
    InterfaceConfig,
};
use std::net::Ipv4Addr;
use std::time::Duration;

const STEPS: usize = 256;

fn network() -> Network {
    reference_network(InterfaceConfig::default())
}

fn sent_datagram(network: &mut Network, from: &str, to: &str, ttl: u8) -> Ipv4Packet {
    let dest = network.host(to).unwrap().address();
    network.host_mut(from).unwrap().send_to(dest, ttl)
}

#[test]
fn applesauce_to_cherrypie() {
    let mut network = network();
    let mut expected = sent_datagram(&mut network, "applesauce", "cherrypie", 64);
    expected.set_ttl(63);
    expected.set_checksum();
    network.host_mut("cherrypie").unwrap().expect(expected);

    assert_eq!(network.simulate(STEPS), Ok(()));
    assert_eq!(network.router().stats().forwarded, 1);
}

#[test]
fn cherrypie_to_applesauce() {
    let mut network = network();
    network.send_routed("cherrypie", "applesauce").unwrap();
    assert_eq!(network.simulate(STEPS), Ok(()));
}

#[test]
fn forwarded_datagram_is_checksummed() {
    let mut network = network();
    let sent = sent_datagram(&mut network, "applesauce", "blueberrymuffin", 64);

    for _ in 0..STEPS {
        network.router_mut().route();
        network.exchange_frames();
    }

    let receiver = network.host_mut("blueberrymuffin").unwrap().interface_mut();
    let received = receiver.maybe_receive().unwrap();
    assert!(receiver.maybe_receive().is_none());
    assert_eq!(received.ttl(), 63);
    assert!(received.validate_checksum());
    assert_ne!(received.checksum(), sent.checksum());
    assert_eq!(received.payload(), sent.payload());
}

#[test]
fn unreachable_host() {
    let mut network = network();
    sent_datagram(&mut network, "cherrypie", "sadlittlehost", 64);

    assert_eq!(network.simulate(STEPS), Ok(()));
    assert_eq!(
        network.router().stats(),
        RouterStats {
            forwarded: 0,
            dropped_ttl: 0,
            dropped_no_route: 1,
        }
    );
}

#[test]
fn expiring_datagram_is_not_forwarded() {
    let mut network = network();
    sent_datagram(&mut network, "applesauce", "cherrypie", 1);

    assert_eq!(network.simulate(STEPS), Ok(()));
    assert_eq!(network.router().stats().dropped_ttl, 1);
}

#[test]
fn ttl_two_arrives_with_ttl_one() {
    let mut network = network();
    let mut expected = sent_datagram(&mut network, "dm42", "doughnut", 2);
    expected.set_ttl(1);
    expected.set_checksum();
    network.host_mut("doughnut").unwrap().expect(expected);

    assert_eq!(network.simulate(STEPS), Ok(()));
}

#[test]
fn most_specific_route_wins() {
    let mut network = network();
    // 100.70.1.2 matches both 100.70/16 on eth3 and 100.70.1/24 on eth4
    network.send_routed("blueberrymuffin", "doughnut").unwrap();
    network.send_routed("doughnut", "blueberrymuffin").unwrap();
    assert_eq!(network.simulate(STEPS), Ok(()));

    let eth4 = network.port("eth4").unwrap();
    let route = network.router().find_match(Ipv4Addr::new(100, 70, 1, 2)).unwrap();
    assert_eq!(route.interface, eth4);
}

#[test]
fn shared_segment_delivers_to_the_right_host() {
    let mut network = network();
    network.send_routed("applesauce", "dm42").unwrap();
    network.send_routed("applesauce", "dm43").unwrap();
    network.send_routed("dm43", "cherrypie").unwrap();
    assert_eq!(network.simulate(STEPS), Ok(()));
}

#[test]
fn many_hosts_many_datagrams() {
    let mut network = network();
    let pairs = [
        ("applesauce", "cherrypie"),
        ("cherrypie", "applesauce"),
        ("applesauce", "dm42"),
        ("dm42", "blueberrymuffin"),
        ("blueberrymuffin", "doughnut"),
        ("doughnut", "dm43"),
        ("dm43", "applesauce"),
        ("cherrypie", "doughnut"),
    ];
    for _ in 0..3 {
        for (from, to) in pairs.iter() {
            network.send_routed(from, to).unwrap();
        }
    }
    assert_eq!(network.simulate(STEPS), Ok(()));
    assert_eq!(network.router().stats().forwarded, 3 * pairs.len() as u64);
}

#[test]
fn gateway_routes_use_the_next_hop() {
    let mut network = network();
    // 143.195.200.9 is behind hs_router; the router ARPs for hs_router itself
    let dest = Ipv4Addr::new(143, 195, 200, 9);
    let mut expected = network.host_mut("applesauce").unwrap().send_to(dest, 64);
    expected.set_ttl(63);
    expected.set_checksum();

    // hs_router receives the datagram even though it is not addressed to it
    network.host_mut("hs_router").unwrap().expect(expected);
    assert_eq!(network.simulate(STEPS), Ok(()));
}

#[test]
fn unexpected_delivery_is_reported() {
    let mut network = network();
    sent_datagram(&mut network, "applesauce", "cherrypie", 64);

    match network.simulate(STEPS) {
        Err(CheckError::Unexpected { host, .. }) => assert_eq!(host, "cherrypie"),
        other => panic!("expected an unexpected delivery, got {:?}", other),
    }
}

#[test]
fn resolution_survives_slow_clock() {
    let mut network = network();
    network.set_step_duration(Duration::from_millis(100));
    network.send_routed("applesauce", "cherrypie").unwrap();
    network.send_routed("dm42", "doughnut").unwrap();
    assert_eq!(network.simulate(STEPS), Ok(()));
}

mod scenario;
mod subscriber;

use crate::scenario::{Options, RouteSpec, Scenario};
use crate::subscriber::StderrSubscriber;
use clap::{App, Arg};
use simroute_runtime::{InterfaceConfig, StalePending};
use std::process;
use std::time::Duration;

fn main() {
    // Collect arguments from user
    let matches = App::new("simroute")
        .version("0.1")
        .author("simroute contributors")
        .about("Run IPv4 router scenarios over a simulated multi-subnet network")
        .arg(
            Arg::with_name("scenario")
                .short("s")
                .long("scenario")
                .value_name("NAME")
                .help("Scenario to run")
                .possible_values(Scenario::NAMES)
                .default_value("all")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("steps")
                .short("n")
                .long("steps")
                .value_name("N")
                .help("Scheduling passes to simulate")
                .default_value("256")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("step_ms")
                .long("step-ms")
                .value_name("MS")
                .help("Simulated milliseconds that pass after each scheduling pass")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("drop_stale")
                .long("drop-stale")
                .help("Discard datagrams queued under an ARP request once it is retransmitted"),
        )
        .arg(
            Arg::with_name("route")
                .short("r")
                .long("route")
                .value_name("CIDR=PORT[@NEXT_HOP]")
                .help("Extra static route, e.g. 200.0.0.0/8=eth1@172.16.0.2")
                .multiple(true)
                .number_of_values(1)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for debug and trace output"),
        )
        .get_matches();

    let subscriber = StderrSubscriber::new(StderrSubscriber::level_for(
        matches.occurrences_of("verbose"),
    ));
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let steps = parse_or_exit::<usize>(matches.value_of("steps"), "steps");
    let step_ms = parse_or_exit::<u64>(matches.value_of("step_ms"), "step-ms");
    let routes = match matches.values_of("route") {
        Some(values) => values
            .map(str::parse::<RouteSpec>)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| exit_with(&e)),
        None => Vec::new(),
    };

    let stale_pending = if matches.is_present("drop_stale") {
        StalePending::Drop
    } else {
        StalePending::Keep
    };
    let options = Options {
        steps,
        step_duration: Duration::from_millis(step_ms),
        config: InterfaceConfig::new().stale_pending(stale_pending),
        routes,
    };

    let name = matches.value_of("scenario").unwrap_or("all");
    let scenarios = Scenario::select(name)
        .unwrap_or_else(|| exit_with(&format!("unknown scenario {}", name)));

    let mut failed = false;
    for scenario in scenarios {
        match scenario::run(scenario, &options) {
            Ok(stats) => println!(
                "{}: ok (forwarded {}, dropped for TTL {}, dropped for no route {})",
                scenario, stats.forwarded, stats.dropped_ttl, stats.dropped_no_route
            ),
            Err(e) => {
                println!("{}: FAILED: {}", scenario, e);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
    println!("The world has been routed");
}

fn parse_or_exit<T: std::str::FromStr>(value: Option<&str>, name: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let value = value.unwrap_or_default();
    value
        .parse::<T>()
        .unwrap_or_else(|e| exit_with(&format!("invalid --{} {}: {}", name, value, e)))
}

fn exit_with(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(2)
}

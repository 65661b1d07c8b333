//! Command-line monitor for inbound control messages.
//!
//! `listen` runs the listener in observation mode and prints every
//! `(address, value)` pair, then a summary of the distinct addresses seen.
//! `send` emits a single message, which is handy for poking a running
//! listener.

use std::collections::BTreeMap;
use std::fs;
use std::net::UdpSocket;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use app::{Bridge, ListenerConfig, Observation, StartOutcome};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use log::{info, warn};
use wire::{encode_message, Arg, Message, OtherArg};

/// How long the main loop waits for an observation before ticking again.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Text and JSON rendering used by the commands.
mod render {
    use std::collections::BTreeMap;
    use std::fmt::Write;

    use serde::Serialize;

    #[derive(Serialize)]
    struct AddressCount<'a> {
        address: &'a str,
        messages: u64,
    }

    /// One line per distinct address, sorted.
    pub fn summary(seen: &BTreeMap<String, u64>) -> String {
        let mut out = String::new();
        let total: u64 = seen.values().sum();
        let distinct = seen.len();
        let _ = writeln!(out, "{distinct} distinct address(es), {total} message(s)");
        for (address, count) in seen {
            let _ = writeln!(out, "  {address}  x{count}");
        }
        out
    }

    pub fn summary_json(seen: &BTreeMap<String, u64>) -> serde_json::Result<String> {
        let rows: Vec<AddressCount<'_>> = seen
            .iter()
            .map(|(address, messages)| AddressCount {
                address,
                messages: *messages,
            })
            .collect();
        serde_json::to_string_pretty(&rows)
    }
}

/// Watch or emit OSC control messages.
#[derive(Parser, Debug)]
#[command(author, version, about = "Observe and send OSC control messages", long_about = None)]
struct Cli {
    /// JSON listener config; flags override its fields.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print incoming addresses and values until a limit is reached.
    Listen {
        /// UDP port to bind (defaults to the config value, then 9023).
        #[arg(short, long)]
        port: Option<u16>,
        /// Stop after this many seconds.
        #[arg(short, long, value_name = "SECS")]
        duration: Option<u64>,
        /// Stop after this many messages.
        #[arg(short = 'n', long)]
        count: Option<u64>,
        /// Forward receive-thread diagnostics to the log.
        #[arg(long)]
        log: bool,
        /// Print the final summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send one message.
    Send {
        /// Destination host.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Destination port.
        #[arg(short, long, default_value_t = ListenerConfig::DEFAULT_PORT)]
        port: u16,
        /// Message address, e.g. /mixer/fader/1.
        #[arg(value_name = "ADDRESS")]
        address: String,
        /// Arguments: `i:4`, `f:0.5`, `d:0.25`, `s:text`, or a bare number.
        #[arg(value_parser = parse_arg, value_name = "ARG", allow_negative_numbers = true)]
        args: Vec<Arg>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Listen {
            port,
            duration,
            count,
            log,
            json,
        } => {
            init_logger(log || base.logging_enabled);
            let config = ListenerConfig {
                port: port.unwrap_or(base.port),
                logging_enabled: log || base.logging_enabled,
                enabled: true,
                ..base
            };
            listen(config, duration.map(Duration::from_secs), count, json)
        }
        Command::Send {
            host,
            port,
            address,
            args,
        } => {
            init_logger(false);
            send(&host, port, Message::new(address, args))
        }
    }
}

fn init_logger(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn load_config(path: Option<&Path>) -> Result<ListenerConfig> {
    let Some(path) = path else {
        return Ok(ListenerConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read config {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {path:?}"))
}

fn listen(
    config: ListenerConfig,
    duration: Option<Duration>,
    limit: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut bridge = Bridge::new();
    let port = config.port;
    let (outcome, observations) = bridge.observe(config)?;
    if outcome != StartOutcome::Started {
        bail!("listener did not start: {outcome:?}");
    }
    let Some(addr) = bridge.listener().wait_until_bound(Duration::from_secs(2)) else {
        bridge.shutdown();
        bail!("could not bind udp port {port}");
    };
    info!("listening on {addr}");

    let deadline = duration.map(|d| Instant::now() + d);
    let mut seen: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0u64;

    loop {
        bridge.tick();
        if !bridge.listener().is_listening() {
            warn!("listener stopped unexpectedly");
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) || limit.is_some_and(|n| total >= n) {
            break;
        }
        match observations.recv_timeout(TICK_INTERVAL) {
            Ok(observation) => {
                total += 1;
                record(&mut seen, observation);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    bridge.shutdown();
    let stats = bridge.listener().stats();
    if stats.observations_dropped > 0 {
        warn!("{} observation(s) dropped", stats.observations_dropped);
    }

    if json {
        println!("{}", render::summary_json(&seen)?);
    } else {
        print!("{}", render::summary(&seen));
    }
    Ok(())
}

fn record(seen: &mut BTreeMap<String, u64>, observation: Observation) {
    println!("{observation}");
    *seen.entry(observation.address).or_default() += 1;
}

fn send(host: &str, port: u16, message: Message) -> Result<()> {
    if !message.address.starts_with('/') {
        bail!("address must start with '/': {}", message.address);
    }
    let socket = UdpSocket::bind("0.0.0.0:0").context("failed to bind sender socket")?;
    let bytes = encode_message(&message);
    socket
        .send_to(&bytes, (host, port))
        .with_context(|| format!("failed to send to {host}:{port}"))?;
    let (address, len) = (&message.address, bytes.len());
    info!("sent {address} ({len} bytes) to {host}:{port}");
    Ok(())
}

fn parse_arg(input: &str) -> Result<Arg, String> {
    let parse_err = |kind: &str| format!("invalid {kind} value '{input}'");
    match input.split_once(':') {
        Some(("i", v)) => v.parse().map(Arg::Int).map_err(|_| parse_err("int")),
        Some(("f", v)) => v.parse().map(Arg::Float).map_err(|_| parse_err("float")),
        Some(("d", v)) => v.parse().map(Arg::Double).map_err(|_| parse_err("double")),
        Some(("s", v)) => Ok(Arg::Other(OtherArg::Str(v.to_owned()))),
        _ => {
            if let Ok(v) = input.parse::<i32>() {
                Ok(Arg::Int(v))
            } else if let Ok(v) = input.parse::<f32>() {
                Ok(Arg::Float(v))
            } else {
                Err(format!("'{input}' is not a number; prefix strings with s:"))
            }
        }
    }
}

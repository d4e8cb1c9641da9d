//! Transport registration and dispatch
//!
//! This module provides a centralized registry for all bus transports, with
//! support for feature-gated inclusion and dynamic help text generation.

use isospi_core::transport::BusTransport;

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "linux-spi")]
    transports.push(TransportInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (bus=<n>,dev=<node prefix>)",
    });

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &["loopback"],
        description: "Loopback bus for dry runs (readback=<hex>,fail=<init|begin|transfer>)",
    });

    transports
}

/// Generate help text listing all available transports
pub fn transport_help() -> String {
    let transports = available_transports();

    if transports.is_empty() {
        return "No transports available (recompile with transport features enabled)".to_string();
    }

    let mut help = String::from("Available transports:\n");
    for t in &transports {
        help.push_str(&format!("  {:12} - {}\n", t.name, t.description));
    }
    help
}

/// Generate a short list of transport names for CLI help
pub fn transport_names_short() -> String {
    let transports = available_transports();
    let names: Vec<&str> = transports.iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Resolve a transport name or alias to its primary name
pub fn find_transport(name: &str) -> Option<&'static str> {
    available_transports()
        .into_iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
        .map(|t| t.name)
}

/// Parse a transport string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_transport_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Create the bus named by a transport string
///
/// Nothing is opened here; the sequencer acquires the peripheral when the
/// transaction starts.
#[allow(unused_variables)]
pub fn open_transport(
    transport: &str,
) -> Result<Box<dyn BusTransport + Send>, Box<dyn std::error::Error>> {
    let (name, options) = parse_transport_string(transport);

    let canonical_name = match find_transport(name) {
        Some(n) => n,
        None => return Err(unknown_transport_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "linux-spi")]
        "linux_spi" => isospi_linux_spi::open_linux_spi(&options)
            .map_err(|e| format!("Invalid linux_spi parameters: {}", e).into()),

        #[cfg(feature = "dummy")]
        "dummy" => isospi_dummy::open_dummy(&options)
            .map_err(|e| format!("Invalid dummy parameters: {}", e).into()),

        _ => Err(unknown_transport_error(name)),
    }
}

fn unknown_transport_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown transport: {}\n\n", name);
    msg.push_str(&transport_help());
    msg.into()
}

use std::fs;
use std::io;
use std::net::{Ipv4Addr, TcpListener};
use std::ops::Range;
use std::path::Path;

pub const DEFAULT_START_PORT: u16 = 5000;
pub const DEFAULT_MAX_ATTEMPTS: u16 = 20;
pub const FALLBACK_PORTS: Range<u16> = 8000..9000;

/// First port in `start..start + max_attempts` that binds on all interfaces.
///
/// When none binds, a random port from [`FALLBACK_PORTS`] is returned without
/// checking that it is free.
pub fn select_port(start: u16, max_attempts: u16) -> u16 {
    for attempt in 0..max_attempts {
        let Some(port) = start.checked_add(attempt) else {
            break;
        };

        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)) {
            Ok(listener) => {
                drop(listener);
                return port;
            }
            Err(e) => {
                tracing::info!(port, error = %e, "Port is already in use, trying next port");
            }
        }
    }

    let port = fastrand::u16(FALLBACK_PORTS);
    tracing::warn!(
        port,
        start,
        max_attempts,
        "No free port in sequential range, using unverified random port"
    );
    port
}

/// Publish the chosen port for other processes.
pub fn write_port_file(path: &Path, port: u16) -> io::Result<()> {
    fs::write(path, port.to_string())
}

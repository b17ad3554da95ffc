//! Value parsers for CLI arguments clap cannot check on its own.

use std::net::IpAddr;
use std::path::PathBuf;

const MAX_HOSTNAME_LEN: usize = 253;

pub fn validate_port(raw: &str) -> Result<u16, String> {
    match raw.parse::<u16>() {
        Ok(0) => Err("port 0 would bind a random port; pick one between 1 and 65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("'{raw}' is not a port between 1 and 65535")),
    }
}

/// `--config` must name a readable TOML file.
pub fn validate_config_file_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);

    if !path.is_file() {
        return Err(format!("'{raw}' is not an existing configuration file"));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
        return Err(format!("'{raw}' must be a .toml file"));
    }
    std::fs::File::open(&path).map_err(|e| format!("cannot read '{raw}': {e}"))?;

    Ok(path)
}

/// Accepts IP literals and DNS-style hostnames.
pub fn validate_host_address(raw: &str) -> Result<String, String> {
    let host = raw.trim();

    if host.is_empty() {
        return Err("host address cannot be empty".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    // Dotted digits that failed to parse as an IP are a typo, not a hostname.
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("'{host}' is not a valid IPv4 address"));
    }
    if host.len() > MAX_HOSTNAME_LEN {
        return Err(format!("hostname is longer than {MAX_HOSTNAME_LEN} characters"));
    }

    let label_ok = |label: &str| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if host.split('.').all(label_ok) {
        Ok(host.to_string())
    } else {
        Err(format!("'{host}' is not a valid hostname"))
    }
}

/// Privy user ids are opaque; only surrounding whitespace is stripped.
pub fn validate_privy_user_id(raw: &str) -> Result<String, String> {
    let id = raw.trim();
    if id.is_empty() {
        Err("Privy user id cannot be empty".to_string())
    } else {
        Ok(id.to_string())
    }
}

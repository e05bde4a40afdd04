use std::env::consts::{ARCH, OS};

use const_format::concatcp;

pub const APPLICATION_NAME: &str = "relay-monitor";
pub const APPLICATION_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APPLICATION_NAME_AND_VERSION: &str = concatcp!(APPLICATION_NAME, "/", APPLICATION_VERSION);

/// Sent as the `User-Agent` of every request to the beacon node.
#[must_use]
pub fn version_with_platform() -> String {
    // Parts of a client version are conventionally separated with slashes.
    format!("{APPLICATION_NAME_AND_VERSION}/{ARCH}-{OS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_with_platform_starts_with_name_and_version() {
        let version = version_with_platform();

        assert!(version.starts_with("relay-monitor/"));
        assert_eq!(version.split('/').count(), 3);
    }
}

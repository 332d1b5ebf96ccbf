//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Default configuration as TOML (for reference/documentation)
pub const DEFAULT_CONFIG_TOML: &str = r##"
# tickbridge configuration

[network]
# Loopback address the bridge listens on
bind_address = "127.0.0.1"
# First port tried; the scan moves up on address-in-use
base_port = 6400
# Last port tried (inclusive)
max_port = 6499
# Idle connections are closed after this many seconds without a request
read_timeout_secs = 60
keepalive = true
# Largest accepted request frame (16 MB)
max_frame_bytes = 16777216

[scheduler]
# Host tick cadence (~60 per second)
tick_interval_ms = 16
# Crashed drain passes tolerated before the bridge is stopped
max_restarts = 3

[discovery]
# Directory receiving the port file; defaults to the working directory
# project_dir = "/path/to/project"
port_file_name = "bridge-port.txt"
"##;

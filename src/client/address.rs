//! UI address resolution.

/// Scheme prefix marking a local (filesystem) socket address.
pub const UNIX_SCHEME: &str = "unix://";

/// Resolved connection target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketTarget {
    /// Bare address: a filesystem path for local sockets, `host:port` otherwise.
    pub path: String,
    /// Whether `path` names a local socket.
    pub is_unix_socket: bool,
}

/// Split a configured address into its bare form and local-socket flag.
///
/// Any string is accepted; whether it is reachable is the transport's concern.
pub fn resolve_address(raw: &str) -> SocketTarget {
    match raw.strip_prefix(UNIX_SCHEME) {
        Some(path) => SocketTarget {
            path: path.to_string(),
            is_unix_socket: true,
        },
        None => SocketTarget {
            path: raw.to_string(),
            is_unix_socket: false,
        },
    }
}

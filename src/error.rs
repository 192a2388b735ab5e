//! Unified error type.

/// The error type returned by the crate's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as
/// [`Output`](crate::Output) or [`Response`](crate::Response) values, not as
/// `Error`s. This type surfaces infrastructure failures: binding a port,
/// accepting a connection, or a response sink refusing a write.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The bind address is not a valid `host:port` string.
    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The status line was already written; headers and status are frozen.
    #[error("response head already written")]
    HeadersSent,

    /// A header name or value is not valid on the wire.
    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_header() {
        let err = Error::InvalidHeader { name: "bad header".to_owned() };
        assert_eq!(err.to_string(), "invalid header `bad header`");
    }

    #[test]
    fn addr_error_keeps_its_source() {
        let source = "nope".parse::<std::net::SocketAddr>().unwrap_err();
        let err = Error::Addr { addr: "nope".to_owned(), source };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("`nope`"));
    }
}

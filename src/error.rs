//! A dedicated error for all possible errors in DNS queries: I/O, DNS packet
//! inconsistencies, validation, transport and protocol failures.
use std::io;
use std::str;

/// RCODE values that can terminate or retry a query, per RFC 1035 section 4.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl From<u8> for Rcode {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0 => Rcode::NoError,
            1 => Rcode::FormErr,
            2 => Rcode::ServFail,
            3 => Rcode::NXDomain,
            4 => Rcode::NotImp,
            5 => Rcode::Refused,
            other => Rcode::Other(other),
        }
    }
}

#[derive(Debug)]
pub enum DNSError {
    Io(io::Error),
    Utf8(str::Utf8Error),

    /// Malformed wire data: truncated buffer, compression loop, bad label length.
    Parse(String),

    /// A domain name, IP literal, or record type failed syntactic validation.
    Validation(String),

    /// A transport-level failure: send/recv error, socket error, non-2xx DoH response.
    Transport { server: String, message: String },

    /// A per-attempt deadline elapsed.
    Timeout { server: String, millis: u64 },

    /// The server returned a non-NoError RCODE that terminates the query.
    Protocol { domain: String, rcode: Rcode },

    /// A configuration error: invalid server address, empty server chain, etc.
    Config(String),

    /// The resolver has been torn down via `destroy()`.
    Destroyed,
}

impl DNSError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DNSError::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        DNSError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DNSError::Config(msg.into())
    }

    pub fn transport(server: impl Into<String>, message: impl Into<String>) -> Self {
        DNSError::Transport {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn timeout(server: impl Into<String>, millis: u64) -> Self {
        DNSError::Timeout {
            server: server.into(),
            millis,
        }
    }

    /// Whether the resolve loop should retry on another server after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            DNSError::Transport { .. }
                | DNSError::Timeout { .. }
                | DNSError::Protocol {
                    rcode: Rcode::ServFail,
                    ..
                }
        )
    }
}

impl std::fmt::Display for DNSError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DNSError::Io(e) => write!(f, "I/O error: {}", e),
            DNSError::Utf8(e) => write!(f, "invalid UTF-8 in label: {}", e),
            DNSError::Parse(msg) => write!(f, "malformed DNS message: {}", msg),
            DNSError::Validation(msg) => write!(f, "validation error: {}", msg),
            DNSError::Transport { server, message } => {
                write!(f, "transport error from {}: {}", server, message)
            }
            DNSError::Timeout { server, millis } => {
                write!(f, "query to {} timed out after {} ms", server, millis)
            }
            DNSError::Protocol { domain, rcode } => {
                write!(f, "{} resolving {}", describe_rcode(*rcode), domain)
            }
            DNSError::Config(msg) => write!(f, "configuration error: {}", msg),
            DNSError::Destroyed => write!(f, "resolver has been destroyed"),
        }
    }
}

fn describe_rcode(rcode: Rcode) -> &'static str {
    match rcode {
        Rcode::NoError => "no error",
        Rcode::FormErr => "format error",
        Rcode::ServFail => "server failure",
        Rcode::NXDomain => "domain does not exist",
        Rcode::NotImp => "not implemented",
        Rcode::Refused => "query refused",
        Rcode::Other(_) => "unexpected response code",
    }
}

impl std::error::Error for DNSError {}

/// A specific custom `Result` for all functions in this crate.
pub type DNSResult<T> = Result<T, DNSError>;

// All conversions for internal errors into DNSError
impl From<io::Error> for DNSError {
    fn from(err: io::Error) -> Self {
        DNSError::Io(err)
    }
}

impl From<str::Utf8Error> for DNSError {
    fn from(err: str::Utf8Error) -> Self {
        DNSError::Utf8(err)
    }
}

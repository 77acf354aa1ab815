//! Syntactic validation and normalisation of domain names, per RFC 1035
//! section 2.3.1 as tightened by spec section 3: 1..63 byte labels,
//! ASCII alphanumeric plus hyphen, no leading/trailing hyphen, total wire
//! length <= 255 bytes, total textual length <= 253.
use crate::error::{DNSError, DNSResult};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_WIRE_LEN: usize = 255;
pub const MAX_NAME_TEXT_LEN: usize = 253;

/// Validate `name` and return its normalised form: lowercase, no
/// surrounding whitespace, no trailing dot.
///
/// ```
/// use dnslib::name::validate;
///
/// assert_eq!(validate("EXAMPLE.com").unwrap(), "example.com");
/// assert_eq!(validate("  example.com  ").unwrap(), "example.com");
/// assert_eq!(validate("example.com.").unwrap(), "example.com");
/// assert!(validate("").is_err());
/// assert!(validate(".example.com").is_err());
/// assert!(validate("example.com.").unwrap().ends_with("com"));
/// ```
pub fn validate(name: &str) -> DNSResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(DNSError::validation("domain name is empty"));
    }

    if trimmed.starts_with('.') {
        return Err(DNSError::validation("domain name has a leading dot"));
    }

    // a single trailing dot denotes the root; strip exactly one
    let without_root = trimmed.strip_suffix('.').unwrap_or(trimmed);

    if without_root.ends_with('.') {
        return Err(DNSError::validation("domain name has a leading/trailing dot"));
    }

    if without_root.len() > MAX_NAME_TEXT_LEN {
        return Err(DNSError::validation(format!(
            "domain name exceeds {} characters",
            MAX_NAME_TEXT_LEN
        )));
    }

    let mut wire_len = 1usize; // root terminator byte
    for label in without_root.split('.') {
        validate_label(label)?;
        wire_len += 1 + label.len();
    }

    if wire_len > MAX_NAME_WIRE_LEN {
        return Err(DNSError::validation(format!(
            "domain name exceeds {} bytes on the wire",
            MAX_NAME_WIRE_LEN
        )));
    }

    Ok(without_root.to_ascii_lowercase())
}

fn validate_label(label: &str) -> DNSResult<()> {
    if label.is_empty() {
        return Err(DNSError::validation("domain name has an empty label"));
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(DNSError::validation(format!(
            "label \"{}\" exceeds {} bytes",
            label, MAX_LABEL_LEN
        )));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(DNSError::validation(format!(
            "label \"{}\" starts or ends with a hyphen",
            label
        )));
    }

    if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(DNSError::validation(format!(
            "label \"{}\" contains a disallowed character",
            label
        )));
    }

    Ok(())
}

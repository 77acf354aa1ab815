//! Name encoding/decoding with RFC 1035 section 4.1.4 label compression.
use std::collections::HashMap;

use crate::error::{DNSError, DNSResult};
use crate::name::MAX_LABEL_LEN;

/// Maps a lowercase, trailing-dot-free name suffix to the buffer offset at
/// which it was first written, so later names sharing that suffix can emit
/// a two-byte pointer instead of repeating the labels. Reused across
/// multiple questions in a single message (spec section 4.1/9).
pub type CompressionTable = HashMap<String, u16>;

/// Split `name` into labels and append `<len><label>...<0>` to `buffer`,
/// without compression. Used for the single-question queries this crate
/// builds.
///
/// ```
/// use dnslib::wire::encode_name;
///
/// let mut buf = Vec::new();
/// encode_name("www.example.com", &mut buf).unwrap();
/// assert_eq!(buf, vec![3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0]);
/// ```
pub fn encode_name(name: &str, buffer: &mut Vec<u8>) -> DNSResult<()> {
    let name = name.strip_suffix('.').unwrap_or(name);

    if name.is_empty() {
        buffer.push(0);
        return Ok(());
    }

    for label in name.split('.') {
        if label.len() > MAX_LABEL_LEN {
            return Err(DNSError::validation(format!(
                "label \"{}\" exceeds {} bytes",
                label, MAX_LABEL_LEN
            )));
        }
        if !label.is_ascii() {
            return Err(DNSError::validation(format!("label \"{}\" is not ASCII", label)));
        }
        buffer.push(label.len() as u8);
        buffer.extend_from_slice(label.as_bytes());
    }
    buffer.push(0);
    Ok(())
}

/// Like `encode_name`, but consults and updates `table`: the longest suffix
/// of `name` already present in `table` is replaced by a two-byte pointer
/// `0xC000 | offset`; every new suffix written is recorded at its offset
/// (capped at 0x3FFF, the largest representable pointer) for reuse by later
/// calls against the same `buffer`.
pub fn encode_name_compressed(name: &str, buffer: &mut Vec<u8>, table: &mut CompressionTable) -> DNSResult<()> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let labels: Vec<&str> = if name.is_empty() {
        Vec::new()
    } else {
        name.split('.').collect()
    };

    // try suffixes longest-first: the whole name, then drop one label at a time
    for start in 0..=labels.len() {
        let suffix = labels[start..].join(".").to_ascii_lowercase();
        if let Some(&offset) = table.get(&suffix) {
            // write the labels before this suffix, then the pointer
            for label in &labels[..start] {
                if label.len() > MAX_LABEL_LEN {
                    return Err(DNSError::validation(format!(
                        "label \"{}\" exceeds {} bytes",
                        label, MAX_LABEL_LEN
                    )));
                }
                buffer.push(label.len() as u8);
                buffer.extend_from_slice(label.as_bytes());
            }
            buffer.push(0xC0 | ((offset >> 8) as u8));
            buffer.push((offset & 0xFF) as u8);
            return Ok(());
        }
    }

    // no suffix matched at all: record every suffix position (if representable)
    // and write the name out in full.
    for start in 0..labels.len() {
        let offset = buffer.len();
        if offset <= 0x3FFF {
            let suffix = labels[start..].join(".").to_ascii_lowercase();
            table.entry(suffix).or_insert(offset as u16);
        }
        let label = labels[start];
        if label.len() > MAX_LABEL_LEN {
            return Err(DNSError::validation(format!(
                "label \"{}\" exceeds {} bytes",
                label, MAX_LABEL_LEN
            )));
        }
        buffer.push(label.len() as u8);
        buffer.extend_from_slice(label.as_bytes());
    }
    buffer.push(0);
    Ok(())
}

/// Decode a (possibly compressed) name starting at `offset`. Returns the
/// normalised lowercase name (no trailing dot) and the offset just past the
/// first pointer encountered, or past the terminating zero byte if there was
/// no pointer — the classic DNS compression rule for where the caller should
/// resume reading the rest of the message.
pub fn decode_name(buffer: &[u8], offset: usize) -> DNSResult<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut cursor = offset;
    let mut resume_at: Option<usize> = None;
    let mut visited: std::collections::HashSet<usize> = std::collections::HashSet::new();

    loop {
        if cursor >= buffer.len() {
            return Err(DNSError::parse("name decoding ran past end of buffer"));
        }

        let byte = buffer[cursor];

        if byte == 0 {
            if resume_at.is_none() {
                resume_at = Some(cursor + 1);
            }
            break;
        }

        if byte & 0xC0 == 0xC0 {
            if cursor + 1 >= buffer.len() {
                return Err(DNSError::parse("truncated compression pointer"));
            }
            if resume_at.is_none() {
                resume_at = Some(cursor + 2);
            }
            let pointer = (((byte as u16) & 0x3F) << 8) | buffer[cursor + 1] as u16;
            let pointer = pointer as usize;

            if !visited.insert(pointer) {
                return Err(DNSError::parse("compression pointer loop detected"));
            }
            if pointer >= cursor {
                return Err(DNSError::parse("compression pointer does not point backward"));
            }
            cursor = pointer;
            continue;
        }

        if byte & 0xC0 != 0 {
            return Err(DNSError::parse("reserved label length bits set"));
        }

        let len = byte as usize;
        if cursor + 1 + len > buffer.len() {
            return Err(DNSError::parse("label runs past end of buffer"));
        }
        let label_bytes = &buffer[cursor + 1..cursor + 1 + len];
        let label = std::str::from_utf8(label_bytes)?;
        labels.push(label.to_ascii_lowercase());
        cursor += 1 + len;
    }

    Ok((labels.join("."), resume_at.unwrap()))
}

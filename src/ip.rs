//! IP address parsing/formatting and reverse-zone conversion (component C2).
//!
//! IPv4 and IPv6 literals are parsed and formatted by hand rather than via
//! `std::net::IpAddr` so that the canonical-compression algorithm required by
//! spec section 8 invariant 9 (longest run of zero groups, leftmost
//! tie-break, no `::` for a single zero group) is explicit and testable on
//! its own, independent of libstd's own (compatible) behaviour.
use crate::error::{DNSError, DNSResult};

/// Parse a dotted-quad IPv4 literal into four octets.
///
/// ```
/// use dnslib::ip::parse_ipv4;
/// assert_eq!(parse_ipv4("1.2.3.4").unwrap(), [1, 2, 3, 4]);
/// assert!(parse_ipv4("1.2.3").is_err());
/// assert!(parse_ipv4("1.2.3.256").is_err());
/// ```
pub fn parse_ipv4(s: &str) -> DNSResult<[u8; 4]> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return Err(DNSError::validation(format!("\"{}\" is not an IPv4 address", s)));
    }

    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        octets[i] = part
            .parse::<u8>()
            .map_err(|_| DNSError::validation(format!("\"{}\" is not an IPv4 address", s)))?;
    }
    Ok(octets)
}

pub fn format_ipv4(octets: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

/// Parse an IPv6 literal (canonical or not, `::` compression permitted) into
/// eight 16-bit groups. Does not support the `%zone` suffix or embedded IPv4.
pub fn parse_ipv6(s: &str) -> DNSResult<[u16; 8]> {
    let bad = || DNSError::validation(format!("\"{}\" is not an IPv6 address", s));

    if let Some((head, tail)) = s.split_once("::") {
        let head_groups = parse_groups(head).ok_or_else(bad)?;
        let tail_groups = parse_groups(tail).ok_or_else(bad)?;

        if head_groups.len() + tail_groups.len() > 8 {
            return Err(bad());
        }

        let mut groups = [0u16; 8];
        for (i, g) in head_groups.iter().enumerate() {
            groups[i] = *g;
        }
        let tail_start = 8 - tail_groups.len();
        for (i, g) in tail_groups.iter().enumerate() {
            groups[tail_start + i] = *g;
        }
        Ok(groups)
    } else {
        let parsed = parse_groups(s).ok_or_else(bad)?;
        if parsed.len() != 8 {
            return Err(bad());
        }
        let mut groups = [0u16; 8];
        groups.copy_from_slice(&parsed);
        Ok(groups)
    }
}

fn parse_groups(s: &str) -> Option<Vec<u16>> {
    if s.is_empty() {
        return Some(Vec::new());
    }
    s.split(':')
        .map(|g| u16::from_str_radix(g, 16).ok())
        .collect()
}

/// Format eight 16-bit groups as the RFC 5952 canonical (compressed) textual
/// form: the single longest run of >= 2 zero groups is replaced by `::`,
/// ties broken leftmost, and a single isolated zero group is never
/// compressed.
///
/// ```
/// use dnslib::ip::format_ipv6_canonical;
/// assert_eq!(
///     format_ipv6_canonical([0x2001, 0x0db8, 0, 0, 0, 0, 0, 1]),
///     "2001:db8::1"
/// );
/// assert_eq!(format_ipv6_canonical([0; 8]), "::");
/// assert_eq!(format_ipv6_canonical([0, 0, 0, 0, 0, 0, 0, 1]), "::1");
/// // a lone zero group is not compressed
/// assert_eq!(
///     format_ipv6_canonical([1, 0, 2, 3, 4, 5, 6, 7]),
///     "1:0:2:3:4:5:6:7"
/// );
/// // leftmost run wins on a tie
/// assert_eq!(
///     format_ipv6_canonical([1, 0, 0, 2, 0, 0, 3, 4]),
///     "1::2:0:0:3:4"
/// );
/// ```
pub fn format_ipv6_canonical(groups: [u16; 8]) -> String {
    let (run_start, run_len) = longest_zero_run(&groups);

    if run_len < 2 {
        return groups
            .iter()
            .map(|g| format!("{:x}", g))
            .collect::<Vec<_>>()
            .join(":");
    }

    let head: Vec<String> = groups[..run_start].iter().map(|g| format!("{:x}", g)).collect();
    let tail: Vec<String> = groups[run_start + run_len..]
        .iter()
        .map(|g| format!("{:x}", g))
        .collect();

    let head_str = head.join(":");
    let tail_str = tail.join(":");

    match (head.is_empty(), tail.is_empty()) {
        (true, true) => "::".to_string(),
        (true, false) => format!("::{}", tail_str),
        (false, true) => format!("{}::", head_str),
        (false, false) => format!("{}::{}", head_str, tail_str),
    }
}

fn longest_zero_run(groups: &[u16; 8]) -> (usize, usize) {
    let mut best_start = 0usize;
    let mut best_len = 0usize;
    let mut cur_start = 0usize;
    let mut cur_len = 0usize;

    for (i, g) in groups.iter().enumerate() {
        if *g == 0 {
            if cur_len == 0 {
                cur_start = i;
            }
            cur_len += 1;
            if cur_len > best_len {
                best_len = cur_len;
                best_start = cur_start;
            }
        } else {
            cur_len = 0;
        }
    }

    (best_start, best_len)
}

/// Convert an IPv4 dotted-quad to its `.in-addr.arpa` reverse-lookup name.
///
/// ```
/// use dnslib::ip::reverse_ipv4;
/// assert_eq!(reverse_ipv4("1.2.3.4").unwrap(), "4.3.2.1.in-addr.arpa");
/// ```
pub fn reverse_ipv4(ip: &str) -> DNSResult<String> {
    let octets = parse_ipv4(ip)?;
    Ok(format!(
        "{}.{}.{}.{}.in-addr.arpa",
        octets[3], octets[2], octets[1], octets[0]
    ))
}

/// Convert an IPv6 literal to its `.ip6.arpa` reverse-lookup name: 32 hex
/// nibbles (with leading zeros), reversed and dot-separated.
///
/// ```
/// use dnslib::ip::reverse_ipv6;
/// assert_eq!(
///     reverse_ipv6("2001:db8::1").unwrap(),
///     "1.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa"
/// );
/// ```
pub fn reverse_ipv6(ip: &str) -> DNSResult<String> {
    let groups = parse_ipv6(ip)?;
    let mut nibbles = Vec::with_capacity(32);
    for group in groups.iter() {
        for shift in [12u16, 8, 4, 0] {
            nibbles.push(format!("{:x}", (group >> shift) & 0xF));
        }
    }
    nibbles.reverse();
    Ok(format!("{}.ip6.arpa", nibbles.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_round_trip() {
        let octets = parse_ipv4("192.168.1.1").unwrap();
        assert_eq!(format_ipv4(octets), "192.168.1.1");
    }

    #[test]
    fn ipv6_parse_compressed_forms() {
        assert_eq!(parse_ipv6("::").unwrap(), [0; 8]);
        assert_eq!(parse_ipv6("::1").unwrap(), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            parse_ipv6("2001:db8::1").unwrap(),
            [0x2001, 0xdb8, 0, 0, 0, 0, 0, 1]
        );
        assert!(parse_ipv6("garbage").is_err());
        assert!(parse_ipv6("1:2:3:4:5:6:7:8:9").is_err());
    }

    #[test]
    fn reverse_ipv6_rejects_bad_input() {
        assert!(reverse_ipv6("not-an-ip").is_err());
    }
}

//! Per-type RDATA interpretation (component C4). Each parser takes the full
//! message buffer plus the record's RDATA position within it and returns a
//! typed value — names embedded in RDATA (CNAME/NS/PTR/MX/SRV/SOA targets)
//! may themselves be compressed and must be resolved against the full
//! buffer, not just the RDATA slice, so the position is carried alongside
//! the slice rather than replacing it.
use byteorder::{BigEndian, ByteOrder};

use crate::error::{DNSError, DNSResult};
use crate::ip::{format_ipv4, format_ipv6_canonical};
use crate::wire::{self, Message, QType, RawRecord};

/// A typed, parsed resource record value (spec section 3 "Typed record").
#[derive(Debug, Clone, PartialEq)]
pub enum RData {
    A(String),
    Aaaa(String),
    Cname(String),
    Ns(String),
    Ptr(String),
    Mx { priority: u16, exchange: String },
    Srv { priority: u16, weight: u16, port: u16, target: String },
    Soa {
        nsname: String,
        hostmaster: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minttl: u32,
    },
    Txt(Vec<String>),
    Caa { critical: bool, tag: String, value: Vec<u8> },
}

/// Parse a single record's RDATA according to its declared type. Returns an
/// error for record types outside the supported closed set (spec section 3:
/// such types decode to a synthetic `TYPE<n>` name but never parse).
pub fn parse(buffer: &[u8], record: &RawRecord) -> DNSResult<RData> {
    let rdata = record.rdata(buffer);

    match record.rtype {
        QType::A => parse_a(rdata),
        QType::AAAA => parse_aaaa(rdata),
        QType::CNAME => Ok(RData::Cname(parse_name_rdata(buffer, record.rdata_offset)?)),
        QType::NS => Ok(RData::Ns(parse_name_rdata(buffer, record.rdata_offset)?)),
        QType::PTR => Ok(RData::Ptr(parse_name_rdata(buffer, record.rdata_offset)?)),
        QType::MX => parse_mx(buffer, record),
        QType::SRV => parse_srv(buffer, record),
        QType::SOA => parse_soa(buffer, record),
        QType::TXT => parse_txt(rdata),
        QType::CAA => parse_caa(rdata),
        QType::Unsupported(n) => Err(DNSError::parse(format!("record type TYPE{} is unsupported", n))),
    }
}

fn parse_a(rdata: &[u8]) -> DNSResult<RData> {
    if rdata.len() != 4 {
        return Err(DNSError::parse("A record RDATA must be exactly 4 bytes"));
    }
    Ok(RData::A(format_ipv4([rdata[0], rdata[1], rdata[2], rdata[3]])))
}

fn parse_aaaa(rdata: &[u8]) -> DNSResult<RData> {
    if rdata.len() != 16 {
        return Err(DNSError::parse("AAAA record RDATA must be exactly 16 bytes"));
    }
    let mut groups = [0u16; 8];
    for i in 0..8 {
        groups[i] = BigEndian::read_u16(&rdata[i * 2..i * 2 + 2]);
    }
    Ok(RData::Aaaa(format_ipv6_canonical(groups)))
}

fn parse_name_rdata(buffer: &[u8], offset: usize) -> DNSResult<String> {
    let (name, _) = wire::decode_name(buffer, offset)?;
    Ok(name)
}

fn parse_mx(buffer: &[u8], record: &RawRecord) -> DNSResult<RData> {
    let rdata = record.rdata(buffer);
    if rdata.len() < 2 {
        return Err(DNSError::parse("MX record RDATA too short"));
    }
    let priority = BigEndian::read_u16(&rdata[0..2]);
    let (exchange, _) = wire::decode_name(buffer, record.rdata_offset + 2)?;
    Ok(RData::Mx { priority, exchange })
}

fn parse_srv(buffer: &[u8], record: &RawRecord) -> DNSResult<RData> {
    let rdata = record.rdata(buffer);
    if rdata.len() < 6 {
        return Err(DNSError::parse("SRV record RDATA too short"));
    }
    let priority = BigEndian::read_u16(&rdata[0..2]);
    let weight = BigEndian::read_u16(&rdata[2..4]);
    let port = BigEndian::read_u16(&rdata[4..6]);
    let (target, _) = wire::decode_name(buffer, record.rdata_offset + 6)?;
    Ok(RData::Srv { priority, weight, port, target })
}

fn parse_soa(buffer: &[u8], record: &RawRecord) -> DNSResult<RData> {
    let (nsname, after_nsname) = wire::decode_name(buffer, record.rdata_offset)?;
    let (hostmaster, after_hostmaster) = wire::decode_name(buffer, after_nsname)?;

    let tail_start = after_hostmaster;
    if tail_start + 20 > buffer.len() {
        return Err(DNSError::parse("SOA record RDATA too short for the five 32-bit fields"));
    }
    let tail = &buffer[tail_start..tail_start + 20];

    Ok(RData::Soa {
        nsname,
        hostmaster,
        serial: BigEndian::read_u32(&tail[0..4]),
        refresh: BigEndian::read_u32(&tail[4..8]),
        retry: BigEndian::read_u32(&tail[8..12]),
        expire: BigEndian::read_u32(&tail[12..16]),
        minttl: BigEndian::read_u32(&tail[16..20]),
    })
}

fn parse_txt(rdata: &[u8]) -> DNSResult<RData> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;

    while cursor < rdata.len() {
        let len = rdata[cursor] as usize;
        if len == 0 {
            break;
        }
        if cursor + 1 + len > rdata.len() {
            break;
        }
        let segment = String::from_utf8_lossy(&rdata[cursor + 1..cursor + 1 + len]).into_owned();
        segments.push(segment);
        cursor += 1 + len;
    }

    Ok(RData::Txt(segments))
}

fn parse_caa(rdata: &[u8]) -> DNSResult<RData> {
    if rdata.len() < 2 {
        return Err(DNSError::parse("CAA record RDATA too short"));
    }
    let flags = rdata[0];
    let critical = flags & 0x80 != 0;

    let tag_len = rdata[1] as usize;
    if 2 + tag_len > rdata.len() {
        return Err(DNSError::parse("CAA tag runs past end of RDATA"));
    }
    let tag = std::str::from_utf8(&rdata[2..2 + tag_len])
        .map_err(|_| DNSError::parse("CAA tag is not ASCII"))?
        .to_string();
    let value = rdata[2 + tag_len..].to_vec();

    Ok(RData::Caa { critical, tag, value })
}

/// The smallest TTL among a message's answers, or 0 if there are none
/// (spec section 4.2/8: empty answer list implies ttl = 0).
pub fn min_ttl(message: &Message) -> u32 {
    message.answers.iter().map(|r| r.ttl).min().unwrap_or(0)
}

pub fn is_nxdomain(message: &Message) -> bool {
    message.header.flags.rcode() == 3
}

pub fn is_servfail(message: &Message) -> bool {
    message.header.flags.rcode() == 2
}

/// Order SRV records by ascending priority, then descending weight within
/// each priority group. This is the simplified ordering spec section 4.2
/// calls for — not the full RFC 2782 weighted shuffle.
pub fn sort_srv(records: &mut [RData]) {
    records.sort_by(|a, b| match (a, b) {
        (
            RData::Srv { priority: p1, weight: w1, .. },
            RData::Srv { priority: p2, weight: w2, .. },
        ) => p1.cmp(p2).then(w2.cmp(w1)),
        _ => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{encode_name, Header, QType as WQType};

    fn record(rtype: WQType, buffer: &mut Vec<u8>, rdata: &[u8]) -> RawRecord {
        encode_name("example.com", buffer).unwrap();
        buffer.extend_from_slice(&(rtype.to_u16()).to_be_bytes());
        buffer.extend_from_slice(&1u16.to_be_bytes()); // class IN
        buffer.extend_from_slice(&300u32.to_be_bytes()); // ttl
        buffer.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        let rdata_offset = buffer.len();
        buffer.extend_from_slice(rdata);
        RawRecord {
            name: "example.com".into(),
            rtype,
            class: 1,
            ttl: 300,
            rdata_offset,
            rdata_len: rdata.len(),
        }
    }

    #[test]
    fn parses_a_record() {
        let mut buf = Vec::new();
        let rec = record(WQType::A, &mut buf, &[93, 184, 216, 34]);
        assert_eq!(parse(&buf, &rec).unwrap(), RData::A("93.184.216.34".into()));
    }

    #[test]
    fn parses_aaaa_record_canonical() {
        let mut buf = Vec::new();
        let mut rdata = [0u8; 16];
        rdata[14] = 0;
        rdata[15] = 1;
        let rec = record(WQType::AAAA, &mut buf, &rdata);
        assert_eq!(parse(&buf, &rec).unwrap(), RData::Aaaa("::1".into()));
    }

    #[test]
    fn parses_txt_segments() {
        let mut buf = Vec::new();
        let mut rdata = Vec::new();
        rdata.push(5u8);
        rdata.extend_from_slice(b"hello");
        rdata.push(5u8);
        rdata.extend_from_slice(b"world");
        let rec = record(WQType::TXT, &mut buf, &rdata);
        assert_eq!(
            parse(&buf, &rec).unwrap(),
            RData::Txt(vec!["hello".into(), "world".into()])
        );
    }

    #[test]
    fn txt_stops_at_zero_length_segment() {
        let mut buf = Vec::new();
        let mut rdata = Vec::new();
        rdata.push(5u8);
        rdata.extend_from_slice(b"hello");
        rdata.push(0u8);
        rdata.push(5u8);
        rdata.extend_from_slice(b"never");
        let rec = record(WQType::TXT, &mut buf, &rdata);
        assert_eq!(parse(&buf, &rec).unwrap(), RData::Txt(vec!["hello".into()]));
    }

    #[test]
    fn parses_caa_length_prefixed_tag() {
        let mut buf = Vec::new();
        let mut rdata = Vec::new();
        rdata.push(0x80); // critical
        rdata.push(5u8); // tag length
        rdata.extend_from_slice(b"issue");
        rdata.extend_from_slice(b"letsencrypt.org");
        let rec = record(WQType::CAA, &mut buf, &rdata);
        assert_eq!(
            parse(&buf, &rec).unwrap(),
            RData::Caa {
                critical: true,
                tag: "issue".into(),
                value: b"letsencrypt.org".to_vec()
            }
        );
    }

    #[test]
    fn rejects_unsupported_type() {
        let mut buf = Vec::new();
        let rec = record(WQType::Unsupported(9999), &mut buf, &[1, 2, 3]);
        assert!(parse(&buf, &rec).is_err());
    }

    #[test]
    fn sort_srv_orders_by_priority_then_weight_desc() {
        let mut records = vec![
            RData::Srv { priority: 20, weight: 5, port: 1, target: "a".into() },
            RData::Srv { priority: 10, weight: 5, port: 2, target: "b".into() },
            RData::Srv { priority: 10, weight: 10, port: 3, target: "c".into() },
        ];
        sort_srv(&mut records);
        let targets: Vec<&str> = records
            .iter()
            .map(|r| match r {
                RData::Srv { target, .. } => target.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(targets, vec!["c", "b", "a"]);
    }

    #[test]
    fn min_ttl_empty_answers_is_zero() {
        let message = Message {
            header: Header::default(),
            questions: vec![],
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        };
        assert_eq!(min_ttl(&message), 0);
    }
}

//! RFC 1035 message encoding/decoding with name compression (component C3).
//!
//! Mirrors the teacher crate's manual, `byteorder`-driven approach to
//! network-order conversion (see `network_order.rs` in the source pack) but
//! is rebuilt around absolute-offset buffers rather than a streaming
//! `Cursor`, because label-compression pointers are offsets from the start
//! of the whole message and must be resolved against the full buffer, not
//! against however much of it a `Cursor` has already consumed.
mod name;

pub use name::{decode_name, encode_name, encode_name_compressed, CompressionTable};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DNSError, DNSResult};

/// The closed set of record types this crate understands, per spec section 3.
/// Any wire value outside this set decodes to `Unsupported(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    CAA,
    Unsupported(u16),
}

impl QType {
    pub fn to_u16(self) -> u16 {
        match self {
            QType::A => 1,
            QType::NS => 2,
            QType::CNAME => 5,
            QType::SOA => 6,
            QType::PTR => 12,
            QType::MX => 15,
            QType::TXT => 16,
            QType::AAAA => 28,
            QType::SRV => 33,
            QType::CAA => 257,
            QType::Unsupported(n) => n,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, QType::Unsupported(_))
    }
}

impl From<u16> for QType {
    fn from(value: u16) -> Self {
        match value {
            1 => QType::A,
            2 => QType::NS,
            5 => QType::CNAME,
            6 => QType::SOA,
            12 => QType::PTR,
            15 => QType::MX,
            16 => QType::TXT,
            28 => QType::AAAA,
            33 => QType::SRV,
            257 => QType::CAA,
            n => QType::Unsupported(n),
        }
    }
}

impl std::fmt::Display for QType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QType::Unsupported(n) => write!(f, "TYPE{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

/// QCLASS is always IN for our purposes but preserved for round-trip.
pub const CLASS_IN: u16 = 1;

pub const HEADER_LEN: usize = 12;

/// The 12-byte DNS message header (RFC 1035 section 4.1.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

/// The header flags, kept as a raw bitfield (as the wire format itself does)
/// with typed accessors, rather than one bool per bit — QR is mask 0x8000,
/// TC is 0x0200, AD is 0x0020, RCODE is the low 4 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(pub u16);

impl Flags {
    pub const QR: u16 = 0x8000;
    pub const TC: u16 = 0x0200;
    pub const RD: u16 = 0x0100;
    pub const AD: u16 = 0x0020;

    pub fn query(recursion_desired: bool) -> Self {
        Flags(if recursion_desired { Self::RD } else { 0 })
    }

    pub fn is_response(self) -> bool {
        self.0 & Self::QR != 0
    }

    pub fn is_truncated(self) -> bool {
        self.0 & Self::TC != 0
    }

    pub fn is_authentic_data(self) -> bool {
        self.0 & Self::AD != 0
    }

    pub fn rcode(self) -> u8 {
        (self.0 & 0x000F) as u8
    }
}

impl Header {
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        let mut tmp = [0u8; 2];
        BigEndian::write_u16(&mut tmp, self.id);
        buffer.extend_from_slice(&tmp);
        BigEndian::write_u16(&mut tmp, self.flags.0);
        buffer.extend_from_slice(&tmp);
        BigEndian::write_u16(&mut tmp, self.qd_count);
        buffer.extend_from_slice(&tmp);
        BigEndian::write_u16(&mut tmp, self.an_count);
        buffer.extend_from_slice(&tmp);
        BigEndian::write_u16(&mut tmp, self.ns_count);
        buffer.extend_from_slice(&tmp);
        BigEndian::write_u16(&mut tmp, self.ar_count);
        buffer.extend_from_slice(&tmp);
    }

    pub fn decode(buffer: &[u8]) -> DNSResult<Self> {
        if buffer.len() < HEADER_LEN {
            return Err(DNSError::parse("buffer shorter than a DNS header"));
        }
        Ok(Header {
            id: BigEndian::read_u16(&buffer[0..2]),
            flags: Flags(BigEndian::read_u16(&buffer[2..4])),
            qd_count: BigEndian::read_u16(&buffer[4..6]),
            an_count: BigEndian::read_u16(&buffer[6..8]),
            ns_count: BigEndian::read_u16(&buffer[8..10]),
            ar_count: BigEndian::read_u16(&buffer[10..12]),
        })
    }
}

/// A decoded question-section entry.
#[derive(Debug, Clone)]
pub struct Question {
    pub name: String,
    pub qtype: QType,
    pub qclass: u16,
}

/// A raw resource record as it sits in the wire format: the RDATA is kept as
/// an offset/length pair into the original buffer (rather than copied out)
/// so per-type parsers (component C4) can resolve compressed names inside it
/// against the full message.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub name: String,
    pub rtype: QType,
    pub class: u16,
    pub ttl: u32,
    pub rdata_offset: usize,
    pub rdata_len: usize,
}

impl RawRecord {
    pub fn rdata<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        &buffer[self.rdata_offset..self.rdata_offset + self.rdata_len]
    }
}

/// A fully decoded response message.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<RawRecord>,
    pub authorities: Vec<RawRecord>,
    pub additionals: Vec<RawRecord>,
}

/// Build the wire bytes for a single-question query, per spec section 4.1.
///
/// ```
/// use dnslib::wire::{encode_query, QType};
///
/// let bytes = encode_query(0x1234, "example.com", QType::A, true).unwrap();
/// assert_eq!(&bytes[0..2], &[0x12, 0x34]);
/// assert_eq!(&bytes[2..4], &[0x01, 0x00]); // RD set, everything else clear
/// assert_eq!(&bytes[4..6], &[0x00, 0x01]); // qdcount = 1
/// ```
pub fn encode_query(id: u16, name: &str, qtype: QType, recursion_desired: bool) -> DNSResult<Vec<u8>> {
    let header = Header {
        id,
        flags: Flags::query(recursion_desired),
        qd_count: 1,
        an_count: 0,
        ns_count: 0,
        ar_count: 0,
    };

    let mut buffer = Vec::with_capacity(32);
    header.encode(&mut buffer);
    encode_name(name, &mut buffer)?;

    let mut tmp = [0u8; 2];
    BigEndian::write_u16(&mut tmp, qtype.to_u16());
    buffer.extend_from_slice(&tmp);
    BigEndian::write_u16(&mut tmp, CLASS_IN);
    buffer.extend_from_slice(&tmp);

    Ok(buffer)
}

/// Decode a full response message from the wire, per spec section 4.1.
pub fn decode_response(buffer: &[u8]) -> DNSResult<Message> {
    let header = Header::decode(buffer)?;
    let mut offset = HEADER_LEN;

    let mut questions = Vec::with_capacity(header.qd_count as usize);
    for _ in 0..header.qd_count {
        let (name, new_offset) = decode_name(buffer, offset)?;
        offset = new_offset;
        if offset + 4 > buffer.len() {
            return Err(DNSError::parse("question section truncated"));
        }
        let qtype = QType::from(BigEndian::read_u16(&buffer[offset..offset + 2]));
        let qclass = BigEndian::read_u16(&buffer[offset + 2..offset + 4]);
        offset += 4;
        questions.push(Question { name, qtype, qclass });
    }

    let mut answers = Vec::with_capacity(header.an_count as usize);
    for _ in 0..header.an_count {
        let (record, new_offset) = decode_record(buffer, offset)?;
        offset = new_offset;
        answers.push(record);
    }

    let mut authorities = Vec::with_capacity(header.ns_count as usize);
    for _ in 0..header.ns_count {
        let (record, new_offset) = decode_record(buffer, offset)?;
        offset = new_offset;
        authorities.push(record);
    }

    let mut additionals = Vec::with_capacity(header.ar_count as usize);
    for _ in 0..header.ar_count {
        let (record, new_offset) = decode_record(buffer, offset)?;
        offset = new_offset;
        additionals.push(record);
    }

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn decode_record(buffer: &[u8], offset: usize) -> DNSResult<(RawRecord, usize)> {
    let (name, mut offset) = decode_name(buffer, offset)?;

    if offset + 10 > buffer.len() {
        return Err(DNSError::parse("resource record header truncated"));
    }

    let rtype = QType::from(BigEndian::read_u16(&buffer[offset..offset + 2]));
    let class = BigEndian::read_u16(&buffer[offset + 2..offset + 4]);
    let ttl = BigEndian::read_u32(&buffer[offset + 4..offset + 8]);
    let rdlength = BigEndian::read_u16(&buffer[offset + 8..offset + 10]) as usize;
    offset += 10;

    if offset + rdlength > buffer.len() {
        return Err(DNSError::parse("RDATA runs past end of buffer"));
    }

    let record = RawRecord {
        name,
        rtype,
        class,
        ttl,
        rdata_offset: offset,
        rdata_len: rdlength,
    };

    Ok((record, offset + rdlength))
}

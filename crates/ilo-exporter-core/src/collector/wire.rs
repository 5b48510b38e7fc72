//! BER encoding of SNMP v2c messages.
//!
//! Covers the subset the exporter speaks: GetRequest, GetNextRequest and
//! Response PDUs, with every SMIv2 value type and the three v2c exception
//! markers (`noSuchObject`, `noSuchInstance`, `endOfMibView`).

use thiserror::Error;

use super::oid::Oid;
use super::value::RawValue;

/// Version field of a v2c message.
pub const VERSION_2C: i64 = 1;

mod tag {
    pub const BOOLEAN: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const UNSIGNED32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
    pub const GET_REQUEST: u8 = 0xa0;
    pub const GET_NEXT_REQUEST: u8 = 0xa1;
    pub const RESPONSE: u8 = 0xa2;
}

/// Errors raised while decoding a datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("message truncated")]
    Truncated,
    #[error("expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },
    #[error("unsupported length encoding")]
    BadLength,
    #[error("integer out of range")]
    IntegerOverflow,
    #[error("malformed object identifier")]
    BadOid,
    #[error("unsupported SNMP version {0}")]
    Version(i64),
    #[error("unknown PDU type 0x{0:02x}")]
    PduType(u8),
    #[error("{0} trailing bytes after message")]
    Trailing(usize),
}

/// PDU types used by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    GetRequest,
    GetNextRequest,
    Response,
}

impl PduKind {
    fn tag(self) -> u8 {
        match self {
            PduKind::GetRequest => tag::GET_REQUEST,
            PduKind::GetNextRequest => tag::GET_NEXT_REQUEST,
            PduKind::Response => tag::RESPONSE,
        }
    }

    fn from_tag(value: u8) -> Option<Self> {
        match value {
            tag::GET_REQUEST => Some(PduKind::GetRequest),
            tag::GET_NEXT_REQUEST => Some(PduKind::GetNextRequest),
            tag::RESPONSE => Some(PduKind::Response),
            _ => None,
        }
    }
}

/// One v2c message with its PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub community: Vec<u8>,
    pub kind: PduKind,
    pub request_id: i32,
    pub error_status: u32,
    pub error_index: u32,
    pub varbinds: Vec<(Oid, RawValue)>,
}

impl Message {
    /// Builds a request for `oids`, each bound to NULL.
    pub fn request(kind: PduKind, community: &[u8], request_id: i32, oids: &[Oid]) -> Self {
        Self {
            community: community.to_vec(),
            kind,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| (oid.clone(), RawValue::Null)).collect(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut list = Vec::new();
        for (oid, value) in &self.varbinds {
            let mut varbind = Vec::new();
            write_tlv(&mut varbind, tag::OBJECT_IDENTIFIER, &encode_oid(oid));
            write_value(&mut varbind, value);
            write_tlv(&mut list, tag::SEQUENCE, &varbind);
        }

        let mut pdu = Vec::with_capacity(list.len() + 16);
        write_tlv(&mut pdu, tag::INTEGER, &encode_integer(i64::from(self.request_id)));
        write_tlv(&mut pdu, tag::INTEGER, &encode_integer(i64::from(self.error_status)));
        write_tlv(&mut pdu, tag::INTEGER, &encode_integer(i64::from(self.error_index)));
        write_tlv(&mut pdu, tag::SEQUENCE, &list);

        let mut body = Vec::with_capacity(pdu.len() + self.community.len() + 8);
        write_tlv(&mut body, tag::INTEGER, &encode_integer(VERSION_2C));
        write_tlv(&mut body, tag::OCTET_STRING, &self.community);
        write_tlv(&mut body, self.kind.tag(), &pdu);

        let mut out = Vec::with_capacity(body.len() + 4);
        write_tlv(&mut out, tag::SEQUENCE, &body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut outer = Reader::new(bytes);
        let body = outer.expect(tag::SEQUENCE)?;
        if !outer.is_empty() {
            return Err(DecodeError::Trailing(outer.remaining()));
        }

        let mut message = Reader::new(body);
        let version = decode_integer(message.expect(tag::INTEGER)?)?;
        if version != VERSION_2C {
            return Err(DecodeError::Version(version));
        }
        let community = message.expect(tag::OCTET_STRING)?.to_vec();
        let (pdu_tag, pdu) = message.read_tlv()?;
        let kind = PduKind::from_tag(pdu_tag).ok_or(DecodeError::PduType(pdu_tag))?;

        let mut pdu = Reader::new(pdu);
        let request_id = i32::try_from(decode_integer(pdu.expect(tag::INTEGER)?)?)
            .map_err(|_| DecodeError::IntegerOverflow)?;
        let error_status = u32::try_from(decode_integer(pdu.expect(tag::INTEGER)?)?)
            .map_err(|_| DecodeError::IntegerOverflow)?;
        let error_index = u32::try_from(decode_integer(pdu.expect(tag::INTEGER)?)?)
            .map_err(|_| DecodeError::IntegerOverflow)?;

        let mut list = Reader::new(pdu.expect(tag::SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut varbind = Reader::new(list.expect(tag::SEQUENCE)?);
            let oid = decode_oid(varbind.expect(tag::OBJECT_IDENTIFIER)?)?;
            let (value_tag, content) = varbind.read_tlv()?;
            varbinds.push((oid, decode_value(value_tag, content)?));
        }

        Ok(Self {
            community,
            kind,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

// ============================================================
// Encoding
// ============================================================

fn write_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Minimal two's complement form.
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Unsigned application types still carry a sign bit on the wire.
fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes[..bytes.len() - 1].iter().take_while(|&&b| b == 0).count();
    let mut out = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn encode_oid(oid: &Oid) -> Vec<u8> {
    let components = oid.components();
    let first = match components {
        [] => 0,
        [a] => u64::from(*a) * 40,
        [a, b, ..] => u64::from(*a) * 40 + u64::from(*b),
    };

    let mut out = Vec::with_capacity(components.len() + 4);
    write_subidentifier(&mut out, first);
    for component in components.iter().skip(2) {
        write_subidentifier(&mut out, u64::from(*component));
    }
    out
}

fn write_subidentifier(out: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    let mut rest = value;
    loop {
        groups[n] = (rest & 0x7f) as u8;
        n += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let more = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | more);
    }
}

fn write_value(out: &mut Vec<u8>, value: &RawValue) {
    match value {
        RawValue::Integer(n) => write_tlv(out, tag::INTEGER, &encode_integer(*n)),
        RawValue::OctetString(bytes) => write_tlv(out, tag::OCTET_STRING, bytes),
        RawValue::Counter32(n) => write_tlv(out, tag::COUNTER32, &encode_unsigned(u64::from(*n))),
        RawValue::Unsigned32(n) => {
            write_tlv(out, tag::UNSIGNED32, &encode_unsigned(u64::from(*n)))
        }
        RawValue::Timeticks(n) => write_tlv(out, tag::TIMETICKS, &encode_unsigned(u64::from(*n))),
        RawValue::Counter64(n) => write_tlv(out, tag::COUNTER64, &encode_unsigned(*n)),
        RawValue::IpAddress(octets) => write_tlv(out, tag::IP_ADDRESS, octets),
        RawValue::ObjectIdentifier(oid) => {
            write_tlv(out, tag::OBJECT_IDENTIFIER, &encode_oid(oid))
        }
        RawValue::Opaque(bytes) => write_tlv(out, tag::OPAQUE, bytes),
        RawValue::Boolean(b) => write_tlv(out, tag::BOOLEAN, &[if *b { 0xff } else { 0x00 }]),
        RawValue::NoSuchObject => write_tlv(out, tag::NO_SUCH_OBJECT, &[]),
        RawValue::NoSuchInstance => write_tlv(out, tag::NO_SUCH_INSTANCE, &[]),
        RawValue::EndOfMibView => write_tlv(out, tag::END_OF_MIB_VIEW, &[]),
        // No wire form.
        RawValue::Null | RawValue::Other(_) => write_tlv(out, tag::NULL, &[]),
    }
}

// ============================================================
// Decoding
// ============================================================

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.bytes.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), DecodeError> {
        let tag = self.byte()?;
        let first = self.byte()?;
        let len = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7f);
            if count == 0 || count > 4 {
                return Err(DecodeError::BadLength);
            }
            let mut len = 0usize;
            for _ in 0..count {
                len = (len << 8) | usize::from(self.byte()?);
            }
            len
        };

        let end = self.pos.checked_add(len).ok_or(DecodeError::BadLength)?;
        let content = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok((tag, content))
    }

    fn expect(&mut self, expected: u8) -> Result<&'a [u8], DecodeError> {
        let (found, content) = self.read_tlv()?;
        if found != expected {
            return Err(DecodeError::UnexpectedTag { expected, found });
        }
        Ok(content)
    }
}

fn decode_integer(content: &[u8]) -> Result<i64, DecodeError> {
    let Some(&first) = content.first() else {
        return Err(DecodeError::BadLength);
    };
    if content.len() > 8 {
        return Err(DecodeError::IntegerOverflow);
    }
    let init = if first & 0x80 != 0 { -1i64 } else { 0 };
    Ok(content.iter().fold(init, |acc, &b| (acc << 8) | i64::from(b)))
}

fn decode_unsigned(content: &[u8]) -> Result<u64, DecodeError> {
    let digits = match content {
        [] => return Err(DecodeError::BadLength),
        [0, rest @ ..] if !rest.is_empty() => rest,
        all => all,
    };
    if digits.len() > 8 {
        return Err(DecodeError::IntegerOverflow);
    }
    Ok(digits.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn decode_u32(content: &[u8]) -> Result<u32, DecodeError> {
    u32::try_from(decode_unsigned(content)?).map_err(|_| DecodeError::IntegerOverflow)
}

fn decode_oid(content: &[u8]) -> Result<Oid, DecodeError> {
    let mut subidentifiers = Vec::with_capacity(content.len() + 1);
    let mut current = 0u64;
    let mut pending = false;
    for &b in content {
        if current > u64::from(u32::MAX) {
            return Err(DecodeError::BadOid);
        }
        current = (current << 7) | u64::from(b & 0x7f);
        pending = b & 0x80 != 0;
        if !pending {
            subidentifiers.push(current);
            current = 0;
        }
    }
    if pending || subidentifiers.is_empty() {
        return Err(DecodeError::BadOid);
    }

    let first = subidentifiers[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut components = Vec::with_capacity(subidentifiers.len() + 1);
    components.push(a);
    for value in std::iter::once(b).chain(subidentifiers[1..].iter().copied()) {
        components.push(u32::try_from(value).map_err(|_| DecodeError::BadOid)?);
    }
    Ok(Oid::new(components))
}

fn decode_value(value_tag: u8, content: &[u8]) -> Result<RawValue, DecodeError> {
    let value = match value_tag {
        tag::BOOLEAN => RawValue::Boolean(content.first().is_some_and(|&b| b != 0)),
        tag::INTEGER => RawValue::Integer(decode_integer(content)?),
        tag::OCTET_STRING => RawValue::OctetString(content.to_vec()),
        tag::NULL => RawValue::Null,
        tag::OBJECT_IDENTIFIER => RawValue::ObjectIdentifier(decode_oid(content)?),
        tag::IP_ADDRESS => RawValue::IpAddress(
            content.try_into().map_err(|_| DecodeError::BadLength)?,
        ),
        tag::COUNTER32 => RawValue::Counter32(decode_u32(content)?),
        tag::UNSIGNED32 => RawValue::Unsigned32(decode_u32(content)?),
        tag::TIMETICKS => RawValue::Timeticks(decode_u32(content)?),
        tag::OPAQUE => RawValue::Opaque(content.to_vec()),
        tag::COUNTER64 => RawValue::Counter64(decode_unsigned(content)?),
        tag::NO_SUCH_OBJECT => RawValue::NoSuchObject,
        tag::NO_SUCH_INSTANCE => RawValue::NoSuchInstance,
        tag::END_OF_MIB_VIEW => RawValue::EndOfMibView,
        other => RawValue::Other(format!("tag 0x{:02x} ({} bytes)", other, content.len())),
    };
    Ok(value)
}

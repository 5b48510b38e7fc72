//! Raw protocol values and their decoding.

use std::fmt;

use tracing::warn;

use super::oid::Oid;

/// A value as returned by the transport, detached from any receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Counter32(u32),
    Unsigned32(u32),
    Counter64(u64),
    Timeticks(u32),
    IpAddress([u8; 4]),
    ObjectIdentifier(Oid),
    Opaque(Vec<u8>),
    Boolean(bool),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// A wire type the adapter has no owned form for, kept as text.
    Other(String),
}

impl RawValue {
    /// Name of the wire type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Integer(_) => "Integer",
            RawValue::OctetString(_) => "OctetString",
            RawValue::Counter32(_) => "Counter32",
            RawValue::Unsigned32(_) => "Unsigned32",
            RawValue::Counter64(_) => "Counter64",
            RawValue::Timeticks(_) => "Timeticks",
            RawValue::IpAddress(_) => "IpAddress",
            RawValue::ObjectIdentifier(_) => "ObjectIdentifier",
            RawValue::Opaque(_) => "Opaque",
            RawValue::Boolean(_) => "Boolean",
            RawValue::Null => "Null",
            RawValue::NoSuchObject => "NoSuchObject",
            RawValue::NoSuchInstance => "NoSuchInstance",
            RawValue::EndOfMibView => "EndOfMibView",
            RawValue::Other(_) => "Other",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(n) => write!(f, "{}", n),
            RawValue::OctetString(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            RawValue::Counter32(n) | RawValue::Unsigned32(n) => write!(f, "{}", n),
            RawValue::Counter64(n) => write!(f, "{}", n),
            RawValue::Timeticks(ticks) => {
                let secs = ticks / 100;
                write!(
                    f,
                    "{}d {:02}:{:02}:{:02}.{:02}",
                    secs / 86_400,
                    (secs / 3600) % 24,
                    (secs / 60) % 60,
                    secs % 60,
                    ticks % 100
                )
            }
            RawValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            RawValue::ObjectIdentifier(oid) => write!(f, "{}", oid),
            RawValue::Opaque(bytes) => {
                f.write_str("0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            RawValue::Boolean(b) => write!(f, "{}", b),
            RawValue::Null => f.write_str(""),
            RawValue::NoSuchObject => f.write_str("No Such Object"),
            RawValue::NoSuchInstance => f.write_str("No Such Instance"),
            RawValue::EndOfMibView => f.write_str("End of MIB View"),
            RawValue::Other(text) => f.write_str(text),
        }
    }
}

/// A raw value narrowed to the shapes a metric sink can consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Integer(i64),
    Text(String),
    /// The instance exists but has no value for this attribute.
    Absent,
}

impl DecodedValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Integer(n) => write!(f, "{}", n),
            DecodedValue::Text(text) => f.write_str(text),
            DecodedValue::Absent => f.write_str("None"),
        }
    }
}

/// Decodes one raw value.
///
/// Never fails: "no such" markers become [`DecodedValue::Absent`], the
/// integer family becomes an integer, octet strings become (untrimmed)
/// text, and anything else degrades to its textual rendering with a
/// warning.
pub fn decode(raw: &RawValue) -> DecodedValue {
    match raw {
        RawValue::NoSuchInstance | RawValue::NoSuchObject => DecodedValue::Absent,
        RawValue::Integer(n) => DecodedValue::Integer(*n),
        RawValue::Counter32(n) | RawValue::Unsigned32(n) => DecodedValue::Integer(i64::from(*n)),
        RawValue::Counter64(n) => match i64::try_from(*n) {
            Ok(n) => DecodedValue::Integer(n),
            Err(_) => {
                warn!(value = n, "Counter64 value does not fit in i64");
                DecodedValue::Text(n.to_string())
            }
        },
        RawValue::OctetString(bytes) => {
            DecodedValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
        other => {
            warn!(
                value = %other,
                wire_type = other.type_name(),
                "unhandled SNMP value type"
            );
            DecodedValue::Text(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer_family() {
        assert_eq!(decode(&RawValue::Integer(-3)), DecodedValue::Integer(-3));
        assert_eq!(decode(&RawValue::Counter32(7)), DecodedValue::Integer(7));
        assert_eq!(decode(&RawValue::Unsigned32(9)), DecodedValue::Integer(9));
        assert_eq!(decode(&RawValue::Counter64(11)), DecodedValue::Integer(11));
    }

    #[test]
    fn test_decode_strings_untrimmed() {
        let raw = RawValue::OctetString(b"  Proc 1  ".to_vec());
        assert_eq!(decode(&raw), DecodedValue::Text("  Proc 1  ".to_string()));
    }

    #[test]
    fn test_decode_holes() {
        assert_eq!(decode(&RawValue::NoSuchInstance), DecodedValue::Absent);
        assert_eq!(decode(&RawValue::NoSuchObject), DecodedValue::Absent);
    }

    #[test]
    fn test_decode_unhandled_degrades_to_text() {
        assert_eq!(
            decode(&RawValue::IpAddress([10, 0, 0, 1])),
            DecodedValue::Text("10.0.0.1".to_string())
        );
        assert_eq!(
            decode(&RawValue::Timeticks(8_640_123)),
            DecodedValue::Text("1d 00:00:01.23".to_string())
        );
        assert_eq!(
            decode(&RawValue::Counter64(u64::MAX)),
            DecodedValue::Text(u64::MAX.to_string())
        );
    }
}

//! # Gatepack
//!
//! The binary envelope modules use to hand messages across the host boundary.
//!
//! ## Philosophy
//!
//! - **Bytes In, Bytes Out**: Keys, values and payload are raw bytes. Text encodings are
//!   the caller's business, applied before `encode` and after `decode`.
//! - **Loud Failures**: Every malformed input is reported as an `Error`. There is no
//!   half-decoded message.
//! - **Bounded**: Decoding is a single forward pass over a borrowed slice and never
//!   reads past its end.
//!
//! ## Format
//!
//! ```text
//! [0xA1][0x60][Total: 4b][Count: 4b]
//! [Key][0x00][Value][0x00] * Count
//! [PayloadLen: 4b][Payload: PayloadLen]
//! ```
//!
//! All integers are Big-Endian. `Total` covers the whole encoding, header included.

use std::collections::BTreeMap;
use std::fmt;


/// The two leading bytes of every encoded message.
pub const MAGIC: [u8; 2] = [0xA1, 0x60];

/// Magic plus the total length field.
pub const HEADER_LEN: usize = 6;

/// Largest length any field (or the whole encoding) may declare.
pub const MAX_LEN: usize = i32::MAX as usize;

/// Field terminator inside the property section.
const TERMINATOR: u8 = 0x00;

/// Names the part of the encoding a decode failure was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Magic,
    TotalLength,
    PropertyCount,
    Key,
    Value,
    PayloadLength,
    Payload,
}

/// Why a byte sequence is not a valid message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// Fewer than `HEADER_LEN` bytes were supplied.
    TooShort(usize),
    /// The first two bytes are not `MAGIC`.
    BadMagic([u8; 2]),
    /// A fixed-size read ran past the end of the input.
    UnexpectedEnd { field: Field, needed: usize, remaining: usize },
    /// Input ended before the terminator of a key or value.
    Unterminated(Field),
    /// A length or count field exceeds `MAX_LEN`.
    Oversized { field: Field, len: u32 },
    /// The same key appeared twice.
    DuplicateKey(Vec<u8>),
    /// Declared total length differs from the bytes actually consumed.
    LengthMismatch { declared: u32, actual: usize },
    /// Bytes remain after the payload.
    TrailingBytes(usize),
}

/// Gatepack encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A property key or value contains the 0x00 terminator.
    InvalidProperty { key: Vec<u8> },
    /// The input could not be decoded.
    MalformedMessage(Malformed),
    /// The encoding would exceed `MAX_LEN` bytes.
    TooLarge(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidProperty { key } => {
                write!(f, "Invalid property {:?}: key or value contains a 0x00 byte", String::from_utf8_lossy(key))
            }
            Error::MalformedMessage(Malformed::BadMagic(b)) => {
                write!(f, "Malformed message: bad magic {:#04x} {:#04x}", b[0], b[1])
            }
            Error::MalformedMessage(Malformed::LengthMismatch { declared, actual }) => {
                write!(f, "Malformed message: declared length {} but consumed {}", declared, actual)
            }
            Error::MalformedMessage(m) => write!(f, "Malformed message: {:?}", m),
            Error::TooLarge(len) => write!(f, "Encoded message too large: {} bytes", len),
        }
    }
}

impl std::error::Error for Error {}

impl From<Malformed> for Error {
    fn from(m: Malformed) -> Self {
        Error::MalformedMessage(m)
    }
}

/// Specialized `Result` for Gatepack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Property mapping of a message. Encoded in ascending key order.
pub type Properties = BTreeMap<Vec<u8>, Vec<u8>>;

/// How `decode_with` treats the `Total` header field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// `Total` must equal the consumed byte count, nothing may follow the payload,
    /// and keys must be unique.
    #[default]
    Strict,
    /// `Total` and trailing bytes are ignored; a repeated key keeps its last value.
    Lenient,
}

/// The unit of exchange between modules: a payload plus key/value properties.
///
/// Immutable once built. Equality compares the payload bytes and the property set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    properties: Properties,
    payload: Vec<u8>,
}

impl Message {
    /// Builds a message from a payload and any iterable of key/value pairs.
    pub fn new<P, I, K, V>(payload: P, properties: I) -> Self
    where
        P: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        Self {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            payload: payload.into(),
        }
    }

    /// Builds a message with no properties.
    pub fn from_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self { properties: Properties::new(), payload: payload.into() }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.properties.get(key.as_ref()).map(Vec::as_slice)
    }

    /// Looks up a property and views it as UTF-8.
    pub fn property_str(&self, key: impl AsRef<[u8]>) -> Option<&str> {
        self.property(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn into_parts(self) -> (Properties, Vec<u8>) {
        (self.properties, self.payload)
    }

    /// Exact length of `encode(self)`.
    pub fn encoded_len(&self) -> usize {
        let props: usize = self.properties.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
        HEADER_LEN + 4 + props + 4 + self.payload.len()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Content: {}", String::from_utf8_lossy(&self.payload))?;
        write!(f, "Properties: {{")?;
        for (i, (k, v)) in self.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", String::from_utf8_lossy(k), String::from_utf8_lossy(v))?;
        }
        write!(f, "}}")
    }
}

/// Encodes a message into its wire form.
///
/// # Errors
/// - `Error::InvalidProperty` if any key or value contains 0x00.
/// - `Error::TooLarge` if the encoding would exceed `MAX_LEN`.
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let total = message.encoded_len();
    if total > MAX_LEN {
        return Err(Error::TooLarge(total));
    }

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&[0, 0, 0, 0]); // Total placeholder

    write_u32(&mut buf, message.properties.len() as u32);
    for (key, value) in &message.properties {
        if key.contains(&TERMINATOR) || value.contains(&TERMINATOR) {
            return Err(Error::InvalidProperty { key: key.clone() });
        }
        buf.extend_from_slice(key);
        buf.push(TERMINATOR);
        buf.extend_from_slice(value);
        buf.push(TERMINATOR);
    }

    write_u32(&mut buf, message.payload.len() as u32);
    buf.extend_from_slice(&message.payload);

    let len_bytes = (buf.len() as u32).to_be_bytes();
    buf[2..HEADER_LEN].copy_from_slice(&len_bytes);
    Ok(buf)
}

/// Decodes a message with `LengthPolicy::Strict`.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    decode_with(bytes, LengthPolicy::Strict)
}

/// Decodes a message from its wire form.
///
/// An encoding with zero properties always yields an empty `Properties` map.
///
/// # Errors
/// Returns `Error::MalformedMessage` on short input, wrong magic, any read past the
/// end, a missing terminator, or (under `Strict`) a total length, trailing byte or
/// duplicate key violation.
pub fn decode_with(bytes: &[u8], policy: LengthPolicy) -> Result<Message> {
    if bytes.len() < HEADER_LEN {
        return Err(Malformed::TooShort(bytes.len()).into());
    }

    let mut reader = Reader::new(bytes);
    let magic = reader.read_bytes(2, Field::Magic)?;
    if magic != &MAGIC[..] {
        return Err(Malformed::BadMagic([magic[0], magic[1]]).into());
    }
    let declared = reader.read_u32(Field::TotalLength)?;

    let count = reader.read_len(Field::PropertyCount)?;
    let mut properties = Properties::new();
    for _ in 0..count {
        let key = reader.read_terminated(Field::Key)?;
        let value = reader.read_terminated(Field::Value)?;
        let previous = properties.insert(key.to_vec(), value.to_vec());
        if previous.is_some() && policy == LengthPolicy::Strict {
            return Err(Malformed::DuplicateKey(key.to_vec()).into());
        }
    }

    let payload_len = reader.read_len(Field::PayloadLength)?;
    let payload = reader.read_bytes(payload_len, Field::Payload)?.to_vec();

    if policy == LengthPolicy::Strict {
        if declared as usize != reader.consumed {
            return Err(Malformed::LengthMismatch { declared, actual: reader.consumed }.into());
        }
        if reader.remaining() > 0 {
            return Err(Malformed::TrailingBytes(reader.remaining()).into());
        }
    }

    Ok(Message { properties, payload })
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Bounds-checked forward cursor. Reading shrinks the view.
struct Reader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn read_bytes(&mut self, n: usize, field: Field) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Malformed::UnexpectedEnd { field, needed: n, remaining: self.buf.len() }.into());
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        self.consumed += n;
        Ok(head)
    }

    fn read_u32(&mut self, field: Field) -> Result<u32> {
        let bytes = self.read_bytes(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a length or count and rejects values above `MAX_LEN`.
    fn read_len(&mut self, field: Field) -> Result<usize> {
        let len = self.read_u32(field)?;
        if len as usize > MAX_LEN {
            return Err(Malformed::Oversized { field, len }.into());
        }
        Ok(len as usize)
    }

    /// Reads up to the next 0x00 and consumes the terminator.
    fn read_terminated(&mut self, field: Field) -> Result<&'a [u8]> {
        let Some(end) = self.buf.iter().position(|&b| b == TERMINATOR) else {
            return Err(Malformed::Unterminated(field).into());
        };
        let (head, tail) = self.buf.split_at(end);
        self.buf = &tail[1..];
        self.consumed += end + 1;
        Ok(head)
    }
}

// Codec primitives for the blastbots wire format.
//
// Both channels (TCP server link, UDP GUI link) share one encoding: all
// multi-byte integers are big-endian, a string is a one-byte length prefix
// followed by that many raw bytes, a list is a four-byte count followed by
// its elements, and a map is a four-byte count followed by (key, value)
// pairs in ascending key order. Everything here operates on plain
// `Read`/`Write` streams so the same functions serve buffered TCP streams,
// in-memory datagram buffers, and `Cursor`s in tests.
//
// Strings carry opaque bytes — no UTF-8 validation is performed in either
// direction. `ByteString` is the carrier type and enforces the 255-byte
// limit at construction, so encoding a value that already exists cannot
// fail on length.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Read, Write};

use thiserror::Error;

/// Errors surfaced while encoding or decoding wire data.
///
/// On the TCP channel every variant is fatal to the connection; on the
/// inbound UDP channel malformed datagrams are dropped before this type
/// ever comes into play (see `gui::InputMessage::decode`).
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown {what} tag {tag}")]
    UnknownTag { what: &'static str, tag: u8 },
    #[error("string too long: {0} bytes (max 255)")]
    StringTooLong(usize),
    #[error("datagram too large: {0} bytes (max {max})", max = crate::gui::MAX_DATAGRAM)]
    DatagramTooLarge(usize),
}

/// A value with a symmetric wire representation.
pub trait Wire: Sized {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError>;
    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError>;
}

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8, WireError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16<R: Read>(r: &mut R) -> Result<u16, WireError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32, WireError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u8<W: Write>(w: &mut W, val: u8) -> Result<(), WireError> {
    w.write_all(&[val])?;
    Ok(())
}

pub fn write_u16<W: Write>(w: &mut W, val: u16) -> Result<(), WireError> {
    w.write_all(&val.to_be_bytes())?;
    Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, val: u32) -> Result<(), WireError> {
    w.write_all(&val.to_be_bytes())?;
    Ok(())
}

/// Read a `u32`-prefixed list of `T`.
pub fn read_list<T: Wire, R: Read>(r: &mut R) -> Result<Vec<T>, WireError> {
    let len = read_u32(r)?;
    let mut items = Vec::new();
    for _ in 0..len {
        items.push(T::read_from(r)?);
    }
    Ok(items)
}

/// Write a `u32`-prefixed list of `T`.
pub fn write_list<T: Wire, W: Write>(w: &mut W, items: &[T]) -> Result<(), WireError> {
    #[expect(clippy::cast_possible_truncation)]
    let len = items.len() as u32;
    write_u32(w, len)?;
    for item in items {
        item.write_to(w)?;
    }
    Ok(())
}

/// Write a set as a `u32`-prefixed list in ascending order.
pub fn write_set<T: Wire, W: Write>(w: &mut W, items: &BTreeSet<T>) -> Result<(), WireError> {
    #[expect(clippy::cast_possible_truncation)]
    let len = items.len() as u32;
    write_u32(w, len)?;
    for item in items {
        item.write_to(w)?;
    }
    Ok(())
}

/// Read a `u32`-prefixed map of (K, V) pairs.
pub fn read_map<K, V, R>(r: &mut R) -> Result<BTreeMap<K, V>, WireError>
where
    K: Wire + Ord,
    V: Wire,
    R: Read,
{
    let len = read_u32(r)?;
    let mut map = BTreeMap::new();
    for _ in 0..len {
        let key = K::read_from(r)?;
        let value = V::read_from(r)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Write a map as a `u32`-prefixed sequence of (key, value) pairs in
/// ascending key order.
pub fn write_map<K, V, W>(w: &mut W, map: &BTreeMap<K, V>) -> Result<(), WireError>
where
    K: Wire,
    V: Wire,
    W: Write,
{
    #[expect(clippy::cast_possible_truncation)]
    let len = map.len() as u32;
    write_u32(w, len)?;
    for (key, value) in map {
        key.write_to(w)?;
        value.write_to(w)?;
    }
    Ok(())
}

/// A length-prefixed byte string: at most 255 opaque bytes.
///
/// Player names, server names, and rendered peer addresses all travel in
/// this shape. The bytes are not required to be UTF-8; `Display` renders
/// them lossily for logs only.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    pub fn new(bytes: Vec<u8>) -> Result<Self, WireError> {
        if bytes.len() > usize::from(u8::MAX) {
            return Err(WireError::StringTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&str> for ByteString {
    type Error = WireError;

    fn try_from(s: &str) -> Result<Self, WireError> {
        Self::new(s.as_bytes().to_vec())
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Wire for ByteString {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let len = read_u8(r)?;
        let mut bytes = vec![0u8; usize::from(len)];
        r.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        #[expect(clippy::cast_possible_truncation)]
        let len = self.0.len() as u8;
        write_u8(w, len)?;
        w.write_all(&self.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0x0102).unwrap();
        write_u32(&mut buf, 0x0304_0506).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        let mut cursor = Cursor::new(&buf);
        assert_eq!(read_u16(&mut cursor).unwrap(), 0x0102);
        assert_eq!(read_u32(&mut cursor).unwrap(), 0x0304_0506);
    }

    #[test]
    fn string_roundtrip() {
        let s = ByteString::try_from("robot").unwrap();
        let mut buf = Vec::new();
        s.write_to(&mut buf).unwrap();
        assert_eq!(buf, [5, b'r', b'o', b'b', b'o', b't']);

        let recovered = ByteString::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(recovered, s);
    }

    #[test]
    fn empty_string_roundtrip() {
        let s = ByteString::default();
        let mut buf = Vec::new();
        s.write_to(&mut buf).unwrap();
        assert_eq!(buf, [0]);
        assert_eq!(ByteString::read_from(&mut Cursor::new(&buf)).unwrap(), s);
    }

    #[test]
    fn max_length_string_roundtrip() {
        let s = ByteString::new(vec![b'x'; 255]).unwrap();
        let mut buf = Vec::new();
        s.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 256);
        assert_eq!(ByteString::read_from(&mut Cursor::new(&buf)).unwrap(), s);
    }

    #[test]
    fn oversize_string_rejected() {
        let err = ByteString::new(vec![0u8; 256]).unwrap_err();
        assert!(matches!(err, WireError::StringTooLong(256)));
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        let s = ByteString::new(vec![0xFF, 0xFE, 0x00]).unwrap();
        let mut buf = Vec::new();
        s.write_to(&mut buf).unwrap();
        let recovered = ByteString::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(recovered.as_bytes(), &[0xFF, 0xFE, 0x00]);
    }

    #[test]
    fn short_read_is_eof() {
        // Length prefix promises 4 bytes, only 2 follow.
        let buf = [4u8, b'a', b'b'];
        let err = ByteString::read_from(&mut Cursor::new(&buf[..])).unwrap_err();
        match err {
            WireError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}

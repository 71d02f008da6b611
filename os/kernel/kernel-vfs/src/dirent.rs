//! # Directory Listing Records
//!
//! `getdents` packs one variable-length record per child into the caller's
//! buffer:
//!
//! ```text
//! offset  size  field
//!      0     4  node type (u32, little endian)
//!      4     4  reserved, zero
//!      8     8  record length in bytes, header included (u64, little endian)
//!     16     n  name bytes
//!   16+n     1  NUL
//!      …        zero padding up to the next multiple of 8
//! ```
//!
//! The record length lets a reader step to the next record without scanning
//! for the terminator. [`DirentIter`] walks a filled buffer.

use crate::node::NodeType;

const HEADER_LEN: usize = 16;
const RECORD_ALIGN: usize = 8;

/// Total size of the record for a name of `name_len` bytes.
#[must_use]
pub const fn record_len(name_len: usize) -> usize {
    (HEADER_LEN + name_len + 1).next_multiple_of(RECORD_ALIGN)
}

/// Writes one record at the start of `buf`.
///
/// Returns the record length, or `None` if `buf` is too small.
pub fn encode(buf: &mut [u8], kind: NodeType, name: &str) -> Option<usize> {
    let len = record_len(name.len());
    let record = buf.get_mut(..len)?;
    record.fill(0);
    record[0..4].copy_from_slice(&kind.as_raw().to_le_bytes());
    record[8..16].copy_from_slice(&(len as u64).to_le_bytes());
    record[HEADER_LEN..HEADER_LEN + name.len()].copy_from_slice(name.as_bytes());
    Some(len)
}

/// One decoded listing record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dirent<'a> {
    pub kind: NodeType,
    pub name: &'a str,
}

/// Iterates the first `count` records of a `getdents` buffer.
///
/// Stops early at the first malformed record.
pub struct DirentIter<'a> {
    buf: &'a [u8],
    remaining: usize,
}

impl<'a> DirentIter<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8], count: usize) -> Self {
        Self {
            buf,
            remaining: count,
        }
    }

    fn decode(&self) -> Option<(Dirent<'a>, usize)> {
        let buf = self.buf;
        let header = buf.get(..HEADER_LEN)?;
        let kind = NodeType::from_raw(u32::from_le_bytes(header[0..4].try_into().ok()?))?;
        let len = usize::try_from(u64::from_le_bytes(header[8..16].try_into().ok()?)).ok()?;
        let record = buf.get(..len).filter(|_| len > HEADER_LEN)?;
        let body = &record[HEADER_LEN..];
        let name_len = body.iter().position(|&b| b == 0)?;
        let name = core::str::from_utf8(&body[..name_len]).ok()?;
        Some((Dirent { kind, name }, len))
    }
}

impl<'a> Iterator for DirentIter<'a> {
    type Item = Dirent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let Some((dirent, len)) = self.decode() else {
            self.remaining = 0;
            return None;
        };
        self.buf = &self.buf[len..];
        self.remaining -= 1;
        Some(dirent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_padded_to_eight_bytes() {
        assert_eq!(record_len(0), 24);
        assert_eq!(record_len(7), 24);
        assert_eq!(record_len(8), 32);
    }

    #[test]
    fn encoded_layout() {
        let mut buf = [0xAAu8; 32];
        assert_eq!(encode(&mut buf, NodeType::Folder, "mnt"), Some(24));
        assert_eq!(&buf[0..4], &1u32.to_le_bytes());
        assert_eq!(&buf[4..8], &[0; 4]);
        assert_eq!(&buf[8..16], &24u64.to_le_bytes());
        assert_eq!(&buf[16..20], b"mnt\0");
        assert_eq!(&buf[20..24], &[0; 4]);
        assert_eq!(&buf[24..], &[0xAA; 8]);
    }

    #[test]
    fn too_small_buffers_are_untouched() {
        let mut buf = [0xAAu8; 23];
        assert_eq!(encode(&mut buf, NodeType::File, "a"), None);
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn iterator_walks_records_by_length() {
        let mut buf = [0u8; 128];
        let mut at = 0;
        for (kind, name) in [(NodeType::File, "c"), (NodeType::Link, "bee-with-long-name")] {
            at += encode(&mut buf[at..], kind, name).unwrap();
        }
        let all: Vec<_> = DirentIter::new(&buf, 2).collect();
        assert_eq!(
            all,
            [
                Dirent { kind: NodeType::File, name: "c" },
                Dirent { kind: NodeType::Link, name: "bee-with-long-name" },
            ]
        );
        assert_eq!(DirentIter::new(&buf, 1).count(), 1);
        // The zeroed tail decodes as a malformed record and ends iteration.
        assert_eq!(DirentIter::new(&buf, 5).count(), 2);
    }
}

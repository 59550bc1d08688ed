//! Traits used by the rankdb library.
//!

use std::fmt::{Debug, Display};

use bytes::{Buf, BufMut};
use ndarray::Array2;
use num_traits::PrimInt;

use crate::rankings::{RankWidth, Rankings};

/// The [`RankValue`] trait defines the integer types rankings can be decoded
/// into. Only signed types implement it: ranking databases are written with
/// signed integers so they read back identically on every platform.
///
/// Each implementation ties a Rust integer type to its [`RankWidth`] tag, so
/// generic decode code is monomorphized once per width and the runtime
/// choice happens in exactly one `match` on the width.
pub trait RankValue: PrimInt + Default + Debug + Display + Send + Sync + 'static {
    /// The width tag this type decodes.
    const WIDTH: RankWidth;

    /// Read one little-endian value from the front of `buf`, advancing it.
    ///
    /// # Panics
    /// Panics if fewer than `Self::WIDTH.bytes()` bytes remain; callers
    /// check the blob length first.
    fn read_le(buf: &mut &[u8]) -> Self;

    /// Append this value to `buf` in little-endian byte order.
    fn write_le(self, buf: &mut Vec<u8>);

    /// Wrap a decoded matrix into the width-tagged [`Rankings`] container.
    fn into_rankings(matrix: Array2<Self>) -> Rankings;
}

impl RankValue for i16 {
    const WIDTH: RankWidth = RankWidth::Int16;

    fn read_le(buf: &mut &[u8]) -> Self {
        buf.get_i16_le()
    }

    fn write_le(self, buf: &mut Vec<u8>) {
        buf.put_i16_le(self)
    }

    fn into_rankings(matrix: Array2<Self>) -> Rankings {
        Rankings::Int16(matrix)
    }
}

impl RankValue for i32 {
    const WIDTH: RankWidth = RankWidth::Int32;

    fn read_le(buf: &mut &[u8]) -> Self {
        buf.get_i32_le()
    }

    fn write_le(self, buf: &mut Vec<u8>) {
        buf.put_i32_le(self)
    }

    fn into_rankings(matrix: Array2<Self>) -> Rankings {
        Rankings::Int32(matrix)
    }
}

/// Defines how to serialize something to TSV.
pub trait TsvSerialize {
    // Serialize something to a TSV [`String`].
    fn to_tsv(&self) -> String;
}

impl TsvSerialize for String {
    fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl TsvSerialize for i32 {
    fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl<U: TsvSerialize> TsvSerialize for Vec<U> {
    fn to_tsv(&self) -> String {
        self.iter()
            .map(|x| x.to_tsv())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

impl<U: TsvSerialize> TsvSerialize for &[U] {
    fn to_tsv(&self) -> String {
        self.iter()
            .map(|x| x.to_tsv())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_little_endian() {
        let mut buf = Vec::new();
        258i16.write_le(&mut buf);
        (-2i16).write_le(&mut buf);
        assert_eq!(buf, vec![0x02, 0x01, 0xfe, 0xff]);

        let mut view = buf.as_slice();
        assert_eq!(i16::read_le(&mut view), 258);
        assert_eq!(i16::read_le(&mut view), -2);
        assert!(view.is_empty());
    }

    #[test]
    fn test_i32_little_endian() {
        let mut buf = Vec::new();
        70_000i32.write_le(&mut buf);
        assert_eq!(buf, vec![0x70, 0x11, 0x01, 0x00]);
        let mut view = buf.as_slice();
        assert_eq!(i32::read_le(&mut view), 70_000);
    }

    #[test]
    fn test_width_tags() {
        assert_eq!(i16::WIDTH, RankWidth::Int16);
        assert_eq!(i32::WIDTH, RankWidth::Int32);
    }

    #[test]
    fn test_vec_to_tsv() {
        let row = vec!["f1".to_string(), "3".to_string()];
        assert_eq!(row.to_tsv(), "f1\t3");
    }
}

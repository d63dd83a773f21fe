//! Little-endian cursor over a datagram
//!
//! Every read is bounds checked; running off the end yields
//! [`PacketError::Truncated`] naming the value being read.

use crate::PacketError;

/// Sequential little-endian reader over a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `offset` instead of the beginning
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    /// Current offset into the datagram
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], PacketError> {
        let end = self.pos + N;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(PacketError::Truncated { what, offset: self.pos })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, PacketError> {
        self.take::<1>("u8").map(|b| b[0])
    }

    #[inline]
    pub fn i8(&mut self) -> Result<i8, PacketError> {
        self.take::<1>("i8").map(|b| b[0] as i8)
    }

    #[inline]
    pub fn u16(&mut self) -> Result<u16, PacketError> {
        self.take("u16").map(u16::from_le_bytes)
    }

    #[inline]
    pub fn i16(&mut self) -> Result<i16, PacketError> {
        self.take("i16").map(i16::from_le_bytes)
    }

    #[inline]
    pub fn u32(&mut self) -> Result<u32, PacketError> {
        self.take("u32").map(u32::from_le_bytes)
    }

    #[inline]
    pub fn u64(&mut self) -> Result<u64, PacketError> {
        self.take("u64").map(u64::from_le_bytes)
    }

    #[inline]
    pub fn f32(&mut self) -> Result<f32, PacketError> {
        self.take("f32").map(f32::from_le_bytes)
    }

    pub fn bytes<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        self.take("byte array")
    }

    /// Four per-wheel `f32` values in RL, RR, FL, FR order
    pub fn f32_x4(&mut self) -> Result<[f32; 4], PacketError> {
        Ok([self.f32()?, self.f32()?, self.f32()?, self.f32()?])
    }

    pub fn u16_x4(&mut self) -> Result<[u16; 4], PacketError> {
        Ok([self.u16()?, self.u16()?, self.u16()?, self.u16()?])
    }

    pub fn u8_x4(&mut self) -> Result<[u8; 4], PacketError> {
        self.take("u8 array")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_values() {
        let mut data = Vec::new();
        data.extend_from_slice(&2019u16.to_le_bytes());
        data.push(0xFF);
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&0xDEAD_BEEF_0000_0001u64.to_le_bytes());

        let mut r = ByteReader::new(&data);
        assert_eq!(r.u16().unwrap(), 2019);
        assert_eq!(r.i8().unwrap(), -1);
        assert_eq!(r.f32().unwrap(), 1.5);
        assert_eq!(r.u64().unwrap(), 0xDEAD_BEEF_0000_0001);
        assert_eq!(r.position(), data.len());
    }

    #[test]
    fn reports_truncation_offset() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::at(&data, 1);
        let err = r.u32().unwrap_err();
        assert_eq!(err, PacketError::Truncated { what: "u32", offset: 1 });
    }
}

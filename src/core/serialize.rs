//! Binary encoding of target lists embedded in precompiled images.
//!
//! The payload is self-describing: the feature-word count travels with the
//! data and decoding rejects any payload whose declared width differs from
//! the consuming process's configured width. No partial interpretation is
//! attempted. Layout, all integers little-endian u32:
//!
//! ```text
//! word_count, entry_count,
//! per entry:
//!   name_len, name bytes,
//!   ext_len, ext bytes,
//!   word_count enabled words,
//!   word_count disabled words,
//!   flags, base
//! ```

use crate::core::bitset::FeatureVector;
use crate::core::error::DecodeError;
use crate::core::target::{TargetData, TargetFlags};

/// Encode a target list.
pub fn serialize_targets<const N: usize>(targets: &[TargetData<N>]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, N as u32);
    put_u32(&mut out, targets.len() as u32);
    for target in targets {
        put_bytes(&mut out, target.name.as_bytes());
        put_bytes(&mut out, target.ext_features.as_bytes());
        for &word in target.enabled.words() {
            put_u32(&mut out, word);
        }
        for &word in target.disabled.words() {
            put_u32(&mut out, word);
        }
        put_u32(&mut out, target.flags.bits());
        put_u32(&mut out, target.base as u32);
    }
    out
}

/// Decode a target list, verifying width, string validity, the base-index
/// forest invariant and the absence of trailing bytes.
pub fn deserialize_targets<const N: usize>(bytes: &[u8]) -> Result<Vec<TargetData<N>>, DecodeError> {
    let mut reader = Reader { bytes, offset: 0 };
    let width = reader.u32()?;
    if width != N as u32 {
        return Err(DecodeError::WidthMismatch {
            expected: N as u32,
            found: width,
        });
    }
    let count = reader.u32()? as usize;
    let mut targets = Vec::with_capacity(count);
    for index in 0..count {
        let name = reader.string(index)?;
        let ext_features = reader.string(index)?;
        let enabled = reader.vector::<N>()?;
        let disabled = reader.vector::<N>()?;
        let flags = TargetFlags::from_bits_retain(reader.u32()?);
        let base = reader.u32()?;
        if (index == 0 && base != 0) || (index > 0 && base as usize >= index) {
            return Err(DecodeError::InvalidBase { index, base });
        }
        targets.push(TargetData {
            name,
            enabled,
            disabled,
            ext_features,
            flags,
            base: base as usize,
        });
    }
    if reader.offset != bytes.len() {
        return Err(DecodeError::TrailingBytes {
            len: bytes.len() - reader.offset,
        });
    }
    Ok(targets)
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn u32(&mut self) -> Result<u32, DecodeError> {
        let end = self.offset + 4;
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
            });
        }
        let value = u32::from_le_bytes(self.bytes[self.offset..end].try_into().unwrap());
        self.offset = end;
        Ok(value)
    }

    fn string(&mut self, index: usize) -> Result<String, DecodeError> {
        let len = self.u32()? as usize;
        let end = self.offset.checked_add(len).filter(|&e| e <= self.bytes.len());
        let Some(end) = end else {
            return Err(DecodeError::Truncated {
                offset: self.offset,
            });
        };
        let s = std::str::from_utf8(&self.bytes[self.offset..end])
            .map_err(|_| DecodeError::InvalidName { index })?;
        self.offset = end;
        Ok(s.to_string())
    }

    fn vector<const N: usize>(&mut self) -> Result<FeatureVector<N>, DecodeError> {
        let mut words = [0u32; N];
        for word in &mut words {
            *word = self.u32()?;
        }
        Ok(FeatureVector::from_words(words))
    }
}

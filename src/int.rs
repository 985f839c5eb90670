//! The canonical integer encoder.
//!
//! DER demands that an INTEGER is encoded in the smallest number of octets
//! that still carries its sign: a leading `0x00` is redundant unless the
//! next octet has its top bit set, a leading `0xFF` is redundant unless the
//! next octet has its top bit clear. The trimming function here is the one
//! place this rule lives; the value writer, the DEFAULT comparison, and
//! named-constant resolution all go through it.

use smallvec::SmallVec;
use crate::error::Error;
use crate::xerr;

/// The scratch buffer for canonical integers.
///
/// Eight octets cover the full `i64` range, so conversions from text never
/// spill to the heap.
pub type IntBuf = SmallVec<[u8; 8]>;

/// Returns the minimal two's-complement suffix of `buf`.
///
/// `buf` must be a big-endian two's-complement encoding with at least one
/// octet. The returned subslice encodes the same integer with every
/// redundant sign-extension octet stripped.
pub fn min_twos_complement(buf: &[u8]) -> &[u8] {
    assert!(!buf.is_empty());
    let negative = buf[0] & 0x80 != 0;
    let mut k = 0;
    while k < buf.len() - 1 {
        let redundant = if negative {
            buf[k] == 0xFF
        }
        else {
            buf[k] == 0
        };
        if !redundant {
            break
        }
        k += 1;
    }
    // Stripping must not flip the sign: keep one extension octet if the
    // next octet's top bit disagrees.
    if (buf[k] & 0x80 != 0) != negative {
        k -= 1;
    }
    &buf[k..]
}

/// Converts decimal text into the minimal two's-complement encoding.
///
/// The text is parsed as a signed 64-bit integer; values beyond that range
/// saturate at the range ends. Fails with [`Error::ValueNotValid`] if the
/// text is not a decimal number at all.
pub fn convert_integer(text: &str) -> Result<IntBuf, Error> {
    let value = parse_clamped(text)?;
    let bytes = value.to_be_bytes();
    Ok(SmallVec::from_slice(min_twos_complement(&bytes)))
}

/// Parses decimal text, saturating at the `i64` range ends.
fn parse_clamped(text: &str) -> Result<i64, Error> {
    match text.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) => {
            // Distinguish overflow from garbage.
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text.strip_prefix('+').unwrap_or(text)),
            };
            if digits.is_empty()
                || !digits.bytes().all(|ch| ch.is_ascii_digit())
            {
                xerr!(return Err(Error::ValueNotValid))
            }
            if negative {
                Ok(i64::MIN)
            }
            else {
                Ok(i64::MAX)
            }
        }
    }
}


//============ Tests =========================================================

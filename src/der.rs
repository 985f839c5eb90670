//! The DER primitive codecs.
//!
//! This module provides the byte-level building blocks of DER: the length
//! octets, the length-prefixed octet string, and the bit string with its
//! unused-bit header. The encoders append to a `Vec<u8>`; the decoders work
//! on a byte slice and fill a caller buffer, reporting the exact required
//! size through [`Error::Capacity`] when that buffer is too small.
//!
//! DER, unlike BER, leaves the encoder no freedom: the decoders reject any
//! length field that is not in its minimal form as malformed.

use crate::error::Error;
use crate::xerr;


//------------ Length octets -------------------------------------------------

/// Appends the DER encoding of a length to `target`.
///
/// Lengths below 128 use the short form, a single octet. All other lengths
/// use the long form: an initial octet of `0x80 | n` followed by the `n`
/// big-endian octets of the length, with `n` minimal.
pub fn length_der(len: usize, target: &mut Vec<u8>) {
    if len < 0x80 {
        target.push(len as u8);
    }
    else {
        let bytes = len.to_be_bytes();
        let idx = (len.leading_zeros() / 8) as usize;
        target.push(0x80 | (bytes.len() - idx) as u8);
        target.extend_from_slice(&bytes[idx..]);
    }
}

/// Returns the number of octets [`length_der`] produces for `len`.
pub fn length_der_len(len: usize) -> usize {
    if len < 0x80 {
        1
    }
    else {
        let idx = (len.leading_zeros() / 8) as usize;
        1 + std::mem::size_of::<usize>() - idx
    }
}

/// Parses DER length octets from the start of `der`.
///
/// Returns the decoded length and the number of octets the length field
/// occupies. Fails with [`Error::Der`] on a truncated field, on the
/// indefinite form, on the reserved initial octet `0xFF`, and on any
/// non-minimal encoding. Fails with [`Error::DerOverflow`] if the length
/// does not fit a `usize`.
pub fn get_length_der(der: &[u8]) -> Result<(usize, usize), Error> {
    let first = match der.first() {
        Some(&first) => first,
        None => xerr!(return Err(Error::Der)),
    };
    if first < 0x80 {
        return Ok((first as usize, 1))
    }
    if first == 0x80 || first == 0xFF {
        // Indefinite form and the reserved octet. Neither exists in DER.
        xerr!(return Err(Error::Der))
    }
    let count = (first & 0x7F) as usize;
    let tail = match der.get(1..1 + count) {
        Some(tail) => tail,
        None => xerr!(return Err(Error::Der)),
    };
    // Minimal form: no leading zero octet, and the long form must not
    // encode a length the short form could.
    if tail[0] == 0 || (count == 1 && tail[0] < 0x80) {
        xerr!(return Err(Error::Der))
    }
    if count > std::mem::size_of::<usize>() {
        xerr!(return Err(Error::DerOverflow))
    }
    let mut len = 0usize;
    for &octet in tail {
        len = (len << 8) | octet as usize;
    }
    Ok((len, 1 + count))
}


//------------ Octet strings -------------------------------------------------

/// Appends the DER content of an octet string to `target`.
///
/// This is the length octets for `data.len()` followed by `data` itself.
/// The tag octet is not included; it depends on the effective tag of the
/// element the content belongs to.
pub fn octet_der(data: &[u8], target: &mut Vec<u8>) {
    length_der(data.len(), target);
    target.extend_from_slice(data);
}

/// Parses a length-prefixed octet string from the start of `der` into `dst`.
///
/// Returns the number of bytes written to `dst` and the number of bytes
/// consumed from `der`. If `dst` is too small, fails with
/// [`Error::Capacity`] carrying the required size and leaves `dst`
/// untouched.
pub fn get_octet_der(der: &[u8], dst: &mut [u8]) -> Result<(usize, usize), Error> {
    let (len, hdr) = get_length_der(der)?;
    let data = match der.get(hdr..hdr + len) {
        Some(data) => data,
        None => xerr!(return Err(Error::Der)),
    };
    let dst = match dst.get_mut(..len) {
        Some(dst) => dst,
        None => return Err(Error::Capacity { required: len }),
    };
    dst.copy_from_slice(data);
    Ok((len, hdr + len))
}


//------------ Bit strings ---------------------------------------------------

/// Appends the DER content of a bit string to `target`.
///
/// The content is the length octets, one octet giving the number of unused
/// bits in the final octet, and the packed bits themselves with the unused
/// bits forced to zero as DER requires.
///
/// # Panics
///
/// Panics if `bits` holds fewer than `bit_len` bits.
pub fn bit_der(bits: &[u8], bit_len: usize, target: &mut Vec<u8>) {
    let octets = bit_len.div_ceil(8);
    let unused = (octets * 8 - bit_len) as u8;
    length_der(octets + 1, target);
    target.push(unused);
    target.extend_from_slice(&bits[..octets]);
    if unused > 0 {
        // Zero the unused bits of the final octet.
        let last = target.last_mut().unwrap();
        *last &= !((1u8 << unused) - 1);
    }
}

/// Parses a bit string from the start of `der` into `dst`.
///
/// Returns the number of significant bits and the number of bytes consumed
/// from `der`. The octets are copied into `dst` with the bits
/// left-justified. If `dst` is too small for the packed octets, fails with
/// [`Error::Capacity`] carrying the required size in bytes.
pub fn get_bit_der(der: &[u8], dst: &mut [u8]) -> Result<(usize, usize), Error> {
    let (len, hdr) = get_length_der(der)?;
    if len == 0 {
        // The unused-bit octet is always present.
        xerr!(return Err(Error::Der))
    }
    let unused = match der.get(hdr) {
        Some(&unused) if unused < 8 => unused as usize,
        Some(_) => xerr!(return Err(Error::Der)),
        None => xerr!(return Err(Error::Der)),
    };
    let octets = len - 1;
    if octets == 0 && unused != 0 {
        xerr!(return Err(Error::Der))
    }
    let data = match der.get(hdr + 1..hdr + len) {
        Some(data) => data,
        None => xerr!(return Err(Error::Der)),
    };
    let dst = match dst.get_mut(..octets) {
        Some(dst) => dst,
        None => return Err(Error::Capacity { required: octets }),
    };
    dst.copy_from_slice(data);
    Ok((octets * 8 - unused, hdr + len))
}


//============ Tests =========================================================

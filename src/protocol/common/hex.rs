use num_traits::{CheckedAdd, CheckedMul, FromPrimitive, Zero};

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeHexError {
    InvalidHexDigit,
    Empty,
    Overflow,
    InvalidOutput,
}

/// Decode a GDB hex string into the specified integer.
pub fn decode_hex<I>(buf: &[u8]) -> Result<I, DecodeHexError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
{
    use DecodeHexError::*;

    let radix = I::from_u8(16).ok_or(InvalidOutput)?;

    if buf.is_empty() {
        return Err(Empty);
    }

    let mut result = I::zero();

    for &digit in buf {
        let x = I::from_u8(ascii2byte(digit).ok_or(InvalidHexDigit)?).ok_or(InvalidOutput)?;
        result = result.checked_mul(&radix).ok_or(Overflow)?;
        result = result.checked_add(&x).ok_or(Overflow)?
    }

    Ok(result)
}

fn ascii2byte(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Check if the byte `c` is a valid hex digit `[0-9][a-f][A-F]`
pub fn is_hex(c: u8) -> bool {
    ascii2byte(c).is_some()
}

/// Convert a nybble into its (lowercase) hex digit.
#[inline]
pub fn nybble_to_hex(nybble: u8) -> u8 {
    HEX_CHARS[(nybble & 0xf) as usize]
}

/// Render a single byte as two lowercase hex digits.
pub fn byte_to_hex(byte: u8) -> [u8; 2] {
    [nybble_to_hex(byte >> 4), nybble_to_hex(byte)]
}

/// Parse two hex digits into a byte.
pub fn hex_to_byte(digits: [u8; 2]) -> Result<u8, DecodeHexError> {
    let hi = ascii2byte(digits[0]).ok_or(DecodeHexError::InvalidHexDigit)?;
    let lo = ascii2byte(digits[1]).ok_or(DecodeHexError::InvalidHexDigit)?;
    Ok(hi << 4 | lo)
}

/// RSP checksum: the 8-bit truncated sum of every payload byte.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |a, x| a.wrapping_add(*x))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeHexBufError {
    SmallBuffer,
}

/// Encode `mem` as a hex string into `buf`, which must be at least
/// `mem.len() * 2` bytes in size.
///
/// Returns the encoded sub-slice of `buf`.
pub fn mem_to_hex<'b>(mem: &[u8], buf: &'b mut [u8]) -> Result<&'b mut [u8], EncodeHexBufError> {
    let encoded_len = mem.len() * 2;
    let out = buf
        .get_mut(..encoded_len)
        .ok_or(EncodeHexBufError::SmallBuffer)?;

    for (chunk, &byte) in out.chunks_exact_mut(2).zip(mem) {
        chunk.copy_from_slice(&byte_to_hex(byte));
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeHexBufError {
    InvalidHexDigit,
    OddLength,
    SmallBuffer,
}

/// Decode the hex string `hex` into `mem`, which must be at least
/// `hex.len() / 2` bytes in size.
///
/// Returns the decoded sub-slice of `mem`.
pub fn hex_to_mem<'b>(hex: &[u8], mem: &'b mut [u8]) -> Result<&'b mut [u8], DecodeHexBufError> {
    if hex.len() % 2 != 0 {
        return Err(DecodeHexBufError::OddLength);
    }

    let out = mem
        .get_mut(..hex.len() / 2)
        .ok_or(DecodeHexBufError::SmallBuffer)?;

    for (byte, digits) in out.iter_mut().zip(hex.chunks_exact(2)) {
        *byte = hex_to_byte([digits[0], digits[1]])
            .map_err(|_| DecodeHexBufError::InvalidHexDigit)?;
    }

    Ok(out)
}

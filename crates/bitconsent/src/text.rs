//! Framing of bit strings as bytes and URL-safe base64 text.
//!
//! Bits are packed MSB-first: bit 0 is the high bit of the first byte. The
//! last byte is right-padded with zeros. Tokens use the URL-safe alphabet
//! (`-` and `_`) without `=` padding.

use base64::{
    Engine,
    alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
        general_purpose::URL_SAFE_NO_PAD,
    },
};
use tracing::debug;

use crate::{bits::pad_right, config::Mode, errors::DecodeError};

/// Accepts either alphabet (after normalisation), any padding and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Number of zero bits that bring `len` up to a byte boundary.
pub fn padding_to_byte(len: usize) -> usize {
    (8 - len % 8) % 8
}

/// Packs a bit string into bytes, right-padding the last byte with zeros.
///
/// Any character other than `'1'` packs as a zero bit.
pub fn pack_bits(bits: &str) -> Vec<u8> {
    let padded = pad_right(bits, padding_to_byte(bits.len()));

    padded
        .as_bytes()
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |byte, bit| (byte << 1) | u8::from(*bit == b'1'))
        })
        .collect()
}

/// Expands bytes into a bit string, eight bits per byte.
pub fn unpack_bytes(bytes: &[u8]) -> String {
    let mut bits = String::with_capacity(bytes.len() * 8);
    for byte in bytes {
        bits.push_str(&format!("{byte:08b}"));
    }

    bits
}

/// Encodes a bit string as an unpadded URL-safe base64 token.
pub fn bits_to_text(bits: &str) -> String {
    let bytes = pack_bits(bits);
    debug!(bits = bits.len(), bytes = bytes.len(), "packing bits");

    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a token back into the bit string, including any padding bits.
///
/// Lenient mode also accepts the standard alphabet and `=` padding, and
/// ignores non-zero trailing bits. Strict mode only accepts canonical
/// unpadded URL-safe tokens.
pub fn text_to_bits(text: &str, mode: Mode) -> Result<String, DecodeError> {
    let bytes = match mode {
        Mode::Strict => URL_SAFE_NO_PAD.decode(text),
        Mode::Lenient => {
            let mut standard: String = text
                .chars()
                .map(|c| match c {
                    '-' => '+',
                    '_' => '/',
                    other => other,
                })
                .collect();
            while standard.len() % 4 != 0 {
                standard.push('=');
            }

            LENIENT.decode(standard)
        }
    }
    .map_err(|e| DecodeError::InvalidText(e.to_string()))?;

    debug!(chars = text.len(), bytes = bytes.len(), "unpacking text");
    Ok(unpack_bytes(&bytes))
}

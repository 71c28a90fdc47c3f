//! Primitive codec: single typed values to and from fixed-width bit strings.
//!
//! A bit string is a sequence of `'0'`/`'1'` characters; bit 0 is the first
//! character. Encoders always return exactly `width` characters. Decoders never
//! fail: a range past the end of the input reads whatever is left, and an
//! empty range reads as 0.

/// Prepends `padding` zero bits.
pub fn pad_left(bits: &str, padding: usize) -> String {
    let mut out = String::with_capacity(bits.len() + padding);
    out.extend(std::iter::repeat_n('0', padding));
    out.push_str(bits);
    out
}

/// Appends `padding` zero bits.
pub fn pad_right(bits: &str, padding: usize) -> String {
    let mut out = String::with_capacity(bits.len() + padding);
    out.push_str(bits);
    out.extend(std::iter::repeat_n('0', padding));
    out
}

/// Returns the `length` bits starting at `start`, clamped to the input.
pub fn slice(bits: &str, start: usize, length: usize) -> &str {
    let start = start.min(bits.len());
    let end = start.saturating_add(length).min(bits.len());
    bits.get(start..end).unwrap_or("")
}

/// True if every character is `'0'` or `'1'`.
pub fn is_bit_string(bits: &str) -> bool {
    bits.bytes().all(|b| b == b'0' || b == b'1')
}

/// Encodes `value` as `width` bits, MSB first.
///
/// Values wider than `width` keep only their leading `width` binary digits:
/// `encode_int(255, 4)` is `"1111"`. This narrowing is silent.
pub fn encode_int(value: u64, width: usize) -> String {
    let binary = format!("{value:b}");

    if binary.len() >= width {
        binary[..width].to_string()
    } else {
        pad_left(&binary, width - binary.len())
    }
}

/// True if `value` survives [`encode_int`] at `width` unchanged.
pub fn fits(value: u64, width: usize) -> bool {
    width >= 64 || value >> width == 0
}

pub fn encode_bool(value: bool) -> String {
    encode_int(u64::from(value), 1)
}

/// Encodes a millisecond timestamp in 100 ms units.
pub fn encode_date(millis: u64, width: usize) -> String {
    encode_int(millis / 100, width)
}

/// Index of `letter` in the alphabet, case-insensitive. Characters before `'A'` map to 0.
pub fn letter_index(letter: char) -> u64 {
    u64::from(letter.to_ascii_uppercase()).saturating_sub(u64::from('A'))
}

/// Encodes `letter` as its alphabet index (`'A'` is 0).
pub fn encode_letter(letter: char, width: usize) -> String {
    encode_int(letter_index(letter), width)
}

/// Encodes a two-letter code, each letter in `width / 2` bits.
///
/// Missing letters encode as zeros.
pub fn encode_language(code: &str, width: usize) -> String {
    let half = width / 2;
    let mut letters = code.chars();

    let mut out = String::with_capacity(width);
    for _ in 0..2 {
        match letters.next() {
            Some(letter) => out.push_str(&encode_letter(letter, half)),
            None => out.push_str(&encode_int(0, half)),
        }
    }

    out
}

/// Reads `length` bits at `start` as an unsigned integer.
pub fn decode_int(bits: &str, start: usize, length: usize) -> u64 {
    slice(bits, start, length)
        .bytes()
        .fold(0u64, |acc, bit| (acc << 1) | u64::from(bit == b'1'))
}

/// Reads the single bit at `start`.
pub fn decode_bool(bits: &str, start: usize) -> bool {
    slice(bits, start, 1) == "1"
}

/// Reads a timestamp stored in 100 ms units, returning milliseconds.
pub fn decode_date(bits: &str, start: usize, length: usize) -> u64 {
    decode_int(bits, start, length).saturating_mul(100)
}

/// Decodes a whole, already sliced bit string as a lowercase letter.
///
/// Unlike the other decoders this takes no range: callers slice first.
pub fn decode_letter(bits: &str) -> char {
    let code = decode_int(bits, 0, bits.len());

    u32::try_from(code)
        .ok()
        .and_then(|code| code.checked_add(u32::from('A')))
        .and_then(char::from_u32)
        .map_or(char::REPLACEMENT_CHARACTER, |letter| {
            letter.to_ascii_lowercase()
        })
}

/// Reads a two-letter code from `length` bits at `start`.
pub fn decode_language(bits: &str, start: usize, length: usize) -> String {
    let language = slice(bits, start, length);
    let mut middle = (length / 2).min(language.len());
    while !language.is_char_boundary(middle) {
        middle -= 1;
    }
    let (first, second) = language.split_at(middle);

    [decode_letter(first), decode_letter(second)]
        .into_iter()
        .collect()
}

/// Interprets a bitmap as a set of 1-based ids: a `'1'` at index `i` means id `i + 1`.
///
/// Ids come out ascending and unique.
pub fn decode_bits_to_ids(bits: &str) -> Vec<usize> {
    bits.bytes()
        .enumerate()
        .filter(|(_, bit)| *bit == b'1')
        .map(|(index, _)| index + 1)
        .collect()
}

//! UTF-16LE encoding and decoding helpers.

/// Byte-order mark for UTF-16LE (`FF FE` on disk).
pub const BOM: [u8; 2] = [0xFF, 0xFE];

/// True when `bytes` starts with a UTF-16LE byte-order mark.
pub fn has_bom(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == BOM[0] && bytes[1] == BOM[1]
}

/// Append the byte-order mark to `out`.
pub fn push_bom(out: &mut Vec<u8>) {
    out.extend_from_slice(&BOM);
}

/// Decode little-endian UTF-16 bytes into a `String`.
///
/// Decoding stops at a null code unit, which terminates program code in
/// the container format. Unpaired surrogates are replaced rather than
/// rejected, matching the tolerant reader behaviour of the calculator.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();

    char::decode_utf16(units.into_iter())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode `text` as little-endian UTF-16 code units, appended to `out`.
///
/// Carriage returns are dropped; the calculator expects bare `\n` line
/// endings. Little-endian byte order is produced regardless of host.
pub fn encode_utf16le(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
}

/// Number of UTF-16 code units `text` encodes to, carriage returns excluded.
pub fn utf16_len(text: &str) -> usize {
    text.chars()
        .filter(|&ch| ch != '\r')
        .map(char::len_utf16)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_ascii_as_two_byte_units() {
        let mut out = Vec::new();
        encode_utf16le("AB", &mut out);
        assert_eq!(out, vec![0x41, 0x00, 0x42, 0x00]);
    }

    #[test]
    fn drops_carriage_returns() {
        let mut out = Vec::new();
        encode_utf16le("A\r\n", &mut out);
        assert_eq!(out, vec![0x41, 0x00, 0x0A, 0x00]);
    }

    #[test]
    fn decodes_up_to_null_terminator() {
        let bytes = [0x41, 0x00, 0x00, 0x00, 0x42, 0x00];
        assert_eq!(decode_utf16le(&bytes), "A");
    }

    #[test]
    fn round_trips_non_ascii() {
        let mut out = Vec::new();
        encode_utf16le("X≥1▶Y", &mut out);
        assert_eq!(decode_utf16le(&out), "X≥1▶Y");
    }
}

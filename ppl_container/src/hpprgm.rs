//! The hpprgm binary program-container format.
//!
//! Two header variants exist in the wild. The older (G1) layout is a
//! 4-byte header size, the header itself, a 4-byte code size and the
//! UTF-16LE program code; it carries no signature, so it is recognised
//! by checking that the header-size and code-size fields are consistent
//! with the file length. The newer (G2) layout starts with a magic
//! signature and stores the code after a fixed marker word. All
//! multi-byte fields are little-endian regardless of host byte order.

use crate::utf16;

/// Signature word at offset 0 of a G2 container.
pub const G2_SIGNATURE: u32 = 0xB28A_617C;

/// Marker word that immediately precedes the program code in a G2
/// container (bytes `9B 00 C0 00` on disk).
pub const G2_CODE_MARKER: u32 = 0x00C0_009B;

/// Size in bytes of the fixed G1 header this tool emits.
pub const HEADER_SIZE: u32 = 12;

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// True when `bytes` passes the G1 header-size/code-size consistency check.
pub fn is_g1(bytes: &[u8]) -> bool {
    let Some(header_size) = read_u32_le(bytes, 0) else {
        return false;
    };
    let header_size = header_size as usize;
    if bytes.len() < header_size + 4 {
        return false;
    }
    let Some(code_size) = read_u32_le(bytes, 4 + header_size) else {
        return false;
    };
    bytes.len() == 4 + header_size + 4 + code_size as usize
}

/// True when `bytes` starts with the G2 magic signature.
pub fn is_g2(bytes: &[u8]) -> bool {
    read_u32_le(bytes, 0) == Some(G2_SIGNATURE)
}

/// Extract the UTF-16LE program code from a container of either variant.
pub fn extract_code(bytes: &[u8]) -> Option<String> {
    if is_g2(bytes) {
        // Scan word-aligned positions for the code marker; the code
        // follows it and runs to a null code unit.
        let mut offset = 4;
        while offset + 4 <= bytes.len() {
            if read_u32_le(bytes, offset) == Some(G2_CODE_MARKER) {
                return Some(utf16::decode_utf16le(&bytes[offset + 4..]));
            }
            offset += 4;
        }
        return None;
    }

    if is_g1(bytes) {
        let header_size = read_u32_le(bytes, 0)? as usize;
        let code_start = 4 + header_size + 4;
        return Some(utf16::decode_utf16le(bytes.get(code_start..)?));
    }

    None
}

/// Wrap `text` in a G1 container.
///
/// The code-size field counts UTF-16 code units in bytes including the
/// trailing 2-byte null terminator.
pub fn build_container(text: &str) -> Vec<u8> {
    let code_size = (utf16::utf16_len(text) as u32) * 2 + 2;

    let mut out = Vec::with_capacity(4 + HEADER_SIZE as usize + 4 + code_size as usize);
    out.extend_from_slice(&HEADER_SIZE.to_le_bytes());
    // Variable and exported-function counts; all zeros is accepted.
    out.extend_from_slice(&[0u8; HEADER_SIZE as usize]);
    out.extend_from_slice(&code_size.to_le_bytes());
    utf16::encode_utf16le(text, &mut out);
    out.extend_from_slice(&[0x00, 0x00]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_container_passes_g1_check() {
        let bytes = build_container("BEGIN\nEND;\n");
        assert!(is_g1(&bytes));
        assert!(!is_g2(&bytes));
    }

    #[test]
    fn extracts_code_from_g1() {
        let bytes = build_container("A:=1;");
        assert_eq!(extract_code(&bytes).as_deref(), Some("A:=1;"));
    }

    #[test]
    fn code_size_counts_null_terminator() {
        let bytes = build_container("AB");
        // 2 code units * 2 bytes + 2-byte terminator
        let code_size = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        assert_eq!(code_size, 6);
    }

    #[test]
    fn extracts_code_from_g2() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&G2_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&G2_CODE_MARKER.to_le_bytes());
        crate::utf16::encode_utf16le("X:=2;", &mut bytes);
        bytes.extend_from_slice(&[0x00, 0x00]);
        assert!(is_g2(&bytes));
        assert_eq!(extract_code(&bytes).as_deref(), Some("X:=2;"));
    }

    #[test]
    fn random_bytes_are_neither_variant() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert!(!is_g1(&bytes));
        assert!(!is_g2(&bytes));
        assert!(extract_code(&bytes).is_none());
    }
}

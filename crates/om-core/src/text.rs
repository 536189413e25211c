//! Best-effort text decoding
//!
//! Rendezvous files and console responses are not guaranteed to be valid
//! UTF-8. Invalid byte sequences are dropped rather than replaced.

/// Decode bytes as UTF-8, silently dropping invalid sequences
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    // Truncated sequence at the end of input
                    None => break,
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_passes_through() {
        assert_eq!(decode_lossy("port 9938 ✓".as_bytes()), "port 9938 ✓");
    }

    #[test]
    fn test_invalid_bytes_are_dropped() {
        assert_eq!(decode_lossy(b"99\xff38"), "9938");
        assert_eq!(decode_lossy(b"\xc3\x28ok"), "(ok");
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        assert_eq!(decode_lossy(b"ok\xe2\x9c"), "ok");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_lossy(b""), "");
    }
}

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// One decoded protocol sentence: an ordered list of words.
pub type Sentence = Vec<String>;

/// Default maximum word size: 16 MiB.
pub const DEFAULT_MAX_WORD: usize = 16 * 1024 * 1024;

/// Sentence terminator on the wire.
const TERMINATOR: u8 = 0x00;

/// Encode a single word into the wire format.
///
/// The length prefix is the smallest of five encodings:
/// ```text
/// len < 0x80        1 byte   0xxxxxxx
/// len < 0x4000      2 bytes  10xxxxxx xxxxxxxx
/// len < 0x200000    3 bytes  110xxxxx xxxxxxxx xxxxxxxx
/// len < 0x10000000  4 bytes  1110xxxx xxxxxxxx xxxxxxxx xxxxxxxx
/// otherwise         5 bytes  11110000 + 32-bit big-endian length
/// ```
/// followed by the UTF-8 bytes of the word.
pub fn encode_word(word: &str, dst: &mut BytesMut) -> Result<()> {
    let len = word.len();
    if len > u32::MAX as usize {
        return Err(FrameError::WordTooLong {
            len,
            max: u32::MAX as usize,
        });
    }

    dst.reserve(len + 5);
    if len < 0x80 {
        dst.put_u8(len as u8);
    } else if len < 0x4000 {
        dst.put_u8((len >> 8) as u8 | 0x80);
        dst.put_u8(len as u8);
    } else if len < 0x20_0000 {
        dst.put_u8((len >> 16) as u8 | 0xC0);
        dst.put_u8((len >> 8) as u8);
        dst.put_u8(len as u8);
    } else if len < 0x1000_0000 {
        dst.put_u8((len >> 24) as u8 | 0xE0);
        dst.put_u8((len >> 16) as u8);
        dst.put_u8((len >> 8) as u8);
        dst.put_u8(len as u8);
    } else {
        dst.put_u8(0xF0);
        dst.put_u32(len as u32);
    }
    dst.put_slice(word.as_bytes());
    Ok(())
}

/// Encode a full sentence: each word, then the zero terminator.
pub fn encode_sentence<S: AsRef<str>>(words: &[S], dst: &mut BytesMut) -> Result<()> {
    for word in words {
        encode_word(word.as_ref(), dst)?;
    }
    dst.put_u8(TERMINATOR);
    Ok(())
}

/// Decode one complete sentence from the front of the buffer.
///
/// Returns `Ok(None)` if the buffer does not yet hold a complete sentence;
/// in that case *nothing* is consumed, so whatever remains in `src` is always
/// either empty or a prefix of an in-flight sentence. Feeding arrived bytes
/// into the same buffer and calling again yields identical results no matter
/// how the stream was chunked.
///
/// On success the sentence's bytes (terminator included) are consumed.
pub fn decode_sentence(src: &mut BytesMut, max_word_len: usize) -> Result<Option<Sentence>> {
    let mut idx = 0usize;
    let mut words = Vec::new();

    loop {
        if idx >= src.len() {
            return Ok(None); // Terminator not seen yet
        }

        let first = src[idx];
        if first == TERMINATOR {
            src.advance(idx + 1);
            return Ok(Some(words));
        }

        // Continuation byte count, mirror image of the encode tag bits.
        let header_len = if first & 0x80 == 0 {
            1
        } else if first & 0xC0 == 0x80 {
            2
        } else if first & 0xE0 == 0xC0 {
            3
        } else if first & 0xF0 == 0xE0 {
            4
        } else if first == 0xF0 {
            5
        } else {
            return Err(FrameError::UnknownControlByte { byte: first });
        };

        if idx + header_len > src.len() {
            return Ok(None); // Need more header bytes
        }

        let len = match header_len {
            1 => first as usize,
            2 => ((first & 0x3F) as usize) << 8 | src[idx + 1] as usize,
            3 => {
                ((first & 0x1F) as usize) << 16
                    | (src[idx + 1] as usize) << 8
                    | src[idx + 2] as usize
            }
            4 => {
                ((first & 0x0F) as usize) << 24
                    | (src[idx + 1] as usize) << 16
                    | (src[idx + 2] as usize) << 8
                    | src[idx + 3] as usize
            }
            _ => {
                u32::from_be_bytes([src[idx + 1], src[idx + 2], src[idx + 3], src[idx + 4]])
                    as usize
            }
        };

        if len > max_word_len {
            return Err(FrameError::WordTooLong {
                len,
                max: max_word_len,
            });
        }

        let payload_start = idx + header_len;
        if payload_start + len > src.len() {
            return Ok(None); // Need more payload bytes
        }

        let word = std::str::from_utf8(&src[payload_start..payload_start + len])
            .map_err(|_| FrameError::InvalidUtf8)?
            .to_string();
        words.push(word);
        idx = payload_start + len;
    }
}

/// Drain every complete sentence from the buffer.
///
/// The bytes left in `src` afterwards are the leftover of an incomplete
/// trailing sentence (or nothing).
pub fn decode_sentences(src: &mut BytesMut, max_word_len: usize) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    while let Some(sentence) = decode_sentence(src, max_word_len)? {
        sentences.push(sentence);
    }
    Ok(sentences)
}

/// Configuration for the sentence codec.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Maximum word size in bytes. Default: 16 MiB.
    pub max_word_len: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_word_len: DEFAULT_MAX_WORD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use super::*;

    fn roundtrip_word(word: &str) {
        let mut buf = BytesMut::new();
        encode_word(word, &mut buf).unwrap();
        buf.put_u8(TERMINATOR);

        let sentence = decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().unwrap();
        assert_eq!(sentence, vec![word.to_string()]);
        assert!(buf.is_empty());
    }

    #[test]
    fn roundtrip_one_byte_prefix() {
        roundtrip_word("/login");
        roundtrip_word(&"x".repeat(0x7F));
    }

    #[test]
    fn empty_word_is_the_terminator() {
        // A zero-length word encodes as the 0x00 byte, which on the wire is
        // indistinguishable from the sentence terminator.
        let mut buf = BytesMut::new();
        encode_word("", &mut buf).unwrap();
        assert_eq!(&buf[..], &[TERMINATOR]);
    }

    #[test]
    fn roundtrip_two_byte_prefix() {
        roundtrip_word(&"x".repeat(0x80));
        roundtrip_word(&"x".repeat(0x3FFF));
    }

    #[test]
    fn roundtrip_three_byte_prefix() {
        roundtrip_word(&"x".repeat(0x4000));
        roundtrip_word(&"x".repeat(0x1F_FFFF));
    }

    #[test]
    fn roundtrip_four_byte_prefix() {
        roundtrip_word(&"x".repeat(0x20_0000));
    }

    #[test]
    fn prefix_bytes_per_threshold() {
        let mut buf = BytesMut::new();
        encode_word(&"a".repeat(0x80), &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x80, 0x80]);

        let mut buf = BytesMut::new();
        encode_word(&"a".repeat(0x4000), &mut buf).unwrap();
        assert_eq!(&buf[..3], &[0xC0, 0x40, 0x00]);

        let mut buf = BytesMut::new();
        encode_word(&"a".repeat(0x20_0000), &mut buf).unwrap();
        assert_eq!(&buf[..4], &[0xE0, 0x20, 0x00, 0x00]);
    }

    #[test]
    fn decode_five_byte_prefix() {
        // The decoder accepts non-minimal encodings; use one to exercise the
        // 0xF0 form without a 256 MiB word.
        let mut buf = BytesMut::new();
        buf.put_u8(0xF0);
        buf.put_u32(3);
        buf.put_slice(b"!re");
        buf.put_u8(TERMINATOR);

        let sentence = decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().unwrap();
        assert_eq!(sentence, vec!["!re".to_string()]);
    }

    #[test]
    fn decode_multiple_sentences() {
        let mut buf = BytesMut::new();
        encode_sentence(&["!re", "=name=ether1"], &mut buf).unwrap();
        encode_sentence(&["!done"], &mut buf).unwrap();

        let sentences = decode_sentences(&mut buf, DEFAULT_MAX_WORD).unwrap();
        assert_eq!(
            sentences,
            vec![
                vec!["!re".to_string(), "=name=ether1".to_string()],
                vec!["!done".to_string()],
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_empty_sentence() {
        let mut buf = BytesMut::from(&[TERMINATOR][..]);
        let sentence = decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().unwrap();
        assert!(sentence.is_empty());
    }

    #[test]
    fn incomplete_header_consumes_nothing() {
        // 0x80 opens a two-byte prefix; the second byte is missing.
        let mut buf = BytesMut::from(&[0x80][..]);
        assert!(decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().is_none());
        assert_eq!(&buf[..], &[0x80]);
    }

    #[test]
    fn incomplete_payload_consumes_nothing() {
        let mut buf = BytesMut::from(&[0x05, b'p', b'a', b'r'][..]);
        assert!(decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().is_none());
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn unterminated_sentence_consumes_nothing() {
        // A full word but no terminator: still an incomplete sentence.
        let mut buf = BytesMut::from(&[0x03, b'!', b'r', b'e'][..]);
        assert!(decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap().is_none());
        assert_eq!(&buf[..], &[0x03, b'!', b'r', b'e']);
    }

    #[test]
    fn unknown_control_byte_is_fatal() {
        let mut buf = BytesMut::from(&[0xF7, 0x01, 0x02][..]);
        let err = decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap_err();
        assert!(matches!(err, FrameError::UnknownControlByte { byte: 0xF7 }));
    }

    #[test]
    fn word_over_limit_rejected() {
        let mut buf = BytesMut::new();
        encode_word("oversized", &mut buf).unwrap();
        buf.put_u8(TERMINATOR);

        let err = decode_sentence(&mut buf, 4).unwrap_err();
        assert!(matches!(err, FrameError::WordTooLong { len: 9, max: 4 }));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut buf = BytesMut::from(&[0x02, 0xFF, 0xFE, TERMINATOR][..]);
        let err = decode_sentence(&mut buf, DEFAULT_MAX_WORD).unwrap_err();
        assert!(matches!(err, FrameError::InvalidUtf8));
    }

    // Captured route-listing reply: 6 complete sentences followed by the
    // first 4 bytes of a 7th (`0x03` length header plus "!re").
    const CAPTURED_REPLY_B64: &str = concat!(
        "AyFyZRQudGFnPW1pa3JvdGlrY24xMTctMQ49LmlkPSozMDAwMDAwNBY9ZHN0LWFkZHJlc3M9MC4wLjAu",
        "MC8wFj1nYXRld2F5PTE5Mi4xNjguMjIyLjEzPWdhdGV3YXktc3RhdHVzPTE5Mi4xNjguMjIyLjEgcmVh",
        "Y2hhYmxlIHZpYSAgZXRoZXIxCz1kaXN0YW5jZT0xCT1zY29wZT0zMBA9dGFyZ2V0LXNjb3BlPTEwFT12",
        "cmYtaW50ZXJmYWNlPWV0aGVyMQw9YWN0aXZlPXRydWUNPWR5bmFtaWM9dHJ1ZQw9c3RhdGljPXRydWUP",
        "PWRpc2FibGVkPWZhbHNlAAMhcmUULnRhZz1taWtyb3Rpa2NuMTE3LTEHPS5pZD0qMRo9ZHN0LWFkZHJl",
        "c3M9MTAuMC4wLjExMy8zMhE9Z2F0ZXdheT0xMC4wLjAuMTE9Z2F0ZXdheS1zdGF0dXM9MTAuMC4wLjEg",
        "cmVhY2hhYmxlIHZpYSAgR3VzdGEtVlBOEz1jaGVjay1nYXRld2F5PXBpbmcLPWRpc3RhbmNlPTEJPXNj",
        "b3BlPTMwED10YXJnZXQtc2NvcGU9MTAMPWFjdGl2ZT10cnVlDD1zdGF0aWM9dHJ1ZQ89ZGlzYWJsZWQ9",
        "ZmFsc2UaPWNvbW1lbnQ9R3VzdGEgQVBJIEdhdGV3YXkAAyFyZRQudGFnPW1pa3JvdGlrY24xMTctMQc9",
        "LmlkPSoyGD1kc3QtYWRkcmVzcz0xMC4wLjQuMC8yMhE9Z2F0ZXdheT0xMC4wLjAuMTE9Z2F0ZXdheS1z",
        "dGF0dXM9MTAuMC4wLjEgcmVhY2hhYmxlIHZpYSAgR3VzdGEtVlBOEz1jaGVjay1nYXRld2F5PXBpbmcL",
        "PWRpc3RhbmNlPTEJPXNjb3BlPTMwED10YXJnZXQtc2NvcGU9MTAMPWFjdGl2ZT10cnVlDD1zdGF0aWM9",
        "dHJ1ZQ89ZGlzYWJsZWQ9ZmFsc2UVPWNvbW1lbnQ9Y3VzdG9tIHJvdXRlAAMhcmUULnRhZz1taWtyb3Rp",
        "a2NuMTE3LTEOPS5pZD0qNDAwNTkwMzUYPWRzdC1hZGRyZXNzPTEwLjAuMC4xLzMyFT1wcmVmLXNyYz0x",
        "MC4wLjk4LjE4NxI9Z2F0ZXdheT1HdXN0YS1WUE4jPWdhdGV3YXktc3RhdHVzPUd1c3RhLVZQTiByZWFj",
        "aGFibGULPWRpc3RhbmNlPTAJPXNjb3BlPTEwDD1hY3RpdmU9dHJ1ZQ09ZHluYW1pYz10cnVlDT1jb25u",
        "ZWN0PXRydWUPPWRpc2FibGVkPWZhbHNlAAMhcmUULnRhZz1taWtyb3Rpa2NuMTE3LTEOPS5pZD0qNDAw",
        "NUZDRTEcPWRzdC1hZGRyZXNzPTEwLjAuMjU1LjI1NC8zMhU9cHJlZi1zcmM9MTAuMC45OC4xODYYPWdh",
        "dGV3YXk9R3VzdGEtU3BlZWR0ZXN0KT1nYXRld2F5LXN0YXR1cz1HdXN0YS1TcGVlZHRlc3QgcmVhY2hh",
        "YmxlCz1kaXN0YW5jZT0wCT1zY29wZT0xMAw9YWN0aXZlPXRydWUNPWR5bmFtaWM9dHJ1ZQ09Y29ubmVj",
        "dD10cnVlDz1kaXNhYmxlZD1mYWxzZQADIXJlFC50YWc9bWlrcm90aWtjbjExNy0xDj0uaWQ9KjQwMDVF",
        "OTY5HD1kc3QtYWRkcmVzcz0xOTIuMTY4Ljg3LjAvMjQWPXByZWYtc3JjPTE5Mi4xNjguODcuMQ89Z2F0",
        "ZXdheT1icmlkZ2UgPWdhdGV3YXktc3RhdHVzPWJyaWRnZSByZWFjaGFibGULPWRpc3RhbmNlPTAJPXNj",
        "b3BlPTEwDD1hY3RpdmU9dHJ1ZQ09ZHluYW1pYz10cnVlDT1jb25uZWN0PXRydWUPPWRpc2FibGVkPWZh",
        "bHNlAAMhcmU=",
    );

    #[test]
    fn captured_reply_leaves_partial_record() {
        let wire = STANDARD.decode(CAPTURED_REPLY_B64).unwrap();
        let mut buf = BytesMut::from(wire.as_slice());

        let sentences = decode_sentences(&mut buf, DEFAULT_MAX_WORD).unwrap();

        assert_eq!(sentences.len(), 6);
        assert_eq!(&buf[..], &[0x03, 0x21, 0x72, 0x65]);
        for sentence in &sentences {
            assert_eq!(sentence[0], "!re");
            assert_eq!(sentence[1], ".tag=mikrotikcn117-1");
        }
    }

    #[test]
    fn decoding_is_chunk_boundary_independent() {
        let wire = STANDARD.decode(CAPTURED_REPLY_B64).unwrap();

        let mut reference_buf = BytesMut::from(wire.as_slice());
        let reference = decode_sentences(&mut reference_buf, DEFAULT_MAX_WORD).unwrap();

        for chunk_size in [1usize, 2, 3, 5, 16, 64, 257] {
            let mut buf = BytesMut::new();
            let mut sentences = Vec::new();
            for chunk in wire.chunks(chunk_size) {
                buf.extend_from_slice(chunk);
                sentences.extend(decode_sentences(&mut buf, DEFAULT_MAX_WORD).unwrap());
            }
            assert_eq!(sentences, reference, "chunk size {chunk_size}");
            assert_eq!(&buf[..], &reference_buf[..], "chunk size {chunk_size}");
        }
    }
}

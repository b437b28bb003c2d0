//! Variable-length word framing and sentence codec for the RouterOS API.
//!
//! This is the wire layer of rosapi. Every protocol exchange is a *sentence*:
//! a run of length-prefixed UTF-8 *words* terminated by a single zero byte.
//! The length prefix uses one to five bytes depending on magnitude, tagged in
//! the high bits of the first byte.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_sentence, decode_sentences, encode_sentence, encode_word, CodecConfig, Sentence,
    DEFAULT_MAX_WORD,
};
pub use error::{FrameError, Result};
pub use reader::SentenceReader;
pub use writer::SentenceWriter;

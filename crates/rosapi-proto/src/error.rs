/// Errors that can occur while parsing a reply sentence.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The sentence contains no words.
    #[error("empty sentence")]
    EmptySentence,

    /// The first word is not a known reply word.
    #[error("unknown reply word '{0}'")]
    UnknownReplyWord(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;

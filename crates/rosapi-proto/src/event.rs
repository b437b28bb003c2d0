use serde::Serialize;

/// Classification of a reply sentence.
///
/// The class is the reply word crossed with two markers: whether the
/// sentence carries a `=ret=` value and whether it carries a `.tag=` word.
/// There is no `DataTag`: a tagged `!re` always classifies as
/// [`EventKind::DataRetTag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `!re` — one record of command output.
    Data,
    /// `!re` with a `=ret=` value, untagged.
    DataRet,
    /// `!re` on a tagged channel.
    DataRetTag,
    /// `!done` — command completed.
    Done,
    /// `!done =ret=<value>` — completion carrying a return value
    /// (e.g. the login challenge, or the id of a created object).
    DoneRet,
    /// `!done =ret=<value>` on a tagged channel.
    DoneRetTag,
    /// `!done` on a tagged channel.
    DoneTag,
    /// `!trap` — the command failed.
    Trap,
    /// `!trap` on a tagged channel.
    TrapTag,
    /// `!fatal` — the connection is being terminated by the peer.
    Fatal,
}

impl EventKind {
    /// True for every `!re`-derived class.
    pub fn is_data(self) -> bool {
        matches!(self, Self::Data | Self::DataRet | Self::DataRetTag)
    }

    /// True for every `!done`-derived class.
    pub fn is_done(self) -> bool {
        matches!(
            self,
            Self::Done | Self::DoneRet | Self::DoneRetTag | Self::DoneTag
        )
    }

    /// True for every `!trap`-derived class.
    pub fn is_trap(self) -> bool {
        matches!(self, Self::Trap | Self::TrapTag)
    }

    /// True when the sentence carried a `=ret=` value.
    pub fn has_ret(self) -> bool {
        matches!(
            self,
            Self::DataRet | Self::DataRetTag | Self::DoneRet | Self::DoneRetTag
        )
    }
}

/// A parsed reply sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Reply classification.
    pub kind: EventKind,
    /// Routing tag (`<channel>-<command>`), echoed from the command word.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Attribute words in wire order, split at the value `=`.
    pub attributes: Vec<(String, String)>,
    /// The `=ret=` value, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
}

impl Event {
    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The trap/fatal message, when one was sent.
    pub fn message(&self) -> Option<&str> {
        self.attr("message")
    }
}

use crate::error::{ProtoError, Result};
use crate::event::{Event, EventKind};

/// Parse one decoded sentence into a typed event.
///
/// The first word selects the reply class; the rest are `=key=value`
/// attributes (the value may itself contain `=`), the `.tag=` routing word,
/// or bare words, which are kept as attributes with an empty value.
pub fn parse_sentence(words: &[String]) -> Result<Event> {
    let (reply, rest) = words.split_first().ok_or(ProtoError::EmptySentence)?;

    let mut tag = None;
    let mut ret = None;
    let mut attributes = Vec::new();

    for word in rest {
        if let Some(value) = word.strip_prefix(".tag=") {
            tag = Some(value.to_string());
        } else if let Some(value) = word.strip_prefix("=ret=") {
            ret = Some(value.to_string());
        } else if let Some(attr) = word.strip_prefix('=') {
            let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
            attributes.push((key.to_string(), value.to_string()));
        } else {
            // API attributes (".about=...") and stray bare words.
            let (key, value) = word.split_once('=').unwrap_or((word.as_str(), ""));
            attributes.push((key.to_string(), value.to_string()));
        }
    }

    let kind = match reply.as_str() {
        "!re" => match (&tag, &ret) {
            (Some(_), _) => EventKind::DataRetTag,
            (None, Some(_)) => EventKind::DataRet,
            (None, None) => EventKind::Data,
        },
        "!done" => match (&tag, &ret) {
            (Some(_), Some(_)) => EventKind::DoneRetTag,
            (Some(_), None) => EventKind::DoneTag,
            (None, Some(_)) => EventKind::DoneRet,
            (None, None) => EventKind::Done,
        },
        "!trap" => {
            if tag.is_some() {
                EventKind::TrapTag
            } else {
                EventKind::Trap
            }
        }
        "!fatal" => EventKind::Fatal,
        other => return Err(ProtoError::UnknownReplyWord(other.to_string())),
    };

    Ok(Event {
        kind,
        tag,
        attributes,
        ret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifies_plain_done() {
        let event = parse_sentence(&words(&["!done"])).unwrap();
        assert_eq!(event.kind, EventKind::Done);
        assert!(event.tag.is_none());
        assert!(event.ret.is_none());
    }

    #[test]
    fn classifies_done_ret_challenge() {
        let event =
            parse_sentence(&words(&["!done", "=ret=00112233445566778899aabbccddeeff"])).unwrap();
        assert_eq!(event.kind, EventKind::DoneRet);
        assert_eq!(event.ret.as_deref(), Some("00112233445566778899aabbccddeeff"));
    }

    #[test]
    fn classifies_tagged_done_variants() {
        let event = parse_sentence(&words(&["!done", ".tag=c1-3"])).unwrap();
        assert_eq!(event.kind, EventKind::DoneTag);
        assert_eq!(event.tag.as_deref(), Some("c1-3"));

        let event = parse_sentence(&words(&["!done", "=ret=*4F", ".tag=c1-3"])).unwrap();
        assert_eq!(event.kind, EventKind::DoneRetTag);
        assert_eq!(event.ret.as_deref(), Some("*4F"));
    }

    #[test]
    fn classifies_data_variants() {
        let event = parse_sentence(&words(&["!re", "=name=ether1"])).unwrap();
        assert_eq!(event.kind, EventKind::Data);

        let event = parse_sentence(&words(&["!re", "=ret=*1"])).unwrap();
        assert_eq!(event.kind, EventKind::DataRet);

        let event = parse_sentence(&words(&["!re", "=name=ether1", ".tag=c1-1"])).unwrap();
        assert_eq!(event.kind, EventKind::DataRetTag);
        assert_eq!(event.attr("name"), Some("ether1"));
    }

    #[test]
    fn classifies_traps_and_fatal() {
        let event = parse_sentence(&words(&["!trap", "=message=no such command"])).unwrap();
        assert_eq!(event.kind, EventKind::Trap);
        assert_eq!(event.message(), Some("no such command"));

        let event = parse_sentence(&words(&["!trap", "=category=2", ".tag=c1-7"])).unwrap();
        assert_eq!(event.kind, EventKind::TrapTag);
        assert_eq!(event.attr("category"), Some("2"));

        let event = parse_sentence(&words(&["!fatal", "session terminated"])).unwrap();
        assert_eq!(event.kind, EventKind::Fatal);
    }

    #[test]
    fn value_may_contain_equals() {
        let event = parse_sentence(&words(&["!re", "=comment=a=b=c"])).unwrap();
        assert_eq!(event.attr("comment"), Some("a=b=c"));
    }

    #[test]
    fn empty_value_attribute() {
        let event = parse_sentence(&words(&["!re", "=comment="])).unwrap();
        assert_eq!(event.attr("comment"), Some(""));

        let event = parse_sentence(&words(&["!re", "=disabled"])).unwrap();
        assert_eq!(event.attr("disabled"), Some(""));
    }

    #[test]
    fn attributes_keep_wire_order() {
        let event = parse_sentence(&words(&["!re", "=b=2", "=a=1", ".tag=c-1"])).unwrap();
        assert_eq!(
            event.attributes,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_empty_sentence() {
        let err = parse_sentence(&[]).unwrap_err();
        assert!(matches!(err, ProtoError::EmptySentence));
    }

    #[test]
    fn rejects_unknown_reply_word() {
        let err = parse_sentence(&words(&["!nope"])).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownReplyWord(word) if word == "!nope"));
    }

    #[test]
    fn serializes_for_structured_output() {
        let event = parse_sentence(&words(&["!re", "=name=ether1", ".tag=c1-1"])).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "data_ret_tag");
        assert_eq!(json["tag"], "c1-1");
    }
}

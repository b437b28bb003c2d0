use std::collections::BTreeMap;

/// Build command argument words from key/value pairs.
///
/// Attribute words are `=key=value` (`=key` when the value is empty);
/// `print`-style commands take bare property words without the `=` prefix.
/// The command's last path segment decides which form applies.
pub fn args_from_pairs<'a, I>(pairs: I, command: &str) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let prefix = if command.rsplit('/').next() == Some("print") {
        ""
    } else {
        "="
    };
    pairs
        .into_iter()
        .map(|(key, value)| {
            if value.is_empty() {
                format!("{prefix}{key}")
            } else {
                format!("{prefix}{key}={value}")
            }
        })
        .collect()
}

/// Flatten an attribute list into a map, last occurrence winning.
pub fn record_map(attributes: &[(String, String)]) -> BTreeMap<String, String> {
    attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

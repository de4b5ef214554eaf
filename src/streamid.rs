// SPDX-License-Identifier: MPL-2.0

/// Prefix of the SRT access control stream id syntax.
const STREAM_ID_PREFIX: &str = "#!::";

/// Builds the SRT `streamid` from the optional user and resource names.
///
/// Returns `None` if neither is set, in which case the stream id should be
/// left unset on the source.
pub fn build_stream_id(user: Option<&str>, resource: Option<&str>) -> Option<String> {
    let tags = [("u", user), ("r", resource)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| format!("{key}={value}")))
        .collect::<Vec<_>>();

    if tags.is_empty() {
        return None;
    }

    Some(format!("{STREAM_ID_PREFIX}{}", tags.join(",")))
}

// SPDX-License-Identifier: MPL-2.0

pub const DEFAULT_VIDEO_SINK: &str = "autovideosink";
pub const DEFAULT_DUMP_DATA: bool = true;

/// Everything the receiver needs to know, threaded explicitly from the
/// command line down to the pipeline and the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub uri: String,
    /// SRT `streamid`, see [`crate::build_stream_id`].
    pub stream_id: Option<String>,
    /// SRT receiver latency in milliseconds, `None` keeps the element default.
    pub latency: Option<i32>,
    /// Factory name of the element rendering decoded video.
    pub video_sink: String,
    /// Hexdump every generic data buffer to stdout.
    pub dump_data: bool,
}

impl Settings {
    /// Settings receiving from `uri`, everything else at its default.
    pub fn new(uri: impl Into<String>) -> Self {
        Settings {
            uri: uri.into(),
            stream_id: None,
            latency: None,
            video_sink: DEFAULT_VIDEO_SINK.to_string(),
            dump_data: DEFAULT_DUMP_DATA,
        }
    }
}

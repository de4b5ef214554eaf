// SPDX-License-Identifier: MPL-2.0

use crate::settings::Settings;

pub const VIDEO_PT: u32 = 96;
pub const DATA_PT: u32 = 99;

pub(crate) const CLOCK_RATE: i32 = 90_000;

/// The media carried by a known RTP payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// H.264 video.
    Video,
    /// Arbitrary GStreamer buffers payloaded with `rtpgstpay`.
    Data,
}

impl PayloadKind {
    pub fn from_pt(pt: u32) -> Option<Self> {
        match pt {
            VIDEO_PT => Some(PayloadKind::Video),
            DATA_PT => Some(PayloadKind::Data),
            _ => None,
        }
    }

    pub fn pt(self) -> u32 {
        match self {
            PayloadKind::Video => VIDEO_PT,
            PayloadKind::Data => DATA_PT,
        }
    }

    pub fn caps(self) -> gst::Caps {
        let (media, encoding_name) = match self {
            PayloadKind::Video => ("video", "H264"),
            PayloadKind::Data => ("application", "X-GST"),
        };

        gst::Caps::builder("application/x-rtp")
            .field("media", media)
            .field("encoding-name", encoding_name)
            .field("clock-rate", CLOCK_RATE)
            .build()
    }

    /// Element factories the downstream branch for this kind is made of.
    pub fn factories(self, settings: &Settings) -> Vec<&str> {
        match self {
            PayloadKind::Video => vec![
                "queue",
                "rtph264depay",
                "h264parse",
                "decodebin",
                settings.video_sink.as_str(),
            ],
            PayloadKind::Data => vec!["queue", "rtpgstdepay", "identity", "fakesink"],
        }
    }

    /// Description of the downstream branch, parsed into a bin. The first
    /// element is always a queue named `q`.
    pub fn branch_description(self, settings: &Settings) -> String {
        match self {
            PayloadKind::Video => format!(
                "queue name=q ! rtph264depay ! h264parse ! decodebin ! {}",
                settings.video_sink
            ),
            PayloadKind::Data => format!(
                "queue name=q ! rtpgstdepay name=depay ! identity dump={} ! fakesink sync=false",
                settings.dump_data
            ),
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::Video => f.write_str("video"),
            PayloadKind::Data => f.write_str("data"),
        }
    }
}

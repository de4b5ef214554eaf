// SPDX-License-Identifier: MPL-2.0

use url::Url;

use crate::settings::{Settings, DEFAULT_VIDEO_SINK};
use crate::streamid::build_stream_id;

pub const SRT_URI_PREFIX: &str = "srt://";

#[derive(Debug, Clone, clap::Parser)]
#[clap(about, disable_version_flag = true)]
/// Receives RTP video and generic data multiplexed over an SRT link
pub struct Args {
    /// SRT URI to receive from, e.g. srt://127.0.0.1:7001
    #[clap(value_name = "URI", value_parser = parse_srt_uri)]
    pub uri: String,

    /// Authorization name
    #[clap(short, long)]
    pub user: Option<String>,

    /// Resource name
    #[clap(short, long)]
    pub resource: Option<String>,

    /// SRT receiver latency (ms)
    #[clap(short, long, value_parser = clap::value_parser!(i32).range(0..))]
    pub latency: Option<i32>,

    /// Element used to render the decoded video
    #[clap(long, default_value = DEFAULT_VIDEO_SINK)]
    pub video_sink: String,

    /// Don't hexdump the generic data stream
    #[clap(long)]
    pub no_dump: bool,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            uri: self.uri.clone(),
            stream_id: build_stream_id(self.user.as_deref(), self.resource.as_deref()),
            latency: self.latency,
            video_sink: self.video_sink.clone(),
            dump_data: !self.no_dump,
        }
    }
}

pub fn parse_srt_uri(value: &str) -> Result<String, String> {
    if !value.starts_with(SRT_URI_PREFIX) {
        return Err(format!("Invalid SRT uri: {value}"));
    }

    match Url::parse(value) {
        Ok(url) if url.scheme() == "srt" => Ok(value.to_string()),
        Ok(_) => Err(format!("Invalid SRT uri: {value}")),
        Err(err) => Err(format!("Invalid SRT uri: {value} ({err})")),
    }
}

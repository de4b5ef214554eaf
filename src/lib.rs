// SPDX-License-Identifier: MPL-2.0

//! Receiver for multiplexed RTP media carried over an SRT link.
//!
//! The ingest path is fixed:
//!
//! ```text
//! srtsrc ! queue ! rtpptdemux
//! ```
//!
//! Every payload type exposed by `rtpptdemux` is routed to its own
//! downstream bin, built while the pipeline keeps running:
//!
//! ```text
//!                        +-> queue ! rtph264depay ! h264parse ! decodebin ! videosink   (pt 96)
//! srtsrc ! rtpptdemux ---+
//!                        +-> queue ! rtpgstdepay ! identity ! fakesink                    (pt 99)
//! ```

pub mod app;
pub mod args;
pub mod branch;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod router;
pub mod settings;
pub mod streamid;

pub use app::App;
pub use args::Args;
pub use error::Error;
pub use payload::PayloadKind;
pub use pipeline::build_recv_pipeline;
pub use router::{BranchStats, Router};
pub use settings::Settings;
pub use streamid::build_stream_id;

// SPDX-License-Identifier: MPL-2.0

use gst::glib;
use gst::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::payload::PayloadKind;
use crate::settings::Settings;

/// Name of the queue heading every branch description.
const ENTRY_QUEUE: &str = "q";

/// A downstream sub-graph consuming one payload type.
///
/// The bin exposes a single ghost sink pad targeting its entry queue, so it
/// can be spliced onto a demuxer source pad while the pipeline is running.
#[derive(Debug)]
pub struct Branch {
    kind: PayloadKind,
    bin: gst::Bin,
    sinkpad: gst::GhostPad,
    buffers: Arc<AtomicU64>,
}

impl Branch {
    pub fn new(kind: PayloadKind, settings: &Settings, name: &str) -> Result<Self, Error> {
        let bin = gst::parse::bin_from_description(&kind.branch_description(settings), false)?;
        bin.set_property("name", name);

        let queue = bin
            .by_name(ENTRY_QUEUE)
            .ok_or(Error::NoSuchElement(ENTRY_QUEUE))?;
        let target = queue
            .static_pad("sink")
            .ok_or_else(|| glib::bool_error!("Entry queue has no sink pad"))?;

        let sinkpad = gst::GhostPad::builder_with_target(&target)?
            .name("sink")
            .build();
        bin.add_pad(&sinkpad)?;

        let buffers = Arc::new(AtomicU64::new(0));
        sinkpad.add_probe(
            gst::PadProbeType::BUFFER | gst::PadProbeType::BUFFER_LIST,
            {
                let buffers = buffers.clone();
                move |_pad, info| {
                    let n = match info.data {
                        Some(gst::PadProbeData::Buffer(_)) => 1,
                        Some(gst::PadProbeData::BufferList(ref list)) => list.len() as u64,
                        _ => 0,
                    };
                    buffers.fetch_add(n, Ordering::Relaxed);

                    gst::PadProbeReturn::Ok
                }
            },
        );

        Ok(Branch {
            kind,
            bin,
            sinkpad,
            buffers,
        })
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn bin(&self) -> &gst::Bin {
        &self.bin
    }

    pub fn sinkpad(&self) -> &gst::GhostPad {
        &self.sinkpad
    }

    /// Number of buffers that entered the branch so far.
    pub fn buffers(&self) -> u64 {
        self.buffers.load(Ordering::Relaxed)
    }

    /// Whether the branch is currently fed by `srcpad`.
    pub fn is_fed_by(&self, srcpad: &gst::Pad) -> bool {
        self.sinkpad.peer().as_ref() == Some(srcpad)
    }

    /// Adds the branch to `pipeline`, links `srcpad` to it and brings it to
    /// the state of the pipeline.
    ///
    /// Must be called while `srcpad` is idle.
    pub fn attach(&self, pipeline: &gst::Pipeline, srcpad: &gst::Pad) -> Result<(), Error> {
        pipeline.add(&self.bin)?;

        let res = (|| -> Result<(), Error> {
            srcpad.link(&self.sinkpad)?;
            self.sinkpad.set_active(true)?;
            self.bin.sync_state_with_parent()?;
            Ok(())
        })();

        if let Err(err) = res {
            let _ = self.bin.set_state(gst::State::Null);
            let _ = pipeline.remove(&self.bin);
            return Err(err);
        }

        debug!(branch = %self.bin.name(), pad = %srcpad.name(), "Branch attached");

        Ok(())
    }

    /// Unlinks the branch and removes it from its pipeline.
    ///
    /// Shutting the bin down happens asynchronously so that this can be
    /// called from a streaming thread.
    pub fn detach(self) {
        if let Some(peer) = self.sinkpad.peer() {
            let _ = peer.unlink(&self.sinkpad);
        }

        self.bin.call_async(|bin| {
            if let Err(err) = bin.set_state(gst::State::Null) {
                warn!(branch = %bin.name(), %err, "Failed to shut down branch");
            }

            if let Some(parent) = bin.parent().and_downcast::<gst::Bin>() {
                let _ = parent.remove(bin);
            }

            debug!(branch = %bin.name(), "Branch removed");
        });
    }
}

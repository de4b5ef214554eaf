// SPDX-License-Identifier: MPL-2.0

//! Routing of the payload types exposed by `rtpptdemux` to their branches.
//!
//! Each known payload type gets its own [`Branch`]. Linking happens from an
//! IDLE probe on the new demuxer pad, as a pad can't be relinked while data
//! is flowing through it. Every request is tagged with a generation number
//! per payload type: a probe only links if its generation is still the
//! latest one, and a newer branch always replaces an older one.
//!
//! Unknown payload types still get a demuxer pad, but everything pushed on it
//! is dropped.

use gst::glib;
use gst::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::branch::Branch;
use crate::payload::{PayloadKind, CLOCK_RATE};
use crate::settings::Settings;

pub const BRANCH_LINKED: &str = "branch-linked";
pub const PAYLOAD_TYPE_IGNORED: &str = "payload-type-ignored";

#[derive(Debug)]
struct Pending {
    generation: u64,
    pad: glib::WeakRef<gst::Pad>,
}

#[derive(Debug)]
struct Route {
    generation: u64,
    branch: Branch,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    pending: HashMap<u32, Pending>,
    routes: HashMap<u32, Route>,
}

#[derive(Debug)]
struct Inner {
    pipeline: glib::WeakRef<gst::Pipeline>,
    settings: Settings,
    state: Mutex<State>,
}

/// Snapshot of one routed payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStats {
    pub pt: u32,
    pub kind: PayloadKind,
    pub generation: u64,
    pub buffers: u64,
}

#[derive(Debug, Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

/// Caps for the `request-pt-map` signal.
///
/// Unhandled payload types get bare `application/x-rtp` caps: without caps
/// `rtpptdemux` errors out unless its input is already negotiated, which
/// `srtsrc` output never is.
pub fn caps_for_pt(pt: u32) -> gst::Caps {
    match PayloadKind::from_pt(pt) {
        Some(kind) => kind.caps(),
        None => {
            warn!(pt, "No caps for payload type");
            gst::Caps::builder("application/x-rtp")
                .field("clock-rate", CLOCK_RATE)
                .build()
        }
    }
}

impl Router {
    pub fn new(pipeline: &gst::Pipeline, settings: Settings) -> Self {
        Router {
            inner: Arc::new(Inner {
                pipeline: pipeline.downgrade(),
                settings,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Connects to the `request-pt-map` and `new-payload-type` signals of
    /// an `rtpptdemux`.
    pub fn connect(&self, demux: &gst::Element) {
        demux.connect("request-pt-map", false, |values| {
            let caps = values[1].get::<u32>().ok().map(caps_for_pt);
            Some(caps.to_value())
        });

        let router = self.clone();
        demux.connect("new-payload-type", false, move |values| {
            let pt = values[1].get::<u32>().ok()?;
            let pad = values[2].get::<gst::Pad>().ok()?;

            router.handle_new_payload_type(pt, &pad);

            None
        });
    }

    /// Schedules linking a branch for `pt` to `pad` once the pad is idle.
    /// Data of unhandled payload types is dropped on `pad`.
    pub fn handle_new_payload_type(&self, pt: u32, pad: &gst::Pad) {
        info!(pt, pad = %pad.name(), "New payload type");

        let Some((kind, generation)) = self.begin_route(pt, pad) else {
            return;
        };

        let router = self.clone();
        pad.add_probe(gst::PadProbeType::IDLE, move |pad, _info| {
            router.link_branch(kind, generation, pad);

            gst::PadProbeReturn::Remove
        });
    }

    fn begin_route(&self, pt: u32, pad: &gst::Pad) -> Option<(PayloadKind, u64)> {
        let Some(kind) = PayloadKind::from_pt(pt) else {
            warn!(pt, pad = %pad.name(), "Unhandled payload type, dropping its data");
            pad.add_probe(
                gst::PadProbeType::BUFFER | gst::PadProbeType::BUFFER_LIST,
                |_pad, _info| gst::PadProbeReturn::Drop,
            );
            self.post(
                gst::Structure::builder(PAYLOAD_TYPE_IGNORED)
                    .field("pt", pt)
                    .field("pad", pad.name())
                    .build(),
            );
            return None;
        };

        let mut state = self.inner.state.lock().unwrap();

        if state
            .routes
            .get(&pt)
            .is_some_and(|route| route.branch.is_fed_by(pad))
        {
            debug!(pt, pad = %pad.name(), "Payload type already routed from this pad");
            return None;
        }

        if state
            .pending
            .get(&pt)
            .is_some_and(|pending| pending.pad.upgrade().as_ref() == Some(pad))
        {
            debug!(pt, pad = %pad.name(), "Link already pending for this pad");
            return None;
        }

        state.generation += 1;
        let generation = state.generation;
        state.pending.insert(
            pt,
            Pending {
                generation,
                pad: pad.downgrade(),
            },
        );

        debug!(pt, %kind, generation, "Waiting for pad to be idle");

        Some((kind, generation))
    }

    fn link_branch(&self, kind: PayloadKind, generation: u64, pad: &gst::Pad) {
        let pt = kind.pt();

        {
            let mut state = self.inner.state.lock().unwrap();
            match state.pending.get(&pt) {
                Some(pending) if pending.generation == generation => {
                    state.pending.remove(&pt);
                }
                _ => {
                    debug!(pt, generation, "Stale link request, ignoring");
                    return;
                }
            }
        }

        let Some(pipeline) = self.inner.pipeline.upgrade() else {
            return;
        };

        let name = format!("{kind}-branch-{generation}");
        let branch = match Branch::new(kind, &self.inner.settings, &name)
            .and_then(|branch| branch.attach(&pipeline, pad).map(|_| branch))
        {
            Ok(branch) => branch,
            Err(err) => {
                error!(pt, %kind, %err, "Failed to link branch");
                gst::element_error!(
                    pipeline,
                    gst::CoreError::Negotiation,
                    ["Failed to link {} branch for payload type {}: {}", kind, pt, err]
                );
                return;
            }
        };

        let replaced = {
            let mut state = self.inner.state.lock().unwrap();
            if state
                .routes
                .get(&pt)
                .is_some_and(|route| route.generation > generation)
            {
                Err(branch)
            } else {
                Ok(state.routes.insert(pt, Route { generation, branch }))
            }
        };

        match replaced {
            Err(branch) => {
                debug!(pt, generation, "Newer branch already linked, dropping");
                branch.detach();
                return;
            }
            Ok(Some(old)) => {
                info!(pt, old = old.generation, new = generation, "Replacing stale branch");
                old.branch.detach();
            }
            Ok(None) => (),
        }

        info!(pt, %kind, generation, "Linking done");

        self.post(
            gst::Structure::builder(BRANCH_LINKED)
                .field("pt", pt)
                .field("generation", generation)
                .field("pad", pad.name())
                .build(),
        );
    }

    fn post(&self, structure: gst::Structure) {
        let Some(pipeline) = self.inner.pipeline.upgrade() else {
            return;
        };

        let msg = gst::message::Application::builder(structure)
            .src(&pipeline)
            .build();
        if pipeline.post_message(msg).is_err() {
            debug!("Pipeline has no bus");
        }
    }

    /// Routed payload types, ordered by payload type.
    pub fn stats(&self) -> Vec<BranchStats> {
        let state = self.inner.state.lock().unwrap();

        let mut stats = state
            .routes
            .iter()
            .map(|(pt, route)| BranchStats {
                pt: *pt,
                kind: route.branch.kind(),
                generation: route.generation,
                buffers: route.branch.buffers(),
            })
            .collect::<Vec<_>>();
        stats.sort_by_key(|stats| stats.pt);

        stats
    }

    /// The bin currently consuming `pt`, if any.
    pub fn branch_bin(&self, pt: u32) -> Option<gst::Bin> {
        let state = self.inner.state.lock().unwrap();
        state.routes.get(&pt).map(|route| route.branch.bin().clone())
    }
}

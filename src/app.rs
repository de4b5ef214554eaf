// SPDX-License-Identifier: MPL-2.0

use anyhow::Context;
use futures::prelude::*;
use futures::{pin_mut, select_biased};
use gst::prelude::*;
use std::ops::ControlFlow;
use tracing::{debug, error, info, warn};

use crate::pipeline::build_recv_pipeline;
use crate::router::{Router, BRANCH_LINKED, PAYLOAD_TYPE_IGNORED};
use crate::settings::Settings;

#[derive(Debug)]
pub struct App {
    settings: Settings,
    pipeline: Option<gst::Pipeline>,
    router: Option<Router>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        App {
            settings,
            pipeline: None,
            router: None,
        }
    }

    /// Creates an `App` around an already assembled pipeline.
    pub fn with_pipeline(settings: Settings, pipeline: gst::Pipeline, router: Router) -> Self {
        App {
            settings,
            pipeline: Some(pipeline),
            router: Some(router),
        }
    }

    pub fn pipeline(&self) -> Option<&gst::Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn prepare(&mut self) -> anyhow::Result<()> {
        debug!("Preparing");

        let (pipeline, router) =
            build_recv_pipeline(&self.settings).context("Building the receive pipeline")?;

        self.pipeline = Some(pipeline);
        self.router = Some(router);

        Ok(())
    }

    /// Plays the pipeline until end-of-stream, an error or Ctrl+C.
    ///
    /// Errors from the pipeline end the loop like end-of-stream does and are
    /// not reported as an error of this function.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        debug!("Running");

        let pipeline = self.pipeline.clone().context("Pipeline not prepared")?;
        let bus = pipeline.bus().context("Getting the pipeline bus")?;
        let mut bus_stream = bus.stream();

        // A failed state change is followed by an error message on the bus.
        if let Err(err) = pipeline.set_state(gst::State::Playing) {
            error!(%err, "Failed to set pipeline to Playing");
        } else {
            info!(uri = %self.settings.uri, "Playing");
        }

        let ctrl_c = tokio::signal::ctrl_c().fuse();
        pin_mut!(ctrl_c);

        loop {
            select_biased! {
                _ = ctrl_c => {
                    info!("Shutting down due to user request");
                    break;
                }
                msg = bus_stream.next() => {
                    let Some(msg) = msg else { break };
                    if handle_message(&pipeline, &msg).is_break() {
                        eprintln!("Terminated");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Stops the pipeline and releases it by consuming `self`.
    pub fn teardown(mut self) {
        debug!("Tearing down");

        let Some(pipeline) = self.pipeline.take() else {
            return;
        };

        // Only written if GST_DEBUG_DUMP_DOT_DIR is set.
        pipeline.debug_to_dot_file(
            gst::DebugGraphDetails::all(),
            "gst-srt-rtp-recv-tearing-down",
        );

        if let Err(err) = pipeline.set_state(gst::State::Null) {
            error!(%err, "Failed to set pipeline to Null");
        }

        if let Some(router) = self.router.take() {
            for stats in router.stats() {
                info!(
                    pt = stats.pt,
                    kind = %stats.kind,
                    generation = stats.generation,
                    buffers = stats.buffers,
                    "Branch stats"
                );
            }
        }
    }
}

fn handle_message(pipeline: &gst::Pipeline, msg: &gst::Message) -> ControlFlow<()> {
    use gst::MessageView::*;

    let src_name = || {
        msg.src()
            .map(|src| src.path_string())
            .unwrap_or_else(|| "UNKNOWN".into())
    };

    match msg.view() {
        Eos(_) => {
            info!("Got EoS");
            return ControlFlow::Break(());
        }
        Error(err) => {
            error!(
                src = %src_name(),
                error = %err.error(),
                debug = ?err.debug(),
                "Pipeline error"
            );
            return ControlFlow::Break(());
        }
        Warning(warning) => {
            warn!(
                src = %src_name(),
                warning = %warning.error(),
                debug = ?warning.debug(),
                "Pipeline warning"
            );
        }
        Latency(_) => {
            debug!(src = %src_name(), "Latency requirements have changed");
            if let Err(err) = pipeline.recalculate_latency() {
                error!(%err, "Error recalculating latency");
            }
        }
        StateChanged(state_changed) if msg.src() == Some(pipeline.upcast_ref::<gst::Object>()) => {
            debug!(
                old = ?state_changed.old(),
                new = ?state_changed.current(),
                "Pipeline state changed"
            );
        }
        Application(_) => {
            let Some(s) = msg.structure() else {
                return ControlFlow::Continue(());
            };
            let pt = s.get::<u32>("pt").ok();
            match s.name().as_str() {
                BRANCH_LINKED => {
                    info!(pt, generation = s.get::<u64>("generation").ok(), "Branch linked");
                }
                PAYLOAD_TYPE_IGNORED => {
                    warn!(pt, "Payload type ignored, its data is dropped");
                }
                _ => (),
            }
        }
        _ => (),
    }

    ControlFlow::Continue(())
}

// SPDX-License-Identifier: MPL-2.0

use gst::glib;
use gst::prelude::*;
use tracing::debug;

use crate::error::{check_elements, Error};
use crate::payload::PayloadKind;
use crate::router::Router;
use crate::settings::Settings;

const INGEST_DESCRIPTION: &str = "srtsrc name=srtsrc ! queue ! rtpptdemux name=rtpdemux";

/// Builds the ingest path `srtsrc ! queue ! rtpptdemux` and hooks the
/// router up to the demuxer. The pipeline is returned in the `Null` state.
pub fn build_recv_pipeline(settings: &Settings) -> Result<(gst::Pipeline, Router), Error> {
    // Branch elements are only created once the first packet arrives,
    // check them upfront so a missing plugin is reported right away.
    check_elements(
        ["srtsrc", "queue", "rtpptdemux"]
            .into_iter()
            .chain(PayloadKind::Video.factories(settings))
            .chain(PayloadKind::Data.factories(settings)),
    )?;

    let pipeline = gst::parse::launch(INGEST_DESCRIPTION)?
        .downcast::<gst::Pipeline>()
        .map_err(|_| glib::bool_error!("Ingest description didn't produce a pipeline"))?;

    let srtsrc = pipeline
        .by_name("srtsrc")
        .ok_or(Error::NoSuchElement("srtsrc"))?;
    let rtpdemux = pipeline
        .by_name("rtpdemux")
        .ok_or(Error::NoSuchElement("rtpdemux"))?;

    srtsrc.set_property("uri", &settings.uri);
    if let Some(ref stream_id) = settings.stream_id {
        srtsrc.set_property("streamid", stream_id);
    }
    if let Some(latency) = settings.latency {
        srtsrc.set_property("latency", latency);
    }

    debug!(
        uri = %settings.uri,
        stream_id = ?settings.stream_id,
        latency = ?settings.latency,
        "Configured SRT source"
    );

    let router = Router::new(&pipeline, settings.clone());
    router.connect(&rtpdemux);

    Ok((pipeline, router))
}

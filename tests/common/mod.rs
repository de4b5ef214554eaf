// SPDX-License-Identifier: MPL-2.0

#![allow(dead_code)]

use gst::prelude::*;
use gstsrtrtprecv::{Router, Settings};
use rtp_types::RtpPacketBuilder;
use std::time::{Duration, Instant};

pub const TEST_SSRC: u32 = 0x12345678;
pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        gst::init().unwrap();
    });
}

/// Whether all `factories` are available, tests needing plugins that
/// aren't installed are skipped.
pub fn have_elements(factories: &[&str]) -> bool {
    let missing = factories
        .iter()
        .filter(|factory| gst::ElementFactory::find(factory).is_none())
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        eprintln!("Skipping, missing elements: {missing:?}");
        return false;
    }

    true
}

pub fn test_settings() -> Settings {
    Settings {
        video_sink: "fakesink".into(),
        dump_data: false,
        ..Settings::new("srt://127.0.0.1:7001")
    }
}

pub fn rtp_buffer(pt: u8, seqno: u16, payload: &[u8]) -> gst::Buffer {
    let packet = RtpPacketBuilder::new()
        .ssrc(TEST_SSRC)
        .payload_type(pt)
        .sequence_number(seqno)
        .timestamp(seqno as u32 * 3000)
        .payload(payload);
    let size = packet.calculate_size().unwrap();
    let mut data = vec![0; size];
    packet.write_into(&mut data).unwrap();
    gst::Buffer::from_mut_slice(data)
}

/// `appsrc ! queue ! rtpptdemux` with the router connected to the demuxer,
/// standing in for the SRT ingest path. Like `srtsrc`, the appsrc has no
/// caps, so the demuxer only knows what the router tells it.
pub fn appsrc_ingest(settings: Settings) -> (gst::Pipeline, gst_app::AppSrc, Router) {
    let pipeline = gst::parse::launch("appsrc name=src format=time ! queue ! rtpptdemux name=rtpdemux")
    .unwrap()
    .downcast::<gst::Pipeline>()
    .unwrap();

    let appsrc = pipeline
        .by_name("src")
        .unwrap()
        .downcast::<gst_app::AppSrc>()
        .unwrap();
    let rtpdemux = pipeline.by_name("rtpdemux").unwrap();

    let router = Router::new(&pipeline, settings);
    router.connect(&rtpdemux);

    (pipeline, appsrc, router)
}

/// Collects the application messages posted on the bus until EOS, an error
/// or the timeout, whichever comes first. Returns the terminal message too.
pub fn collect_messages(pipeline: &gst::Pipeline) -> (Vec<gst::Structure>, Option<gst::Message>) {
    let bus = pipeline.bus().unwrap();
    let deadline = Instant::now() + TIMEOUT;
    let mut structures = Vec::new();

    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        let Some(msg) = bus.timed_pop_filtered(
            gst::ClockTime::from_nseconds(remaining.as_nanos() as u64),
            &[
                gst::MessageType::Application,
                gst::MessageType::Eos,
                gst::MessageType::Error,
            ],
        ) else {
            break;
        };

        match msg.view() {
            gst::MessageView::Application(_) => {
                structures.push(msg.structure().unwrap().to_owned());
            }
            _ => return (structures, Some(msg)),
        }
    }

    (structures, None)
}

/// Waits until the branch routed for `pt` has seen at least `count` buffers.
pub fn wait_for_buffers(router: &Router, pt: u32, count: u64) -> u64 {
    let deadline = Instant::now() + TIMEOUT;

    loop {
        let buffers = router
            .stats()
            .into_iter()
            .find(|stats| stats.pt == pt)
            .map_or(0, |stats| stats.buffers);
        if buffers >= count || Instant::now() > deadline {
            return buffers;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Panics if an error message is pending on the bus.
pub fn assert_no_error(pipeline: &gst::Pipeline) {
    let bus = pipeline.bus().unwrap();
    if let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error]) {
        panic!("Unexpected error {msg:?}");
    }
}

/// Waits for an application message named `name` carrying payload type `pt`.
pub fn wait_for_application(pipeline: &gst::Pipeline, name: &str, pt: u32) -> gst::Structure {
    let bus = pipeline.bus().unwrap();
    let deadline = Instant::now() + TIMEOUT;

    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        let Some(msg) = bus.timed_pop_filtered(
            gst::ClockTime::from_nseconds(remaining.as_nanos() as u64),
            &[gst::MessageType::Application],
        ) else {
            break;
        };

        let s = msg.structure().unwrap();
        if s.name().as_str() == name && s.get::<u32>("pt").ok() == Some(pt) {
            return s.to_owned();
        }
    }

    panic!("No {name} message for payload type {pt}");
}

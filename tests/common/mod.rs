#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use webrtc_negotiation::engine::{EngineEvents, MediaEngine};
use webrtc_negotiation::error::EngineResult;
use webrtc_negotiation::session::signaling_state::RTCSignalingState;
use webrtc_negotiation::track::render_surface::{Rect, RenderSurface, Size};
use webrtc_negotiation::track::{MediaStream, TrackHandle};
use webrtc_negotiation::{
    Error, RTCIceCandidateInit, RTCIceConnectionState, RTCSessionDescription,
    SessionConfiguration, SessionEventHandler,
};

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// RecordingEngine records every engine call it receives as a string.
#[derive(Default)]
pub struct RecordingEngine {
    name: String,
    calls: Mutex<Vec<String>>,
    events: Mutex<Option<EngineEvents>>,
    failing_candidates: HashSet<String>,
}

impl RecordingEngine {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(RecordingEngine {
            name: name.to_owned(),
            ..Default::default()
        })
    }

    /// failing_on builds an engine that rejects the listed candidates.
    pub fn failing_on(name: &str, candidates: &[&str]) -> Arc<Self> {
        Arc::new(RecordingEngine {
            name: name.to_owned(),
            failing_candidates: candidates.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// events returns the handle the session bound this engine to.
    pub fn events(&self) -> EngineEvents {
        self.events
            .lock()
            .unwrap()
            .clone()
            .expect("engine is bound to a session")
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaEngine for RecordingEngine {
    fn bind(&self, events: EngineEvents, _configuration: &SessionConfiguration) {
        *self.events.lock().unwrap() = Some(events);
    }

    async fn create_offer(&self) -> EngineResult<RTCSessionDescription> {
        self.record("create_offer".to_owned());
        Ok(RTCSessionDescription::offer(format!("offer-from-{}", self.name)))
    }

    async fn create_answer(&self) -> EngineResult<RTCSessionDescription> {
        self.record("create_answer".to_owned());
        Ok(RTCSessionDescription::answer(format!(
            "answer-from-{}",
            self.name
        )))
    }

    async fn set_local_description(&self, desc: RTCSessionDescription) -> EngineResult<()> {
        self.record(format!("set_local({})", desc.sdp));
        Ok(())
    }

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> EngineResult<()> {
        self.record(format!("set_remote({})", desc.sdp));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> EngineResult<()> {
        self.record(format!("add_ice_candidate({})", candidate.candidate));
        if self.failing_candidates.contains(&candidate.candidate) {
            return Err(anyhow::anyhow!("malformed candidate {}", candidate.candidate).into());
        }
        Ok(())
    }

    async fn add_track(&self, track: &TrackHandle, _stream_ids: &[String]) -> EngineResult<()> {
        self.record(format!("add_track({})", track.id));
        Ok(())
    }

    async fn close(&self) -> EngineResult<()> {
        self.record("close".to_owned());
        Ok(())
    }
}

/// RecordingHandler records every session event it is handed.
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingHandler::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl SessionEventHandler for RecordingHandler {
    async fn on_ice_candidate(&self, candidate: RTCIceCandidateInit) {
        self.record(format!("candidate({})", candidate.candidate));
    }

    async fn on_ice_connection_state_change(&self, state: RTCIceConnectionState) {
        self.record(format!("state({state})"));
    }

    async fn on_connected(&self) {
        self.record("connected".to_owned());
    }

    async fn on_disconnected(&self) {
        self.record("disconnected".to_owned());
    }

    async fn on_signaling_state_change(&self, state: RTCSignalingState) {
        self.record(format!("signaling({state})"));
    }

    async fn on_remote_stream(&self, stream: MediaStream) {
        self.record(format!("remote_stream({})", stream.id));
    }

    async fn on_negotiation_failure(&self, err: Error) {
        self.record(format!("failure({err})"));
    }
}

/// RecordingSurface tracks which tracks are attached to it.
pub struct RecordingSurface {
    id: String,
    bounds: Size,
    attached: Mutex<Vec<String>>,
    frames: Mutex<Vec<Rect>>,
}

impl RecordingSurface {
    pub fn new(id: &str, width: f64, height: f64) -> Arc<Self> {
        Arc::new(RecordingSurface {
            id: id.to_owned(),
            bounds: Size::new(width, height),
            attached: Mutex::new(vec![]),
            frames: Mutex::new(vec![]),
        })
    }

    pub fn attached(&self) -> Vec<String> {
        self.attached.lock().unwrap().clone()
    }

    pub fn last_frame(&self) -> Option<Rect> {
        self.frames.lock().unwrap().last().copied()
    }
}

impl RenderSurface for RecordingSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Size {
        self.bounds
    }

    fn attach_track(&self, track: &TrackHandle) {
        self.attached.lock().unwrap().push(track.id.clone());
    }

    fn detach_track(&self, track: &TrackHandle) {
        self.attached.lock().unwrap().retain(|id| id != &track.id);
    }

    fn set_render_frame(&self, frame: Rect) {
        self.frames.lock().unwrap().push(frame);
    }
}

pub fn candidate(raw: &str) -> RTCIceCandidateInit {
    RTCIceCandidateInit::new(raw, "0", 0)
}

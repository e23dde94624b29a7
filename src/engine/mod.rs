//! The boundary between a [`NegotiationSession`] and the media engine that
//! owns codecs, transports and the raw connection.
//!
//! [`NegotiationSession`]: crate::session::NegotiationSession

use std::fmt;
use std::sync::Weak;

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::ice_transport::ice_candidate::RTCIceCandidateInit;
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::sdp::session_description::RTCSessionDescription;
use crate::session::configuration::SessionConfiguration;
use crate::session::operation::Operation;
use crate::session::SessionInternal;
use crate::track::capture::CaptureFormat;
use crate::track::{MediaStream, TrackHandle};

/// MediaEngine is implemented by the WebRTC stack a session drives.
///
/// Operations may complete on any thread. Events are reported through the
/// [`EngineEvents`] handed to [`MediaEngine::bind`], which never blocks and
/// may be called from the engine's own threads.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// bind is called once, when the session is built.
    fn bind(&self, events: EngineEvents, configuration: &SessionConfiguration);

    async fn create_offer(&self) -> EngineResult<RTCSessionDescription>;

    async fn create_answer(&self) -> EngineResult<RTCSessionDescription>;

    async fn set_local_description(&self, desc: RTCSessionDescription) -> EngineResult<()>;

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> EngineResult<()>;

    async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> EngineResult<()>;

    async fn add_track(&self, track: &TrackHandle, stream_ids: &[String]) -> EngineResult<()>;

    /// capture_formats lists the camera modes on offer. Capturers that are
    /// not backed by a device report none.
    fn capture_formats(&self) -> Vec<CaptureFormat> {
        vec![]
    }

    async fn start_capture(&self, _format: Option<CaptureFormat>, _fps: u32) -> EngineResult<()> {
        Ok(())
    }

    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

/// EngineEvent is a notification raised by the media engine.
#[derive(Debug)]
pub(crate) enum EngineEvent {
    LocalCandidate(RTCIceCandidateInit),
    IceConnectionStateChange(RTCIceConnectionState),
    RemoteStreamAdded(MediaStream),
    RemoteStreamRemoved(String),
    Error(EngineError),
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::LocalCandidate(candidate) => write!(f, "local candidate {candidate}"),
            EngineEvent::IceConnectionStateChange(state) => {
                write!(f, "ice connection state {state}")
            }
            EngineEvent::RemoteStreamAdded(stream) => write!(f, "remote stream {} added", stream.id),
            EngineEvent::RemoteStreamRemoved(id) => write!(f, "remote stream {id} removed"),
            EngineEvent::Error(err) => write!(f, "engine error {err}"),
        }
    }
}

/// EngineEvents is the engine's handle back into its session.
///
/// Every event is queued and processed on the session's own context, in
/// the order it was reported. Events reported after the session is closed
/// or dropped are discarded.
#[derive(Clone)]
pub struct EngineEvents {
    session: Weak<SessionInternal>,
}

impl EngineEvents {
    pub(crate) fn new(session: Weak<SessionInternal>) -> Self {
        EngineEvents { session }
    }

    /// on_local_candidate reports a candidate gathered by the engine.
    pub fn on_local_candidate(&self, candidate: RTCIceCandidateInit) {
        self.emit(EngineEvent::LocalCandidate(candidate));
    }

    pub fn on_ice_connection_state_change(&self, state: RTCIceConnectionState) {
        self.emit(EngineEvent::IceConnectionStateChange(state));
    }

    pub fn on_remote_stream_added(&self, stream: MediaStream) {
        self.emit(EngineEvent::RemoteStreamAdded(stream));
    }

    pub fn on_remote_stream_removed(&self, stream_id: impl Into<String>) {
        self.emit(EngineEvent::RemoteStreamRemoved(stream_id.into()));
    }

    /// on_error reports a failure with no pending operation to return it to.
    pub fn on_error(&self, err: EngineError) {
        self.emit(EngineEvent::Error(err));
    }

    fn emit(&self, event: EngineEvent) {
        let Some(internal) = self.session.upgrade() else {
            log::trace!("dropping {event}, session is gone");
            return;
        };
        if internal.is_closed() {
            log::trace!("dropping {event}, session {} is closed", internal.id);
            return;
        }

        let session = self.session.clone();
        let result = internal.ops.enqueue(Operation::new(
            move || {
                Box::pin(async move {
                    match session.upgrade() {
                        Some(internal) => internal.handle_engine_event(event).await,
                        None => log::trace!("dropping {event}, session is gone"),
                    }
                })
            },
            "EngineEvents::emit",
        ));
        if let Err(err) = result {
            log::trace!("failed to queue engine event: {err}");
        }
    }
}

impl fmt::Debug for EngineEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEvents")
            .field("alive", &(self.session.strong_count() > 0))
            .finish()
    }
}

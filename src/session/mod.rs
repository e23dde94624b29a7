//! The offer/answer negotiation state machine.

pub(crate) mod candidate_buffer;
pub mod configuration;
pub(crate) mod connectivity;
pub mod event_handler;
pub mod negotiation_state;
pub(crate) mod operation;
pub mod signaling_state;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::engine::{EngineEvent, EngineEvents, MediaEngine};
use crate::error::{EngineError, Error, Result};
use crate::ice_transport::ice_candidate::RTCIceCandidateInit;
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::sdp::sdp_type::RTCSdpType;
use crate::sdp::session_description::RTCSessionDescription;
use crate::track::capture::select_capture_format;
use crate::track::render_surface::{Rect, RenderSurface, Size};
use crate::track::track_manager::TrackManager;
use crate::track::{LocalTracks, MediaStream};
use candidate_buffer::CandidateBuffer;
use configuration::SessionConfiguration;
use connectivity::{ConnectivityEdge, ConnectivityMonitor};
use event_handler::{NoopEventHandler, SessionEvent, SessionEventHandler};
use negotiation_state::{NegotiationOp, NegotiationState, StateChangeOp};
use operation::{Operation, Operations};
use signaling_state::RTCSignalingState;

const SESSION_ID_LEN: usize = 16;

/// SessionSnapshot is a copy of a session's state taken at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub negotiation: NegotiationState,
    pub is_connected: bool,
    pub ice_connection_state: RTCIceConnectionState,
    /// Remote candidates waiting for the remote description.
    pub buffered_candidates: usize,
    pub local_tracks: Option<LocalTracks>,
    pub is_closed: bool,
}

#[derive(Default)]
struct SessionState {
    negotiation: NegotiationState,
    connectivity: ConnectivityMonitor,
    candidates: CandidateBuffer,
    local_tracks: Option<LocalTracks>,
}

pub(crate) struct SessionInternal {
    pub(crate) id: String,
    configuration: SessionConfiguration,
    engine: Arc<dyn MediaEngine>,
    handler: Arc<dyn SessionEventHandler>,
    /// Held for the whole of every public operation.
    state: Mutex<SessionState>,
    tracks: TrackManager,
    remote_surface: Option<Arc<dyn RenderSurface>>,
    pub(crate) ops: Operations,
    runtime: Handle,
    is_closed: AtomicBool,
}

impl SessionInternal {
    pub(crate) fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ErrSessionClosed)
        } else {
            Ok(())
        }
    }

    fn engine_failure(&self, op: NegotiationOp, err: EngineError) -> Error {
        log::warn!("session {} failed to {op}: {err}", self.id);
        Error::engine(op, err)
    }

    /// expect_engine_sdp_type rejects a description of the wrong type produced
    /// by the engine itself.
    fn expect_engine_sdp_type(
        &self,
        desc: &RTCSessionDescription,
        expected: RTCSdpType,
        op: NegotiationOp,
    ) -> Result<()> {
        if desc.sdp_type == expected {
            return Ok(());
        }
        Err(self.engine_failure(
            op,
            format!("produced {} description, expected {expected}", desc.sdp_type).into(),
        ))
    }

    /// emit queues `event` for delivery after every event raised before it.
    fn emit(&self, event: SessionEvent) {
        let handler = Arc::clone(&self.handler);
        let result = self.ops.enqueue(Operation::new(
            move || {
                Box::pin(async move {
                    event.dispatch(&*handler).await;
                })
            },
            "SessionInternal::emit",
        ));
        if let Err(err) = result {
            log::trace!("session {} dropped an event: {err}", self.id);
        }
    }

    fn commit(&self, state: &mut SessionState, next: NegotiationState) {
        let previous = state.negotiation.signaling_state();
        state.negotiation = next;

        let current = next.signaling_state();
        if previous != current {
            log::info!(
                "session {} signaling state changed {previous} -> {current}",
                self.id
            );
            self.emit(SessionEvent::SignalingStateChange(current));
        }
    }

    async fn apply_local_description(
        &self,
        state: &mut SessionState,
        desc: RTCSessionDescription,
    ) -> Result<()> {
        let next = state.negotiation.next(StateChangeOp::SetLocal, desc.sdp_type)?;
        self.engine
            .set_local_description(desc)
            .await
            .map_err(|err| self.engine_failure(NegotiationOp::SetLocalDescription, err))?;
        self.check_open()?;

        log::debug!("session {} applied local description", self.id);
        self.commit(state, next);
        Ok(())
    }

    async fn apply_remote_description(
        &self,
        state: &mut SessionState,
        desc: RTCSessionDescription,
    ) -> Result<()> {
        let next = state
            .negotiation
            .next(StateChangeOp::SetRemote, desc.sdp_type)?;
        self.engine
            .set_remote_description(desc)
            .await
            .map_err(|err| self.engine_failure(NegotiationOp::SetRemoteDescription, err))?;
        self.check_open()?;

        log::debug!("session {} applied remote description", self.id);
        self.commit(state, next);
        Ok(())
    }

    /// flush_candidates applies every buffered remote candidate in arrival
    /// order. A candidate the engine rejects is reported as a negotiation
    /// failure and the rest are still applied.
    async fn flush_candidates(&self, state: &mut SessionState) -> Result<()> {
        let candidates = state.candidates.flush();
        if candidates.is_empty() {
            return Ok(());
        }

        log::debug!(
            "session {} flushing {} buffered candidate(s)",
            self.id,
            candidates.len()
        );
        for candidate in candidates {
            let result = self.engine.add_ice_candidate(candidate).await;
            self.check_open()?;
            if let Err(err) = result {
                let err = self.engine_failure(NegotiationOp::AddIceCandidate, err);
                self.emit(SessionEvent::NegotiationFailure(err));
            }
        }

        Ok(())
    }

    /// handle_engine_event runs on the session's event context.
    pub(crate) async fn handle_engine_event(&self, event: EngineEvent) {
        if self.is_closed() {
            log::trace!("session {} is closed, dropping {event}", self.id);
            return;
        }
        log::trace!("session {} handling {event}", self.id);

        let events = match event {
            EngineEvent::LocalCandidate(candidate) => vec![SessionEvent::IceCandidate(candidate)],
            EngineEvent::IceConnectionStateChange(ice_state) => {
                let mut state = self.state.lock().await;
                if self.is_closed() {
                    log::trace!("session {} closed while waiting, dropping {ice_state}", self.id);
                    return;
                }

                let mut events = vec![SessionEvent::IceConnectionStateChange(ice_state)];
                match state.connectivity.update(ice_state) {
                    Some(ConnectivityEdge::Connected) => {
                        log::info!("session {} connected ({ice_state})", self.id);
                        events.push(SessionEvent::Connected);
                    }
                    Some(ConnectivityEdge::Disconnected) => {
                        log::info!("session {} disconnected ({ice_state})", self.id);
                        events.push(SessionEvent::Disconnected);
                    }
                    None => {}
                }
                events
            }
            EngineEvent::RemoteStreamAdded(stream) => self.bind_remote_stream(stream),
            EngineEvent::RemoteStreamRemoved(stream_id) => {
                if !self.tracks.detach_remote_stream(&stream_id) {
                    log::trace!("remote stream {stream_id} was not rendered");
                }
                vec![]
            }
            EngineEvent::Error(err) => {
                let err = self.engine_failure(NegotiationOp::EngineCallback, err);
                vec![SessionEvent::NegotiationFailure(err)]
            }
        };

        for event in events {
            event.dispatch(&*self.handler).await;
        }
    }

    fn bind_remote_stream(&self, stream: MediaStream) -> Vec<SessionEvent> {
        let mut events = vec![];

        match &self.remote_surface {
            Some(surface) => {
                if let Err(err) = self.tracks.attach_remote_stream(&stream, Arc::clone(surface)) {
                    log::warn!("session {} failed to bind remote stream: {err}", self.id);
                    events.push(SessionEvent::NegotiationFailure(err));
                }
            }
            None => log::debug!(
                "session {} has no remote surface, stream {} is not rendered",
                self.id,
                stream.id
            ),
        }

        events.push(SessionEvent::RemoteStream(stream));
        events
    }
}

fn expect_sdp_type(desc: &RTCSessionDescription, expected: RTCSdpType) -> Result<()> {
    if desc.sdp_type == expected {
        Ok(())
    } else {
        Err(Error::ErrSdpTypeMismatch {
            expected,
            actual: desc.sdp_type,
        })
    }
}

/// NegotiationSession drives one offer/answer exchange with a remote peer.
///
/// Public operations are serialized: each one holds the session state for
/// its whole duration, engine calls included. Engine events and handler
/// invocations run one at a time on the session's event context. After
/// [`NegotiationSession::close`], operations fail with `ErrSessionClosed`
/// and engine operations still in flight complete without effect.
pub struct NegotiationSession {
    internal: Arc<SessionInternal>,
}

impl NegotiationSession {
    pub fn id(&self) -> &str {
        &self.internal.id
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.internal.configuration
    }

    pub fn track_manager(&self) -> &TrackManager {
        &self.internal.tracks
    }

    /// create_offer asks the engine for an offer and applies it as the local
    /// description. The offer is only returned once it is applied.
    pub async fn create_offer(&self) -> Result<RTCSessionDescription> {
        let internal = &self.internal;
        internal.check_open()?;
        let mut state = internal.state.lock().await;
        internal.check_open()?;
        state.negotiation.check(NegotiationOp::CreateOffer)?;

        let offer = internal
            .engine
            .create_offer()
            .await
            .map_err(|err| internal.engine_failure(NegotiationOp::CreateOffer, err))?;
        internal.check_open()?;
        internal.expect_engine_sdp_type(&offer, RTCSdpType::Offer, NegotiationOp::CreateOffer)?;
        log::debug!("session {} created offer", internal.id);

        internal
            .apply_local_description(&mut state, offer.clone())
            .await?;

        Ok(offer)
    }

    /// accept_offer applies the remote offer, applies any candidates that
    /// arrived before it, then creates and applies the answer it returns.
    pub async fn accept_offer(&self, offer: RTCSessionDescription) -> Result<RTCSessionDescription> {
        let internal = &self.internal;
        internal.check_open()?;
        let mut state = internal.state.lock().await;
        internal.check_open()?;
        state.negotiation.check(NegotiationOp::AcceptOffer)?;
        expect_sdp_type(&offer, RTCSdpType::Offer)?;

        internal.apply_remote_description(&mut state, offer).await?;
        internal.flush_candidates(&mut state).await?;

        let answer = internal
            .engine
            .create_answer()
            .await
            .map_err(|err| internal.engine_failure(NegotiationOp::CreateAnswer, err))?;
        internal.check_open()?;
        internal.expect_engine_sdp_type(
            &answer,
            RTCSdpType::Answer,
            NegotiationOp::CreateAnswer,
        )?;
        log::debug!("session {} created answer", internal.id);

        internal
            .apply_local_description(&mut state, answer.clone())
            .await?;

        Ok(answer)
    }

    /// accept_answer applies the remote answer to an offer this session
    /// created, then applies any candidates that arrived before it.
    pub async fn accept_answer(&self, answer: RTCSessionDescription) -> Result<()> {
        let internal = &self.internal;
        internal.check_open()?;
        let mut state = internal.state.lock().await;
        internal.check_open()?;
        state.negotiation.check(NegotiationOp::AcceptAnswer)?;
        expect_sdp_type(&answer, RTCSdpType::Answer)?;

        internal.apply_remote_description(&mut state, answer).await?;
        internal.flush_candidates(&mut state).await
    }

    /// add_remote_candidate applies a candidate received from the remote
    /// peer. Until the remote description is set the candidate is buffered.
    pub async fn add_remote_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()> {
        let internal = &self.internal;
        internal.check_open()?;
        let mut state = internal.state.lock().await;
        internal.check_open()?;

        if !state.negotiation.has_remote_description {
            log::debug!("session {} buffering remote candidate {candidate}", internal.id);
            state.candidates.append(candidate);
            return Ok(());
        }

        internal
            .engine
            .add_ice_candidate(candidate)
            .await
            .map_err(|err| internal.engine_failure(NegotiationOp::AddIceCandidate, err))?;
        internal.check_open()
    }

    /// setup_local_media adds the local audio and video tracks to the engine,
    /// binds them to `surface` and starts capturing. It must run before
    /// negotiation starts. Running it again only moves the tracks to
    /// `surface`.
    pub async fn setup_local_media(&self, surface: Arc<dyn RenderSurface>) -> Result<LocalTracks> {
        let internal = &self.internal;
        internal.check_open()?;
        let mut state = internal.state.lock().await;
        internal.check_open()?;

        if let Some(tracks) = &state.local_tracks {
            internal.tracks.attach_local_tracks(
                tracks.audio.clone(),
                tracks.video.clone(),
                surface,
            )?;
            return Ok(tracks.clone());
        }
        state.negotiation.check(NegotiationOp::SetupLocalMedia)?;

        let constraints = internal.configuration.capture;
        let formats = internal.engine.capture_formats();
        let format = if formats.is_empty() {
            None
        } else {
            Some(select_capture_format(&formats, &constraints).ok_or(
                Error::ErrNoCaptureFormat {
                    width: constraints.width,
                    height: constraints.height.unwrap_or_default(),
                    fps: constraints.fps,
                },
            )?)
        };

        let tracks = LocalTracks::from_configuration(&internal.configuration);
        let stream_ids = [internal.configuration.stream_id.clone()];
        for track in [&tracks.audio, &tracks.video] {
            internal
                .engine
                .add_track(track, &stream_ids)
                .await
                .map_err(|err| internal.engine_failure(NegotiationOp::AddTrack, err))?;
            internal.check_open()?;
        }

        internal.tracks.attach_local_tracks(
            tracks.audio.clone(),
            tracks.video.clone(),
            surface,
        )?;

        match &format {
            Some(format) => log::debug!(
                "session {} capturing {}x{} at {} fps",
                internal.id,
                format.width,
                format.height,
                constraints.fps
            ),
            None => log::debug!(
                "session {} capturing without a device format at {} fps",
                internal.id,
                constraints.fps
            ),
        }
        internal
            .engine
            .start_capture(format, constraints.fps)
            .await
            .map_err(|err| internal.engine_failure(NegotiationOp::StartCapture, err))?;
        internal.check_open()?;

        state.local_tracks = Some(tracks.clone());
        Ok(tracks)
    }

    /// on_video_size_changed recomputes the render frame of the local or
    /// remote surface with id `surface_id`.
    pub fn on_video_size_changed(&self, surface_id: &str, natural: Size) -> Option<Rect> {
        self.internal.tracks.on_video_size_changed(surface_id, natural)
    }

    pub async fn state(&self) -> SessionSnapshot {
        let state = self.internal.state.lock().await;
        SessionSnapshot {
            negotiation: state.negotiation,
            is_connected: state.connectivity.is_connected(),
            ice_connection_state: state.connectivity.state(),
            buffered_candidates: state.candidates.len(),
            local_tracks: state.local_tracks.clone(),
            is_closed: self.internal.is_closed(),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.internal.state.lock().await.connectivity.is_connected()
    }

    pub async fn signaling_state(&self) -> RTCSignalingState {
        if self.internal.is_closed() {
            return RTCSignalingState::Closed;
        }
        self.internal.state.lock().await.negotiation.signaling_state()
    }

    pub fn is_closed(&self) -> bool {
        self.internal.is_closed()
    }

    /// done waits until every event raised so far has been delivered. After
    /// close it returns once the event queue has stopped.
    pub async fn done(&self) {
        self.internal.ops.done().await;
    }

    /// close releases every surface binding and closes the engine. Events
    /// raised before close are still delivered, followed by the closed
    /// signaling state; events the engine reports afterwards are dropped.
    /// Closing twice is a no-op. It may be called from an event handler.
    pub async fn close(&self) -> Result<()> {
        let internal = &self.internal;
        if internal.is_closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log::info!("closing session {}", internal.id);

        internal.tracks.detach_all();
        let result = internal
            .engine
            .close()
            .await
            .map_err(|err| internal.engine_failure(NegotiationOp::Close, err));

        internal.emit(SessionEvent::SignalingStateChange(RTCSignalingState::Closed));
        internal.ops.close();

        result
    }
}

impl Drop for NegotiationSession {
    fn drop(&mut self) {
        let internal = &self.internal;
        if internal.is_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("session {} dropped without close", internal.id);

        internal.tracks.detach_all();
        let engine = Arc::clone(&internal.engine);
        let id = internal.id.clone();
        internal.runtime.spawn(async move {
            if let Err(err) = engine.close().await {
                log::warn!("session {id} failed to close engine: {err}");
            }
        });
    }
}

/// SessionBuilder assembles a [`NegotiationSession`].
#[derive(Default)]
pub struct SessionBuilder {
    configuration: Option<SessionConfiguration>,
    engine: Option<Arc<dyn MediaEngine>>,
    handler: Option<Arc<dyn SessionEventHandler>>,
    remote_surface: Option<Arc<dyn RenderSurface>>,
    runtime: Option<Handle>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder::default()
    }

    pub fn with_configuration(mut self, configuration: SessionConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// with_engine provides the media engine the session drives. Required.
    pub fn with_engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn SessionEventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// with_remote_surface provides the surface remote video is rendered on.
    pub fn with_remote_surface(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.remote_surface = Some(surface);
        self
    }

    /// with_event_runtime selects the runtime events are delivered on. The
    /// runtime of the calling task is used by default.
    pub fn with_event_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(mut self) -> Result<NegotiationSession> {
        let configuration = self.configuration.take().unwrap_or_default();
        configuration.validate()?;

        let engine = self.engine.take().ok_or(Error::ErrMediaEngineRequired)?;
        let handler: Arc<dyn SessionEventHandler> = match self.handler.take() {
            Some(handler) => handler,
            None => Arc::new(NoopEventHandler),
        };
        let runtime = match self.runtime.take() {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::ErrNoRuntime)?,
        };

        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();

        let internal = Arc::new(SessionInternal {
            id,
            tracks: TrackManager::new(configuration.strict_bindings),
            configuration,
            engine: Arc::clone(&engine),
            handler,
            state: Mutex::new(SessionState::default()),
            remote_surface: self.remote_surface.take(),
            ops: Operations::new(&runtime),
            runtime,
            is_closed: AtomicBool::new(false),
        });

        engine.bind(
            EngineEvents::new(Arc::downgrade(&internal)),
            &internal.configuration,
        );
        log::debug!("session {} created", internal.id);

        Ok(NegotiationSession { internal })
    }
}

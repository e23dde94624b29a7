//! Event handler trait for negotiation session events

use crate::error::Error;
use crate::ice_transport::ice_candidate::RTCIceCandidateInit;
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::session::signaling_state::RTCSignalingState;
use crate::track::MediaStream;

/// Trait for handling negotiation session events asynchronously
///
/// Events are delivered one at a time, in the order they were raised, on
/// the runtime the session was built with; never on the media engine's
/// threads. All methods have default no-op implementations.
///
/// # Example
///
/// ```no_run
/// use webrtc_negotiation::{RTCIceCandidateInit, SessionEventHandler};
///
/// struct MyHandler;
///
/// #[async_trait::async_trait]
/// impl SessionEventHandler for MyHandler {
///     async fn on_ice_candidate(&self, candidate: RTCIceCandidateInit) {
///         // Send to remote peer via signaling
///         println!("New ICE candidate: {candidate}");
///     }
///
///     async fn on_connected(&self) {
///         println!("connected");
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait SessionEventHandler: Send + Sync + 'static {
    /// Called when the engine generates a local ICE candidate
    async fn on_ice_candidate(&self, _candidate: RTCIceCandidateInit) {}

    /// Called for every ICE connection state the engine reports
    async fn on_ice_connection_state_change(&self, _state: RTCIceConnectionState) {}

    /// Called once when the session becomes connected
    async fn on_connected(&self) {}

    /// Called once when a connected session loses connectivity
    async fn on_disconnected(&self) {}

    /// Called when the derived signaling state changes
    async fn on_signaling_state_change(&self, _state: RTCSignalingState) {}

    /// Called when the remote peer's media stream arrives
    async fn on_remote_stream(&self, _stream: MediaStream) {}

    /// Called for failures raised while processing engine events, which have
    /// no caller to return an error to
    async fn on_negotiation_failure(&self, _err: Error) {}
}

/// SessionEvent is the closed set of events the session raises.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    IceCandidate(RTCIceCandidateInit),
    IceConnectionStateChange(RTCIceConnectionState),
    Connected,
    Disconnected,
    SignalingStateChange(RTCSignalingState),
    RemoteStream(MediaStream),
    NegotiationFailure(Error),
}

impl SessionEvent {
    pub(crate) async fn dispatch(self, handler: &dyn SessionEventHandler) {
        match self {
            SessionEvent::IceCandidate(candidate) => handler.on_ice_candidate(candidate).await,
            SessionEvent::IceConnectionStateChange(state) => {
                handler.on_ice_connection_state_change(state).await
            }
            SessionEvent::Connected => handler.on_connected().await,
            SessionEvent::Disconnected => handler.on_disconnected().await,
            SessionEvent::SignalingStateChange(state) => {
                handler.on_signaling_state_change(state).await
            }
            SessionEvent::RemoteStream(stream) => handler.on_remote_stream(stream).await,
            SessionEvent::NegotiationFailure(err) => handler.on_negotiation_failure(err).await,
        }
    }
}

/// NoopEventHandler is used when a session is built without a handler.
pub(crate) struct NoopEventHandler;

impl SessionEventHandler for NoopEventHandler {}

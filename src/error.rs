use thiserror::Error;

use crate::sdp::sdp_type::RTCSdpType;
use crate::session::negotiation_state::{NegotiationOp, NegotiationState};

pub type Result<T> = std::result::Result<T, Error>;

/// Opaque cause reported by a [`MediaEngine`](crate::engine::MediaEngine).
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum Error {
    /// ErrInvalidState indicates that an operation was invoked in a
    /// negotiation state that forbids it.
    #[error("{op} can not be run in negotiation state {state}")]
    ErrInvalidState {
        op: NegotiationOp,
        state: NegotiationState,
    },

    /// ErrSdpTypeMismatch indicates that a session description of the wrong
    /// type was handed to an operation, or produced by the engine.
    #[error("expected {expected} session description, got {actual}")]
    ErrSdpTypeMismatch {
        expected: RTCSdpType,
        actual: RTCSdpType,
    },

    /// ErrEngineFailure indicates that the media engine rejected an operation.
    #[error("media engine failed to {op}: {source}")]
    ErrEngineFailure {
        op: NegotiationOp,
        #[source]
        source: EngineError,
    },

    /// ErrBindingConflict indicates that a track was bound to a surface while
    /// still bound to another one and strict bindings are enabled.
    #[error("track {track} is already bound to surface {surface}")]
    ErrBindingConflict { track: String, surface: String },

    /// ErrSessionClosed indicates an operation executed after the session
    /// has already been closed.
    #[error("negotiation session closed")]
    ErrSessionClosed,

    /// ErrNoTurnCredentials indicates that a TURN server URL was provided
    /// without required credentials.
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,

    /// ErrTurnCredentials indicates that provided TURN credentials are partial
    /// or malformed.
    #[error("invalid turn server credentials")]
    ErrTurnCredentials,

    /// ErrMediaEngineRequired indicates that a session was built without a
    /// media engine.
    #[error("a media engine is required to build a session")]
    ErrMediaEngineRequired,

    /// ErrNoRuntime indicates that no tokio runtime was available to deliver
    /// session events on.
    #[error("no tokio runtime available for event delivery")]
    ErrNoRuntime,

    #[error("invalid session configuration: {0}")]
    ErrInvalidConfiguration(String),

    #[error("invalid ice server url {0}")]
    ErrInvalidIceServerUrl(String),

    /// ErrNoCaptureFormat indicates that the engine offers capture formats
    /// but none of them satisfies the configured constraints.
    #[error("no capture format matches {width}x{height}@{fps}")]
    ErrNoCaptureFormat { width: u32, height: u32, fps: u32 },

    #[error("JsonError: {0}")]
    ErrJson(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn engine(op: NegotiationOp, source: EngineError) -> Self {
        Error::ErrEngineFailure { op, source }
    }

    /// is_invalid_state reports protocol misuse by the caller.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Error::ErrInvalidState { .. } | Error::ErrSdpTypeMismatch { .. }
        )
    }

    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Error::ErrEngineFailure { .. })
    }

    pub fn is_binding_conflict(&self) -> bool {
        matches!(self, Error::ErrBindingConflict { .. })
    }
}

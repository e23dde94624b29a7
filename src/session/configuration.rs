use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ice_transport::ice_server::RTCIceServer;
use crate::track::capture::CaptureConstraints;

pub(crate) const DEFAULT_ICE_SERVER_URL: &str = "stun:stun.l.google.com:19302";

/// Defines the set of parameters a [`NegotiationSession`] is built with.
/// A configuration is validated once, when the session is built, and is
/// treated as readonly afterwards.
///
/// [`NegotiationSession`]: crate::session::NegotiationSession
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Defines the STUN and TURN servers handed to the media engine.
    pub ice_servers: Vec<RTCIceServer>,

    /// Stream id the local tracks are added to the engine under.
    pub stream_id: String,

    pub audio_track_id: String,
    pub video_track_id: String,

    /// Capture mode requested from the engine's camera.
    pub capture: CaptureConstraints,

    /// When set, binding a track to a second surface without detaching it
    /// first fails with `ErrBindingConflict` instead of moving the track.
    pub strict_bindings: bool,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        SessionConfiguration {
            ice_servers: vec![RTCIceServer::new(DEFAULT_ICE_SERVER_URL)],
            stream_id: "stream0".to_owned(),
            audio_track_id: "audio0".to_owned(),
            video_track_id: "video0".to_owned(),
            capture: CaptureConstraints::default(),
            strict_bindings: false,
        }
    }
}

impl SessionConfiguration {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for ice_server in &self.ice_servers {
            ice_server.validate()?;
        }

        for (name, id) in [
            ("stream_id", &self.stream_id),
            ("audio_track_id", &self.audio_track_id),
            ("video_track_id", &self.video_track_id),
        ] {
            if id.is_empty() {
                return Err(Error::ErrInvalidConfiguration(format!("{name} is empty")));
            }
        }

        if self.audio_track_id == self.video_track_id {
            return Err(Error::ErrInvalidConfiguration(
                "audio and video tracks share an id".to_owned(),
            ));
        }

        if self.capture.width == 0 || self.capture.height == Some(0) || self.capture.fps == 0 {
            return Err(Error::ErrInvalidConfiguration(format!(
                "capture constraints {}x{:?}@{} are empty",
                self.capture.width, self.capture.height, self.capture.fps
            )));
        }

        Ok(())
    }
}

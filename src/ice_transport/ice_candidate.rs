use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// ICECandidateInit is used to serialize ice candidates exchanged over the
/// signaling channel.
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#dom-rtcicecandidateinit
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    pub candidate: String,
    pub sdp_mid: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl RTCIceCandidateInit {
    pub fn new(
        candidate: impl Into<String>,
        sdp_mid: impl Into<String>,
        sdp_mline_index: u16,
    ) -> Self {
        RTCIceCandidateInit {
            candidate: candidate.into(),
            sdp_mid: sdp_mid.into(),
            sdp_mline_index,
            username_fragment: None,
        }
    }

    /// to_json encodes the `{"candidate", "sdpMid", "sdpMLineIndex"}`
    /// signaling envelope.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Display for RTCIceCandidateInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}",
            self.sdp_mid, self.sdp_mline_index, self.candidate
        )
    }
}

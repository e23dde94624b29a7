use serde::{Deserialize, Serialize};

use super::sdp_type::RTCSdpType;
use crate::error::Result;

/// SessionDescription is the offer or answer blob exchanged with the remote
/// peer. The `sdp` payload is opaque to the session and is passed to the
/// engine exactly as received.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,

    pub sdp: String,
}

impl RTCSessionDescription {
    /// Given SDP representing an offer, wrap it in an RTCSessionDescription
    /// that can be given to the session.
    pub fn offer(sdp: impl Into<String>) -> Self {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Given SDP representing an answer, wrap it in an RTCSessionDescription
    /// that can be given to the session.
    pub fn answer(sdp: impl Into<String>) -> Self {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// to_json encodes the `{"type": ..., "sdp": ...}` signaling envelope.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

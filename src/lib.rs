#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod engine;
pub mod error;
pub mod ice_transport;
pub mod sdp;
pub mod session;
pub mod track;

pub use engine::{EngineEvents, MediaEngine};
pub use error::{Error, Result};
pub use ice_transport::ice_candidate::RTCIceCandidateInit;
pub use ice_transport::ice_connection_state::RTCIceConnectionState;
pub use sdp::sdp_type::RTCSdpType;
pub use sdp::session_description::RTCSessionDescription;
pub use session::configuration::SessionConfiguration;
pub use session::event_handler::SessionEventHandler;
pub use session::{NegotiationSession, SessionBuilder, SessionSnapshot};

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

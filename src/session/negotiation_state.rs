use std::fmt;

use crate::error::{Error, Result};
use crate::sdp::sdp_type::RTCSdpType;
use crate::session::signaling_state::RTCSignalingState;

/// NegotiationRole is the side of the offer/answer exchange a session has
/// committed to.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum NegotiationRole {
    #[default]
    Idle,
    Offerer,
    Answerer,
}

impl fmt::Display for NegotiationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            NegotiationRole::Idle => "idle",
            NegotiationRole::Offerer => "offerer",
            NegotiationRole::Answerer => "answerer",
        };
        write!(f, "{s}")
    }
}

/// NegotiationOp names the session operations and the engine steps they are
/// made of, for error reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NegotiationOp {
    CreateOffer,
    AcceptOffer,
    AcceptAnswer,
    SetupLocalMedia,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
    AddIceCandidate,
    AddTrack,
    StartCapture,
    EngineCallback,
    Close,
}

impl fmt::Display for NegotiationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            NegotiationOp::CreateOffer => "create offer",
            NegotiationOp::AcceptOffer => "accept offer",
            NegotiationOp::AcceptAnswer => "accept answer",
            NegotiationOp::SetupLocalMedia => "set up local media",
            NegotiationOp::CreateAnswer => "create answer",
            NegotiationOp::SetLocalDescription => "set local description",
            NegotiationOp::SetRemoteDescription => "set remote description",
            NegotiationOp::AddIceCandidate => "add ice candidate",
            NegotiationOp::AddTrack => "add track",
            NegotiationOp::StartCapture => "start capture",
            NegotiationOp::EngineCallback => "complete engine callback",
            NegotiationOp::Close => "close",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StateChangeOp {
    SetLocal,
    SetRemote,
}

impl fmt::Display for StateChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StateChangeOp::SetLocal => write!(f, "SetLocal"),
            StateChangeOp::SetRemote => write!(f, "SetRemote"),
        }
    }
}

/// NegotiationState is the role and description flags of a session.
///
/// The reachable values are `Idle`, `Offerer{local}`, `Offerer{local, remote}`,
/// `Answerer{remote}` and `Answerer{remote, local}`; every transition goes
/// through [`NegotiationState::next`].
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct NegotiationState {
    pub role: NegotiationRole,
    pub has_local_description: bool,
    pub has_remote_description: bool,
}

impl NegotiationState {
    /// is_negotiated is true once both descriptions are applied.
    pub fn is_negotiated(&self) -> bool {
        self.has_local_description && self.has_remote_description
    }

    pub fn signaling_state(&self) -> RTCSignalingState {
        match (self.has_local_description, self.has_remote_description) {
            (true, false) => RTCSignalingState::HaveLocalOffer,
            (false, true) => RTCSignalingState::HaveRemoteOffer,
            _ => RTCSignalingState::Stable,
        }
    }

    /// check validates that `op` may start from the current state.
    pub(crate) fn check(&self, op: NegotiationOp) -> Result<()> {
        let allowed = match op {
            NegotiationOp::CreateOffer
            | NegotiationOp::AcceptOffer
            | NegotiationOp::SetupLocalMedia => *self == NegotiationState::default(),
            NegotiationOp::AcceptAnswer => {
                self.role == NegotiationRole::Offerer
                    && self.has_local_description
                    && !self.has_remote_description
            }
            _ => true,
        };

        if allowed {
            Ok(())
        } else {
            Err(Error::ErrInvalidState { op, state: *self })
        }
    }

    /// next returns the state reached by applying a description of
    /// `sdp_type` on side `change`.
    pub(crate) fn next(&self, change: StateChangeOp, sdp_type: RTCSdpType) -> Result<Self> {
        let mut next = *self;
        match (self.role, change, sdp_type) {
            // idle->SetLocal(offer)->offerer{local}
            (NegotiationRole::Idle, StateChangeOp::SetLocal, RTCSdpType::Offer)
                if !self.has_remote_description =>
            {
                next.role = NegotiationRole::Offerer;
                next.has_local_description = true;
            }
            // idle->SetRemote(offer)->answerer{remote}
            (NegotiationRole::Idle, StateChangeOp::SetRemote, RTCSdpType::Offer)
                if !self.has_local_description =>
            {
                next.role = NegotiationRole::Answerer;
                next.has_remote_description = true;
            }
            // offerer{local}->SetRemote(answer)->offerer{local, remote}
            (NegotiationRole::Offerer, StateChangeOp::SetRemote, RTCSdpType::Answer)
                if self.has_local_description && !self.has_remote_description =>
            {
                next.has_remote_description = true;
            }
            // answerer{remote}->SetLocal(answer)->answerer{remote, local}
            (NegotiationRole::Answerer, StateChangeOp::SetLocal, RTCSdpType::Answer)
                if self.has_remote_description && !self.has_local_description =>
            {
                next.has_local_description = true;
            }
            _ => {
                let op = match change {
                    StateChangeOp::SetLocal => NegotiationOp::SetLocalDescription,
                    StateChangeOp::SetRemote => NegotiationOp::SetRemoteDescription,
                };
                return Err(Error::ErrInvalidState { op, state: *self });
            }
        }

        Ok(next)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(local: {}, remote: {})",
            self.role, self.has_local_description, self.has_remote_description
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state(role: NegotiationRole, local: bool, remote: bool) -> NegotiationState {
        NegotiationState {
            role,
            has_local_description: local,
            has_remote_description: remote,
        }
    }

    #[test]
    fn test_negotiation_state_transitions() {
        let idle = NegotiationState::default();
        let tests = vec![
            (
                "idle->SetLocal(offer)",
                idle,
                StateChangeOp::SetLocal,
                RTCSdpType::Offer,
                Some(state(NegotiationRole::Offerer, true, false)),
            ),
            (
                "idle->SetRemote(offer)",
                idle,
                StateChangeOp::SetRemote,
                RTCSdpType::Offer,
                Some(state(NegotiationRole::Answerer, false, true)),
            ),
            (
                "offerer->SetRemote(answer)",
                state(NegotiationRole::Offerer, true, false),
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                Some(state(NegotiationRole::Offerer, true, true)),
            ),
            (
                "answerer->SetLocal(answer)",
                state(NegotiationRole::Answerer, false, true),
                StateChangeOp::SetLocal,
                RTCSdpType::Answer,
                Some(state(NegotiationRole::Answerer, true, true)),
            ),
            (
                "idle->SetRemote(answer)",
                idle,
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                None,
            ),
            (
                "offerer->SetLocal(offer)",
                state(NegotiationRole::Offerer, true, false),
                StateChangeOp::SetLocal,
                RTCSdpType::Offer,
                None,
            ),
            (
                "offerer{local,remote}->SetRemote(answer)",
                state(NegotiationRole::Offerer, true, true),
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                None,
            ),
            (
                "answerer{remote}->SetRemote(offer)",
                state(NegotiationRole::Answerer, false, true),
                StateChangeOp::SetRemote,
                RTCSdpType::Offer,
                None,
            ),
        ];

        for (desc, cur, op, sdp_type, expected) in tests {
            match (cur.next(op, sdp_type), expected) {
                (Ok(next), Some(expected)) => assert_eq!(next, expected, "testCase: {desc}"),
                (Err(err), None) => assert!(err.is_invalid_state(), "testCase: {desc}"),
                (result, expected) => {
                    panic!("testCase: {desc} got {result:?}, expected {expected:?}")
                }
            }
        }
    }

    #[test]
    fn test_negotiation_state_check() {
        let idle = NegotiationState::default();
        let offering = state(NegotiationRole::Offerer, true, false);
        let answering = state(NegotiationRole::Answerer, false, true);
        let negotiated = state(NegotiationRole::Offerer, true, true);

        let tests = vec![
            (idle, NegotiationOp::CreateOffer, true),
            (idle, NegotiationOp::AcceptOffer, true),
            (idle, NegotiationOp::AcceptAnswer, false),
            (idle, NegotiationOp::SetupLocalMedia, true),
            (offering, NegotiationOp::CreateOffer, false),
            (offering, NegotiationOp::AcceptOffer, false),
            (offering, NegotiationOp::AcceptAnswer, true),
            (answering, NegotiationOp::AcceptOffer, false),
            (answering, NegotiationOp::AcceptAnswer, false),
            (negotiated, NegotiationOp::CreateOffer, false),
            (negotiated, NegotiationOp::AcceptAnswer, false),
        ];

        for (cur, op, ok) in tests {
            assert_eq!(cur.check(op).is_ok(), ok, "testCase: {op} in {cur}");
        }
    }

    #[test]
    fn test_negotiation_signaling_state() {
        let tests = vec![
            (NegotiationState::default(), RTCSignalingState::Stable),
            (
                state(NegotiationRole::Offerer, true, false),
                RTCSignalingState::HaveLocalOffer,
            ),
            (
                state(NegotiationRole::Answerer, false, true),
                RTCSignalingState::HaveRemoteOffer,
            ),
            (
                state(NegotiationRole::Answerer, true, true),
                RTCSignalingState::Stable,
            ),
        ];

        for (cur, expected) in tests {
            assert_eq!(cur.signaling_state(), expected, "testCase: {cur}");
        }
    }
}

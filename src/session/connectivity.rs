use crate::ice_transport::ice_connection_state::RTCIceConnectionState;

/// ConnectivityEdge is a change of the coarse connected/disconnected view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ConnectivityEdge {
    Connected,
    Disconnected,
}

/// ConnectivityMonitor debounces engine ICE states into edges of the
/// derived `is_connected` flag. Edges strictly alternate, starting with
/// `Connected`.
#[derive(Default, Debug)]
pub(crate) struct ConnectivityMonitor {
    state: RTCIceConnectionState,
    is_connected: bool,
}

impl ConnectivityMonitor {
    pub(crate) fn update(&mut self, state: RTCIceConnectionState) -> Option<ConnectivityEdge> {
        self.state = state;

        let was_connected = self.is_connected;
        self.is_connected = state.is_connected();
        match (was_connected, self.is_connected) {
            (false, true) => Some(ConnectivityEdge::Connected),
            (true, false) => Some(ConnectivityEdge::Disconnected),
            _ => None,
        }
    }

    pub(crate) fn state(&self) -> RTCIceConnectionState {
        self.state
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.is_connected
    }
}

#[cfg(test)]
mod test {
    use rand::Rng;

    use super::*;

    const ALL_STATES: [RTCIceConnectionState; 7] = [
        RTCIceConnectionState::New,
        RTCIceConnectionState::Checking,
        RTCIceConnectionState::Connected,
        RTCIceConnectionState::Completed,
        RTCIceConnectionState::Disconnected,
        RTCIceConnectionState::Failed,
        RTCIceConnectionState::Closed,
    ];

    #[test]
    fn test_connectivity_monitor_debounces_sub_states() {
        let mut monitor = ConnectivityMonitor::default();
        let tests = vec![
            (RTCIceConnectionState::Checking, None),
            (
                RTCIceConnectionState::Connected,
                Some(ConnectivityEdge::Connected),
            ),
            (RTCIceConnectionState::Completed, None),
            (
                RTCIceConnectionState::Disconnected,
                Some(ConnectivityEdge::Disconnected),
            ),
            (RTCIceConnectionState::Failed, None),
        ];

        for (state, expected_edge) in tests {
            assert_eq!(monitor.update(state), expected_edge, "testCase: {state}");
            assert_eq!(monitor.state(), state);
            assert_eq!(monitor.is_connected(), state.is_connected());
        }
    }

    #[test]
    fn test_connectivity_monitor_repeated_state() {
        let mut monitor = ConnectivityMonitor::default();
        assert_eq!(
            monitor.update(RTCIceConnectionState::Connected),
            Some(ConnectivityEdge::Connected)
        );
        assert_eq!(monitor.update(RTCIceConnectionState::Connected), None);
        assert_eq!(
            monitor.update(RTCIceConnectionState::Closed),
            Some(ConnectivityEdge::Disconnected)
        );
        assert_eq!(monitor.update(RTCIceConnectionState::Closed), None);
    }

    #[test]
    fn test_connectivity_monitor_edges_alternate() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let mut monitor = ConnectivityMonitor::default();
            let mut last_edge = ConnectivityEdge::Disconnected;
            for _ in 0..64 {
                let state = ALL_STATES[rng.random_range(0..ALL_STATES.len())];
                if let Some(edge) = monitor.update(state) {
                    assert_ne!(edge, last_edge, "edge repeated at {state}");
                    last_edge = edge;
                }
            }
        }
    }
}

use std::collections::VecDeque;

use crate::ice_transport::ice_candidate::RTCIceCandidateInit;

/// CandidateBuffer holds remote candidates that arrived before the remote
/// description, in arrival order.
#[derive(Default, Debug)]
pub(crate) struct CandidateBuffer {
    pending: VecDeque<RTCIceCandidateInit>,
}

impl CandidateBuffer {
    pub(crate) fn append(&mut self, candidate: RTCIceCandidateInit) {
        self.pending.push_back(candidate);
    }

    /// flush hands out every buffered candidate in FIFO order and leaves the
    /// buffer empty, so a second flush returns nothing.
    pub(crate) fn flush(&mut self) -> Vec<RTCIceCandidateInit> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn candidate(n: u16) -> RTCIceCandidateInit {
        RTCIceCandidateInit::new(format!("candidate:{n}"), "0", 0)
    }

    #[test]
    fn test_candidate_buffer_flush_preserves_order() {
        let mut buffer = CandidateBuffer::default();
        for n in 0..5 {
            buffer.append(candidate(n));
        }
        assert_eq!(buffer.len(), 5);

        let flushed = buffer.flush();
        let expected: Vec<RTCIceCandidateInit> = (0..5).map(candidate).collect();
        assert_eq!(flushed, expected);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_candidate_buffer_second_flush_is_empty() {
        let mut buffer = CandidateBuffer::default();
        buffer.append(candidate(1));
        buffer.append(candidate(2));

        assert_eq!(buffer.flush().len(), 2);
        assert!(buffer.flush().is_empty());

        buffer.append(candidate(3));
        assert_eq!(buffer.flush(), vec![candidate(3)]);
    }
}

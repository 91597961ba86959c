//! Pairs the latest results of the hand and pose landmark streams.
//!
//! The two streams are produced by independent networks and arrive at their own cadence. The
//! buffer keeps the most recent result of each and hands out a [`FusedFrame`] on every arrival,
//! once both streams have reported at least once. The two halves of a frame are therefore not
//! guaranteed to stem from the same camera frame.

use crate::{body::landmark::PoseLandmarks, hand::landmark::HandLandmarks};

/// One result delivered by a landmark stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// All hands found in a frame (at most two, possibly none).
    Hands(Vec<HandLandmarks>),
    /// The pose found in a frame, if the pose network found a person.
    Pose(Option<PoseLandmarks>),
}

/// Borrowed view of the latest hand and pose results.
#[derive(Debug, Clone, Copy)]
pub struct FusedFrame<'a> {
    pub hands: &'a [HandLandmarks],
    pub pose: Option<&'a PoseLandmarks>,
}

#[derive(Debug, Default)]
pub struct FusionBuffer {
    hands: Option<Vec<HandLandmarks>>,
    pose: Option<Option<PoseLandmarks>>,
}

impl FusionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `event`, replacing the previous result of the same stream.
    ///
    /// Returns the fused frame if both streams have delivered a result by now.
    pub fn push(&mut self, event: StreamEvent) -> Option<FusedFrame<'_>> {
        match event {
            StreamEvent::Hands(hands) => self.hands = Some(hands),
            StreamEvent::Pose(pose) => self.pose = Some(pose),
        }
        self.fused()
    }

    /// Returns the fused frame, or `None` if either stream has not reported yet.
    pub fn fused(&self) -> Option<FusedFrame<'_>> {
        match (&self.hands, &self.pose) {
            (Some(hands), Some(pose)) => Some(FusedFrame {
                hands,
                pose: pose.as_ref(),
            }),
            _ => None,
        }
    }

    /// Returns whatever is stored, even if only one stream has reported.
    ///
    /// Used for drawing; classification must go through [`FusionBuffer::fused`].
    pub fn latest(&self) -> FusedFrame<'_> {
        FusedFrame {
            hands: self.hands.as_deref().unwrap_or(&[]),
            pose: self.pose.as_ref().and_then(Option::as_ref),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.hands.is_some() && self.pose.is_some()
    }

    pub fn clear(&mut self) {
        self.hands = None;
        self.pose = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{hand, upright_pose};

    #[test]
    fn waits_for_both_streams() {
        let mut buf = FusionBuffer::new();
        assert!(buf.push(StreamEvent::Hands(vec![hand(0.5, 0.5).build()])).is_none());
        assert!(buf.push(StreamEvent::Hands(vec![])).is_none());
        assert_eq!(buf.latest().hands.len(), 0);

        let frame = buf.push(StreamEvent::Pose(None)).unwrap();
        assert!(frame.pose.is_none());
        assert!(frame.hands.is_empty());
        assert!(buf.is_ready());
    }

    #[test]
    fn keeps_latest_of_each_stream() {
        let mut buf = FusionBuffer::new();
        let pose = upright_pose();
        let first = hand(0.1, 0.5).build();
        let second = hand(0.9, 0.5).build();

        buf.push(StreamEvent::Pose(Some(pose)));
        buf.push(StreamEvent::Hands(vec![first]));
        let frame = buf.push(StreamEvent::Hands(vec![second])).unwrap();
        assert_eq!(frame.hands, &[second]);
        assert_eq!(frame.pose, Some(&pose));

        // A new pose result triggers another frame with the same hands.
        let frame = buf.push(StreamEvent::Pose(Some(pose))).unwrap();
        assert_eq!(frame.hands, &[second]);
    }

    #[test]
    fn pose_result_without_person_clears_pose() {
        let mut buf = FusionBuffer::new();
        buf.push(StreamEvent::Pose(Some(upright_pose())));
        buf.push(StreamEvent::Hands(vec![]));
        let frame = buf.push(StreamEvent::Pose(None)).unwrap();
        assert!(frame.pose.is_none());
    }

    #[test]
    fn clear_resets_readiness() {
        let mut buf = FusionBuffer::new();
        buf.push(StreamEvent::Pose(None));
        buf.push(StreamEvent::Hands(vec![]));
        buf.clear();
        assert!(!buf.is_ready());
        assert!(buf.fused().is_none());
    }
}

//! Geometric predicates over a single hand (and optionally the body pose).
//!
//! All predicates are pure functions of their inputs. They work in normalized image coordinates,
//! where a smaller `y` means higher up in the frame.

use itertools::Itertools;

use crate::{
    body::landmark::{LandmarkIdx as PoseIdx, PoseLandmarks},
    hand::landmark::{Finger, HandLandmarks},
    landmark::Landmark,
};

/// Minimum horizontal distance between the index and pinky tips for a hand to count as an open
/// palm facing the camera.
pub const OPEN_PALM_MIN_SPREAD: f32 = 0.1;

/// Returns whether `finger` is extended upwards.
///
/// The tip, middle joint and base joint must be strictly ordered from top to bottom. A finger that
/// is only partially curled fails this check.
pub fn is_finger_up(hand: &HandLandmarks, finger: Finger) -> bool {
    hand.finger(finger)
        .iter()
        .tuple_windows()
        .all(|(upper, lower)| upper.is_above(lower))
}

/// Returns whether `finger` points strictly downwards (tip below middle joint below base joint).
pub fn is_finger_down(hand: &HandLandmarks, finger: Finger) -> bool {
    hand.finger(finger)
        .iter()
        .tuple_windows()
        .all(|(upper, lower)| lower.is_above(upper))
}

pub fn is_thumb_up(hand: &HandLandmarks) -> bool {
    is_finger_up(hand, Finger::Thumb)
}

pub fn is_thumb_down(hand: &HandLandmarks) -> bool {
    is_finger_down(hand, Finger::Thumb)
}

/// Returns whether the tip of `finger` is below its PIP joint.
fn is_tip_below_pip(hand: &HandLandmarks, finger: Finger) -> bool {
    let [tip, pip, _] = hand.finger(finger);
    pip.is_above(&tip)
}

/// Returns whether the tip of `finger` is above its PIP joint.
fn is_tip_above_pip(hand: &HandLandmarks, finger: Finger) -> bool {
    let [tip, pip, _] = hand.finger(finger);
    tip.is_above(&pip)
}

/// Returns whether the four fingers are curled into a fist. The thumb is ignored.
pub fn is_fist(hand: &HandLandmarks) -> bool {
    Finger::FOUR.iter().all(|&f| is_tip_below_pip(hand, f))
}

/// Returns whether the four fingers point upwards and are spread out.
///
/// The spread check rejects a flat hand held sideways.
pub fn is_open_palm(hand: &HandLandmarks) -> bool {
    let all_up = Finger::FOUR.iter().all(|&f| is_tip_above_pip(hand, f));
    let spread = (hand.tip(Finger::Index).x() - hand.tip(Finger::Pinky).x()).abs();
    all_up && spread > OPEN_PALM_MIN_SPREAD
}

/// Returns whether no finger of any hand is raised.
///
/// This is vacuously `true` when no hands are visible.
pub fn are_hands_down(hands: &[HandLandmarks]) -> bool {
    hands
        .iter()
        .all(|hand| !Finger::ALL.iter().any(|&f| is_finger_up(hand, f)))
}

/// A region around a body landmark, tested against the hand's wrist.
///
/// The vertical band is centred `offset` below the target landmark and extends `above` units
/// upwards and `below` units downwards (both bounds exclusive). The horizontal test requires the
/// wrist to be less than `horizontal` units away from the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub offset: f32,
    pub above: f32,
    pub below: f32,
    pub horizontal: f32,
}

impl Region {
    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            offset: 0.0,
            above: vertical,
            below: vertical,
            horizontal,
        }
    }

    pub fn contains(&self, point: Landmark, target: Landmark) -> bool {
        let center = target.y() + self.offset;
        let in_band = point.y() > center - self.above && point.y() < center + self.below;
        let aligned = (point.x() - target.x()).abs() < self.horizontal;
        in_band && aligned
    }
}

/// Returns whether the wrist of `hand` lies in `region` around the pose landmark `target`.
///
/// Always `false` without a pose.
pub fn is_hand_near(
    hand: &HandLandmarks,
    pose: Option<&PoseLandmarks>,
    target: PoseIdx,
    region: &Region,
) -> bool {
    match pose {
        Some(pose) => region.contains(hand.wrist(), pose.get(target)),
        None => false,
    }
}

/// Hand at the forehead, measured from the nose.
pub fn is_hand_near_head(
    hand: &HandLandmarks,
    pose: Option<&PoseLandmarks>,
    region: &Region,
) -> bool {
    is_hand_near(hand, pose, PoseIdx::Nose, region)
}

/// Hand on the chest, measured from the right shoulder.
pub fn is_hand_near_shoulder(
    hand: &HandLandmarks,
    pose: Option<&PoseLandmarks>,
    region: &Region,
) -> bool {
    is_hand_near(hand, pose, PoseIdx::RightShoulder, region)
}

/// Hand at the throat. `region` is expected to carry an offset placing it below the nose.
pub fn is_hand_near_throat(
    hand: &HandLandmarks,
    pose: Option<&PoseLandmarks>,
    region: &Region,
) -> bool {
    is_hand_near(hand, pose, PoseIdx::Nose, region)
}

//! The 21-point hand landmark topology.

use crate::landmark::{self, Landmark, LandmarkCountError};

/// Landmarks of a single detected hand, in normalized image coordinates.
///
/// Handedness is not tracked: two hands in the same frame are only distinguished by the order in
/// which the landmark producer reported them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    landmarks: [Landmark; Self::NUM_LANDMARKS],
}

impl HandLandmarks {
    pub const NUM_LANDMARKS: usize = 21;

    pub fn new(landmarks: [Landmark; Self::NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Creates a landmark set from a flat `[x, y, z, x, y, z, ...]` buffer of 63 floats.
    pub fn from_flat(coords: &[f32]) -> Result<Self, LandmarkCountError> {
        landmark::from_flat(coords).map(Self::new)
    }

    #[inline]
    pub fn get(&self, idx: LandmarkIdx) -> Landmark {
        self.landmarks[idx as usize]
    }

    #[inline]
    pub fn wrist(&self) -> Landmark {
        self.get(LandmarkIdx::Wrist)
    }

    #[inline]
    pub fn tip(&self, finger: Finger) -> Landmark {
        self.get(finger.joints().tip)
    }

    /// Returns the tip, middle and base joint of `finger`, from the tip downwards.
    pub fn finger(&self, finger: Finger) -> [Landmark; 3] {
        let joints = finger.joints();
        [
            self.get(joints.tip),
            self.get(joints.middle),
            self.get(joints.base),
        ]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.landmarks.iter().copied()
    }
}

impl TryFrom<&[Landmark]> for HandLandmarks {
    type Error = LandmarkCountError;

    fn try_from(landmarks: &[Landmark]) -> Result<Self, Self::Error> {
        landmark::to_array(landmarks).map(Self::new)
    }
}

/// Names for the hand landmarks.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb, located near the wrist.
/// - **MCP**: Metacarpophalangeal joint, the lower joint forming the knuckles near the palm.
/// - **PIP**: Proximal interphalangeal joint, between the MCP and DIP.
/// - **DIP**: Distal interphalangeal joint, the highest joint of a finger.
/// - **IP**: The thumb's single interphalangeal joint.
/// - **Tip**: Placed on the tip of the finger, above the DIP (or IP, for the thumb).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// The three joints used to judge whether a finger is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerJoints {
    pub tip: LandmarkIdx,
    /// PIP for the four fingers, IP for the thumb.
    pub middle: LandmarkIdx,
    /// MCP.
    pub base: LandmarkIdx,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// All fingers except the thumb.
    pub const FOUR: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn joints(self) -> FingerJoints {
        use LandmarkIdx::*;
        let (tip, middle, base) = match self {
            // The thumb has one interphalangeal joint less than the other fingers.
            Finger::Thumb => (ThumbTip, ThumbIp, ThumbMcp),
            Finger::Index => (IndexFingerTip, IndexFingerPip, IndexFingerMcp),
            Finger::Middle => (MiddleFingerTip, MiddleFingerPip, MiddleFingerMcp),
            Finger::Ring => (RingFingerTip, RingFingerPip, RingFingerMcp),
            Finger::Pinky => (PinkyTip, PinkyPip, PinkyMcp),
        };
        FingerJoints { tip, middle, base }
    }
}

/// Skeleton edges drawn for each hand.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Thumb:
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (Wrist, MiddleFingerMcp),
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (Wrist, RingFingerMcp),
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
        // Across the knuckles:
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
    ]
};

//! The 33-point body pose landmark topology.

use crate::landmark::{self, Landmark, LandmarkCountError};

/// Body pose landmarks of the (single) tracked person, in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseLandmarks {
    landmarks: [Landmark; Self::NUM_LANDMARKS],
}

impl PoseLandmarks {
    pub const NUM_LANDMARKS: usize = 33;

    pub fn new(landmarks: [Landmark; Self::NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Creates a landmark set from a flat `[x, y, z, x, y, z, ...]` buffer of 99 floats.
    pub fn from_flat(coords: &[f32]) -> Result<Self, LandmarkCountError> {
        landmark::from_flat(coords).map(Self::new)
    }

    #[inline]
    pub fn get(&self, idx: LandmarkIdx) -> Landmark {
        self.landmarks[idx as usize]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.landmarks.iter().copied()
    }
}

impl TryFrom<&[Landmark]> for PoseLandmarks {
    type Error = LandmarkCountError;

    fn try_from(landmarks: &[Landmark]) -> Result<Self, Self::Error> {
        landmark::to_array(landmarks).map(Self::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

/// Skeleton edges drawn for the body: arms, shoulders, hips and legs.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Arms:
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        // Torso:
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        // Legs:
        (LeftHip, LeftKnee),
        (RightHip, RightKnee),
        (LeftKnee, LeftAnkle),
        (RightKnee, RightAnkle),
    ]
};

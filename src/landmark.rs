//! Common landmark types shared by the hand and body topologies.
//!
//! Landmark producers deliver coordinates normalized to the input frame: `x` and `y` are in range
//! 0.0 to 1.0 relative to the frame's width and height, with Y pointing *down* (a smaller `y` means
//! higher up in the image). `z` is a relative depth whose scale depends on the producing network.

use std::fmt;

use crate::iter::zip_exact;

type Position = [f32; 3];

/// A landmark in normalized image space.
#[derive(Debug, Default, PartialEq, PartialOrd, Clone, Copy)]
pub struct Landmark {
    pos: Position,
}

impl Landmark {
    pub const fn new(position: Position) -> Self {
        Self { pos: position }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos[1]
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.pos[2]
    }

    /// Returns whether `self` is strictly above `other` in the image.
    #[inline]
    pub fn is_above(&self, other: &Landmark) -> bool {
        self.y() < other.y()
    }
}

impl From<Position> for Landmark {
    fn from(pos: Position) -> Self {
        Self::new(pos)
    }
}

/// Error returned when a landmark list does not have the length required by a fixed topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkCountError {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for LandmarkCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} landmarks, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for LandmarkCountError {}

/// Copies `landmarks` into a fixed-size array of `N` landmarks.
pub(crate) fn to_array<const N: usize>(
    landmarks: &[Landmark],
) -> Result<[Landmark; N], LandmarkCountError> {
    if landmarks.len() != N {
        return Err(LandmarkCountError {
            expected: N,
            actual: landmarks.len(),
        });
    }

    let mut out = [Landmark::default(); N];
    for (dest, src) in zip_exact(&mut out, landmarks) {
        *dest = *src;
    }
    Ok(out)
}

/// Converts a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer into `N` landmarks.
pub(crate) fn from_flat<const N: usize>(
    coords: &[f32],
) -> Result<[Landmark; N], LandmarkCountError> {
    if coords.len() != N * 3 {
        return Err(LandmarkCountError {
            expected: N,
            actual: coords.len() / 3,
        });
    }

    let mut out = [Landmark::default(); N];
    for (dest, chunk) in zip_exact(&mut out, coords.chunks_exact(3)) {
        *dest = Landmark::new([chunk[0], chunk[1], chunk[2]]);
    }
    Ok(out)
}

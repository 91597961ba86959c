//! Skeleton overlay primitives for the presentation layer.
//!
//! The overlay is computed from a fused frame in normalized coordinates; scaling to the output
//! surface is up to the [`Canvas`] implementation.

use crate::{
    body::landmark::{self as body, PoseLandmarks},
    fusion::FusedFrame,
    hand::landmark::{self as hand, HandLandmarks},
    landmark::Landmark,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);
    pub const YELLOW: Self = Self([255, 255, 0, 255]);
}

const POSE_EDGE_COLOR: Color = Color::GREEN;
const POSE_POINT_COLOR: Color = Color::RED;
const HAND_EDGE_COLOR: Color = Color::BLUE;
const HAND_POINT_COLOR: Color = Color::YELLOW;
const POINT_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub at: [f32; 2],
    pub radius: f32,
    pub color: Color,
}

/// A drawing surface that accepts overlay primitives.
pub trait Canvas {
    fn line(&mut self, line: &Line);
    fn point(&mut self, point: &Point);
}

/// Line and point primitives of one frame. Pose primitives come first, so hands are drawn on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    lines: Vec<Line>,
    points: Vec<Point>,
}

impl Overlay {
    pub fn from_frame(frame: &FusedFrame<'_>) -> Self {
        let mut overlay = Self::default();
        if let Some(pose) = frame.pose {
            overlay.add_pose(pose);
        }
        for hand in frame.hands {
            overlay.add_hand(hand);
        }
        overlay
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty()
    }

    /// Replays all primitives onto `canvas`, lines first.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for line in &self.lines {
            canvas.line(line);
        }
        for point in &self.points {
            canvas.point(point);
        }
    }

    fn add_pose(&mut self, pose: &PoseLandmarks) {
        for &(a, b) in body::CONNECTIVITY {
            self.add_line(pose.get(a), pose.get(b), POSE_EDGE_COLOR);
        }
        for lm in pose.iter() {
            self.add_point(lm, POSE_POINT_COLOR);
        }
    }

    fn add_hand(&mut self, landmarks: &HandLandmarks) {
        for &(a, b) in hand::CONNECTIVITY {
            self.add_line(landmarks.get(a), landmarks.get(b), HAND_EDGE_COLOR);
        }
        for lm in landmarks.iter() {
            self.add_point(lm, HAND_POINT_COLOR);
        }
    }

    fn add_line(&mut self, a: Landmark, b: Landmark, color: Color) {
        self.lines.push(Line {
            from: [a.x(), a.y()],
            to: [b.x(), b.y()],
            color,
        });
    }

    fn add_point(&mut self, lm: Landmark, color: Color) {
        self.points.push(Point {
            at: [lm.x(), lm.y()],
            radius: POINT_RADIUS,
            color,
        });
    }
}

//! Landmark data model: points, fixed-size hand/pose sets, per-frame detections.

use crate::error::SignscribeError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Points per hand (MediaPipe hand model).
pub const HAND_POINTS: usize = 21;

/// Pose points kept per frame (upper body of the 33-point MediaPipe pose).
pub const POSE_POINTS: usize = 25;

/// Points in a corrected frame: left hand, right hand, pose.
pub const FRAME_POINTS: usize = HAND_POINTS * 2 + POSE_POINTS;

// Hand landmark indices
pub const HAND_WRIST: usize = 0;
pub const HAND_INDEX_MCP: usize = 5;
pub const HAND_PINKY_MCP: usize = 17;

// Pose landmark indices
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_PINKY: usize = 17;
pub const RIGHT_PINKY: usize = 18;
pub const LEFT_INDEX: usize = 19;
pub const RIGHT_INDEX: usize = 20;

/// A 3D landmark coordinate.
///
/// Deserializes from `[x, y, z]`, `[x, y, z, visibility]` or an object with
/// `x`, `y`, `z` (and optional `visibility`). Visibility is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawPoint")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Xyz([f64; 3]),
    Xyzv([f64; 4]),
    Named {
        x: f64,
        y: f64,
        z: f64,
        #[allow(dead_code)]
        #[serde(default)]
        visibility: Option<f64>,
    },
}

impl From<RawPoint> for Point3 {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::Xyz([x, y, z]) | RawPoint::Xyzv([x, y, z, _]) => Point3 { x, y, z },
            RawPoint::Named { x, y, z, .. } => Point3 { x, y, z },
        }
    }
}

impl Point3 {
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Point3) -> Point3 {
        Point3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; near-zero vectors stay near zero.
    pub fn normalized(self) -> Point3 {
        self / (self.norm() + 1e-8)
    }

    pub fn midpoint(self, other: Point3) -> Point3 {
        (self + other) / 2.0
    }

    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point3 {
    type Output = Point3;

    fn div(self, rhs: f64) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Copies the first `N` points of `points`, or reports how many were missing.
fn take_points<const N: usize>(points: &[Point3], part: &str) -> Result<[Point3; N], SignscribeError> {
    if points.len() < N {
        return Err(SignscribeError::Detection {
            message: format!("{} has {} points, expected {}", part, points.len(), N),
        });
    }
    let mut out = [Point3::ZERO; N];
    out.copy_from_slice(&points[..N]);
    Ok(out)
}

/// The 21 landmarks of one hand, in anatomical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3>", into = "Vec<Point3>")]
pub struct Hand(pub [Point3; HAND_POINTS]);

impl Hand {
    /// Builds a hand from a detector point list; extra points are dropped.
    pub fn from_points(points: &[Point3]) -> Result<Self, SignscribeError> {
        take_points(points, "hand").map(Hand)
    }

    pub fn points(&self) -> &[Point3; HAND_POINTS] {
        &self.0
    }

    pub fn wrist(&self) -> Point3 {
        self.0[HAND_WRIST]
    }

    /// Applies `f` to every point, keeping order.
    pub fn map(&self, f: impl Fn(Point3) -> Point3) -> Hand {
        Hand(self.0.map(f))
    }

    /// Shifts every point by `offset`.
    pub fn translate(&self, offset: Point3) -> Hand {
        self.map(|p| p + offset)
    }
}

impl TryFrom<Vec<Point3>> for Hand {
    type Error = SignscribeError;

    fn try_from(points: Vec<Point3>) -> Result<Self, Self::Error> {
        Hand::from_points(&points)
    }
}

impl From<Hand> for Vec<Point3> {
    fn from(hand: Hand) -> Self {
        hand.0.to_vec()
    }
}

/// The first 25 pose landmarks, in anatomical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3>", into = "Vec<Point3>")]
pub struct Pose(pub [Point3; POSE_POINTS]);

impl Pose {
    /// Builds a pose from a detector point list; a 33-point pose is cut to 25.
    pub fn from_points(points: &[Point3]) -> Result<Self, SignscribeError> {
        take_points(points, "pose").map(Pose)
    }

    pub fn points(&self) -> &[Point3; POSE_POINTS] {
        &self.0
    }

    pub fn point(&self, index: usize) -> Point3 {
        self.0[index]
    }

    pub fn map(&self, f: impl Fn(Point3) -> Point3) -> Pose {
        Pose(self.0.map(f))
    }
}

impl TryFrom<Vec<Point3>> for Pose {
    type Error = SignscribeError;

    fn try_from(points: Vec<Point3>) -> Result<Self, Self::Error> {
        Pose::from_points(&points)
    }
}

impl From<Pose> for Vec<Point3> {
    fn from(pose: Pose) -> Self {
        pose.0.to_vec()
    }
}

/// Which hand a landmark set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// Pose indices (wrist, index, pinky) used to orient a missing hand.
    ///
    /// The camera image is mirrored, so the left hand follows the pose's
    /// right-side landmarks and vice versa.
    pub fn alignment_indices(self) -> (usize, usize, usize) {
        match self {
            HandSide::Left => (RIGHT_WRIST, RIGHT_INDEX, RIGHT_PINKY),
            HandSide::Right => (LEFT_WRIST, LEFT_INDEX, LEFT_PINKY),
        }
    }

    /// Pose wrist that this hand's landmark 0 is pinned to after normalization.
    pub fn anchor_index(self) -> usize {
        match self {
            HandSide::Left => LEFT_WRIST,
            HandSide::Right => RIGHT_WRIST,
        }
    }
}

/// Landmarks detected in a single frame. Any part may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSet {
    pub left_hand: Option<Hand>,
    pub right_hand: Option<Hand>,
    pub pose: Option<Pose>,
}

impl LandmarkSet {
    pub fn hand(&self, side: HandSide) -> Option<&Hand> {
        match side {
            HandSide::Left => self.left_hand.as_ref(),
            HandSide::Right => self.right_hand.as_ref(),
        }
    }

    /// True when the detector found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.left_hand.is_none() && self.right_hand.is_none() && self.pose.is_none()
    }
}

//! Per-frame landmark correction.
//!
//! Turns a partial detection into a complete, normalized frame:
//! missing pose → last pose, missing hand → last hand carried onto the
//! current pose, then everything is expressed relative to the shoulders.

use crate::defaults;
use crate::error::{Result, SignscribeError};
use crate::landmarks::geometry::align_hand;
use crate::landmarks::types::{
    FRAME_POINTS, HAND_POINTS, HAND_WRIST, Hand, HandSide, LEFT_INDEX, LEFT_PINKY, LEFT_SHOULDER,
    LEFT_WRIST, LandmarkSet, POSE_POINTS, Point3, Pose, RIGHT_INDEX, RIGHT_PINKY, RIGHT_SHOULDER,
    RIGHT_WRIST,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Last authoritative landmarks of one session, used as fallback source.
///
/// Seeded from the canonical reference asset at session start and updated
/// after every corrected frame. Never shared between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrevLandmarks {
    pub left_hand: Hand,
    pub right_hand: Hand,
    pub pose: Pose,
}

impl PrevLandmarks {
    /// Parses a reference asset: a JSON object with all three parts.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SignscribeError::ReferenceLandmarks {
            message: e.to_string(),
        })
    }

    /// Loads a reference asset from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| SignscribeError::ReferenceLandmarks {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }

    /// Built-in upright reference used when no asset is configured.
    ///
    /// Image-normalized coordinates: shoulders level at y = 0.5, both hands
    /// open and raised in front of the chest.
    pub fn neutral() -> Self {
        let mut pose = [Point3::new(0.5, 0.45, 0.0); POSE_POINTS];
        pose[0] = Point3::new(0.5, 0.25, -0.1);
        pose[LEFT_SHOULDER] = Point3::new(0.62, 0.5, 0.0);
        pose[RIGHT_SHOULDER] = Point3::new(0.38, 0.5, 0.0);
        pose[13] = Point3::new(0.68, 0.65, 0.0);
        pose[14] = Point3::new(0.32, 0.65, 0.0);
        pose[LEFT_WRIST] = Point3::new(0.6, 0.55, -0.1);
        pose[RIGHT_WRIST] = Point3::new(0.4, 0.55, -0.1);
        pose[LEFT_PINKY] = Point3::new(0.63, 0.5, -0.1);
        pose[RIGHT_PINKY] = Point3::new(0.37, 0.5, -0.1);
        pose[LEFT_INDEX] = Point3::new(0.6, 0.48, -0.12);
        pose[RIGHT_INDEX] = Point3::new(0.4, 0.48, -0.12);
        pose[23] = Point3::new(0.58, 0.85, 0.0);
        pose[24] = Point3::new(0.42, 0.85, 0.0);

        Self {
            left_hand: open_hand(pose[RIGHT_WRIST], -1.0),
            right_hand: open_hand(pose[LEFT_WRIST], 1.0),
            pose: Pose(pose),
        }
    }
}

/// Five straight fingers fanned upward from `wrist`; `mirror` flips x.
fn open_hand(wrist: Point3, mirror: f64) -> Hand {
    let mut points = [wrist; HAND_POINTS];
    for finger in 0..5 {
        let spread = (finger as f64 - 2.0) * 0.012 * mirror;
        for joint in 1..=4 {
            let reach = joint as f64 * 0.018;
            points[1 + finger * 4 + (joint - 1)] =
                wrist + Point3::new(spread * joint as f64, -reach, -0.01 * joint as f64);
        }
    }
    points[HAND_WRIST] = wrist;
    Hand(points)
}

/// A complete, normalized frame: left hand, right hand, pose (67 × xyz).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CorrectedFrame {
    points: Vec<[f32; 3]>,
}

impl CorrectedFrame {
    /// Concatenates the three parts in fixed order.
    pub fn from_parts(left: &Hand, right: &Hand, pose: &Pose) -> Self {
        let points = left
            .points()
            .iter()
            .chain(right.points().iter())
            .chain(pose.points().iter())
            .map(|p| p.to_f32())
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn left_hand(&self) -> &[[f32; 3]] {
        &self.points[..HAND_POINTS]
    }

    pub fn right_hand(&self) -> &[[f32; 3]] {
        &self.points[HAND_POINTS..HAND_POINTS * 2]
    }

    pub fn pose(&self) -> &[[f32; 3]] {
        &self.points[HAND_POINTS * 2..FRAME_POINTS]
    }

    /// Row-major flat vector of `FRAME_POINTS * 3` values.
    pub fn to_flat(&self) -> Vec<f32> {
        self.points.iter().flatten().copied().collect()
    }
}

/// Stateless landmark corrector; all history lives in `PrevLandmarks`.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkCorrector {
    min_scale: f64,
}

impl Default for LandmarkCorrector {
    fn default() -> Self {
        Self {
            min_scale: defaults::MIN_SHOULDER_SCALE,
        }
    }
}

impl LandmarkCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repairs and normalizes one detection, updating `prev` in place.
    ///
    /// `prev` receives the raw (pre-normalization) parts that were used for
    /// this frame, repaired ones included.
    pub fn correct(&self, detected: &LandmarkSet, prev: &mut PrevLandmarks) -> CorrectedFrame {
        let pose = detected.pose.unwrap_or(prev.pose);
        let left_hand = detected
            .left_hand
            .unwrap_or_else(|| align_hand(&prev.left_hand, Some(&pose), HandSide::Left));
        let right_hand = detected
            .right_hand
            .unwrap_or_else(|| align_hand(&prev.right_hand, Some(&pose), HandSide::Right));

        *prev = PrevLandmarks {
            left_hand,
            right_hand,
            pose,
        };

        let (left, right, pose) = self.normalize(&left_hand, &right_hand, &pose);
        CorrectedFrame::from_parts(&left, &right, &pose)
    }

    /// Expresses all parts relative to the shoulder midpoint, in shoulder widths,
    /// then pins each hand's wrist onto the matching pose wrist.
    pub fn normalize(&self, left: &Hand, right: &Hand, pose: &Pose) -> (Hand, Hand, Pose) {
        let left_shoulder = pose.point(LEFT_SHOULDER);
        let right_shoulder = pose.point(RIGHT_SHOULDER);
        let root = left_shoulder.midpoint(right_shoulder);

        let mut scale = (left_shoulder - right_shoulder).norm();
        if scale < self.min_scale {
            scale = 1.0;
        }

        let to_body = |p: Point3| (p - root) / scale;
        let pose = pose.map(to_body);
        let left = pin_wrist(&left.map(to_body), &pose, HandSide::Left);
        let right = pin_wrist(&right.map(to_body), &pose, HandSide::Right);
        (left, right, pose)
    }
}

fn pin_wrist(hand: &Hand, pose: &Pose, side: HandSide) -> Hand {
    hand.translate(pose.point(side.anchor_index()) - hand.wrist())
}

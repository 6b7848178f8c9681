//! Landmark model, hand alignment and per-frame correction.

pub mod corrector;
pub mod geometry;
pub mod types;

pub use corrector::{CorrectedFrame, LandmarkCorrector, PrevLandmarks};
pub use geometry::{Mat3, align_hand, hand_frame};
pub use types::{FRAME_POINTS, HAND_POINTS, Hand, HandSide, LandmarkSet, POSE_POINTS, Point3, Pose};

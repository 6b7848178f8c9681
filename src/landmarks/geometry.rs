//! Rigid hand alignment.
//!
//! When the detector loses a hand, the last known hand is carried along with
//! the pose: both the old hand and the current pose yield a wrist/index/pinky
//! triangle, each triangle defines an orthonormal frame, and the rotation
//! between the two frames is applied to the old hand around its wrist.

use crate::landmarks::types::{HAND_INDEX_MCP, HAND_PINKY_MCP, HAND_WRIST, Hand, HandSide, Point3, Pose};

/// Cross products shorter than this mean the triangle has no usable plane.
const DEGENERATE_AREA: f64 = 1e-9;

/// A 3×3 matrix stored as three column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub cols: [Point3; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        cols: [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
    };

    pub fn from_cols(x: Point3, y: Point3, z: Point3) -> Self {
        Self { cols: [x, y, z] }
    }

    /// Row `i` as a vector.
    fn row(&self, i: usize) -> Point3 {
        let [a, b, c] = self.cols;
        match i {
            0 => Point3::new(a.x, b.x, c.x),
            1 => Point3::new(a.y, b.y, c.y),
            _ => Point3::new(a.z, b.z, c.z),
        }
    }

    pub fn transpose(&self) -> Mat3 {
        Mat3::from_cols(self.row(0), self.row(1), self.row(2))
    }

    /// Matrix-vector product.
    pub fn apply(&self, v: Point3) -> Point3 {
        let [a, b, c] = self.cols;
        a * v.x + b * v.y + c * v.z
    }

    /// Matrix product `self · rhs`.
    pub fn mul(&self, rhs: &Mat3) -> Mat3 {
        Mat3 {
            cols: rhs.cols.map(|col| self.apply(col)),
        }
    }

    /// Largest absolute element-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Mat3) -> f64 {
        self.cols
            .iter()
            .zip(other.cols.iter())
            .map(|(a, b)| {
                let d = *a - *b;
                d.x.abs().max(d.y.abs()).max(d.z.abs())
            })
            .fold(0.0, f64::max)
    }
}

/// Orthonormal right-handed frame spanned by a wrist/index/pinky triangle.
///
/// x follows the index base, z is the palm normal and y is re-derived as
/// z × x so skew in the raw triangle does not leak into the basis.
/// Returns `None` for collinear or coincident points.
pub fn hand_frame(wrist: Point3, index: Point3, pinky: Point3) -> Option<Mat3> {
    let x_axis = (index - wrist).normalized();
    let y_raw = (pinky - wrist).normalized();
    let normal = x_axis.cross(y_raw);
    if normal.norm() < DEGENERATE_AREA {
        return None;
    }
    let z_axis = normal.normalized();
    let y_axis = z_axis.cross(x_axis).normalized();
    Some(Mat3::from_cols(x_axis, y_axis, z_axis))
}

/// Rotation taking the `prev` frame onto the `curr` frame.
///
/// Both frames are orthonormal, so the inverse is the transpose.
pub fn relative_rotation(prev: &Mat3, curr: &Mat3) -> Mat3 {
    curr.mul(&prev.transpose())
}

/// Carries `prev` onto the current pose's wrist triangle for `side`.
///
/// Without a pose the previous hand is returned unchanged. When either
/// triangle is degenerate the hand is only translated onto the new wrist.
pub fn align_hand(prev: &Hand, pose: Option<&Pose>, side: HandSide) -> Hand {
    let Some(pose) = pose else {
        return *prev;
    };

    let points = prev.points();
    let wrist_prev = points[HAND_WRIST];
    let (wrist_idx, index_idx, pinky_idx) = side.alignment_indices();
    let wrist_curr = pose.point(wrist_idx);

    let rotation = match (
        hand_frame(wrist_prev, points[HAND_INDEX_MCP], points[HAND_PINKY_MCP]),
        hand_frame(wrist_curr, pose.point(index_idx), pose.point(pinky_idx)),
    ) {
        (Some(prev_frame), Some(curr_frame)) => relative_rotation(&prev_frame, &curr_frame),
        _ => Mat3::IDENTITY,
    };

    prev.map(|p| rotation.apply(p - wrist_prev) + wrist_curr)
}

//! Orientation frames along the track centerline.
//!
//! Frames are built with parallel transport rather than from a fixed up vector so that they don't
//! flip when the track gets close to vertical.  Parallel transport around a closed loop doesn't
//! generally return to where it started (holonomy), so the accumulated twist is measured and
//! spread evenly over the whole loop to make the seam invisible.  Banking derived from curvature
//! is applied on top of that.

use log::{debug, warn};

use crate::{config::TrackOptions, curve::Curve, Vec3};

/// Multiplier applied to `max_curvature` to get the clamp for the curvature strength that drives
/// banking.  Tuned by feel, not derived from anything physical.
pub const CURVATURE_BANK_SCALE: f32 = 100.;
/// Minimum window (in samples) of the moving average applied to raw bank angles
pub const MIN_BANK_SMOOTHING_WINDOW: usize = 4;
/// Fraction of the sample count used as the bank smoothing window
pub const BANK_SMOOTHING_WINDOW_FRACTION: f32 = 0.01;
/// Extra bounding radius per meter of track width
pub const BOUNDING_WIDTH_MARGIN_FACTOR: f32 = 4.;

const FRAME_EPSILON: f32 = 1e-6;

/// Per-sample frame data in parallel arrays, one entry per sample.
#[derive(Clone, Debug, Default)]
pub struct TrackFrames {
  pub positions: Vec<Vec3>,
  pub tangents: Vec<Vec3>,
  pub normals: Vec<Vec3>,
  pub binormals: Vec<Vec3>,
  pub bank_radians: Vec<f32>,
  pub bounding_radius: f32,
  /// Count of samples where a non-finite or degenerate vector had to be replaced
  pub degenerate_count: usize,
}

#[inline]
fn is_finite(v: &Vec3) -> bool {
  v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Rotates the `(normal, binormal)` pair about the tangent they're both perpendicular to.
///
/// Assumes `binormal = tangent × normal`.
#[inline]
pub fn rotate_about_tangent(normal: Vec3, binormal: Vec3, angle: f32) -> (Vec3, Vec3) {
  let (sin, cos) = angle.sin_cos();
  let rotated_normal = normal * cos + binormal * sin;
  let rotated_binormal = binormal * cos - normal * sin;
  (rotated_normal, rotated_binormal)
}

/// Signed angle that rotates `from` onto `to` about `axis`.  Both vectors are expected to be
/// perpendicular to `axis`.
pub fn signed_angle_about(from: &Vec3, to: &Vec3, axis: &Vec3) -> f32 {
  let sin = from.cross(to).dot(axis);
  let cos = from.dot(to);
  let angle = sin.atan2(cos);
  if angle.is_finite() {
    angle
  } else {
    0.
  }
}

fn arbitrary_perpendicular(tangent: &Vec3) -> Vec3 {
  let fallback = if tangent.dot(&Vec3::y()).abs() > 0.999 {
    Vec3::x()
  } else {
    Vec3::y()
  };
  tangent.cross(&fallback).normalize()
}

/// Starting normal for the first sample: world up projected onto the plane perpendicular to the
/// tangent, or +X if the tangent is too close to vertical for that to be stable.
fn initial_normal(tangent: &Vec3) -> Vec3 {
  let mut up = Vec3::y();
  if tangent.dot(&up).abs() > 0.999 {
    up = Vec3::x();
  }
  let proj = up - tangent * tangent.dot(&up);
  if proj.norm_squared() < FRAME_EPSILON || !is_finite(&proj) {
    return Vec3::y();
  }
  proj.normalize()
}

/// Projects the previous normal onto the plane perpendicular to `tangent`.
///
/// Returns the new normal along with `true` if the projection was degenerate and a fallback had
/// to be used instead.
pub fn transport_normal(prev_normal: &Vec3, prev_binormal: &Vec3, tangent: &Vec3) -> (Vec3, bool) {
  let proj = prev_normal - tangent * tangent.dot(prev_normal);
  if proj.norm_squared() >= FRAME_EPSILON && is_finite(&proj) {
    return (proj.normalize(), false);
  }

  let from_binormal = tangent.cross(prev_binormal);
  if from_binormal.norm_squared() >= FRAME_EPSILON && is_finite(&from_binormal) {
    return (from_binormal.normalize(), true);
  }

  let arbitrary = arbitrary_perpendicular(tangent);
  if is_finite(&arbitrary) {
    (arbitrary, true)
  } else {
    (*prev_normal, true)
  }
}

/// Raw bank angle from the turn between two consecutive tangents.
///
/// The magnitude of their cross product approximates curvature per sample, and the sign of its
/// vertical component determines which way the turn goes.
pub fn raw_bank_angle(
  prev_tangent: &Vec3,
  tangent: &Vec3,
  bank_max_rad: f32,
  max_curvature: f32,
) -> f32 {
  let d = prev_tangent.cross(tangent);
  if !is_finite(&d) {
    return 0.;
  }
  let strength = d.norm().clamp(0., max_curvature * CURVATURE_BANK_SCALE);
  let sign = if d.y > 0. {
    1.
  } else if d.y < 0. {
    -1.
  } else {
    0.
  };
  bank_max_rad * strength * sign
}

pub fn bank_smoothing_window(sample_count: usize) -> usize {
  MIN_BANK_SMOOTHING_WINDOW
    .max((sample_count as f32 * BANK_SMOOTHING_WINDOW_FRACTION).floor() as usize)
}

/// Centered moving average that wraps around the ends of `values`.
pub fn smooth_circular(values: &[f32], window: usize) -> Vec<f32> {
  let n = values.len();
  if n == 0 {
    return Vec::new();
  }
  let half = window / 2;
  let taps = 2 * half + 1;

  (0..n)
    .map(|i| {
      let mut sum = 0.;
      for k in 0..taps {
        let ix = (i + n * taps + k - half) % n;
        sum += values[ix];
      }
      sum / taps as f32
    })
    .collect()
}

pub fn sample_frames(curve: &Curve, opts: &TrackOptions) -> TrackFrames {
  let n = opts.sample_count;
  let (positions, raw_tangents): (Vec<Vec3>, Vec<Vec3>) = (0..n)
    .map(|i| {
      let t = i as f32 / n as f32;
      (curve.point_at(t), curve.tangent_at(t))
    })
    .unzip();
  build_frames(positions, &raw_tangents, opts)
}

/// Builds frames from centerline samples taken at uniform arc-length steps around the loop.
fn build_frames(positions: Vec<Vec3>, raw_tangents: &[Vec3], opts: &TrackOptions) -> TrackFrames {
  let n = positions.len();
  let mut degenerate_count = 0usize;

  let mut tangents: Vec<Vec3> = Vec::with_capacity(n);
  for &tangent in raw_tangents {
    if is_finite(&tangent) {
      tangents.push(tangent);
    } else {
      degenerate_count += 1;
      let fallback = tangents.last().copied().unwrap_or_else(Vec3::z);
      tangents.push(fallback);
    }
  }

  // parallel transport
  let mut normals: Vec<Vec3> = Vec::with_capacity(n);
  let mut binormals: Vec<Vec3> = Vec::with_capacity(n);
  for i in 0..n {
    let tangent = tangents[i];
    let normal = if i == 0 {
      initial_normal(&tangent)
    } else {
      let (normal, was_degenerate) = transport_normal(&normals[i - 1], &binormals[i - 1], &tangent);
      if was_degenerate {
        degenerate_count += 1;
      }
      normal
    };

    let mut binormal = tangent.cross(&normal).normalize();
    if !is_finite(&binormal) {
      degenerate_count += 1;
      binormal = binormals.last().copied().unwrap_or_else(|| arbitrary_perpendicular(&normal));
    }

    normals.push(normal);
    binormals.push(binormal);
  }

  // raw banking from curvature
  let bank_max_rad = opts.bank_max_deg.to_radians();
  let raw_bank: Vec<f32> = (0..n)
    .map(|i| {
      let prev_tangent = &tangents[(i + n - 1) % n];
      raw_bank_angle(prev_tangent, &tangents[i], bank_max_rad, opts.max_curvature)
    })
    .collect();

  // seam correction.  The frame that would follow the last sample is compared against the first
  // one, and the difference is spread linearly over the loop.
  let (closing_normal, _) = transport_normal(&normals[n - 1], &binormals[n - 1], &tangents[0]);
  let seam_angle = signed_angle_about(&normals[0], &closing_normal, &tangents[0]);
  debug!("Correcting seam discrepancy of {seam_angle} rad over {n} samples");
  for i in 0..n {
    let correction = -seam_angle * (i as f32 / n as f32);
    let (normal, binormal) = rotate_about_tangent(normals[i], binormals[i], correction);
    normals[i] = normal;
    binormals[i] = binormal;
  }

  let bank_radians = smooth_circular(&raw_bank, bank_smoothing_window(n));
  for i in 0..n {
    let (normal, binormal) = rotate_about_tangent(normals[i], binormals[i], bank_radians[i]);
    normals[i] = normal;
    binormals[i] = binormal;
  }

  let max_dist = positions.iter().map(|p| p.norm()).fold(0., f32::max);
  let bounding_radius =
    max_dist + opts.width * BOUNDING_WIDTH_MARGIN_FACTOR + opts.elevation_amplitude;

  if degenerate_count > 0 {
    warn!("Replaced {degenerate_count} degenerate frame vectors while sampling track frames");
  }

  TrackFrames {
    positions,
    tangents,
    normals,
    binormals,
    bank_radians,
    bounding_radius,
    degenerate_count,
  }
}

use std::f32::consts::PI;

use log::debug;

use crate::{config::TrackOptions, error::TrackGenError, rng::SeededRandom, Vec3};

/// Max angular jitter applied to each control point, in radians (applied as ±half of this)
const ANGLE_JITTER: f32 = 0.3;
/// Max random phase offset of the elevation harmonics, in radians (applied as ±half of this)
const ELEVATION_PHASE_JITTER: f32 = 0.6;

/// Closed loop of control points.  The last point implicitly connects back to the first.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPolygon {
  pub points: Vec<Vec3>,
}

fn raw_elevation(angle: f32, phase: f32, amplitude: f32) -> f32 {
  // low-frequency harmonics keep elevation changes rolling rather than chaotic
  let wave = (angle * 2. + phase).sin() * 0.65 + (angle * 3. + phase * 0.5).sin() * 0.35;
  wave * amplitude * 0.5
}

/// Samples raw control points around a rough loop, dropping any that land too close to the
/// previously accepted point.
fn sample_raw_points(opts: &TrackOptions, rng: &mut SeededRandom) -> Vec<Vec3> {
  let count = opts.control_point_count;
  let min_chord_sq = opts.min_chord * opts.min_chord;
  let mut points: Vec<Vec3> = Vec::with_capacity(count);

  for i in 0..count {
    let angle = (i as f32 / count as f32) * 2. * PI;
    let jitter = (rng.next() - 0.5) * ANGLE_JITTER;
    let radius = rng.range(opts.radius_min, opts.radius_max);
    let phase = (rng.next() - 0.5) * ELEVATION_PHASE_JITTER;

    let (sin, cos) = (angle + jitter).sin_cos();
    let point = Vec3::new(
      cos * radius,
      raw_elevation(angle, phase, opts.elevation_amplitude),
      sin * radius,
    );

    if let Some(prev) = points.last() {
      if (point - prev).norm_squared() < min_chord_sq {
        debug!("Dropping control point {i}; too close to previous point");
        continue;
      }
    }
    points.push(point);
  }

  // the loop closes back onto the first point, so that edge has to clear `min_chord` as well
  while points.len() > 1 {
    let closing = points[points.len() - 1] - points[0];
    if closing.norm_squared() >= min_chord_sq {
      break;
    }
    debug!("Dropping trailing control point; too close to the first point");
    points.pop();
  }

  points
}

/// One round of Chaikin corner cutting over a closed loop.  Each edge `(a, b)` is replaced by
/// points at 1/4 and 3/4 of the way along it, so the point count doubles.
pub fn chaikin_closed(points: &[Vec3]) -> Vec<Vec3> {
  let mut out = Vec::with_capacity(points.len() * 2);
  for (i, a) in points.iter().enumerate() {
    let b = &points[(i + 1) % points.len()];
    out.push(a * 0.75 + b * 0.25);
    out.push(a * 0.25 + b * 0.75);
  }
  out
}

pub fn generate_control_polygon(
  opts: &TrackOptions,
  rng: &mut SeededRandom,
) -> Result<ControlPolygon, TrackGenError> {
  let mut points = sample_raw_points(opts, rng);

  if points.len() < 4 {
    return Err(TrackGenError::invalid_configuration(format!(
      "Only {} of {} control points survived the `min_chord` check ({}); at least 4 are needed \
       to fit the track curve",
      points.len(),
      opts.control_point_count,
      opts.min_chord
    )));
  }

  for _ in 0..opts.control_point_smooth_passes {
    points = chaikin_closed(&points);
  }

  Ok(ControlPolygon { points })
}

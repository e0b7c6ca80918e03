use crate::{control_points::ControlPolygon, Vec3};

const LENGTH_EPSILON: f32 = 1e-5;
/// Knot intervals shorter than this are treated as degenerate and replaced with a neighbor's
const KNOT_EPSILON: f32 = 1e-4;
const MIN_ARC_LENGTH_DIVISIONS: usize = 200;
const ARC_LENGTH_DIVISIONS_PER_SAMPLE: usize = 8;

/// Cubic `c0 + c1*t + c2*t^2 + c3*t^3` over `t` in [0, 1].
#[derive(Clone, Copy, Debug)]
struct CubicSegment {
  c0: Vec3,
  c1: Vec3,
  c2: Vec3,
  c3: Vec3,
}

impl CubicSegment {
  /// Builds a Hermite segment from `x1` to `x2` with non-uniform Catmull-Rom tangents computed
  /// from the knot intervals `dt0`, `dt1`, `dt2`.
  fn nonuniform_catmull_rom(
    [x0, x1, x2, x3]: [Vec3; 4],
    dt0: f32,
    dt1: f32,
    dt2: f32,
  ) -> Self {
    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

    CubicSegment {
      c0: x1,
      c1: t1,
      c2: x1 * -3. + x2 * 3. - t1 * 2. - t2,
      c3: x1 * 2. - x2 * 2. + t1 + t2,
    }
  }

  #[inline]
  fn point(&self, t: f32) -> Vec3 {
    self.c0 + (self.c1 + (self.c2 + self.c3 * t) * t) * t
  }

  #[inline]
  fn derivative(&self, t: f32) -> Vec3 {
    self.c1 + (self.c2 * 2. + self.c3 * (3. * t)) * t
  }
}

/// Closed Catmull-Rom spline through every control point using centripetal knot spacing, which
/// avoids the cusps and self-intersections uniform spacing produces around tight corners.
#[derive(Clone, Debug)]
pub struct ClosedCatmullRom {
  segments: Vec<CubicSegment>,
}

impl ClosedCatmullRom {
  pub fn new(points: &[Vec3]) -> Self {
    let n = points.len();
    assert!(n >= 2, "closed spline needs at least 2 points; found {n}");

    let segments = (0..n)
      .map(|i| {
        let p0 = points[(i + n - 1) % n];
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];

        // centripetal: knot interval is the square root of chord length
        let mut dt0 = (p1 - p0).norm_squared().powf(0.25);
        let mut dt1 = (p2 - p1).norm_squared().powf(0.25);
        let mut dt2 = (p3 - p2).norm_squared().powf(0.25);
        if dt1 < KNOT_EPSILON {
          dt1 = 1.;
        }
        if dt0 < KNOT_EPSILON {
          dt0 = dt1;
        }
        if dt2 < KNOT_EPSILON {
          dt2 = dt1;
        }

        CubicSegment::nonuniform_catmull_rom([p0, p1, p2, p3], dt0, dt1, dt2)
      })
      .collect();

    ClosedCatmullRom { segments }
  }

  fn locate(&self, u: f32) -> (&CubicSegment, f32) {
    let u = u.rem_euclid(1.);
    let scaled = u * self.segments.len() as f32;
    let ix = (scaled.floor() as usize).min(self.segments.len() - 1);
    (&self.segments[ix], scaled - ix as f32)
  }

  /// Samples the spline by its raw (non arc-length) parameter `u` in [0, 1).
  pub fn point(&self, u: f32) -> Vec3 {
    let (seg, local_t) = self.locate(u);
    seg.point(local_t)
  }

  /// Derivative with respect to the raw parameter, not normalized.
  pub fn derivative(&self, u: f32) -> Vec3 {
    let (seg, local_t) = self.locate(u);
    seg.derivative(local_t) * self.segments.len() as f32
  }
}

/// The track centerline: a closed spline plus a cumulative chord-length table over its raw
/// parameter, so that `t` maps uniformly to distance along the loop.
#[derive(Clone, Debug)]
pub struct Curve {
  spline: ClosedCatmullRom,
  /// `cumulative_length[i]` is the distance along the spline at raw parameter `i / divisions`
  cumulative_length: Vec<f32>,
}

impl Curve {
  /// `sample_count` is the number of samples that will be taken from the curve; the length table
  /// is built finely enough relative to it that no quantization is visible.
  pub fn fit(polygon: &ControlPolygon, sample_count: usize) -> Self {
    let spline = ClosedCatmullRom::new(&polygon.points);
    let divisions = MIN_ARC_LENGTH_DIVISIONS.max(sample_count * ARC_LENGTH_DIVISIONS_PER_SAMPLE);

    let mut cumulative_length = Vec::with_capacity(divisions + 1);
    let mut prev = spline.point(0.);
    let mut total = 0.;
    cumulative_length.push(total);
    for i in 1..=divisions {
      // the last division lands exactly back on the start of the loop
      let point = spline.point(i as f32 / divisions as f32);
      total += (point - prev).norm();
      cumulative_length.push(total);
      prev = point;
    }

    Curve {
      spline,
      cumulative_length,
    }
  }

  pub fn total_length(&self) -> f32 {
    self.cumulative_length.last().copied().unwrap_or(0.)
  }

  /// Maps an arc-length fraction `t` to the spline's raw parameter.
  fn param_at(&self, t: f32) -> f32 {
    let total = self.total_length();
    if total <= LENGTH_EPSILON {
      return 0.;
    }
    let target = t.rem_euclid(1.) * total;

    // first entry at or past the target distance
    let hi = self
      .cumulative_length
      .partition_point(|&len| len < target)
      .clamp(1, self.cumulative_length.len() - 1);
    let (before, after) = (self.cumulative_length[hi - 1], self.cumulative_length[hi]);
    let frac = if after > before {
      ((target - before) / (after - before)).clamp(0., 1.)
    } else {
      0.
    };

    let divisions = (self.cumulative_length.len() - 1) as f32;
    ((hi - 1) as f32 + frac) / divisions
  }

  pub fn point_at(&self, t: f32) -> Vec3 {
    self.spline.point(self.param_at(t))
  }

  /// Unit tangent at arc-length fraction `t`.
  pub fn tangent_at(&self, t: f32) -> Vec3 {
    let u = self.param_at(t);
    let tangent = self.spline.derivative(u);
    if tangent.norm_squared() > LENGTH_EPSILON * LENGTH_EPSILON
      && tangent.iter().all(|c| c.is_finite())
    {
      return tangent.normalize();
    }

    // the derivative can vanish at a cusp; fall back to a central difference
    const DELTA: f32 = 1e-4;
    let diff = self.spline.point(u + DELTA) - self.spline.point(u - DELTA);
    diff.normalize()
  }
}

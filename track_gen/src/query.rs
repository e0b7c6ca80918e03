//! Read-only queries over a generated [`TrackModel`].
//!
//! All lookups resolve `t` to a cached sample index with `floor(t * N) mod N` after wrapping `t`
//! into [0, 1), so they're cheap enough to call every frame from physics and camera code.

use crate::{
  model::{TrackModel, TrackSample},
  segments::{offset_in_wrapped_interval, wrap_t},
  Vec3,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrenetFrame {
  pub normal: Vec3,
  pub binormal: Vec3,
  pub tangent: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunnelHit {
  pub tunnel_ix: usize,
  /// 0 at the tunnel entrance, 1 at the exit
  pub progress: f32,
  /// 1 when centered on the track, falling off to 0 at the edges
  pub center_alignment: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostPadHit {
  pub pad_ix: usize,
  /// Seconds
  pub boost_duration: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackEdges {
  pub left: Vec3,
  pub right: Vec3,
}

fn lerp_unit(a: &Vec3, b: &Vec3, alpha: f32) -> Vec3 {
  let blended = a * (1. - alpha) + b * alpha;
  let norm = blended.norm();
  if norm > 1e-6 && norm.is_finite() {
    blended / norm
  } else {
    *a
  }
}

impl TrackModel {
  /// Maps any `t` to the index of its cached sample.
  pub fn index_for_t(&self, t: f32) -> usize {
    let n = self.sample_count();
    (wrap_t(t) * n as f32).floor() as usize % n
  }

  pub fn sample_by_t(&self, t: f32) -> TrackSample {
    self.sample(self.index_for_t(t))
  }

  /// Linearly interpolates between the two cached samples bracketing `t`.  Frame vectors are
  /// renormalized after blending.
  pub fn sample_interpolated(&self, t: f32) -> TrackSample {
    let n = self.sample_count();
    let scaled = wrap_t(t) * n as f32;
    let ix = (scaled.floor() as usize) % n;
    let alpha = (scaled - scaled.floor()).clamp(0., 1.);
    let a = self.sample(ix);
    let b = self.sample((ix + 1) % n);

    TrackSample {
      position: a.position * (1. - alpha) + b.position * alpha,
      tangent: lerp_unit(&a.tangent, &b.tangent, alpha),
      normal: lerp_unit(&a.normal, &b.normal, alpha),
      binormal: lerp_unit(&a.binormal, &b.binormal, alpha),
      bank_radians: a.bank_radians * (1. - alpha) + b.bank_radians * alpha,
    }
  }

  /// Finds the `t` of the cached sample closest to `world_position` with a linear scan.
  pub fn closest_t(&self, world_position: &Vec3) -> f32 {
    let positions = self.positions();
    let mut best_ix = 0;
    let mut best_dist_sq = f32::INFINITY;
    for (ix, p) in positions.iter().enumerate() {
      let dist_sq = (p - world_position).norm_squared();
      if dist_sq < best_dist_sq {
        best_dist_sq = dist_sq;
        best_ix = ix;
      }
    }
    best_ix as f32 / positions.len() as f32
  }

  pub fn frenet_frame(&self, t: f32) -> FrenetFrame {
    let ix = self.index_for_t(t);
    FrenetFrame {
      normal: self.normals()[ix],
      binormal: self.binormals()[ix],
      tangent: self.tangents()[ix],
    }
  }

  /// Distance in meters from the start of the loop to `t`
  pub fn distance_at_t(&self, t: f32) -> f32 {
    wrap_t(t) * self.length()
  }

  pub fn t_at_distance(&self, meters: f32) -> f32 {
    if self.length() <= 0. {
      return 0.;
    }
    wrap_t(meters / self.length())
  }

  /// Signed distance of `world_position` from the centerline along the binormal of the sample at
  /// `t`.
  pub fn lateral_offset(&self, world_position: &Vec3, t: f32) -> f32 {
    let sample = self.sample_by_t(t);
    (world_position - sample.position).dot(&sample.binormal)
  }

  /// The two track edges at `t`, half the track width out along the binormal.
  pub fn edge_points(&self, t: f32) -> TrackEdges {
    let sample = self.sample_by_t(t);
    let half_width = self.width() * 0.5;
    TrackEdges {
      left: sample.position + sample.binormal * half_width,
      right: sample.position - sample.binormal * half_width,
    }
  }

  pub fn tunnel_at_t(&self, t: f32, lateral_offset: f32) -> Option<TunnelHit> {
    let t = wrap_t(t);
    let half_width = self.width() * 0.5;

    self
      .tunnels()
      .iter()
      .enumerate()
      .find_map(|(tunnel_ix, tunnel)| {
        let offset = offset_in_wrapped_interval(t, tunnel.start_t, tunnel.end_t)?;
        let span = tunnel.span_t();
        let progress = if span > 0. {
          (offset / span).clamp(0., 1.)
        } else {
          0.
        };
        let center_alignment = (1. - lateral_offset.abs() / half_width).max(0.);

        Some(TunnelHit {
          tunnel_ix,
          progress,
          center_alignment,
        })
      })
  }

  pub fn boost_pad_at_t(&self, t: f32) -> Option<BoostPadHit> {
    let boost_duration = self.options().boost_pads.boost_duration;
    self
      .boost_pads()
      .iter()
      .position(|pad| pad.contains(t))
      .map(|pad_ix| BoostPadHit {
        pad_ix,
        boost_duration,
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::TrackOptions,
    model::generate,
    segments::{BoostPadSegment, TunnelSegment},
  };

  fn test_track() -> TrackModel {
    let mut opts = TrackOptions::default().with_seed(2024);
    opts.sample_count = 500;
    generate(&opts).unwrap()
  }

  fn wrapping_tunnel_track() -> TrackModel {
    test_track().with_segments(
      vec![
        TunnelSegment {
          start_t: 0.95,
          end_t: 0.05,
          length_meters: 200.,
        },
        TunnelSegment {
          start_t: 0.3,
          end_t: 0.4,
          length_meters: 200.,
        },
      ],
      vec![
        BoostPadSegment {
          t: 0.2,
          length_t: 0.01,
        },
        BoostPadSegment {
          t: 0.995,
          length_t: 0.01,
        },
      ],
    )
  }

  #[test]
  fn test_sample_by_t_wraps_negative() {
    let track = test_track();
    assert_eq!(track.sample_by_t(-0.25), track.sample_by_t(0.75));
    assert_eq!(track.sample_by_t(1.5), track.sample_by_t(0.5));
    assert_eq!(track.sample_by_t(1.), track.sample(0));
  }

  #[test]
  fn test_closest_t_round_trip() {
    let track = test_track();
    let n = track.sample_count();
    for (ix, p) in track.positions().iter().enumerate() {
      let t = track.closest_t(p);
      let found_ix = (t * n as f32).round() as usize % n;
      let diff = found_ix.abs_diff(ix);
      assert!(diff <= 1 || diff == n - 1, "sample {ix} resolved to {found_ix}");
    }
  }

  #[test]
  fn test_frenet_frame_matches_sample() {
    let track = test_track();
    let frame = track.frenet_frame(0.42);
    let sample = track.sample_by_t(0.42);
    assert_eq!(frame.normal, sample.normal);
    assert_eq!(frame.binormal, sample.binormal);
    assert_eq!(frame.tangent, sample.tangent);
  }

  #[test]
  fn test_tunnel_wraparound_query() {
    let track = wrapping_tunnel_track();

    let hit = track.tunnel_at_t(0.98, 0.).unwrap();
    assert_eq!(hit.tunnel_ix, 0);
    assert!((hit.progress - 0.3).abs() < 1e-3, "progress {}", hit.progress);
    assert_eq!(hit.center_alignment, 1.);

    let hit = track.tunnel_at_t(0.02, 0.).unwrap();
    assert!((hit.progress - 0.7).abs() < 1e-3);

    assert!(track.tunnel_at_t(0.5, 0.).is_none());

    let hit = track.tunnel_at_t(0.35, 0.).unwrap();
    assert_eq!(hit.tunnel_ix, 1);
    assert!((hit.progress - 0.5).abs() < 1e-3);
  }

  #[test]
  fn test_tunnel_center_alignment() {
    let track = wrapping_tunnel_track();
    let half_width = track.width() * 0.5;

    let hit = track.tunnel_at_t(0.35, half_width * 0.5).unwrap();
    assert!((hit.center_alignment - 0.5).abs() < 1e-5);
    let hit = track.tunnel_at_t(0.35, -half_width * 0.5).unwrap();
    assert!((hit.center_alignment - 0.5).abs() < 1e-5);
    let hit = track.tunnel_at_t(0.35, half_width * 3.).unwrap();
    assert_eq!(hit.center_alignment, 0.);
  }

  #[test]
  fn test_boost_pad_queries() {
    let track = wrapping_tunnel_track();
    let duration = track.options().boost_pads.boost_duration;

    let hit = track.boost_pad_at_t(0.205).unwrap();
    assert_eq!(hit.pad_ix, 0);
    assert_eq!(hit.boost_duration, duration);

    let hit = track.boost_pad_at_t(0.002).unwrap();
    assert_eq!(hit.pad_ix, 1);
    assert!(track.boost_pad_at_t(0.998).is_some());
    assert!(track.boost_pad_at_t(0.5).is_none());
  }

  #[test]
  fn test_generated_boost_pads_are_hit() {
    let track = test_track();
    for pad in track.boost_pads() {
      assert!(track.boost_pad_at_t(pad.t + pad.length_t * 0.5).is_some());
    }
  }

  #[test]
  fn test_lateral_offset_and_edges() {
    let track = test_track();
    let t = 0.6;
    let edges = track.edge_points(t);
    let half_width = track.width() * 0.5;
    assert!((track.lateral_offset(&edges.left, t) - half_width).abs() < 1e-2);
    assert!((track.lateral_offset(&edges.right, t) + half_width).abs() < 1e-2);
    assert!(((edges.left - edges.right).norm() - track.width()).abs() < 1e-2);

    let center = track.sample_by_t(t).position;
    assert!(track.lateral_offset(&center, t).abs() < 1e-4);
  }

  #[test]
  fn test_distance_conversions() {
    let track = test_track();
    let meters = track.distance_at_t(0.25);
    assert!((meters - track.length() * 0.25).abs() < 1e-2);
    assert!((track.t_at_distance(meters) - 0.25).abs() < 1e-5);
    assert!((track.t_at_distance(track.length() * 1.5) - 0.5).abs() < 1e-5);
  }

  #[test]
  fn test_sample_interpolated() {
    let track = test_track();
    let n = track.sample_count() as f32;
    let exact = track.sample_interpolated(10. / n);
    assert!((exact.position - track.sample(10).position).norm() < 1e-3);

    let mid = track.sample_interpolated(10.5 / n);
    let expected = (track.sample(10).position + track.sample(11).position) * 0.5;
    assert!((mid.position - expected).norm() < 1e-2);
    assert!((mid.normal.norm() - 1.).abs() < 1e-4);

    // blends across the seam rather than jumping back to the start
    let seam = track.sample_interpolated((n - 0.5) / n);
    let last = track.sample(track.sample_count() - 1);
    let expected = (last.position + track.sample(0).position) * 0.5;
    assert!((seam.position - expected).norm() < 1e-2);
  }
}

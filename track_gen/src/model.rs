use log::info;

use crate::{
  config::TrackOptions,
  control_points::{generate_control_polygon, ControlPolygon},
  curve::Curve,
  error::TrackGenError,
  frames::{sample_frames, TrackFrames},
  rng::SeededRandom,
  segments::{place_boost_pads, place_tunnels, BoostPadSegment, TunnelSegment},
  Vec3,
};

/// A single cached sample along the track, returned by value from queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSample {
  pub position: Vec3,
  pub tangent: Vec3,
  pub normal: Vec3,
  pub binormal: Vec3,
  pub bank_radians: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackStats {
  /// Number of samples where a degenerate frame vector was replaced during sampling
  pub degenerate_frame_count: usize,
  pub tunnels_requested: usize,
  pub tunnels_placed: usize,
}

/// Immutable result of track generation.  Everything downstream reads from this; regenerating
/// produces a brand new model rather than mutating an existing one.
#[derive(Clone, Debug)]
pub struct TrackModel {
  pub(crate) options: TrackOptions,
  pub(crate) control_polygon: ControlPolygon,
  pub(crate) frames: TrackFrames,
  pub(crate) length: f32,
  pub(crate) tunnels: Vec<TunnelSegment>,
  pub(crate) boost_pads: Vec<BoostPadSegment>,
  pub(crate) stats: TrackStats,
}

/// Generates a full track from `opts`.  The same options always yield the same track.
pub fn generate(opts: &TrackOptions) -> Result<TrackModel, TrackGenError> {
  opts
    .validate()
    .map_err(|err| err.wrap("Invalid track options"))?;

  let mut rng = SeededRandom::new(opts.seed);
  let control_polygon = generate_control_polygon(opts, &mut rng)
    .map_err(|err| err.wrap(format!("Error generating track with seed={}", opts.seed)))?;
  let curve = Curve::fit(&control_polygon, opts.sample_count);
  let length = curve.total_length();

  let frames = sample_frames(&curve, opts);

  let (tunnels, tunnels_requested) = place_tunnels(&opts.tunnels, length, &mut rng);
  let boost_pads = place_boost_pads(&opts.boost_pads, length);

  let stats = TrackStats {
    degenerate_frame_count: frames.degenerate_count,
    tunnels_requested,
    tunnels_placed: tunnels.len(),
  };
  info!(
    "Generated track seed={} length={length:.1}m control_points={} samples={} tunnels={}/{} \
     boost_pads={}",
    opts.seed,
    control_polygon.points.len(),
    opts.sample_count,
    stats.tunnels_placed,
    stats.tunnels_requested,
    boost_pads.len()
  );

  Ok(TrackModel {
    options: opts.clone(),
    control_polygon,
    frames,
    length,
    tunnels,
    boost_pads,
    stats,
  })
}

impl TrackModel {
  pub fn options(&self) -> &TrackOptions {
    &self.options
  }

  pub fn control_points(&self) -> &[Vec3] {
    &self.control_polygon.points
  }

  pub fn sample_count(&self) -> usize {
    self.frames.positions.len()
  }

  /// Total arc length of the centerline in meters
  pub fn length(&self) -> f32 {
    self.length
  }

  pub fn width(&self) -> f32 {
    self.options.width
  }

  pub fn bounding_radius(&self) -> f32 {
    self.frames.bounding_radius
  }

  pub fn positions(&self) -> &[Vec3] {
    &self.frames.positions
  }

  pub fn tangents(&self) -> &[Vec3] {
    &self.frames.tangents
  }

  pub fn normals(&self) -> &[Vec3] {
    &self.frames.normals
  }

  pub fn binormals(&self) -> &[Vec3] {
    &self.frames.binormals
  }

  pub fn bank_radians(&self) -> &[f32] {
    &self.frames.bank_radians
  }

  pub fn tunnels(&self) -> &[TunnelSegment] {
    &self.tunnels
  }

  pub fn boost_pads(&self) -> &[BoostPadSegment] {
    &self.boost_pads
  }

  pub fn stats(&self) -> &TrackStats {
    &self.stats
  }

  pub fn sample(&self, ix: usize) -> TrackSample {
    TrackSample {
      position: self.frames.positions[ix],
      tangent: self.frames.tangents[ix],
      normal: self.frames.normals[ix],
      binormal: self.frames.binormals[ix],
      bank_radians: self.frames.bank_radians[ix],
    }
  }

  /// Replaces the placed segments.  Used to exercise queries against hand-built segments.
  #[cfg(test)]
  pub(crate) fn with_segments(
    mut self,
    tunnels: Vec<TunnelSegment>,
    boost_pads: Vec<BoostPadSegment>,
  ) -> Self {
    self.stats.tunnels_placed = tunnels.len();
    self.tunnels = tunnels;
    self.boost_pads = boost_pads;
    self
  }
}

use nanoserde::DeJson;

use crate::error::TrackGenError;

#[derive(Clone, Debug, PartialEq)]
pub struct TunnelOptions {
  pub count_min: usize,
  pub count_max: usize,
  /// Meters
  pub length_min: f32,
  /// Meters
  pub length_max: f32,
  /// Minimum distance in meters along the loop between the starts of any two tunnels
  pub min_spacing: f32,
  /// Placement attempts per tunnel before it is skipped
  pub max_attempts: usize,
}

impl Default for TunnelOptions {
  fn default() -> Self {
    TunnelOptions {
      count_min: 2,
      count_max: 4,
      length_min: 60.,
      length_max: 140.,
      min_spacing: 250.,
      max_attempts: 100,
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoostPadOptions {
  /// Desired distance in meters between the starts of consecutive pads.  The actual spacing is
  /// stretched so that pads tile the loop exactly.
  pub target_spacing: f32,
  /// Meters
  pub pad_length: f32,
  /// Seconds of boost granted when a pad is hit
  pub boost_duration: f32,
}

impl Default for BoostPadOptions {
  fn default() -> Self {
    BoostPadOptions {
      target_spacing: 180.,
      pad_length: 8.,
      boost_duration: 1.5,
    }
  }
}

/// All the inputs for generating a track.  The same options always produce the same track.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackOptions {
  pub seed: u64,
  /// Rough complexity of the loop shape
  pub control_point_count: usize,
  pub radius_min: f32,
  pub radius_max: f32,
  pub elevation_amplitude: f32,
  /// Raw control points closer than this to the previously accepted point are dropped
  pub min_chord: f32,
  pub control_point_smooth_passes: usize,
  /// Number of cached samples along the track
  pub sample_count: usize,
  /// Track width in meters
  pub width: f32,
  pub bank_max_deg: f32,
  pub max_curvature: f32,
  pub tunnels: TunnelOptions,
  pub boost_pads: BoostPadOptions,
}

impl Default for TrackOptions {
  fn default() -> Self {
    TrackOptions {
      seed: 1,
      control_point_count: 14,
      radius_min: 220.,
      radius_max: 380.,
      elevation_amplitude: 40.,
      min_chord: 25.,
      control_point_smooth_passes: 1,
      sample_count: 1200,
      width: 24.,
      bank_max_deg: 30.,
      max_curvature: 0.01,
      tunnels: TunnelOptions::default(),
      boost_pads: BoostPadOptions::default(),
    }
  }
}

fn check(cond: bool, msg: impl FnOnce() -> String) -> Result<(), TrackGenError> {
  if cond {
    Ok(())
  } else {
    Err(TrackGenError::invalid_configuration(msg()))
  }
}

impl TrackOptions {
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }

  pub fn validate(&self) -> Result<(), TrackGenError> {
    let floats = [
      ("radius_min", self.radius_min),
      ("radius_max", self.radius_max),
      ("elevation_amplitude", self.elevation_amplitude),
      ("min_chord", self.min_chord),
      ("width", self.width),
      ("bank_max_deg", self.bank_max_deg),
      ("max_curvature", self.max_curvature),
      ("tunnels.length_min", self.tunnels.length_min),
      ("tunnels.length_max", self.tunnels.length_max),
      ("tunnels.min_spacing", self.tunnels.min_spacing),
      ("boost_pads.target_spacing", self.boost_pads.target_spacing),
      ("boost_pads.pad_length", self.boost_pads.pad_length),
      ("boost_pads.boost_duration", self.boost_pads.boost_duration),
    ];
    for (name, val) in floats {
      check(val.is_finite(), || format!("`{name}` must be finite; found {val}"))?;
      check(val >= 0., || format!("`{name}` must be non-negative; found {val}"))?;
    }

    check(self.control_point_count >= 4, || {
      format!(
        "`control_point_count` must be at least 4; found {}",
        self.control_point_count
      )
    })?;
    check(self.sample_count >= 4, || {
      format!("`sample_count` must be at least 4; found {}", self.sample_count)
    })?;
    check(self.radius_min <= self.radius_max, || {
      format!(
        "`radius_min` ({}) must not exceed `radius_max` ({})",
        self.radius_min, self.radius_max
      )
    })?;
    check(self.radius_max > 0., || "`radius_max` must be positive".to_owned())?;
    check(self.width > 0., || "`width` must be positive".to_owned())?;
    check(self.tunnels.count_min <= self.tunnels.count_max, || {
      format!(
        "`tunnels.count_min` ({}) must not exceed `tunnels.count_max` ({})",
        self.tunnels.count_min, self.tunnels.count_max
      )
    })?;
    check(self.tunnels.length_min <= self.tunnels.length_max, || {
      format!(
        "`tunnels.length_min` ({}) must not exceed `tunnels.length_max` ({})",
        self.tunnels.length_min, self.tunnels.length_max
      )
    })?;
    check(self.boost_pads.target_spacing > 0., || {
      "`boost_pads.target_spacing` must be positive".to_owned()
    })?;
    check(
      self.boost_pads.pad_length <= self.boost_pads.target_spacing,
      || {
        format!(
          "`boost_pads.pad_length` ({}) must not exceed `boost_pads.target_spacing` ({})",
          self.boost_pads.pad_length, self.boost_pads.target_spacing
        )
      },
    )?;

    Ok(())
  }

  /// Parses options from JSON.  Any field that isn't provided keeps its default value.
  pub fn from_json(json: &str) -> Result<Self, TrackGenError> {
    let parsed = TrackOptionsJson::deserialize_json(json).map_err(|err| {
      TrackGenError::invalid_configuration(format!("{err:?}"))
        .wrap("Failed to deserialize track options")
    })?;
    let mut opts = TrackOptions::default();
    parsed.apply(&mut opts);
    Ok(opts)
  }
}

#[derive(DeJson, Default)]
struct TunnelOptionsJson {
  count_min: Option<usize>,
  count_max: Option<usize>,
  length_min: Option<f32>,
  length_max: Option<f32>,
  min_spacing: Option<f32>,
  max_attempts: Option<usize>,
}

#[derive(DeJson, Default)]
struct BoostPadOptionsJson {
  target_spacing: Option<f32>,
  pad_length: Option<f32>,
  boost_duration: Option<f32>,
}

#[derive(DeJson, Default)]
struct TrackOptionsJson {
  seed: Option<u64>,
  control_point_count: Option<usize>,
  radius_min: Option<f32>,
  radius_max: Option<f32>,
  elevation_amplitude: Option<f32>,
  min_chord: Option<f32>,
  control_point_smooth_passes: Option<usize>,
  sample_count: Option<usize>,
  width: Option<f32>,
  bank_max_deg: Option<f32>,
  max_curvature: Option<f32>,
  tunnels: Option<TunnelOptionsJson>,
  boost_pads: Option<BoostPadOptionsJson>,
}

macro_rules! apply_fields {
  ($src:expr, $dst:expr, [$($field:ident),*]) => {
    $(
      if let Some(val) = $src.$field {
        $dst.$field = val;
      }
    )*
  };
}

impl TrackOptionsJson {
  fn apply(self, opts: &mut TrackOptions) {
    apply_fields!(
      self,
      opts,
      [
        seed,
        control_point_count,
        radius_min,
        radius_max,
        elevation_amplitude,
        min_chord,
        control_point_smooth_passes,
        sample_count,
        width,
        bank_max_deg,
        max_curvature
      ]
    );

    if let Some(tunnels) = self.tunnels {
      apply_fields!(
        tunnels,
        opts.tunnels,
        [
          count_min,
          count_max,
          length_min,
          length_max,
          min_spacing,
          max_attempts
        ]
      );
    }
    if let Some(pads) = self.boost_pads {
      apply_fields!(
        pads,
        opts.boost_pads,
        [target_spacing, pad_length, boost_duration]
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::TrackGenErrorKind;

  #[test]
  fn test_defaults_are_valid() {
    TrackOptions::default().validate().unwrap();
  }

  #[test]
  fn test_partial_json_keeps_defaults() {
    let opts = TrackOptions::from_json(
      r#"{"seed": 99, "sample_count": 600, "tunnels": {"count_max": 6}}"#,
    )
    .unwrap();
    assert_eq!(opts.seed, 99);
    assert_eq!(opts.sample_count, 600);
    assert_eq!(opts.tunnels.count_max, 6);
    assert_eq!(opts.tunnels.count_min, TunnelOptions::default().count_min);
    assert_eq!(opts.width, TrackOptions::default().width);
    assert_eq!(opts.boost_pads, BoostPadOptions::default());
  }

  #[test]
  fn test_bad_json_is_invalid_configuration() {
    let err = TrackOptions::from_json("{\"seed\": ").unwrap_err();
    assert_eq!(err.kind, TrackGenErrorKind::InvalidConfiguration);
  }

  #[test]
  fn test_validation_failures() {
    let mut opts = TrackOptions::default();
    opts.radius_min = 500.;
    assert!(opts.validate().is_err());

    let mut opts = TrackOptions::default();
    opts.sample_count = 3;
    assert!(opts.validate().is_err());

    let mut opts = TrackOptions::default();
    opts.width = f32::NAN;
    assert!(opts.validate().is_err());

    let mut opts = TrackOptions::default();
    opts.tunnels.count_min = 5;
    opts.tunnels.count_max = 1;
    assert!(opts.validate().is_err());
  }
}

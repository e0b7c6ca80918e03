use log::debug;

use crate::{
  config::{BoostPadOptions, TunnelOptions},
  rng::SeededRandom,
};

/// Interval of the loop covered by a tunnel.  `start_t > end_t` means the tunnel crosses the point
/// where the loop wraps from 1 back to 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunnelSegment {
  pub start_t: f32,
  pub end_t: f32,
  pub length_meters: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostPadSegment {
  pub t: f32,
  /// Fraction of the loop covered by the pad
  pub length_t: f32,
}

/// Wraps any `t` into [0, 1).
#[inline]
pub fn wrap_t(t: f32) -> f32 {
  let wrapped = t - t.floor();
  // `t - floor(t)` can round up to exactly 1 for tiny negative inputs
  if wrapped >= 1. {
    0.
  } else {
    wrapped
  }
}

/// Shortest distance in meters between two positions on the loop, going either direction.
#[inline]
pub fn loop_distance(a: f32, b: f32, total_length: f32) -> f32 {
  let diff = (a - b).abs();
  diff.min(1. - diff) * total_length
}

/// Length of the interval `[start_t, end_t]` as a fraction of the loop, accounting for wrap.
#[inline]
pub fn wrapped_span(start_t: f32, end_t: f32) -> f32 {
  if start_t <= end_t {
    end_t - start_t
  } else {
    end_t + 1. - start_t
  }
}

/// Returns how far `t` is into the wrapped interval as a fraction of the loop, or `None` if it
/// isn't inside of it.
#[inline]
pub fn offset_in_wrapped_interval(t: f32, start_t: f32, end_t: f32) -> Option<f32> {
  if start_t <= end_t {
    if t >= start_t && t <= end_t {
      Some(t - start_t)
    } else {
      None
    }
  } else if t >= start_t {
    Some(t - start_t)
  } else if t <= end_t {
    Some(t + 1. - start_t)
  } else {
    None
  }
}

fn intervals_intersect(a: &TunnelSegment, b: &TunnelSegment) -> bool {
  offset_in_wrapped_interval(a.start_t, b.start_t, b.end_t).is_some()
    || offset_in_wrapped_interval(b.start_t, a.start_t, a.end_t).is_some()
}

impl TunnelSegment {
  pub fn span_t(&self) -> f32 {
    wrapped_span(self.start_t, self.end_t)
  }

  pub fn contains(&self, t: f32) -> bool {
    offset_in_wrapped_interval(wrap_t(t), self.start_t, self.end_t).is_some()
  }

  pub fn overlaps(&self, other: &TunnelSegment) -> bool {
    intervals_intersect(self, other)
  }
}

impl BoostPadSegment {
  pub fn end_t(&self) -> f32 {
    self.t + self.length_t
  }

  pub fn contains(&self, t: f32) -> bool {
    let t = wrap_t(t);
    let end_t = self.end_t();
    if end_t <= 1. {
      t >= self.t && t <= end_t
    } else {
      t >= self.t || t <= end_t - 1.
    }
  }
}

/// Randomly places non-overlapping tunnels along the loop.
///
/// Placement is best-effort: a tunnel that can't find a valid spot within the attempt budget is
/// skipped, so fewer tunnels than requested may be returned.
pub fn place_tunnels(
  opts: &TunnelOptions,
  total_length: f32,
  rng: &mut SeededRandom,
) -> (Vec<TunnelSegment>, usize) {
  let requested = rng.range_inclusive_usize(opts.count_min, opts.count_max);
  let mut tunnels: Vec<TunnelSegment> = Vec::with_capacity(requested);
  if total_length <= 0. {
    return (tunnels, requested);
  }

  for tunnel_ix in 0..requested {
    let mut placed = false;
    for _ in 0..opts.max_attempts {
      let start_t = rng.next();
      // a tunnel can't cover the whole loop
      let length_meters = rng
        .range(opts.length_min, opts.length_max)
        .min(total_length * 0.5);
      let end_t = wrap_t(start_t + length_meters / total_length);
      let candidate = TunnelSegment {
        start_t,
        end_t,
        length_meters,
      };

      let valid = tunnels.iter().all(|other| {
        loop_distance(start_t, other.start_t, total_length) >= opts.min_spacing
          && !candidate.overlaps(other)
      });
      if valid {
        tunnels.push(candidate);
        placed = true;
        break;
      }
    }

    if !placed {
      debug!(
        "Skipping tunnel {tunnel_ix}; no valid placement found in {} attempts",
        opts.max_attempts
      );
    }
  }

  (tunnels, requested)
}

/// Evenly tiles boost pads around the loop.  The spacing is stretched from the target so that it
/// divides the loop length exactly.
pub fn place_boost_pads(opts: &BoostPadOptions, total_length: f32) -> Vec<BoostPadSegment> {
  if total_length <= 0. || opts.target_spacing <= 0. {
    return Vec::new();
  }

  let count = (total_length / opts.target_spacing).floor() as usize;
  if count == 0 {
    return Vec::new();
  }

  let actual_spacing = total_length / count as f32;
  let length_t = opts.pad_length / total_length;
  (0..count)
    .map(|i| BoostPadSegment {
      t: (i as f32 * actual_spacing) / total_length,
      length_t,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wrap_t() {
    assert_eq!(wrap_t(-0.25), 0.75);
    assert_eq!(wrap_t(1.25), 0.25);
    assert_eq!(wrap_t(0.), 0.);
    assert_eq!(wrap_t(1.), 0.);
    let tiny = wrap_t(-1e-9);
    assert!((0. ..1.).contains(&tiny));
  }

  #[test]
  fn test_loop_distance_wraps() {
    assert!((loop_distance(0.95, 0.05, 1000.) - 100.).abs() < 1e-3);
    assert!((loop_distance(0.2, 0.4, 1000.) - 200.).abs() < 1e-3);
  }

  #[test]
  fn test_wrapped_interval_offsets() {
    assert_eq!(offset_in_wrapped_interval(0.5, 0.95, 0.05), None);
    let offset = offset_in_wrapped_interval(0.98, 0.95, 0.05).unwrap();
    assert!((offset - 0.03).abs() < 1e-6);
    let offset = offset_in_wrapped_interval(0.02, 0.95, 0.05).unwrap();
    assert!((offset - 0.07).abs() < 1e-6);
    assert!((wrapped_span(0.95, 0.05) - 0.1).abs() < 1e-6);
  }

  #[test]
  fn test_overlap_detection() {
    let wrapping = TunnelSegment {
      start_t: 0.9,
      end_t: 0.1,
      length_meters: 200.,
    };
    let inside = TunnelSegment {
      start_t: 0.05,
      end_t: 0.2,
      length_meters: 150.,
    };
    let clear = TunnelSegment {
      start_t: 0.3,
      end_t: 0.4,
      length_meters: 100.,
    };
    assert!(wrapping.overlaps(&inside));
    assert!(inside.overlaps(&wrapping));
    assert!(!wrapping.overlaps(&clear));
    assert!(!clear.overlaps(&inside));
  }

  #[test]
  fn test_tunnels_never_overlap() {
    let opts = TunnelOptions {
      count_min: 6,
      count_max: 10,
      length_min: 50.,
      length_max: 300.,
      // spacing alone doesn't prevent overlap here
      min_spacing: 20.,
      max_attempts: 100,
    };
    for seed in 0..32 {
      let (tunnels, requested) = place_tunnels(&opts, 2000., &mut SeededRandom::new(seed));
      assert!(tunnels.len() <= requested);
      for (i, a) in tunnels.iter().enumerate() {
        assert!(a.length_meters >= opts.length_min && a.length_meters <= opts.length_max);
        for b in &tunnels[i + 1..] {
          assert!(!a.overlaps(b), "seed {seed}: {a:?} overlaps {b:?}");
          assert!(loop_distance(a.start_t, b.start_t, 2000.) >= opts.min_spacing);
        }
      }
    }
  }

  #[test]
  fn test_tunnel_shortfall_is_silent() {
    let opts = TunnelOptions {
      count_min: 5,
      count_max: 5,
      length_min: 10.,
      length_max: 10.,
      min_spacing: 400.,
      max_attempts: 100,
    };
    // only two starts can fit at least 400m apart on an 1000m loop
    let (tunnels, requested) = place_tunnels(&opts, 1000., &mut SeededRandom::new(9));
    assert_eq!(requested, 5);
    assert!(tunnels.len() <= 2);
    assert!(!tunnels.is_empty());
  }

  #[test]
  fn test_tunnel_end_matches_length() {
    let opts = TunnelOptions::default();
    let (tunnels, _) = place_tunnels(&opts, 3000., &mut SeededRandom::new(4));
    for tunnel in &tunnels {
      assert!((tunnel.span_t() * 3000. - tunnel.length_meters).abs() < 1e-2);
    }
  }

  #[test]
  fn test_boost_pads_tile_exactly() {
    let opts = BoostPadOptions {
      target_spacing: 180.,
      pad_length: 8.,
      boost_duration: 1.5,
    };
    let total = 1937.5;
    let pads = place_boost_pads(&opts, total);
    assert_eq!(pads.len(), 10);

    let mut covered = 0.;
    for (i, pad) in pads.iter().enumerate() {
      let next_t = pads.get(i + 1).map(|p| p.t).unwrap_or(1.);
      let gap = (next_t - pad.end_t()) * total;
      assert!(gap >= 0.);
      covered += pad.length_t * total + gap;
    }
    assert!((covered - total).abs() < 1e-2);
  }

  #[test]
  fn test_boost_pads_short_loop() {
    let pads = place_boost_pads(&BoostPadOptions::default(), 100.);
    assert!(pads.is_empty());
  }

  #[test]
  fn test_boost_pad_wrapped_contains() {
    let pad = BoostPadSegment {
      t: 0.98,
      length_t: 0.04,
    };
    assert!(pad.contains(0.99));
    assert!(pad.contains(0.01));
    assert!(!pad.contains(0.03));
    assert!(!pad.contains(0.5));
  }
}

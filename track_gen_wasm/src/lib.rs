use std::sync::Arc;

use track_gen::{TrackHandle, TrackModel, TrackOptions, Vec3};
use wasm_bindgen::prelude::*;

static mut DID_INIT: bool = false;

fn maybe_init() {
  unsafe {
    if DID_INIT {
      return;
    }
    DID_INIT = true;
  }

  console_error_panic_hook::set_once();
  wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

fn flatten_vec3s(vecs: &[Vec3]) -> Vec<f32> {
  let mut out = Vec::with_capacity(vecs.len() * 3);
  for v in vecs {
    out.extend_from_slice(&[v.x, v.y, v.z]);
  }
  out
}

#[derive(Default)]
pub struct TrackGenCtx {
  handle: Option<TrackHandle>,
  last_err: Option<String>,
}

impl TrackGenCtx {
  /// Generates a new track from JSON options.  Missing fields use their defaults.  If generation
  /// fails, the previous track (if any) is kept.
  pub fn generate(&mut self, options_json: &str) -> Result<(), String> {
    let res = TrackOptions::from_json(options_json).and_then(|opts| match &self.handle {
      Some(handle) => handle.regenerate(&opts).map(|_| ()),
      None => TrackHandle::new(&opts).map(|handle| {
        self.handle = Some(handle);
      }),
    });

    match res {
      Ok(()) => {
        self.last_err = None;
        Ok(())
      }
      Err(err) => {
        let msg = format!("{err}");
        log::error!("{msg}");
        self.last_err = Some(msg.clone());
        Err(msg)
      }
    }
  }

  pub fn track(&self) -> Option<Arc<TrackModel>> {
    self.handle.as_ref().map(|handle| handle.current())
  }

  fn with_track<T>(&self, default: T, f: impl FnOnce(&TrackModel) -> T) -> T {
    match self.track() {
      Some(track) => f(&track),
      None => default,
    }
  }
}

#[wasm_bindgen]
pub fn track_gen_init() -> *mut TrackGenCtx {
  maybe_init();

  Box::into_raw(Box::new(TrackGenCtx::default()))
}

#[wasm_bindgen]
pub fn track_gen_free(ctx: *mut TrackGenCtx) {
  if ctx.is_null() {
    return;
  }
  drop(unsafe { Box::from_raw(ctx) });
}

/// Returns an empty string on success or the error message on failure.
#[wasm_bindgen]
pub fn track_gen_generate(ctx: *mut TrackGenCtx, options_json: &str) -> String {
  let ctx = unsafe { &mut *ctx };
  match ctx.generate(options_json) {
    Ok(()) => String::new(),
    Err(err) => err,
  }
}

#[wasm_bindgen]
pub fn track_gen_get_err(ctx: *const TrackGenCtx) -> String {
  let ctx = unsafe { &*ctx };
  ctx.last_err.clone().unwrap_or_default()
}

#[wasm_bindgen]
pub fn track_gen_sample_count(ctx: *const TrackGenCtx) -> usize {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0, |track| track.sample_count())
}

#[wasm_bindgen]
pub fn track_gen_length(ctx: *const TrackGenCtx) -> f32 {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0., |track| track.length())
}

#[wasm_bindgen]
pub fn track_gen_width(ctx: *const TrackGenCtx) -> f32 {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0., |track| track.width())
}

#[wasm_bindgen]
pub fn track_gen_bounding_radius(ctx: *const TrackGenCtx) -> f32 {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0., |track| track.bounding_radius())
}

#[wasm_bindgen]
pub fn track_gen_get_positions(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| flatten_vec3s(track.positions()))
}

#[wasm_bindgen]
pub fn track_gen_get_tangents(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| flatten_vec3s(track.tangents()))
}

#[wasm_bindgen]
pub fn track_gen_get_normals(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| flatten_vec3s(track.normals()))
}

#[wasm_bindgen]
pub fn track_gen_get_binormals(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| flatten_vec3s(track.binormals()))
}

#[wasm_bindgen]
pub fn track_gen_get_bank_radians(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| track.bank_radians().to_owned())
}

/// Flattened as `[start_t, end_t, length_meters]` per tunnel
#[wasm_bindgen]
pub fn track_gen_get_tunnels(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| {
    track
      .tunnels()
      .iter()
      .flat_map(|tunnel| [tunnel.start_t, tunnel.end_t, tunnel.length_meters])
      .collect()
  })
}

/// Flattened as `[t, length_t]` per pad
#[wasm_bindgen]
pub fn track_gen_get_boost_pads(ctx: *const TrackGenCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| {
    track
      .boost_pads()
      .iter()
      .flat_map(|pad| [pad.t, pad.length_t])
      .collect()
  })
}

/// Returns `[position, tangent, normal, binormal, bank_radians]` flattened into 13 floats, or an
/// empty vec if no track has been generated.
#[wasm_bindgen]
pub fn track_gen_sample_by_t(ctx: *const TrackGenCtx, t: f32, interpolate: bool) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| {
    let sample = if interpolate {
      track.sample_interpolated(t)
    } else {
      track.sample_by_t(t)
    };
    let mut out = flatten_vec3s(&[sample.position, sample.tangent, sample.normal, sample.binormal]);
    out.push(sample.bank_radians);
    out
  })
}

#[wasm_bindgen]
pub fn track_gen_closest_t(ctx: *const TrackGenCtx, x: f32, y: f32, z: f32) -> f32 {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0., |track| track.closest_t(&Vec3::new(x, y, z)))
}

#[wasm_bindgen]
pub fn track_gen_lateral_offset(ctx: *const TrackGenCtx, x: f32, y: f32, z: f32, t: f32) -> f32 {
  let ctx = unsafe { &*ctx };
  ctx.with_track(0., |track| track.lateral_offset(&Vec3::new(x, y, z), t))
}

/// Returns `[tunnel_ix, progress, center_alignment]`, or an empty vec if `t` isn't in a tunnel.
#[wasm_bindgen]
pub fn track_gen_tunnel_at_t(ctx: *const TrackGenCtx, t: f32, lateral_offset: f32) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(Vec::new(), |track| match track.tunnel_at_t(t, lateral_offset) {
    Some(hit) => vec![hit.tunnel_ix as f32, hit.progress, hit.center_alignment],
    None => Vec::new(),
  })
}

/// Returns the boost duration in seconds if `t` is on a boost pad.
#[wasm_bindgen]
pub fn track_gen_boost_pad_at_t(ctx: *const TrackGenCtx, t: f32) -> Option<f32> {
  let ctx = unsafe { &*ctx };
  ctx.with_track(None, |track| {
    track.boost_pad_at_t(t).map(|hit| hit.boost_duration)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flatten_vec3s() {
    let flat = flatten_vec3s(&[Vec3::new(1., 2., 3.), Vec3::new(4., 5., 6.)]);
    assert_eq!(flat, vec![1., 2., 3., 4., 5., 6.]);
  }

  #[test]
  fn test_ctx_generate_and_regenerate() {
    let mut ctx = TrackGenCtx::default();
    assert!(ctx.track().is_none());
    assert_eq!(ctx.with_track(0, |track| track.sample_count()), 0);

    ctx.generate(r#"{"seed": 10, "sample_count": 300}"#).unwrap();
    let first = ctx.track().unwrap();
    assert_eq!(first.sample_count(), 300);
    assert_eq!(first.options().seed, 10);

    ctx.generate(r#"{"seed": 11, "sample_count": 300}"#).unwrap();
    assert_eq!(ctx.track().unwrap().options().seed, 11);
    assert!(ctx.last_err.is_none());
  }

  #[test]
  fn test_ctx_error_keeps_previous_track() {
    let mut ctx = TrackGenCtx::default();
    ctx.generate(r#"{"seed": 3, "sample_count": 200}"#).unwrap();

    let err = ctx.generate(r#"{"sample_count": 2}"#).unwrap_err();
    assert!(!err.is_empty());
    assert_eq!(ctx.last_err.as_deref(), Some(err.as_str()));
    assert_eq!(ctx.track().unwrap().options().seed, 3);

    assert!(ctx.generate("not json").is_err());
  }
}

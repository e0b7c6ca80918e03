use std::sync::{Arc, RwLock};

use log::info;

use crate::{
  config::TrackOptions,
  error::TrackGenError,
  model::{generate, TrackModel},
};

/// Shared handle to the current track.
///
/// Readers take a cheap `Arc` clone of the whole model.  Regeneration builds the new model before
/// swapping it in, so a reader only ever sees a complete track.
pub struct TrackHandle {
  current: RwLock<Arc<TrackModel>>,
}

impl TrackHandle {
  pub fn new(opts: &TrackOptions) -> Result<Self, TrackGenError> {
    let model = generate(opts)?;
    Ok(TrackHandle {
      current: RwLock::new(Arc::new(model)),
    })
  }

  pub fn current(&self) -> Arc<TrackModel> {
    match self.current.read() {
      Ok(guard) => Arc::clone(&*guard),
      Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
    }
  }

  /// Generates a new track and swaps it in.  On error the current track is left untouched.
  pub fn regenerate(&self, opts: &TrackOptions) -> Result<Arc<TrackModel>, TrackGenError> {
    let model = Arc::new(generate(opts).map_err(|err| err.wrap("Error regenerating track"))?);
    let mut guard = match self.current.write() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Arc::clone(&model);
    info!("Swapped in regenerated track with seed={}", opts.seed);
    Ok(model)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn opts(seed: u64) -> TrackOptions {
    let mut opts = TrackOptions::default().with_seed(seed);
    opts.sample_count = 200;
    opts
  }

  #[test]
  fn test_regenerate_swaps_whole_model() {
    let handle = TrackHandle::new(&opts(1)).unwrap();
    let before = handle.current();
    handle.regenerate(&opts(2)).unwrap();
    let after = handle.current();

    assert_eq!(before.options().seed, 1);
    assert_eq!(after.options().seed, 2);
    // readers holding the old model keep a complete copy of it
    assert_eq!(before.sample_count(), 200);
    assert_ne!(before.positions(), after.positions());
  }

  #[test]
  fn test_failed_regeneration_keeps_current() {
    let handle = TrackHandle::new(&opts(5)).unwrap();
    let mut bad = opts(6);
    bad.sample_count = 0;
    assert!(handle.regenerate(&bad).is_err());
    assert_eq!(handle.current().options().seed, 5);
  }

  #[test]
  fn test_concurrent_readers() {
    let handle = Arc::new(TrackHandle::new(&opts(3)).unwrap());
    let threads: Vec<_> = (0..4)
      .map(|i| {
        let handle = Arc::clone(&handle);
        std::thread::spawn(move || {
          let track = handle.current();
          let sample = track.sample_by_t(i as f32 * 0.2);
          assert!(sample.position.iter().all(|c| c.is_finite()));
          track.sample_count()
        })
      })
      .collect();
    for thread in threads {
      assert_eq!(thread.join().unwrap(), 200);
    }
  }
}

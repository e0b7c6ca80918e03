use std::fmt::{Debug, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackGenErrorKind {
  /// The provided options can't produce a track, either because they fail validation or
  /// because too few control points survived generation for the curve to be fit.
  InvalidConfiguration,
}

/// Error returned from track generation.
///
/// Messages are stacked innermost-first; callers can add context with [`TrackGenError::wrap`].
#[derive(Clone)]
pub struct TrackGenError {
  pub kind: TrackGenErrorKind,
  pub errors: Vec<String>,
}

impl TrackGenError {
  #[cold]
  pub fn invalid_configuration(msg: impl Into<String>) -> Self {
    TrackGenError {
      kind: TrackGenErrorKind::InvalidConfiguration,
      errors: vec![msg.into()],
    }
  }

  #[cold]
  pub fn wrap(mut self, msg: impl Into<String>) -> Self {
    self.errors.push(msg.into());
    self
  }
}

impl Display for TrackGenError {
  #[cold]
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let indent = "  ";
    for (ix, err) in self.errors.iter().rev().enumerate() {
      for _ in 0..ix {
        write!(f, "{indent}")?;
      }
      write!(f, "{err}")?;

      if ix < self.errors.len() - 1 {
        writeln!(f)?;
      }
    }
    Ok(())
  }
}

impl Debug for TrackGenError {
  #[cold]
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}: {self}", self.kind)
  }
}

impl std::error::Error for TrackGenError {}

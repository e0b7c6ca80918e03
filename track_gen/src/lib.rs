//! Procedural generation of closed-loop race tracks.
//!
//! A seeded loop of control points is fit with a centripetal Catmull-Rom spline, sampled into
//! parallel-transported frames with curvature-driven banking, and decorated with tunnels and
//! boost pads.  The output is an immutable [`TrackModel`] that mesh building, physics, camera,
//! and minimap code all read from.

use nalgebra::Vector3;

pub mod config;
pub mod control_points;
pub mod curve;
pub mod error;
pub mod frames;
pub mod handle;
pub mod model;
pub mod query;
pub mod rng;
pub mod segments;

pub type Vec3 = Vector3<f32>;

pub use config::{BoostPadOptions, TrackOptions, TunnelOptions};
pub use error::{TrackGenError, TrackGenErrorKind};
pub use handle::TrackHandle;
pub use model::{generate, TrackModel, TrackSample, TrackStats};
pub use query::{BoostPadHit, FrenetFrame, TrackEdges, TunnelHit};
pub use segments::{BoostPadSegment, TunnelSegment};

//! Camera overlay tracking.
//!
//! Places a single rectangle over the last region found by a (slow,
//! external) image analyzer and keeps it aligned with the scene between
//! passes by nudging it with device rotation.

pub mod analyzer;
pub mod attitude;
pub mod bbox;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod gate;
pub mod mapper;
pub mod math;
pub mod motion;
pub mod overlay;
pub mod session;
pub mod surface;

pub use analyzer::Analyzer;
pub use attitude::AttitudeSample;
pub use config::TrackerConfig;
pub use detection::{DetectorOrigin, NormalizedDetection};
pub use error::Error;
pub use frame::Frame;
pub use gate::DetectionGate;
pub use mapper::{DetectionMapper, Viewport};
pub use motion::OrientationDeltaTracker;
pub use overlay::{OverlayCommand, OverlayStateMachine, TrackingRect};
pub use session::{SessionEvent, SessionHandle, SessionRunner, TrackingSession};
pub use surface::{OverlayStyle, RenderSurface};

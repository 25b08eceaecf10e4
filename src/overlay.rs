//! State of the single tracking overlay.
//!
//! The machine keeps its own copy of the displayed geometry (including any
//! running animation) so that retargeting and nudging can be computed from
//! what is on screen right now, not from the last target.

use crate::bbox::{BBox, Ltwh};
use crate::math;

pub type TrackingRect = BBox<Ltwh>;

pub const DEFAULT_ANIMATION_SECS: f32 = 0.8;

/// Session clock times are seconds as `f64`, geometry stays `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub from: TrackingRect,
    pub to: TrackingRect,
    pub started_at: f64,
    pub duration: f64,
}

impl Animation {
    #[inline]
    pub fn sample(&self, now: f64) -> TrackingRect {
        let t = math::progress(self.started_at, now, self.duration);
        if t >= 1.0 {
            return self.to;
        }

        self.from.lerp(&self.to, math::ease_in_out(t) as f32)
    }

    #[inline]
    pub fn is_finished(&self, now: f64) -> bool {
        math::progress(self.started_at, now, self.duration) >= 1.0
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.from = self.from.translated(dx, dy);
        self.to = self.to.translated(dx, dy);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Absent,
    Tracking {
        target: TrackingRect,
        animation: Option<Animation>,
    },
}

/// What the rendering side has to do after a state change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayCommand {
    Create(TrackingRect),
    Animate(Animation),
    Nudge {
        dx: f32,
        dy: f32,
        displayed: TrackingRect,
    },
}

#[derive(Debug, Clone)]
pub struct OverlayStateMachine {
    state: OverlayState,
    animation_secs: f64,
}

impl OverlayStateMachine {
    pub fn new(animation_secs: f32) -> Self {
        Self {
            state: OverlayState::Absent,
            animation_secs: animation_secs as f64,
        }
    }

    #[inline]
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, OverlayState::Tracking { .. })
    }

    /// Geometry on screen at `now`.
    pub fn displayed(&self, now: f64) -> Option<TrackingRect> {
        match &self.state {
            OverlayState::Absent => None,
            OverlayState::Tracking {
                animation: Some(anim),
                ..
            } => Some(anim.sample(now)),
            OverlayState::Tracking { target, .. } => Some(*target),
        }
    }

    /// Geometry the overlay is at or heading to.
    pub fn target(&self) -> Option<TrackingRect> {
        match &self.state {
            OverlayState::Absent => None,
            OverlayState::Tracking { target, .. } => Some(*target),
        }
    }

    pub fn on_detection(&mut self, rect: TrackingRect, now: f64) -> OverlayCommand {
        let from = match self.displayed(now) {
            None => {
                self.state = OverlayState::Tracking {
                    target: rect,
                    animation: None,
                };
                log::info!("overlay created at {:?}", rect.as_slice());

                return OverlayCommand::Create(rect);
            }
            Some(from) => from,
        };

        let anim = Animation {
            from,
            to: rect,
            started_at: now,
            duration: self.animation_secs,
        };

        self.state = OverlayState::Tracking {
            target: rect,
            animation: Some(anim),
        };

        OverlayCommand::Animate(anim)
    }

    pub fn on_motion_delta(&mut self, dx: f32, dy: f32, now: f64) -> Option<OverlayCommand> {
        let OverlayState::Tracking { target, animation } = &mut self.state else {
            return None;
        };

        *target = target.translated(dx, dy);

        if matches!(animation, Some(anim) if anim.is_finished(now)) {
            *animation = None;
        }

        if let Some(anim) = animation {
            anim.translate(dx, dy);
        }

        let displayed = match animation {
            Some(anim) => anim.sample(now),
            None => *target,
        };

        Some(OverlayCommand::Nudge { dx, dy, displayed })
    }
}

impl Default for OverlayStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_SECS)
    }
}

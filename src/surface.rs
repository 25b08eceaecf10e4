use std::sync::{Arc, Mutex};

use serde_derive::{Deserialize, Serialize};

use crate::overlay::{Animation, OverlayCommand, TrackingRect};

/// Look of the overlay box, handed over once on creation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub border_width: f32,
    /// RGB stroke colour.
    pub stroke: [u8; 3],
    pub fill_alpha: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            border_width: 3.0,
            stroke: [255, 165, 0],
            fill_alpha: 0.2,
        }
    }
}

/// Whatever actually paints the overlay. The session creates the overlay
/// once and only repositions it afterwards.
pub trait RenderSurface {
    fn create_overlay(&mut self, rect: &TrackingRect, style: &OverlayStyle);

    /// Non-blocking; a later call replaces any animation still running.
    fn animate_overlay(&mut self, animation: &Animation);

    /// Immediate shift of the overlay (and of any running animation).
    fn nudge_overlay(&mut self, dx: f32, dy: f32, displayed: &TrackingRect);
}

pub fn apply<S: RenderSurface + ?Sized>(surface: &mut S, cmd: &OverlayCommand, style: &OverlayStyle) {
    match cmd {
        OverlayCommand::Create(rect) => surface.create_overlay(rect, style),
        OverlayCommand::Animate(anim) => surface.animate_overlay(anim),
        OverlayCommand::Nudge { dx, dy, displayed } => surface.nudge_overlay(*dx, *dy, displayed),
    }
}

/// Headless surface that keeps every command it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Arc<Mutex<Vec<OverlayCommand>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<OverlayCommand> {
        match self.commands.lock() {
            Ok(cmds) => cmds.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, cmd: OverlayCommand) {
        match self.commands.lock() {
            Ok(mut cmds) => cmds.push(cmd),
            Err(poisoned) => poisoned.into_inner().push(cmd),
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn create_overlay(&mut self, rect: &TrackingRect, _style: &OverlayStyle) {
        self.push(OverlayCommand::Create(*rect));
    }

    fn animate_overlay(&mut self, animation: &Animation) {
        self.push(OverlayCommand::Animate(*animation));
    }

    fn nudge_overlay(&mut self, dx: f32, dy: f32, displayed: &TrackingRect) {
        self.push(OverlayCommand::Nudge {
            dx,
            dy,
            displayed: *displayed,
        });
    }
}

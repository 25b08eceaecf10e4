//! Session runtime.
//!
//! `TrackingSession` is the serial context: it owns the overlay and is the
//! only place overlay geometry is written. `SessionRunner` puts it on its own
//! thread, fed through a channel by the attitude source and by a single
//! analysis worker, so events are applied in arrival order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::analyzer::{self, Analyzer};
use crate::attitude::AttitudeSample;
use crate::config::TrackerConfig;
use crate::detection::NormalizedDetection;
use crate::error::Error;
use crate::frame::Frame;
use crate::gate::{DetectionGate, GatePermit};
use crate::mapper::{DetectionMapper, Viewport};
use crate::motion::OrientationDeltaTracker;
use crate::overlay::{OverlayCommand, OverlayStateMachine, TrackingRect};
use crate::surface::{self, RenderSurface};

/// Result of one analysis pass, marshaled back to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOutcome {
    /// Pixel extent `(width, height)` of the analyzed frame.
    pub extent: (u32, u32),
    pub detection: Option<NormalizedDetection>,
    pub captured_at: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Layout(Viewport),
    Attitude(AttitudeSample),
    Analysis(AnalysisOutcome),
    Shutdown,
}

pub struct TrackingSession<S: RenderSurface> {
    config: TrackerConfig,
    surface: S,
    mapper: Option<DetectionMapper>,
    motion: OrientationDeltaTracker,
    overlay: OverlayStateMachine,
    last_attitude: Option<AttitudeSample>,
    epoch: Instant,
}

impl<S: RenderSurface> TrackingSession<S> {
    pub fn new(config: TrackerConfig, surface: S) -> Self {
        Self {
            motion: OrientationDeltaTracker::new(config.motion_gain),
            overlay: OverlayStateMachine::new(config.animation_secs),
            mapper: None,
            last_attitude: None,
            epoch: Instant::now(),
            config,
            surface,
        }
    }

    /// Seconds since the session was created.
    #[inline]
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn overlay(&self) -> &OverlayStateMachine {
        &self.overlay
    }

    #[inline]
    pub fn mapper(&self) -> Option<&DetectionMapper> {
        self.mapper.as_ref()
    }

    #[inline]
    pub fn has_reference(&self) -> bool {
        self.motion.reference().is_some()
    }

    #[inline]
    pub fn displayed(&self, now: f64) -> Option<TrackingRect> {
        self.overlay.displayed(now)
    }

    /// Returns `false` once the session should stop.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        let now = self.now();
        self.handle_at(event, now)
    }

    pub fn handle_at(&mut self, event: SessionEvent, now: f64) -> bool {
        match event {
            SessionEvent::Layout(viewport) => self.on_layout(viewport),
            SessionEvent::Attitude(sample) => self.on_attitude(&sample, now),
            SessionEvent::Analysis(outcome) => self.on_analysis(&outcome, now),
            SessionEvent::Shutdown => return false,
        }

        true
    }

    pub fn on_layout(&mut self, viewport: Viewport) {
        if let Some(mapper) = &self.mapper {
            log::debug!(
                "viewport already laid out as {:?}, ignoring {:?}",
                mapper.viewport(),
                viewport
            );
        } else {
            log::info!("viewport laid out: {}x{}", viewport.width, viewport.height);
            self.mapper = Some(DetectionMapper::new(viewport, self.config.detector_origin));
        }

        if let Some(sample) = self.last_attitude {
            self.motion.capture_reference(&sample);
        }
    }

    pub fn on_attitude(&mut self, sample: &AttitudeSample, now: f64) {
        self.last_attitude = Some(*sample);

        if self.mapper.is_none() {
            return;
        }

        if !self.has_reference() {
            self.motion.capture_reference(sample);
        }

        let Some((dx, dy)) = self.motion.update(sample) else {
            return;
        };

        if let Some(cmd) = self.overlay.on_motion_delta(dx, dy, now) {
            self.render(&cmd);
        }
    }

    pub fn on_analysis(&mut self, outcome: &AnalysisOutcome, now: f64) {
        let Some(mapper) = self.mapper.as_mut() else {
            log::debug!("analysis result before layout, dropping");
            return;
        };

        let Some(det) = outcome.detection else {
            log::debug!("no detection in frame captured at {:.3}s", outcome.captured_at);
            return;
        };

        mapper.measure(outcome.extent);
        if mapper.is_degenerate() {
            let (w, h) = outcome.extent;
            log::warn!("cannot map detection from a {}x{} frame, skipping", w, h);
            return;
        }

        let rect = mapper.map(&det);
        if !rect.as_ltrb().intersects(&mapper.viewport().bounds()) {
            log::debug!("detection mapped off screen: {:?}", rect.as_slice());
        }

        log::debug!(
            "detection {:?} (captured {:.3}s) -> {:?}",
            det,
            outcome.captured_at,
            rect.as_slice()
        );

        let cmd = self.overlay.on_detection(rect, now);
        self.render(&cmd);
    }

    fn render(&mut self, cmd: &OverlayCommand) {
        surface::apply(&mut self.surface, cmd, &self.config.style);
    }
}

/// Starts the session and analysis threads.
pub struct SessionRunner;

impl SessionRunner {
    pub fn spawn<A, S>(
        config: TrackerConfig,
        analyzer: A,
        surface: S,
    ) -> Result<SessionHandle<S>, Error>
    where
        A: Analyzer + 'static,
        S: RenderSurface + Send + 'static,
    {
        let (events_tx, events_rx) = unbounded::<SessionEvent>();
        let (frames_tx, frames_rx) = bounded::<(Frame, GatePermit)>(1);

        let session = TrackingSession::new(config, surface);
        let consumer = thread::Builder::new()
            .name("scantrack-session".into())
            .spawn(move || Self::run_session(session, events_rx))?;

        let worker_events = events_tx.clone();
        let worker = thread::Builder::new()
            .name("scantrack-analysis".into())
            .spawn(move || Self::run_analysis(analyzer, frames_rx, worker_events))?;

        log::info!("tracking session started");

        Ok(SessionHandle {
            events: events_tx,
            frames: Some(frames_tx),
            gate: Arc::new(DetectionGate::new()),
            consumer: Some(consumer),
            worker: Some(worker),
        })
    }

    fn run_session<S: RenderSurface>(
        mut session: TrackingSession<S>,
        events: Receiver<SessionEvent>,
    ) -> TrackingSession<S> {
        for event in events.iter() {
            if !session.handle(event) {
                break;
            }
        }

        log::info!("tracking session stopped");
        session
    }

    fn run_analysis<A: Analyzer>(
        mut analyzer: A,
        frames: Receiver<(Frame, GatePermit)>,
        events: Sender<SessionEvent>,
    ) {
        for (frame, permit) in frames.iter() {
            let detection = analyzer::first_detection(&mut analyzer, &frame);
            let outcome = AnalysisOutcome {
                extent: frame.dims,
                detection,
                captured_at: frame.timestamp,
            };

            // result goes out before the gate opens again
            let sent = events.send(SessionEvent::Analysis(outcome));
            drop(permit);

            if sent.is_err() {
                break;
            }
        }
    }
}

pub struct SessionHandle<S: RenderSurface> {
    events: Sender<SessionEvent>,
    frames: Option<Sender<(Frame, GatePermit)>>,
    gate: Arc<DetectionGate>,
    consumer: Option<JoinHandle<TrackingSession<S>>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: RenderSurface> SessionHandle<S> {
    #[inline]
    pub fn gate(&self) -> &Arc<DetectionGate> {
        &self.gate
    }

    pub fn layout(&self, viewport: Viewport) -> Result<(), Error> {
        self.send(SessionEvent::Layout(viewport))
    }

    pub fn submit_attitude(&self, sample: AttitudeSample) -> Result<(), Error> {
        self.send(SessionEvent::Attitude(sample))
    }

    /// Hands `frame` to the analysis worker if no pass is in flight.
    /// Returns `false` when the frame was dropped.
    pub fn submit_frame(&self, frame: Frame) -> bool {
        let Some(frames) = &self.frames else {
            return false;
        };

        let Some(permit) = self.gate.try_permit() else {
            log::trace!("analysis busy, dropping frame at {:.3}s", frame.timestamp);
            return false;
        };

        match frames.try_send((frame, permit)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("analysis queue full while gate was free");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stops both threads and hands back the session state.
    pub fn shutdown(mut self) -> Option<TrackingSession<S>> {
        self.stop()
    }

    fn send(&self, event: SessionEvent) -> Result<(), Error> {
        self.events.send(event).map_err(|_| Error::SessionClosed)
    }

    fn stop(&mut self) -> Option<TrackingSession<S>> {
        // closing the frame channel ends the worker after its current pass
        self.frames.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("analysis worker panicked");
            }
        }

        let consumer = self.consumer.take()?;
        let _ = self.events.send(SessionEvent::Shutdown);

        match consumer.join() {
            Ok(session) => Some(session),
            Err(_) => {
                log::error!("session thread panicked");
                None
            }
        }
    }
}

impl<S: RenderSurface> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn session() -> (TrackingSession<RecordingSurface>, RecordingSurface) {
        let surface = RecordingSurface::new();
        (TrackingSession::new(TrackerConfig::default(), surface.clone()), surface)
    }

    fn outcome(x: f32, y: f32, w: f32) -> SessionEvent {
        SessionEvent::Analysis(AnalysisOutcome {
            extent: (1920, 1080),
            detection: Some(NormalizedDetection::new(x, y, w, 0.0)),
            captured_at: 0.0,
        })
    }

    fn level(t: f32) -> SessionEvent {
        SessionEvent::Attitude(AttitudeSample::new(0.0, 0.0, 0.0, t))
    }

    #[test]
    fn detection_before_layout_is_dropped() {
        let (mut session, surface) = session();

        assert!(session.handle_at(outcome(0.4, 0.3, 0.2), 0.0));
        assert!(surface.commands().is_empty());
        assert!(!session.overlay().is_tracking());
    }

    #[test]
    fn attitude_before_layout_becomes_reference_on_layout() {
        let (mut session, _) = session();

        session.handle_at(level(0.0), 0.0);
        assert!(!session.has_reference());

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.01);
        assert!(session.has_reference());
    }

    #[test]
    fn first_sample_after_layout_is_reference() {
        let (mut session, _) = session();

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.0);
        assert!(!session.has_reference());

        session.handle_at(level(0.03), 0.03);
        assert!(session.has_reference());
    }

    #[test]
    fn detection_then_nudge() {
        let (mut session, surface) = session();

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.0);
        session.handle_at(level(0.0), 0.0);
        session.handle_at(outcome(0.4, 0.3, 0.2), 0.1);

        let created = match surface.commands().as_slice() {
            [OverlayCommand::Create(rect)] => *rect,
            other => panic!("unexpected {:?}", other),
        };
        assert!((created.left() - 147.525).abs() < 1e-2);

        session.handle_at(
            SessionEvent::Attitude(AttitudeSample::new(1f32.to_radians(), 0.0, 0.0, 0.13)),
            0.13,
        );

        let displayed = session.displayed(0.13).unwrap();
        assert!((displayed.left() - created.left() - 3.0).abs() < 1e-2);
        assert!((displayed.top() - created.top()).abs() < 1e-2);
        assert!(matches!(
            surface.commands().last(),
            Some(OverlayCommand::Nudge { .. })
        ));
    }

    #[test]
    fn miss_leaves_overlay_in_place() {
        let (mut session, surface) = session();

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.0);
        session.handle_at(outcome(0.4, 0.3, 0.2), 0.1);
        let before = session.displayed(0.2);

        session.handle_at(
            SessionEvent::Analysis(AnalysisOutcome {
                extent: (1920, 1080),
                detection: None,
                captured_at: 0.15,
            }),
            0.2,
        );

        assert_eq!(session.displayed(0.2), before);
        assert_eq!(surface.commands().len(), 1);
    }

    #[test]
    fn second_detection_animates_and_retargets() {
        let (mut session, surface) = session();

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.0);
        session.handle_at(outcome(0.4, 0.3, 0.2), 0.0);
        session.handle_at(outcome(0.1, 0.5, 0.3), 0.5);
        let mid = session.displayed(0.6).unwrap();
        session.handle_at(outcome(0.6, 0.6, 0.1), 0.6);

        let cmds = surface.commands();
        assert_eq!(cmds.len(), 3);
        assert!(matches!(cmds[0], OverlayCommand::Create(_)));
        match cmds[2] {
            OverlayCommand::Animate(anim) => {
                assert_eq!(anim.from, mid);
                assert_eq!(anim.duration, crate::overlay::DEFAULT_ANIMATION_SECS as f64);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_frame_does_not_create_overlay() {
        let (mut session, surface) = session();

        session.handle_at(SessionEvent::Layout(Viewport::new(390.0, 844.0)), 0.0);
        session.handle_at(level(0.0), 0.0);

        for extent in [(0, 0), (1920, 0), (0, 1080)] {
            session.handle_at(
                SessionEvent::Analysis(AnalysisOutcome {
                    extent,
                    detection: Some(NormalizedDetection::new(0.4, 0.3, 0.2, 0.0)),
                    captured_at: 0.05,
                }),
                0.1,
            );
        }
        session.handle_at(
            SessionEvent::Attitude(AttitudeSample::new(1f32.to_radians(), 0.0, 0.0, 0.13)),
            0.13,
        );

        assert!(surface.commands().is_empty());
        assert!(!session.overlay().is_tracking());

        // a well-formed frame afterwards still lands a finite overlay
        session.handle_at(outcome(0.4, 0.3, 0.2), 0.2);
        let shown = session.displayed(0.2).unwrap();
        assert!(shown.is_finite());
        assert!((shown.left() - 147.525).abs() < 1e-2);
    }

    #[test]
    fn shutdown_stops_handling() {
        let (mut session, _) = session();

        assert!(!session.handle_at(SessionEvent::Shutdown, 0.0));
    }
}

use crate::detection::NormalizedDetection;
use crate::error::Error;
use crate::frame::Frame;

/// The external detector. It is owned by a single analysis worker and is
/// never called again before the previous call has returned, so stateful
/// detectors can take `&mut self` directly.
pub trait Analyzer: Send {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<NormalizedDetection>, Error>;
}

impl<F> Analyzer for F
where
    F: FnMut(&Frame) -> Result<Vec<NormalizedDetection>, Error> + Send,
{
    #[inline]
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<NormalizedDetection>, Error> {
        self(frame)
    }
}

/// Runs one pass and keeps only the first result. Failures are logged and
/// reported as no detection.
pub fn first_detection<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    frame: &Frame,
) -> Option<NormalizedDetection> {
    match analyzer.analyze(frame) {
        Ok(dets) => {
            if dets.len() > 1 {
                log::debug!("{} detections in frame, using the first", dets.len());
            }

            dets.into_iter().next()
        }
        Err(err) => {
            log::warn!("analysis of {}x{} frame failed: {}", frame.width(), frame.height(), err);
            None
        }
    }
}

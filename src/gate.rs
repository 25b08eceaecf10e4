use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Non-blocking busy flag that keeps analysis passes from overlapping.
#[derive(Debug, Default)]
pub struct DetectionGate {
    busy: AtomicBool,
}

impl DetectionGate {
    pub fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Marks the gate busy if it was free. `false` means the frame must be dropped.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        if !self.busy.swap(false, Ordering::AcqRel) {
            log::warn!("detection gate released while not held");
        }
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Like [`try_acquire`](Self::try_acquire), the returned permit releases on drop.
    pub fn try_permit(self: &Arc<Self>) -> Option<GatePermit> {
        if self.try_acquire() {
            Some(GatePermit {
                gate: Arc::clone(self),
            })
        } else {
            None
        }
    }
}

/// One acquisition of a [`DetectionGate`]; dropping it releases the gate,
/// including during unwinding.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<DetectionGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

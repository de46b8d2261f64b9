// THEORY:
// The `FrameCycle` is the heartbeat of the tracking layer. It owns no entities; it
// only decides *when* the resolver's buffers rotate. Between a frame's start and its
// end, detections accumulate into the current buffer. At the end, the current
// buffer becomes the previous one and a fresh, empty current buffer opens.
//
// This rotation is the only way an entity ever disappears. There is no TTL and no
// separate garbage collection.
//
// The host's clock is expected to alternate start and end strictly. When it does
// not (a missed or doubled boundary), the cycle logs the anomaly and carries on,
// because every frame is an independent attempt anyway.

use crate::core_modules::identity_resolver::IdentityResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Detections are being collected for the frame in progress.
    Accumulating,
    /// The last frame has been closed; waiting for the next to start.
    Rotating,
}

#[derive(Debug)]
pub struct FrameCycle {
    phase: FramePhase,
    /// Number of completed frames.
    frame_index: u64,
    /// Set by a frame start or a detection, cleared when the frame closes.
    open: bool,
}

impl FrameCycle {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Accumulating,
            frame_index: 0,
            open: false,
        }
    }

    pub fn begin(&mut self) {
        if self.phase == FramePhase::Accumulating && self.frame_index > 0 {
            log::warn!("frame start without a preceding frame end (frame {})", self.frame_index);
        }
        self.phase = FramePhase::Accumulating;
        self.open = true;
    }

    /// Closes the current frame and rotates the resolver's buffers. Returns the index
    /// of the frame that was just closed.
    pub fn end(&mut self, resolver: &mut IdentityResolver) -> u64 {
        if self.phase == FramePhase::Rotating {
            log::warn!("frame end without a frame start (frame {})", self.frame_index);
        }
        self.phase = FramePhase::Rotating;
        self.open = false;
        resolver.rotate();
        let closed = self.frame_index;
        self.frame_index += 1;
        closed
    }

    /// Called for every detection; notes detections that arrive between frames.
    pub fn note_detection(&mut self) {
        if self.phase == FramePhase::Rotating {
            log::debug!("detection between frames; counting it towards frame {}", self.frame_index);
        }
        self.open = true;
    }

    /// True once a frame has started or received a detection and has not yet ended.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Index of the frame currently accumulating.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameCycle {
    fn default() -> Self {
        Self::new()
    }
}

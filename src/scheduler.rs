/// Render state of the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    RenderPending,
}

/// Demand-driven frame scheduler.
///
/// At most one render is ever pending: any number of triggers arriving
/// before the next frame collapse into that single frame. A frame clears
/// the pending flag before doing any work, so a trigger raised while the
/// frame runs (e.g. damped controls still moving) schedules the next one.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    state: RenderState,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a render. Returns true if this call scheduled a new frame,
    /// false if one was already pending.
    pub fn request_render(&mut self) -> bool {
        match self.state {
            RenderState::RenderPending => false,
            RenderState::Idle => {
                self.state = RenderState::RenderPending;
                true
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RenderState::RenderPending
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Start the pending frame, if any. Transitions back to idle first.
    pub fn begin_frame(&mut self) -> bool {
        if self.state != RenderState::RenderPending {
            return false;
        }
        self.state = RenderState::Idle;
        self.frames += 1;
        true
    }

    /// Number of frames begun so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

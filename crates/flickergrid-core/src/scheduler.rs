#![forbid(unsafe_code)]

//! Visibility-gated frame scheduling.
//!
//! The host owns the repaint clock. The scheduler asks it for one frame at a
//! time through [`FrameRequester`] and only while the surface is visible:
//!
//! ```text
//!            visible=true            frame fires
//!   Idle ───────────────► Scheduled ────────────► Running
//!    ▲  ◄─────────────────    │                     │ end_tick
//!    │    visible=false       │                     ▼
//!    │    (cancel pending)    └──── Scheduled ◄── visible? request next
//!    │                                              │ not visible
//!    └──────────────────────────────────────────────┘
//!
//!   any state ── teardown ──► TornDown (absorbing)
//! ```
//!
//! At most one frame is ever pending. Ticks that arrive while no frame is
//! pending are stale and ignored.

use std::fmt;

/// Opaque id of a frame request, as returned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Host repaint scheduler.
pub trait FrameRequester {
    /// Ask for one callback on the next repaint. `None` means the host cannot
    /// schedule frames (the loop stays idle).
    fn request_frame(&mut self) -> Option<FrameHandle>;

    /// Cancel a pending request. Cancelling a fired or unknown handle is a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Host-driven [`FrameRequester`] for headless hosts and tests.
///
/// Requests are recorded, never fired automatically: the host calls
/// [`ManualFrames::fire`] and then dispatches a tick.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    next_id: u32,
    pending: Option<FrameHandle>,
    requested: u64,
    cancelled: u64,
    refuse: bool,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A requester that refuses every request, like a host without a repaint loop.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Consume the pending request, as the host does when it repaints.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    #[inline]
    pub fn requested(&self) -> u64 {
        self.requested
    }

    #[inline]
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameRequester for ManualFrames {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        if self.refuse {
            return None;
        }
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        self.requested += 1;
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No frame pending.
    Idle,
    /// One frame requested from the host.
    Scheduled(FrameHandle),
    /// Inside an update/render pass.
    Running,
    /// Torn down; every further call is a no-op.
    TornDown,
}

/// Gates the tick loop on viewport visibility.
#[derive(Debug, Clone)]
pub struct VisibilityScheduler {
    visible: bool,
    state: SchedulerState,
    passes: u64,
}

impl Default for VisibilityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityScheduler {
    /// Starts hidden and idle; the host reports visibility once observed.
    pub fn new() -> Self {
        Self {
            visible: false,
            state: SchedulerState::Idle,
            passes: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.state == SchedulerState::TornDown
    }

    /// Completed update/render passes.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Record a visibility report. Returns the new state.
    ///
    /// Becoming visible requests a frame if none is pending. Becoming hidden
    /// cancels the pending frame so the loop stops entirely.
    pub fn on_visibility(
        &mut self,
        visible: bool,
        frames: &mut dyn FrameRequester,
    ) -> SchedulerState {
        if self.is_torn_down() {
            return self.state;
        }
        self.visible = visible;
        match (visible, self.state) {
            (true, SchedulerState::Idle) => {
                self.schedule(frames);
                tracing::debug!(state = ?self.state, "resumed");
            }
            (false, SchedulerState::Scheduled(handle)) => {
                frames.cancel_frame(handle);
                self.state = SchedulerState::Idle;
                tracing::debug!(%handle, "paused");
            }
            _ => {}
        }
        self.state
    }

    /// Accept a tick from the host. Returns `false` for stale ticks, which
    /// must not update or render.
    pub fn begin_tick(&mut self) -> bool {
        match self.state {
            SchedulerState::Scheduled(_) if self.visible => {
                self.state = SchedulerState::Running;
                true
            }
            _ => false,
        }
    }

    /// Finish a pass and chain the next frame while still visible.
    pub fn end_tick(&mut self, frames: &mut dyn FrameRequester) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.passes += 1;
        self.state = SchedulerState::Idle;
        if self.visible {
            self.schedule(frames);
        }
    }

    /// Cancel any pending frame and stop for good. Safe to call repeatedly.
    pub fn teardown(&mut self, frames: &mut dyn FrameRequester) {
        if let SchedulerState::Scheduled(handle) = self.state {
            frames.cancel_frame(handle);
        }
        if !self.is_torn_down() {
            tracing::debug!(passes = self.passes, "teardown");
        }
        self.state = SchedulerState::TornDown;
        self.visible = false;
    }

    fn schedule(&mut self, frames: &mut dyn FrameRequester) {
        match frames.request_frame() {
            Some(handle) => {
                self.state = SchedulerState::Scheduled(handle);
                tracing::trace!(%handle, "scheduled");
            }
            None => self.state = SchedulerState::Idle,
        }
    }
}

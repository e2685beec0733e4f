#![forbid(unsafe_code)]

//! Headless host: a [`FlickeringGrid`] on a [`PixelSurface`] driven by a
//! manual clock and [`ManualFrames`].

use flickergrid_core::{
    ConfigError, DEFAULT_SEED, Dispatch, FlickerConfig, FlickeringGrid, ManualFrames,
    PixelSurface, SchedulerState,
};

use crate::checksum::frame_checksum;
use crate::run_log::RunLogger;
use crate::scenario::{Scenario, Step};

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub case: String,
    pub seed: u64,
    /// Frames that ran an update/render pass.
    pub frames: u64,
    /// Frame slots where no frame was pending (hidden, idle or torn down).
    pub skipped: u64,
    pub columns: usize,
    pub rows: usize,
    /// Lit cells after the last step.
    pub lit: usize,
    pub final_checksum: Option<String>,
    pub torn_down: bool,
}

/// Owns the component under test plus its clock and frame source.
#[derive(Debug)]
pub struct HeadlessHost {
    grid: FlickeringGrid<PixelSurface>,
    frames: ManualFrames,
    seed: u64,
    now_ms: f64,
    frame_id: u64,
}

impl HeadlessHost {
    pub fn new(config: FlickerConfig) -> Result<Self, ConfigError> {
        Self::build(config, Some(PixelSurface::new()))
    }

    /// Host whose component never got a drawable surface.
    pub fn without_surface(config: FlickerConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    fn build(config: FlickerConfig, surface: Option<PixelSurface>) -> Result<Self, ConfigError> {
        let seed = config.seed.unwrap_or(DEFAULT_SEED);
        Ok(Self {
            grid: FlickeringGrid::new(config, surface)?,
            frames: ManualFrames::new(),
            seed,
            now_ms: 0.0,
            frame_id: 0,
        })
    }

    pub fn grid(&self) -> &FlickeringGrid<PixelSurface> {
        &self.grid
    }

    pub fn surface(&self) -> Option<&PixelSurface> {
        self.grid.surface()
    }

    pub fn frames(&self) -> &ManualFrames {
        &self.frames
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Play `scenario` from the current state, logging to `log`.
    pub fn run(&mut self, scenario: &Scenario, log: &mut RunLogger) -> RunSummary {
        let _span = tracing::debug_span!("flickergrid.harness.run", case = %scenario.name).entered();
        let config = self.grid.config();
        log.log_start(
            &scenario.name,
            self.seed,
            config.max_opacity,
            config.cell_size,
            config.gap,
        );

        let mut frames = 0u64;
        let mut skipped = 0u64;
        let mut final_checksum = None;

        for step in &scenario.steps {
            match *step {
                Step::Resize { width, height, dpr } => {
                    if let Dispatch::Regridded(geometry) =
                        self.grid.resize(width, height, dpr, &mut self.frames)
                    {
                        log.log_resize(width, height, dpr, geometry.columns, geometry.rows);
                    }
                }
                Step::Visible(visible) => {
                    if let Dispatch::Visibility(state) =
                        self.grid.set_visible(visible, &mut self.frames)
                    {
                        log.log_visibility(visible, state_name(state));
                    }
                }
                Step::Frames { count, frame_ms } => {
                    for _ in 0..count {
                        self.now_ms += frame_ms;
                        if self.frames.fire().is_none() {
                            skipped += 1;
                            continue;
                        }
                        match self.grid.tick(self.now_ms, &mut self.frames) {
                            Dispatch::Rendered(stats) => {
                                self.frame_id += 1;
                                frames += 1;
                                let checksum = self.surface().map(frame_checksum);
                                if let Some(ref sum) = checksum {
                                    log.log_frame(
                                        self.frame_id,
                                        self.now_ms,
                                        stats.flickered_on,
                                        stats.decayed,
                                        stats.drawn,
                                        self.grid.grid().lit_count(),
                                        sum,
                                    );
                                }
                                final_checksum = checksum;
                            }
                            _ => skipped += 1,
                        }
                    }
                }
                Step::Idle { ms } => self.now_ms += ms,
                Step::MaxOpacity(value) => {
                    if let Err(err) = self.grid.set_max_opacity(value) {
                        tracing::warn!(%err, "max-opacity step rejected");
                        log.log_error(&err.to_string());
                    }
                }
                Step::Teardown => {
                    self.grid.teardown(&mut self.frames);
                    log.log_teardown(self.grid.scheduler().passes());
                }
            }
        }

        log.log_complete(frames, skipped);
        let geometry = self.grid.grid().geometry();
        let summary = RunSummary {
            case: scenario.name.clone(),
            seed: self.seed,
            frames,
            skipped,
            columns: geometry.columns,
            rows: geometry.rows,
            lit: self.grid.grid().lit_count(),
            final_checksum,
            torn_down: self.grid.is_torn_down(),
        };
        tracing::info!(
            case = %summary.case,
            frames = summary.frames,
            skipped = summary.skipped,
            "run complete"
        );
        summary
    }
}

/// Lower-case scheduler state label used in logs.
pub fn state_name(state: SchedulerState) -> &'static str {
    match state {
        SchedulerState::Idle => "idle",
        SchedulerState::Scheduled(_) => "scheduled",
        SchedulerState::Running => "running",
        SchedulerState::TornDown => "torn_down",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_run_renders_every_frame() {
        let mut host = HeadlessHost::new(FlickerConfig::default().with_seed(1)).unwrap();
        let mut log = RunLogger::noop();
        let summary = host.run(&Scenario::steady(200.0, 200.0, 1.0, 10, 16.0), &mut log);
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.skipped, 0);
        assert_eq!((summary.columns, summary.rows), (10, 10));
        assert_eq!(log.events("frame").count(), 10);
        assert_eq!(host.now_ms(), 160.0);
    }

    #[test]
    fn frames_before_show_are_skipped() {
        let mut host = HeadlessHost::new(FlickerConfig::default()).unwrap();
        let scenario = Scenario::new(
            "hidden",
            vec![
                Step::Resize {
                    width: 100.0,
                    height: 100.0,
                    dpr: 1.0,
                },
                Step::Frames {
                    count: 5,
                    frame_ms: 16.0,
                },
            ],
        );
        let summary = host.run(&scenario, &mut RunLogger::noop());
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.skipped, 5);
        assert_eq!(summary.final_checksum, None);
    }

    #[test]
    fn inert_host_logs_nothing_but_bookends() {
        let mut host = HeadlessHost::without_surface(FlickerConfig::default()).unwrap();
        let mut log = RunLogger::noop();
        let summary = host.run(&Scenario::steady(100.0, 100.0, 1.0, 3, 16.0), &mut log);
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.skipped, 3);
        assert_eq!(log.records().len(), 2);
    }

    #[test]
    fn rejected_opacity_is_logged() {
        let mut host = HeadlessHost::new(FlickerConfig::default()).unwrap();
        let mut log = RunLogger::noop();
        host.run(
            &Scenario::new("bad", vec![Step::MaxOpacity(2.0)]),
            &mut log,
        );
        assert_eq!(log.events("error").count(), 1);
        assert_eq!(host.grid().config().max_opacity, 0.8);
    }

    #[test]
    fn state_labels() {
        assert_eq!(state_name(SchedulerState::Idle), "idle");
        assert_eq!(state_name(SchedulerState::TornDown), "torn_down");
    }
}

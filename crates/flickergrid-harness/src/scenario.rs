#![forbid(unsafe_code)]

//! Scripted host event sequences.
//!
//! A scenario is a flat list of [`Step`]s. They can be built in code, parsed
//! from a small line-oriented script, or generated from a seed as a "storm" of
//! resizes and visibility flips.
//!
//! # Script format
//!
//! One step per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! resize 200 200 2     # width height [dpr]
//! show
//! frames 30 16         # count [frame_ms]
//! hide
//! idle 500             # advance the clock without firing frames
//! max-opacity 0.4
//! teardown
//! ```

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Default frame interval in ms (60 Hz).
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// One host action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Container resized to `width` x `height` logical px.
    Resize { width: f32, height: f32, dpr: f32 },
    /// Intersection observer reported visibility.
    Visible(bool),
    /// Fire up to `count` pending frames, `frame_ms` apart.
    Frames { count: u32, frame_ms: f64 },
    /// Advance the clock without firing frames.
    Idle { ms: f64 },
    /// Change the opacity bound at runtime.
    MaxOpacity(f32),
    /// Unmount.
    Teardown,
}

/// A named step list.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Resize once, become visible, render `frames` frames.
    pub fn steady(width: f32, height: f32, dpr: f32, frames: u32, frame_ms: f64) -> Self {
        Self::new(
            "steady",
            vec![
                Step::Resize { width, height, dpr },
                Step::Visible(true),
                Step::Frames {
                    count: frames,
                    frame_ms,
                },
            ],
        )
    }

    /// Seeded mix of resizes, visibility flips and frame bursts, ending in a
    /// teardown.
    ///
    /// Sizes stay within `max_width` x `max_height`; a few resizes collapse the
    /// container to zero. Non-finite or sub-pixel bounds count as 1.
    pub fn storm(seed: u64, events: usize, max_width: f32, max_height: f32) -> Self {
        let bound = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        let (max_width, max_height) = (bound(max_width), bound(max_height));
        let mut rng = SmallRng::seed_from_u64(seed);
        let dprs = [1.0_f32, 1.5, 2.0, 3.0];
        let mut steps = vec![
            Step::Resize {
                width: max_width,
                height: max_height,
                dpr: 1.0,
            },
            Step::Visible(true),
        ];
        for _ in 0..events {
            let step = match rng.random_range(0..10u8) {
                0..=2 => {
                    let collapse = rng.random_bool(0.1);
                    Step::Resize {
                        width: if collapse {
                            0.0
                        } else {
                            rng.random_range(1.0..=max_width).floor()
                        },
                        height: rng.random_range(1.0..=max_height).floor(),
                        dpr: dprs[rng.random_range(0..dprs.len())],
                    }
                }
                3..=4 => Step::Visible(rng.random_bool(0.6)),
                5 => Step::Idle {
                    ms: f64::from(rng.random_range(10..500u32)),
                },
                _ => Step::Frames {
                    count: rng.random_range(1..8),
                    frame_ms: DEFAULT_FRAME_MS,
                },
            };
            steps.push(step);
        }
        steps.push(Step::Teardown);
        Self::new(format!("storm-{seed:x}"), steps)
    }

    /// Parse a script (see the module docs).
    pub fn parse(name: impl Into<String>, script: &str) -> Result<Self, ScenarioError> {
        let mut steps = Vec::new();
        for (idx, raw) in script.lines().enumerate() {
            let line = idx + 1;
            let text = raw.split('#').next().unwrap_or("").trim();
            if text.is_empty() {
                continue;
            }
            let mut words = text.split_whitespace();
            let Some(word) = words.next() else {
                continue;
            };
            let args: Vec<&str> = words.collect();
            let step = match word {
                "resize" => Step::Resize {
                    width: required(line, word, &args, 0)?,
                    height: required(line, word, &args, 1)?,
                    dpr: optional(line, &args, 2)?.unwrap_or(1.0),
                },
                "show" => Step::Visible(true),
                "hide" => Step::Visible(false),
                "frames" => Step::Frames {
                    count: required(line, word, &args, 0)?,
                    frame_ms: optional(line, &args, 1)?.unwrap_or(DEFAULT_FRAME_MS),
                },
                "idle" => Step::Idle {
                    ms: required(line, word, &args, 0)?,
                },
                "max-opacity" => Step::MaxOpacity(required(line, word, &args, 0)?),
                "teardown" => Step::Teardown,
                other => {
                    return Err(ScenarioError::UnknownStep {
                        line,
                        word: other.to_string(),
                    });
                }
            };
            steps.push(step);
        }
        Ok(Self::new(name, steps))
    }

    /// Total frames requested across all `Frames` steps.
    pub fn requested_frames(&self) -> u64 {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Frames { count, .. } => u64::from(*count),
                _ => 0,
            })
            .sum()
    }
}

fn optional<T: std::str::FromStr>(
    line: usize,
    args: &[&str],
    index: usize,
) -> Result<Option<T>, ScenarioError> {
    match args.get(index) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ScenarioError::BadNumber {
                line,
                value: (*value).to_string(),
            }),
    }
}

fn required<T: std::str::FromStr>(
    line: usize,
    step: &str,
    args: &[&str],
    index: usize,
) -> Result<T, ScenarioError> {
    optional(line, args, index)?.ok_or_else(|| ScenarioError::MissingArgument {
        line,
        step: step.to_string(),
    })
}

/// Script parse failure. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    UnknownStep { line: usize, word: String },
    MissingArgument { line: usize, step: String },
    BadNumber { line: usize, value: String },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStep { line, word } => write!(f, "line {line}: unknown step `{word}`"),
            Self::MissingArgument { line, step } => {
                write!(f, "line {line}: `{step}` is missing an argument")
            }
            Self::BadNumber { line, value } => write!(f, "line {line}: `{value}` is not a number"),
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_script() {
        let script = "\
# warm up
resize 200 100 2
show
frames 3 10
hide   # pause
idle 500
max-opacity 0.25
teardown
";
        let scenario = Scenario::parse("s", script).unwrap();
        assert_eq!(
            scenario.steps,
            vec![
                Step::Resize {
                    width: 200.0,
                    height: 100.0,
                    dpr: 2.0
                },
                Step::Visible(true),
                Step::Frames {
                    count: 3,
                    frame_ms: 10.0
                },
                Step::Visible(false),
                Step::Idle { ms: 500.0 },
                Step::MaxOpacity(0.25),
                Step::Teardown,
            ]
        );
        assert_eq!(scenario.requested_frames(), 3);
    }

    #[test]
    fn parse_defaults() {
        let scenario = Scenario::parse("s", "resize 10 10\nframes 2").unwrap();
        assert_eq!(
            scenario.steps,
            vec![
                Step::Resize {
                    width: 10.0,
                    height: 10.0,
                    dpr: 1.0
                },
                Step::Frames {
                    count: 2,
                    frame_ms: DEFAULT_FRAME_MS
                },
            ]
        );
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        assert_eq!(
            Scenario::parse("s", "show\njump"),
            Err(ScenarioError::UnknownStep {
                line: 2,
                word: "jump".into()
            })
        );
        assert_eq!(
            Scenario::parse("s", "resize 10"),
            Err(ScenarioError::MissingArgument {
                line: 1,
                step: "resize".into()
            })
        );
        let err = Scenario::parse("s", "\n\nframes many").unwrap_err();
        assert_eq!(err.to_string(), "line 3: `many` is not a number");
    }

    #[test]
    fn storm_is_seeded() {
        let a = Scenario::storm(7, 50, 400.0, 300.0);
        let b = Scenario::storm(7, 50, 400.0, 300.0);
        let c = Scenario::storm(8, 50, 400.0, 300.0);
        assert_eq!(a, b);
        assert_ne!(a.steps, c.steps);
        assert_eq!(a.steps.len(), 53);
        assert_eq!(a.steps.last(), Some(&Step::Teardown));
    }

    #[test]
    fn storm_respects_bounds() {
        let storm = Scenario::storm(99, 200, 320.0, 240.0);
        for step in &storm.steps {
            if let Step::Resize { width, height, .. } = *step {
                assert!((0.0..=320.0).contains(&width));
                assert!((0.0..=240.0).contains(&height));
            }
        }
    }

    #[test]
    fn storm_tolerates_non_finite_bounds() {
        for (w, h) in [
            (f32::INFINITY, 240.0),
            (320.0, f32::NAN),
            (f32::NEG_INFINITY, -5.0),
        ] {
            let storm = Scenario::storm(3, 100, w, h);
            assert_eq!(storm.steps.len(), 103);
            for step in &storm.steps {
                if let Step::Resize { width, height, .. } = *step {
                    assert!(width.is_finite() && height.is_finite());
                }
            }
        }
    }
}

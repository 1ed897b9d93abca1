use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use super::actions::{ActionExecutor, ExecutorConfig};
use crate::sequence::models::{
    Action, ActionKind, ActionSequence, LOOP_FOREVER, ScrollDirection,
};

/// An action's execute path failed. Carries the serialized variant name and
/// the underlying fault; this is the crate's one typed execution error.
#[derive(Debug, Error)]
#[error("failed to execute {variant} action: {source}")]
pub struct ActionError {
    pub variant: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ActionError {
    fn new(variant: &'static str, source: anyhow::Error) -> Self {
        Self {
            variant,
            source: source.into(),
        }
    }
}

/// How a single action ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Completed,
    /// The action was disabled; the simulation capability was never invoked.
    Skipped,
}

/// Snapshot handed to the progress callback before each action and once
/// between passes (with `action_index` and `action` unset).
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Zero-based index of the current pass.
    pub loop_index: usize,
    /// Total passes; `None` when looping forever.
    pub loop_total: Option<usize>,
    /// Zero-based index of the next action, or `None` for the inter-pass wait.
    pub action_index: Option<usize>,
    pub action_total: usize,
    pub action: Option<&'a Action>,
}

/// Why the run ended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All passes finished (possibly with recorded failures when
    /// `stop_on_error` is off).
    #[default]
    Completed,
    /// The cancellation predicate fired.
    Cancelled,
    /// An action failed with `stop_on_error` enabled.
    Aborted,
}

/// One recorded action failure.
#[derive(Debug)]
pub struct ActionFailure {
    pub loop_index: usize,
    pub action_index: usize,
    pub error: ActionError,
}

/// Aggregated result of a sequence run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Full passes over the action list that ran to their end.
    pub loops_completed: usize,
    pub executed: usize,
    pub skipped: usize,
    pub failures: Vec<ActionFailure>,
}

impl RunReport {
    /// True when every pass completed and no action failed.
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Completed && self.failures.is_empty()
    }
}

/// Plays an [`ActionSequence`] back against the input layer.
///
/// A linear state machine: iterate passes (`loop_count` when looping is
/// enabled, once otherwise, forever on the [`LOOP_FOREVER`] sentinel), within
/// each pass iterate actions in order. Before each action the optional
/// progress callback and cancellation predicate run; failures either abort
/// the run (`stop_on_error`) or are recorded and skipped past. At most one
/// run per runner at a time; the runner owns the executor and its state.
pub struct SequenceRunner {
    executor: ActionExecutor,
}

impl SequenceRunner {
    /// Create a runner with the given executor configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            executor: ActionExecutor::new(config),
        }
    }

    /// Is dry-run currently enabled?
    pub fn is_dry_run(&self) -> bool {
        self.executor.is_dry_run()
    }

    /// Enable or disable dry-run mode at runtime.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.executor.set_dry_run(dry_run);
    }

    /// Run the sequence to completion, cancellation, or abort.
    ///
    /// `on_progress` is invoked with the current indices before every action
    /// and once before each inter-pass wait. `stop_requested` is polled at the
    /// top of every pass, before every action, and during inter-pass waits;
    /// returning true ends the run with [`RunOutcome::Cancelled`].
    pub fn run(
        &mut self,
        seq: &ActionSequence,
        mut on_progress: Option<&mut dyn FnMut(&Progress<'_>)>,
        stop_requested: Option<&dyn Fn() -> bool>,
    ) -> RunReport {
        let action_total = seq.actions.len();
        let loop_total = if seq.loop_enabled {
            (seq.loop_count != LOOP_FOREVER).then_some(seq.loop_count as usize)
        } else {
            Some(1)
        };

        info!(
            target: "playbot::runner",
            sequence = %seq.name,
            actions = action_total,
            ?loop_total,
            "Starting sequence run"
        );

        let mut report = RunReport::default();
        let mut loop_index = 0usize;

        'run: loop {
            if loop_total.is_some_and(|total| loop_index >= total) {
                break;
            }
            if stop_fired(stop_requested) {
                report.outcome = RunOutcome::Cancelled;
                break;
            }

            for (action_index, action) in seq.actions.iter().enumerate() {
                if stop_fired(stop_requested) {
                    report.outcome = RunOutcome::Cancelled;
                    break 'run;
                }
                emit(
                    &mut on_progress,
                    Progress {
                        loop_index,
                        loop_total,
                        action_index: Some(action_index),
                        action_total,
                        action: Some(action),
                    },
                );

                match self.run_action(action) {
                    Ok(ActionStatus::Completed) => report.executed += 1,
                    Ok(ActionStatus::Skipped) => report.skipped += 1,
                    Err(err) => {
                        error!(
                            target: "playbot::runner",
                            loop_index, action_index, error = %err,
                            "Action failed"
                        );
                        report.failures.push(ActionFailure {
                            loop_index,
                            action_index,
                            error: err,
                        });
                        if seq.stop_on_error {
                            report.outcome = RunOutcome::Aborted;
                            break 'run;
                        }
                    }
                }
            }

            report.loops_completed += 1;
            loop_index += 1;

            let more_passes = loop_total.is_none_or(|total| loop_index < total);
            if more_passes && seq.repeat_interval > 0.0 {
                emit(
                    &mut on_progress,
                    Progress {
                        loop_index: loop_index - 1,
                        loop_total,
                        action_index: None,
                        action_total,
                        action: None,
                    },
                );
                if !self.wait_between_loops(seq.repeat_interval, stop_requested) {
                    report.outcome = RunOutcome::Cancelled;
                    break;
                }
            }
        }

        info!(
            target: "playbot::runner",
            outcome = ?report.outcome,
            loops = report.loops_completed,
            executed = report.executed,
            skipped = report.skipped,
            failures = report.failures.len(),
            "Sequence run finished"
        );
        report
    }

    /// Execute one action: honor the enabled flag and the pre-delay, then
    /// dispatch the variant to the executor.
    fn run_action(&mut self, action: &Action) -> Result<ActionStatus, ActionError> {
        if !action.enabled {
            info!(target: "playbot::runner", action = %action, "Skipping disabled action");
            return Ok(ActionStatus::Skipped);
        }

        let variant = action.kind.variant_name();
        if action.delay > 0.0 {
            debug!(
                target: "playbot::runner",
                action = %action, delay = action.delay,
                "Honoring pre-delay"
            );
            self.executor
                .sleep_secs(action.delay)
                .map_err(|e| ActionError::new(variant, e))?;
        }

        let result = match &action.kind {
            ActionKind::TypeText { text } => self.executor.type_text(text),
            ActionKind::Click { x, y, button } => self.executor.click_at(*x, *y, *button),
            ActionKind::Delay { wait_secs } => self.executor.sleep_secs(*wait_secs),
            ActionKind::Hotkey { keys } => self.executor.hotkey(keys),
            ActionKind::SpecialKey { key } => self.executor.press_key(key),
            ActionKind::Scroll {
                x,
                y,
                clicks,
                direction,
            } => {
                // Enigo's vertical axis counts downward scrolls as positive.
                let amount = match direction {
                    ScrollDirection::Up => -(*clicks as i32),
                    ScrollDirection::Down => *clicks as i32,
                };
                self.executor.scroll_at(*x, *y, amount)
            }
            ActionKind::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
                duration_secs,
                button,
            } => self
                .executor
                .drag(*start_x, *start_y, *end_x, *end_y, *duration_secs, *button),
        };

        match result {
            Ok(()) => Ok(ActionStatus::Completed),
            Err(err) => Err(ActionError::new(variant, err)),
        }
    }

    /// Sleep the inter-pass interval in small slices, polling the stop hook
    /// between slices. Returns false when cancelled mid-wait.
    fn wait_between_loops(&self, secs: f64, stop_requested: Option<&dyn Fn() -> bool>) -> bool {
        const SLICE: Duration = Duration::from_millis(50);

        if !secs.is_finite() || secs <= 0.0 {
            return true;
        }
        if self.executor.is_dry_run() {
            debug!(target: "playbot::runner", secs, "DRY-RUN inter-pass wait");
            return !stop_fired(stop_requested);
        }

        let mut remaining = Duration::from_secs_f64(secs);
        while !remaining.is_zero() {
            if stop_fired(stop_requested) {
                return false;
            }
            let step = remaining.min(SLICE);
            thread::sleep(step);
            remaining -= step;
        }
        true
    }
}

fn stop_fired(stop_requested: Option<&dyn Fn() -> bool>) -> bool {
    stop_requested.is_some_and(|check| check())
}

fn emit(on_progress: &mut Option<&mut dyn FnMut(&Progress<'_>)>, progress: Progress<'_>) {
    if let Some(callback) = on_progress.as_mut() {
        callback(&progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::models::{Action, MouseButton};
    use std::cell::Cell;

    fn dry_runner() -> SequenceRunner {
        SequenceRunner::new(ExecutorConfig {
            dry_run: true,
            pause_ms: 0,
            failsafe: false,
        })
    }

    fn type_action(text: &str) -> Action {
        Action::new(ActionKind::TypeText { text: text.into() })
    }

    fn failing_action() -> Action {
        // Unknown key names fail resolution before any input is simulated,
        // so this fails in dry-run too.
        Action::new(ActionKind::SpecialKey {
            key: "hyperdrive".into(),
        })
    }

    #[test]
    fn test_loop_count_runs_exact_passes() {
        let mut seq = ActionSequence::new("loops");
        seq.loop_enabled = true;
        seq.loop_count = 3;
        seq.add_action(type_action("a"));
        seq.add_action(type_action("b"));

        let mut action_events = 0usize;
        let mut progress = |p: &Progress<'_>| {
            if p.action_index.is_some() {
                action_events += 1;
            }
        };
        let report = dry_runner().run(&seq, Some(&mut progress), None);

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.loops_completed, 3);
        assert_eq!(report.executed, 6);
        assert!(report.succeeded());
        assert_eq!(action_events, 6);
    }

    #[test]
    fn test_loop_disabled_ignores_count() {
        let mut seq = ActionSequence::new("single");
        seq.loop_enabled = false;
        seq.loop_count = 10;
        seq.add_action(type_action("a"));

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.loops_completed, 1);
        assert_eq!(report.executed, 1);
    }

    #[test]
    fn test_disabled_action_is_skipped_not_executed() {
        // A disabled failing action must be reported successful, proving its
        // execute path was never entered.
        let mut bad = failing_action();
        bad.enabled = false;

        let mut seq = ActionSequence::new("skip");
        seq.add_action(bad);
        seq.add_action(type_action("after"));

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.executed, 1);
        assert!(report.failures.is_empty());
        assert!(report.succeeded());
    }

    #[test]
    fn test_stop_on_error_halts_at_failure() {
        let mut seq = ActionSequence::new("abort");
        seq.stop_on_error = true;
        seq.add_action(failing_action());
        seq.add_action(type_action("never reached"));

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.outcome, RunOutcome::Aborted);
        assert_eq!(report.executed, 0);
        assert_eq!(report.loops_completed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].action_index, 0);
        assert_eq!(report.failures[0].error.variant, "special_key");
        assert!(!report.succeeded());
    }

    #[test]
    fn test_continue_on_error_attempts_every_action() {
        let mut seq = ActionSequence::new("continue");
        seq.stop_on_error = false;
        seq.add_action(failing_action());
        seq.add_action(type_action("still runs"));

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.executed, 1);
        assert_eq!(report.loops_completed, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.succeeded());
    }

    #[test]
    fn test_cancellation_before_first_action() {
        let mut seq = ActionSequence::new("cancel");
        seq.add_action(type_action("a"));

        let stop = || true;
        let report = dry_runner().run(&seq, None, Some(&stop));
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.executed, 0);
        assert_eq!(report.loops_completed, 0);
    }

    #[test]
    fn test_forever_sentinel_runs_until_cancelled() {
        let mut seq = ActionSequence::new("forever");
        seq.loop_enabled = true;
        seq.loop_count = LOOP_FOREVER;
        seq.add_action(type_action("a"));
        seq.add_action(type_action("b"));

        let seen = Cell::new(0usize);
        let mut progress = |p: &Progress<'_>| {
            if p.action_index.is_some() {
                seen.set(seen.get() + 1);
            }
            assert_eq!(p.loop_total, None);
        };
        let stop = || seen.get() >= 4;
        let report = dry_runner().run(&seq, Some(&mut progress), Some(&stop));

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.loops_completed, 2);
        assert_eq!(report.executed, 4);
    }

    #[test]
    fn test_between_pass_progress_event() {
        let mut seq = ActionSequence::new("interval");
        seq.loop_enabled = true;
        seq.loop_count = 2;
        seq.repeat_interval = 0.2;
        seq.add_action(type_action("a"));

        let mut waits = Vec::new();
        let mut progress = |p: &Progress<'_>| {
            if p.action_index.is_none() {
                waits.push(p.loop_index);
            }
        };
        let report = dry_runner().run(&seq, Some(&mut progress), None);

        // One wait, after the first pass only.
        assert_eq!(waits, vec![0]);
        assert_eq!(report.loops_completed, 2);
    }

    #[test]
    fn test_delay_then_click_twice() {
        let mut seq = ActionSequence::new("demo");
        seq.loop_enabled = true;
        seq.loop_count = 2;
        seq.stop_on_error = false;
        seq.add_action(Action::new(ActionKind::Delay { wait_secs: 0.5 }));
        seq.add_action(Action::new(ActionKind::Click {
            x: 100,
            y: 200,
            button: MouseButton::Left,
        }));

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.loops_completed, 2);
        assert_eq!(report.executed, 4);
    }

    #[test]
    fn test_pre_delay_failure_carries_variant_name() {
        // Force the executor down its failing path via an unknown hotkey key
        // with a pre-delay set; the error still names the variant.
        let mut seq = ActionSequence::new("named");
        seq.add_action(
            Action::new(ActionKind::Hotkey {
                keys: vec!["warp".into()],
            })
            .with_delay(0.0),
        );

        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.failures[0].error.variant, "hotkey");
        let shown = report.failures[0].error.to_string();
        assert!(shown.contains("hotkey"), "got: {shown}");
    }

    #[test]
    fn test_empty_sequence_completes_trivially() {
        let seq = ActionSequence::new("empty");
        let report = dry_runner().run(&seq, None, None);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.loops_completed, 1);
        assert_eq!(report.executed, 0);
    }
}

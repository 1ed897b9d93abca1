#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for Playbot.

This module wires together:
- `actions`: low-level input simulation (keyboard, mouse, sleeps) with
  dry-run mode, settle pauses, and the pointer-corner fail-safe
- `runner`: sequence playback with looping, progress reporting, cooperative
  cancellation, and per-action result aggregation

Typical usage:
- Construct a `SequenceRunner` with an `ExecutorConfig`.
- Call `SequenceRunner::run` with a loaded `ActionSequence` and optional
  progress/stop hooks.

Example:
```no_run
use playbot::executor::{ExecutorConfig, SequenceRunner};
use playbot::sequence::{Action, ActionKind, ActionSequence};

let mut seq = ActionSequence::new("demo");
seq.add_action(Action::new(ActionKind::TypeText { text: "hello<enter>".into() }));

let mut runner = SequenceRunner::new(ExecutorConfig { dry_run: true, ..Default::default() });
let report = runner.run(&seq, None, None);
assert!(report.succeeded());
```

Public re-exports:
- `ActionExecutor`/`ExecutorConfig`: perform low-level inputs (respecting dry-run).
- `SequenceRunner` and its report types: orchestrate sequence playback.
*/

pub mod actions;
pub mod runner;

// Re-exports for convenient access from `playbot::executor::*`
pub use actions::{ActionExecutor, ExecutorConfig};
pub use runner::{
    ActionError, ActionFailure, ActionStatus, Progress, RunOutcome, RunReport, SequenceRunner,
};

use anyhow::{Context, Result, anyhow, bail};
use enigo::Keyboard as _;
use enigo::Mouse as _;
use enigo::{Axis, Button as EButton, Coordinate, Direction, Enigo, Key, Settings};
use std::thread;
use std::time::Duration;
use tracing::{info, trace, warn};

use crate::sequence::models::MouseButton as CMouseButton;
use crate::utils::keys::{self, TextSegment};

/// Explicit executor configuration.
///
/// The underlying automation library keeps no global state here; the pause
/// and fail-safe knobs that are usually module-wide flags are plain fields.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// When true, actions are only logged and no real input is simulated.
    pub dry_run: bool,
    /// Settle pause after each simulated input, in milliseconds.
    pub pause_ms: u64,
    /// Abort an input when the pointer is parked in the top-left screen corner,
    /// giving the user an escape hatch from a runaway sequence.
    pub failsafe: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            pause_ms: 50,
            failsafe: true,
        }
    }
}

/// Executes low-level input actions (keyboard/mouse/sleep) with optional dry-run mode.
/// In dry-run mode, actions are only logged, real sleeps are skipped, and the
/// Enigo handle is never initialized.
pub struct ActionExecutor {
    config: ExecutorConfig,
    enigo: Option<Enigo>,
}

impl ActionExecutor {
    /// Create a new executor. The Enigo handle is created lazily on first real input.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            enigo: None,
        }
    }

    /// Returns whether the executor is currently in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Enable or disable dry-run mode dynamically.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.config.dry_run = dry_run;
    }

    /// Type text, pressing embedded `<enter>`-style tokens as keys.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let segments = keys::parse_text_segments(text);
        if self.config.dry_run {
            info!(target: "playbot::executor", %text, segments = segments.len(), "DRY-RUN type_text");
            return Ok(());
        }
        self.guard_failsafe()?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "playbot::executor", %text, "type_text");
        for segment in &segments {
            match segment {
                TextSegment::Text(literal) => enigo.text(literal)?,
                TextSegment::Key(name) => match keys::lookup_key(name) {
                    Some(key) => enigo.key(key, Direction::Click)?,
                    None => {
                        warn!(target: "playbot::executor", %name, "Unresolvable key token; typing literally");
                        enigo.text(&format!("<{name}>"))?;
                    }
                },
            }
        }
        self.settle();
        Ok(())
    }

    /// Click a mouse button at absolute screen coordinates.
    pub fn click_at(&mut self, x: i32, y: i32, button: CMouseButton) -> Result<()> {
        if self.config.dry_run {
            info!(target: "playbot::executor", x, y, ?button, "DRY-RUN click_at");
            return Ok(());
        }
        self.guard_failsafe()?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "playbot::executor", x, y, ?button, "click_at");
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        enigo.button(map_mouse_button(button), Direction::Click)?;
        self.settle();
        Ok(())
    }

    /// Press a single named key (e.g., "enter", "f5").
    /// Unknown key names are an error even in dry-run; resolution is pure.
    pub fn press_key(&mut self, name: &str) -> Result<()> {
        let key = keys::lookup_key(name).ok_or_else(|| anyhow!("unknown key name '{name}'"))?;
        if self.config.dry_run {
            info!(target: "playbot::executor", %name, "DRY-RUN press_key");
            return Ok(());
        }
        self.guard_failsafe()?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "playbot::executor", %name, "press_key");
        enigo.key(key, Direction::Click)?;
        self.settle();
        Ok(())
    }

    /// Press a hotkey chord: every key down in list order, released in reverse.
    /// All names must resolve before anything is pressed.
    pub fn hotkey(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            bail!("hotkey needs at least one key");
        }
        let resolved = names
            .iter()
            .map(|name| {
                keys::lookup_key(name).ok_or_else(|| anyhow!("unknown key '{name}' in hotkey"))
            })
            .collect::<Result<Vec<Key>>>()?;

        if self.config.dry_run {
            info!(target: "playbot::executor", keys = %names.join("+"), "DRY-RUN hotkey");
            return Ok(());
        }
        self.guard_failsafe()?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "playbot::executor", keys = %names.join("+"), "hotkey");
        for key in &resolved {
            enigo.key(*key, Direction::Press)?;
        }
        for key in resolved.iter().rev() {
            enigo.key(*key, Direction::Release)?;
        }
        self.settle();
        Ok(())
    }

    /// Scroll the wheel at a screen position. Positive amounts scroll down,
    /// negative up (enigo's vertical axis convention).
    pub fn scroll_at(&mut self, x: i32, y: i32, amount: i32) -> Result<()> {
        if self.config.dry_run {
            info!(target: "playbot::executor", x, y, amount, "DRY-RUN scroll_at");
            return Ok(());
        }
        self.guard_failsafe()?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "playbot::executor", x, y, amount, "scroll_at");
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        if amount != 0 {
            enigo.scroll(amount, Axis::Vertical)?;
        }
        self.settle();
        Ok(())
    }

    /// Drag from start to end over `secs`, holding `button`. Pointer motion is
    /// interpolated in small timed steps since enigo has no timed drag.
    pub fn drag(
        &mut self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        secs: f64,
        button: CMouseButton,
    ) -> Result<()> {
        if !secs.is_finite() || secs <= 0.0 {
            bail!("drag duration of {secs} seconds is not a positive number");
        }
        if self.config.dry_run {
            info!(
                target: "playbot::executor",
                start_x, start_y, end_x, end_y, secs, ?button,
                "DRY-RUN drag"
            );
            return Ok(());
        }
        self.guard_failsafe()?;

        // Aim for ~60 steps per second, bounded so extreme durations stay sane.
        let steps = ((secs * 60.0).ceil() as u32).clamp(1, 600);
        let step_pause = Duration::from_secs_f64(secs / f64::from(steps));
        let btn = map_mouse_button(button);

        let enigo = self.ensure_enigo()?;
        trace!(
            target: "playbot::executor",
            start_x, start_y, end_x, end_y, secs, steps,
            "drag"
        );
        enigo.move_mouse(start_x, start_y, Coordinate::Abs)?;
        enigo.button(btn, Direction::Press)?;
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            let x = f64::from(start_x) + f64::from(end_x - start_x) * t;
            let y = f64::from(start_y) + f64::from(end_y - start_y) * t;
            enigo.move_mouse(x.round() as i32, y.round() as i32, Coordinate::Abs)?;
            thread::sleep(step_pause);
        }
        enigo.button(btn, Direction::Release)?;
        self.settle();
        Ok(())
    }

    /// Sleep for a duration in seconds (blocking). Non-positive or non-finite
    /// values are a no-op.
    pub fn sleep_secs(&self, secs: f64) -> Result<()> {
        if !secs.is_finite() || secs <= 0.0 {
            return Ok(());
        }
        if self.config.dry_run {
            info!(target: "playbot::executor", secs, "DRY-RUN sleep_secs");
            return Ok(());
        }
        trace!(target: "playbot::executor", secs, "sleep_secs");
        thread::sleep(Duration::from_secs_f64(secs));
        Ok(())
    }

    /// Settle pause after a simulated input.
    fn settle(&self) {
        if self.config.pause_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.pause_ms));
        }
    }

    /// Abort when the pointer sits in the top-left screen corner.
    fn guard_failsafe(&mut self) -> Result<()> {
        if !self.config.failsafe {
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        if let Ok((x, y)) = enigo.location() {
            if x <= 0 && y <= 0 {
                bail!("fail-safe triggered: pointer parked in the top-left screen corner");
            }
        }
        Ok(())
    }

    fn ensure_enigo(&mut self) -> Result<&mut Enigo> {
        if self.enigo.is_none() {
            trace!(target: "playbot::executor", "Initializing Enigo");
            self.enigo =
                Some(Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?);
        }
        Ok(self.enigo.as_mut().expect("Enigo must be initialized"))
    }
}

fn map_mouse_button(btn: CMouseButton) -> EButton {
    match btn {
        CMouseButton::Left => EButton::Left,
        CMouseButton::Middle => EButton::Middle,
        CMouseButton::Right => EButton::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_executor() -> ActionExecutor {
        ActionExecutor::new(ExecutorConfig {
            dry_run: true,
            pause_ms: 0,
            failsafe: false,
        })
    }

    #[test]
    fn test_dry_run_primitives_do_not_touch_the_os() {
        let mut ex = dry_executor();
        ex.type_text("Hello<enter>").unwrap();
        ex.click_at(100, 200, CMouseButton::Left).unwrap();
        ex.press_key("enter").unwrap();
        ex.hotkey(&["ctrl".into(), "c".into()]).unwrap();
        ex.scroll_at(10, 20, -3).unwrap();
        ex.drag(0, 0, 50, 50, 0.2, CMouseButton::Left).unwrap();
        ex.sleep_secs(10.0).unwrap();
        assert!(ex.enigo.is_none());
    }

    #[test]
    fn test_unknown_key_names_fail_even_in_dry_run() {
        let mut ex = dry_executor();
        assert!(ex.press_key("hyperdrive").is_err());
        assert!(ex.hotkey(&["ctrl".into(), "hyperdrive".into()]).is_err());
    }

    #[test]
    fn test_empty_hotkey_fails() {
        let mut ex = dry_executor();
        assert!(ex.hotkey(&[]).is_err());
    }

    #[test]
    fn test_bad_drag_duration_fails() {
        let mut ex = dry_executor();
        assert!(ex.drag(0, 0, 1, 1, 0.0, CMouseButton::Left).is_err());
        assert!(ex.drag(0, 0, 1, 1, f64::NAN, CMouseButton::Left).is_err());
    }

    #[test]
    fn test_sleep_ignores_bad_durations() {
        let ex = dry_executor();
        ex.sleep_secs(-1.0).unwrap();
        ex.sleep_secs(f64::NAN).unwrap();
    }

    #[test]
    fn test_dry_run_toggle() {
        let mut ex = dry_executor();
        assert!(ex.is_dry_run());
        ex.set_dry_run(false);
        assert!(!ex.is_dry_run());
    }
}

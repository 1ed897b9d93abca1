use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::utils::keys;

/// Sentinel for `ActionSequence::loop_count`: repeat until cancelled.
pub const LOOP_FOREVER: u32 = 0;

/// One automation step.
///
/// An action is a tagged variant (`kind`, serialized flat under the `"type"`
/// discriminator) plus fields shared by every variant: a pre-delay applied
/// before execution, an optional identifier, a display name, an enabled flag,
/// and a creation timestamp.
///
/// Serialized form is a single flat JSON mapping, e.g.:
/// `{ "type": "click", "x": 100, "y": 200, "button": "left", "delay": 0.0, ... }`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Action {
    /// Variant-specific parameters, tagged by `"type"`.
    #[serde(flatten)]
    pub kind: ActionKind,

    /// Seconds to wait before executing this action.
    #[serde(default)]
    pub delay: f64,

    /// Optional identifier assigned by the owning layer.
    #[serde(default)]
    pub id: Option<String>,

    /// Human-readable name; defaults per variant when constructed.
    #[serde(default)]
    pub name: String,

    /// Disabled actions are skipped during playback and count as successful.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Creation time as seconds since the Unix epoch.
    #[serde(default = "now_epoch_secs")]
    pub created_at: f64,
}

/// Variant-specific parameters for an [`Action`].
///
/// Use `type` to select a variant:
/// - "type_text": type literal text, with `<enter>`-style key tokens
/// - "click": click a mouse button at absolute screen coordinates
/// - "delay": wait for a fixed number of seconds
/// - "hotkey": press a key combination (all down in order, released in reverse)
/// - "special_key": press a single named key
/// - "scroll": scroll the wheel at a screen position
/// - "drag": drag the pointer from one position to another over a duration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Type literal text. Tokens like `<enter>` or `<tab>` embedded in the
    /// text are pressed as keys (see `utils::keys::parse_text_segments`).
    TypeText {
        #[serde(default)]
        text: String,
    },

    /// Click a mouse button at absolute screen coordinates.
    Click {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
    },

    /// Wait for a fixed number of seconds.
    Delay {
        #[serde(default = "default_wait_secs")]
        wait_secs: f64,
    },

    /// Press a key combination, e.g. `["ctrl", "c"]`.
    Hotkey {
        #[serde(default)]
        keys: Vec<String>,
    },

    /// Press a single named key, e.g. "enter" or "f5".
    SpecialKey { key: String },

    /// Scroll the mouse wheel at a screen position.
    Scroll {
        x: i32,
        y: i32,
        #[serde(default = "default_scroll_clicks")]
        clicks: u32,
        #[serde(default)]
        direction: ScrollDirection,
    },

    /// Drag the pointer from start to end over a duration, holding a button.
    Drag {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        #[serde(default = "default_drag_secs")]
        duration_secs: f64,
        #[serde(default)]
        button: MouseButton,
    },
}

/// Mouse button enumeration.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Scroll wheel direction.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    #[default]
    Up,
    Down,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Middle => write!(f, "middle"),
            Self::Right => write!(f, "right"),
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl ActionKind {
    /// The serialized discriminator for this variant.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::TypeText { .. } => "type_text",
            Self::Click { .. } => "click",
            Self::Delay { .. } => "delay",
            Self::Hotkey { .. } => "hotkey",
            Self::SpecialKey { .. } => "special_key",
            Self::Scroll { .. } => "scroll",
            Self::Drag { .. } => "drag",
        }
    }

    /// Default display name for an action of this variant.
    pub fn default_name(&self) -> String {
        match self {
            Self::TypeText { .. } => "Type Text".into(),
            Self::Click { button, .. } => format!("{} Click", capitalize(&button.to_string())),
            Self::Delay { .. } => "Delay".into(),
            Self::Hotkey { .. } => "Hotkey".into(),
            Self::SpecialKey { .. } => "Special Key".into(),
            Self::Scroll { direction, .. } => {
                format!("Scroll {}", capitalize(&direction.to_string()))
            }
            Self::Drag { button, .. } => format!("Drag {}", capitalize(&button.to_string())),
        }
    }

    /// Check variant parameters, returning one human-readable string per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            Self::TypeText { .. } => {}
            Self::Click { x, y, .. } => {
                if *x < 0 || *y < 0 {
                    errors.push(format!("coordinates ({x}, {y}) must not be negative"));
                }
            }
            Self::Delay { wait_secs } => {
                if !wait_secs.is_finite() || *wait_secs < 0.0 {
                    errors.push(format!("wait of {wait_secs} seconds is not a non-negative number"));
                }
            }
            Self::Hotkey { keys } => {
                if keys.is_empty() {
                    errors.push("hotkey needs at least one key".into());
                }
                for key in keys {
                    if keys::lookup_key(key).is_none() {
                        errors.push(format!("unknown key '{key}' in hotkey"));
                    }
                }
            }
            Self::SpecialKey { key } => {
                if key.trim().is_empty() {
                    errors.push("key name is empty".into());
                } else if keys::lookup_key(key).is_none() {
                    errors.push(format!("unknown key '{key}'"));
                }
            }
            Self::Scroll { x, y, clicks, .. } => {
                if *x < 0 || *y < 0 {
                    errors.push(format!("coordinates ({x}, {y}) must not be negative"));
                }
                if *clicks == 0 {
                    errors.push("scroll needs at least one click".into());
                }
            }
            Self::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
                duration_secs,
                ..
            } => {
                if *start_x < 0 || *start_y < 0 || *end_x < 0 || *end_y < 0 {
                    errors.push(format!(
                        "coordinates ({start_x}, {start_y}) -> ({end_x}, {end_y}) must not be negative"
                    ));
                }
                if !duration_secs.is_finite() || *duration_secs <= 0.0 {
                    errors.push(format!(
                        "drag duration of {duration_secs} seconds is not a positive number"
                    ));
                }
            }
        }
        errors
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeText { text } => write!(f, "Type: {}", truncate(text, 50)),
            Self::Click { x, y, button } => write!(f, "Click {button} at ({x}, {y})"),
            Self::Delay { wait_secs } => write!(f, "Wait for {wait_secs} seconds"),
            Self::Hotkey { keys } => write!(f, "Press {}", keys.join("+")),
            Self::SpecialKey { key } => write!(f, "Press {key} key"),
            Self::Scroll {
                x,
                y,
                clicks,
                direction,
            } => write!(f, "Scroll {direction} {clicks} clicks at ({x}, {y})"),
            Self::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
                ..
            } => write!(f, "Drag from ({start_x}, {start_y}) to ({end_x}, {end_y})"),
        }
    }
}

impl Action {
    /// Create an enabled action with the variant's default name and no pre-delay.
    pub fn new(kind: ActionKind) -> Self {
        let name = kind.default_name();
        Self {
            kind,
            delay: 0.0,
            id: None,
            name,
            enabled: true,
            created_at: now_epoch_secs(),
        }
    }

    /// Set the pre-delay in seconds.
    #[must_use]
    pub fn with_delay(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the action, returning one human-readable string per problem.
    /// Shared fields are checked here; variant parameters in [`ActionKind::validate`].
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.kind.validate();
        if !self.delay.is_finite() || self.delay < 0.0 {
            errors.push(format!(
                "pre-delay of {} seconds is not a non-negative number",
                self.delay
            ));
        }
        errors
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delay > 0.0 {
            write!(f, "{} (delay: {}s)", self.kind, self.delay)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Ordered, loopable collection of actions with run configuration.
///
/// Actions play back in list order. The loop settings control how many full
/// passes the runner makes (`loop_count`, with [`LOOP_FOREVER`] meaning
/// "until cancelled"), how long to wait between passes, and whether a failing
/// action aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActionSequence {
    #[serde(default = "default_sequence_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Creation time as seconds since the Unix epoch.
    #[serde(default = "now_epoch_secs")]
    pub created_at: f64,

    /// Last mutation time as seconds since the Unix epoch.
    #[serde(default = "now_epoch_secs")]
    pub modified_at: f64,

    /// When false the sequence runs a single pass regardless of `loop_count`.
    #[serde(default)]
    pub loop_enabled: bool,

    /// Number of passes when looping; [`LOOP_FOREVER`] repeats until cancelled.
    #[serde(default = "default_loop_count")]
    pub loop_count: u32,

    /// Seconds to wait between passes.
    #[serde(default)]
    pub repeat_interval: f64,

    /// Abort the whole run when an action fails.
    #[serde(default = "default_true")]
    pub stop_on_error: bool,

    /// Playback order is list order.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl ActionSequence {
    /// Create an empty sequence with default run configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_epoch_secs();
        Self {
            name: name.into(),
            description: String::new(),
            created_at: now,
            modified_at: now,
            loop_enabled: false,
            loop_count: 1,
            repeat_interval: 0.0,
            stop_on_error: true,
            actions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append an action to the sequence.
    pub fn add_action(&mut self, action: Action) {
        tracing::debug!(target: "playbot::sequence", action = %action, "Adding action");
        self.actions.push(action);
        self.touch();
    }

    /// Remove and return the action at `index`, if present.
    pub fn remove_action(&mut self, index: usize) -> Option<Action> {
        if index < self.actions.len() {
            let removed = self.actions.remove(index);
            self.touch();
            tracing::debug!(target: "playbot::sequence", action = %removed, "Removed action");
            Some(removed)
        } else {
            None
        }
    }

    /// Move an action within the sequence. Returns false when either index is
    /// out of bounds.
    pub fn move_action(&mut self, from: usize, to: usize) -> bool {
        if from < self.actions.len() && to < self.actions.len() {
            let action = self.actions.remove(from);
            self.actions.insert(to, action);
            self.touch();
            true
        } else {
            false
        }
    }

    /// Remove all actions.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.touch();
    }

    /// Validate the sequence and every action, returning human-readable
    /// problem descriptions. An empty result means the sequence may run.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.actions.is_empty() {
            errors.push("sequence contains no actions".into());
        }
        if !self.repeat_interval.is_finite() || self.repeat_interval < 0.0 {
            errors.push(format!(
                "repeat interval of {} seconds is not a non-negative number",
                self.repeat_interval
            ));
        }

        for (i, action) in self.actions.iter().enumerate() {
            for problem in action.validate() {
                errors.push(format!("action {} ({}): {}", i + 1, action.kind, problem));
            }
        }

        errors
    }

    fn touch(&mut self) {
        self.modified_at = now_epoch_secs();
    }
}

impl Default for ActionSequence {
    fn default() -> Self {
        Self::new(default_sequence_name())
    }
}

/// Seconds since the Unix epoch, as used for `created_at`/`modified_at`.
pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn default_true() -> bool {
    true
}

fn default_wait_secs() -> f64 {
    1.0
}

fn default_scroll_clicks() -> u32 {
    3
}

fn default_drag_secs() -> f64 {
    1.0
}

fn default_sequence_name() -> String {
    "Untitled Sequence".into()
}

fn default_loop_count() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_preserves_fields() {
        let actions = vec![
            Action::new(ActionKind::TypeText {
                text: "Hello<enter>World".into(),
            })
            .with_delay(0.25),
            Action::new(ActionKind::Click {
                x: 100,
                y: 200,
                button: MouseButton::Right,
            }),
            Action::new(ActionKind::Hotkey {
                keys: vec!["ctrl".into(), "shift".into(), "t".into()],
            }),
            Action::new(ActionKind::Drag {
                start_x: 10,
                start_y: 20,
                end_x: 300,
                end_y: 400,
                duration_secs: 0.5,
                button: MouseButton::Left,
            }),
        ];

        for action in actions {
            let value = serde_json::to_value(&action).unwrap();
            let back: Action = serde_json::from_value(value).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn test_sequence_round_trip() {
        let mut seq = ActionSequence::new("demo");
        seq.loop_enabled = true;
        seq.loop_count = 5;
        seq.repeat_interval = 1.5;
        seq.stop_on_error = false;
        seq.add_action(Action::new(ActionKind::Delay { wait_secs: 0.5 }));
        seq.add_action(Action::new(ActionKind::SpecialKey { key: "enter".into() }));

        let text = serde_json::to_string(&seq).unwrap();
        let back: ActionSequence = serde_json::from_str(&text).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_unknown_variant_tag_fails() {
        let value = json!({ "type": "teleport", "x": 1, "y": 2 });
        assert!(serde_json::from_value::<Action>(value).is_err());
    }

    #[test]
    fn test_missing_tag_fails() {
        let value = json!({ "x": 1, "y": 2 });
        assert!(serde_json::from_value::<Action>(value).is_err());
    }

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let value = json!({ "type": "scroll", "x": 10, "y": 20 });
        let action: Action = serde_json::from_value(value).unwrap();
        assert!(action.enabled);
        assert_eq!(action.delay, 0.0);
        assert_eq!(
            action.kind,
            ActionKind::Scroll {
                x: 10,
                y: 20,
                clicks: 3,
                direction: ScrollDirection::Up,
            }
        );

        let value = json!({ "type": "delay" });
        let action: Action = serde_json::from_value(value).unwrap();
        assert_eq!(action.kind, ActionKind::Delay { wait_secs: 1.0 });
    }

    #[test]
    fn test_variant_validation() {
        let bad_click = ActionKind::Click {
            x: -5,
            y: 10,
            button: MouseButton::Left,
        };
        assert_eq!(bad_click.validate().len(), 1);

        let bad_hotkey = ActionKind::Hotkey { keys: vec![] };
        assert!(!bad_hotkey.validate().is_empty());

        let unknown_key = ActionKind::Hotkey {
            keys: vec!["ctrl".into(), "hyperdrive".into()],
        };
        assert_eq!(unknown_key.validate().len(), 1);

        let bad_drag = ActionKind::Drag {
            start_x: 0,
            start_y: 0,
            end_x: 10,
            end_y: 10,
            duration_secs: 0.0,
            button: MouseButton::Left,
        };
        assert_eq!(bad_drag.validate().len(), 1);

        let bad_scroll = ActionKind::Scroll {
            x: 0,
            y: 0,
            clicks: 0,
            direction: ScrollDirection::Down,
        };
        assert_eq!(bad_scroll.validate().len(), 1);

        let ok = ActionKind::SpecialKey { key: "f5".into() };
        assert!(ok.validate().is_empty());
    }

    #[test]
    fn test_negative_pre_delay_is_invalid() {
        let action = Action::new(ActionKind::TypeText { text: "x".into() }).with_delay(-1.0);
        assert_eq!(action.validate().len(), 1);
    }

    #[test]
    fn test_sequence_validation_reports_positions() {
        let mut seq = ActionSequence::new("bad");
        seq.add_action(Action::new(ActionKind::SpecialKey { key: "enter".into() }));
        seq.add_action(Action::new(ActionKind::Click {
            x: -1,
            y: -1,
            button: MouseButton::Left,
        }));

        let errors = seq.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("action 2"), "got: {}", errors[0]);

        let empty = ActionSequence::new("empty");
        assert_eq!(empty.validate(), vec!["sequence contains no actions"]);
    }

    #[test]
    fn test_list_mutation() {
        let mut seq = ActionSequence::new("edit");
        seq.add_action(Action::new(ActionKind::SpecialKey { key: "a".into() }));
        seq.add_action(Action::new(ActionKind::SpecialKey { key: "b".into() }));
        seq.add_action(Action::new(ActionKind::SpecialKey { key: "c".into() }));

        assert!(seq.move_action(2, 0));
        assert_eq!(seq.actions[0].kind, ActionKind::SpecialKey { key: "c".into() });
        assert!(!seq.move_action(0, 3));

        let removed = seq.remove_action(1).unwrap();
        assert_eq!(removed.kind, ActionKind::SpecialKey { key: "a".into() });
        assert!(seq.remove_action(5).is_none());
        assert_eq!(seq.len(), 2);

        seq.clear();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_default_names_and_descriptions() {
        let click = Action::new(ActionKind::Click {
            x: 100,
            y: 200,
            button: MouseButton::Left,
        });
        assert_eq!(click.name, "Left Click");
        assert_eq!(click.to_string(), "Click left at (100, 200)");

        let scroll = ActionKind::Scroll {
            x: 10,
            y: 20,
            clicks: 3,
            direction: ScrollDirection::Down,
        };
        assert_eq!(scroll.default_name(), "Scroll Down");
        assert_eq!(scroll.to_string(), "Scroll down 3 clicks at (10, 20)");

        let typed = Action::new(ActionKind::TypeText {
            text: "x".repeat(60),
        })
        .with_delay(0.5);
        let shown = typed.to_string();
        assert!(shown.contains("..."));
        assert!(shown.ends_with("(delay: 0.5s)"));
    }

    #[test]
    fn test_variant_names_match_serialized_tags() {
        let kind = ActionKind::SpecialKey { key: "enter".into() };
        let value = serde_json::to_value(Action::new(kind.clone())).unwrap();
        assert_eq!(value["type"], kind.variant_name());
    }
}

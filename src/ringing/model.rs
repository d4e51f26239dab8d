use std::fmt;

use chrono::{DateTime, Local};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolId(String);

impl ToolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ToolId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ToolId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Alarm,
    Timer,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Alarm => "alarm",
            ToolKind::Timer => "timer",
        }
    }

    pub fn icon(self) -> &'static str {
        self.as_str()
    }

    pub fn secondary_action(self) -> RingingAction {
        match self {
            ToolKind::Alarm => RingingAction::Snooze,
            ToolKind::Timer => RingingAction::Restart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerType {
    Countdown,
    CountToDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolDetails {
    Alarm { hour: u32, minute: u32 },
    Timer { timer_type: TimerType, duration_ms: u64 },
}

impl ToolDetails {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolDetails::Alarm { .. } => ToolKind::Alarm,
            ToolDetails::Timer { .. } => ToolKind::Timer,
        }
    }
}

/// What an alarm or timer manager reports when one of its tools fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingRequest {
    pub tool_id: ToolId,
    pub title: String,
    pub sound: String,
    pub details: ToolDetails,
}

impl RingRequest {
    pub fn alarm(
        tool_id: impl Into<ToolId>,
        title: impl Into<String>,
        sound: impl Into<String>,
        hour: u32,
        minute: u32,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            title: title.into(),
            sound: sound.into(),
            details: ToolDetails::Alarm { hour, minute },
        }
    }

    pub fn timer(
        tool_id: impl Into<ToolId>,
        title: impl Into<String>,
        sound: impl Into<String>,
        timer_type: TimerType,
        duration_ms: u64,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            title: title.into(),
            sound: sound.into(),
            details: ToolDetails::Timer {
                timer_type,
                duration_ms,
            },
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingingAction {
    Dismiss,
    Snooze,
    Restart,
}

impl RingingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RingingAction::Dismiss => "dismiss",
            RingingAction::Snooze => "snooze",
            RingingAction::Restart => "restart",
        }
    }
}

pub type ActionCallback = Box<dyn FnOnce(&ToolId)>;

/// Manager-supplied behaviour for the three ringing actions. Whichever one
/// is taken is consumed; the others are dropped with the entry.
#[derive(Default)]
pub struct RingingActions {
    on_dismiss: Option<ActionCallback>,
    on_snooze: Option<ActionCallback>,
    on_restart: Option<ActionCallback>,
}

impl RingingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_dismiss(mut self, callback: impl FnOnce(&ToolId) + 'static) -> Self {
        self.on_dismiss = Some(Box::new(callback));
        self
    }

    pub fn on_snooze(mut self, callback: impl FnOnce(&ToolId) + 'static) -> Self {
        self.on_snooze = Some(Box::new(callback));
        self
    }

    pub fn on_restart(mut self, callback: impl FnOnce(&ToolId) + 'static) -> Self {
        self.on_restart = Some(Box::new(callback));
        self
    }

    /// Runs the callback bound to `action`. Returns false when the manager
    /// supplied none for it.
    pub fn invoke(self, action: RingingAction, tool_id: &ToolId) -> bool {
        let callback = match action {
            RingingAction::Dismiss => self.on_dismiss,
            RingingAction::Snooze => self.on_snooze,
            RingingAction::Restart => self.on_restart,
        };
        match callback {
            Some(callback) => {
                callback(tool_id);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for RingingActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingingActions")
            .field("on_dismiss", &self.on_dismiss.is_some())
            .field("on_snooze", &self.on_snooze.is_some())
            .field("on_restart", &self.on_restart.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct RingingEntry {
    pub tool_id: ToolId,
    pub title: String,
    pub sound: String,
    pub rang_at: DateTime<Local>,
    pub details: ToolDetails,
    pub(crate) actions: RingingActions,
}

impl RingingEntry {
    pub fn new(request: RingRequest, actions: RingingActions, rang_at: DateTime<Local>) -> Self {
        Self {
            tool_id: request.tool_id,
            title: request.title,
            sound: request.sound,
            rang_at,
            details: request.details,
            actions,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.details.kind()
    }
}

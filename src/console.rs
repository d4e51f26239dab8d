//! Text-mode collaborators used when replaying a scenario from the CLI.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Local};

use crate::ringing::coordinator::ModuleEvent;
use crate::ringing::model::{TimerType, ToolId};
use crate::ringing::view::{OverlayView, RestoreButton};
use crate::services::{
    AlarmManager, AudioService, ModuleHost, OverlaySurface, TimerManager, TitleSink,
};
use crate::time_provider::{ManualTimeProvider, TimeProvider};

/// Timestamped lines, relative to the replay start.
#[derive(Debug, Clone)]
pub struct Transcript {
    clock: ManualTimeProvider,
    start: DateTime<Local>,
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    pub fn new(clock: ManualTimeProvider, start: DateTime<Local>) -> Self {
        Self {
            clock,
            start,
            lines: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn record(&self, message: impl AsRef<str>) {
        let elapsed_ms = (self.clock.now() - self.start).num_milliseconds();
        self.lines
            .borrow_mut()
            .push(format!("[{elapsed_ms:>7}ms] {}", message.as_ref()));
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

pub struct ConsoleAudio {
    transcript: Transcript,
    playing: BTreeSet<ToolId>,
}

impl ConsoleAudio {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            playing: BTreeSet::new(),
        }
    }
}

impl AudioService for ConsoleAudio {
    fn play_sound(&mut self, sound: &str, channel: &ToolId) {
        self.playing.insert(channel.clone());
        self.transcript
            .record(format!("sound: play '{sound}' on {channel}"));
    }

    fn stop_sound(&mut self, channel: &ToolId) {
        if self.playing.remove(channel) {
            self.transcript.record(format!("sound: stop {channel}"));
        }
    }
}

pub struct ConsoleTitle(pub Transcript);

impl TitleSink for ConsoleTitle {
    fn set_title(&mut self, title: &str) {
        self.0.record(format!("title: {title}"));
    }
}

/// Draws only when the visible structure changes; time-since refreshes are
/// not echoed.
pub struct ConsoleSurface {
    transcript: Transcript,
    last_view: Option<String>,
    last_restore: Option<RestoreButton>,
}

impl ConsoleSurface {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            last_view: None,
            last_restore: None,
        }
    }
}

impl OverlaySurface for ConsoleSurface {
    fn present(&mut self, view: &OverlayView) {
        let summary = summarize_view(view);
        if self.last_view.as_deref() != Some(summary.as_str()) {
            self.transcript.record(format!("overlay: {summary}"));
            self.last_view = Some(summary);
        }
    }

    fn present_restore_button(&mut self, state: RestoreButton) {
        if self.last_restore == Some(state) {
            return;
        }
        let label = if state.ringing { "ringing" } else { "idle" };
        self.transcript.record(format!("restore button: {label}"));
        self.last_restore = Some(state);
    }
}

pub fn summarize_view(view: &OverlayView) -> String {
    match view {
        OverlayView::Hidden => "hidden".to_string(),
        OverlayView::Detail(detail) => {
            let counter = detail
                .header
                .list_toggle
                .as_ref()
                .map(|toggle| format!(" <{}>", toggle.label))
                .unwrap_or_default();
            let actions = detail
                .actions
                .iter()
                .map(|button| button.label.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            format!(
                "detail {} \"{}\" ({}){counter} [{actions}]",
                detail.tool_id, detail.title, detail.header.title
            )
        }
        OverlayView::List(list) => {
            let sections = list
                .sections
                .iter()
                .map(|section| {
                    let ids = section
                        .items
                        .iter()
                        .map(|item| item.tool_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}: {ids}", section.heading)
                })
                .collect::<Vec<_>>()
                .join("; ");
            format!("list {sections}")
        }
    }
}

/// Module host that applies activation changes immediately and queues the
/// matching events for the driver to deliver afterwards.
#[derive(Debug, Clone)]
pub struct ConsoleModules {
    inner: Rc<RefCell<ModuleState>>,
    container: String,
}

#[derive(Debug, Default)]
struct ModuleState {
    active: BTreeSet<String>,
    pending: VecDeque<ModuleEvent>,
}

impl ConsoleModules {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ModuleState::default())),
            container: container.into(),
        }
    }

    pub fn next_event(&self) -> Option<ModuleEvent> {
        self.inner.borrow_mut().pending.pop_front()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.inner.borrow().active.contains(name)
    }
}

impl ModuleHost for ConsoleModules {
    fn activate_module(&mut self, name: &str) {
        let mut state = self.inner.borrow_mut();
        if state.active.insert(name.to_string()) {
            state
                .pending
                .push_back(ModuleEvent::Activated(name.to_string()));
        }
    }

    fn deactivate_module(&mut self, name: &str) {
        let mut state = self.inner.borrow_mut();
        // Closing the container closes every overlay inside it.
        let was_active = if name == self.container {
            let any = !state.active.is_empty();
            state.active.clear();
            any
        } else {
            state.active.remove(name)
        };
        if was_active {
            state
                .pending
                .push_back(ModuleEvent::Deactivated(name.to_string()));
        }
    }

    fn toggle_module(&mut self, name: &str) {
        if self.is_active(name) {
            self.deactivate_module(name);
        } else {
            self.activate_module(name);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter;

impl AlarmManager for ConsoleFormatter {
    fn format_time_for_title(&self, hour: u32, minute: u32) -> String {
        format!("{hour:02}:{minute:02}")
    }
}

impl TimerManager for ConsoleFormatter {
    fn format_time(&self, remaining_ms: u64, _timer_type: TimerType) -> String {
        let total = remaining_ms / 1_000;
        format!(
            "{:02}:{:02}:{:02}",
            total / 3_600,
            (total % 3_600) / 60,
            total % 60
        )
    }
}

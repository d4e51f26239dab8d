use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};
use serde::Deserialize;

use crate::config::RingingConfig;
use crate::console::{
    ConsoleAudio, ConsoleFormatter, ConsoleModules, ConsoleSurface, ConsoleTitle, Transcript,
};
use crate::ringing::coordinator::{RingingCoordinator, UiCommand};
use crate::ringing::model::{RingRequest, RingingAction, RingingActions, TimerType, ToolId};
use crate::services::Services;
use crate::time_provider::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
use crate::title::{Section, SectionTitleManager};

/// Longest timeline a scenario may describe: thirty days.
pub const MAX_TIMELINE_MS: u64 = 30 * 86_400_000;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub start: DateTime<Local>,
    pub run_until_ms: u64,
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone)]
pub struct ScenarioEvent {
    pub at_ms: u64,
    pub step: ScenarioStep,
}

#[derive(Debug, Clone)]
pub enum ScenarioStep {
    Fire(RingRequest),
    Command(UiCommand),
    Hide(ToolId),
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub lines: Vec<String>,
    pub ticks: usize,
    pub ringing_at_end: usize,
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read scenario file {}", path.display()))?;
    parse_scenario_text(&content)
}

pub fn parse_scenario_text(content: &str) -> Result<Scenario> {
    let raw = serde_json::from_str::<ScenarioFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported scenario version {}; expected version 1",
            raw.version
        );
    }

    let start = match raw.start.as_deref() {
        Some(text) => parse_start(text)?,
        None => SystemTimeProvider.now(),
    };

    let mut events = Vec::with_capacity(raw.events.len());
    for event in raw.events {
        if event.at_ms > MAX_TIMELINE_MS {
            bail!(
                "event at {}ms is beyond the {MAX_TIMELINE_MS}ms timeline limit",
                event.at_ms
            );
        }
        events.push(ScenarioEvent {
            at_ms: event.at_ms,
            step: event.step.into_step()?,
        });
    }
    events.sort_by_key(|event| event.at_ms);

    let last_event_ms = events.last().map(|event| event.at_ms).unwrap_or(0);
    let run_until_ms = raw.run_until_ms.unwrap_or(last_event_ms);
    if run_until_ms < last_event_ms {
        bail!("run_until_ms ({run_until_ms}) ends before the last event at {last_event_ms}ms");
    }
    if run_until_ms > MAX_TIMELINE_MS {
        bail!("run_until_ms ({run_until_ms}) is beyond the {MAX_TIMELINE_MS}ms timeline limit");
    }

    Ok(Scenario {
        start,
        run_until_ms,
        events,
    })
}

/// Replays the timeline on a manual clock. Scheduled tasks fire at their
/// exact due instants between events.
pub fn replay(scenario: &Scenario, config: &RingingConfig, section: Section) -> ReplayOutcome {
    let clock = ManualTimeProvider::new(scenario.start);
    let transcript = Transcript::new(clock.clone(), scenario.start);
    let modules = ConsoleModules::new(config.container_module.clone());

    let services = Services {
        audio: Box::new(ConsoleAudio::new(transcript.clone())),
        translator: Box::new(config.translations.clone()),
        modules: Box::new(modules.clone()),
        title: Box::new(ConsoleTitle(transcript.clone())),
        sections: Some(Box::new(SectionTitleManager::new(
            config.app_name.clone(),
            section,
        ))),
        alarms: Some(Box::new(ConsoleFormatter)),
        timers: Some(Box::new(ConsoleFormatter)),
        surface: Some(Box::new(ConsoleSurface::new(transcript.clone()))),
    };
    let mut coordinator = RingingCoordinator::new(config, services, Box::new(clock.clone()));
    let mut ticks = 0;

    for event in &scenario.events {
        let at = offset(scenario.start, event.at_ms);
        ticks += advance_to(&mut coordinator, &clock, at);
        apply_step(&mut coordinator, &transcript, &event.step);
        deliver_module_events(&mut coordinator, &modules);
    }
    ticks += advance_to(
        &mut coordinator,
        &clock,
        offset(scenario.start, scenario.run_until_ms),
    );

    ReplayOutcome {
        lines: transcript.lines(),
        ticks,
        ringing_at_end: coordinator.ringing_count(),
    }
}

fn advance_to(
    coordinator: &mut RingingCoordinator,
    clock: &ManualTimeProvider,
    target: DateTime<Local>,
) -> usize {
    let mut fired = 0;
    while let Some(due) = coordinator.next_due()
        && due <= target
    {
        clock.set(due.max(clock.now()));
        fired += coordinator.tick();
    }
    clock.set(target);
    fired
}

fn apply_step(coordinator: &mut RingingCoordinator, transcript: &Transcript, step: &ScenarioStep) {
    match step {
        ScenarioStep::Fire(request) => {
            transcript.record(format!(
                "fire: {} {} \"{}\"",
                request.kind().as_str(),
                request.tool_id,
                request.title
            ));
            let actions = manager_actions(transcript);
            if !coordinator.show_ringing_screen(request.clone(), actions) {
                transcript.record(format!("fire: {} already ringing", request.tool_id));
            }
        }
        ScenarioStep::Command(command) => {
            if !coordinator.handle(command.clone()) {
                transcript.record(format!("ignored: {command:?}"));
            }
        }
        ScenarioStep::Hide(tool_id) => {
            if !coordinator.hide_ringing_screen(tool_id) {
                transcript.record(format!("ignored: hide {tool_id}"));
            }
        }
    }
}

fn manager_actions(transcript: &Transcript) -> RingingActions {
    let dismissed = transcript.clone();
    let snoozed = transcript.clone();
    let restarted = transcript.clone();
    RingingActions::new()
        .on_dismiss(move |id| dismissed.record(format!("manager: dismissed {id}")))
        .on_snooze(move |id| snoozed.record(format!("manager: snoozed {id}")))
        .on_restart(move |id| restarted.record(format!("manager: restarted {id}")))
}

fn deliver_module_events(coordinator: &mut RingingCoordinator, modules: &ConsoleModules) {
    while let Some(event) = modules.next_event() {
        coordinator.on_module_event(event);
    }
}

/// `start` moved forward by `ms`, capped at the timeline limit. Hand-built
/// scenarios that skip parsing stay on the calendar this way.
fn offset(start: DateTime<Local>, ms: u64) -> DateTime<Local> {
    let capped = i64::try_from(ms.min(MAX_TIMELINE_MS)).unwrap_or(i64::MAX);
    start
        .checked_add_signed(chrono::Duration::milliseconds(capped))
        .unwrap_or(start)
}

fn parse_start(input: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("invalid start '{input}', expected ISO local datetime"))?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, _second) => Ok(first),
        LocalResult::None => Err(anyhow!("start '{input}' does not exist in the local timezone")),
    }
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    run_until_ms: Option<u64>,
    events: Vec<EventFile>,
}

#[derive(Debug, Deserialize)]
struct EventFile {
    at_ms: u64,
    #[serde(flatten)]
    step: StepFile,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum StepFile {
    FireAlarm {
        tool_id: String,
        title: String,
        sound: String,
        hour: u32,
        minute: u32,
    },
    FireTimer {
        tool_id: String,
        title: String,
        sound: String,
        #[serde(default = "default_timer_type")]
        timer_type: TimerType,
        #[serde(default)]
        duration_ms: u64,
    },
    Dismiss {
        tool_id: String,
    },
    Snooze {
        tool_id: String,
    },
    Restart {
        tool_id: String,
    },
    Hide {
        tool_id: String,
    },
    Select {
        tool_id: String,
    },
    ShowList,
    Back,
    Restore,
    CloseOverlay,
}

impl StepFile {
    fn into_step(self) -> Result<ScenarioStep> {
        let step = match self {
            StepFile::FireAlarm {
                tool_id,
                title,
                sound,
                hour,
                minute,
            } => {
                if hour > 23 || minute > 59 {
                    bail!("alarm '{tool_id}' has invalid time {hour:02}:{minute:02}");
                }
                ScenarioStep::Fire(RingRequest::alarm(
                    require_id(tool_id)?,
                    title,
                    sound,
                    hour,
                    minute,
                ))
            }
            StepFile::FireTimer {
                tool_id,
                title,
                sound,
                timer_type,
                duration_ms,
            } => ScenarioStep::Fire(RingRequest::timer(
                require_id(tool_id)?,
                title,
                sound,
                timer_type,
                duration_ms,
            )),
            StepFile::Dismiss { tool_id } => action(tool_id, RingingAction::Dismiss)?,
            StepFile::Snooze { tool_id } => action(tool_id, RingingAction::Snooze)?,
            StepFile::Restart { tool_id } => action(tool_id, RingingAction::Restart)?,
            StepFile::Hide { tool_id } => ScenarioStep::Hide(require_id(tool_id)?),
            StepFile::Select { tool_id } => {
                ScenarioStep::Command(UiCommand::Select(require_id(tool_id)?))
            }
            StepFile::ShowList => ScenarioStep::Command(UiCommand::ShowList),
            StepFile::Back => ScenarioStep::Command(UiCommand::BackToDetail),
            StepFile::Restore => ScenarioStep::Command(UiCommand::RestoreClicked),
            StepFile::CloseOverlay => ScenarioStep::Command(UiCommand::CloseOverlay),
        };
        Ok(step)
    }
}

fn action(tool_id: String, action: RingingAction) -> Result<ScenarioStep> {
    Ok(ScenarioStep::Command(UiCommand::Action(
        require_id(tool_id)?,
        action,
    )))
}

fn require_id(tool_id: String) -> Result<ToolId> {
    if tool_id.trim().is_empty() {
        bail!("tool_id must not be empty");
    }
    Ok(ToolId::from(tool_id))
}

fn default_timer_type() -> TimerType {
    TimerType::Countdown
}

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::RingingConfig;
use crate::error::RingingError;
use crate::ringing::model::{
    RingRequest, RingingAction, RingingActions, RingingEntry, ToolDetails, ToolId,
};
use crate::ringing::registry::RingingRegistry;
use crate::ringing::view::{OverlayView, RestoreButton, build_detail, build_list};
use crate::services::Services;
use crate::tasks::{ScheduledTasks, TaskKey};
use crate::time_provider::TimeProvider;
use crate::time_since::format_time_since;
use crate::title::{TitleBlink, format_title};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    Activated(String),
    Deactivated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    ShowList,
    BackToDetail,
    Select(ToolId),
    Action(ToolId, RingingAction),
    RestoreClicked,
    CloseOverlay,
}

/// Shared read-only view of how many tools are ringing, for subsystems that
/// need to branch on it without holding the coordinator.
#[derive(Debug, Clone, Default)]
pub struct RingingFlag(Rc<Cell<usize>>);

impl RingingFlag {
    pub fn is_any_ringing(&self) -> bool {
        self.0.get() > 0
    }

    pub fn ringing_count(&self) -> usize {
        self.0.get()
    }

    fn set(&self, count: usize) {
        self.0.set(count);
    }
}

pub struct RingingCoordinator {
    services: Services,
    clock: Box<dyn TimeProvider>,
    app_name: String,
    overlay_module: String,
    container_module: String,
    blink_interval: chrono::Duration,
    time_since_interval: chrono::Duration,
    registry: RingingRegistry,
    tasks: ScheduledTasks,
    blink: Option<TitleBlink>,
    view: OverlayView,
    overlay_active: bool,
    audible: Option<ToolId>,
    restore: RestoreButton,
    flag: RingingFlag,
}

impl RingingCoordinator {
    pub fn new(config: &RingingConfig, services: Services, clock: Box<dyn TimeProvider>) -> Self {
        Self {
            services,
            clock,
            app_name: config.app_name.clone(),
            overlay_module: config.overlay_module.clone(),
            container_module: config.container_module.clone(),
            blink_interval: config.blink_interval(),
            time_since_interval: config.time_since_interval(),
            registry: RingingRegistry::new(),
            tasks: ScheduledTasks::new(),
            blink: None,
            view: OverlayView::Hidden,
            overlay_active: false,
            audible: None,
            restore: RestoreButton::default(),
            flag: RingingFlag::default(),
        }
    }

    /// Entry point for a manager whose tool just fired. Returns false when
    /// the tool was already ringing; the existing entry is left untouched.
    pub fn show_ringing_screen(&mut self, request: RingRequest, actions: RingingActions) -> bool {
        let tool_id = request.tool_id.clone();
        if self.registry.contains(&tool_id) {
            debug!(tool_id = %tool_id, "tool already ringing, repeat fire ignored");
            return false;
        }

        self.services.modules.exit_fullscreen();
        self.tasks.cancel_time_since();
        self.silence_all_except(Some(&tool_id));

        let kind = request.kind();
        let entry = RingingEntry::new(request, actions, self.clock.now());
        if self.registry.insert(entry).is_err() {
            return false;
        }
        self.sync_flag();
        info!(
            tool_id = %tool_id,
            kind = kind.as_str(),
            ringing = self.registry.len(),
            "tool started ringing"
        );

        let overlay = self.overlay_module.clone();
        self.services.modules.activate_module(&overlay);
        self.overlay_active = true;
        self.show_latest();
        self.refresh_restore_button();
        self.refresh_blinking_title();
        true
    }

    /// Removes a ringing tool without running any of its callbacks.
    pub fn hide_ringing_screen(&mut self, tool_id: &ToolId) -> bool {
        if self.registry.remove(tool_id).is_none() {
            debug!(error = %RingingError::MissingEntry(tool_id.clone()), "hide skipped");
            return false;
        }
        info!(tool_id = %tool_id, "ringing tool hidden");
        self.after_removal(tool_id);
        true
    }

    /// Runs the manager's callback for `action`, then drops the entry.
    pub fn resolve_ringing(&mut self, tool_id: &ToolId, action: RingingAction) -> bool {
        let Some((kind, actions)) = self.registry.take_actions(tool_id) else {
            debug!(
                error = %RingingError::MissingEntry(tool_id.clone()),
                action = action.as_str(),
                "action skipped"
            );
            return false;
        };

        if !actions.invoke(action, tool_id) {
            debug!(tool_id = %tool_id, action = action.as_str(), "no callback bound for action");
        }
        self.registry.remove(tool_id);
        info!(
            tool_id = %tool_id,
            kind = kind.as_str(),
            action = action.as_str(),
            "ringing tool resolved"
        );
        self.after_removal(tool_id);
        true
    }

    pub fn show_detail(&mut self, tool_id: &ToolId) -> bool {
        let now = self.clock.now();
        let Some(entry) = self.registry.get(tool_id) else {
            debug!(error = %RingingError::MissingEntry(tool_id.clone()), "detail view skipped");
            return false;
        };
        let detail = build_detail(
            entry,
            self.registry.len(),
            self.services.translator.as_ref(),
            now,
        );
        let sound = entry.sound.clone();

        self.silence_all_except(Some(tool_id));
        if self.audible.as_ref() != Some(tool_id) {
            self.services.audio.play_sound(&sound, tool_id);
            self.audible = Some(tool_id.clone());
        }

        self.tasks.cancel_time_since();
        if self.overlay_active {
            self.tasks.start(
                TaskKey::TimeSince(tool_id.clone()),
                self.time_since_interval,
                now,
            );
        }
        self.view = OverlayView::Detail(detail);
        self.present();
        true
    }

    pub fn show_list(&mut self) -> bool {
        let Some(list) = build_list(&self.registry, self.services.translator.as_ref()) else {
            let overlay = self.overlay_module.clone();
            self.close_overlay(&overlay);
            return false;
        };
        self.tasks.cancel_time_since();
        self.view = OverlayView::List(list);
        self.present();
        true
    }

    pub fn handle(&mut self, command: UiCommand) -> bool {
        match command {
            UiCommand::ShowList => self.show_list(),
            UiCommand::BackToDetail => self.show_latest(),
            UiCommand::Select(tool_id) => self.show_detail(&tool_id),
            UiCommand::Action(tool_id, action) => self.resolve_ringing(&tool_id, action),
            UiCommand::RestoreClicked => {
                if self.registry.is_empty() {
                    debug!("restore button is disabled while nothing rings");
                    return false;
                }
                let overlay = self.overlay_module.clone();
                self.services.modules.toggle_module(&overlay);
                true
            }
            UiCommand::CloseOverlay => {
                if !self.overlay_active {
                    return false;
                }
                let overlay = self.overlay_module.clone();
                self.services.modules.deactivate_module(&overlay);
                true
            }
        }
    }

    pub fn on_module_event(&mut self, event: ModuleEvent) {
        match event {
            ModuleEvent::Deactivated(name)
                if name == self.overlay_module || name == self.container_module =>
            {
                self.overlay_active = false;
                self.tasks.cancel_time_since();
                self.refresh_restore_button();
                self.present();
            }
            ModuleEvent::Activated(name) if name == self.overlay_module => {
                if self.registry.is_empty() {
                    self.close_overlay(&name);
                } else {
                    self.overlay_active = true;
                    self.show_latest();
                }
                self.refresh_restore_button();
            }
            _ => {}
        }
    }

    /// Runs every periodic task due at the current instant and returns how
    /// many fired.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let due = self.tasks.take_due(now);
        for key in &due {
            match key {
                TaskKey::Blink => self.blink_title(),
                TaskKey::TimeSince(tool_id) => self.refresh_time_since(tool_id, now),
            }
        }
        due.len()
    }

    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.tasks.next_due()
    }

    /// Stops everything and forgets every entry. Callbacks are dropped
    /// unused.
    pub fn teardown(&mut self) {
        self.tasks.cancel_all();
        self.blink = None;
        for entry in self.registry.drain() {
            self.services.audio.stop_sound(&entry.tool_id);
        }
        self.audible = None;
        self.sync_flag();
        if self.overlay_active {
            let container = self.container_module.clone();
            self.close_overlay(&container);
        } else {
            self.view = OverlayView::Hidden;
        }
        self.refresh_restore_button();
        self.restore_section_title();
        info!("ringing coordinator torn down");
    }

    pub fn latest_ringing(&self) -> Option<&RingingEntry> {
        self.registry.latest()
    }

    pub fn entry(&self, tool_id: &ToolId) -> Option<&RingingEntry> {
        self.registry.get(tool_id)
    }

    pub fn ringing_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_any_ringing(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn ringing_flag(&self) -> RingingFlag {
        self.flag.clone()
    }

    /// Content of the overlay; only on screen while the overlay is active.
    pub fn view(&self) -> &OverlayView {
        &self.view
    }

    pub fn is_overlay_active(&self) -> bool {
        self.overlay_active
    }

    pub fn audible(&self) -> Option<&ToolId> {
        self.audible.as_ref()
    }

    pub fn restore_button(&self) -> RestoreButton {
        self.restore
    }

    pub fn is_blinking(&self) -> bool {
        self.tasks.is_active(&TaskKey::Blink)
    }

    pub fn is_task_active(&self, key: &TaskKey) -> bool {
        self.tasks.is_active(key)
    }

    fn show_latest(&mut self) -> bool {
        match self.registry.latest().map(|entry| entry.tool_id.clone()) {
            Some(tool_id) => self.show_detail(&tool_id),
            None => false,
        }
    }

    fn after_removal(&mut self, tool_id: &ToolId) {
        self.services.audio.stop_sound(tool_id);
        if self.audible.as_ref() == Some(tool_id) {
            self.audible = None;
        }
        self.tasks.cancel(&TaskKey::TimeSince(tool_id.clone()));
        self.sync_flag();

        if self.registry.is_empty() {
            let container = self.container_module.clone();
            self.close_overlay(&container);
        } else {
            self.show_latest();
        }
        self.refresh_restore_button();
        self.refresh_blinking_title();
    }

    fn silence_all_except(&mut self, keep: Option<&ToolId>) {
        for tool_id in self.registry.ids() {
            if Some(&tool_id) != keep {
                self.services.audio.stop_sound(&tool_id);
            }
        }
        if self.audible.as_ref() != keep {
            self.audible = None;
        }
    }

    fn close_overlay(&mut self, module: &str) {
        self.services.modules.deactivate_module(module);
        self.overlay_active = false;
        self.tasks.cancel_time_since();
        self.view = OverlayView::Hidden;
        self.present();
    }

    fn refresh_time_since(&mut self, tool_id: &ToolId, now: DateTime<Local>) {
        let Some(entry) = self.registry.get(tool_id) else {
            self.tasks.cancel(&TaskKey::TimeSince(tool_id.clone()));
            return;
        };
        let text = format_time_since(entry.rang_at, now, self.services.translator.as_ref());
        match &mut self.view {
            OverlayView::Detail(detail) if &detail.tool_id == tool_id => {
                detail.time_since = text;
            }
            _ => return,
        }
        self.present();
    }

    fn refresh_restore_button(&mut self) {
        self.restore = RestoreButton::for_count(self.registry.len());
        match self.services.surface.as_mut() {
            Some(surface) => surface.present_restore_button(self.restore),
            None => debug!(
                error = %RingingError::MissingRenderTarget("restore button"),
                "restore button not drawn"
            ),
        }
    }

    fn refresh_blinking_title(&mut self) {
        self.tasks.cancel(&TaskKey::Blink);
        self.blink = None;

        let Some(latest) = self.registry.latest() else {
            self.restore_section_title();
            return;
        };
        let kind = latest.kind();
        let details = latest.details.clone();
        let fallback = format_title(
            &self.app_name,
            &self.services.translator.translate(kind.as_str(), "tooltips"),
        );
        let dynamic = match self.dynamic_title_text(&details) {
            Ok(text) => format_title(&self.app_name, &text),
            Err(err) => {
                warn!(error = %err, kind = kind.as_str(), "blinking title uses static text only");
                fallback.clone()
            }
        };

        let mut blink = TitleBlink::new(dynamic, fallback);
        self.services.title.set_title(blink.advance());
        self.blink = Some(blink);
        self.tasks
            .start(TaskKey::Blink, self.blink_interval, self.clock.now());
    }

    fn dynamic_title_text(&self, details: &ToolDetails) -> Result<String, RingingError> {
        match *details {
            ToolDetails::Alarm { hour, minute } => self
                .services
                .alarms
                .as_ref()
                .map(|alarms| alarms.format_time_for_title(hour, minute))
                .ok_or(RingingError::MissingCollaborator("alarm")),
            ToolDetails::Timer { timer_type, .. } => self
                .services
                .timers
                .as_ref()
                .map(|timers| timers.format_time(0, timer_type))
                .ok_or(RingingError::MissingCollaborator("timer")),
        }
    }

    fn blink_title(&mut self) {
        if let Some(blink) = self.blink.as_mut() {
            self.services.title.set_title(blink.advance());
        }
    }

    fn restore_section_title(&mut self) {
        let services = &mut self.services;
        let Some(sections) = services.sections.as_ref() else {
            debug!("no section title manager, title left as is");
            return;
        };
        if let Some(title) = sections.section_title(services.translator.as_ref()) {
            services.title.set_title(&title);
        }
    }

    fn present(&mut self) {
        let hidden = OverlayView::Hidden;
        let view = if self.overlay_active {
            &self.view
        } else {
            &hidden
        };
        match self.services.surface.as_mut() {
            Some(surface) => surface.present(view),
            None => debug!(
                error = %RingingError::MissingRenderTarget("overlay"),
                "overlay not drawn"
            ),
        }
    }

    fn sync_flag(&self) {
        self.flag.set(self.registry.len());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use super::*;
    use crate::ringing::model::TimerType;
    use crate::ringing::view::DisplayMode;
    use crate::services::{
        AlarmManager, AudioService, ModuleHost, OverlaySurface, TimerManager, TitleSink,
        Translations,
    };
    use crate::time_provider::ManualTimeProvider;
    use crate::title::{Section, SectionTitleManager};

    #[derive(Debug, Default)]
    struct Log {
        playing: BTreeSet<ToolId>,
        max_playing: usize,
        audio: Vec<String>,
        titles: Vec<String>,
        modules: Vec<String>,
        views: Vec<OverlayView>,
        restore: Vec<RestoreButton>,
    }

    type SharedLog = Rc<RefCell<Log>>;

    struct RecordingAudio(SharedLog);

    impl AudioService for RecordingAudio {
        fn play_sound(&mut self, sound: &str, channel: &ToolId) {
            let mut log = self.0.borrow_mut();
            log.playing.insert(channel.clone());
            log.max_playing = log.max_playing.max(log.playing.len());
            log.audio.push(format!("play {channel} {sound}"));
        }

        fn stop_sound(&mut self, channel: &ToolId) {
            let mut log = self.0.borrow_mut();
            if log.playing.remove(channel) {
                log.audio.push(format!("stop {channel}"));
            }
        }
    }

    struct RecordingModules(SharedLog);

    impl ModuleHost for RecordingModules {
        fn activate_module(&mut self, name: &str) {
            self.0.borrow_mut().modules.push(format!("activate {name}"));
        }

        fn deactivate_module(&mut self, name: &str) {
            self.0.borrow_mut().modules.push(format!("deactivate {name}"));
        }

        fn toggle_module(&mut self, name: &str) {
            self.0.borrow_mut().modules.push(format!("toggle {name}"));
        }
    }

    struct RecordingTitle(SharedLog);

    impl TitleSink for RecordingTitle {
        fn set_title(&mut self, title: &str) {
            self.0.borrow_mut().titles.push(title.to_string());
        }
    }

    struct RecordingSurface(SharedLog);

    impl OverlaySurface for RecordingSurface {
        fn present(&mut self, view: &OverlayView) {
            self.0.borrow_mut().views.push(view.clone());
        }

        fn present_restore_button(&mut self, state: RestoreButton) {
            self.0.borrow_mut().restore.push(state);
        }
    }

    struct ClockFormatter;

    impl AlarmManager for ClockFormatter {
        fn format_time_for_title(&self, hour: u32, minute: u32) -> String {
            format!("{hour:02}:{minute:02}")
        }
    }

    impl TimerManager for ClockFormatter {
        fn format_time(&self, remaining_ms: u64, _timer_type: TimerType) -> String {
            let secs = remaining_ms / 1_000;
            format!("{:02}:{:02}:{:02}", secs / 3_600, (secs % 3_600) / 60, secs % 60)
        }
    }

    struct Harness {
        coordinator: RingingCoordinator,
        clock: ManualTimeProvider,
        log: SharedLog,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_managers(true)
        }

        fn with_managers(managers: bool) -> Self {
            let log = SharedLog::default();
            let clock = ManualTimeProvider::new(
                Local
                    .timestamp_opt(1_700_000_000, 0)
                    .single()
                    .expect("valid epoch"),
            );
            let services = Services {
                audio: Box::new(RecordingAudio(Rc::clone(&log))),
                translator: Box::new(Translations::english()),
                modules: Box::new(RecordingModules(Rc::clone(&log))),
                title: Box::new(RecordingTitle(Rc::clone(&log))),
                sections: Some(Box::new(SectionTitleManager::new(
                    "ProjectNocturne",
                    Section::Everything,
                ))),
                alarms: managers.then(|| Box::new(ClockFormatter) as Box<dyn AlarmManager>),
                timers: managers.then(|| Box::new(ClockFormatter) as Box<dyn TimerManager>),
                surface: Some(Box::new(RecordingSurface(Rc::clone(&log)))),
            };
            let coordinator = RingingCoordinator::new(
                &RingingConfig::default(),
                services,
                Box::new(clock.clone()),
            );
            Self {
                coordinator,
                clock,
                log,
            }
        }

        fn advance_secs(&mut self, secs: i64) {
            for _ in 0..secs {
                self.clock.advance(chrono::Duration::seconds(1));
                self.coordinator.tick();
            }
        }

        fn playing(&self) -> Vec<String> {
            self.log
                .borrow()
                .playing
                .iter()
                .map(ToString::to_string)
                .collect()
        }

        fn last_title(&self) -> Option<String> {
            self.log.borrow().titles.last().cloned()
        }
    }

    fn alarm(id: &str) -> RingRequest {
        RingRequest::alarm(id, format!("Alarm {id}"), "classic", 7, 30)
    }

    fn timer(id: &str) -> RingRequest {
        RingRequest::timer(id, format!("Timer {id}"), "bell", TimerType::Countdown, 60_000)
    }

    fn recording_actions(calls: &Rc<RefCell<Vec<String>>>) -> RingingActions {
        let dismiss = Rc::clone(calls);
        let snooze = Rc::clone(calls);
        let restart = Rc::clone(calls);
        RingingActions::new()
            .on_dismiss(move |id| dismiss.borrow_mut().push(format!("dismiss {id}")))
            .on_snooze(move |id| snooze.borrow_mut().push(format!("snooze {id}")))
            .on_restart(move |id| restart.borrow_mut().push(format!("restart {id}")))
    }

    #[test]
    fn repeat_fire_keeps_single_entry_and_sound() {
        let mut h = Harness::new();
        assert!(h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new()));
        h.advance_secs(3);
        assert!(!h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new()));

        assert_eq!(h.coordinator.ringing_count(), 1);
        let plays = h
            .log
            .borrow()
            .audio
            .iter()
            .filter(|line| line.starts_with("play"))
            .count();
        assert_eq!(plays, 1);
        let rang_at = h.coordinator.entry(&ToolId::from("a1")).map(|e| e.rang_at);
        assert_eq!(rang_at, Some(h.clock.now() - chrono::Duration::seconds(3)));
    }

    #[test]
    fn dismissing_latest_resumes_previous_sound() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        h.coordinator
            .show_ringing_screen(alarm("a1"), recording_actions(&calls));
        h.advance_secs(2);
        h.coordinator
            .show_ringing_screen(timer("t1"), recording_actions(&calls));

        assert_eq!(
            h.coordinator.latest_ringing().map(|e| e.tool_id.as_str()),
            Some("t1")
        );
        assert_eq!(h.playing(), vec!["t1".to_string()]);

        assert!(h
            .coordinator
            .resolve_ringing(&ToolId::from("t1"), RingingAction::Dismiss));
        assert_eq!(*calls.borrow(), vec!["dismiss t1".to_string()]);
        assert!(h.coordinator.entry(&ToolId::from("t1")).is_none());
        assert_eq!(
            h.coordinator.latest_ringing().map(|e| e.tool_id.as_str()),
            Some("a1")
        );
        assert_eq!(h.playing(), vec!["a1".to_string()]);
        assert_eq!(h.coordinator.audible().map(ToolId::as_str), Some("a1"));
        assert_eq!(h.log.borrow().max_playing, 1);
    }

    #[test]
    fn resolving_twice_runs_callback_once() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        h.coordinator
            .show_ringing_screen(alarm("a1"), recording_actions(&calls));

        let id = ToolId::from("a1");
        assert!(h.coordinator.resolve_ringing(&id, RingingAction::Dismiss));
        assert!(!h.coordinator.resolve_ringing(&id, RingingAction::Dismiss));
        assert_eq!(*calls.borrow(), vec!["dismiss a1".to_string()]);
    }

    #[test]
    fn secondary_actions_reach_matching_callbacks() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        h.coordinator
            .show_ringing_screen(alarm("a1"), recording_actions(&calls));
        h.coordinator
            .show_ringing_screen(timer("t1"), recording_actions(&calls));

        h.coordinator.handle(UiCommand::Action(
            ToolId::from("a1"),
            RingingAction::Snooze,
        ));
        h.coordinator.handle(UiCommand::Action(
            ToolId::from("t1"),
            RingingAction::Restart,
        ));
        assert_eq!(
            *calls.borrow(),
            vec!["snooze a1".to_string(), "restart t1".to_string()]
        );
        assert!(!h.coordinator.is_any_ringing());
    }

    #[test]
    fn switching_detail_stops_previous_sound_first() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(alarm("a2"), RingingActions::new());
        h.log.borrow_mut().audio.clear();

        for _ in 0..3 {
            h.coordinator.handle(UiCommand::Select(ToolId::from("a1")));
            h.coordinator.handle(UiCommand::Select(ToolId::from("a2")));
        }

        let audio = h.log.borrow().audio.clone();
        assert_eq!(audio[0], "stop a2");
        assert_eq!(audio[1], "play a1 classic");
        assert_eq!(audio[2], "stop a1");
        assert_eq!(audio[3], "play a2 classic");
        assert_eq!(h.log.borrow().max_playing, 1);
        assert_eq!(h.playing(), vec!["a2".to_string()]);
    }

    #[test]
    fn reselecting_audible_tool_does_not_restart_sound() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.log.borrow_mut().audio.clear();

        h.coordinator.handle(UiCommand::Select(ToolId::from("a1")));
        assert!(h.log.borrow().audio.is_empty());
    }

    #[test]
    fn title_blinks_between_dynamic_and_static() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - 07:30"));

        h.advance_secs(1);
        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - Alarm"));
        h.advance_secs(1);
        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - 07:30"));
    }

    #[test]
    fn timer_title_uses_timer_formatter() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(timer("t1"), RingingActions::new());
        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - 00:00:00"));
        h.advance_secs(1);
        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - Timer"));
    }

    #[test]
    fn emptying_registry_stops_blinking_and_restores_section_title() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        assert!(h.coordinator.is_blinking());

        h.coordinator
            .resolve_ringing(&ToolId::from("a1"), RingingAction::Dismiss);
        assert!(!h.coordinator.is_blinking());
        assert_eq!(
            h.last_title().as_deref(),
            Some("ProjectNocturne - Everything")
        );

        let titles_before = h.log.borrow().titles.len();
        h.advance_secs(5);
        assert_eq!(h.log.borrow().titles.len(), titles_before);
        assert!(h.coordinator.next_due().is_none());
    }

    #[test]
    fn missing_managers_fall_back_to_static_title() {
        let mut h = Harness::with_managers(false);
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());

        assert_eq!(h.last_title().as_deref(), Some("ProjectNocturne - Alarm"));
        assert!(h.coordinator.is_blinking());
        assert_eq!(h.coordinator.ringing_count(), 1);
    }

    #[test]
    fn time_since_refreshes_every_second_in_detail() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.advance_secs(65);

        match h.coordinator.view() {
            OverlayView::Detail(detail) => {
                assert_eq!(detail.time_since, "1 minutes 5 seconds");
            }
            other => panic!("expected detail view, got {other:?}"),
        }
        assert!(h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));
    }

    #[test]
    fn only_focused_tool_has_time_since_task() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(timer("t1"), RingingActions::new());

        assert!(!h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));
        assert!(h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("t1"))));

        h.coordinator.handle(UiCommand::ShowList);
        assert!(!h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("t1"))));
        assert_eq!(h.coordinator.view().mode(), Some(DisplayMode::List));
    }

    #[test]
    fn list_selection_and_back_navigation() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(timer("t1"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(alarm("a2"), RingingActions::new());

        match h.coordinator.view() {
            OverlayView::Detail(detail) => {
                let toggle = detail.header.list_toggle.as_ref().expect("counter shown");
                assert_eq!(toggle.count, 3);
            }
            other => panic!("expected detail view, got {other:?}"),
        }

        assert!(h.coordinator.handle(UiCommand::ShowList));
        match h.coordinator.view() {
            OverlayView::List(list) => {
                let ids = list
                    .sections
                    .iter()
                    .flat_map(|section| section.items.iter().map(|item| item.tool_id.as_str()))
                    .collect::<Vec<_>>();
                assert_eq!(ids, vec!["a2", "a1", "t1"]);
            }
            other => panic!("expected list view, got {other:?}"),
        }

        h.coordinator.handle(UiCommand::Select(ToolId::from("t1")));
        assert_eq!(h.coordinator.view().focused().map(ToolId::as_str), Some("t1"));
        assert_eq!(h.playing(), vec!["t1".to_string()]);

        h.coordinator.handle(UiCommand::BackToDetail);
        assert_eq!(h.coordinator.view().focused().map(ToolId::as_str), Some("a2"));
        assert_eq!(h.coordinator.ringing_count(), 3);
    }

    #[test]
    fn empty_list_closes_overlay() {
        let mut h = Harness::new();
        assert!(!h.coordinator.show_list());
        assert_eq!(
            h.log.borrow().modules.last().map(String::as_str),
            Some("deactivate toggleNotificationsOverlay")
        );
        assert!(!h.coordinator.is_overlay_active());
    }

    #[test]
    fn overlay_opens_on_fire_and_closes_when_empty() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        assert!(h.coordinator.is_overlay_active());
        assert_eq!(
            h.log.borrow().modules.first().map(String::as_str),
            Some("activate toggleNotificationsOverlay")
        );

        h.coordinator.hide_ringing_screen(&ToolId::from("a1"));
        assert!(!h.coordinator.is_overlay_active());
        assert_eq!(h.coordinator.view(), &OverlayView::Hidden);
        assert_eq!(
            h.log.borrow().modules.last().map(String::as_str),
            Some("deactivate overlayContainer")
        );
        assert!(h.playing().is_empty());
    }

    #[test]
    fn hide_skips_callbacks() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        h.coordinator
            .show_ringing_screen(alarm("a1"), recording_actions(&calls));

        assert!(h.coordinator.hide_ringing_screen(&ToolId::from("a1")));
        assert!(!h.coordinator.hide_ringing_screen(&ToolId::from("a1")));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn module_events_drive_overlay_state() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());

        h.coordinator
            .on_module_event(ModuleEvent::Deactivated("toggleNotificationsOverlay".into()));
        assert!(!h.coordinator.is_overlay_active());
        assert!(!h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));
        assert_eq!(h.log.borrow().views.last(), Some(&OverlayView::Hidden));
        assert!(h.coordinator.restore_button().ringing);
        assert_eq!(h.playing(), vec!["a1".to_string()]);

        h.coordinator
            .on_module_event(ModuleEvent::Activated("toggleNotificationsOverlay".into()));
        assert!(h.coordinator.is_overlay_active());
        assert_eq!(h.coordinator.view().focused().map(ToolId::as_str), Some("a1"));
        assert!(h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));

        h.coordinator
            .on_module_event(ModuleEvent::Deactivated("someOtherMenu".into()));
        assert!(h.coordinator.is_overlay_active());
    }

    #[test]
    fn minimised_overlay_gets_no_time_since_refresh_after_removal() {
        let mut h = Harness::new();
        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(alarm("a2"), RingingActions::new());
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(timer("t1"), RingingActions::new());
        h.coordinator
            .on_module_event(ModuleEvent::Deactivated("toggleNotificationsOverlay".into()));

        h.coordinator.hide_ringing_screen(&ToolId::from("t1"));
        assert!(!h.coordinator.is_overlay_active());
        assert!(!h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a2"))));

        h.coordinator
            .resolve_ringing(&ToolId::from("a2"), RingingAction::Dismiss);
        assert!(!h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));
        assert_eq!(h.playing(), vec!["a1".to_string()]);

        h.coordinator
            .on_module_event(ModuleEvent::Activated("toggleNotificationsOverlay".into()));
        assert!(h
            .coordinator
            .is_task_active(&TaskKey::TimeSince(ToolId::from("a1"))));
    }

    #[test]
    fn activation_with_nothing_ringing_closes_again() {
        let mut h = Harness::new();
        h.coordinator
            .on_module_event(ModuleEvent::Activated("toggleNotificationsOverlay".into()));
        assert!(!h.coordinator.is_overlay_active());
        assert_eq!(
            h.log.borrow().modules.last().map(String::as_str),
            Some("deactivate toggleNotificationsOverlay")
        );
    }

    #[test]
    fn restore_click_toggles_only_while_ringing() {
        let mut h = Harness::new();
        assert!(!h.coordinator.handle(UiCommand::RestoreClicked));

        h.coordinator.show_ringing_screen(alarm("a1"), RingingActions::new());
        assert!(h.coordinator.handle(UiCommand::RestoreClicked));
        assert_eq!(
            h.log.borrow().modules.last().map(String::as_str),
            Some("toggle toggleNotificationsOverlay")
        );
        assert_eq!(
            h.log.borrow().restore.last(),
            Some(&RestoreButton {
                enabled: true,
                ringing: true
            })
        );
    }

    #[test]
    fn ringing_flag_is_shared_and_updates_after_callback() {
        let mut h = Harness::new();
        let flag = h.coordinator.ringing_flag();
        let seen = Rc::new(Cell::new(None));
        let seen_in_callback = Rc::clone(&seen);
        let flag_in_callback = flag.clone();
        let actions = RingingActions::new().on_dismiss(move |_| {
            seen_in_callback.set(Some(flag_in_callback.is_any_ringing()));
        });

        assert!(!flag.is_any_ringing());
        h.coordinator.show_ringing_screen(alarm("a1"), actions);
        assert_eq!(flag.ringing_count(), 1);

        h.coordinator
            .resolve_ringing(&ToolId::from("a1"), RingingAction::Dismiss);
        assert_eq!(seen.get(), Some(true));
        assert!(!flag.is_any_ringing());
    }

    #[test]
    fn callback_runs_while_entry_is_still_registered() {
        let mut h = Harness::new();
        let flag = h.coordinator.ringing_flag();
        let seen = Rc::new(Cell::new(None));
        let seen_in_callback = Rc::clone(&seen);
        let flag_in_callback = flag.clone();
        let actions = RingingActions::new().on_snooze(move |_| {
            seen_in_callback.set(Some(flag_in_callback.ringing_count()));
        });
        h.coordinator.show_ringing_screen(alarm("a1"), actions);
        h.advance_secs(1);
        h.coordinator.show_ringing_screen(alarm("a2"), RingingActions::new());

        h.coordinator
            .resolve_ringing(&ToolId::from("a1"), RingingAction::Snooze);
        assert_eq!(seen.get(), Some(2));
        assert!(h.coordinator.entry(&ToolId::from("a1")).is_none());
        assert_eq!(flag.ringing_count(), 1);
    }

    #[test]
    fn teardown_drops_entries_without_callbacks() {
        let mut h = Harness::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        h.coordinator
            .show_ringing_screen(alarm("a1"), recording_actions(&calls));
        h.coordinator
            .show_ringing_screen(timer("t1"), recording_actions(&calls));

        h.coordinator.teardown();
        assert!(!h.coordinator.is_any_ringing());
        assert!(!h.coordinator.is_overlay_active());
        assert!(!h.coordinator.is_blinking());
        assert!(h.coordinator.next_due().is_none());
        assert!(h.playing().is_empty());
        assert!(calls.borrow().is_empty());
        assert_eq!(
            h.last_title().as_deref(),
            Some("ProjectNocturne - Everything")
        );
    }
}

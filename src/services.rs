//! Contracts the ringing coordinator consumes from the rest of the app.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ringing::model::{TimerType, ToolId};
use crate::ringing::view::{OverlayView, RestoreButton};

/// Single exclusive sound channel per tool id.
pub trait AudioService {
    fn play_sound(&mut self, sound: &str, channel: &ToolId);
    fn stop_sound(&mut self, channel: &ToolId);
}

pub trait Translator {
    /// Always yields text; unknown keys fall back inside the implementation.
    fn translate(&self, key: &str, category: &str) -> String;
}

/// Overlay activation system. Implementations report activation changes
/// back through `RingingCoordinator::on_module_event` once the call returns.
pub trait ModuleHost {
    fn activate_module(&mut self, name: &str);
    fn deactivate_module(&mut self, name: &str);
    fn toggle_module(&mut self, name: &str);

    fn exit_fullscreen(&mut self) {}
}

pub trait TitleSink {
    fn set_title(&mut self, title: &str);
}

/// Owner of the title while nothing rings.
pub trait SectionTitles {
    /// `None` means the active section's own controller manages the title.
    fn section_title(&self, translator: &dyn Translator) -> Option<String>;
}

pub trait AlarmManager {
    fn format_time_for_title(&self, hour: u32, minute: u32) -> String;
}

pub trait TimerManager {
    fn format_time(&self, remaining_ms: u64, timer_type: TimerType) -> String;
}

/// Where the overlay view-model is drawn.
pub trait OverlaySurface {
    fn present(&mut self, view: &OverlayView);
    fn present_restore_button(&mut self, state: RestoreButton);
}

pub struct Services {
    pub audio: Box<dyn AudioService>,
    pub translator: Box<dyn Translator>,
    pub modules: Box<dyn ModuleHost>,
    pub title: Box<dyn TitleSink>,
    pub sections: Option<Box<dyn SectionTitles>>,
    pub alarms: Option<Box<dyn AlarmManager>>,
    pub timers: Option<Box<dyn TimerManager>>,
    pub surface: Option<Box<dyn OverlaySurface>>,
}

/// Category -> key -> text lookup table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Translations {
    table: HashMap<String, HashMap<String, String>>,
}

const ENGLISH: &[(&str, &str, &str)] = &[
    ("timer", "days", "days"),
    ("timer", "hours", "hours"),
    ("timer", "minutes", "minutes"),
    ("timer", "seconds", "seconds"),
    ("timer", "timer_title", "Timer title"),
    ("timer", "restart_timer", "Restart"),
    ("alarms", "alarm_title", "Alarm title"),
    ("general", "dismiss", "Dismiss"),
    ("general", "snooze", "Snooze"),
    ("general", "ringing_notifications", "Ringing"),
    ("general", "active_alarms", "Active alarms"),
    ("general", "active_timers", "Active timers"),
    ("notifications", "alarm_ringing_title", "Alarm ringing"),
    ("notifications", "timer_ringing_title", "Timer finished"),
    ("tooltips", "alarm", "Alarm"),
    ("tooltips", "timer", "Timer"),
    ("tooltips", "alarms", "Alarms"),
    ("tooltips", "everything", "Everything"),
    ("legal_docs", "privacy_title", "Privacy Policy"),
    ("legal_docs", "terms_title", "Terms and Conditions"),
    ("legal_docs", "cookies_title", "Cookies Policy"),
];

impl Translations {
    pub fn english() -> Self {
        let mut translations = Self::default();
        for (category, key, text) in ENGLISH {
            translations.insert(category, key, text);
        }
        translations
    }

    pub fn insert(&mut self, category: &str, key: &str, text: &str) {
        self.table
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }

    /// Overlays `other` on top of this table.
    pub fn merge(&mut self, other: Translations) {
        for (category, keys) in other.table {
            self.table.entry(category).or_default().extend(keys);
        }
    }
}

impl Translator for Translations {
    fn translate(&self, key: &str, category: &str) -> String {
        self.table
            .get(category)
            .and_then(|keys| keys.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

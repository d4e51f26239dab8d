use crate::services::{SectionTitles, Translator};

pub fn format_title(app_name: &str, page: &str) -> String {
    format!("{app_name} - {page}")
}

/// Alternates between a dynamic title and a static fallback, starting with
/// the dynamic one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBlink {
    dynamic: String,
    fallback: String,
    show_dynamic: bool,
}

impl TitleBlink {
    pub fn new(dynamic: String, fallback: String) -> Self {
        Self {
            dynamic,
            fallback,
            show_dynamic: true,
        }
    }

    pub fn advance(&mut self) -> &str {
        let shown = self.show_dynamic;
        self.show_dynamic = !self.show_dynamic;
        if shown { &self.dynamic } else { &self.fallback }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Everything,
    Alarm,
    Timer,
    Stopwatch,
    WorldClock,
    PrivacyPolicy,
    TermsConditions,
    CookiesPolicy,
    Other,
}

#[derive(Debug, Clone)]
pub struct SectionTitleManager {
    app_name: String,
    section: Section,
    next_alarm: Option<String>,
}

impl SectionTitleManager {
    pub fn new(app_name: impl Into<String>, section: Section) -> Self {
        Self {
            app_name: app_name.into(),
            section,
            next_alarm: None,
        }
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    pub fn set_next_alarm(&mut self, details: Option<String>) {
        self.next_alarm = details;
    }
}

impl SectionTitles for SectionTitleManager {
    fn section_title(&self, translator: &dyn Translator) -> Option<String> {
        let page = match self.section {
            Section::Everything => translator.translate("everything", "tooltips"),
            Section::Alarm => match &self.next_alarm {
                Some(next) => next.clone(),
                None => translator.translate("alarms", "tooltips"),
            },
            // Their controllers keep the title live themselves.
            Section::Timer | Section::Stopwatch | Section::WorldClock => return None,
            Section::PrivacyPolicy => translator.translate("privacy_title", "legal_docs"),
            Section::TermsConditions => translator.translate("terms_title", "legal_docs"),
            Section::CookiesPolicy => translator.translate("cookies_title", "legal_docs"),
            Section::Other => return Some(self.app_name.clone()),
        };
        Some(format_title(&self.app_name, &page))
    }
}

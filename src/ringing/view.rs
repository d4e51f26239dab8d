use chrono::{DateTime, Local};

use crate::ringing::model::{RingingAction, RingingEntry, ToolId, ToolKind};
use crate::ringing::registry::RingingRegistry;
use crate::services::Translator;
use crate::time_since::format_time_since;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayView {
    Hidden,
    Detail(DetailView),
    List(ListView),
}

impl OverlayView {
    pub fn mode(&self) -> Option<DisplayMode> {
        match self {
            OverlayView::Hidden => None,
            OverlayView::Detail(_) => Some(DisplayMode::Detail),
            OverlayView::List(_) => Some(DisplayMode::List),
        }
    }

    pub fn focused(&self) -> Option<&ToolId> {
        match self {
            OverlayView::Detail(detail) => Some(&detail.tool_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListToggle {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailHeader {
    pub icon: &'static str,
    pub title: String,
    pub list_toggle: Option<ListToggle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub action: RingingAction,
    pub label: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub tool_id: ToolId,
    pub header: DetailHeader,
    pub title_label: String,
    pub title: String,
    pub time_since: String,
    /// Secondary action first, primary dismiss last.
    pub actions: [ActionButton; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub tool_id: ToolId,
    pub icon: &'static str,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSection {
    pub kind: ToolKind,
    pub heading: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub icon: &'static str,
    pub title: String,
    pub sections: Vec<ListSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreButton {
    pub enabled: bool,
    pub ringing: bool,
}

impl RestoreButton {
    pub fn for_count(ringing_count: usize) -> Self {
        let ringing = ringing_count > 0;
        Self {
            enabled: ringing,
            ringing,
        }
    }
}

pub fn build_detail(
    entry: &RingingEntry,
    ringing_count: usize,
    translator: &dyn Translator,
    now: DateTime<Local>,
) -> DetailView {
    let kind = entry.kind();
    let (header_key, title_key, title_category) = match kind {
        ToolKind::Alarm => ("alarm_ringing_title", "alarm_title", "alarms"),
        ToolKind::Timer => ("timer_ringing_title", "timer_title", "timer"),
    };
    let list_toggle = (ringing_count > 1).then(|| ListToggle {
        label: format!(
            "{} ({ringing_count})",
            translator.translate("ringing_notifications", "general")
        ),
        count: ringing_count,
    });

    DetailView {
        tool_id: entry.tool_id.clone(),
        header: DetailHeader {
            icon: kind.icon(),
            title: translator.translate(header_key, "notifications"),
            list_toggle,
        },
        title_label: translator.translate(title_key, title_category),
        title: entry.title.clone(),
        time_since: format_time_since(entry.rang_at, now, translator),
        actions: [
            action_button(kind.secondary_action(), translator),
            action_button(RingingAction::Dismiss, translator),
        ],
    }
}

fn action_button(action: RingingAction, translator: &dyn Translator) -> ActionButton {
    let label = match action {
        RingingAction::Dismiss => translator.translate("dismiss", "general"),
        RingingAction::Snooze => translator.translate("snooze", "general"),
        RingingAction::Restart => translator.translate("restart_timer", "timer"),
    };
    ActionButton {
        action,
        label,
        primary: action == RingingAction::Dismiss,
    }
}

/// `None` when nothing is ringing; the caller closes the overlay instead.
pub fn build_list(registry: &RingingRegistry, translator: &dyn Translator) -> Option<ListView> {
    if registry.is_empty() {
        return None;
    }

    let sections = [
        (ToolKind::Alarm, "active_alarms"),
        (ToolKind::Timer, "active_timers"),
    ]
    .into_iter()
    .filter_map(|(kind, heading_key)| {
        let items = registry
            .latest_first(kind)
            .into_iter()
            .map(|entry| ListItem {
                tool_id: entry.tool_id.clone(),
                icon: kind.icon(),
                title: entry.title.clone(),
            })
            .collect::<Vec<_>>();
        (!items.is_empty()).then(|| ListSection {
            kind,
            heading: translator.translate(heading_key, "general"),
            items,
        })
    })
    .collect();

    Some(ListView {
        icon: "list",
        title: translator.translate("ringing_notifications", "general"),
        sections,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ringing::model::{RingRequest, RingingActions, TimerType};
    use crate::services::Translations;

    fn at(offset_secs: i64) -> DateTime<Local> {
        Local
            .timestamp_opt(1_700_000_000 + offset_secs, 0)
            .single()
            .expect("valid epoch")
    }

    fn entry(request: RingRequest, offset_secs: i64) -> RingingEntry {
        RingingEntry::new(request, RingingActions::new(), at(offset_secs))
    }

    #[test]
    fn alarm_detail_offers_snooze_and_dismiss() {
        let alarm = entry(RingRequest::alarm("a1", "Wake up", "classic", 7, 30), 0);
        let detail = build_detail(&alarm, 1, &Translations::english(), at(65));

        assert_eq!(detail.header.icon, "alarm");
        assert_eq!(detail.header.title, "Alarm ringing");
        assert!(detail.header.list_toggle.is_none());
        assert_eq!(detail.title_label, "Alarm title");
        assert_eq!(detail.title, "Wake up");
        assert_eq!(detail.time_since, "1 minutes 5 seconds");
        assert_eq!(detail.actions[0].action, RingingAction::Snooze);
        assert!(!detail.actions[0].primary);
        assert_eq!(detail.actions[1].action, RingingAction::Dismiss);
        assert!(detail.actions[1].primary);
    }

    #[test]
    fn timer_detail_offers_restart_and_counter_when_several_ring() {
        let timer = entry(
            RingRequest::timer("t1", "Tea", "bell", TimerType::Countdown, 180_000),
            0,
        );
        let detail = build_detail(&timer, 3, &Translations::english(), at(0));

        assert_eq!(detail.actions[0].action, RingingAction::Restart);
        assert_eq!(detail.actions[0].label, "Restart");
        let toggle = detail.header.list_toggle.expect("counter shown");
        assert_eq!(toggle.count, 3);
        assert_eq!(toggle.label, "Ringing (3)");
    }

    #[test]
    fn list_puts_alarms_before_timers_latest_first() {
        let mut registry = RingingRegistry::new();
        registry
            .insert(entry(
                RingRequest::timer("t1", "Tea", "bell", TimerType::Countdown, 1_000),
                0,
            ))
            .expect("insert");
        registry
            .insert(entry(RingRequest::alarm("a1", "Wake", "classic", 7, 0), 1))
            .expect("insert");
        registry
            .insert(entry(RingRequest::alarm("a2", "Meds", "classic", 8, 0), 2))
            .expect("insert");

        let list = build_list(&registry, &Translations::english()).expect("non-empty");
        assert_eq!(list.sections.len(), 2);
        assert_eq!(list.sections[0].kind, ToolKind::Alarm);
        assert_eq!(list.sections[0].heading, "Active alarms");
        let alarm_ids = list.sections[0]
            .items
            .iter()
            .map(|item| item.tool_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(alarm_ids, vec!["a2", "a1"]);
        assert_eq!(list.sections[1].kind, ToolKind::Timer);
        assert_eq!(list.sections[1].items[0].title, "Tea");
    }

    #[test]
    fn empty_registry_has_no_list() {
        assert!(build_list(&RingingRegistry::new(), &Translations::english()).is_none());
    }

    #[test]
    fn restore_button_tracks_ringing_count() {
        assert_eq!(
            RestoreButton::for_count(0),
            RestoreButton {
                enabled: false,
                ringing: false
            }
        );
        assert!(RestoreButton::for_count(2).ringing);
    }
}

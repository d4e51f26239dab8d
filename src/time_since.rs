use chrono::{DateTime, Local};

use crate::services::Translator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElapsedParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl ElapsedParts {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn between(since: DateTime<Local>, now: DateTime<Local>) -> Self {
        let elapsed = (now - since).num_seconds().max(0);
        Self::from_seconds(u64::try_from(elapsed).unwrap_or(0))
    }
}

pub fn format_time_since(
    since: DateTime<Local>,
    now: DateTime<Local>,
    translator: &dyn Translator,
) -> String {
    format_elapsed(ElapsedParts::between(since, now), translator)
}

/// Two largest non-zero units, largest first.
pub fn format_elapsed(parts: ElapsedParts, translator: &dyn Translator) -> String {
    let units = [
        (parts.days, "days"),
        (parts.hours, "hours"),
        (parts.minutes, "minutes"),
        (parts.seconds, "seconds"),
    ];
    let shown = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .take(2)
        .map(|(value, key)| format!("{value} {}", translator.translate(key, "timer")))
        .collect::<Vec<_>>();

    if shown.is_empty() {
        format!("0 {}", translator.translate("seconds", "timer"))
    } else {
        shown.join(" ")
    }
}

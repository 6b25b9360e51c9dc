//! Display ordering, share digest and reminder feed.
//!
//! Everything here is derived from a medication snapshot and an instant;
//! nothing is stored.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use super::history::Ledger;
use super::schedule::DoseStatus;
use super::Medication;

pub const SUMMARY_HEADER: &str = "📋 *My medication plan:*";
pub const SUMMARY_FOOTER: &str = "Sent from Pillbox";
pub const NO_UPCOMING_DOSE: &str = "--:--";

/// A medication together with everything derived from it at one instant.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ScheduledMedication {
    pub medication: Medication,
    pub next_dose: DateTime<Utc>,
    pub status: DoseStatus,
    pub finished: bool,
    pub progress_percent: f64,
    pub progress_label: String,
}

impl ScheduledMedication {
    pub fn derive(medication: Medication, now: DateTime<Utc>) -> Self {
        Self {
            next_dose: medication.next_dose_time(),
            status: medication.status(now),
            finished: medication.is_finished(now),
            progress_percent: medication.progress_percent(now),
            progress_label: medication.progress_label(now),
            medication,
        }
    }
}

/// Active medications by next dose, then finished ones.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct OrderedView {
    entries: Vec<ScheduledMedication>,
}

pub fn ordered_view(medications: &[Medication], now: DateTime<Utc>) -> OrderedView {
    let mut entries: Vec<_> = medications
        .iter()
        .cloned()
        .map(|medication| ScheduledMedication::derive(medication, now))
        .collect();

    // Stable: equal next doses keep input order.
    entries.sort_by(|a, b| {
        a.finished.cmp(&b.finished).then_with(|| {
            if a.finished {
                std::cmp::Ordering::Equal
            } else {
                a.next_dose.cmp(&b.next_dose)
            }
        })
    });

    OrderedView { entries }
}

impl OrderedView {
    pub fn entries(&self) -> &[ScheduledMedication] {
        &self.entries
    }

    pub fn active(&self) -> impl Iterator<Item = &ScheduledMedication> {
        self.entries.iter().filter(|e| !e.finished)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next dose of the first entry, unless the view is empty or only finished courses remain.
    pub fn next_upcoming_dose(&self) -> Option<DateTime<Utc>> {
        self.entries
            .first()
            .filter(|e| !e.finished)
            .map(|e| e.next_dose)
    }
}

/// Formatting knobs for text digests.
#[derive(Clone, Copy, Debug)]
pub struct SummaryOptions {
    pub offset: FixedOffset,
}

impl SummaryOptions {
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

fn clock_time(instant: DateTime<Utc>, offset: &FixedOffset) -> String {
    instant.with_timezone(offset).format("%H:%M").to_string()
}

/// Plain-text plan for sharing. Finished courses are left out.
pub fn summary_text(view: &OrderedView, options: &SummaryOptions) -> String {
    let mut text = format!("{SUMMARY_HEADER}\n\n");

    for entry in view.active() {
        let med = &entry.medication;
        let _ = writeln!(text, "💊 *{}* ({})", med.name, med.dosage);
        let _ = writeln!(text, "⏱️ Every {}h", med.frequency_hours);
        let _ = writeln!(text, "📅 Next: {}", clock_time(entry.next_dose, &options.offset));
        text.push('\n');
    }

    text.push_str(SUMMARY_FOOTER);
    text
}

pub fn next_dose_label(view: &OrderedView, offset: &FixedOffset) -> String {
    view.next_upcoming_dose()
        .map(|next| clock_time(next, offset))
        .unwrap_or_else(|| NO_UPCOMING_DOSE.to_string())
}

/// A dose a notification collaborator may want to announce.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Reminder {
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    pub due_at: DateTime<Utc>,
    pub status: DoseStatus,
}

/// Active medications that are late or due within the hour, in view order.
pub fn due_reminders(view: &OrderedView) -> Vec<Reminder> {
    view.active()
        .filter(|e| e.status.is_due())
        .map(|e| Reminder {
            medication_id: e.medication.id.clone(),
            name: e.medication.name.clone(),
            dosage: e.medication.dosage.clone(),
            due_at: e.next_dose,
            status: e.status,
        })
        .collect()
}

/// One line per taken dose, newest first.
pub fn history_text(ledger: &Ledger, offset: &FixedOffset) -> String {
    ledger
        .records()
        .map(|r| {
            format!(
                "{}  {} ({})",
                r.timestamp.with_timezone(offset).format("%-d %b %H:%M"),
                r.medication_name,
                r.dosage
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

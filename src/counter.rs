// Reset, uniqueness and increment rules for one counter record.
// Pure: the caller loads the record and saves it when `changed` is set.

use chrono::{DateTime, Duration, Utc};

use crate::config::ResetPolicy;
use crate::models::{CounterRecord, CounterResponse, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Increment,
}

// Result of running one request through the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub report: CounterResponse,
    pub reset: bool,
    pub changed: bool,
}

impl ResetPolicy {
    // never due when the clock went backwards, so last_reset only moves forward
    pub fn is_due(self, last_reset: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            ResetPolicy::Rolling => now - last_reset >= Duration::hours(24),
            ResetPolicy::CalendarDay => now.date_naive() > last_reset.date_naive(),
        }
    }
}

fn reset(record: &mut CounterRecord, now: DateTime<Utc>) {
    record.count = 0;
    record.unique_visitor_count = 0;
    record.views.clear();
    record.last_reset = now;
}

// reset first (both modes), then Increment records a view from `source`
pub fn apply(
    record: &mut CounterRecord,
    now: DateTime<Utc>,
    source: &str,
    mode: Mode,
    policy: ResetPolicy,
) -> Step {
    let due = policy.is_due(record.last_reset, now);
    if due {
        reset(record, now);
    }

    if mode == Mode::Increment {
        let seen = record.views.iter().any(|view| view.source == source);
        if !seen {
            record.unique_visitor_count += 1;
        }
        record.views.push(View {
            timestamp: now,
            source: source.to_string(),
        });
        record.count += 1;
    }

    Step {
        report: CounterResponse {
            count: record.count,
            unique_visitors: record.unique_visitor_count,
        },
        reset: due,
        changed: due || mode == Mode::Increment,
    }
}

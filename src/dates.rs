use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::DateRangeError;

/// Which half of the range the next tap picks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Start,
    End,
}

/// Calendar-day tag for rendering a picked range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMark {
    RangeStart,
    RangeEnd,
    InRange,
    /// Start and end on the same day: one combined boundary.
    SingleDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Two-phase date-range selection state machine, reused identically by every
/// calendar screen.
///
/// Invariant: `end`, whenever set, is never chronologically before `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRangeSelector {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    phase: Phase,
}

impl DateRangeSelector {
    pub fn new() -> Self {
        DateRangeSelector::default()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Applies one day tap. Rules, evaluated in order:
    /// 1. picking a start, or tapping earlier than a completed range's start,
    ///    restarts the range from that day;
    /// 2. tapping on or after the start completes the range;
    /// 3. fallback: with no start recorded, the tap becomes the start.
    pub fn tap_date(&mut self, day: NaiveDate) {
        let restarts_range = matches!((self.start, self.end), (Some(start), Some(_)) if day < start);
        if self.phase == Phase::Start || restarts_range {
            self.start = Some(day);
            self.end = None;
            self.phase = Phase::End;
            return;
        }

        if let Some(start) = self.start {
            if day >= start {
                self.end = Some(day);
                self.phase = Phase::Start;
            }
            return;
        }

        self.start = Some(day);
        self.end = None;
        self.phase = Phase::End;
    }

    /// Day tags for a completed range: boundary marks on the endpoints,
    /// in-range marks strictly between them, or one combined mark when the
    /// range is a single day. Empty until both ends are picked.
    pub fn markings(&self) -> BTreeMap<NaiveDate, DayMark> {
        let mut marks = BTreeMap::new();
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return marks;
        };

        if start == end {
            marks.insert(start, DayMark::SingleDay);
            return marks;
        }

        marks.insert(start, DayMark::RangeStart);
        marks.insert(end, DayMark::RangeEnd);
        let mut day = start.succ_opt();
        while let Some(current) = day {
            if current >= end {
                break;
            }
            marks.insert(current, DayMark::InRange);
            day = current.succ_opt();
        }
        marks
    }

    /// Copies the range out, or fails while either end is missing.
    pub fn confirm(&self) -> Result<ConfirmedRange, DateRangeError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(ConfirmedRange { start, end }),
            _ => Err(DateRangeError::IncompleteRange),
        }
    }

    pub fn clear(&mut self) {
        *self = DateRangeSelector::default();
    }
}

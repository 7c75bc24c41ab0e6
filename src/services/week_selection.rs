use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A stay can cover at most 12 weeks of the year.
pub const MAX_WEEKS: usize = 12;

/// A Monday-aligned calendar week, identified by its start date.
/// Two dates in the same calendar week normalize to the same `Week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week(NaiveDate);

impl Week {
    /// The week containing `date`, snapped back to Monday.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as i64;
        Week(date - Duration::days(offset))
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    /// Exclusive end of the week: the Monday after `start`.
    pub fn end(&self) -> NaiveDate {
        self.0 + Duration::days(7)
    }

    pub fn next(&self) -> Week {
        Week(self.0 + Duration::days(7))
    }

    pub fn prev(&self) -> Week {
        Week(self.0 - Duration::days(7))
    }

    /// The seven nights of the stay week, check-in day first.
    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.0;
        (0..7).map(move |d| start + Duration::days(d))
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Week {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let date = NaiveDate::deserialize(deserializer)?;
        Ok(Week::containing(date))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("only the first or last selected week can be removed")]
    InteriorWeek,
    #[error("a stay is limited to {MAX_WEEKS} weeks")]
    MaxWeeksExceeded,
    #[error("check-in and check-out must bound whole weeks starting on Monday")]
    MisalignedBounds,
    #[error("selected weeks must form one ascending contiguous run")]
    NonContiguous,
}

/// The contiguous run of selected weeks, sorted ascending.
///
/// Mutation goes through `toggle`, which returns the next range without
/// touching `self`; rejected toggles leave the caller's range intact so the
/// UI can keep showing the last valid state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectedRange {
    weeks: Vec<Week>,
}

// Every constructor upholds the invariants, so deserialization has to
// validate rather than derive.
impl<'de> Deserialize<'de> for SelectedRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            weeks: Vec<Week>,
        }
        let raw = Raw::deserialize(deserializer)?;
        SelectedRange::from_weeks(raw.weeks).map_err(serde::de::Error::custom)
    }
}

impl SelectedRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an already-built week list only if it is what `toggle` could
    /// have produced: ascending, contiguous, and within capacity.
    pub fn from_weeks(weeks: Vec<Week>) -> Result<Self, SelectionError> {
        if weeks.len() > MAX_WEEKS {
            return Err(SelectionError::MaxWeeksExceeded);
        }
        if weeks.windows(2).any(|pair| pair[0].next() != pair[1]) {
            return Err(SelectionError::NonContiguous);
        }
        Ok(Self { weeks })
    }

    /// Rebuild a range from booking bounds: `check_in` on a Monday,
    /// `check_out` the Monday after the final week.
    pub fn from_bounds(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, SelectionError> {
        if Week::containing(check_in).start() != check_in {
            return Err(SelectionError::MisalignedBounds);
        }
        let nights = (check_out - check_in).num_days();
        if nights <= 0 || nights % 7 != 0 {
            return Err(SelectionError::MisalignedBounds);
        }
        let count = (nights / 7) as usize;
        if count > MAX_WEEKS {
            return Err(SelectionError::MaxWeeksExceeded);
        }
        let first = Week::containing(check_in);
        let last = Week(check_out - Duration::days(7));
        Ok(Self {
            weeks: Self::span(first, last),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    pub fn first(&self) -> Option<Week> {
        self.weeks.first().copied()
    }

    pub fn last(&self) -> Option<Week> {
        self.weeks.last().copied()
    }

    pub fn contains(&self, week: Week) -> bool {
        self.weeks.contains(&week)
    }

    /// Whether `week` is the first or last selected week.
    pub fn is_edge(&self, week: Week) -> bool {
        self.first() == Some(week) || self.last() == Some(week)
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.first().map(|w| w.start())
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.last().map(|w| w.end())
    }

    /// Apply one selection click. Edges shrink, outside weeks extend the
    /// range contiguously, interior clicks and over-capacity extensions are
    /// rejected without mutating anything.
    pub fn toggle(&self, week: Week) -> Result<SelectedRange, SelectionError> {
        if self.contains(week) {
            if !self.is_edge(week) {
                return Err(SelectionError::InteriorWeek);
            }
            let mut weeks = self.weeks.clone();
            if self.first() == Some(week) {
                weeks.remove(0);
            } else {
                weeks.pop();
            }
            return Ok(SelectedRange { weeks });
        }

        if self.weeks.is_empty() {
            return Ok(SelectedRange { weeks: vec![week] });
        }

        let first = self.weeks[0];
        let last = *self.weeks.last().unwrap();

        let (start, end) = if week < first {
            (week, last)
        } else if week > last {
            (first, week)
        } else {
            // A contiguous range has no unselected interior weeks, but the
            // contract is explicit: inside-but-unselected is a rejection.
            return Err(SelectionError::InteriorWeek);
        };

        let candidate = Self::span(start, end);
        if candidate.len() > MAX_WEEKS {
            return Err(SelectionError::MaxWeeksExceeded);
        }
        Ok(SelectedRange { weeks: candidate })
    }

    /// Reset after a successful booking or an explicit clear action.
    pub fn clear(&mut self) {
        self.weeks.clear();
    }

    fn span(start: Week, end: Week) -> Vec<Week> {
        let mut weeks = Vec::new();
        let mut current = start;
        while current <= end {
            weeks.push(current);
            current = current.next();
        }
        weeks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(year: i32, month: u32, day: u32) -> Week {
        Week::containing(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    fn assert_contiguous(range: &SelectedRange) {
        for pair in range.weeks().windows(2) {
            assert_eq!(pair[0].next(), pair[1]);
        }
        assert!(range.len() <= MAX_WEEKS);
    }

    #[test]
    fn dates_normalize_to_monday() {
        // 2024-04-03 is a Wednesday; its week starts 2024-04-01.
        let w = week(2024, 4, 3);
        assert_eq!(w.start(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(w, week(2024, 4, 1));
        assert_eq!(w, week(2024, 4, 7));
        assert_ne!(w, week(2024, 4, 8));
    }

    #[test]
    fn first_toggle_selects_single_week() {
        let range = SelectedRange::new().toggle(week(2024, 4, 1)).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.check_in(), NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(range.check_out(), NaiveDate::from_ymd_opt(2024, 4, 8));
    }

    #[test]
    fn extending_past_last_fills_gap() {
        let range = SelectedRange::new().toggle(week(2024, 4, 1)).unwrap();
        // Jump three weeks ahead; the two weeks in between get selected too.
        let range = range.toggle(week(2024, 4, 22)).unwrap();
        assert_eq!(range.len(), 4);
        assert_contiguous(&range);
    }

    #[test]
    fn extending_before_first_fills_gap() {
        let range = SelectedRange::new().toggle(week(2024, 4, 22)).unwrap();
        let range = range.toggle(week(2024, 4, 1)).unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range.first(), Some(week(2024, 4, 1)));
        assert_eq!(range.last(), Some(week(2024, 4, 22)));
        assert_contiguous(&range);
    }

    #[test]
    fn interior_toggle_is_rejected() {
        let range = SelectedRange::new()
            .toggle(week(2024, 4, 1))
            .unwrap()
            .toggle(week(2024, 4, 22))
            .unwrap();
        let before = range.clone();
        assert_eq!(range.toggle(week(2024, 4, 8)), Err(SelectionError::InteriorWeek));
        assert_eq!(range, before);
    }

    #[test]
    fn edge_toggle_shrinks_from_that_side() {
        let range = SelectedRange::new()
            .toggle(week(2024, 4, 1))
            .unwrap()
            .toggle(week(2024, 4, 15))
            .unwrap();
        let shrunk = range.toggle(week(2024, 4, 1)).unwrap();
        assert_eq!(shrunk.first(), Some(week(2024, 4, 8)));
        assert_eq!(shrunk.len(), 2);

        let shrunk = range.toggle(week(2024, 4, 15)).unwrap();
        assert_eq!(shrunk.last(), Some(week(2024, 4, 8)));
        assert_eq!(shrunk.len(), 2);
    }

    #[test]
    fn twelve_extensions_fill_then_thirteenth_rejects() {
        let mut range = SelectedRange::new();
        let mut w = week(2024, 1, 1);
        for i in 1..=MAX_WEEKS {
            range = range.toggle(w).unwrap();
            assert_eq!(range.len(), i);
            assert_contiguous(&range);
            w = w.next();
        }
        assert_eq!(range.len(), 12);
        let before = range.clone();
        assert_eq!(range.toggle(w), Err(SelectionError::MaxWeeksExceeded));
        assert_eq!(range, before);
    }

    #[test]
    fn over_capacity_jump_is_rejected_not_clamped() {
        let range = SelectedRange::new().toggle(week(2024, 1, 1)).unwrap();
        // Thirteen weeks away in one click.
        let far = week(2024, 1, 1).start() + Duration::days(7 * 13);
        assert_eq!(
            range.toggle(Week::containing(far)),
            Err(SelectionError::MaxWeeksExceeded)
        );
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn shrink_to_empty_and_reselect() {
        let mut range = SelectedRange::new().toggle(week(2024, 4, 1)).unwrap();
        range = range.toggle(week(2024, 4, 1)).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.check_in(), None);
        assert_eq!(range.check_out(), None);
        range = range.toggle(week(2024, 6, 3)).unwrap();
        assert_eq!(range.len(), 1);
        range.clear();
        assert!(range.is_empty());
    }

    #[test]
    fn from_bounds_roundtrips_selection() {
        let range = SelectedRange::new()
            .toggle(week(2024, 4, 1))
            .unwrap()
            .toggle(week(2024, 4, 15))
            .unwrap();
        let rebuilt =
            SelectedRange::from_bounds(range.check_in().unwrap(), range.check_out().unwrap())
                .unwrap();
        assert_eq!(rebuilt, range);
    }

    #[test]
    fn from_bounds_rejects_misaligned_dates() {
        // Tuesday check-in
        let tue = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let out = NaiveDate::from_ymd_opt(2024, 4, 9).unwrap();
        assert_eq!(
            SelectedRange::from_bounds(tue, out),
            Err(SelectionError::MisalignedBounds)
        );

        // Partial week
        let mon = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let thu = NaiveDate::from_ymd_opt(2024, 4, 4).unwrap();
        assert_eq!(
            SelectedRange::from_bounds(mon, thu),
            Err(SelectionError::MisalignedBounds)
        );

        // Empty range
        assert_eq!(
            SelectedRange::from_bounds(mon, mon),
            Err(SelectionError::MisalignedBounds)
        );
    }

    #[test]
    fn deserialization_upholds_the_range_invariants() {
        let range = SelectedRange::new()
            .toggle(week(2024, 4, 1))
            .unwrap()
            .toggle(week(2024, 4, 15))
            .unwrap();
        let json = serde_json::to_string(&range).unwrap();
        let parsed: SelectedRange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, range);

        // A gap in the run is rejected.
        let gap = r#"{"weeks":["2024-04-01","2024-04-15"]}"#;
        assert!(serde_json::from_str::<SelectedRange>(gap).is_err());

        // Descending order is rejected.
        let descending = r#"{"weeks":["2024-04-08","2024-04-01"]}"#;
        assert!(serde_json::from_str::<SelectedRange>(descending).is_err());

        // Thirteen contiguous weeks are rejected.
        let mut weeks = Vec::new();
        let mut w = week(2024, 1, 1);
        for _ in 0..13 {
            weeks.push(w);
            w = w.next();
        }
        let over = serde_json::to_string(&serde_json::json!({ "weeks": weeks.clone() })).unwrap();
        assert!(serde_json::from_str::<SelectedRange>(&over).is_err());
        assert_eq!(
            SelectedRange::from_weeks(weeks),
            Err(SelectionError::MaxWeeksExceeded)
        );
    }

    #[test]
    fn from_weeks_accepts_what_toggle_could_build() {
        let weeks = vec![week(2024, 4, 1), week(2024, 4, 8), week(2024, 4, 15)];
        let range = SelectedRange::from_weeks(weeks).unwrap();
        assert_eq!(range.len(), 3);
        assert!(SelectedRange::from_weeks(vec![]).unwrap().is_empty());
        assert_eq!(
            SelectedRange::from_weeks(vec![week(2024, 4, 1), week(2024, 4, 1)]),
            Err(SelectionError::NonContiguous)
        );
    }

    #[test]
    fn from_bounds_rejects_over_capacity() {
        let mon = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let out = mon + Duration::days(7 * 13);
        assert_eq!(
            SelectedRange::from_bounds(mon, out),
            Err(SelectionError::MaxWeeksExceeded)
        );
    }
}

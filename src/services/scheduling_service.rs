use chrono::NaiveDate;

use crate::models::scheduling::SchedulingRule;

pub struct SchedulingService;

impl SchedulingService {
    /// The rule governing `date`, resolved over the loaded rule set.
    /// A rule that names the date in `blocked_dates` wins outright;
    /// otherwise blocked rules beat rules with custom arrival/departure
    /// days, which beat the rest, latest created first.
    pub fn effective_rule(rules: &[SchedulingRule], date: NaiveDate) -> Option<&SchedulingRule> {
        if let Some(rule) = rules
            .iter()
            .find(|r| Self::covers(r, date) && r.blocked_dates.contains(&date))
        {
            return Some(rule);
        }

        let mut applicable: Vec<&SchedulingRule> =
            rules.iter().filter(|r| Self::covers(r, date)).collect();
        applicable.sort_by(|a, b| {
            b.is_blocked
                .cmp(&a.is_blocked)
                .then_with(|| Self::has_custom_days(b).cmp(&Self::has_custom_days(a)))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        applicable.first().copied()
    }

    pub fn is_date_blocked(rules: &[SchedulingRule], date: NaiveDate) -> bool {
        match Self::effective_rule(rules, date) {
            Some(rule) => rule.is_blocked || rule.blocked_dates.contains(&date),
            None => false,
        }
    }

    /// Arrival/departure weekday names pinned for `date`, if any.
    pub fn arrival_departure_for(
        rules: &[SchedulingRule],
        date: NaiveDate,
    ) -> (Option<String>, Option<String>) {
        match Self::effective_rule(rules, date) {
            Some(rule) if !rule.is_blocked => {
                (rule.arrival_day.clone(), rule.departure_day.clone())
            }
            _ => (None, None),
        }
    }

    fn covers(rule: &SchedulingRule, date: NaiveDate) -> bool {
        rule.start_date <= date && date <= rule.end_date
    }

    fn has_custom_days(rule: &SchedulingRule) -> bool {
        rule.arrival_day.is_some() || rule.departure_day.is_some()
    }
}

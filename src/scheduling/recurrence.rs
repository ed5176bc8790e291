//! Recurring visit date generation.
//!
//! Pure expansion of a validated recurrence rule into an ordered sequence of
//! wall-clock visit date-times. No I/O: the orchestrator converts the result
//! into absolute instants and builds booking records from it.
//!
//! Two generation modes exist. Weekly rules with a usable per-day schedule
//! expand week by week from the schedule's enabled days; everything else
//! (daily, monthly, weekly without per-day times) expands by day index with
//! an optional visits-per-day multiplier.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::domain::series::{CreateSeriesInput, DaySchedule, Frequency};
use crate::error::ApiError;

/// Minutes between same-day visits when the rule does not set its own interval
const DEFAULT_TIME_INTERVAL_MINUTES: u32 = 60;

/// A weekday with its parsed visit times, from a validated `DaySchedule`
#[derive(Debug, Clone)]
struct ScheduledDay {
    day_of_week: u8,
    times: Vec<NaiveTime>,
}

/// Shape of a weekly rule, decided once at rule construction
#[derive(Debug, Clone)]
enum WeeklyPattern {
    /// Enabled weekdays with explicit per-day visit times
    PerDaySchedule(Vec<ScheduledDay>),
    /// Weekday ordinals (0 = Sunday) cycled by day index
    PreferredDays(Vec<u8>),
    /// Plain 7-day stride from the start date
    Unconstrained,
}

/// A validated recurrence rule ready for expansion
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    frequency: Frequency,
    start_date: NaiveDate,
    base_time: NaiveTime,
    number_of_visits: u32,
    visits_per_day: u32,
    time_interval_minutes: u32,
    weekly: WeeklyPattern,
    /// Days of month for monthly rules; empty means "same day as start"
    month_days: Vec<u8>,
}

impl RecurrenceRule {
    /// Validate a series request into a rule. All rule problems surface
    /// here, before anything is written.
    pub fn from_series_input(input: &CreateSeriesInput) -> Result<Self, ApiError> {
        if input.number_of_visits == 0 {
            return Err(ApiError::invalid_rule("number_of_visits must be at least 1"));
        }

        let visits_per_day = input.visits_per_day.unwrap_or(1);
        if visits_per_day == 0 {
            return Err(ApiError::invalid_rule("visits_per_day must be at least 1"));
        }

        let base_time = parse_visit_time(&input.preferred_time)?;
        let preferred_days = input.preferred_days.clone().unwrap_or_default();

        let (weekly, month_days) = match input.frequency {
            Frequency::Weekly => {
                if let Some(&bad) = preferred_days.iter().find(|&&d| d > 6) {
                    return Err(ApiError::invalid_rule(format!(
                        "weekday ordinal {bad} out of range 0-6"
                    )));
                }
                let weekly = match &input.day_schedules {
                    Some(schedules) if !schedules.is_empty() => {
                        let days = validate_day_schedules(schedules)?;
                        if days.is_empty() {
                            // Every entry disabled: the per-day schedule cannot
                            // yield a single visit, so generate from the
                            // preferred-day list instead.
                            weekly_from_preferred(preferred_days)
                        } else {
                            WeeklyPattern::PerDaySchedule(days)
                        }
                    }
                    _ => weekly_from_preferred(preferred_days),
                };
                (weekly, Vec::new())
            }
            Frequency::Monthly => {
                if let Some(&bad) = preferred_days.iter().find(|&&d| !(1..=31).contains(&d)) {
                    return Err(ApiError::invalid_rule(format!(
                        "day of month {bad} out of range 1-31"
                    )));
                }
                (WeeklyPattern::Unconstrained, preferred_days)
            }
            Frequency::Daily => (WeeklyPattern::Unconstrained, Vec::new()),
        };

        Ok(Self {
            frequency: input.frequency,
            start_date: input.start_date,
            base_time,
            number_of_visits: input.number_of_visits,
            visits_per_day,
            time_interval_minutes: input
                .time_interval_minutes
                .unwrap_or(DEFAULT_TIME_INTERVAL_MINUTES),
            weekly,
            month_days,
        })
    }

    /// Expand the rule into visit date-times, sorted ascending. Exactly
    /// `number_of_visits` long; a degenerate rule reports its shortfall
    /// instead of padding or truncating.
    pub fn generate(&self) -> Result<Vec<NaiveDateTime>, ApiError> {
        let mut visits = match &self.weekly {
            WeeklyPattern::PerDaySchedule(days) => self.generate_per_day(days),
            _ => self.generate_indexed()?,
        };

        if visits.is_empty() {
            visits = self.generate_indexed()?;
        }

        visits.sort();

        if visits.len() != self.number_of_visits as usize {
            return Err(ApiError::invalid_rule(format!(
                "rule produced {} of {} requested visits",
                visits.len(),
                self.number_of_visits
            )));
        }

        Ok(visits)
    }

    /// Weekly template expansion: each enabled day recurs every week from
    /// its first occurrence on or after the start date.
    fn generate_per_day(&self, days: &[ScheduledDay]) -> Vec<NaiveDateTime> {
        let target = self.number_of_visits as usize;
        let visits_per_week: usize = days.iter().map(|d| d.times.len()).sum();
        if visits_per_week == 0 {
            // Nothing to expand; the caller falls through to index mode
            return Vec::new();
        }
        // Runaway guard: one spare week beyond the arithmetic minimum
        let max_weeks = target.div_ceil(visits_per_week) + 1;

        let mut out = Vec::with_capacity(target);
        'weeks: for week in 0..max_weeks {
            let week_anchor = self.start_date + Duration::days(7 * week as i64);
            for day in days {
                let date = weekday_on_or_after(week_anchor, day.day_of_week);
                for &time in &day.times {
                    if out.len() == target {
                        break 'weeks;
                    }
                    out.push(date.and_time(time));
                }
            }
        }
        out
    }

    /// Index expansion: `visits_per_day` visits on each of
    /// `ceil(n / visits_per_day)` unique days.
    fn generate_indexed(&self) -> Result<Vec<NaiveDateTime>, ApiError> {
        let target = self.number_of_visits as usize;
        let per_day = self.visits_per_day as usize;
        let unique_days = target.div_ceil(per_day);

        let mut out = Vec::with_capacity(target);
        'days: for day_index in 0..unique_days {
            let date = self.indexed_date(day_index)?;
            for visit in 0..per_day {
                if out.len() == target {
                    break 'days;
                }
                out.push(date.and_time(self.visit_time(visit)?));
            }
        }
        Ok(out)
    }

    fn indexed_date(&self, day_index: usize) -> Result<NaiveDate, ApiError> {
        match self.frequency {
            Frequency::Daily => Ok(self.start_date + Duration::days(day_index as i64)),
            Frequency::Weekly => match &self.weekly {
                WeeklyPattern::PreferredDays(days) => {
                    let k = days.len();
                    let week_offset = (day_index / k) as i64;
                    let weekday = days[day_index % k];
                    Ok(weekday_on_or_after(
                        self.start_date + Duration::days(7 * week_offset),
                        weekday,
                    ))
                }
                _ => Ok(self.start_date + Duration::days(7 * day_index as i64)),
            },
            Frequency::Monthly => {
                if self.month_days.is_empty() {
                    add_months_clamped(self.start_date, day_index as u32, self.start_date.day())
                } else {
                    let k = self.month_days.len();
                    let month_offset = (day_index / k) as u32;
                    let day_of_month = self.month_days[day_index % k] as u32;
                    add_months_clamped(self.start_date, month_offset, day_of_month)
                }
            }
        }
    }

    /// Wall-clock time of the Nth same-day visit. Minute overflow rolls into
    /// the hour; a rule whose visits would pass midnight is malformed.
    fn visit_time(&self, visit_index: usize) -> Result<NaiveTime, ApiError> {
        let minutes = self.base_time.hour() as usize * 60
            + self.base_time.minute() as usize
            + visit_index * self.time_interval_minutes as usize;
        let (hour, minute) = (minutes / 60, minutes % 60);
        if hour > 23 {
            return Err(ApiError::invalid_rule(
                "same-day visit times extend past midnight",
            ));
        }
        NaiveTime::from_hms_opt(hour as u32, minute as u32, 0)
            .ok_or_else(|| ApiError::invalid_rule("invalid visit time"))
    }
}

fn weekly_from_preferred(days: Vec<u8>) -> WeeklyPattern {
    if days.is_empty() {
        WeeklyPattern::Unconstrained
    } else {
        WeeklyPattern::PreferredDays(days)
    }
}

fn validate_day_schedules(schedules: &[DaySchedule]) -> Result<Vec<ScheduledDay>, ApiError> {
    let mut days = Vec::new();
    for schedule in schedules {
        if schedule.day_of_week > 6 {
            return Err(ApiError::invalid_rule(format!(
                "day_of_week {} out of range 0-6",
                schedule.day_of_week
            )));
        }
        if !schedule.enabled {
            continue;
        }
        if !(1..=2).contains(&schedule.number_of_visits) {
            return Err(ApiError::invalid_rule(format!(
                "day {} must have 1 or 2 visits, got {}",
                schedule.day_of_week, schedule.number_of_visits
            )));
        }
        if schedule.visit_times.len() != schedule.number_of_visits as usize {
            return Err(ApiError::invalid_rule(format!(
                "day {} expects {} visit times, got {}",
                schedule.day_of_week,
                schedule.number_of_visits,
                schedule.visit_times.len()
            )));
        }
        let times = schedule
            .visit_times
            .iter()
            .map(|t| parse_visit_time(t))
            .collect::<Result<Vec<_>, _>>()?;
        days.push(ScheduledDay {
            day_of_week: schedule.day_of_week,
            times,
        });
    }
    days.sort_by_key(|d| d.day_of_week);
    Ok(days)
}

fn parse_visit_time(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ApiError::invalid_rule(format!("invalid time '{value}', expected HH:MM")))
}

/// First occurrence of `day_of_week` (0 = Sunday) on or after `anchor`
fn weekday_on_or_after(anchor: NaiveDate, day_of_week: u8) -> NaiveDate {
    let current = anchor.weekday().num_days_from_sunday() as i64;
    let ahead = (day_of_week as i64 - current).rem_euclid(7);
    anchor + Duration::days(ahead)
}

/// Shift `start` forward by whole months, substituting `day_of_month`
/// clamped to the last valid day of the target month.
fn add_months_clamped(
    start: NaiveDate,
    months: u32,
    day_of_month: u32,
) -> Result<NaiveDate, ApiError> {
    let total = start.year() * 12 + start.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = day_of_month.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ApiError::invalid_rule("generated date out of calendar range"))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

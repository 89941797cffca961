//! Reading-progress arithmetic: percentages, daily rates and completion-date
//! projections.
//!
//! Every day count is inclusive: a period that starts and ends on the same
//! date is one reading day. Callers pass `today` explicitly.
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::{days_between, tomorrow};
use crate::error::{Result, TrackerError};
use crate::models::ReadingRecord;

pub const DEFAULT_PAGES_PER_HOUR: u32 = 44;
pub const DEFAULT_SESSION_MINUTES: [u32; 3] = [15, 30, 60];

/// Percentage of the book read, rounded half-up, or `None` if reading has
/// not started.
pub fn compute_progress(pages_read: Option<u32>, pages_total: u32) -> Result<Option<u8>> {
    if pages_total == 0 {
        return Err(TrackerError::InvalidPageCount(pages_total));
    }
    let Some(read) = pages_read else {
        return Ok(None);
    };
    if read > pages_total {
        return Err(TrackerError::PageOutOfRange { page: read, pages: pages_total });
    }

    let (read, total) = (u64::from(read), u64::from(pages_total));
    let percent = (read * 200 + total) / (total * 2);
    Ok(Some(percent as u8))
}

/// Pages per day over `start..=end`.
pub fn compute_rate(start: NaiveDate, end: NaiveDate, pages: u32) -> Result<f64> {
    let days = days_between(start, end) + 1;
    if days <= 0 {
        return Err(TrackerError::EmptyPeriod { start, end });
    }
    Ok(f64::from(pages) / days as f64)
}

/// Date on which `pages_left` pages are finished at `daily_rate`.
///
/// A partial day counts as a whole one; an exact quotient adds nothing extra.
pub fn project_completion_date(pages_left: u32, daily_rate: f64, today: NaiveDate) -> Result<NaiveDate> {
    if !daily_rate.is_finite() || daily_rate <= 0.0 {
        return Err(TrackerError::NonPositiveRate(daily_rate));
    }

    let days = f64::from(pages_left) / daily_rate;
    let whole = if days.fract() == 0.0 { days } else { days.floor() + 1.0 };

    today
        .checked_add_days(Days::new(whole as u64))
        .ok_or_else(|| TrackerError::Validation(format!("{pages_left} pages at {daily_rate}/day never finish")))
}

/// Lifetime pages per day since the first history entry began, rounded.
/// Zero when there is no history.
pub fn average_rate(total_pages: u64, earliest_start: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(earliest) = earliest_start else {
        return 0;
    };
    let days = (days_between(earliest, today) + 1).max(1);
    (total_pages as f64 / days as f64).round() as u32
}

// ─── Target dates ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    Unset,
    /// The target is today or already past and must be cleared.
    Expired { target: NaiveDate },
    Active { target: NaiveDate, required_rate: f64 },
}

/// Pace needed from tomorrow through the target date inclusive.
pub fn assess_target(target: Option<NaiveDate>, pages_left: u32, today: NaiveDate) -> Result<TargetStatus> {
    let Some(target) = target else {
        return Ok(TargetStatus::Unset);
    };
    let tomorrow = tomorrow(today);
    if target < tomorrow {
        return Ok(TargetStatus::Expired { target });
    }
    let required_rate = compute_rate(tomorrow, target, pages_left)?;
    Ok(TargetStatus::Active { target, required_rate })
}

// ─── Fixed reading sessions ────────────────────────────────

/// A daily reading habit expressed as minutes per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRate {
    pub minutes: u32,
    pub pages_per_day: f64,
}

/// 15/30/60 minutes at 44 pages an hour are 11, 22 and 44 pages a day.
pub fn fixed_rates(pages_per_hour: u32, session_minutes: &[u32]) -> Vec<FixedRate> {
    session_minutes
        .iter()
        .map(|&minutes| FixedRate {
            minutes,
            pages_per_day: f64::from(pages_per_hour) * f64::from(minutes) / 60.0,
        })
        .collect()
}

// ─── Dashboard ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub daily_rate: f64,
    /// `None` when the rate is zero and the book would never be finished.
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedRateProjection {
    pub minutes: u32,
    pub pages_per_day: f64,
    pub completion_date: NaiveDate,
}

/// Everything shown for a single current book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDashboard {
    pub record: ReadingRecord,
    pub progress: Option<u8>,
    pub pages_left: u32,
    /// Pace so far, once reading has started.
    pub current: Option<Projection>,
    pub target: TargetStatus,
    pub fixed: Vec<FixedRateProjection>,
    /// Earliest date a new target may be set to.
    pub earliest_target: NaiveDate,
    /// Set when an expired target was cleared while building this view.
    pub target_reset: bool,
}

impl BookDashboard {
    pub fn build(record: ReadingRecord, today: NaiveDate, rates: &[FixedRate]) -> Result<Self> {
        let progress = compute_progress(record.pages_read(), record.book.pages)?;
        let pages_left = record.pages_left();

        let current = match record.start_date {
            Some(start) => {
                let daily_rate = compute_rate(start, today, record.page.unwrap_or(0))?;
                let completion_date = if daily_rate > 0.0 {
                    Some(project_completion_date(pages_left, daily_rate, today)?)
                } else {
                    None
                };
                Some(Projection { daily_rate, completion_date })
            }
            None => None,
        };

        let target = assess_target(record.target_date, pages_left, today)?;

        let fixed = rates
            .iter()
            .map(|rate| {
                Ok(FixedRateProjection {
                    minutes: rate.minutes,
                    pages_per_day: rate.pages_per_day,
                    completion_date: project_completion_date(pages_left, rate.pages_per_day, today)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            record,
            progress,
            pages_left,
            current,
            target,
            fixed,
            earliest_target: tomorrow(today),
            target_reset: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isbn::Isbn13;
    use crate::models::{Book, BookId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2020, 8, 15)
    }

    fn record(pages: u32, page: Option<u32>, start: Option<NaiveDate>, target: Option<NaiveDate>) -> ReadingRecord {
        ReadingRecord {
            book: Book {
                id: BookId(7),
                title: "Middlemarch".into(),
                author: "George Eliot".into(),
                pages,
                isbn: Isbn13::parse("9780141439549").unwrap(),
            },
            page,
            start_date: start,
            target_date: target,
        }
    }

    #[test]
    fn test_progress_not_started() {
        assert_eq!(compute_progress(None, 100).unwrap(), None);
    }

    #[test]
    fn test_progress_started_on_page_zero() {
        assert_eq!(compute_progress(Some(0), 100).unwrap(), Some(0));
    }

    #[test]
    fn test_progress_values() {
        assert_eq!(compute_progress(Some(50), 200).unwrap(), Some(25));
        assert_eq!(compute_progress(Some(1), 8).unwrap(), Some(13)); // 12.5 rounds up
        assert_eq!(compute_progress(Some(1), 3).unwrap(), Some(33));
        assert_eq!(compute_progress(Some(2), 3).unwrap(), Some(67));
        assert_eq!(compute_progress(Some(200), 200).unwrap(), Some(100));
    }

    #[test]
    fn test_progress_preconditions() {
        assert!(matches!(compute_progress(Some(1), 0), Err(TrackerError::InvalidPageCount(0))));
        assert!(matches!(compute_progress(None, 0), Err(TrackerError::InvalidPageCount(0))));
        assert!(matches!(
            compute_progress(Some(201), 200),
            Err(TrackerError::PageOutOfRange { page: 201, pages: 200 })
        ));
    }

    #[test]
    fn test_rate_counts_both_endpoints() {
        assert_eq!(compute_rate(date(2020, 1, 1), date(2020, 1, 10), 100).unwrap(), 10.0);
        assert_eq!(compute_rate(today(), today(), 30).unwrap(), 30.0);
    }

    #[test]
    fn test_rate_empty_period() {
        assert!(matches!(
            compute_rate(date(2020, 1, 10), date(2020, 1, 8), 100),
            Err(TrackerError::EmptyPeriod { .. })
        ));
    }

    #[test]
    fn test_projection_rounds_partial_days_up() {
        let t = today();
        assert_eq!(project_completion_date(100, 44.0, t).unwrap(), date(2020, 8, 18));
    }

    #[test]
    fn test_projection_exact_quotient() {
        let t = today();
        assert_eq!(project_completion_date(88, 44.0, t).unwrap(), date(2020, 8, 17));
        assert_eq!(project_completion_date(0, 11.0, t).unwrap(), t);
    }

    #[test]
    fn test_projection_rejects_non_positive_rate() {
        assert!(matches!(project_completion_date(10, 0.0, today()), Err(TrackerError::NonPositiveRate(_))));
        assert!(matches!(project_completion_date(10, -2.0, today()), Err(TrackerError::NonPositiveRate(_))));
        assert!(project_completion_date(10, f64::NAN, today()).is_err());
    }

    #[test]
    fn test_average_rate() {
        assert_eq!(average_rate(0, None, today()), 0);
        assert_eq!(average_rate(500, None, today()), 0);
        // 2020-08-06..=2020-08-15 is ten days
        assert_eq!(average_rate(255, Some(date(2020, 8, 6)), today()), 26);
        assert_eq!(average_rate(254, Some(date(2020, 8, 6)), today()), 25);
    }

    #[test]
    fn test_target_expired_when_before_tomorrow() {
        let t = today();
        assert_eq!(assess_target(Some(t), 100, t).unwrap(), TargetStatus::Expired { target: t });
        assert_eq!(
            assess_target(Some(date(2020, 8, 1)), 100, t).unwrap(),
            TargetStatus::Expired { target: date(2020, 8, 1) }
        );
        assert_eq!(assess_target(None, 100, t).unwrap(), TargetStatus::Unset);
    }

    #[test]
    fn test_target_required_rate() {
        // tomorrow (16th) through the 25th is ten days
        let status = assess_target(Some(date(2020, 8, 25)), 100, today()).unwrap();
        assert_eq!(status, TargetStatus::Active { target: date(2020, 8, 25), required_rate: 10.0 });

        let status = assess_target(Some(date(2020, 8, 16)), 30, today()).unwrap();
        assert_eq!(status, TargetStatus::Active { target: date(2020, 8, 16), required_rate: 30.0 });
    }

    #[test]
    fn test_fixed_rates_default() {
        let rates = fixed_rates(DEFAULT_PAGES_PER_HOUR, &DEFAULT_SESSION_MINUTES);
        let pages: Vec<f64> = rates.iter().map(|r| r.pages_per_day).collect();
        assert_eq!(pages, vec![11.0, 22.0, 44.0]);
    }

    #[test]
    fn test_dashboard_not_started() {
        let rates = fixed_rates(DEFAULT_PAGES_PER_HOUR, &DEFAULT_SESSION_MINUTES);
        let dash = BookDashboard::build(record(88, None, None, None), today(), &rates).unwrap();
        assert_eq!(dash.progress, None);
        assert_eq!(dash.current, None);
        assert_eq!(dash.target, TargetStatus::Unset);
        assert_eq!(dash.pages_left, 88);
        let dates: Vec<NaiveDate> = dash.fixed.iter().map(|f| f.completion_date).collect();
        assert_eq!(dates, vec![date(2020, 8, 23), date(2020, 8, 19), date(2020, 8, 17)]);
        assert_eq!(dash.earliest_target, date(2020, 8, 16));
        assert!(!dash.target_reset);
    }

    #[test]
    fn test_dashboard_in_progress() {
        let rates = fixed_rates(DEFAULT_PAGES_PER_HOUR, &DEFAULT_SESSION_MINUTES);
        // ten days in, 100 of 200 pages: 10/day, 100 left => 10 more days
        let rec = record(200, Some(100), Some(date(2020, 8, 6)), Some(date(2020, 8, 20)));
        let dash = BookDashboard::build(rec, today(), &rates).unwrap();
        assert_eq!(dash.progress, Some(50));
        assert_eq!(
            dash.current,
            Some(Projection { daily_rate: 10.0, completion_date: Some(date(2020, 8, 25)) })
        );
        assert_eq!(dash.target, TargetStatus::Active { target: date(2020, 8, 20), required_rate: 20.0 });
    }

    #[test]
    fn test_dashboard_started_without_pages_has_no_completion() {
        let rec = record(200, Some(0), Some(today()), None);
        let dash = BookDashboard::build(rec, today(), &[]).unwrap();
        assert_eq!(dash.progress, Some(0));
        assert_eq!(dash.current, Some(Projection { daily_rate: 0.0, completion_date: None }));
        assert!(dash.fixed.is_empty());
    }
}

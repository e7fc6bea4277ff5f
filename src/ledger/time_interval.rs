use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single calendar month, addressed with a 1-based month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthWindow {
    year: i32,
    month: u32,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && NaiveDate::from_ymd_opt(year, month, 1).is_some() {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(input: &str) -> Option<Self> {
        let (year, month) = input.trim().split_once('-')?;
        let year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months elapsed since year 0, usable for signed month differences.
    pub fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn start(&self) -> NaiveDate {
        first_of_month(self.year, self.month)
    }

    pub fn end(&self) -> NaiveDate {
        self.start() + Duration::days(self.len_days() as i64 - 1)
    }

    pub fn len_days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The date in this month carrying `day`, clamped to the last day of the month.
    pub fn clamped_day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.len_days());
        self.start() + Duration::days(day as i64 - 1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Signed number of months from `from` to `to`.
pub fn month_difference(from: MonthWindow, to: MonthWindow) -> i64 {
    to.index() - from.index()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_next) => (first_next - Duration::days(1)).day(),
        None => 31,
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(MonthWindow::new(2024, 0).is_none());
        assert!(MonthWindow::new(2024, 13).is_none());
        assert!(MonthWindow::new(2024, 12).is_some());
    }

    #[test]
    fn clamps_day_to_month_length() {
        let feb_leap = MonthWindow::new(2024, 2).unwrap();
        let feb = MonthWindow::new(2023, 2).unwrap();
        assert_eq!(feb_leap.clamped_day(31), date(2024, 2, 29));
        assert_eq!(feb.clamped_day(31), date(2023, 2, 28));
        assert_eq!(MonthWindow::new(2024, 4).unwrap().clamped_day(31), date(2024, 4, 30));
    }

    #[test]
    fn month_difference_is_signed_across_years() {
        let nov = MonthWindow::new(2023, 11).unwrap();
        let jan = MonthWindow::new(2022, 1).unwrap();
        assert_eq!(month_difference(nov, jan), -22);
        assert_eq!(month_difference(jan, nov), 22);
    }

    #[test]
    fn parse_and_display_agree() {
        let window = MonthWindow::parse("2024-03").unwrap();
        assert_eq!(window.to_string(), "2024-03");
        assert_eq!(window.end(), date(2024, 3, 31));
        assert!(MonthWindow::parse("2024-3x").is_none());
    }

    #[test]
    fn next_and_previous_wrap_years() {
        let dec = MonthWindow::new(2023, 12).unwrap();
        assert_eq!(dec.next(), MonthWindow::new(2024, 1).unwrap());
        assert_eq!(dec.next().previous(), dec);
    }
}

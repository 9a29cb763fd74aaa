//! Fixed-shape month grids.
//!
//! # Responsibility
//! - Lay out one month as 6 weeks x 7 weekday columns, Sunday first.
//!
//! # Invariants
//! - Every grid is exactly `WEEKS_IN_GRID x DAYS_IN_WEEK` cells.
//! - Every day `1..=days_in_month` appears exactly once, in weekday order.
//! - Every other cell is `DayDate::PADDING`.
//! - Grid construction is pure and deterministic.

use crate::model::day_date::{days_in_month, DayDate, DayDateError};
use chrono::{Datelike, NaiveDate};

pub const DAYS_IN_WEEK: usize = 7;
pub const WEEKS_IN_GRID: usize = 6;

/// One grid row, Sunday first.
pub type Week = [DayDate; DAYS_IN_WEEK];

/// Month laid out as a fixed 6x7 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    year: i32,
    month: i32,
    leading_padding: usize,
    weeks: [Week; WEEKS_IN_GRID],
}

impl MonthGrid {
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Zero-indexed month.
    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn weeks(&self) -> &[Week; WEEKS_IN_GRID] {
        &self.weeks
    }

    /// Number of padding cells before day 1.
    pub fn leading_padding(&self) -> usize {
        self.leading_padding
    }

    /// Iterates over non-padding cells in calendar order.
    pub fn real_days(&self) -> impl Iterator<Item = DayDate> + '_ {
        self.weeks
            .iter()
            .flatten()
            .copied()
            .filter(|cell| !cell.is_padding())
    }

    /// Number of rows containing at least one real day.
    pub fn used_weeks(&self) -> usize {
        self.weeks
            .iter()
            .filter(|week| week.iter().any(|cell| !cell.is_padding()))
            .count()
    }
}

/// Builds the grid for a zero-indexed month.
///
/// # Errors
/// - Returns `DayDateError` when year or month is outside the supported range.
pub fn build_month_grid(year: i32, month: i32) -> Result<MonthGrid, DayDateError> {
    let day_count = days_in_month(year, month)?;
    let leading_padding = first_weekday_index(year, month)?;
    let mut weeks = [[DayDate::PADDING; DAYS_IN_WEEK]; WEEKS_IN_GRID];

    for (offset, day) in (1..=day_count).enumerate() {
        let slot = leading_padding + offset;
        if let Some(cell) = weeks
            .get_mut(slot / DAYS_IN_WEEK)
            .and_then(|week| week.get_mut(slot % DAYS_IN_WEEK))
        {
            *cell = DayDate { year, month, day };
        }
    }

    Ok(MonthGrid {
        year,
        month,
        leading_padding,
        weeks,
    })
}

/// Column of day 1 with Sunday = 0.
fn first_weekday_index(year: i32, month: i32) -> Result<usize, DayDateError> {
    let first = u32::try_from(month + 1)
        .ok()
        .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .ok_or(DayDateError::MonthOutOfRange(month))?;
    // num_days_from_sunday() is 0..=6.
    Ok(first.weekday().num_days_from_sunday() as usize)
}

#[cfg(test)]
mod tests {
    use super::{build_month_grid, DAYS_IN_WEEK, WEEKS_IN_GRID};
    use crate::model::day_date::{DayDate, DayDateError};

    #[test]
    fn leap_february_2024_starts_on_thursday() {
        let grid = build_month_grid(2024, 1).expect("valid month");
        assert_eq!(grid.leading_padding(), 4);
        assert_eq!(grid.real_days().count(), 29);
        assert_eq!(grid.weeks()[0][4], DayDate::new(2024, 1, 1).expect("valid"));
        assert_eq!(grid.weeks().len(), WEEKS_IN_GRID);
        assert!(grid.weeks().iter().all(|week| week.len() == DAYS_IN_WEEK));
    }

    #[test]
    fn short_month_is_padded_to_six_rows() {
        // 2026-02-01 is a Sunday and February 2026 has 28 days.
        let grid = build_month_grid(2026, 1).expect("valid month");
        assert_eq!(grid.leading_padding(), 0);
        assert_eq!(grid.used_weeks(), 4);
        assert!(grid.weeks()[4].iter().all(DayDate::is_padding));
        assert!(grid.weeks()[5].iter().all(DayDate::is_padding));
    }

    #[test]
    fn long_month_with_late_start_fills_six_rows() {
        // 2023-12-01 is a Friday; 31 days span six weeks.
        let grid = build_month_grid(2023, 11).expect("valid month");
        assert_eq!(grid.leading_padding(), 5);
        assert_eq!(grid.used_weeks(), 6);
        assert_eq!(grid.weeks()[5][0], DayDate::new(2023, 11, 31).expect("valid"));
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert_eq!(
            build_month_grid(2024, 12),
            Err(DayDateError::MonthOutOfRange(12))
        );
        assert_eq!(
            build_month_grid(2024, -1),
            Err(DayDateError::MonthOutOfRange(-1))
        );
    }
}

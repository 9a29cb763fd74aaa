use lifegrid_core::calendar::labels::{is_today, is_yesterday, month_label};
use lifegrid_core::{build_month_grid, DayDate, DAYS_IN_WEEK, WEEKS_IN_GRID};
use lifegrid_core::model::day_date::days_in_month;
use std::collections::BTreeSet;

#[test]
fn every_month_is_six_by_seven_with_each_day_once() {
    for year in [1900, 1999, 2000, 2023, 2024, 2025, 2100] {
        for month in 0..12 {
            let grid = build_month_grid(year, month).unwrap();
            assert_eq!(grid.weeks().len(), WEEKS_IN_GRID);
            assert!(grid.weeks().iter().all(|week| week.len() == DAYS_IN_WEEK));

            let real: Vec<DayDate> = grid.real_days().collect();
            let expected = days_in_month(year, month).unwrap();
            assert_eq!(real.len(), expected as usize, "{year}-{month}");

            let unique: BTreeSet<i32> = real.iter().map(|day| day.day).collect();
            assert_eq!(unique.len(), real.len());
            assert_eq!(unique.first().copied(), Some(1));
            assert_eq!(unique.last().copied(), Some(expected));
            assert!(real.iter().all(|day| day.year == year && day.month == month));
        }
    }
}

#[test]
fn real_days_are_contiguous_after_leading_padding() {
    let grid = build_month_grid(2024, 1).unwrap();
    let cells: Vec<DayDate> = grid.weeks().iter().flatten().copied().collect();

    assert!(cells[..4].iter().all(DayDate::is_padding));
    for (offset, cell) in cells[4..4 + 29].iter().enumerate() {
        assert_eq!(cell.day, offset as i32 + 1);
    }
    assert!(cells[4 + 29..].iter().all(DayDate::is_padding));
}

#[test]
fn february_2024_scenario() {
    let grid = build_month_grid(2024, 1).unwrap();
    assert_eq!(month_label(grid.month()), Some("February"));
    assert_eq!(grid.leading_padding(), 4);
    assert_eq!(grid.real_days().count(), 29);
    assert_eq!(grid.used_weeks(), 5);
}

#[test]
fn relative_day_checks_cross_month_boundaries() {
    let today = DayDate::new(2024, 2, 1).unwrap();
    let yesterday = DayDate::new(2024, 1, 29).unwrap();

    assert!(is_today(today, today));
    assert!(is_yesterday(yesterday, today));
    assert!(!is_yesterday(today, today));
    assert!(!is_today(DayDate::PADDING, today));
}

#[test]
fn out_of_range_years_are_rejected() {
    assert!(build_month_grid(-1, 0).is_err());
    assert!(build_month_grid(10_000, 0).is_err());
}

//! Month/weekday labels and relative-day checks for grid headers.

use crate::model::day_date::DayDate;

const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Single-letter weekday headers, Sunday first.
const WEEKDAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// Full month names indexed by zero-indexed month.
pub fn month_labels() -> &'static [&'static str; 12] {
    &MONTH_LABELS
}

/// Month name for a zero-indexed month, `None` when out of range.
pub fn month_label(month: i32) -> Option<&'static str> {
    usize::try_from(month)
        .ok()
        .and_then(|index| MONTH_LABELS.get(index))
        .copied()
}

pub fn weekday_labels() -> &'static [&'static str; 7] {
    &WEEKDAY_LABELS
}

/// Returns whether `day` is `today`. Padding is never today.
pub fn is_today(day: DayDate, today: DayDate) -> bool {
    !day.is_padding() && day == today
}

/// Returns whether `day` is the day before `today`.
pub fn is_yesterday(day: DayDate, today: DayDate) -> bool {
    let Ok(today) = today.to_naive_date() else {
        return false;
    };
    today
        .pred_opt()
        .and_then(|yesterday| DayDate::from_naive_date(yesterday).ok())
        .is_some_and(|yesterday| yesterday == day)
}

#[cfg(test)]
mod tests {
    use super::{is_today, is_yesterday, month_label, weekday_labels};
    use crate::model::day_date::DayDate;

    #[test]
    fn month_label_uses_zero_indexed_months() {
        assert_eq!(month_label(0), Some("January"));
        assert_eq!(month_label(11), Some("December"));
        assert_eq!(month_label(12), None);
        assert_eq!(month_label(-1), None);
    }

    #[test]
    fn weekday_labels_start_on_sunday() {
        assert_eq!(weekday_labels()[0], "S");
        assert_eq!(weekday_labels()[1], "M");
    }

    #[test]
    fn yesterday_crosses_year_boundary() {
        let today = DayDate::new(2024, 0, 1).expect("valid");
        let new_years_eve = DayDate::new(2023, 11, 31).expect("valid");
        assert!(is_yesterday(new_years_eve, today));
        assert!(!is_today(new_years_eve, today));
        assert!(is_today(today, today));
        assert!(!is_today(DayDate::PADDING, DayDate::PADDING));
    }
}

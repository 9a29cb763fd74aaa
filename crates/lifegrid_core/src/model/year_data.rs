//! Per-year day presence data.
//!
//! # Responsibility
//! - Map `year -> data key id -> set of date keys` recorded true.
//! - Apply single-day mutations with set semantics.
//!
//! # Invariants
//! - Every stored date key is canonical (`encode_date_key` output) and
//!   belongs to the year bucket it is stored under.
//! - Inserting an existing day or removing an absent day is a no-op.
//! - A year is "cached" only after fetched data was merged for it. Local day
//!   writes never mark a year cached, so a failed fetch is retried.
//! - Removing a day never creates a bucket.

use crate::calendar::date_key::{encode_date_key, DateKeyError};
use crate::model::data_key::DataKeyId;
use crate::model::day_date::DayDate;
use std::collections::{BTreeMap, BTreeSet};

/// Day presence for one year: data key id -> date keys recorded true.
pub type YearData = BTreeMap<DataKeyId, BTreeSet<String>>;

/// Presence data per year, plus the set of years loaded from remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearDataMap {
    years: BTreeMap<i32, YearData>,
    loaded: BTreeSet<i32>,
}

impl YearDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_year_cached(&self, year: i32) -> bool {
        self.loaded.contains(&year)
    }

    pub fn cached_years(&self) -> Vec<i32> {
        self.loaded.iter().copied().collect()
    }

    pub fn year(&self, year: i32) -> Option<&YearData> {
        self.years.get(&year)
    }

    /// Returns the date keys recorded for one data key in one year.
    pub fn days_for(&self, year: i32, data_key_id: &str) -> Option<&BTreeSet<String>> {
        self.years.get(&year)?.get(data_key_id)
    }

    /// Returns whether `day` is recorded true for `data_key_id`.
    ///
    /// Padding and invalid days are never recorded.
    pub fn contains_day(&self, data_key_id: &str, day: DayDate) -> bool {
        let Ok(date_key) = encode_date_key(day) else {
            return false;
        };
        self.days_for(day.year, data_key_id)
            .is_some_and(|days| days.contains(&date_key))
    }

    /// Inserts (`value = true`) or removes (`value = false`) one day.
    ///
    /// Returns whether the stored set changed.
    pub fn set_day(
        &mut self,
        data_key_id: &str,
        day: DayDate,
        value: bool,
    ) -> Result<bool, DateKeyError> {
        let date_key = encode_date_key(day)?;
        if value {
            Ok(self
                .years
                .entry(day.year)
                .or_default()
                .entry(data_key_id.to_string())
                .or_default()
                .insert(date_key))
        } else {
            Ok(self
                .years
                .get_mut(&day.year)
                .and_then(|year_data| year_data.get_mut(data_key_id))
                .is_some_and(|days| days.remove(&date_key)))
        }
    }

    /// Unions fetched data into a year bucket and marks the year cached.
    pub fn merge_year(&mut self, year: i32, data: YearData) {
        self.loaded.insert(year);
        let year_data = self.years.entry(year).or_default();
        for (data_key_id, days) in data {
            year_data.entry(data_key_id).or_default().extend(days);
        }
    }

    /// Drops one data key from every cached year.
    ///
    /// Returns the number of buckets removed.
    pub fn drop_data_key(&mut self, data_key_id: &str) -> usize {
        self.years
            .values_mut()
            .filter_map(|year_data| year_data.remove(data_key_id))
            .count()
    }

    pub fn clear(&mut self) {
        self.years.clear();
        self.loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{YearData, YearDataMap};
    use crate::model::day_date::DayDate;
    use std::collections::BTreeSet;

    fn day(year: i32, month: i32, day: i32) -> DayDate {
        DayDate::new(year, month, day).expect("test date should be valid")
    }

    #[test]
    fn set_day_has_set_semantics() {
        let mut map = YearDataMap::new();
        assert_eq!(map.set_day("k1", day(2024, 0, 5), true), Ok(true));
        assert_eq!(map.set_day("k1", day(2024, 0, 5), true), Ok(false));
        assert_eq!(map.days_for(2024, "k1").map(BTreeSet::len), Some(1));

        assert_eq!(map.set_day("k1", day(2024, 0, 5), false), Ok(true));
        assert_eq!(map.set_day("k1", day(2024, 0, 5), false), Ok(false));
        assert!(!map.contains_day("k1", day(2024, 0, 5)));
    }

    #[test]
    fn set_day_rejects_padding() {
        let mut map = YearDataMap::new();
        assert!(map.set_day("k1", DayDate::PADDING, true).is_err());
        assert!(!map.contains_day("k1", DayDate::PADDING));
        assert!(map.cached_years().is_empty());
    }

    #[test]
    fn days_are_bucketed_by_their_own_year() {
        let mut map = YearDataMap::new();
        map.set_day("k1", day(2023, 11, 31), true)
            .expect("valid date");
        assert!(map.contains_day("k1", day(2023, 11, 31)));
        assert!(map.days_for(2024, "k1").is_none());
    }

    #[test]
    fn local_writes_do_not_mark_year_cached() {
        let mut map = YearDataMap::new();
        map.set_day("k1", day(2025, 0, 2), true).expect("valid date");
        assert_eq!(map.set_day("k1", day(2026, 0, 2), false), Ok(false));
        assert!(!map.is_year_cached(2025));
        assert!(map.year(2026).is_none());

        map.merge_year(2025, YearData::new());
        assert!(map.is_year_cached(2025));
        assert!(map.contains_day("k1", day(2025, 0, 2)));
        assert_eq!(map.cached_years(), vec![2025]);
    }

    #[test]
    fn merge_year_unions_existing_days() {
        let mut map = YearDataMap::new();
        map.set_day("k1", day(2024, 2, 1), true).expect("valid date");

        let mut fetched = YearData::new();
        fetched.insert(
            "k1".to_string(),
            BTreeSet::from(["2024_02_02".to_string()]),
        );
        fetched.insert("k2".to_string(), BTreeSet::new());
        map.merge_year(2024, fetched);

        assert_eq!(map.days_for(2024, "k1").map(BTreeSet::len), Some(2));
        assert!(map.days_for(2024, "k2").is_some());
    }

    #[test]
    fn drop_data_key_clears_every_year() {
        let mut map = YearDataMap::new();
        map.set_day("k1", day(2023, 5, 1), true).expect("valid date");
        map.set_day("k1", day(2024, 5, 1), true).expect("valid date");
        map.set_day("k2", day(2024, 5, 1), true).expect("valid date");

        assert_eq!(map.drop_data_key("k1"), 2);
        assert!(map.days_for(2023, "k1").is_none());
        assert!(map.days_for(2024, "k1").is_none());
        assert!(map.contains_day("k2", day(2024, 5, 1)));
    }
}

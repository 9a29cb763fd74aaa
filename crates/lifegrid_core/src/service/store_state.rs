//! Structured state owned by `YearDataStore`.
//!
//! # Responsibility
//! - Group store fields by concern, each group with its own setters.
//!
//! # Invariants
//! - Closing a dialog clears its parameters.
//! - `data_keys` never contains two entries with the same id.
//! - Pending day writes are removed when their provider call resolves,
//!   whatever the outcome.

use crate::model::data_key::{DataKey, DataKeyId};
use crate::model::day_date::DayDate;
use crate::model::session::Session;
use crate::model::year_data::YearDataMap;
use crate::provider::persistence::UserYearData;

/// Parameters of the open day-data dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDataDialog {
    pub data_key_id: DataKeyId,
    pub day: DayDate,
    pub value: bool,
}

/// Ephemeral modal state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    pub login: bool,
    pub add_data_key: bool,
    /// `Some` while the day-data dialog is open.
    pub day_data: Option<DayDataDialog>,
}

impl DialogState {
    pub fn open_login(&mut self) {
        self.login = true;
    }

    pub fn close_login(&mut self) {
        self.login = false;
    }

    pub fn open_add_data_key(&mut self) {
        self.add_data_key = true;
    }

    pub fn close_add_data_key(&mut self) {
        self.add_data_key = false;
    }

    pub fn open_day_data(&mut self, data_key_id: DataKeyId, day: DayDate, value: bool) {
        self.day_data = Some(DayDataDialog {
            data_key_id,
            day,
            value,
        });
    }

    pub fn close_day_data(&mut self) {
        self.day_data = None;
    }

    pub fn is_day_data_open(&self) -> bool {
        self.day_data.is_some()
    }
}

/// Selected year and zero-indexed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub year: i32,
    pub month: i32,
}

/// A dispatched day-value write awaiting provider confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWrite {
    pub id: u64,
    pub data_key_id: DataKeyId,
    pub day: DayDate,
    pub value: bool,
}

/// Full store state as seen by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub loading: bool,
    pub data_keys: Vec<DataKey>,
    pub year_data_map: YearDataMap,
    pub session: Session,
    pub cursor: CalendarCursor,
    pub dialogs: DialogState,
    pub left_scroll: f64,
    /// User-visible message of the last auth failure.
    pub auth_error: Option<String>,
    pub pending_day_writes: Vec<DayWrite>,
}

impl StoreState {
    pub(crate) fn new(cursor: CalendarCursor) -> Self {
        Self {
            loading: true,
            data_keys: Vec::new(),
            year_data_map: YearDataMap::new(),
            session: Session::logged_out(),
            cursor,
            dialogs: DialogState::default(),
            left_scroll: 0.0,
            auth_error: None,
            pending_day_writes: Vec::new(),
        }
    }

    /// Appends a data key unless its id is already present.
    pub(crate) fn push_data_key(&mut self, data_key: DataKey) {
        if !self.data_keys.iter().any(|existing| existing.id == data_key.id) {
            self.data_keys.push(data_key);
        }
    }

    /// Merges a fetched year: data keys by id, days by set union.
    pub(crate) fn apply_user_year_data(&mut self, data: UserYearData) {
        for data_key in data.data_keys {
            self.push_data_key(data_key);
        }
        self.year_data_map.merge_year(data.year, data.year_data);
    }

    /// Removes one data key from the key list, every cached year, and a
    /// day-data dialog targeting it.
    pub(crate) fn remove_data_key(&mut self, data_key_id: &str) {
        self.data_keys.retain(|data_key| data_key.id != data_key_id);
        self.year_data_map.drop_data_key(data_key_id);
        let targets_removed_key = self
            .dialogs
            .day_data
            .as_ref()
            .is_some_and(|dialog| dialog.data_key_id == data_key_id);
        if targets_removed_key {
            self.dialogs.close_day_data();
        }
    }

    /// Replaces the session and drops everything owned by the previous user.
    pub(crate) fn replace_identity(&mut self, session: Session) {
        self.session = session;
        self.data_keys.clear();
        self.year_data_map.clear();
        self.pending_day_writes.clear();
        self.dialogs.close_day_data();
        self.dialogs.close_add_data_key();
    }

    pub(crate) fn finish_day_write(&mut self, write_id: u64) {
        self.pending_day_writes.retain(|write| write.id != write_id);
    }
}

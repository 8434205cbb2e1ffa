//! Weekly schedule editor for the doctor portal.
//!
//! The editor holds seven weekday entries (0 = Sunday) plus a sorted list of
//! leave days. Every edit marks the editor dirty until the caller reports a
//! successful save with `mark_saved`. `to_payload` produces the wholesale
//! replacement body for `PUT /doctors/{id}/schedule`.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use time::Duration;
use time::macros::format_description;

use crate::error::ClientError;
use crate::net::types::{Schedule, ScheduleTimeSlot};
use crate::util::format::{parse_clock, parse_date};

pub const DAY_NAMES: [&str; 7] = ["Chủ nhật", "Thứ 2", "Thứ 3", "Thứ 4", "Thứ 5", "Thứ 6", "Thứ 7"];
pub const WEEKEND_NOTE: &str = "Nghỉ cuối tuần";
pub const DEFAULT_LEAVE_REASON: &str = "Nghỉ phép";
const FIRST_SLOT_START: &str = "08:00";
const SLOT_MINUTES: i64 = 30;

const DEFAULT_SLOT_BOUNDS: [(&str, &str); 10] = [
    ("08:00", "08:30"),
    ("08:30", "09:00"),
    ("09:00", "09:30"),
    ("09:30", "10:00"),
    ("10:00", "10:30"),
    ("10:30", "11:00"),
    ("14:00", "14:30"),
    ("14:30", "15:00"),
    ("15:00", "15:30"),
    ("15:30", "16:00"),
];

fn slot(start: &str, end: &str) -> ScheduleTimeSlot {
    ScheduleTimeSlot { id: None, start_time: start.to_owned(), end_time: end.to_owned(), max_patients: 1, is_available: true }
}

#[must_use]
pub fn default_slots() -> Vec<ScheduleTimeSlot> {
    DEFAULT_SLOT_BOUNDS.iter().map(|(start, end)| slot(start, end)).collect()
}

/// Sunday off, Monday through Saturday with the standard morning and
/// afternoon slots.
#[must_use]
pub fn default_week() -> Vec<Schedule> {
    (0u8..7)
        .map(|day| Schedule {
            id: None,
            day_of_week: day,
            specific_date: None,
            is_available: day != 0,
            notes: (day == 0).then(|| WEEKEND_NOTE.to_owned()),
            time_slots: if day == 0 { Vec::new() } else { default_slots() },
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaveDay {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub reason: String,
}

/// Partial slot edit; `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotUpdate {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub max_patients: Option<u32>,
    pub is_available: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleEditor {
    days: Vec<Schedule>,
    leave_days: Vec<LeaveDay>,
    has_changes: bool,
}

impl Default for ScheduleEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ClientError {
    ClientError::Validation { field, message: message.into() }
}

fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(usize::from(day)).copied().unwrap_or("?")
}

impl ScheduleEditor {
    #[must_use]
    pub fn new() -> Self {
        Self { days: default_week(), leave_days: Vec::new(), has_changes: false }
    }

    /// Editor seeded from server data; see [`ScheduleEditor::merge_loaded`].
    #[must_use]
    pub fn from_loaded(loaded: &[Schedule]) -> Self {
        let mut editor = Self::new();
        editor.merge_loaded(loaded);
        editor
    }

    /// Replace the editor contents with server data. Weekly entries missing
    /// from the server are filled from the default week; date-specific
    /// unavailable entries become leave days. Clears `has_changes`.
    pub fn merge_loaded(&mut self, loaded: &[Schedule]) {
        let (specific, weekly): (Vec<&Schedule>, Vec<&Schedule>) =
            loaded.iter().partition(|s| s.specific_date.is_some());

        if !weekly.is_empty() {
            self.days = default_week()
                .into_iter()
                .map(|default| {
                    weekly
                        .iter()
                        .find(|w| w.day_of_week == default.day_of_week)
                        .map_or(default, |found| (*found).clone())
                })
                .collect();
        }

        let mut leave_days: Vec<LeaveDay> = specific
            .into_iter()
            .filter(|s| !s.is_available)
            .filter_map(|s| {
                let date = s.specific_date.clone()?;
                let reason = s.notes.clone().filter(|n| !n.trim().is_empty()).unwrap_or_else(|| DEFAULT_LEAVE_REASON.to_owned());
                Some(LeaveDay { date, reason })
            })
            .collect();
        leave_days.sort_by(|a, b| a.date.cmp(&b.date));
        self.leave_days = leave_days;
        self.has_changes = false;
    }

    #[must_use]
    pub fn days(&self) -> &[Schedule] {
        &self.days
    }

    #[must_use]
    pub fn day(&self, day_of_week: u8) -> Option<&Schedule> {
        self.days.iter().find(|d| d.day_of_week == day_of_week)
    }

    #[must_use]
    pub fn leave_days(&self) -> &[LeaveDay] {
        &self.leave_days
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    fn day_mut(&mut self, day_of_week: u8) -> Result<&mut Schedule, ClientError> {
        self.days
            .iter_mut()
            .find(|d| d.day_of_week == day_of_week)
            .ok_or_else(|| invalid("dayOfWeek", format!("không có ngày {day_of_week}")))
    }

    /// Switch a weekday on (with the default slots) or off (no slots).
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a day outside 0..=6.
    pub fn toggle_day(&mut self, day_of_week: u8) -> Result<(), ClientError> {
        let day = self.day_mut(day_of_week)?;
        day.is_available = !day.is_available;
        day.time_slots = if day.is_available { default_slots() } else { Vec::new() };
        self.has_changes = true;
        Ok(())
    }

    /// Append a 30-minute slot starting where the last one ends.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown day, a last slot whose end
    /// time is not `HH:mm`, or a new slot that would run past midnight.
    pub fn add_slot(&mut self, day_of_week: u8) -> Result<(), ClientError> {
        let day = self.day_mut(day_of_week)?;
        let start = day.time_slots.last().map_or(FIRST_SLOT_START, |s| s.end_time.as_str()).to_owned();
        let start_clock = parse_clock(&start).ok_or_else(|| invalid("endTime", format!("giờ không hợp lệ: {start}")))?;
        let end_clock = start_clock + Duration::minutes(SLOT_MINUTES);
        // Time arithmetic wraps at midnight.
        if end_clock <= start_clock {
            return Err(invalid("endTime", format!("không thể thêm khung giờ sau {start}")));
        }
        let end = end_clock
            .format(format_description!("[hour]:[minute]"))
            .map_err(|e| invalid("endTime", e.to_string()))?;
        day.time_slots.push(slot(&start, &end));
        self.has_changes = true;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown day or slot index.
    pub fn update_slot(&mut self, day_of_week: u8, index: usize, update: SlotUpdate) -> Result<(), ClientError> {
        let day = self.day_mut(day_of_week)?;
        let slot = day.time_slots.get_mut(index).ok_or_else(|| invalid("slot", format!("không có khung giờ {index}")))?;
        if let Some(start) = update.start_time {
            slot.start_time = start;
        }
        if let Some(end) = update.end_time {
            slot.end_time = end;
        }
        if let Some(max) = update.max_patients {
            slot.max_patients = max;
        }
        if let Some(available) = update.is_available {
            slot.is_available = available;
        }
        self.has_changes = true;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown day or slot index.
    pub fn remove_slot(&mut self, day_of_week: u8, index: usize) -> Result<(), ClientError> {
        let day = self.day_mut(day_of_week)?;
        if index >= day.time_slots.len() {
            return Err(invalid("slot", format!("không có khung giờ {index}")));
        }
        day.time_slots.remove(index);
        self.has_changes = true;
        Ok(())
    }

    /// Add (or replace) the leave day for `date`, keeping the list sorted.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] if `date` is not `YYYY-MM-DD`.
    pub fn add_leave_day(&mut self, date: &str, reason: &str) -> Result<(), ClientError> {
        let date = date.trim();
        if parse_date(date).is_none() {
            return Err(invalid("date", "Ngày không hợp lệ"));
        }
        let reason = if reason.trim().is_empty() { DEFAULT_LEAVE_REASON } else { reason.trim() };
        self.leave_days.retain(|d| d.date != date);
        self.leave_days.push(LeaveDay { date: date.to_owned(), reason: reason.to_owned() });
        self.leave_days.sort_by(|a, b| a.date.cmp(&b.date));
        self.has_changes = true;
        Ok(())
    }

    /// Returns whether a leave day was removed.
    pub fn remove_leave_day(&mut self, date: &str) -> bool {
        let before = self.leave_days.len();
        self.leave_days.retain(|d| d.date != date);
        let removed = self.leave_days.len() != before;
        self.has_changes |= removed;
        removed
    }

    /// Weekly entries followed by one unavailable entry per leave day.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] naming the first slot with a malformed or
    /// inverted time range or a zero patient limit.
    pub fn to_payload(&self) -> Result<Vec<Schedule>, ClientError> {
        for day in &self.days {
            for slot in &day.time_slots {
                validate_slot(day.day_of_week, slot)?;
            }
        }

        let weekly = self.days.iter().cloned().map(|mut day| {
            day.specific_date = None;
            day
        });
        let mut payload: Vec<Schedule> = weekly.collect();
        for leave in &self.leave_days {
            let date = parse_date(&leave.date).ok_or_else(|| invalid("date", format!("Ngày không hợp lệ: {}", leave.date)))?;
            payload.push(Schedule {
                id: None,
                day_of_week: date.weekday().number_days_from_sunday(),
                specific_date: Some(leave.date.clone()),
                is_available: false,
                notes: Some(leave.reason.clone()),
                time_slots: Vec::new(),
            });
        }
        Ok(payload)
    }

    pub fn mark_saved(&mut self) {
        self.has_changes = false;
    }
}

fn validate_slot(day: u8, slot: &ScheduleTimeSlot) -> Result<(), ClientError> {
    let start = parse_clock(&slot.start_time)
        .ok_or_else(|| invalid("startTime", format!("{}: giờ bắt đầu không hợp lệ ({})", day_name(day), slot.start_time)))?;
    let end = parse_clock(&slot.end_time)
        .ok_or_else(|| invalid("endTime", format!("{}: giờ kết thúc không hợp lệ ({})", day_name(day), slot.end_time)))?;
    if start >= end {
        return Err(invalid(
            "endTime",
            format!("{}: {} - {} kết thúc trước khi bắt đầu", day_name(day), slot.start_time, slot.end_time),
        ));
    }
    if slot.max_patients == 0 {
        return Err(invalid("maxPatients", format!("{}: số bệnh nhân tối đa phải ≥ 1", day_name(day))));
    }
    Ok(())
}

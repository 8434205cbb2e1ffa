//! Appointment booking flow: specialty, doctor, date/time, confirm.
//!
//! Each choice advances exactly one step. Re-choosing an earlier step
//! discards everything chosen after it, so a confirmed draft never mixes a
//! doctor with a slot picked for somebody else.

#[cfg(test)]
#[path = "booking_test.rs"]
mod booking_test;

use crate::error::ClientError;
use crate::net::types::{CreateAppointmentRequest, TimeSlot};
use crate::util::format::parse_date;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookingStep {
    Specialty,
    Doctor,
    DateTime,
    Confirm,
}

impl BookingStep {
    pub const ALL: [Self; 4] = [Self::Specialty, Self::Doctor, Self::DateTime, Self::Confirm];

    /// One-based position in the stepper.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Specialty => 1,
            Self::Doctor => 2,
            Self::DateTime => 3,
            Self::Confirm => 4,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Specialty => "Chuyên khoa",
            Self::Doctor => "Bác sĩ",
            Self::DateTime => "Thời gian",
            Self::Confirm => "Xác nhận",
        }
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Specialty => Some(Self::Doctor),
            Self::Doctor => Some(Self::DateTime),
            Self::DateTime => Some(Self::Confirm),
            Self::Confirm => None,
        }
    }

    #[must_use]
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Specialty => None,
            Self::Doctor => Some(Self::Specialty),
            Self::DateTime => Some(Self::Doctor),
            Self::Confirm => Some(Self::DateTime),
        }
    }
}

/// How a step renders relative to the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingDraft {
    step: BookingStep,
    specialty_id: Option<String>,
    doctor_id: Option<String>,
    date: Option<String>,
    time_slot: Option<TimeSlot>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingDraft {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: BookingStep::Specialty,
            specialty_id: None,
            doctor_id: None,
            date: None,
            time_slot: None,
            symptoms: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> BookingStep {
        self.step
    }

    #[must_use]
    pub fn specialty_id(&self) -> Option<&str> {
        self.specialty_id.as_deref()
    }

    #[must_use]
    pub fn doctor_id(&self) -> Option<&str> {
        self.doctor_id.as_deref()
    }

    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    #[must_use]
    pub fn time_slot(&self) -> Option<&TimeSlot> {
        self.time_slot.as_ref()
    }

    fn reached(&self, step: BookingStep) -> Result<(), ClientError> {
        if self.step >= step {
            Ok(())
        } else {
            Err(ClientError::Validation {
                field: "step",
                message: format!("bước \"{}\" chưa được mở", step.label()),
            })
        }
    }

    pub fn choose_specialty(&mut self, specialty_id: impl Into<String>) {
        self.specialty_id = Some(specialty_id.into());
        self.doctor_id = None;
        self.date = None;
        self.time_slot = None;
        self.step = BookingStep::Doctor;
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] if no specialty has been chosen yet.
    pub fn choose_doctor(&mut self, doctor_id: impl Into<String>) -> Result<(), ClientError> {
        self.reached(BookingStep::Doctor)?;
        self.doctor_id = Some(doctor_id.into());
        self.date = None;
        self.time_slot = None;
        self.step = BookingStep::DateTime;
        Ok(())
    }

    /// Pick a day (`YYYY-MM-DD`) and one of its slots.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] if no doctor has been chosen yet or the date
    /// is malformed.
    pub fn choose_slot(&mut self, date: &str, slot: TimeSlot) -> Result<(), ClientError> {
        self.reached(BookingStep::DateTime)?;
        if parse_date(date).is_none() {
            return Err(ClientError::Validation { field: "date", message: "Ngày không hợp lệ".to_owned() });
        }
        self.date = Some(date.trim().to_owned());
        self.time_slot = Some(slot);
        self.step = BookingStep::Confirm;
        Ok(())
    }

    /// Step back one step; earlier choices are kept.
    pub fn back(&mut self) {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
    }

    #[must_use]
    pub fn status_of(&self, step: BookingStep) -> StepStatus {
        match step.cmp(&self.step) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }

    /// Width of the stepper's progress line.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let last = f64::from(BookingStep::Confirm.number() - 1);
        f64::from(self.step.number() - 1) / last * 100.0
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] unless the draft is on the confirm step with
    /// every choice made.
    pub fn to_request(&self) -> Result<CreateAppointmentRequest, ClientError> {
        let missing = |field: &'static str| ClientError::Validation { field, message: "Thông tin đặt lịch chưa đủ".to_owned() };
        if self.step != BookingStep::Confirm {
            return Err(missing("step"));
        }
        let doctor_id = self.doctor_id.clone().ok_or_else(|| missing("doctorId"))?;
        let date = self.date.clone().ok_or_else(|| missing("appointmentDate"))?;
        let slot = self.time_slot.as_ref().ok_or_else(|| missing("timeSlotId"))?;
        Ok(CreateAppointmentRequest {
            doctor_id,
            specialty_id: self.specialty_id.clone(),
            time_slot_id: slot.id,
            appointment_date: date,
            symptoms: self.symptoms.clone().filter(|s| !s.trim().is_empty()),
            notes: self.notes.clone().filter(|s| !s.trim().is_empty()),
        })
    }
}

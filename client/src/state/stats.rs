//! Doctor dashboard counters derived from the doctor's appointment list.

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::net::types::{Appointment, AppointmentStatus};
use crate::util::format::parse_date;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboardStats {
    pub today_appointments: usize,
    pub week_appointments: usize,
    pub month_appointments: usize,
    pub total_patients: usize,
    /// Reviews are not aggregated client-side yet; always 0.
    pub average_rating: f64,
    pub pending_appointments: usize,
    pub completed_appointments: usize,
}

impl DoctorDashboardStats {
    /// Counters relative to `today`. The week runs Sunday through Saturday.
    /// Appointments with an unparseable date only count toward the patient
    /// and status totals.
    #[must_use]
    pub fn from_appointments(appointments: &[Appointment], today: Date) -> Self {
        let week_start = today - Duration::days(i64::from(today.weekday().number_days_from_sunday()));
        let week_end = week_start + Duration::days(6);

        let dates: Vec<Date> = appointments.iter().filter_map(|a| parse_date(&a.appointment_date)).collect();
        let count_dates = |keep: &dyn Fn(Date) -> bool| dates.iter().filter(|d| keep(**d)).count();
        let count_status =
            |status: AppointmentStatus| appointments.iter().filter(|a| a.status == status).count();

        let patients: HashSet<&str> =
            appointments.iter().map(|a| a.patient_id.as_str()).filter(|id| !id.is_empty()).collect();

        Self {
            today_appointments: count_dates(&|d| d == today),
            week_appointments: count_dates(&|d| d >= week_start && d <= week_end),
            month_appointments: count_dates(&|d| d.year() == today.year() && d.month() == today.month()),
            total_patients: patients.len(),
            average_rating: 0.0,
            pending_appointments: count_status(AppointmentStatus::Pending),
            completed_appointments: count_status(AppointmentStatus::Completed),
        }
    }
}

/// Appointments scheduled on `day`.
#[must_use]
pub fn appointments_on(appointments: &[Appointment], day: Date) -> Vec<&Appointment> {
    appointments.iter().filter(|a| parse_date(&a.appointment_date) == Some(day)).collect()
}

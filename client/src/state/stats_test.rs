use super::*;
use time::macros::date;

fn appointment(id: &str, patient: &str, date: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: id.to_owned(),
        patient_id: patient.to_owned(),
        patient_name: "Bệnh nhân".to_owned(),
        doctor_id: "d1".to_owned(),
        doctor_name: "Bác sĩ".to_owned(),
        specialty_name: None,
        time_slot_id: None,
        appointment_date: date.to_owned(),
        appointment_time: "08:00".to_owned(),
        status,
        symptoms: None,
        notes: None,
        cancelled_reason: None,
        created_at: "2026-10-01T00:00:00".to_owned(),
    }
}

// =============================================================================
// from_appointments
// =============================================================================

#[test]
fn counts_today_week_and_month() {
    // 2026-10-16 is a Friday; its week runs 2026-10-11 through 2026-10-17.
    let today = date!(2026 - 10 - 16);
    let list = vec![
        appointment("1", "p1", "2026-10-16", AppointmentStatus::Pending),
        appointment("2", "p2", "2026-10-11", AppointmentStatus::Completed),
        appointment("3", "p1", "2026-10-17", AppointmentStatus::Confirmed),
        appointment("4", "p3", "2026-10-10", AppointmentStatus::Completed),
        appointment("5", "p3", "2026-10-31", AppointmentStatus::Cancelled),
        appointment("6", "p4", "2026-11-01", AppointmentStatus::Pending),
    ];

    let stats = DoctorDashboardStats::from_appointments(&list, today);

    assert_eq!(stats.today_appointments, 1);
    assert_eq!(stats.week_appointments, 3);
    assert_eq!(stats.month_appointments, 5);
    assert_eq!(stats.total_patients, 4);
    assert_eq!(stats.pending_appointments, 2);
    assert_eq!(stats.completed_appointments, 2);
    assert!(stats.average_rating.abs() < f64::EPSILON);
}

#[test]
fn sunday_starts_its_own_week() {
    let today = date!(2026 - 10 - 18);
    let list = vec![
        appointment("1", "p1", "2026-10-17", AppointmentStatus::Pending),
        appointment("2", "p1", "2026-10-24", AppointmentStatus::Pending),
    ];

    let stats = DoctorDashboardStats::from_appointments(&list, today);

    assert_eq!(stats.week_appointments, 1);
}

#[test]
fn unparseable_dates_only_feed_status_and_patient_totals() {
    let list = vec![appointment("1", "p1", "sắp tới", AppointmentStatus::Pending)];

    let stats = DoctorDashboardStats::from_appointments(&list, date!(2026 - 10 - 16));

    assert_eq!(stats.month_appointments, 0);
    assert_eq!(stats.total_patients, 1);
    assert_eq!(stats.pending_appointments, 1);
}

#[test]
fn empty_list_is_all_zero() {
    assert_eq!(DoctorDashboardStats::from_appointments(&[], date!(2026 - 10 - 16)), DoctorDashboardStats::default());
}

// =============================================================================
// appointments_on
// =============================================================================

#[test]
fn appointments_on_accepts_datetime_values() {
    let list = vec![
        appointment("1", "p1", "2026-10-16T09:00:00", AppointmentStatus::Pending),
        appointment("2", "p1", "2026-10-15", AppointmentStatus::Pending),
    ];

    let ids: Vec<&str> = appointments_on(&list, date!(2026 - 10 - 16)).iter().map(|a| a.id.as_str()).collect();

    assert_eq!(ids, vec!["1"]);
}

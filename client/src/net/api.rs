//! Domain endpoint functions.
//!
//! Each function issues exactly one HTTP call through [`ApiClient`] and
//! decodes the envelope payload. List endpoints tolerate a missing payload
//! and return an empty list.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::client::{ApiClient, decode_envelope};
use super::transport::HttpRequest;
use super::types::{
    AdminDashboardStats, AdminUserRequest, Appointment, AppointmentFilters, AppointmentStatus, AuthResponse,
    CreateAppointmentRequest, Doctor, LoginRequest, MedicalRecord, MedicalRecordRequest, Medicine,
    ProfileUpdateRequest, RegisterRequest, Review, ReviewRequest, Schedule, Specialty, TimeSlot, User, UserRole,
    UserSummary,
};
use crate::error::ClientError;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";
pub const PROFILE_PATH: &str = "/users/me";

fn doctor_path(doctor_id: &str) -> String {
    format!("/doctors/{doctor_id}")
}

fn admin_user_path(user_id: &str) -> String {
    format!("/admin/users/{user_id}")
}

fn appointment_action_path(appointment_id: &str, action: &str) -> String {
    format!("/appointments/{appointment_id}/{action}")
}

// =============================================================================
// AUTH
// =============================================================================

/// `POST /auth/login`. Sent without credentials and outside the refresh path.
///
/// # Errors
///
/// Rejected credentials (400/401/403) surface as [`ClientError::Auth`] with the
/// server's message; other failures pass through unchanged.
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
    let request = HttpRequest::post(LOGIN_PATH).json(credentials)?;
    let response = client.send_public(request).await.map_err(auth_rejection)?;
    decode_envelope(&response).map_err(auth_rejection)
}

fn auth_rejection(error: ClientError) -> ClientError {
    match error {
        ClientError::Unauthorized(message) => ClientError::Auth(message),
        ClientError::Server { status: 400 | 401 | 403, message, .. } => ClientError::Auth(message),
        other => other,
    }
}

/// `POST /auth/register`.
///
/// # Errors
///
/// Transport, server and decode errors.
pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<User, ClientError> {
    let response = client.send_public(HttpRequest::post(REGISTER_PATH).json(request)?).await?;
    decode_envelope(&response)
}

/// `GET /auth/me`: identity behind the stored access token.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn current_user(client: &ApiClient) -> Result<User, ClientError> {
    client.get_json(ME_PATH).await
}

// =============================================================================
// PATIENT PORTAL
// =============================================================================

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn list_specialties(client: &ApiClient) -> Result<Vec<Specialty>, ClientError> {
    client.request_or_default(HttpRequest::get("/specialties")).await
}

/// Doctors, optionally filtered by specialty.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn list_doctors(client: &ApiClient, specialty_id: Option<&str>) -> Result<Vec<Doctor>, ClientError> {
    client.request_or_default(HttpRequest::get("/doctors").query("specialtyId", specialty_id)).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn get_doctor(client: &ApiClient, doctor_id: &str) -> Result<Doctor, ClientError> {
    client.get_json(&doctor_path(doctor_id)).await
}

/// Free slots for `doctor_id` on `date` (`YYYY-MM-DD`).
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn available_slots(client: &ApiClient, doctor_id: &str, date: &str) -> Result<Vec<TimeSlot>, ClientError> {
    let request = HttpRequest::get("/appointments/available-slots")
        .query("doctorId", Some(doctor_id))
        .query("date", Some(date));
    client.request_or_default(request).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn create_appointment(
    client: &ApiClient,
    request: &CreateAppointmentRequest,
) -> Result<Appointment, ClientError> {
    client.post_json("/appointments", request).await
}

/// Appointments of the signed-in patient or doctor.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn my_appointments(client: &ApiClient) -> Result<Vec<Appointment>, ClientError> {
    client.request_or_default(HttpRequest::get("/appointments/me")).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn my_records(client: &ApiClient) -> Result<Vec<MedicalRecord>, ClientError> {
    client.request_or_default(HttpRequest::get("/medical-records/me")).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn get_record(client: &ApiClient, record_id: &str) -> Result<MedicalRecord, ClientError> {
    client.get_json(&format!("/medical-records/{record_id}")).await
}

/// Profile of the signed-in account.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn my_profile(client: &ApiClient) -> Result<UserSummary, ClientError> {
    client.get_json(PROFILE_PATH).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn update_my_profile(client: &ApiClient, update: &ProfileUpdateRequest) -> Result<UserSummary, ClientError> {
    client.put_json(PROFILE_PATH, update).await
}

/// Review a completed appointment.
///
/// # Errors
///
/// [`ClientError::Validation`] for a rating outside 1..=5 (no request is sent);
/// otherwise see [`ApiClient::send`].
pub async fn create_review(client: &ApiClient, review: &ReviewRequest) -> Result<Review, ClientError> {
    if !(1..=5).contains(&review.rating) {
        return Err(ClientError::Validation { field: "rating", message: "Vui lòng chọn từ 1 đến 5 sao".to_owned() });
    }
    client.post_json("/reviews", review).await
}

// =============================================================================
// DOCTOR PORTAL
// =============================================================================

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn update_appointment_status(
    client: &ApiClient,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<Appointment, ClientError> {
    let body = serde_json::json!({ "status": status.as_str() });
    client.put_json(&appointment_action_path(appointment_id, "status"), &body).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn cancel_appointment(client: &ApiClient, appointment_id: &str, reason: &str) -> Result<Appointment, ClientError> {
    let body = serde_json::json!({ "reason": reason });
    client.put_json(&appointment_action_path(appointment_id, "cancel"), &body).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn doctor_reviews(client: &ApiClient, doctor_id: &str) -> Result<Vec<Review>, ClientError> {
    client.request_or_default(HttpRequest::get(format!("{}/reviews", doctor_path(doctor_id)))).await
}

/// Weekly entries and leave days of a doctor.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn get_schedule(client: &ApiClient, doctor_id: &str) -> Result<Vec<Schedule>, ClientError> {
    client.request_or_default(HttpRequest::get(format!("{}/schedule", doctor_path(doctor_id)))).await
}

/// Replace a doctor's schedule wholesale.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn update_schedule(
    client: &ApiClient,
    doctor_id: &str,
    schedules: &[Schedule],
) -> Result<Vec<Schedule>, ClientError> {
    let request = HttpRequest::put(format!("{}/schedule", doctor_path(doctor_id))).json(schedules)?;
    client.request_or_default(request).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn patient_records(client: &ApiClient, patient_id: &str) -> Result<Vec<MedicalRecord>, ClientError> {
    client.request_or_default(HttpRequest::get(format!("/medical-records/patient/{patient_id}"))).await
}

/// Write the record of an appointment, with its prescription.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn create_medical_record(
    client: &ApiClient,
    record: &MedicalRecordRequest,
) -> Result<MedicalRecord, ClientError> {
    client.post_json("/medical-records", record).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn update_medical_record(
    client: &ApiClient,
    record_id: &str,
    record: &MedicalRecordRequest,
) -> Result<MedicalRecord, ClientError> {
    client.put_json(&format!("/medical-records/{record_id}"), record).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn list_medicines(client: &ApiClient) -> Result<Vec<Medicine>, ClientError> {
    client.request_or_default(HttpRequest::get("/medicines")).await
}

// =============================================================================
// ADMIN
// =============================================================================

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn dashboard_stats(client: &ApiClient) -> Result<AdminDashboardStats, ClientError> {
    client.request_or_default(HttpRequest::get("/admin/dashboard/stats")).await
}

/// Accounts, optionally filtered by role and a free-text search.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn list_users(
    client: &ApiClient,
    role: Option<UserRole>,
    search: Option<&str>,
) -> Result<Vec<UserSummary>, ClientError> {
    let request = HttpRequest::get("/admin/users")
        .query("role", role.map(role_param))
        .query("search", search.filter(|s| !s.trim().is_empty()));
    client.request_or_default(request).await
}

fn role_param(role: UserRole) -> &'static str {
    match role {
        UserRole::Patient => "PATIENT",
        UserRole::Doctor => "DOCTOR",
        UserRole::Admin => "ADMIN",
    }
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn create_user(client: &ApiClient, user: &AdminUserRequest) -> Result<UserSummary, ClientError> {
    client.post_json("/admin/users", user).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn update_user(client: &ApiClient, user_id: &str, user: &AdminUserRequest) -> Result<UserSummary, ClientError> {
    client.put_json(&admin_user_path(user_id), user).await
}

/// # Errors
///
/// See [`ApiClient::send`].
pub async fn toggle_user_active(client: &ApiClient, user_id: &str) -> Result<UserSummary, ClientError> {
    client.request_json(HttpRequest::put(format!("{}/toggle-active", admin_user_path(user_id)))).await
}

/// Reset the account's password to the server default. No payload.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn reset_password(client: &ApiClient, user_id: &str) -> Result<(), ClientError> {
    client.send(HttpRequest::put(format!("{}/reset-password", admin_user_path(user_id)))).await.map(|_| ())
}

/// All appointments matching `filters`.
///
/// # Errors
///
/// See [`ApiClient::send`].
pub async fn list_appointments(client: &ApiClient, filters: &AppointmentFilters) -> Result<Vec<Appointment>, ClientError> {
    let request = HttpRequest::get("/admin/appointments")
        .query("status", filters.status.map(AppointmentStatus::as_str))
        .query("dateFrom", filters.date_from.as_deref().filter(|d| !d.is_empty()))
        .query("dateTo", filters.date_to.as_deref().filter(|d| !d.is_empty()));
    client.request_or_default(request).await
}

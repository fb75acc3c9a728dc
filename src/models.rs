use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Card status name that makes an identity card valid.
pub const ACTIVE_STATUS: &str = "Active";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub dept_id: i32,
    pub name: String,
}

/// One row of the lenient student listing; department and status are absent
/// when the student has no department or no card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StudentSummary {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub matric_no: String,
    pub department: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VerificationRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub matric_no: String,
    pub department: String,
    pub status_name: String,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<VerificationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub student_id: String,
    pub matric_no: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: i32,
    pub programme_id: i32,
    pub gender: Option<String>,
    pub dob: NaiveDate,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub card_number: String,
    pub student_id: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status_name: &'static str,
}

/// Registration form as posted by the admin console. Everything is optional at
/// the wire level so missing or null fields become validation errors instead
/// of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterStudent {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department_id: Option<FormNumber>,
    pub programme_id: Option<i32>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub email: Option<String>,
}

/// Select inputs post their value as a string, API clients as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    Number(i32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredStudent {
    pub message: &'static str,
    pub student_id: String,
    pub matric_no: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginOperator {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSession {
    pub username: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

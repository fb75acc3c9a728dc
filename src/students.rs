use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::err::Error;
use crate::models::{
    Department, Message, RegisterStudent, RegisteredStudent, StudentSummary, Verification,
};
use crate::service::IdentityService;

pub type Service = Extension<Arc<IdentityService>>;

pub async fn register_student(
    Extension(svc): Service,
    Json(form): Json<RegisterStudent>,
) -> Result<(StatusCode, Json<RegisteredStudent>), Error> {
    let ids = svc.register(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredStudent {
            message: "Student registered",
            student_id: ids.student_id,
            matric_no: ids.matric_no,
        }),
    ))
}

pub async fn list_students(Extension(svc): Service) -> Result<Json<Vec<StudentSummary>>, Error> {
    Ok(Json(svc.list_students().await?))
}

/// Matric numbers contain slashes, so the identifier is the whole path tail.
pub async fn verify_identity(
    Path(identifier): Path<String>,
    Extension(svc): Service,
) -> Result<Json<Verification>, Error> {
    let identifier = identifier.trim_start_matches('/');
    Ok(Json(svc.verify(identifier).await?))
}

pub async fn list_departments(Extension(svc): Service) -> Result<Json<Vec<Department>>, Error> {
    Ok(Json(svc.list_departments().await?))
}

pub async fn delete_student(
    Path(student_id): Path<String>,
    Extension(svc): Service,
) -> Result<Json<Message>, Error> {
    svc.delete_student(&student_id).await?;
    Ok(Json(Message {
        message: "Deleted successfully",
    }))
}

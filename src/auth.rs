use std::ops::Add;
use std::sync::Arc;

use axum::{Extension, Json};
use chrono::{Duration, Utc};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

use crate::err::Error;
use crate::models::{LoginOperator, OperatorSession};

/// Decides whether console credentials are acceptable. This gates the admin
/// console UI only; API routes do not check sessions.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Accepts any non-empty username and password.
pub struct PermissiveProvider;

impl IdentityProvider for PermissiveProvider {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        !username.trim().is_empty() && !password.is_empty()
    }
}

pub async fn login_operator(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    Json(login): Json<LoginOperator>,
) -> Result<Json<OperatorSession>, Error> {
    if !provider.authenticate(&login.username, &login.password) {
        return Err(Error::Unauthorized {
            message: "Username and password are required!".to_string(),
        });
    }

    let ssid_bytes: [u8; 32] = thread_rng().gen();

    let mut hasher: Sha256 = Digest::new();
    hasher.update(&ssid_bytes);
    let session_id = hex::encode(hasher.finalize());

    let expires_at = Utc::now().add(Duration::days(2));
    log::info!("Operator `{}` signed in", login.username.trim());

    Ok(Json(OperatorSession {
        username: login.username.trim().to_string(),
        session_id,
        expires_at,
    }))
}

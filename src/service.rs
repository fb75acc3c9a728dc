use std::sync::Arc;

use chrono::{Datelike, Local, Months, NaiveDate};
use rand::Rng;

use crate::err::Error;
use crate::models::{
    Department, FormNumber, NewCard, NewStudent, RegisterStudent, StudentSummary, Verification,
    VerificationRecord, ACTIVE_STATUS,
};
use crate::store::IdentityStore;

/// Attempts made to find a free identifier triple before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 5;
/// Identity cards stay valid for four years from issue.
pub const CARD_VALIDITY_MONTHS: u32 = 48;
pub const DEFAULT_PROGRAMME_ID: i32 = 1;

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;
pub type Minter = Arc<dyn Fn(i32) -> Identifiers + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    pub student_id: String,
    pub matric_no: String,
    pub card_number: String,
}

/// Mints `SID-<year>-<nnnn>`, `MAT/<year>/<n>` and `ID-<year>-<nnnn>`, the card
/// sharing the student id's four digit suffix.
pub fn mint_identifiers<R: Rng + ?Sized>(year: i32, rng: &mut R) -> Identifiers {
    let serial: u16 = rng.gen_range(1000..=9999);
    let matric: u16 = rng.gen_range(0..=999);
    Identifiers {
        student_id: format!("SID-{}-{}", year, serial),
        matric_no: format!("MAT/{}/{}", year, matric),
        card_number: format!("ID-{}-{}", year, serial),
    }
}

/// A card is valid while its status is `Active` and its expiry date has not
/// passed. The expiry day itself still counts.
pub fn is_valid(status_name: &str, expiry_date: NaiveDate, today: NaiveDate) -> bool {
    status_name == ACTIVE_STATUS && expiry_date >= today
}

pub fn expiry_for(issue_date: NaiveDate) -> Result<NaiveDate, Error> {
    issue_date
        .checked_add_months(Months::new(CARD_VALIDITY_MONTHS))
        .ok_or_else(|| Error::validation(format!("no expiry date exists for {}", issue_date)))
}

pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
    today: Clock,
    minter: Minter,
}

impl IdentityService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            today: Arc::new(|| Local::now().naive_local().date()),
            minter: Arc::new(|year: i32| mint_identifiers(year, &mut rand::thread_rng())),
        }
    }

    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    pub fn with_minter(mut self, minter: Minter) -> Self {
        self.minter = minter;
        self
    }

    pub async fn register(&self, form: RegisterStudent) -> Result<Identifiers, Error> {
        let details = validate(form)?;
        let issue_date = (self.today)();
        let expiry_date = expiry_for(issue_date)?;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let ids = (self.minter)(issue_date.year());
            let student = NewStudent {
                student_id: ids.student_id.clone(),
                matric_no: ids.matric_no.clone(),
                ..details.clone()
            };
            let card = NewCard {
                card_number: ids.card_number.clone(),
                student_id: ids.student_id.clone(),
                issue_date,
                expiry_date,
                status_name: ACTIVE_STATUS,
            };

            match self.store.insert_registration(&student, &card).await {
                Ok(()) => {
                    log::info!(
                        "Registered student {} ({}) with card {}",
                        ids.student_id,
                        ids.matric_no,
                        ids.card_number
                    );
                    return Ok(ids);
                }
                Err(Error::Conflict { message }) => {
                    log::warn!(
                        "Identifier collision on attempt {}/{}: {}",
                        attempt,
                        MAX_ALLOCATION_ATTEMPTS,
                        message
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::Conflict {
            message: format!(
                "could not allocate unique identifiers after {} attempts",
                MAX_ALLOCATION_ATTEMPTS
            ),
        })
    }

    pub async fn list_students(&self) -> Result<Vec<StudentSummary>, Error> {
        self.store.list_students().await
    }

    pub async fn verify(&self, identifier: &str) -> Result<Verification, Error> {
        let record = self.store.find_verification(identifier).await?;
        Ok(match record {
            Some(record) => Verification {
                valid: self.is_record_valid(&record),
                data: Some(record),
                message: None,
            },
            None => Verification {
                valid: false,
                data: None,
                message: Some("Not found"),
            },
        })
    }

    pub async fn delete_student(&self, student_id: &str) -> Result<(), Error> {
        if self.store.delete_student(student_id).await? {
            log::info!("Deleted student {}", student_id);
            Ok(())
        } else {
            log::warn!("Delete requested for unknown student {}", student_id);
            Err(Error::NotFound {
                message: format!("Student `{}` does not exist!", student_id),
            })
        }
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, Error> {
        self.store.list_departments().await
    }

    fn is_record_valid(&self, record: &VerificationRecord) -> bool {
        is_valid(&record.status_name, record.expiry_date, (self.today)())
    }
}

/// Checks the required registration fields and returns the student row
/// without identifiers.
fn validate(form: RegisterStudent) -> Result<NewStudent, Error> {
    let required = |value: Option<String>, field: &str| {
        let value = value.as_deref().unwrap_or_default().trim().to_string();
        if value.is_empty() {
            Err(Error::validation(format!("`{}` is required", field)))
        } else {
            Ok(value)
        }
    };

    let first_name = required(form.first_name, "firstName")?;
    let last_name = required(form.last_name, "lastName")?;
    let department_id = match form.department_id {
        Some(FormNumber::Number(id)) => id,
        Some(FormNumber::Text(text)) => required(Some(text), "departmentId")?
            .parse::<i32>()
            .map_err(|_| Error::validation("`departmentId` must be a number"))?,
        None => return Err(Error::validation("`departmentId` is required")),
    };
    if department_id <= 0 {
        return Err(Error::validation(format!(
            "`departmentId` {} is not a department",
            department_id
        )));
    }
    let dob = required(form.dob, "dob")?;
    let dob = NaiveDate::parse_from_str(&dob, "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("`dob` must be YYYY-MM-DD, got `{}`", dob)))?;
    let email = required(form.email, "email")?;

    Ok(NewStudent {
        student_id: String::new(),
        matric_no: String::new(),
        first_name,
        last_name,
        department_id,
        programme_id: form.programme_id.unwrap_or(DEFAULT_PROGRAMME_ID),
        gender: form
            .gender
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty()),
        dob,
        email,
    })
}

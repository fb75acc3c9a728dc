#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::err::Error;
use crate::models::{Department, NewCard, NewStudent, StudentSummary, VerificationRecord};

/// Persistence seam of the identity service. Implementations report unique
/// constraint violations as [`Error::Conflict`] and every other failure as
/// [`Error::Storage`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts the student and its card atomically.
    async fn insert_registration(&self, student: &NewStudent, card: &NewCard) -> Result<(), Error>;

    async fn list_students(&self) -> Result<Vec<StudentSummary>, Error>;

    /// Strict lookup by student id or matric number. Students lacking a card,
    /// a card status or a department are not found.
    async fn find_verification(&self, identifier: &str)
        -> Result<Option<VerificationRecord>, Error>;

    /// Removes the student and its cards. Returns `false` when no student row matched.
    async fn delete_student(&self, student_id: &str) -> Result<bool, Error>;

    async fn list_departments(&self) -> Result<Vec<Department>, Error>;
}

pub struct PgStore {
    pg: PgPool,
}

impl PgStore {
    pub fn new(pg: PgPool) -> Self {
        Self { pg }
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn insert_registration(&self, student: &NewStudent, card: &NewCard) -> Result<(), Error> {
        let mut tx = self.pg.begin().await?;

        sqlx::query(
            "INSERT INTO student \
             (student_id, matric_no, first_name, last_name, department_id, programme_id, gender, dob, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&student.student_id)
        .bind(&student.matric_no)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.department_id)
        .bind(student.programme_id)
        .bind(&student.gender)
        .bind(student.dob)
        .bind(&student.email)
        .execute(&mut tx)
        .await?;

        let res = sqlx::query(
            "INSERT INTO identity_card (card_number, student_id, issue_date, expiry_date, status_id) \
             SELECT $1, $2, $3, $4, status_id FROM card_status WHERE status_name = $5",
        )
        .bind(&card.card_number)
        .bind(&card.student_id)
        .bind(card.issue_date)
        .bind(card.expiry_date)
        .bind(card.status_name)
        .execute(&mut tx)
        .await?;

        if res.rows_affected() < 1 {
            // dropping the transaction rolls the student insert back
            return Err(Error::Storage {
                message: format!("card status `{}` is not defined", card.status_name),
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<StudentSummary>, Error> {
        let rows = sqlx::query_as::<_, StudentSummary>(
            "SELECT s.student_id, s.first_name, s.last_name, s.matric_no, \
                    d.name AS department, cs.status_name AS status \
             FROM student s \
             LEFT JOIN department d ON s.department_id = d.dept_id \
             LEFT JOIN identity_card ic ON s.student_id = ic.student_id \
             LEFT JOIN card_status cs ON ic.status_id = cs.status_id \
             ORDER BY s.student_id",
        )
        .fetch_all(&self.pg)
        .await?;
        Ok(rows)
    }

    async fn find_verification(
        &self,
        identifier: &str,
    ) -> Result<Option<VerificationRecord>, Error> {
        let row = sqlx::query_as::<_, VerificationRecord>(
            "SELECT s.student_id, s.first_name, s.last_name, s.matric_no, \
                    d.name AS department, cs.status_name, ic.expiry_date \
             FROM student s \
             JOIN identity_card ic ON s.student_id = ic.student_id \
             JOIN card_status cs ON ic.status_id = cs.status_id \
             JOIN department d ON s.department_id = d.dept_id \
             WHERE s.student_id = $1 OR s.matric_no = $1 \
             LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pg)
        .await?;
        Ok(row)
    }

    async fn delete_student(&self, student_id: &str) -> Result<bool, Error> {
        let mut tx = self.pg.begin().await?;

        sqlx::query("DELETE FROM identity_card WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut tx)
            .await?;
        let affected = sqlx::query("DELETE FROM student WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(affected.rows_affected() >= 1)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, Error> {
        let rows =
            sqlx::query_as::<_, Department>("SELECT dept_id, name FROM department ORDER BY dept_id")
                .fetch_all(&self.pg)
                .await?;
        Ok(rows)
    }
}

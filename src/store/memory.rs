use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::err::Error;
use crate::models::{Department, NewCard, NewStudent, StudentSummary, VerificationRecord};
use crate::store::IdentityStore;

struct CardRow {
    card_number: String,
    student_id: String,
    expiry_date: NaiveDate,
    status_id: i32,
}

#[derive(Default)]
struct Tables {
    students: Vec<NewStudent>,
    departments: Vec<Department>,
    cards: Vec<CardRow>,
    statuses: Vec<(i32, String)>,
}

/// Table-backed stand-in for PostgreSQL with the same constraints and joins.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Two departments and the usual card statuses.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut tables = store.tables.lock().unwrap();
            tables.departments = vec![
                Department {
                    dept_id: 1,
                    name: "Computer Science".into(),
                },
                Department {
                    dept_id: 2,
                    name: "Mechanical Engineering".into(),
                },
            ];
            tables.statuses = vec![
                (1, "Active".into()),
                (2, "Revoked".into()),
                (3, "Expired".into()),
            ];
        }
        store
    }

    pub fn insert_student_without_card(&self, student: NewStudent) {
        self.tables.lock().unwrap().students.push(student);
    }

    pub fn set_card(&self, student_id: &str, status: &str, expiry_date: NaiveDate) {
        let mut tables = self.tables.lock().unwrap();
        let status_id = tables
            .statuses
            .iter()
            .find(|(_, name)| name == status)
            .map(|(id, _)| *id)
            .unwrap();
        let card = tables
            .cards
            .iter_mut()
            .find(|card| card.student_id == student_id)
            .unwrap();
        card.status_id = status_id;
        card.expiry_date = expiry_date;
    }

    pub fn drop_status(&self, status: &str) {
        self.tables
            .lock()
            .unwrap()
            .statuses
            .retain(|(_, name)| name != status);
    }

    pub fn student_count(&self) -> usize {
        self.tables.lock().unwrap().students.len()
    }

    pub fn card_count(&self) -> usize {
        self.tables.lock().unwrap().cards.len()
    }
}

fn department_name(tables: &Tables, dept_id: i32) -> Option<String> {
    tables
        .departments
        .iter()
        .find(|d| d.dept_id == dept_id)
        .map(|d| d.name.clone())
}

fn card_status(tables: &Tables, student_id: &str) -> Option<(String, NaiveDate)> {
    let card = tables.cards.iter().find(|c| c.student_id == student_id)?;
    let status = tables
        .statuses
        .iter()
        .find(|(id, _)| *id == card.status_id)?;
    Some((status.1.clone(), card.expiry_date))
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn insert_registration(&self, student: &NewStudent, card: &NewCard) -> Result<(), Error> {
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables
            .students
            .iter()
            .any(|s| s.student_id == student.student_id || s.matric_no == student.matric_no)
            || tables.cards.iter().any(|c| c.card_number == card.card_number);
        if duplicate {
            return Err(Error::Conflict {
                message: "duplicate key value violates unique constraint".into(),
            });
        }
        if department_name(&tables, student.department_id).is_none() {
            return Err(Error::Storage {
                message: "insert violates foreign key constraint on department_id".into(),
            });
        }
        tables.students.push(student.clone());

        let status_id = tables
            .statuses
            .iter()
            .find(|(_, name)| name == card.status_name)
            .map(|(id, _)| *id);
        let status_id = match status_id {
            Some(id) => id,
            None => {
                // rollback
                tables.students.retain(|s| s.student_id != student.student_id);
                return Err(Error::Storage {
                    message: format!("card status `{}` is not defined", card.status_name),
                });
            }
        };

        tables.cards.push(CardRow {
            card_number: card.card_number.clone(),
            student_id: card.student_id.clone(),
            expiry_date: card.expiry_date,
            status_id,
        });
        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<StudentSummary>, Error> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<StudentSummary> = tables
            .students
            .iter()
            .map(|s| StudentSummary {
                student_id: s.student_id.clone(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
                matric_no: s.matric_no.clone(),
                department: department_name(&tables, s.department_id),
                status: card_status(&tables, &s.student_id).map(|(name, _)| name),
            })
            .collect();
        rows.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        Ok(rows)
    }

    async fn find_verification(
        &self,
        identifier: &str,
    ) -> Result<Option<VerificationRecord>, Error> {
        let tables = self.tables.lock().unwrap();
        let record = tables
            .students
            .iter()
            .filter(|s| s.student_id == identifier || s.matric_no == identifier)
            .find_map(|s| {
                let department = department_name(&tables, s.department_id)?;
                let (status_name, expiry_date) = card_status(&tables, &s.student_id)?;
                Some(VerificationRecord {
                    student_id: s.student_id.clone(),
                    first_name: s.first_name.clone(),
                    last_name: s.last_name.clone(),
                    matric_no: s.matric_no.clone(),
                    department,
                    status_name,
                    expiry_date,
                })
            });
        Ok(record)
    }

    async fn delete_student(&self, student_id: &str) -> Result<bool, Error> {
        let mut tables = self.tables.lock().unwrap();
        tables.cards.retain(|c| c.student_id != student_id);
        let before = tables.students.len();
        tables.students.retain(|s| s.student_id != student_id);
        Ok(tables.students.len() < before)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, Error> {
        Ok(self.tables.lock().unwrap().departments.clone())
    }
}

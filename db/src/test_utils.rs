//! Seed factories shared by unit and integration tests.

use crate::models::course::Course;
use crate::models::enrollment::Enrollment;
use crate::models::faculty::Faculty;
use crate::models::student::Student;
use crate::store::DocumentStore;
use chrono::Utc;

pub async fn seed_student(
    store: &dyn DocumentStore,
    user_id: &str,
    name: &str,
    roll_no: &str,
) -> Student {
    let now = Utc::now();
    let student = Student {
        user_id: user_id.to_owned(),
        email: Some(format!("{user_id}@test.edu")),
        name: name.to_owned(),
        roll_no: roll_no.to_owned(),
        department: Some("CSE".to_owned()),
        device_id: None,
        device_bound_at: None,
        created_at: now,
        updated_at: now,
    };
    student.save(store).await.expect("seed student");
    student
}

pub async fn seed_faculty(store: &dyn DocumentStore, user_id: &str, name: &str) -> Faculty {
    let now = Utc::now();
    let faculty = Faculty {
        user_id: user_id.to_owned(),
        email: Some(format!("{user_id}@test.edu")),
        name: name.to_owned(),
        department: Some("CSE".to_owned()),
        created_at: now,
        updated_at: now,
    };
    faculty.save(store).await.expect("seed faculty");
    faculty
}

pub async fn seed_course(
    store: &dyn DocumentStore,
    faculty_id: &str,
    code: &str,
    name: &str,
) -> Course {
    Course::create(store, faculty_id, code, name, "CSE", None, Utc::now())
        .await
        .expect("seed course")
}

pub async fn seed_enrollment(
    store: &dyn DocumentStore,
    student_id: &str,
    course_id: &str,
) -> Enrollment {
    Enrollment::create(store, student_id, course_id, Some("join-code"), Utc::now())
        .await
        .expect("seed enrollment")
}

//! Application state shared across Axum route handlers and middleware.
//!
//! Holds the document store handle, the per-entity caches, and the rate
//! limiter. All three are constructed once at process start and passed by
//! injection; none of them live in process-wide globals.

use db::DocumentStore;
use db::models::{course::Course, faculty::Faculty, student::Student};
use std::sync::Arc;
use std::time::Duration;
use util::cache::TtlCache;
use util::rate_limit::FixedWindowLimiter;

/// Per-entity read-through caches, keyed by namespaced strings.
///
/// Profile caches run on the long TTL; dashboard aggregates go stale fast,
/// so they get their own short-TTL cache.
pub struct Caches {
    pub students: TtlCache<Student>,
    pub courses: TtlCache<Course>,
    pub faculty: TtlCache<Faculty>,
    pub dashboards: TtlCache<serde_json::Value>,
}

impl Caches {
    fn from_config() -> Self {
        let profile_ttl = Duration::from_secs(util::config::profile_cache_ttl_seconds());
        let dashboard_ttl = Duration::from_secs(util::config::dashboard_cache_ttl_seconds());
        Self {
            students: TtlCache::new(500, profile_ttl),
            courses: TtlCache::new(200, profile_ttl),
            faculty: TtlCache::new(100, profile_ttl),
            dashboards: TtlCache::new(500, dashboard_ttl),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    caches: Arc<Caches>,
    limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let limiter = FixedWindowLimiter::new(
            util::config::rate_limit_max_requests(),
            Duration::from_secs(util::config::rate_limit_window_seconds()),
        );
        Self {
            store,
            caches: Arc::new(Caches::from_config()),
            limiter: Arc::new(limiter),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Read-through student lookup: `students/{id}` behind `student:{id}`.
    pub async fn student_cached(
        &self,
        user_id: &str,
    ) -> Result<Option<Student>, db::StoreError> {
        let key = format!("student:{user_id}");
        if let Some(student) = self.caches.students.get(&key) {
            return Ok(Some(student));
        }
        match Student::find(self.store(), user_id).await? {
            Some(student) => {
                self.caches.students.set(key, student.clone());
                Ok(Some(student))
            }
            None => Ok(None),
        }
    }

    /// Read-through course lookup: `courses/{id}` behind `course:{id}`.
    pub async fn course_cached(
        &self,
        course_id: &str,
    ) -> Result<Option<Course>, db::StoreError> {
        let key = format!("course:{course_id}");
        if let Some(course) = self.caches.courses.get(&key) {
            return Ok(Some(course));
        }
        match Course::find(self.store(), course_id).await? {
            Some(course) => {
                self.caches.courses.set(key, course.clone());
                Ok(Some(course))
            }
            None => Ok(None),
        }
    }

    /// Read-through faculty lookup: `faculty/{id}` behind `faculty:{id}`.
    pub async fn faculty_cached(
        &self,
        user_id: &str,
    ) -> Result<Option<Faculty>, db::StoreError> {
        let key = format!("faculty:{user_id}");
        if let Some(faculty) = self.caches.faculty.get(&key) {
            return Ok(Some(faculty));
        }
        match Faculty::find(self.store(), user_id).await? {
            Some(faculty) => {
                self.caches.faculty.set(key, faculty.clone());
                Ok(Some(faculty))
            }
            None => Ok(None),
        }
    }

    /// Drops every cache namespace derived from the student. Runs
    /// synchronously inside mutating handlers, before their response, so a
    /// read issued right after the write never sees pre-write data.
    pub fn invalidate_student(&self, student_id: &str) {
        self.caches.students.invalidate(&format!("student:{student_id}"));
        self.caches
            .dashboards
            .invalidate(&format!("dashboard:{student_id}"));
        self.caches
            .dashboards
            .invalidate(&format!("timetable:{student_id}"));
    }

    /// Drops the course entry and every aggregate that may embed it.
    pub fn invalidate_course(&self, course_id: &str) {
        self.caches.courses.invalidate(&format!("course:{course_id}"));
        // Any student dashboard may include this course.
        self.caches.dashboards.invalidate("dashboard:");
        self.caches.dashboards.invalidate("timetable:");
    }
}

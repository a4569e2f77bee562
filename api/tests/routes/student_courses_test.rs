#[cfg(test)]
mod tests {
    use api::auth::{Role, generate_jwt};
    use db::models::course::Course;
    use db::test_utils::{seed_course, seed_enrollment, seed_faculty, seed_student};
    use serde_json::json;

    use crate::helpers::{make_test_app, request, send};

    const CAMPUS_LAT: f64 = 21.128472;
    const CAMPUS_LNG: f64 = 81.766132;

    #[tokio::test]
    async fn join_course_by_code_creates_enrollment_once() {
        let (app, state) = make_test_app().await;
        seed_faculty(state.store(), "fac-1", "Dr. Rao").await;
        let course = seed_course(state.store(), "fac-1", "CS301", "Operating Systems").await;
        seed_student(state.store(), "s1", "Alice", "R1").await;
        let (token, _) = generate_jwt("s1", Role::Student, None);

        let req = request(
            "POST",
            "/api/student/join-course",
            Some(&token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "joinCode": course.join_code.to_lowercase() })),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200, "join failed: {body}");
        assert_eq!(body["data"]["id"], course.id);

        let updated = Course::find(state.store(), &course.id).await.unwrap().unwrap();
        assert_eq!(updated.enrolled_count, 1);

        // joining again is a rejected duplicate, not a second enrollment
        let req = request(
            "POST",
            "/api/student/join-course",
            Some(&token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "joinCode": course.join_code })),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Already enrolled in this course");
        let updated = Course::find(state.store(), &course.id).await.unwrap().unwrap();
        assert_eq!(updated.enrolled_count, 1);
    }

    #[tokio::test]
    async fn join_course_rejects_bad_or_missing_codes() {
        let (app, state) = make_test_app().await;
        seed_student(state.store(), "s1", "Alice", "R1").await;
        let (token, _) = generate_jwt("s1", Role::Student, None);

        let req = request(
            "POST",
            "/api/student/join-course",
            Some(&token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "joinCode": "ZZZZZZ" })),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 404);

        let req = request(
            "POST",
            "/api/student/join-course",
            Some(&token),
            [127, 0, 0, 1],
            None,
            Some(json!({})),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn attendance_history_serves_denormalized_rows() {
        let (app, state) = make_test_app().await;
        seed_faculty(state.store(), "fac-1", "Dr. Rao").await;
        let course = seed_course(state.store(), "fac-1", "CS301", "Operating Systems").await;
        seed_student(state.store(), "s1", "Alice", "R1").await;
        seed_enrollment(state.store(), "s1", &course.id).await;
        let (faculty_token, _) = generate_jwt("fac-1", Role::Faculty, None);
        let (student_token, _) = generate_jwt("s1", Role::Student, None);

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({
                "courseId": course.id,
                "location": { "latitude": CAMPUS_LAT, "longitude": CAMPUS_LNG, "radius": 100 },
            })),
        );
        let (_, body) = send(&app, req).await;
        let payload = body["data"]["qrPayload"].clone();

        let req = request(
            "POST",
            "/api/student/scan",
            Some(&student_token),
            [127, 0, 0, 1],
            Some("dev-a"),
            Some(json!({
                "qrPayload": payload,
                "latitude": CAMPUS_LAT,
                "longitude": CAMPUS_LNG,
            })),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        let req = request(
            "GET",
            "/api/student/attendance-history",
            Some(&student_token),
            [127, 0, 0, 1],
            None,
            None,
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        let records = body["data"]["attendanceRecords"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["status"], "present");
        assert_eq!(records[0]["courseCode"], "CS301");
        assert_eq!(records[0]["courseName"], "Operating Systems");
    }

    #[tokio::test]
    async fn dashboard_reflects_a_scan_immediately() {
        let (app, state) = make_test_app().await;
        seed_faculty(state.store(), "fac-1", "Dr. Rao").await;
        let course = seed_course(state.store(), "fac-1", "CS301", "Operating Systems").await;
        seed_student(state.store(), "s1", "Alice", "R1").await;
        seed_enrollment(state.store(), "s1", &course.id).await;
        let (faculty_token, _) = generate_jwt("fac-1", Role::Faculty, None);
        let (student_token, _) = generate_jwt("s1", Role::Student, None);

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({
                "courseId": course.id,
                "location": { "latitude": CAMPUS_LAT, "longitude": CAMPUS_LNG, "radius": 100 },
            })),
        );
        let (_, body) = send(&app, req).await;
        let payload = body["data"]["qrPayload"].clone();

        // Prime the dashboard cache: one absent row, nothing present.
        let dash = |token: &str| {
            request("GET", "/api/student/dashboard", Some(token), [127, 0, 0, 1], None, None)
        };
        let (status, body) = send(&app, dash(&student_token)).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["stats"]["totalClasses"], 1);
        assert_eq!(body["data"]["stats"]["presentCount"], 0);

        let req = request(
            "POST",
            "/api/student/scan",
            Some(&student_token),
            [127, 0, 0, 1],
            Some("dev-a"),
            Some(json!({
                "qrPayload": payload,
                "latitude": CAMPUS_LAT,
                "longitude": CAMPUS_LNG,
            })),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        // The scan invalidated dashboard:{s1} before responding, so this
        // read must already see the present mark.
        let (_, body) = send(&app, dash(&student_token)).await;
        assert_eq!(body["data"]["stats"]["presentCount"], 1);
        assert_eq!(body["data"]["stats"]["attendancePercentage"], "100.0");
    }
}

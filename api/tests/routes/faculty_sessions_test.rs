#[cfg(test)]
mod tests {
    use api::auth::{Role, generate_jwt};
    use api::state::AppState;
    use db::models::active_qr::ActiveQr;
    use db::models::attendance_record::{AttendanceRecord, AttendanceStatus};
    use db::models::course::Course;
    use db::test_utils::{seed_course, seed_enrollment, seed_faculty, seed_student};
    use serde_json::json;

    use crate::helpers::{make_test_app, request, send};

    const CAMPUS_LAT: f64 = 21.128472;
    const CAMPUS_LNG: f64 = 81.766132;

    struct TestCtx {
        faculty_token: String,
        course: Course,
    }

    async fn setup(state: &AppState) -> TestCtx {
        let store = state.store();
        seed_faculty(store, "fac-1", "Dr. Rao").await;
        let course = seed_course(store, "fac-1", "CS301", "Operating Systems").await;
        for (id, name, roll) in [
            ("s1", "Alice", "R1"),
            ("s2", "Bob", "R2"),
            ("s3", "Cara", "R3"),
        ] {
            seed_student(store, id, name, roll).await;
            seed_enrollment(store, id, &course.id).await;
        }
        let (faculty_token, _) = generate_jwt("fac-1", Role::Faculty, Some("rao@test.edu"));
        TestCtx {
            faculty_token,
            course,
        }
    }

    fn create_session_body(course_id: &str) -> serde_json::Value {
        json!({
            "courseId": course_id,
            "location": { "latitude": CAMPUS_LAT, "longitude": CAMPUS_LNG, "radius": 50 },
            "refreshIntervalSeconds": 5,
            "roomNumber": "A-101",
        })
    }

    #[tokio::test]
    async fn create_session_seeds_absent_rows_and_issues_qr() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);

        let data = &body["data"];
        assert_eq!(data["expiresIn"], 5);
        assert_eq!(data["qrPayload"]["qrVersion"], 1);
        assert_eq!(data["qrPayload"]["courseId"], ctx.course.id);
        assert_eq!(data["session"]["totalStudents"], 3);
        assert_eq!(data["session"]["presentCount"], 0);
        assert_eq!(data["session"]["isActive"], true);

        // every enrolled student got a system-authored absent row
        let session_id = data["sessionId"].as_str().unwrap();
        let rows = AttendanceRecord::for_session(state.store(), session_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.status == AttendanceStatus::Absent));

        // and the active token is stored for the version check
        let active = ActiveQr::find(state.store(), session_id).await.unwrap();
        assert_eq!(active.unwrap().payload.qr_version, 1);
    }

    #[tokio::test]
    async fn create_session_requires_location() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "courseId": ctx.course.id })),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn create_session_unknown_course_is_404() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body("no-such-course")),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn create_session_rejects_non_owner_and_students() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let (other_faculty, _) = generate_jwt("fac-2", Role::Faculty, None);
        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&other_faculty),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 403);

        let (student_token, _) = generate_jwt("s1", Role::Student, None);
        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&student_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 403);
        assert_eq!(body["message"], "Faculty access required");
    }

    #[tokio::test]
    async fn refresh_qr_rotates_version_and_overwrites_token() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (_, body) = send(&app, req).await;
        let session_id = body["data"]["sessionId"].as_str().unwrap().to_owned();

        let uri = format!("/api/faculty/sessions/{session_id}/refresh-qr");
        let req = request("POST", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["qrVersion"], 2);
        assert_eq!(body["data"]["qrPayload"]["qrVersion"], 2);

        let active = ActiveQr::find(state.store(), &session_id).await.unwrap();
        assert_eq!(active.unwrap().payload.qr_version, 2);

        let req = request("POST", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["qrVersion"], 3);
    }

    #[tokio::test]
    async fn refresh_qr_unknown_session_is_404() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions/no-such-session/refresh-qr",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            None,
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn stop_session_removes_token_and_blocks_rotation() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (_, body) = send(&app, req).await;
        let session_id = body["data"]["sessionId"].as_str().unwrap().to_owned();

        let stop_uri = format!("/api/faculty/sessions/{session_id}/stop");
        let req = request("POST", &stop_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);
        assert!(ActiveQr::find(state.store(), &session_id).await.unwrap().is_none());

        // stopped is terminal: rotation rejected
        let refresh_uri = format!("/api/faculty/sessions/{session_id}/refresh-qr");
        let req = request("POST", &refresh_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Session is not active");

        // stopping again is a harmless no-op
        let req = request("POST", &stop_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn manual_attendance_updates_counts_by_delta() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (_, body) = send(&app, req).await;
        let session_id = body["data"]["sessionId"].as_str().unwrap().to_owned();

        let uri = format!("/api/faculty/sessions/{session_id}/manual-attendance");
        let mark = |status: &str| json!({ "studentId": "s2", "status": status });

        let req = request("POST", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, Some(mark("present")));
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["markedBy"], "manual_faculty");

        // repeated click: no drift
        let req = request("POST", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, Some(mark("present")));
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        let attendance_uri = format!("/api/faculty/sessions/{session_id}/attendance");
        let req = request("GET", &attendance_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["presentCount"], 1);
        assert_eq!(body["data"]["session"]["presentCount"], 1);
        assert_eq!(body["data"]["totalAttendees"], 3);

        // back to absent: counter returns to zero
        let req = request("POST", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, Some(mark("absent")));
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        let req = request("GET", &attendance_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["presentCount"], 0);
        assert_eq!(body["data"]["session"]["presentCount"], 0);
    }

    #[tokio::test]
    async fn manual_attendance_validates_input() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (_, body) = send(&app, req).await;
        let session_id = body["data"]["sessionId"].as_str().unwrap().to_owned();
        let uri = format!("/api/faculty/sessions/{session_id}/manual-attendance");

        let req = request(
            "POST",
            &uri,
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "studentId": "s2", "status": "late" })),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 400);

        let req = request(
            "POST",
            &uri,
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "studentId": "ghost", "status": "present" })),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 404);
        assert_eq!(body["message"], "Student not found");
    }

    #[tokio::test]
    async fn course_roster_reports_present_flags() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(create_session_body(&ctx.course.id)),
        );
        let (_, body) = send(&app, req).await;
        let session_id = body["data"]["sessionId"].as_str().unwrap().to_owned();

        let uri = format!("/api/faculty/sessions/{session_id}/manual-attendance");
        let req = request(
            "POST",
            &uri,
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "studentId": "s1", "status": "present" })),
        );
        send(&app, req).await;

        let uri = format!(
            "/api/faculty/courses/{}/students?sessionId={session_id}",
            ctx.course.id
        );
        let req = request("GET", &uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        let students = body["data"]["students"].as_array().unwrap();
        assert_eq!(students.len(), 3);
        let alice = students.iter().find(|s| s["id"] == "s1").unwrap();
        assert_eq!(alice["present"], true);
        let bob = students.iter().find(|s| s["id"] == "s2").unwrap();
        assert_eq!(bob["present"], false);
    }
}

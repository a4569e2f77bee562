#[cfg(test)]
mod tests {
    use api::auth::{Role, generate_jwt};
    use api::state::AppState;
    use db::models::course::Course;
    use db::test_utils::{seed_course, seed_enrollment, seed_faculty, seed_student};
    use serde_json::{Value, json};
    use util::geofence::{EARTH_RADIUS_METERS, Geofence};

    use crate::helpers::{make_test_app, request, send};

    const CAMPUS_LAT: f64 = 21.128472;
    const CAMPUS_LNG: f64 = 81.766132;
    const METERS_PER_DEG_LAT: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

    struct TestCtx {
        faculty_token: String,
        student_tokens: Vec<String>,
        course: Course,
    }

    async fn setup(state: &AppState) -> TestCtx {
        let store = state.store();
        seed_faculty(store, "fac-1", "Dr. Rao").await;
        let course = seed_course(store, "fac-1", "CS301", "Operating Systems").await;
        let mut student_tokens = Vec::new();
        for (id, name, roll) in [
            ("s1", "Alice", "R1"),
            ("s2", "Bob", "R2"),
            ("s3", "Cara", "R3"),
        ] {
            seed_student(store, id, name, roll).await;
            seed_enrollment(store, id, &course.id).await;
            let (token, _) = generate_jwt(id, Role::Student, None);
            student_tokens.push(token);
        }
        TestCtx {
            faculty_token: generate_jwt("fac-1", Role::Faculty, None).0,
            student_tokens,
            course,
        }
    }

    /// Starts a session with the given radius and returns (sessionId, qrPayload).
    async fn start_session(
        app: &axum::Router,
        ctx: &TestCtx,
        radius: f64,
    ) -> (String, Value) {
        let req = request(
            "POST",
            "/api/faculty/sessions",
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({
                "courseId": ctx.course.id,
                "location": { "latitude": CAMPUS_LAT, "longitude": CAMPUS_LNG, "radius": radius },
                "refreshIntervalSeconds": 5,
            })),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, 200, "session start failed: {body}");
        (
            body["data"]["sessionId"].as_str().unwrap().to_owned(),
            body["data"]["qrPayload"].clone(),
        )
    }

    fn scan_body(payload: &Value, lat: f64, lng: f64) -> Value {
        json!({
            "qrPayload": payload,
            "latitude": lat,
            "longitude": lng,
            "accuracy": 5.0,
        })
    }

    fn scan_req(token: &str, device: &str, body: Value) -> axum::http::Request<axum::body::Body> {
        request(
            "POST",
            "/api/student/scan",
            Some(token),
            [127, 0, 0, 1],
            Some(device),
            Some(body),
        )
    }

    // ---------------------------
    // The full lifecycle scenario
    // ---------------------------

    #[tokio::test]
    async fn scenario_scan_rescan_manual_stop() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (session_id, payload) = start_session(&app, &ctx, 1200.0).await;

        // Student A scans a valid in-range QR -> present
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 200, "scan failed: {body}");
        assert_eq!(body["data"]["status"], "present");

        // Scanning again is rejected and does not bump the counter
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["data"]["reason"], "ALREADY_MARKED");

        let attendance_uri = format!("/api/faculty/sessions/{session_id}/attendance");
        let req = request("GET", &attendance_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["presentCount"], 1);
        assert_eq!(body["data"]["session"]["presentCount"], 1);
        assert_eq!(body["data"]["session"]["totalStudents"], 3);

        // Faculty manually marks B present -> 2
        let manual_uri = format!("/api/faculty/sessions/{session_id}/manual-attendance");
        let req = request(
            "POST",
            &manual_uri,
            Some(&ctx.faculty_token),
            [127, 0, 0, 1],
            None,
            Some(json!({ "studentId": "s2", "status": "present" })),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        let req = request("GET", &attendance_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["presentCount"], 2);
        assert_eq!(body["data"]["session"]["presentCount"], 2);

        // Stop the session; C's scan is now rejected
        let stop_uri = format!("/api/faculty/sessions/{session_id}/stop");
        let req = request("POST", &stop_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[2], "dev-c", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 404);
        assert_eq!(body["data"]["reason"], "SESSION_INACTIVE");
    }

    // ---------------------------
    // Geofence boundary
    // ---------------------------

    #[tokio::test]
    async fn geofence_boundary_passes_at_1199_fails_at_1201() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (_, payload) = start_session(&app, &ctx, 1200.0).await;

        // 1201m north of center: rejected, distance reported back
        let far_lat = CAMPUS_LAT + 1201.0 / METERS_PER_DEG_LAT;
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, far_lat, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["data"]["reason"], "TOO_FAR");
        assert_eq!(body["data"]["distance"], 1201);
        assert_eq!(body["data"]["maxDistance"], 1200);

        // 1199m: inside the fence
        let near_lat = CAMPUS_LAT + 1199.0 / METERS_PER_DEG_LAT;
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, near_lat, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 200, "boundary scan failed: {body}");
        assert_eq!(body["data"]["distance"], 1199);
    }

    // ---------------------------
    // Expiry, grace, and versions
    // ---------------------------

    fn hand_issued_payload(session_id: &str, course_id: &str, ttl_ms: i64, version: i64) -> Value {
        let payload = util::qr::issue(
            session_id,
            course_id,
            "fac-1",
            Some(Geofence::new(CAMPUS_LAT, CAMPUS_LNG, 1200.0)),
            ttl_ms,
            version,
            &util::config::qr_secret(),
            chrono::Utc::now(),
        );
        serde_json::to_value(payload).unwrap()
    }

    #[tokio::test]
    async fn expired_within_grace_accepted_past_grace_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (session_id, _) = start_session(&app, &ctx, 1200.0).await;

        // expiresAt 40s in the past: outside the 30s grace window
        let stale = hand_issued_payload(&session_id, &ctx.course.id, -40_000, 1);
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&stale, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["data"]["reason"], "EXPIRED");

        // expiresAt 10s in the past: the grace window absorbs it
        let recent = hand_issued_payload(&session_id, &ctx.course.id, -10_000, 1);
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&recent, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 200, "grace scan failed: {body}");
        assert_eq!(body["data"]["status"], "present");
    }

    #[tokio::test]
    async fn stale_version_still_accepted_within_grace_after_rotation() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (session_id, v1_payload) = start_session(&app, &ctx, 1200.0).await;

        // Faculty display rotates to version 2...
        let refresh_uri = format!("/api/faculty/sessions/{session_id}/refresh-qr");
        let req = request("POST", &refresh_uri, Some(&ctx.faculty_token), [127, 0, 0, 1], None, None);
        let (_, body) = send(&app, req).await;
        assert_eq!(body["data"]["qrVersion"], 2);

        // ...but a scan made against the version-1 code still lands, because
        // its grace-adjusted expiry has not passed.
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&v1_payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 200, "stale-version scan failed: {body}");
        assert_eq!(body["data"]["status"], "present");
    }

    // ---------------------------
    // Signature and session checks
    // ---------------------------

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (_, mut payload) = start_session(&app, &ctx, 1200.0).await;

        payload["signature"] = Value::from("deadbeef");
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["data"]["reason"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;

        let payload = hand_issued_payload("no-such-session", &ctx.course.id, 60_000, 1);
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 404);
        assert_eq!(body["data"]["reason"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn unenrolled_student_is_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (_, payload) = start_session(&app, &ctx, 1200.0).await;

        seed_student(state.store(), "outsider", "Eve", "R9").await;
        let (token, _) = generate_jwt("outsider", Role::Student, None);
        let (status, body) = send(
            &app,
            scan_req(&token, "dev-e", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 403);
        assert_eq!(body["data"]["reason"], "NOT_ENROLLED");
    }

    // ---------------------------
    // Device binding
    // ---------------------------

    #[tokio::test]
    async fn device_binds_on_first_scan_and_rejects_other_devices() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (_, payload) = start_session(&app, &ctx, 1200.0).await;

        // first scan binds dev-a to s1
        let (status, _) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-a", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 200);

        // a different device is now rejected before any scan logic runs
        let (status, body) = send(
            &app,
            scan_req(&ctx.student_tokens[0], "dev-b", scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        )
        .await;
        assert_eq!(status, 403);
        assert_eq!(body["data"]["reason"], "DEVICE_MISMATCH");
        assert_eq!(body["data"]["boundDevice"], "dev-a");
        assert_eq!(body["data"]["currentDevice"], "dev-b");
    }

    #[tokio::test]
    async fn missing_device_header_is_400() {
        let (app, state) = make_test_app().await;
        let ctx = setup(&state).await;
        let (_, payload) = start_session(&app, &ctx, 1200.0).await;

        let req = request(
            "POST",
            "/api/student/scan",
            Some(&ctx.student_tokens[0]),
            [127, 0, 0, 1],
            None,
            Some(scan_body(&payload, CAMPUS_LAT, CAMPUS_LNG)),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Device ID required");
    }
}

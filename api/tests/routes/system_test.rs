#[cfg(test)]
mod tests {
    use api::auth::{Role, generate_jwt};
    use crate::helpers::{make_test_app, request, send};

    #[tokio::test]
    async fn health_is_public() {
        let (app, _state) = make_test_app().await;
        let req = request("GET", "/api/health", None, [127, 0, 0, 1], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn cache_stats_requires_auth() {
        let (app, _state) = make_test_app().await;
        let req = request("GET", "/api/system/cache-stats", None, [127, 0, 0, 1], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 401);

        let (token, _) = generate_jwt("fac-1", Role::Faculty, None);
        let req = request("GET", "/api/system/cache-stats", Some(&token), [127, 0, 0, 1], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert!(body["data"]["caches"]["students"]["size"].is_number());
        assert!(body["data"]["rateLimiting"]["activeClients"].is_number());
    }

    #[tokio::test]
    async fn over_cap_requests_get_429_with_retry_hint() {
        let (app, _state) = make_test_app().await;
        let (token, _) = generate_jwt("fac-1", Role::Faculty, None);

        // default window cap is 100 requests; the 101st from the same
        // client must be limited
        let max = util::config::rate_limit_max_requests();
        for _ in 0..max {
            let req = request("GET", "/api/system/cache-stats", Some(&token), [9, 9, 9, 9], None, None);
            let (status, _) = send(&app, req).await;
            assert_eq!(status, 200);
        }

        let req = request("GET", "/api/system/cache-stats", Some(&token), [9, 9, 9, 9], None, None);
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 429);
        assert!(body["data"]["retryAfter"].as_u64().unwrap() > 0);

        // a different client is unaffected
        let req = request("GET", "/api/system/cache-stats", Some(&token), [9, 9, 9, 8], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);

        // and health stays reachable, it sits outside the limiter
        let req = request("GET", "/api/health", None, [9, 9, 9, 9], None, None);
        let (status, _) = send(&app, req).await;
        assert_eq!(status, 200);
    }
}

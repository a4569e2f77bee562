pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims, Role};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

/// Generates a bearer token and its expiry timestamp for a given subject.
///
/// Stands in for the external identity provider; also used by tests and
/// local tooling to mint credentials.
pub fn generate_jwt(subject: &str, role: Role, email: Option<&str>) -> (String, String) {
    let jwt_secret = util::config::jwt_secret();
    let jwt_duration_minutes = util::config::jwt_duration_minutes() as i64;

    let expiry = Utc::now() + Duration::minutes(jwt_duration_minutes);
    let claims = Claims {
        sub: subject.to_owned(),
        role,
        email: email.map(str::to_owned),
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}

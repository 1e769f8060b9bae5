// src/auth.rs
use chrono::Utc;

/// Builds the opaque session token handed out on login and signup.
///
/// Nothing in the service verifies these tokens: every endpoint trusts the
/// `userId` the caller supplies.
pub fn create_token(user_id: u64) -> String {
    format!("token_{}_{}", user_id, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        let before = Utc::now().timestamp_millis();
        let token = create_token(7);
        let millis: i64 = token
            .strip_prefix("token_7_")
            .and_then(|rest| rest.parse().ok())
            .expect("token_{id}_{millis}");
        assert!(millis >= before);
    }
}

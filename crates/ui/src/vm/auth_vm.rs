use services::AuthError;

pub const LOGIN_FAILED: &str = "Login failed";
pub const LOGOUT_FAILED: &str = "Logout failed";

/// Text shown under the sign-in form or on the map after an auth failure.
#[must_use]
pub fn auth_error_message(err: &AuthError, fallback: &str) -> String {
    match err {
        AuthError::Validation(message) => message.clone(),
        AuthError::Api(api) => api.user_message(fallback),
        _ => fallback.to_string(),
    }
}

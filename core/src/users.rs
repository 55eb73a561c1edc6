//! User accounts and user sessions.

use tracing::info;

use crate::client::{decode, encode, Client, SessionScope, STATUS_CREATED, STATUS_OK};
use crate::error::ApiError;
use crate::goals::FIELD_ID;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{LoginRequest, User};

const FIELD_EMAIL: &str = "email";
const FIELD_PASSWORD: &str = "password";
const FIELD_SESSION_TOKEN: &str = "session_token";

impl<T: Transport> Client<T> {
    /// # Errors
    ///
    /// `MissingField("email")` if the user has no email.
    pub fn build_create_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        if user.email.is_empty() {
            return Err(ApiError::MissingField(FIELD_EMAIL));
        }
        let body = encode(user)?;
        Ok(self.build_request(HttpMethod::Post, self.url("users"), Some(body), None))
    }

    /// Look a user up by id, or by email when `user_id` is zero.
    ///
    /// # Errors
    ///
    /// `MissingField("id")` if neither is given.
    pub fn build_get_user(
        &self,
        user_id: u64,
        email: &str,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if user_id == 0 && email.is_empty() {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let mut url = url::Url::parse(&self.url("users/details"))
            .map_err(|e| ApiError::Configuration(format!("invalid base url: {e}")))?;
        if user_id != 0 {
            url.query_pairs_mut()
                .append_pair(FIELD_ID, &user_id.to_string());
        } else {
            url.query_pairs_mut().append_pair(FIELD_EMAIL, email);
        }
        Ok(self.build_request(HttpMethod::Get, url.into(), None, user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if the user has no id.
    pub fn build_update_user(
        &self,
        user: &User,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if user.id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let body = encode(&user.permitted())?;
        Ok(self.build_request(HttpMethod::Put, self.url("users"), Some(body), user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("email")` or `MissingField("password")`.
    pub fn build_login_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        if user.email.is_empty() {
            return Err(ApiError::MissingField(FIELD_EMAIL));
        }
        if user.password.is_empty() {
            return Err(ApiError::MissingField(FIELD_PASSWORD));
        }
        let body = encode(&LoginRequest {
            email: &user.email,
            password: &user.password,
        })?;
        Ok(self.build_request(HttpMethod::Post, self.url("users/login"), Some(body), None))
    }

    /// # Errors
    ///
    /// `MissingField("session_token")` if the token is empty.
    pub fn build_logout_user(&self, user_session_token: &str) -> Result<HttpRequest, ApiError> {
        if user_session_token.is_empty() {
            return Err(ApiError::MissingField(FIELD_SESSION_TOKEN));
        }
        Ok(self.build_request(
            HttpMethod::Delete,
            self.url("users/logout"),
            None,
            Some(user_session_token),
        ))
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 201 only.
    pub fn create_user(&mut self, user: &User) -> Result<User, ApiError> {
        let request = self.build_create_user(user)?;
        let response = self.round_trip(&request, STATUS_CREATED, SessionScope::Application)?;
        decode(&response)
    }

    /// Fetch a user by id, or by email when `user_id` is zero.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn get_user(
        &mut self,
        user_id: u64,
        email: &str,
        user_session_token: Option<&str>,
    ) -> Result<User, ApiError> {
        let request = self.build_get_user(user_id, email, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// Update a user's profile fields. Password, balance, status and the
    /// internal address are never sent.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn update_user(
        &mut self,
        user: &User,
        user_session_token: Option<&str>,
    ) -> Result<User, ApiError> {
        let request = self.build_update_user(user, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// Log a user in and return their session token. The client's own
    /// session token is not replaced.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 201 only.
    /// `MissingSessionToken` if the API did not set a session cookie.
    pub fn login_user(&mut self, user: &User) -> Result<String, ApiError> {
        let request = self.build_login_user(user)?;
        let response = self.round_trip(&request, STATUS_CREATED, SessionScope::User)?;
        let token = response
            .session_cookie()
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingSessionToken)?;
        info!("user logged in");
        Ok(token.to_string())
    }

    /// End a user's session.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn logout_user(&mut self, user_session_token: &str) -> Result<(), ApiError> {
        let request = self.build_logout_user(user_session_token)?;
        self.round_trip(&request, STATUS_OK, SessionScope::User)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, created, ok, response, FakeTransport, ResponseExt};

    const USER_JSON: &str = r#"{"id":42,"email":"ada@example.com","first_name":"Ada","balance":0,"status":"active"}"#;

    #[test]
    fn create_user_requires_email() {
        let mut c = client(FakeTransport::default());
        let err = c.create_user(&User::default()).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("email")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn create_user_returns_new_id() {
        let transport = FakeTransport::default();
        transport.push(created(USER_JSON));
        let mut c = client(transport);

        let user = User {
            email: "ada@example.com".to_string(),
            password: "ExamplePass0!".to_string(),
            ..User::default()
        };
        let created_user = c.create_user(&user).unwrap();
        assert_ne!(created_user.id, 0);
        assert!(created_user.password.is_empty());

        let requests = c.transport().requests();
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["password"], "ExamplePass0!");
    }

    #[test]
    fn get_user_requires_id_or_email() {
        let mut c = client(FakeTransport::default());
        let err = c.get_user(0, "", None).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("id")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn get_user_by_id_and_by_email_resolve_same_record() {
        let transport = FakeTransport::default();
        transport.push(ok(USER_JSON));
        transport.push(ok(USER_JSON));
        let mut c = client(transport);

        let by_id = c.get_user(42, "", None).unwrap();
        let by_email = c.get_user(0, "ada@example.com", None).unwrap();
        assert_eq!(by_id, by_email);

        let requests = c.transport().requests();
        assert_eq!(requests[0].path, "http://localhost:3000/v1/users/details?id=42");
        assert_eq!(
            requests[1].path,
            "http://localhost:3000/v1/users/details?email=ada%40example.com"
        );
    }

    #[test]
    fn get_user_prefers_id_over_email() {
        let c = client(FakeTransport::default());
        let req = c.build_get_user(42, "ada@example.com", None).unwrap();
        assert!(req.path.ends_with("?id=42"));
    }

    #[test]
    fn update_user_requires_id_and_strips_password() {
        let transport = FakeTransport::default();
        transport.push(ok(USER_JSON));
        let mut c = client(transport);

        let mut user = User {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            password: "secret".to_string(),
            ..User::default()
        };
        let err = c.update_user(&user, None).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("id")));

        user.id = 42;
        let updated = c.update_user(&user, None).unwrap();
        assert_eq!(updated.first_name, "Ada");

        let requests = c.transport().requests();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["id"], 42);
    }

    #[test]
    fn login_user_returns_token_without_replacing_client_session() {
        let transport = FakeTransport::default();
        transport.push(created("{}").with_cookie("session_token=user-session"));
        let mut c = client(transport);
        c.set_session_token(Some("app".to_string()));

        let user = User {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            ..User::default()
        };
        let token = c.login_user(&user).unwrap();
        assert_eq!(token, "user-session");
        assert_eq!(c.session_token(), Some("app"));

        let requests = c.transport().requests();
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"email": "ada@example.com", "password": "secret"}));
    }

    #[test]
    fn login_user_validates_credentials() {
        let mut c = client(FakeTransport::default());
        let err = c
            .login_user(&User {
                email: "ada@example.com".to_string(),
                ..User::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("password")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn login_without_cookie_is_an_error() {
        let transport = FakeTransport::default();
        transport.push(created("{}"));
        let mut c = client(transport);
        let user = User {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            ..User::default()
        };
        assert!(matches!(c.login_user(&user).unwrap_err(), ApiError::MissingSessionToken));
    }

    #[test]
    fn login_with_wrong_password_is_an_api_error() {
        let transport = FakeTransport::default();
        transport.push(response(401, r#"{"code":401,"message":"invalid credentials","data":""}"#));
        let mut c = client(transport);
        let user = User {
            email: "ada@example.com".to_string(),
            password: "wrong".to_string(),
            ..User::default()
        };
        let err = c.login_user(&user).unwrap_err();
        assert_eq!(err.api_error().unwrap().message, "invalid credentials");
    }

    #[test]
    fn logout_user_sends_user_token() {
        let transport = FakeTransport::default();
        transport.push(ok(""));
        let mut c = client(transport);

        assert!(matches!(
            c.logout_user("").unwrap_err(),
            ApiError::MissingField("session_token")
        ));
        c.logout_user("user-session").unwrap();
        let requests = c.transport().requests();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert_eq!(requests[0].session_token(), Some("user-session"));
    }
}

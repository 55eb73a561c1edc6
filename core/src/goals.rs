//! Goal operations: create, read, update.
//!
//! Converting a goal lives in `conversions`, since the result is a
//! `Conversion`.

use crate::client::{decode, encode, Client, SessionScope, STATUS_CREATED, STATUS_OK};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::Goal;

pub(crate) const FIELD_ID: &str = "id";
pub(crate) const FIELD_CAMPAIGN_ID: &str = "campaign_id";

impl<T: Transport> Client<T> {
    /// # Errors
    ///
    /// `MissingField("campaign_id")` if the goal has no campaign.
    pub fn build_create_goal(
        &self,
        goal: &Goal,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if goal.campaign_id == 0 {
            return Err(ApiError::MissingField(FIELD_CAMPAIGN_ID));
        }
        let body = encode(goal)?;
        Ok(self.build_request(HttpMethod::Post, self.url("goals"), Some(body), user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if `goal_id` is zero.
    pub fn build_get_goal(
        &self,
        goal_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if goal_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let url = self.url(&format!("goals/details/{goal_id}"));
        Ok(self.build_request(HttpMethod::Get, url, None, user_session_token))
    }

    /// The body carries only the fields a goal owner may change.
    ///
    /// # Errors
    ///
    /// `MissingField("id")` if the goal has no id.
    pub fn build_update_goal(
        &self,
        goal: &Goal,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if goal.id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let body = encode(&goal.permitted())?;
        Ok(self.build_request(HttpMethod::Put, self.url("goals"), Some(body), user_session_token))
    }

    /// Create a goal under its campaign. Pass `user_session_token` to act on
    /// behalf of another user.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 201 only.
    pub fn create_goal(
        &mut self,
        goal: &Goal,
        user_session_token: Option<&str>,
    ) -> Result<Goal, ApiError> {
        let request = self.build_create_goal(goal, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_CREATED, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// Fetch a goal by id. A missing goal is an `Api` error with status 404.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn get_goal(
        &mut self,
        goal_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<Goal, ApiError> {
        let request = self.build_get_goal(goal_id, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn update_goal(
        &mut self,
        goal: &Goal,
        user_session_token: Option<&str>,
    ) -> Result<Goal, ApiError> {
        let request = self.build_update_goal(goal, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ApiError;
    use crate::http::HttpMethod;
    use crate::testing::{client, created, ok, response, FakeTransport};
    use crate::types::Goal;

    const GOAL_JSON: &str = r#"{"id":13,"campaign_id":4,"name":"signup","title":"Sign up","description":"Create an account","payout_rate":0.05,"payouts":2,"payout_type":"flat"}"#;

    fn new_goal() -> Goal {
        Goal {
            campaign_id: 4,
            name: "signup".to_string(),
            title: "Sign up".to_string(),
            description: "Create an account".to_string(),
            payout_rate: 0.05,
            payout_type: "flat".to_string(),
            ..Goal::default()
        }
    }

    #[test]
    fn create_goal_requires_campaign_id() {
        let mut c = client(FakeTransport::default());
        let err = c.create_goal(&Goal::default(), None).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("campaign_id")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn get_goal_requires_id() {
        let mut c = client(FakeTransport::default());
        let err = c.get_goal(0, None).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("id")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn update_goal_requires_id() {
        let mut c = client(FakeTransport::default());
        let err = c.update_goal(&new_goal(), None).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("id")));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn create_goal_returns_assigned_id() {
        let transport = FakeTransport::default();
        transport.push(created(GOAL_JSON));
        let mut c = client(transport);

        let goal = c.create_goal(&new_goal(), None).unwrap();
        assert_ne!(goal.id, 0);
        assert_eq!(goal.campaign_id, 4);

        let requests = c.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "http://localhost:3000/v1/goals");
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["campaign_id"], 4);
        assert_eq!(body["name"], "signup");
        assert_eq!(body["id"], 0);
    }

    #[test]
    fn create_goal_with_200_is_an_error() {
        let transport = FakeTransport::default();
        transport.push(ok(GOAL_JSON));
        let mut c = client(transport);

        let err = c.create_goal(&new_goal(), None).unwrap_err();
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn get_goal_not_found_decodes_api_error() {
        let transport = FakeTransport::default();
        transport.push(response(
            404,
            r#"{"code":404,"message":"goal not found","data":"13","method":"GET"}"#,
        ));
        let mut c = client(transport);

        let err = c.get_goal(13, None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.api_error().unwrap().message, "goal not found");
        assert_eq!(c.last_request().error.as_ref().unwrap().data, "13");
        assert_eq!(c.last_request().url, "http://localhost:3000/v1/goals/details/13");
    }

    #[test]
    fn update_goal_strips_server_owned_fields() {
        let transport = FakeTransport::default();
        transport.push(ok(GOAL_JSON));
        let mut c = client(transport);

        let goal = Goal {
            id: 13,
            payouts: 99,
            ..new_goal()
        };
        let updated = c.update_goal(&goal, Some("user-token")).unwrap();
        assert_eq!(updated.payouts, 2);

        let requests = c.transport().requests();
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.session_token(), Some("user-token"));
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["id"], 13);
        assert_eq!(body["campaign_id"], 0);
        assert_eq!(body["payouts"], 0);
        assert_eq!(body["title"], "Sign up");
    }

    #[test]
    fn goal_request_and_response_preserve_documented_fields() {
        let c = client(FakeTransport::default());
        let goal = Goal {
            id: 13,
            payouts: 2,
            ..new_goal()
        };
        let request = c.build_create_goal(&goal, None).unwrap();
        let sent: Goal = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, goal);

        let received: Goal = crate::client::parse_response(&created(GOAL_JSON), 201).unwrap();
        assert_eq!(received, goal);
    }
}

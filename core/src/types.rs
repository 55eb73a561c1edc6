//! Resource records exchanged with the TonicPow API.
//!
//! # Design
//! Every record is a flat value object. Fields default to zero/empty when
//! the server omits them, so partial responses still decode. Identifiers
//! are `u64` and `0` means "not assigned yet".
//!
//! The `permitted` methods return the copy that update operations actually
//! send: fields owned by the server are cleared so they are never pushed
//! back from a stale local copy.

use serde::{Deserialize, Serialize};

/// A trackable conversion target tied to a campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub id: u64,
    pub campaign_id: u64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub payout_rate: f64,
    pub payouts: u64,
    pub payout_type: String,
}

impl Goal {
    pub fn permitted(&self) -> Goal {
        Goal {
            campaign_id: 0,
            payouts: 0,
            ..self.clone()
        }
    }
}

/// A recorded completion of a goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversion {
    pub id: u64,
    pub goal_id: u64,
    #[serde(rename = "name", skip_serializing_if = "String::is_empty")]
    pub goal_name: String,
    pub user_id: u64,
    pub click_id: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub visitor_session_guid: String,
    pub additional_data: String,
    pub payout_amount: f64,
    pub status: String,
}

/// A platform account. Empty fields are left out of request bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub middle_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub balance: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub internal_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payout_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub new_password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub new_password_confirm: String,
}

impl User {
    pub fn permitted(&self) -> User {
        User {
            password: String::new(),
            balance: 0,
            internal_address: String::new(),
            status: String::new(),
            ..self.clone()
        }
    }
}

/// An advertising campaign owned by an advertiser profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: u64,
    pub advertiser_profile_id: u64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub target_url: String,
    pub pay_per_click_rate: f64,
    pub balance: f64,
    pub balance_satoshis: i64,
    pub funding_address: String,
    pub public_guid: String,
    pub goals: Vec<Goal>,
}

impl Campaign {
    pub fn permitted(&self) -> Campaign {
        Campaign {
            advertiser_profile_id: 0,
            balance: 0.0,
            balance_satoshis: 0,
            funding_address: String::new(),
            public_guid: String::new(),
            ..self.clone()
        }
    }
}

/// Public face of an advertiser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertiserProfile {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub homepage_url: String,
    pub icon_url: String,
}

impl AdvertiserProfile {
    pub fn permitted(&self) -> AdvertiserProfile {
        AdvertiserProfile {
            user_id: 0,
            ..self.clone()
        }
    }
}

/// Credentials sent to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_decodes_partial_response() {
        let goal: Goal = serde_json::from_str(r#"{"id":7,"name":"signup"}"#).unwrap();
        assert_eq!(goal.id, 7);
        assert_eq!(goal.name, "signup");
        assert_eq!(goal.campaign_id, 0);
        assert_eq!(goal.payout_rate, 0.0);
    }

    #[test]
    fn goal_permitted_clears_server_fields() {
        let goal = Goal {
            id: 3,
            campaign_id: 9,
            payouts: 12,
            name: "signup".to_string(),
            ..Goal::default()
        };
        let permitted = goal.permitted();
        assert_eq!(permitted.id, 3);
        assert_eq!(permitted.name, "signup");
        assert_eq!(permitted.campaign_id, 0);
        assert_eq!(permitted.payouts, 0);
    }

    #[test]
    fn user_omits_empty_fields() {
        let user = User {
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
            ..User::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(json["email"], "a@b.com");
        assert!(obj.get("id").is_none());
    }

    #[test]
    fn user_permitted_never_sends_password_or_balance() {
        let user = User {
            id: 1,
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
            balance: 500,
            status: "active".to_string(),
            first_name: "Ada".to_string(),
            ..User::default()
        };
        let json = serde_json::to_value(user.permitted()).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["first_name"], "Ada");
        assert!(json.get("password").is_none());
        assert!(json.get("balance").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn conversion_goal_name_uses_wire_name() {
        let conversion: Conversion =
            serde_json::from_str(r#"{"id":2,"goal_id":5,"name":"signup","status":"processed"}"#)
                .unwrap();
        assert_eq!(conversion.goal_name, "signup");
        assert_eq!(conversion.status, "processed");
    }

    #[test]
    fn campaign_decodes_nested_goals() {
        let campaign: Campaign = serde_json::from_str(
            r#"{"id":4,"title":"Launch","goals":[{"id":1,"campaign_id":4,"name":"visit"}]}"#,
        )
        .unwrap();
        assert_eq!(campaign.goals.len(), 1);
        assert_eq!(campaign.goals[0].campaign_id, 4);
    }
}

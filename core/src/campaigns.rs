//! Campaigns and the advertiser profiles that own them.

use crate::client::{decode, encode, Client, SessionScope, STATUS_CREATED, STATUS_OK};
use crate::error::ApiError;
use crate::goals::FIELD_ID;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{AdvertiserProfile, Campaign};

const FIELD_ADVERTISER_PROFILE_ID: &str = "advertiser_profile_id";

impl<T: Transport> Client<T> {
    /// # Errors
    ///
    /// `MissingField("advertiser_profile_id")` if the campaign has no owner.
    pub fn build_create_campaign(
        &self,
        campaign: &Campaign,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if campaign.advertiser_profile_id == 0 {
            return Err(ApiError::MissingField(FIELD_ADVERTISER_PROFILE_ID));
        }
        let body = encode(campaign)?;
        Ok(self.build_request(HttpMethod::Post, self.url("campaigns"), Some(body), user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if `campaign_id` is zero.
    pub fn build_get_campaign(
        &self,
        campaign_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if campaign_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let url = self.url(&format!("campaigns/details/{campaign_id}"));
        Ok(self.build_request(HttpMethod::Get, url, None, user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if the campaign has no id.
    pub fn build_update_campaign(
        &self,
        campaign: &Campaign,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if campaign.id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let body = encode(&campaign.permitted())?;
        Ok(self.build_request(HttpMethod::Put, self.url("campaigns"), Some(body), user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if `profile_id` is zero.
    pub fn build_get_advertiser_profile(
        &self,
        profile_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if profile_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let url = self.url(&format!("advertisers/details/{profile_id}"));
        Ok(self.build_request(HttpMethod::Get, url, None, user_session_token))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if the profile has no id.
    pub fn build_update_advertiser_profile(
        &self,
        profile: &AdvertiserProfile,
        user_session_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if profile.id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let body = encode(&profile.permitted())?;
        Ok(self.build_request(HttpMethod::Put, self.url("advertisers"), Some(body), user_session_token))
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 201 only.
    pub fn create_campaign(
        &mut self,
        campaign: &Campaign,
        user_session_token: Option<&str>,
    ) -> Result<Campaign, ApiError> {
        let request = self.build_create_campaign(campaign, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_CREATED, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// Fetch a campaign, goals included.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn get_campaign(
        &mut self,
        campaign_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<Campaign, ApiError> {
        let request = self.build_get_campaign(campaign_id, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn update_campaign(
        &mut self,
        campaign: &Campaign,
        user_session_token: Option<&str>,
    ) -> Result<Campaign, ApiError> {
        let request = self.build_update_campaign(campaign, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn get_advertiser_profile(
        &mut self,
        profile_id: u64,
        user_session_token: Option<&str>,
    ) -> Result<AdvertiserProfile, ApiError> {
        let request = self.build_get_advertiser_profile(profile_id, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn update_advertiser_profile(
        &mut self,
        profile: &AdvertiserProfile,
        user_session_token: Option<&str>,
    ) -> Result<AdvertiserProfile, ApiError> {
        let request = self.build_update_advertiser_profile(profile, user_session_token)?;
        let response =
            self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        decode(&response)
    }
}

//! Goal conversions.
//!
//! # Design
//! All conversion flavours hit the same `goals/convert` endpoint and differ
//! only in which identifying fields are present. `ConversionRequest`
//! collects them; the `convert_goal_by_*` methods are shortcuts that check
//! their own required pair first so the error names the field the caller
//! passed. The endpoint reads every field as a string, numbers included.

use std::collections::BTreeMap;

use crate::client::{decode, encode, Client, SessionScope, STATUS_CREATED, STATUS_OK};
use crate::error::ApiError;
use crate::goals::FIELD_ID;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::Conversion;

const FIELD_NAME: &str = "name";
const FIELD_VISITOR_SESSION_GUID: &str = "visitor_session_guid";
const FIELD_USER_ID: &str = "user_id";
const FIELD_ADDITIONAL_DATA: &str = "additional_data";

/// Parameters of a single conversion.
///
/// The goal is identified by id or by name; the converting party by a
/// visitor session GUID or a user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionRequest {
    pub goal_id: u64,
    pub goal_name: String,
    pub visitor_session_guid: String,
    pub user_id: u64,
    pub additional_data: String,
}

impl ConversionRequest {
    pub fn by_goal_id(goal_id: u64) -> Self {
        Self {
            goal_id,
            ..Self::default()
        }
    }

    pub fn by_goal_name(goal_name: impl Into<String>) -> Self {
        Self {
            goal_name: goal_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn visitor_session(mut self, guid: impl Into<String>) -> Self {
        self.visitor_session_guid = guid.into();
        self
    }

    #[must_use]
    pub fn user(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    #[must_use]
    pub fn additional_data(mut self, data: impl Into<String>) -> Self {
        self.additional_data = data.into();
        self
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.goal_id == 0 && self.goal_name.is_empty() {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        if self.visitor_session_guid.is_empty() && self.user_id == 0 {
            return Err(ApiError::MissingField(FIELD_VISITOR_SESSION_GUID));
        }
        Ok(())
    }

    fn body(&self) -> BTreeMap<&'static str, String> {
        let mut body = BTreeMap::new();
        if self.goal_id != 0 {
            body.insert(FIELD_ID, self.goal_id.to_string());
        }
        if !self.goal_name.is_empty() {
            body.insert(FIELD_NAME, self.goal_name.clone());
        }
        if !self.visitor_session_guid.is_empty() {
            body.insert(FIELD_VISITOR_SESSION_GUID, self.visitor_session_guid.clone());
        }
        if self.user_id != 0 {
            body.insert(FIELD_USER_ID, self.user_id.to_string());
        }
        body.insert(FIELD_ADDITIONAL_DATA, self.additional_data.clone());
        body
    }
}

impl<T: Transport> Client<T> {
    /// # Errors
    ///
    /// `MissingField("id")` without a goal id or name,
    /// `MissingField("visitor_session_guid")` without a session or user.
    pub fn build_create_conversion(
        &self,
        conversion: &ConversionRequest,
    ) -> Result<HttpRequest, ApiError> {
        conversion.validate()?;
        let body = encode(&conversion.body())?;
        Ok(self.build_request(HttpMethod::Post, self.url("goals/convert"), Some(body), None))
    }

    /// # Errors
    ///
    /// `MissingField("id")` if `conversion_id` is zero.
    pub fn build_get_conversion(&self, conversion_id: u64) -> Result<HttpRequest, ApiError> {
        if conversion_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        let url = self.url(&format!("conversions/details/{conversion_id}"));
        Ok(self.build_request(HttpMethod::Get, url, None, None))
    }

    /// Fire a conversion described by `conversion`.
    ///
    /// # Errors
    ///
    /// Validation, transport, or API error; success is 201 only.
    pub fn create_conversion(
        &mut self,
        conversion: &ConversionRequest,
    ) -> Result<Conversion, ApiError> {
        let request = self.build_create_conversion(conversion)?;
        let response = self.round_trip(&request, STATUS_CREATED, SessionScope::Application)?;
        decode(&response)
    }

    /// Convert a goal for the visitor behind `visitor_session_guid`.
    ///
    /// # Errors
    ///
    /// `MissingField("id")` or `MissingField("visitor_session_guid")`, then
    /// as `create_conversion`.
    pub fn convert_goal_by_goal_id(
        &mut self,
        goal_id: u64,
        visitor_session_guid: &str,
        additional_data: &str,
    ) -> Result<Conversion, ApiError> {
        if goal_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        if visitor_session_guid.is_empty() {
            return Err(ApiError::MissingField(FIELD_VISITOR_SESSION_GUID));
        }
        self.create_conversion(
            &ConversionRequest::by_goal_id(goal_id)
                .visitor_session(visitor_session_guid)
                .additional_data(additional_data),
        )
    }

    /// Convert a goal looked up by name for the visitor behind
    /// `visitor_session_guid`.
    ///
    /// # Errors
    ///
    /// `MissingField("name")` or `MissingField("visitor_session_guid")`,
    /// then as `create_conversion`.
    pub fn convert_goal_by_goal_name(
        &mut self,
        goal_name: &str,
        visitor_session_guid: &str,
        additional_data: &str,
    ) -> Result<Conversion, ApiError> {
        if goal_name.is_empty() {
            return Err(ApiError::MissingField(FIELD_NAME));
        }
        if visitor_session_guid.is_empty() {
            return Err(ApiError::MissingField(FIELD_VISITOR_SESSION_GUID));
        }
        self.create_conversion(
            &ConversionRequest::by_goal_name(goal_name)
                .visitor_session(visitor_session_guid)
                .additional_data(additional_data),
        )
    }

    /// Convert a goal on behalf of a known user.
    ///
    /// # Errors
    ///
    /// `MissingField("id")` or `MissingField("user_id")`, then as
    /// `create_conversion`.
    pub fn convert_goal_by_user_id(
        &mut self,
        goal_id: u64,
        user_id: u64,
        additional_data: &str,
    ) -> Result<Conversion, ApiError> {
        if goal_id == 0 {
            return Err(ApiError::MissingField(FIELD_ID));
        }
        if user_id == 0 {
            return Err(ApiError::MissingField(FIELD_USER_ID));
        }
        self.create_conversion(
            &ConversionRequest::by_goal_id(goal_id)
                .user(user_id)
                .additional_data(additional_data),
        )
    }

    /// # Errors
    ///
    /// Validation, transport, or API error; success is 200 only.
    pub fn get_conversion(&mut self, conversion_id: u64) -> Result<Conversion, ApiError> {
        let request = self.build_get_conversion(conversion_id)?;
        let response = self.round_trip(&request, STATUS_OK, SessionScope::Application)?;
        decode(&response)
    }
}

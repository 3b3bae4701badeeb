use serde::{Deserialize, Serialize};

use super::{FillGlobals, details_event, fill};
use crate::Globals;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewDetails {
    pub page_path: String,
    pub page_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Single-page apps that report page views themselves set this to 1.
    #[serde(rename = "turnOffPageViewForSPA")]
    pub turn_off_page_view_for_spa: u8,
}

impl FillGlobals for PageViewDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill(&mut self.language, globals.language.as_ref());
    }
}

/// Identity fields shared by login and sign-up events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginDetails {
    pub method: String,
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
}

impl FillGlobals for LoginDetails {
    fn fill_globals(&mut self, _globals: &Globals) {}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignUpDetails {
    pub method: String,
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_marketing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sms_marketing: Option<String>,
}

impl FillGlobals for SignUpDetails {
    fn fill_globals(&mut self, _globals: &Globals) {}
}

/// Newsletter (un)subscription. Consent flags keep their snake_case keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDetails {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_marketing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sms_marketing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "storeCode", skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FillGlobals for SubscriptionDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.language, globals.language.as_ref());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDataDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(rename = "dateOfBirth", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

impl FillGlobals for UserDataDetails {
    fn fill_globals(&mut self, _globals: &Globals) {}
}

details_event!(PageViewEvent, "page_view", PageViewDetails);
details_event!(LoginEvent, "login", LoginDetails);
details_event!(SignUpEvent, "sign_up", SignUpDetails);
details_event!(SubscribeEvent, "subscribe", SubscriptionDetails);
details_event!(UnsubscribeEvent, "unsubscribe", SubscriptionDetails);
details_event!(
    /// Profile data changed outside of login or sign-up.
    UserDataEvent,
    "user_data_update",
    UserDataDetails
);

impl PageViewEvent {
    pub fn new(page_path: impl Into<String>, page_title: impl Into<String>) -> Self {
        Self::from_details(PageViewDetails {
            page_path: page_path.into(),
            page_title: page_title.into(),
            ..Default::default()
        })
    }
}

impl LoginEvent {
    pub fn new(method: impl Into<String>, customer: Customer) -> Self {
        Self::from_details(LoginDetails {
            method: method.into(),
            customer,
            shop_id: None,
        })
    }
}

impl SignUpEvent {
    pub fn new(method: impl Into<String>, customer: Customer) -> Self {
        Self::from_details(SignUpDetails {
            method: method.into(),
            customer,
            ..Default::default()
        })
    }
}

impl SubscribeEvent {
    pub fn new(email: impl Into<String>) -> Self {
        Self::from_details(SubscriptionDetails {
            email: email.into(),
            ..Default::default()
        })
    }
}

impl UnsubscribeEvent {
    pub fn new(email: impl Into<String>) -> Self {
        Self::from_details(SubscriptionDetails {
            email: email.into(),
            ..Default::default()
        })
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{FillGlobals, Item, details_event, fill, item::fill_items};
use crate::{Event, Globals, Payload, to_payload};

/// `{currency?, value, items}`: shared by cart and item views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub value: f64,
    pub items: Vec<Item>,
}

impl CartDetails {
    pub fn new(value: f64, items: Vec<Item>) -> Self {
        Self {
            currency: None,
            value,
            items,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

impl FillGlobals for CartDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill_items(&mut self.items, globals);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    pub items: Vec<Item>,
}

impl FillGlobals for CheckoutDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill_items(&mut self.items, globals);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_tier: Option<String>,
    pub items: Vec<Item>,
}

impl FillGlobals for ShippingDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill_items(&mut self.items, globals);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub items: Vec<Item>,
}

impl FillGlobals for PaymentDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill_items(&mut self.items, globals);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub transaction_id: String,
    /// Order total, shipping included.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl PurchaseDetails {
    pub fn new(transaction_id: impl Into<String>, value: f64, items: Vec<Item>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            value,
            items,
            ..Default::default()
        }
    }

    pub fn with_shipping(mut self, shipping: f64) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn with_tax(mut self, tax: f64) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

impl FillGlobals for PurchaseDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill(&mut self.currency, globals.currency.as_ref());
        fill(&mut self.affiliation, globals.affiliation.as_ref());
        fill_items(&mut self.items, globals);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListDetails {
    pub list_id: String,
    pub list_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub items: Vec<Item>,
}

impl FillGlobals for ItemListDetails {
    fn fill_globals(&mut self, globals: &Globals) {
        fill_items(&mut self.items, globals);
    }
}

details_event!(AddToCartEvent, "add_to_cart", CartDetails);
details_event!(RemoveFromCartEvent, "remove_from_cart", CartDetails);
details_event!(ViewCartEvent, "view_cart", CartDetails);
details_event!(ViewItemEvent, "view_item", CartDetails);
details_event!(BeginCheckoutEvent, "begin_checkout", CheckoutDetails);
details_event!(AddShippingInfoEvent, "add_shipping_info", ShippingDetails);
details_event!(AddPaymentInfoEvent, "add_payment_info", PaymentDetails);
details_event!(
    /// Order placed, before payment is confirmed. Reports the gross value.
    PrePurchaseEvent,
    "pre_purchase",
    PurchaseDetails
);
details_event!(ViewItemListEvent, "view_item_list", ItemListDetails);

impl AddToCartEvent {
    pub fn new(value: f64, items: Vec<Item>) -> Self {
        Self::from_details(CartDetails::new(value, items))
    }
}

impl RemoveFromCartEvent {
    pub fn new(value: f64, items: Vec<Item>) -> Self {
        Self::from_details(CartDetails::new(value, items))
    }
}

impl ViewCartEvent {
    pub fn new(value: f64, items: Vec<Item>) -> Self {
        Self::from_details(CartDetails::new(value, items))
    }
}

impl ViewItemEvent {
    pub fn new(value: f64, items: Vec<Item>) -> Self {
        Self::from_details(CartDetails::new(value, items))
    }
}

impl ViewItemListEvent {
    pub fn new(list_id: impl Into<String>, list_name: impl Into<String>, items: Vec<Item>) -> Self {
        Self::from_details(ItemListDetails {
            list_id: list_id.into(),
            list_name: list_name.into(),
            items,
            ..Default::default()
        })
    }
}

/// Completed order.
///
/// The reported `value` excludes shipping: a 110.0 order with 10.0 shipping
/// is tracked with `value = 100.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseEvent {
    details: PurchaseDetails,
    label: Option<String>,
}

impl PurchaseEvent {
    pub const NAME: &'static str = "purchase";

    pub fn new(transaction_id: impl Into<String>, value: f64, items: Vec<Item>) -> Self {
        Self::from_details(PurchaseDetails::new(transaction_id, value, items))
    }

    pub fn from_details(details: PurchaseDetails) -> Self {
        Self {
            details,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn details(&self) -> &PurchaseDetails {
        &self.details
    }
}

impl Event for PurchaseEvent {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(Self::NAME)
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn data(&self) -> Payload {
        let mut payload = to_payload(&self.details);
        let net = self.details.value - self.details.shipping.unwrap_or(0.0);
        payload.insert("value".into(), serde_json::json!(net));
        payload
    }

    fn set_globals(&mut self, globals: &Globals) {
        self.details.fill_globals(globals);
    }
}

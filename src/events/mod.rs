//! Typed events for common storefront interactions.
//!
//! Each event wraps a serde-serializable details struct. Payload keys are
//! camelCase (`transactionId`, `paymentMethod`, ...), matching what the
//! shipped drivers read.
//!
//! Sales events fill unset currencies from [`Globals`](crate::Globals), and
//! unset item brands and affiliations as well. Page views fill currency and
//! language.

mod common;
mod custom;
mod item;
mod sales;

pub use common::{
    Customer, LoginDetails, LoginEvent, PageViewDetails, PageViewEvent, SignUpDetails,
    SignUpEvent, SubscribeEvent, SubscriptionDetails, UnsubscribeEvent, UserDataDetails,
    UserDataEvent,
};
pub use custom::CustomEvent;
pub use item::Item;
pub use sales::{
    AddPaymentInfoEvent, AddShippingInfoEvent, AddToCartEvent, BeginCheckoutEvent, CartDetails,
    CheckoutDetails, ItemListDetails, PaymentDetails, PrePurchaseEvent, PurchaseDetails,
    PurchaseEvent, RemoveFromCartEvent, ShippingDetails, ViewCartEvent, ViewItemEvent,
    ViewItemListEvent,
};

use crate::Globals;

/// Fills unset fields of an event's details from the globals.
pub(crate) trait FillGlobals {
    fn fill_globals(&mut self, globals: &Globals);
}

pub(crate) fn fill(slot: &mut Option<String>, value: Option<&String>) {
    if slot.is_none() {
        *slot = value.cloned();
    }
}

/// Declares an event type wrapping a details struct.
macro_rules! details_event {
    ($(#[$doc:meta])* $event:ident, $name:literal, $details:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $event {
            details: $details,
            label: Option<String>,
        }

        impl $event {
            pub const NAME: &'static str = $name;

            pub fn from_details(details: $details) -> Self {
                Self {
                    details,
                    label: None,
                }
            }

            pub fn with_label(mut self, label: impl Into<String>) -> Self {
                self.label = Some(label.into());
                self
            }

            pub fn details(&self) -> &$details {
                &self.details
            }
        }

        impl $crate::Event for $event {
            fn name(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(Self::NAME)
            }

            fn label(&self) -> Option<&str> {
                self.label.as_deref()
            }

            fn data(&self) -> $crate::Payload {
                $crate::to_payload(&self.details)
            }

            fn set_globals(&mut self, globals: &$crate::Globals) {
                $crate::events::FillGlobals::fill_globals(&mut self.details, globals);
            }
        }
    };
}

pub(crate) use details_event;

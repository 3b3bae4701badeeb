use std::borrow::Cow;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{DataLayer, DataLayers};
use crate::{Driver, DriverConfig, Error, Event, Payload, Result, event::json_kind};

const DEFAULT_LAYER_ID: &str = "dataLayer";
const CUSTOM_EVENT_TYPES: [&str; 2] = ["ecommerce", "common"];

/// Google Tag Manager driver.
///
/// Shapes events into the GA4 ecommerce format and pushes them to a named
/// [`DataLayer`] (`"dataLayer"` unless the driver config sets `layerId`).
///
/// Ecommerce events push two records: `{"ecommerce": null}` to clear the
/// previous ecommerce object, then `{"event": name, "ecommerce": {...}}`.
/// Other events push a single flat `{"event": name, ...}` record.
///
/// Custom events are tracked only when they carry a payload for
/// `"GTMBrowserDriver"` of the form
/// `{"event_type": "ecommerce" | "common", "event_name": "...", "event_payload": {...}}`.
#[derive(Debug, Clone)]
pub struct GtmDriver {
    layer_id: String,
    layers: DataLayers,
    layer: Option<DataLayer>,
}

impl GtmDriver {
    pub const NAME: &'static str = "GTMBrowserDriver";

    pub const SUPPORTED_EVENTS: [&'static str; 13] = [
        "page_view",
        "add_payment_info",
        "add_shipping_info",
        "add_to_cart",
        "begin_checkout",
        "purchase",
        "pre_purchase",
        "remove_from_cart",
        "view_cart",
        "view_item",
        "view_item_list",
        "login",
        "sign_up",
    ];

    /// Reads `layerId` from `config`. Any other key is ignored.
    pub fn new(config: &DriverConfig, layers: DataLayers) -> Result<Self> {
        let layer_id = match config.get("layerId") {
            None | Some(Value::Null) => DEFAULT_LAYER_ID.to_owned(),
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(other) => {
                return Err(Error::DriverLoad {
                    driver: Self::NAME.into(),
                    reason: format!("layerId must be a non-empty string, got {}", json_kind(other))
                        .into(),
                });
            }
        };
        Ok(Self {
            layer_id,
            layers,
            layer: None,
        })
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    fn layer(&self) -> Result<&DataLayer> {
        self.layer
            .as_ref()
            .ok_or_else(|| Error::external(format!("data layer {} is not loaded", self.layer_id)))
    }

    fn track_custom(&self, event: &dyn Event, layer: &DataLayer) -> Result<()> {
        let Some(data) = event.for_driver(Self::NAME) else {
            return Ok(());
        };
        let invalid = |reason: String| Error::InvalidCustomEvent {
            event: event.name(),
            reason,
        };

        let event_type = data
            .get("event_type")
            .and_then(Value::as_str)
            .filter(|kind| CUSTOM_EVENT_TYPES.contains(kind))
            .ok_or_else(|| {
                invalid(format!(
                    "event_type for {} must be one of: {}",
                    Self::NAME,
                    CUSTOM_EVENT_TYPES.join(", ")
                ))
            })?;
        let event_name = data
            .get("event_name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("event_name for {} must be a string", Self::NAME)))?;
        let payload = match data.get("event_payload") {
            Some(Value::Object(payload)) => payload.clone(),
            other => {
                return Err(invalid(format!(
                    "event_payload for {} must be an object, got {}",
                    Self::NAME,
                    other.map_or("nothing", json_kind)
                )));
            }
        };

        if event_type == "ecommerce" {
            push_ecommerce(layer, event_name, payload);
        } else {
            push_common(layer, event_name, payload);
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for GtmDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn load(&mut self) -> Result<bool> {
        self.layer = Some(self.layers.get_or_create(&self.layer_id));
        Ok(true)
    }

    fn supports_event(&self, event: &dyn Event) -> bool {
        event.is_custom() || Self::SUPPORTED_EVENTS.contains(&event.name().as_ref())
    }

    async fn track(&self, event: &dyn Event) -> Result<()> {
        let layer = self.layer()?;
        if event.is_custom() {
            return self.track_custom(event, layer);
        }

        let data = event.data();
        let name = event.name();
        match name.as_ref() {
            "page_view" => {
                if data.get("turnOffPageViewForSPA").and_then(Value::as_u64) == Some(1) {
                    return Ok(());
                }
                push_common(
                    layer,
                    "page_view",
                    record([
                        ("page_path", data.get("pagePath").cloned()),
                        ("page_title", data.get("pageTitle").cloned()),
                        ("language", data.get("language").cloned()),
                        ("currency", data.get("currency").cloned()),
                    ]),
                );
            }
            "add_payment_info" => push_ecommerce(
                layer,
                "add_payment_info",
                record([
                    ("currency", data.get("currency").cloned()),
                    ("value", money(&data, "value")),
                    ("coupon", data.get("coupon").cloned()),
                    ("payment_type", data.get("paymentMethod").cloned()),
                    ("items", Some(items(&data, &Payload::new()))),
                ]),
            ),
            "add_shipping_info" => push_ecommerce(
                layer,
                "add_shipping_info",
                record([
                    ("currency", data.get("currency").cloned()),
                    ("value", money(&data, "value")),
                    ("coupon", data.get("coupon").cloned()),
                    ("shipping_tier", data.get("shippingTier").cloned()),
                    ("items", Some(items(&data, &Payload::new()))),
                ]),
            ),
            "begin_checkout" => push_ecommerce(
                layer,
                "begin_checkout",
                record([
                    ("currency", data.get("currency").cloned()),
                    ("value", money(&data, "value")),
                    ("coupon", data.get("coupon").cloned()),
                    ("items", Some(items(&data, &Payload::new()))),
                ]),
            ),
            "add_to_cart" | "remove_from_cart" | "view_cart" | "view_item" => push_ecommerce(
                layer,
                &name,
                record([
                    ("currency", data.get("currency").cloned()),
                    ("value", money(&data, "value")),
                    ("items", Some(items(&data, &Payload::new()))),
                ]),
            ),
            "purchase" | "pre_purchase" => {
                let pushed_as = if name == "purchase" { "purchase" } else { "pre-purchase" };
                push_ecommerce(
                    layer,
                    pushed_as,
                    record([
                        ("currency", data.get("currency").cloned()),
                        ("transaction_id", data.get("transactionId").cloned()),
                        ("value", money(&data, "value")),
                        ("affiliation", data.get("affiliation").cloned()),
                        ("coupon", data.get("coupon").cloned()),
                        ("shipping", nonzero_money(&data, "shipping")),
                        ("tax", nonzero_money(&data, "tax")),
                        ("items", Some(items(&data, &Payload::new()))),
                    ]),
                );
            }
            "view_item_list" => {
                let defaults = record([
                    ("item_list_name", data.get("listName").cloned()),
                    ("item_list_id", data.get("listId").cloned()),
                ]);
                push_ecommerce(
                    layer,
                    "view_item_list",
                    record([
                        ("item_list_id", data.get("listId").cloned()),
                        ("item_list_name", data.get("listName").cloned()),
                        ("items", Some(items(&data, &defaults))),
                    ]),
                );
            }
            "login" | "sign_up" => {
                push_customer(layer, &data);
                push_common(layer, &name, record([("method", data.get("method").cloned())]));
            }
            _ => {
                return Err(Error::UnsupportedEvent {
                    driver: Self::NAME.into(),
                    event: Cow::Owned(name.to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Rounds to cents, nudging half-cent values up.
pub(crate) fn monetary(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

fn money(data: &Payload, key: &str) -> Option<Value> {
    data.get(key).and_then(Value::as_f64).map(|v| json!(monetary(v)))
}

fn nonzero_money(data: &Payload, key: &str) -> Option<Value> {
    data.get(key)
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0)
        .map(|v| json!(monetary(v)))
}

/// Builds an object from the pairs that hold a non-null value.
fn record<const N: usize>(fields: [(&str, Option<Value>); N]) -> Payload {
    fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            None | Some(Value::Null) => None,
            Some(value) => Some((key.to_owned(), value)),
        })
        .collect()
}

fn items(data: &Payload, defaults: &Payload) -> Value {
    let Some(items) = data.get("items").and_then(Value::as_array) else {
        return Value::Array(Vec::new());
    };
    let first_index = items.first().and_then(|item| item.get("index")).and_then(Value::as_u64);
    let adjuster = u64::from(first_index == Some(0));

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let get = |key: &str| item.get(key).cloned();
            let index = match item.get("index").and_then(Value::as_u64) {
                Some(index) => index + adjuster,
                None => position as u64 + 1,
            };
            let discount = item.get("discount").and_then(Value::as_f64).filter(|v| *v != 0.0);
            let price = item.get("price").and_then(Value::as_f64).filter(|v| *v != 0.0);

            let mut mapped = record([
                ("item_id", get("id")),
                ("item_name", get("name")),
                ("affiliation", get("affiliation")),
                ("coupon", get("coupon")),
                ("currency", get("currency")),
                ("discount", discount.map(|v| json!(monetary(v)))),
                ("index", Some(json!(index))),
                ("item_brand", get("brand")),
                ("item_category", get("category")),
                ("item_category2", get("category2")),
                ("item_category3", get("category3")),
                ("item_category4", get("category4")),
                ("item_category5", get("category5")),
                ("item_list_id", get("listId")),
                ("item_list_name", get("listName")),
                ("item_variant", get("variant")),
                ("location_id", get("locationId")),
                ("price", price.map(|v| json!(monetary(v)))),
                ("quantity", get("quantity")),
            ]);
            for (key, value) in defaults {
                if mapped.get(key).is_none_or(Value::is_null) {
                    mapped.insert(key.clone(), value.clone());
                }
            }
            Value::Object(mapped)
        })
        .collect()
}

fn push_ecommerce(layer: &DataLayer, event: &str, payload: Payload) {
    tracing::debug!(driver = GtmDriver::NAME, event, "Pushing ecommerce record.");
    layer.push(json!({ "ecommerce": null }));
    layer.push(json!({ "event": event, "ecommerce": payload }));
}

fn push_common(layer: &DataLayer, event: &str, payload: Payload) {
    tracing::debug!(driver = GtmDriver::NAME, event, "Pushing common record.");
    let mut entry = Payload::new();
    entry.insert("event".into(), json!(event));
    entry.extend(payload);
    layer.push(Value::Object(entry));
}

fn push_customer(layer: &DataLayer, data: &Payload) {
    let text = |key: &str| data.get(key).cloned().unwrap_or_else(|| json!(""));
    let mut customer = record([
        ("em", data.get("email").cloned()),
        ("fn", data.get("firstname").cloned()),
        ("ln", data.get("lastname").cloned()),
    ]);
    customer.extend([
        ("ph".to_owned(), text("phone")),
        ("external_id".to_owned(), text("id")),
        ("ge".to_owned(), text("gender")),
        ("db".to_owned(), text("birthDate")),
        ("ct".to_owned(), text("city")),
        ("st".to_owned(), text("province")),
        ("zp".to_owned(), text("zipCode")),
        ("country".to_owned(), text("country")),
    ]);
    layer.push(json!({ "customer": customer }));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        TrackEvent,
        events::{
            AddToCartEvent, CustomEvent, Customer, Item, LoginEvent, PageViewDetails,
            PageViewEvent, PurchaseDetails, PurchaseEvent, ViewItemListEvent,
        },
    };

    async fn loaded(layers: &DataLayers) -> GtmDriver {
        let mut driver = GtmDriver::new(&DriverConfig::new(), layers.clone()).unwrap();
        assert!(driver.load().await.unwrap());
        driver
    }

    #[test]
    fn test_monetary_rounding() {
        assert_eq!(monetary(1.005), 1.01);
        assert_eq!(monetary(19.999), 20.0);
        assert_eq!(monetary(3.14159), 3.14);
    }

    #[test]
    fn test_layer_id_from_config() {
        let mut config = DriverConfig::new();
        config.insert("layerId".into(), json!("shopLayer"));
        let driver = GtmDriver::new(&config, DataLayers::default()).unwrap();
        assert_eq!(driver.layer_id(), "shopLayer");

        config.insert("layerId".into(), json!(7));
        assert!(GtmDriver::new(&config, DataLayers::default()).is_err());
    }

    #[tokio::test]
    async fn test_load_creates_layer() {
        let layers = DataLayers::default();
        let _driver = loaded(&layers).await;
        assert!(layers.contains("dataLayer"));
    }

    #[tokio::test]
    async fn test_support_list() {
        let driver = loaded(&DataLayers::default()).await;
        assert!(driver.supports_event(&PageViewEvent::new("/", "Home")));
        assert!(driver.supports_event(&CustomEvent::new("quiz").unwrap()));
        assert!(!driver.supports_event(&TrackEvent::new("subscribe", json!({})).unwrap()));
        assert!(driver.supports_event(&TrackEvent::new("custom.quiz", json!({})).unwrap()));
        assert!(!driver.supports_event(&TrackEvent::new("promo.custom.x", json!({})).unwrap()));
    }

    #[tokio::test]
    async fn test_add_to_cart_pushes_ecommerce_pair() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        let event = AddToCartEvent::from_details(
            crate::events::CartDetails::new(19.999, vec![Item::new("1", "Mug").with_price(4.999)])
                .with_currency("USD"),
        );
        driver.track(&event).await.unwrap();

        let entries = layers.get("dataLayer").unwrap().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], json!({"ecommerce": null}));
        assert_eq!(
            entries[1],
            json!({
                "event": "add_to_cart",
                "ecommerce": {
                    "currency": "USD",
                    "value": 20.0,
                    "items": [{"item_id": "1", "item_name": "Mug", "index": 1, "price": 5.0}]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_zero_based_indexes_are_shifted() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        let event = AddToCartEvent::new(
            1.0,
            vec![Item::new("a", "A").with_index(0), Item::new("b", "B").with_index(1)],
        );
        driver.track(&event).await.unwrap();
        let entries = layers.get("dataLayer").unwrap().entries();
        assert_eq!(entries[1]["ecommerce"]["items"][0]["index"], 1);
        assert_eq!(entries[1]["ecommerce"]["items"][1]["index"], 2);
    }

    #[tokio::test]
    async fn test_purchase_drops_zero_tax_and_pre_purchase_name() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        let details = PurchaseDetails::new("T-9", 110.0, Vec::new())
            .with_shipping(10.0)
            .with_tax(0.0);
        driver
            .track(&PurchaseEvent::from_details(details.clone()))
            .await
            .unwrap();
        driver
            .track(&crate::events::PrePurchaseEvent::from_details(details))
            .await
            .unwrap();

        let entries = layers.get("dataLayer").unwrap().entries();
        let purchase = &entries[1]["ecommerce"];
        assert_eq!(purchase["value"], json!(100.0));
        assert_eq!(purchase["shipping"], json!(10.0));
        assert!(purchase.get("tax").is_none());
        assert_eq!(entries[3]["event"], "pre-purchase");
        assert_eq!(entries[3]["ecommerce"]["value"], json!(110.0));
    }

    #[tokio::test]
    async fn test_item_list_defaults_onto_items() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        let mut item = Item::new("2", "Cap");
        item.list_name = Some("Own list".into());
        let event = ViewItemListEvent::new("home", "Homepage", vec![Item::new("1", "Mug"), item]);
        driver.track(&event).await.unwrap();

        let record = &layers.get("dataLayer").unwrap().entries()[1];
        let items = &record["ecommerce"]["items"];
        assert_eq!(record["ecommerce"]["item_list_id"], "home");
        assert_eq!(items[0]["item_list_name"], "Homepage");
        assert_eq!(items[0]["item_list_id"], "home");
        assert_eq!(items[1]["item_list_name"], "Own list");
    }

    #[tokio::test]
    async fn test_page_view_is_common_and_can_be_turned_off() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        driver.track(&PageViewEvent::new("/a", "A")).await.unwrap();
        driver
            .track(&PageViewEvent::from_details(PageViewDetails {
                page_path: "/b".into(),
                turn_off_page_view_for_spa: 1,
                ..Default::default()
            }))
            .await
            .unwrap();

        let entries = layers.get("dataLayer").unwrap().entries();
        assert_eq!(
            entries,
            vec![json!({"event": "page_view", "page_path": "/a", "page_title": "A"})]
        );
    }

    #[tokio::test]
    async fn test_login_pushes_customer_first() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;
        let customer = Customer {
            email: Some("ann@example.com".into()),
            city: Some("krakow".into()),
            ..Default::default()
        };
        driver.track(&LoginEvent::new("google", customer)).await.unwrap();

        let entries = layers.get("dataLayer").unwrap().entries();
        assert_eq!(entries.len(), 2);
        let customer = &entries[0]["customer"];
        assert_eq!(customer["em"], "ann@example.com");
        assert_eq!(customer["ct"], "krakow");
        assert_eq!(customer["ph"], "");
        assert!(customer.get("fn").is_none());
        assert_eq!(entries[1], json!({"event": "login", "method": "google"}));
    }

    #[tokio::test]
    async fn test_custom_event_variants() {
        let layers = DataLayers::default();
        let driver = loaded(&layers).await;

        let common = CustomEvent::new("popup")
            .unwrap()
            .with_driver_payload(
                GtmDriver::NAME,
                json!({"event_type": "common", "event_name": "popup_shown", "event_payload": {"variant": "b"}}),
            )
            .unwrap();
        driver.track(&common).await.unwrap();

        let ignored = CustomEvent::new("other").unwrap();
        driver.track(&ignored).await.unwrap();

        let entries = layers.get("dataLayer").unwrap().entries();
        assert_eq!(entries, vec![json!({"event": "popup_shown", "variant": "b"})]);
    }

    #[tokio::test]
    async fn test_malformed_custom_event() {
        let driver = loaded(&DataLayers::default()).await;
        let bad_type = CustomEvent::new("quiz")
            .unwrap()
            .with_driver_payload(
                GtmDriver::NAME,
                json!({"event_type": "social", "event_name": "x", "event_payload": {}}),
            )
            .unwrap();
        let err = driver.track(&bad_type).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCustomEvent { ref event, .. } if event == "custom.quiz"));

        let bad_payload = CustomEvent::new("quiz")
            .unwrap()
            .with_driver_payload(
                GtmDriver::NAME,
                json!({"event_type": "ecommerce", "event_name": "x", "event_payload": null}),
            )
            .unwrap();
        assert!(driver.track(&bad_payload).await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_event_is_rejected() {
        let driver = loaded(&DataLayers::default()).await;
        let err = driver
            .track(&TrackEvent::new("subscribe", json!({})).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Event subscribe not supported by GTMBrowserDriver!");
    }

    #[tokio::test]
    async fn test_track_before_load_fails() {
        let driver = GtmDriver::new(&DriverConfig::new(), DataLayers::default()).unwrap();
        assert!(driver.track(&PageViewEvent::new("/", "Home")).await.is_err());
    }
}

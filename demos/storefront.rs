//! A storefront session: events tracked before the drivers are ready are
//! buffered, then delivered to GTM and the debug logger.
//!
//! Run with `RUST_LOG`-style verbosity fixed to debug:
//! `cargo run --example storefront`

use serde::Serialize;
use trackify::{
    Config, DriverRegistry, Event, Globals, Result, Tracker,
    drivers::DataLayers,
    events::{AddToCartEvent, CustomEvent, Item, PageViewEvent, PurchaseDetails, PurchaseEvent},
    tokens,
};

#[derive(Debug, Serialize, Event)]
#[event(name = "size_guide_opened")]
struct SizeGuideOpened {
    product_id: String,
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Config::default()
        .with_globals(Globals::default().with_currency("EUR").with_brand("Acme"));
    let layers = DataLayers::default();
    let tracker = Tracker::new(
        config.clone(),
        DriverRegistry::builtin(config.environment, layers.clone()),
    );
    tracker.use_drivers([(tokens::GTM.clone(), None), (tokens::DEBUG.clone(), None)])?;

    // Tracked before loading: buffered.
    tracker.track(PageViewEvent::new("/products/mug", "Mug"));

    tracker.load_drivers().await;

    let mug = Item::new("sku-1", "Mug").with_price(12.5).with_quantity(2);
    tracker.track(SizeGuideOpened {
        product_id: "sku-1".into(),
    });
    tracker.track(AddToCartEvent::new(25.0, vec![mug.clone()]));
    tracker.track(CustomEvent::new("newsletter_popup")?.with_driver_payload(
        "GTMBrowserDriver",
        serde_json::json!({
            "event_type": "common",
            "event_name": "newsletter_popup_shown",
            "event_payload": {"variant": "b"}
        }),
    )?);
    tracker.track(PurchaseEvent::from_details(
        PurchaseDetails::new("T-1001", 29.9, vec![mug]).with_shipping(4.9),
    ));
    tracker.flush().await;

    if let Some(layer) = layers.get("dataLayer") {
        for entry in layer.entries() {
            println!("{entry}");
        }
    }
    Ok(())
}

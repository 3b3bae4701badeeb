//! Procedural macros for Trackify.
//!
//! - `#[derive(Event)]`: implements `trackify::Event` for a `Serialize` type.
//!   The payload is the value serialized to a JSON object and the name is the
//!   snake_case type name, unless overridden with `#[event(name = "...")]`.
//!
//! ```rust,ignore
//! use serde::Serialize;
//! use trackify::Event;
//!
//! #[derive(Debug, Serialize, Event)]
//! #[event(name = "add_to_wishlist")]
//! struct Wishlist {
//!     sku: String,
//! }
//! ```
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_event(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut name = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("event")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("event name must not be empty"));
                }
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported event attribute, expected `name`"))
            }
        })?;
    }
    let name = name.unwrap_or_else(|| snake_case(&ident.to_string()));

    Ok(quote! {
        impl #impl_generics ::trackify::Event for #ident #ty_generics #where_clause {
            fn name(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#name)
            }

            fn data(&self) -> ::trackify::Payload {
                ::trackify::to_payload(self)
            }
        }
    })
}

fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut prev_lower = false;
    for ch in ident.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::snake_case;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("NewsletterSignup"), "newsletter_signup");
        assert_eq!(snake_case("Quiz"), "quiz");
        assert_eq!(snake_case("Step2Done"), "step2_done");
        assert_eq!(snake_case("HTTPError"), "httperror");
    }
}

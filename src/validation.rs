use axum::{
    Json,
    extract::{FromRequest, Request},
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

use crate::{error::ApiError, models::Variant};

// Longest variant size label allowed by the schema.
const MAX_VARIANT_SIZE_LEN: usize = 20;

static IMAGE_URL_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn image_url_re() -> &'static Regex {
    IMAGE_URL_RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://\S+\.(png|jpe?g|gif|webp|avif|svg)(\?\S*)?$")
            .expect("image URL pattern must compile")
    })
}

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern must compile")
    })
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Accepts http(s) URLs ending in a known image extension (an optional query
/// string is tolerated).
pub fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    if image_url_re().is_match(url) {
        Ok(())
    } else {
        Err(rule_error(
            "image_url",
            "must be an http(s) URL ending in an image extension",
        ))
    }
}

/// A title must survive slug derivation. Length rules alone admit
/// punctuation-only titles whose derived slug would be empty and therefore
/// unaddressable.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if crate::slug::slugify(title).is_empty() {
        return Err(rule_error(
            "title",
            "title must contain at least one letter or digit",
        ));
    }
    Ok(())
}

/// Explicit slugs must already be in canonical form: lowercase alphanumerics
/// separated by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug_re().is_match(slug) {
        Ok(())
    } else {
        Err(rule_error(
            "slug",
            "must be lowercase alphanumerics separated by single hyphens",
        ))
    }
}

/// The images list must be non-empty and every entry must be an image URL.
pub fn validate_images(images: &[String]) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(rule_error("images", "at least one image is required"));
    }
    for url in images {
        validate_image_url(url)?;
    }
    Ok(())
}

/// The variants list must be non-empty; each variant needs a size label of
/// at most 20 characters, a non-negative price and a non-negative stock.
pub fn validate_variants(variants: &[Variant]) -> Result<(), ValidationError> {
    if variants.is_empty() {
        return Err(rule_error("variants", "at least one variant is required"));
    }
    for variant in variants {
        if variant.size.is_empty() || variant.size.chars().count() > MAX_VARIANT_SIZE_LEN {
            return Err(rule_error(
                "variant_size",
                "variant size must be between 1 and 20 characters",
            ));
        }
        if variant.price < 0.0 {
            return Err(rule_error(
                "variant_price",
                "variant price must not be negative",
            ));
        }
        if variant.stock < 0 {
            return Err(rule_error(
                "variant_stock",
                "variant stock must not be negative",
            ));
        }
    }
    Ok(())
}

/// ValidatedJson
///
/// Body extractor that runs the declarative rule chain before the handler
/// sees the payload. Deserialization failures (malformed JSON, unknown enum
/// literals) reject with a 400 message envelope; rule failures reject with a
/// 422 field→message map. Handlers that accept `ValidatedJson<T>` therefore
/// never observe an invalid `T`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        payload.validate().map_err(ApiError::from)?;
        Ok(Self(payload))
    }
}

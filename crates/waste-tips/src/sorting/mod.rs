//! Waste-sorting request pipeline: validation, verification, analysis and the
//! localized failure messages shown to the user.
//!
//! Upstream services sit behind the traits in [`gateways`] so the pipeline can be
//! exercised with deterministic fakes.

pub mod domain;
pub mod gateways;
pub mod localization;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{ImageUpload, SortingOutcome, SortingRequest, SortingResult};
pub use gateways::{AnalysisGateway, AnalysisRequest, GatewayError, VerificationGateway};
pub use localization::{ErrorKind, LocaleEntry, Localizer, FALLBACK_LANGUAGE};
pub use router::{cors_layer, sorting_router, FORM_PARSE_ERROR, METHOD_NOT_ALLOWED_ERROR};
pub use service::WasteSortingService;
pub use validation::{is_valid_image_type, is_valid_postal_code};

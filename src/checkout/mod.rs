//! Browser-driven checkout validation (C9).
//!
//! Grounded on `kyc_site_scan/checkout_validator.py`. `chromiumoxide`
//! replaces Playwright; the `BrowserDriver` trait follows the teacher's
//! trait-at-the-seam style (`async_trait` used throughout
//! `cooprefr-bettersys` for pluggable components).

pub mod driver;
pub mod scoring;
pub mod validator;

pub use driver::{BrowserDriver, ChromiumDriver, ClickableElement, NullBrowserDriver};
pub use validator::CheckoutValidator;

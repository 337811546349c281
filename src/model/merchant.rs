//! Merchant input schema.
//!
//! Grounded on `kyc_site_scan/models/input_schema.py` (`MerchantKYCInput`,
//! `OptionalMerchantData`, `RiskTier`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Unknown,
}

impl Default for RiskTier {
    fn default() -> Self {
        RiskTier::Unknown
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalMerchantData {
    pub mcc: Option<String>,
    pub country_of_incorporation: Option<String>,
    #[serde(default)]
    pub risk_tier: Option<RiskTier>,
}

/// Required merchant input for KYC website screening.
///
/// `website_url` is normalized at construction time: the scheme is
/// auto-prefixed to `https://` when missing, matching the original
/// validator's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantKYCInput {
    pub merchant_legal_name: String,
    pub registered_address: String,
    pub declared_business_type: String,
    pub declared_products_services: Vec<String>,
    pub website_url: String,
    pub merchant_display_name: String,
    #[serde(default)]
    pub optional_data: Option<OptionalMerchantData>,
}

#[derive(Debug, thiserror::Error)]
pub enum MerchantInputError {
    #[error("merchant_legal_name must be between 1 and 500 characters")]
    InvalidLegalName,
    #[error("registered_address must be between 10 and 1000 characters")]
    InvalidAddress,
    #[error("declared_business_type must be between 1 and 200 characters")]
    InvalidBusinessType,
    #[error("declared_products_services must contain at least one non-empty entry")]
    EmptyProducts,
    #[error("merchant_display_name must be between 1 and 200 characters")]
    InvalidDisplayName,
}

impl MerchantKYCInput {
    /// Validates and normalizes field contents in place. Trims whitespace
    /// from string fields, drops blank product entries, and ensures the
    /// website URL carries an explicit scheme.
    pub fn validate_and_normalize(mut self) -> Result<Self, MerchantInputError> {
        self.merchant_legal_name = self.merchant_legal_name.trim().to_string();
        self.declared_business_type = self.declared_business_type.trim().to_string();
        self.merchant_display_name = self.merchant_display_name.trim().to_string();

        if self.merchant_legal_name.is_empty() || self.merchant_legal_name.len() > 500 {
            return Err(MerchantInputError::InvalidLegalName);
        }
        if self.registered_address.len() < 10 || self.registered_address.len() > 1000 {
            return Err(MerchantInputError::InvalidAddress);
        }
        if self.declared_business_type.is_empty() || self.declared_business_type.len() > 200 {
            return Err(MerchantInputError::InvalidBusinessType);
        }
        if self.merchant_display_name.is_empty() || self.merchant_display_name.len() > 200 {
            return Err(MerchantInputError::InvalidDisplayName);
        }

        self.declared_products_services = self
            .declared_products_services
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if self.declared_products_services.is_empty() {
            return Err(MerchantInputError::EmptyProducts);
        }

        let trimmed = self.website_url.trim().to_string();
        self.website_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed
        } else {
            format!("https://{trimmed}")
        };

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> MerchantKYCInput {
        MerchantKYCInput {
            merchant_legal_name: "  Acme Corp  ".into(),
            registered_address: "123 Business Park, Suite 400, Mumbai".into(),
            declared_business_type: "E-commerce".into(),
            declared_products_services: vec!["Clothing".into(), "  ".into()],
            website_url: "example.com".into(),
            merchant_display_name: "Acme".into(),
            optional_data: None,
        }
    }

    #[test]
    fn normalizes_url_scheme_and_trims_fields() {
        let input = base_input().validate_and_normalize().unwrap();
        assert_eq!(input.website_url, "https://example.com");
        assert_eq!(input.merchant_legal_name, "Acme Corp");
        assert_eq!(input.declared_products_services, vec!["Clothing".to_string()]);
    }

    #[test]
    fn rejects_empty_product_list() {
        let mut input = base_input();
        input.declared_products_services = vec!["   ".into()];
        assert!(matches!(
            input.validate_and_normalize(),
            Err(MerchantInputError::EmptyProducts)
        ));
    }

    #[test]
    fn preserves_explicit_https_scheme() {
        let mut input = base_input();
        input.website_url = "https://shop.merchant.com".into();
        let input = input.validate_and_normalize().unwrap();
        assert_eq!(input.website_url, "https://shop.merchant.com");
    }
}

use serde::{Deserialize, Serialize};

use bodega_core::{CoreError, CoreResult};

/// A catalog record. `quantity` is the live on-hand count; it only ever
/// changes through the conditional stock operations on the repository, so
/// it can never be observed negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: String,
    pub category: String,
    pub subcategory: String,
    pub brand: String,
    pub price: u32,
    pub quantity: u32,
}

impl Product {
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("key", &self.key),
            ("category", &self.category),
            ("subcategory", &self.subcategory),
            ("brand", &self.brand),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "product {} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            key: "feta-400g".to_string(),
            category: "dairy".to_string(),
            subcategory: "cheese".to_string(),
            brand: "Epiros".to_string(),
            price: 450,
            quantity: 12,
        }
    }

    #[test]
    fn complete_record_passes_validation() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut product = sample();
        product.brand = "  ".to_string();
        assert!(matches!(
            product.validate(),
            Err(CoreError::Validation(msg)) if msg.contains("brand")
        ));
    }
}

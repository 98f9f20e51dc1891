use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub width: Decimal,
    #[serde(default)]
    pub height: Decimal,
    #[serde(default)]
    pub depth: Decimal,
}

impl Dimensions {
    pub fn volume(&self) -> Decimal {
        self.width * self.height * self.depth
    }
}

/// A raw product record as served by the catalog service.
///
/// Only the fields the simulator reads are modelled; everything else in the
/// catalog payload is ignored on deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_rating")]
    pub rating: Decimal,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

fn default_rating() -> Decimal {
    Decimal::ONE
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{CatalogPage, ProductId};

    #[test]
    fn catalog_page_decodes_dummyjson_shape() {
        let raw = r#"{
            "products": [{
                "id": 7,
                "title": "Essence Mascara Lash Princess",
                "description": "ignored",
                "price": 9.99,
                "discountPercentage": 7.17,
                "rating": 4.94,
                "stock": 5,
                "thumbnail": "https://cdn.example/7.png",
                "dimensions": {"width": 23.17, "height": 14.43, "depth": 28.01}
            }],
            "total": 194,
            "skip": 6,
            "limit": 1
        }"#;

        let page: CatalogPage = serde_json::from_str(raw).expect("page should decode");

        assert_eq!(page.total, 194);
        assert_eq!(page.products.len(), 1);
        let product = &page.products[0];
        assert_eq!(product.id, ProductId(7));
        assert_eq!(product.price, Decimal::new(999, 2));
        assert_eq!(product.discount_percentage, Decimal::new(717, 2));
        assert_eq!(product.rating, Decimal::new(494, 2));
        assert!(product.dimensions.is_some());
    }

    #[test]
    fn missing_rating_defaults_to_one() {
        let raw = r#"{"id": 1, "title": "Plain", "price": 10}"#;
        let product: super::CatalogProduct =
            serde_json::from_str(raw).expect("product should decode");

        assert_eq!(product.rating, Decimal::ONE);
        assert_eq!(product.stock, 0);
        assert_eq!(product.discount_percentage, Decimal::ZERO);
    }

    #[test]
    fn count_only_response_decodes_without_products() {
        let page: CatalogPage =
            serde_json::from_str(r#"{"total": 50}"#).expect("count response should decode");
        assert_eq!(page.total, 50);
        assert!(page.products.is_empty());
    }
}

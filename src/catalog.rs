//! Product catalog
//!
//! Static mapping from product name to display image and unit price.

use serde::{Deserialize, Serialize};

use crate::types::BasketItem;

/// A product that can be selected by gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub image: String,
    pub price: f64,
}

impl Product {
    fn new(name: &str, image: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            price,
        }
    }
}

/// Ordered product catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new(vec![
            Product::new("Apple", "apple.jpeg", 1.2),
            Product::new("Banana", "Banana.jpeg", 0.8),
            Product::new("Potatoes", "Potatoes.jpeg", 2.0),
            Product::new("Milk", "Milk.jpeg", 1.5),
            Product::new("Bread", "Bread.jpeg", 1.0),
            Product::new("Carrot", "Carrot.jpeg", 0.6),
            Product::new("Tomato", "Tomato.jpeg", 1.1),
            Product::new("Orange", "Orange.jpeg", 1.3),
        ])
    }
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a basket entry; unknown names get an empty image and zero price
    pub fn resolve(&self, name: &str) -> BasketItem {
        match self.get(name) {
            Some(product) => BasketItem {
                name: product.name.clone(),
                image: product.image.clone(),
                price: product.price,
            },
            None => BasketItem {
                name: name.to_string(),
                image: String::new(),
                price: 0.0,
            },
        }
    }
}

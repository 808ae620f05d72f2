use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Processors,
    Graphics,
    Memory,
    Cooling,
    Peripherals,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Processors,
        Category::Graphics,
        Category::Memory,
        Category::Cooling,
        Category::Peripherals,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Processors => "processors",
            Category::Graphics => "graphics",
            Category::Memory => "memory",
            Category::Cooling => "cooling",
            Category::Peripherals => "peripherals",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!("Category must be one of: {}", names.join(", "))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String, example = "499.00")]
    pub price: Money,
    pub description: String,
    pub category: Category,
    pub image: String,
    pub image_alt: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields joined onto an order line when it is read back.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub category: Category,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            category: product.category,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category: Category,
    pub image: String,
    pub image_alt: String,
    pub stock: i32,
}

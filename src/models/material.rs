use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialUnit {
    #[serde(rename = "piece")]
    Piece,
    #[serde(rename = "meter")]
    Meter,
    #[serde(rename = "sq-meter")]
    SquareMeter,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "liter")]
    Liter,
    #[serde(rename = "cubic-meter")]
    CubicMeter,
}

impl MaterialUnit {
    pub const ALL: [MaterialUnit; 6] = [
        MaterialUnit::Piece,
        MaterialUnit::Meter,
        MaterialUnit::SquareMeter,
        MaterialUnit::Kilogram,
        MaterialUnit::Liter,
        MaterialUnit::CubicMeter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialUnit::Piece => "piece",
            MaterialUnit::Meter => "meter",
            MaterialUnit::SquareMeter => "sq-meter",
            MaterialUnit::Kilogram => "kg",
            MaterialUnit::Liter => "liter",
            MaterialUnit::CubicMeter => "cubic-meter",
        }
    }
}

impl fmt::Display for MaterialUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| format!("Unknown material unit '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: Vec<String>,
    pub specification: serde_json::Value,
    pub unit: MaterialUnit,
    #[serde(alias = "default_price")]
    pub price: f64,
    pub stock: f64,
    pub min_stock: f64,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub name: String,
    pub sku: String,
    pub category: Vec<String>,
    pub specification: serde_json::Value,
    pub unit: MaterialUnit,
    pub price: f64,
    pub stock: f64,
    pub min_stock: f64,
    pub supplier: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<Vec<String>>,
    pub specification: Option<serde_json::Value>,
    pub unit: Option<MaterialUnit>,
    pub price: Option<f64>,
    pub stock: Option<f64>,
    pub min_stock: Option<f64>,
    pub supplier: Option<String>,
    pub description: Option<String>,
}

impl MaterialChanges {
    pub fn apply(&self, material: &mut Material) {
        if let Some(name) = &self.name {
            material.name = name.clone();
        }
        if let Some(sku) = &self.sku {
            material.sku = sku.clone();
        }
        if let Some(category) = &self.category {
            material.category = category.clone();
        }
        if let Some(specification) = &self.specification {
            material.specification = specification.clone();
        }
        if let Some(unit) = self.unit {
            material.unit = unit;
        }
        if let Some(price) = self.price {
            material.price = price;
        }
        if let Some(stock) = self.stock {
            material.stock = stock;
        }
        if let Some(min_stock) = self.min_stock {
            material.min_stock = min_stock;
        }
        if let Some(supplier) = &self.supplier {
            material.supplier = Some(supplier.clone());
        }
        if let Some(description) = &self.description {
            material.description = Some(description.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPage {
    pub materials: Vec<Material>,
    pub pagination: super::Pagination,
}

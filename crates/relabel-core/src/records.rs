//! Catalog record types shared by the classifier, the record store, and the
//! batch driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level storefront category. The display strings are the exact values
/// persisted in the `products.category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Shoes")]
    Shoes,
    #[serde(rename = "Clothing")]
    Clothing,
    #[serde(rename = "Accessories")]
    Accessories,
    #[serde(rename = "Bags & Backpacks")]
    BagsBackpacks,
    #[serde(rename = "Reptronics + Watches")]
    ReptronicsWatches,
    #[serde(rename = "Jewelry")]
    Jewelry,
    #[serde(rename = "Opium Style")]
    OpiumStyle,
    #[serde(rename = "Room Decor & Misc Items")]
    RoomDecorMisc,
    /// Legacy bucket still present on older rows.
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Shoes,
        Category::Clothing,
        Category::Accessories,
        Category::BagsBackpacks,
        Category::ReptronicsWatches,
        Category::Jewelry,
        Category::OpiumStyle,
        Category::RoomDecorMisc,
        Category::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Shoes => "Shoes",
            Category::Clothing => "Clothing",
            Category::Accessories => "Accessories",
            Category::BagsBackpacks => "Bags & Backpacks",
            Category::ReptronicsWatches => "Reptronics + Watches",
            Category::Jewelry => "Jewelry",
            Category::OpiumStyle => "Opium Style",
            Category::RoomDecorMisc => "Room Decor & Misc Items",
            Category::Other => "Other",
        }
    }

    /// Parse a stored category value, mapping anything unrecognized to the
    /// legacy `Other` bucket instead of failing the row.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Category {
        value.parse().unwrap_or(Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category: '{0}'")]
pub struct ParseCategoryError(String);

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Subcategory values the canonical rule table can assign. Meaningful only
/// under `Clothing` and `Accessories`; the display strings are the exact
/// values persisted in `products.sub_category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubCategory {
    #[serde(rename = "T-Shirts")]
    TShirts,
    #[serde(rename = "Shirts")]
    Shirts,
    #[serde(rename = "Hoodies")]
    Hoodies,
    #[serde(rename = "Sweaters")]
    Sweaters,
    #[serde(rename = "Jackets")]
    Jackets,
    #[serde(rename = "Tracksuits")]
    Tracksuits,
    #[serde(rename = "Pants & Jeans")]
    PantsJeans,
    #[serde(rename = "Shorts")]
    Shorts,
    #[serde(rename = "Hats")]
    Hats,
    #[serde(rename = "Belts")]
    Belts,
    #[serde(rename = "Sunglasses")]
    Sunglasses,
    #[serde(rename = "Scarves")]
    Scarves,
    #[serde(rename = "Wallets")]
    Wallets,
}

impl SubCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubCategory::TShirts => "T-Shirts",
            SubCategory::Shirts => "Shirts",
            SubCategory::Hoodies => "Hoodies",
            SubCategory::Sweaters => "Sweaters",
            SubCategory::Jackets => "Jackets",
            SubCategory::Tracksuits => "Tracksuits",
            SubCategory::PantsJeans => "Pants & Jeans",
            SubCategory::Shorts => "Shorts",
            SubCategory::Hats => "Hats",
            SubCategory::Belts => "Belts",
            SubCategory::Sunglasses => "Sunglasses",
            SubCategory::Scarves => "Scarves",
            SubCategory::Wallets => "Wallets",
        }
    }
}

impl std::fmt::Display for SubCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog row as seen by the classifier. `title` is classification input
/// and is never rewritten; `sub_category = None` means "not yet classified",
/// not "has no subcategory".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub title: String,
    pub category: Category,
    pub sub_category: Option<String>,
    pub brand: Option<String>,
}

/// Scopes the working set of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub category: Option<Category>,
    /// Restrict to records that have never been classified.
    pub sub_category_is_null: bool,
    pub brand: Option<String>,
}

/// Fields a batch or single-record update may set. `None` fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub brand: Option<String>,
}

impl RecordPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.sub_category.is_none() && self.brand.is_none()
    }
}

//! Read-only distribution reporting used for before/after verification.

use std::collections::BTreeMap;

use crate::records::{Category, ProductRecord};

/// Counts of categories and clothing subcategories across a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    /// Subcategory counts within `Clothing` only.
    pub clothing_by_subcategory: BTreeMap<String, usize>,
    /// Clothing/Accessories records with a subcategory assigned.
    pub classified: usize,
    /// Clothing/Accessories records still awaiting classification.
    pub unclassified: usize,
}

impl Distribution {
    /// Fraction of classifiable records that carry a subcategory.
    /// `1.0` when there are no classifiable records.
    #[must_use]
    pub fn classified_ratio(&self) -> f64 {
        let classifiable = self.classified + self.unclassified;
        if classifiable == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.classified as f64 / classifiable as f64
        }
    }
}

/// Tabulate the category/subcategory distribution of a record set.
#[must_use]
pub fn summarize(records: &[ProductRecord]) -> Distribution {
    let mut distribution = Distribution {
        total: records.len(),
        ..Distribution::default()
    };

    for record in records {
        *distribution
            .by_category
            .entry(record.category.as_str().to_string())
            .or_insert(0) += 1;

        let classifiable = matches!(record.category, Category::Clothing | Category::Accessories);
        if classifiable {
            match &record.sub_category {
                Some(sub) => {
                    distribution.classified += 1;
                    if record.category == Category::Clothing {
                        *distribution
                            .clothing_by_subcategory
                            .entry(sub.clone())
                            .or_insert(0) += 1;
                    }
                }
                None => distribution.unclassified += 1,
            }
        }
    }

    distribution
}

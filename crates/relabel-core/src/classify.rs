//! The classifier engine: special rules, priority-ranked keyword rules, and
//! brand detection over a normalized title.

use crate::normalize::{normalize_title, ClassifyError};
use crate::records::{Category, SubCategory};
use crate::rules::{KeywordRule, RuleTable, SpecialRule, DEFAULT_BRAND};

/// Context the caller already knows about the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hints<'a> {
    /// The record's current brand, if any. When present and non-empty, brand
    /// detection is skipped entirely.
    pub existing_brand: Option<&'a str>,
}

/// Result of one classification call. Empty fields mean "leave the record's
/// current value untouched"; the engine never asks a caller to null out a
/// previously assigned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub sub_category: Option<SubCategory>,
    pub brand_override: Option<&'static str>,
}

impl Classification {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sub_category.is_none() && self.brand_override.is_none()
    }
}

impl RuleTable {
    /// Classify a title under the given category.
    ///
    /// Categories without keyword tables yield the empty classification.
    /// Otherwise special rules are evaluated in declaration order (first
    /// non-excluded match wins), then the general table by priority with
    /// first-declared tie-breaks. Brand detection runs independently of the
    /// subcategory passes, and only when `hints.existing_brand` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::EmptyTitle`] for an empty or whitespace-only
    /// title; batch callers skip such records rather than aborting.
    pub fn classify(
        &self,
        title: &str,
        category: Category,
        hints: Hints<'_>,
    ) -> Result<Classification, ClassifyError> {
        let normalized = normalize_title(title)?;

        let Some((special, general)) = self.rules_for(category) else {
            return Ok(Classification::default());
        };

        let sub_category =
            match_special(&normalized, special).or_else(|| match_general(&normalized, general));

        let brand_override = match hints.existing_brand {
            Some(brand) if !brand.trim().is_empty() => None,
            _ => Some(self.detect_brand(&normalized)),
        };

        Ok(Classification {
            sub_category,
            brand_override,
        })
    }

    /// First brand rule with a keyword contained in the normalized title,
    /// falling back to [`DEFAULT_BRAND`].
    #[must_use]
    pub fn detect_brand(&self, normalized_title: &str) -> &'static str {
        self.brand_rules()
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| normalized_title.contains(keyword))
            })
            .map_or(DEFAULT_BRAND, |rule| rule.brand)
    }
}

fn match_special(normalized: &str, rules: &[SpecialRule]) -> Option<SubCategory> {
    rules
        .iter()
        .find(|rule| {
            normalized.contains(rule.keyword)
                && !rule
                    .exclusions
                    .iter()
                    .any(|exclusion| normalized.contains(exclusion))
        })
        .map(|rule| rule.set_to)
}

fn match_general(normalized: &str, rules: &[KeywordRule]) -> Option<SubCategory> {
    let mut winner: Option<&KeywordRule> = None;
    for rule in rules {
        if !rule
            .keywords
            .iter()
            .any(|keyword| normalized.contains(keyword))
        {
            continue;
        }
        // Replace only on strictly higher priority so ties keep the
        // earliest-declared rule.
        match winner {
            Some(current) if current.priority >= rule.priority => {}
            _ => winner = Some(rule),
        }
    }
    winner.map(|rule| rule.target)
}

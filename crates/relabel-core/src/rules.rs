//! The canonical keyword rule tables and their load-time validation.
//!
//! Keys are lowercase substrings matched against the normalized title. The
//! tables are static data; [`RuleTable::canonical`] validates them once at
//! startup so a malformed table can never surface mid-batch.

use thiserror::Error;

use crate::records::{Category, SubCategory};

/// A keyword rule with an attached exclusion set, evaluated before the
/// priority-ranked table. Used for near-ambiguous keywords (e.g. `"polo"`).
#[derive(Debug, Clone, Copy)]
pub struct SpecialRule {
    pub keyword: &'static str,
    /// The rule is suppressed if the title contains any of these terms.
    pub exclusions: &'static [&'static str],
    pub set_to: SubCategory,
}

/// A general keyword rule. Matches if **any** keyword is a substring of the
/// normalized title. Higher `priority` wins; ties go to the earliest-declared
/// rule.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub target: SubCategory,
    pub keywords: &'static [&'static str],
    pub priority: u8,
}

/// A keyword-to-brand rule for inferring a brand from title text when none
/// is supplied. First declared match wins.
#[derive(Debug, Clone, Copy)]
pub struct BrandRule {
    pub brand: &'static str,
    pub keywords: &'static [&'static str],
}

/// Brand assigned when no brand rule matches and the record carries none.
pub const DEFAULT_BRAND: &str = "Other";

const CLOTHING_SPECIAL_RULES: &[SpecialRule] = &[
    // "polo" alone is a collared shirt; "polo shirt" etc. fall through to the
    // general pass where "shirt" matches on its own.
    SpecialRule {
        keyword: "polo",
        exclusions: &["shirt"],
        set_to: SubCategory::Shirts,
    },
    // Vests read as jackets unless they are knit.
    SpecialRule {
        keyword: "vest",
        exclusions: &["sweater vest", "knit vest"],
        set_to: SubCategory::Jackets,
    },
];

const CLOTHING_RULES: &[KeywordRule] = &[
    KeywordRule {
        target: SubCategory::Tracksuits,
        keywords: &["tech fleece"],
        priority: 30,
    },
    KeywordRule {
        target: SubCategory::Jackets,
        keywords: &["denim jacket"],
        priority: 30,
    },
    KeywordRule {
        target: SubCategory::Tracksuits,
        keywords: &["tracksuit", "track suit", "track pants", "track jacket", "sweatsuit"],
        priority: 20,
    },
    KeywordRule {
        target: SubCategory::TShirts,
        keywords: &["t-shirt", "t shirt", "tee shirt", "graphic tee"],
        priority: 20,
    },
    KeywordRule {
        target: SubCategory::Sweaters,
        keywords: &["sweatshirt", "crewneck"],
        priority: 20,
    },
    KeywordRule {
        target: SubCategory::Hoodies,
        keywords: &["hoodie", "hooded", "zip up", "half zip", "quarter zip"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Jackets,
        keywords: &[
            "fleece",
            "jacket",
            "coat",
            "puffer",
            "parka",
            "bomber",
            "windbreaker",
            "anorak",
        ],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Sweaters,
        keywords: &["sweater", "cardigan", "knitwear", "jumper", "pullover"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Shirts,
        keywords: &["shirt", "flannel", "button up", "button down", "blouse"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::PantsJeans,
        keywords: &[
            "jeans",
            "denim",
            "pants",
            "trousers",
            "joggers",
            "sweatpants",
            "chinos",
            "cargos",
        ],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Shorts,
        keywords: &["shorts"],
        priority: 10,
    },
];

const ACCESSORIES_SPECIAL_RULES: &[SpecialRule] = &[];

const ACCESSORIES_RULES: &[KeywordRule] = &[
    KeywordRule {
        target: SubCategory::Hats,
        keywords: &["hat", "cap", "beanie", "snapback"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Belts,
        keywords: &["belt"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Sunglasses,
        keywords: &["sunglasses", "shades"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Scarves,
        keywords: &["scarf", "bandana"],
        priority: 10,
    },
    KeywordRule {
        target: SubCategory::Wallets,
        keywords: &["wallet", "cardholder", "card holder"],
        priority: 10,
    },
];

const BRAND_RULES: &[BrandRule] = &[
    BrandRule {
        brand: "JORDAN",
        keywords: &["jordan"],
    },
    BrandRule {
        brand: "NIKE",
        keywords: &["nike", "swoosh"],
    },
    BrandRule {
        brand: "ADIDAS",
        keywords: &["adidas"],
    },
    BrandRule {
        brand: "LEVI'S",
        keywords: &["levi's", "levis"],
    },
    BrandRule {
        brand: "SUPREME",
        keywords: &["supreme"],
    },
    BrandRule {
        brand: "STUSSY",
        keywords: &["stussy", "stüssy"],
    },
    BrandRule {
        brand: "BAPE",
        keywords: &["bape", "a bathing ape"],
    },
    BrandRule {
        brand: "CARHARTT",
        keywords: &["carhartt"],
    },
    BrandRule {
        brand: "THE NORTH FACE",
        keywords: &["north face"],
    },
    BrandRule {
        brand: "POLO RALPH LAUREN",
        keywords: &["ralph lauren", "polo ralph"],
    },
    BrandRule {
        brand: "CHAMPION",
        keywords: &["champion"],
    },
    BrandRule {
        brand: "HARLEY DAVIDSON",
        keywords: &["harley"],
    },
    BrandRule {
        brand: "ED HARDY",
        keywords: &["ed hardy"],
    },
    BrandRule {
        brand: "TRUE RELIGION",
        keywords: &["true religion"],
    },
    BrandRule {
        brand: "AFFLICTION",
        keywords: &["affliction"],
    },
    BrandRule {
        brand: "PUMA",
        keywords: &["puma"],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("rule for '{target}' has an empty keyword")]
    EmptyKeyword { target: String },

    #[error("keyword '{keyword}' must be lowercase")]
    NotLowercase { keyword: String },

    #[error("keyword '{keyword}' maps to both '{first}' and '{second}' at equal priority")]
    DuplicateKeyword {
        keyword: String,
        first: String,
        second: String,
    },

    #[error(
        "keyword '{superstring}' ('{super_target}') contains '{substring}' ('{sub_target}') \
         but does not outrank it; assign the longer keyword a strictly higher priority"
    )]
    AmbiguousOverlap {
        substring: String,
        sub_target: String,
        superstring: String,
        super_target: String,
    },
}

/// The validated rule tables. Construct via [`RuleTable::canonical`]; the
/// classifier in [`crate::classify`] operates on this.
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    clothing_special: &'static [SpecialRule],
    clothing: &'static [KeywordRule],
    accessories_special: &'static [SpecialRule],
    accessories: &'static [KeywordRule],
    brands: &'static [BrandRule],
}

impl RuleTable {
    /// Build and validate the canonical table.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTableError`] if any keyword is empty or not lowercase,
    /// if a keyword maps to two targets at equal priority, or if a keyword
    /// contains another rule's keyword without outranking it.
    pub fn canonical() -> Result<Self, RuleTableError> {
        let table = RuleTable {
            clothing_special: CLOTHING_SPECIAL_RULES,
            clothing: CLOTHING_RULES,
            accessories_special: ACCESSORIES_SPECIAL_RULES,
            accessories: ACCESSORIES_RULES,
            brands: BRAND_RULES,
        };
        validate_special_rules(table.clothing_special)?;
        validate_special_rules(table.accessories_special)?;
        validate_keyword_rules(table.clothing)?;
        validate_keyword_rules(table.accessories)?;
        validate_brand_rules(table.brands)?;
        Ok(table)
    }

    /// The special and general rules for a category, or `None` for categories
    /// without keyword tables (classification is a no-op for those).
    #[must_use]
    pub fn rules_for(
        &self,
        category: Category,
    ) -> Option<(&'static [SpecialRule], &'static [KeywordRule])> {
        match category {
            Category::Clothing => Some((self.clothing_special, self.clothing)),
            Category::Accessories => Some((self.accessories_special, self.accessories)),
            _ => None,
        }
    }

    #[must_use]
    pub fn brand_rules(&self) -> &'static [BrandRule] {
        self.brands
    }
}

fn check_keyword(keyword: &str, target: &str) -> Result<(), RuleTableError> {
    if keyword.trim().is_empty() {
        return Err(RuleTableError::EmptyKeyword {
            target: target.to_string(),
        });
    }
    if keyword != keyword.to_lowercase() {
        return Err(RuleTableError::NotLowercase {
            keyword: keyword.to_string(),
        });
    }
    Ok(())
}

fn validate_special_rules(rules: &[SpecialRule]) -> Result<(), RuleTableError> {
    for (i, rule) in rules.iter().enumerate() {
        check_keyword(rule.keyword, rule.set_to.as_str())?;
        for exclusion in rule.exclusions {
            check_keyword(exclusion, rule.set_to.as_str())?;
        }
        for earlier in &rules[..i] {
            if earlier.keyword == rule.keyword {
                return Err(RuleTableError::DuplicateKeyword {
                    keyword: rule.keyword.to_string(),
                    first: earlier.set_to.as_str().to_string(),
                    second: rule.set_to.as_str().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_keyword_rules(rules: &[KeywordRule]) -> Result<(), RuleTableError> {
    // Flatten to (keyword, target, priority) for pairwise checks.
    let mut entries: Vec<(&str, SubCategory, u8)> = Vec::new();
    for rule in rules {
        for &keyword in rule.keywords {
            check_keyword(keyword, rule.target.as_str())?;
            entries.push((keyword, rule.target, rule.priority));
        }
    }

    for (i, &(kw_a, target_a, prio_a)) in entries.iter().enumerate() {
        for &(kw_b, target_b, prio_b) in &entries[i + 1..] {
            if target_a == target_b {
                continue;
            }
            if kw_a == kw_b && prio_a == prio_b {
                return Err(RuleTableError::DuplicateKeyword {
                    keyword: kw_a.to_string(),
                    first: target_a.as_str().to_string(),
                    second: target_b.as_str().to_string(),
                });
            }
            // A strict superstring keyword with a different target must win
            // on priority, never on declaration-order accident.
            if kw_a != kw_b && kw_a.contains(kw_b) && prio_a <= prio_b {
                return Err(RuleTableError::AmbiguousOverlap {
                    substring: kw_b.to_string(),
                    sub_target: target_b.as_str().to_string(),
                    superstring: kw_a.to_string(),
                    super_target: target_a.as_str().to_string(),
                });
            }
            if kw_a != kw_b && kw_b.contains(kw_a) && prio_b <= prio_a {
                return Err(RuleTableError::AmbiguousOverlap {
                    substring: kw_a.to_string(),
                    sub_target: target_a.as_str().to_string(),
                    superstring: kw_b.to_string(),
                    super_target: target_b.as_str().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_brand_rules(rules: &[BrandRule]) -> Result<(), RuleTableError> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    for rule in rules {
        for &keyword in rule.keywords {
            check_keyword(keyword, rule.brand)?;
            if let Some(&(_, first)) = seen.iter().find(|(k, b)| *k == keyword && *b != rule.brand)
            {
                return Err(RuleTableError::DuplicateKeyword {
                    keyword: keyword.to_string(),
                    first: first.to_string(),
                    second: rule.brand.to_string(),
                });
            }
            seen.push((keyword, rule.brand));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_validates() {
        let table = RuleTable::canonical();
        assert!(table.is_ok(), "canonical table failed: {table:?}");
    }

    #[test]
    fn clothing_and_accessories_have_tables() {
        let table = RuleTable::canonical().unwrap();
        assert!(table.rules_for(Category::Clothing).is_some());
        assert!(table.rules_for(Category::Accessories).is_some());
        assert!(table.rules_for(Category::Shoes).is_none());
        assert!(table.rules_for(Category::Other).is_none());
    }

    #[test]
    fn rejects_uppercase_keyword() {
        let rules = [KeywordRule {
            target: SubCategory::Jackets,
            keywords: &["Fleece"],
            priority: 10,
        }];
        let err = validate_keyword_rules(&rules).unwrap_err();
        assert!(matches!(err, RuleTableError::NotLowercase { ref keyword } if keyword == "Fleece"));
    }

    #[test]
    fn rejects_empty_keyword() {
        let rules = [KeywordRule {
            target: SubCategory::Jackets,
            keywords: &["  "],
            priority: 10,
        }];
        assert!(matches!(
            validate_keyword_rules(&rules),
            Err(RuleTableError::EmptyKeyword { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_keyword_at_equal_priority() {
        let rules = [
            KeywordRule {
                target: SubCategory::Jackets,
                keywords: &["fleece"],
                priority: 10,
            },
            KeywordRule {
                target: SubCategory::Hoodies,
                keywords: &["fleece"],
                priority: 10,
            },
        ];
        assert!(matches!(
            validate_keyword_rules(&rules),
            Err(RuleTableError::DuplicateKeyword { .. })
        ));
    }

    #[test]
    fn rejects_superstring_without_higher_priority() {
        let rules = [
            KeywordRule {
                target: SubCategory::Jackets,
                keywords: &["fleece"],
                priority: 10,
            },
            KeywordRule {
                target: SubCategory::Tracksuits,
                keywords: &["tech fleece"],
                priority: 10,
            },
        ];
        let err = validate_keyword_rules(&rules).unwrap_err();
        assert!(
            matches!(err, RuleTableError::AmbiguousOverlap { ref superstring, .. } if superstring == "tech fleece"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn accepts_superstring_with_higher_priority() {
        let rules = [
            KeywordRule {
                target: SubCategory::Jackets,
                keywords: &["fleece"],
                priority: 10,
            },
            KeywordRule {
                target: SubCategory::Tracksuits,
                keywords: &["tech fleece"],
                priority: 30,
            },
        ];
        assert!(validate_keyword_rules(&rules).is_ok());
    }

    #[test]
    fn superstring_with_same_target_is_allowed() {
        let rules = [KeywordRule {
            target: SubCategory::PantsJeans,
            keywords: &["pants", "sweatpants"],
            priority: 10,
        }];
        assert!(validate_keyword_rules(&rules).is_ok());
    }

    #[test]
    fn rejects_duplicate_special_keyword() {
        let rules = [
            SpecialRule {
                keyword: "polo",
                exclusions: &["shirt"],
                set_to: SubCategory::Shirts,
            },
            SpecialRule {
                keyword: "polo",
                exclusions: &[],
                set_to: SubCategory::TShirts,
            },
        ];
        assert!(matches!(
            validate_special_rules(&rules),
            Err(RuleTableError::DuplicateKeyword { .. })
        ));
    }

    #[test]
    fn rejects_brand_keyword_claimed_by_two_brands() {
        let rules = [
            BrandRule {
                brand: "NIKE",
                keywords: &["swoosh"],
            },
            BrandRule {
                brand: "ADIDAS",
                keywords: &["swoosh"],
            },
        ];
        assert!(matches!(
            validate_brand_rules(&rules),
            Err(RuleTableError::DuplicateKeyword { .. })
        ));
    }
}

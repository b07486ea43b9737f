pub mod app_config;
pub mod classify;
pub mod config;
pub mod corrections;
pub mod normalize;
pub mod records;
pub mod report;
pub mod rules;

pub use app_config::{AppConfig, Environment};
pub use classify::{Classification, Hints};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use corrections::BrandCorrections;
pub use normalize::{normalize_title, ClassifyError};
pub use records::{
    Category, ParseCategoryError, ProductRecord, RecordFilter, RecordPatch, SubCategory,
};
pub use report::{summarize, Distribution};
pub use rules::{BrandRule, KeywordRule, RuleTable, RuleTableError, SpecialRule, DEFAULT_BRAND};

//! Brand canonicalization: a fixed misspelling/capitalization map applied
//! whenever a brand field is written, independent of the keyword classifier.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;

/// Known-wrong spellings and their canonical forms. Lookup is case-sensitive
/// and exact; anything not listed passes through unchanged.
const BUILTIN_CORRECTIONS: &[(&str, &str)] = &[
    ("ADIDSA", "ADIDAS"),
    ("Adidas", "ADIDAS"),
    ("adidas", "ADIDAS"),
    ("Nike", "NIKE"),
    ("nike", "NIKE"),
    ("LEVIS", "LEVI'S"),
    ("Levis", "LEVI'S"),
    ("Levi's", "LEVI'S"),
    ("Stussy", "STUSSY"),
    ("Stüssy", "STUSSY"),
    ("STÜSSY", "STUSSY"),
    ("North Face", "THE NORTH FACE"),
    ("NORTH FACE", "THE NORTH FACE"),
    ("Harley", "HARLEY DAVIDSON"),
    ("HARLEY", "HARLEY DAVIDSON"),
    ("TRUE RELIGON", "TRUE RELIGION"),
    ("True Religion", "TRUE RELIGION"),
    ("Supreme", "SUPREME"),
    ("CARHART", "CARHARTT"),
    ("Carhartt", "CARHARTT"),
    ("Champion", "CHAMPION"),
    ("Bape", "BAPE"),
    ("Ralph Lauren", "POLO RALPH LAUREN"),
    ("Jordan", "JORDAN"),
    ("Puma", "PUMA"),
];

#[derive(Debug, Deserialize)]
struct CorrectionsFile {
    corrections: HashMap<String, String>,
}

/// The brand corrector. Pure lookup; idempotent by construction (validated:
/// no canonical value is itself a key mapping elsewhere).
#[derive(Debug, Clone)]
pub struct BrandCorrections {
    map: HashMap<String, String>,
}

impl BrandCorrections {
    /// The built-in correction table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            map: BUILTIN_CORRECTIONS
                .iter()
                .map(|&(wrong, canonical)| (wrong.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Load corrections from a YAML file, merged over the built-in table
    /// (file entries win on conflict).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or if the
    /// merged table fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::CorrectionsFileIo {
                path: path.display().to_string(),
                source: e,
            })?;
        let file: CorrectionsFile =
            serde_yaml::from_str(&content).map_err(ConfigError::CorrectionsFileParse)?;

        let mut merged = Self::builtin();
        merged.map.extend(file.corrections);
        merged.validate()?;
        Ok(merged)
    }

    /// Built-in table, or the merged file table when the config names one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured file cannot be loaded.
    pub fn from_app_config(config: &crate::AppConfig) -> Result<Self, ConfigError> {
        match &config.corrections_path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Correct a brand spelling. No-op for canonical or unknown brands.
    #[must_use]
    pub fn correct<'a>(&'a self, brand: &'a str) -> &'a str {
        self.map.get(brand).map_or(brand, String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (wrong, canonical) in &self.map {
            if wrong.trim().is_empty() || canonical.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "brand corrections must have non-empty keys and values".to_string(),
                ));
            }
            // Idempotence: correcting a canonical value must be a no-op.
            if let Some(further) = self.map.get(canonical) {
                if further != canonical {
                    return Err(ConfigError::Validation(format!(
                        "correction target '{canonical}' is itself corrected to '{further}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

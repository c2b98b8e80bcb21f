//! Registry of housing-type identifiers.
//!
//! The registry is configuration data: the built-in table can be replaced by
//! a JSON document so historical identifiers (such as the `sqaure` spelling
//! found in older rows) map onto canonical ids without code changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One registered housing type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HousingType {
    /// Canonical identifier stored on housing measurements.
    #[schema(example = "squared")]
    pub id: String,
    /// Human-readable label.
    #[schema(example = "Squared housing")]
    pub label: String,
    /// Key of the reference video directory for this type.
    #[schema(example = "sqaure_housing")]
    pub video_category: String,
    /// Alternate spellings resolved to `id`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Serialised registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingTypeDocument {
    pub default_type: String,
    pub types: Vec<HousingType>,
}

/// Reasons a registry document is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HousingTypeRegistryError {
    #[error("housing type registry must define at least one type")]
    Empty,
    #[error("housing type identifier must not be blank")]
    BlankIdentifier,
    #[error("housing type identifier {0} is registered more than once")]
    DuplicateIdentifier(String),
    #[error("default housing type {0} is not registered")]
    UnknownDefault(String),
}

/// Validated housing-type registry.
///
/// # Examples
/// ```
/// use inspection_backend::domain::HousingTypeRegistry;
///
/// let registry = HousingTypeRegistry::builtin();
/// assert_eq!(registry.default_type(), "standard");
/// assert!(registry.is_valid("oval"));
/// assert_eq!(registry.canonical("sqaure"), Some("squared"));
/// assert!(!registry.is_valid("hexagonal"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousingTypeRegistry {
    default_type: String,
    types: Vec<HousingType>,
}

impl HousingTypeRegistry {
    /// Registry shipped with the service.
    #[must_use]
    pub fn builtin() -> Self {
        let entry = |id: &str, label: &str, video_category: &str, aliases: &[&str]| HousingType {
            id: id.to_owned(),
            label: label.to_owned(),
            video_category: video_category.to_owned(),
            aliases: aliases.iter().map(|alias| (*alias).to_owned()).collect(),
        };
        Self {
            default_type: "standard".to_owned(),
            types: vec![
                entry("standard", "Standard housing", "housing", &["housing"]),
                entry("oval", "Oval housing", "oval_housing", &[]),
                entry("squared", "Squared housing", "sqaure_housing", &["sqaure", "square"]),
                entry("angular", "Angular housing", "angular_housing", &[]),
            ],
        }
    }

    /// Validate a registry document.
    ///
    /// # Errors
    /// Rejects empty registries, blank or repeated identifiers (ids and
    /// aliases share one namespace) and a default that is not a registered id.
    pub fn from_document(document: HousingTypeDocument) -> Result<Self, HousingTypeRegistryError> {
        if document.types.is_empty() {
            return Err(HousingTypeRegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for name in document
            .types
            .iter()
            .flat_map(|ty| std::iter::once(&ty.id).chain(ty.aliases.iter()))
        {
            let normalised = normalise(name);
            if normalised.is_empty() {
                return Err(HousingTypeRegistryError::BlankIdentifier);
            }
            if !seen.insert(normalised) {
                return Err(HousingTypeRegistryError::DuplicateIdentifier(name.clone()));
            }
        }
        if !document.types.iter().any(|ty| ty.id == document.default_type) {
            return Err(HousingTypeRegistryError::UnknownDefault(document.default_type));
        }
        Ok(Self {
            default_type: document.default_type,
            types: document.types,
        })
    }

    /// Parse and validate a JSON registry document.
    ///
    /// # Errors
    /// Returns a message describing either the decode or validation failure.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let document: HousingTypeDocument =
            serde_json::from_str(text).map_err(|err| err.to_string())?;
        Self::from_document(document).map_err(|err| err.to_string())
    }

    /// Resolve an id or alias (case-insensitive, trimmed) to its entry.
    #[must_use]
    pub fn resolve(&self, type_id: &str) -> Option<&HousingType> {
        let wanted = normalise(type_id);
        self.types.iter().find(|ty| {
            normalise(&ty.id) == wanted || ty.aliases.iter().any(|alias| normalise(alias) == wanted)
        })
    }

    /// Canonical id for an id or alias.
    #[must_use]
    pub fn canonical(&self, type_id: &str) -> Option<&str> {
        self.resolve(type_id).map(|ty| ty.id.as_str())
    }

    /// Whether `type_id` names a registered type or alias.
    #[must_use]
    pub fn is_valid(&self, type_id: &str) -> bool {
        self.resolve(type_id).is_some()
    }

    /// Identifier applied when a housing entry omits its type.
    #[must_use]
    pub fn default_type(&self) -> &str {
        self.default_type.as_str()
    }

    /// Canonical identifiers in registration order.
    pub fn all_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|ty| ty.id.as_str())
    }

    /// Full entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[HousingType] {
        &self.types
    }

    /// Video directory key for a housing type, if registered.
    #[must_use]
    pub fn video_category(&self, type_id: &str) -> Option<&str> {
        self.resolve(type_id).map(|ty| ty.video_category.as_str())
    }
}

impl Default for HousingTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

//! Manager configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable | Default |
//! |---|---|
//! | `ONTOLOGY_LOAD_ANNOTATION_AXIOMS` | `true` |
//! | `ONTOLOGY_SILENT_MISSING_IMPORTS` | `false` |
//! | `ONTOLOGY_DEFAULT_FORMAT` | `json-snapshot` |

use crate::domain::OntologyFormat;

/// Runtime policy switches for the manager.
///
/// Loaded once via [`ManagerConfig::from_env`] or built with
/// [`ManagerConfig::default`]; the two booleans can be changed later
/// through the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// When `false`, additions of annotation axioms are skipped.
    pub load_annotation_axioms: bool,

    /// When `true`, imports that fail to load are reported through
    /// missing-import listeners instead of failing the outer load.
    pub silent_missing_imports: bool,

    /// Format used when saving an ontology with no recorded format.
    pub default_format: OntologyFormat,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            load_annotation_axioms: true,
            silent_missing_imports: false,
            default_format: OntologyFormat::json_snapshot(),
        }
    }
}

impl ManagerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults when a variable is unset or unparsable.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let default_format = std::env::var("ONTOLOGY_DEFAULT_FORMAT")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .map_or(defaults.default_format, OntologyFormat::new);

        Self {
            load_annotation_axioms: parse_env_bool(
                "ONTOLOGY_LOAD_ANNOTATION_AXIOMS",
                defaults.load_annotation_axioms,
            ),
            silent_missing_imports: parse_env_bool(
                "ONTOLOGY_SILENT_MISSING_IMPORTS",
                defaults.silent_missing_imports,
            ),
            default_format,
        }
    }

    /// Returns a copy with the missing-imports policy set.
    #[must_use]
    pub fn with_silent_missing_imports(mut self, silent: bool) -> Self {
        self.silent_missing_imports = silent;
        self
    }

    /// Returns a copy with annotation-axiom loading set.
    #[must_use]
    pub fn with_load_annotation_axioms(mut self, load: bool) -> Self {
        self.load_annotation_axioms = load;
        self
    }
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

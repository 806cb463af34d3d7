//! Procedure catalog loading and lookup.
//!
//! Catalog files use a JSON DSL:
//!
//! ```json
//! {
//!   "procedures": [
//!     {
//!       "id": 7,
//!       "name": "cold and dark to taxi",
//!       "steps": [
//!         {"id": 1, "description": "battery on", "action_code": "set BAT 1",
//!          "expected_state_check": "BAT", "delay_after_ms": 1000},
//!         {"id": 2, "description": "wait for apu", "kind": "condition",
//!          "action_code": "APU_AVAIL", "delay_after_ms": 2000}
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use stepseq_core::{Procedure, ProcedureCatalog};

/// Catalog file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    procedures: Vec<Procedure>,
}

/// Validated, id-indexed procedure catalog.
pub struct Catalog {
    procedures: HashMap<i64, Arc<Procedure>>,
    checksum: String,
}

impl Catalog {
    /// Loads and validates a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            procedures = catalog.len(),
            checksum = %catalog.checksum(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses and validates a catalog from a JSON string.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::from_parts(file)
    }

    /// Builds a catalog from an in-memory JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_value(value.clone())?;
        Self::from_parts(file)
    }

    fn from_parts(file: CatalogFile) -> Result<Self, CatalogError> {
        if file.procedures.is_empty() {
            return Err(CatalogError::Empty);
        }

        // Checksum over the canonical serialization, for integrity
        // logging and change detection across reloads.
        let canonical = serde_json::to_vec(&file)?;
        let checksum = format!("{:08x}", crc32c::crc32c(&canonical));

        let mut procedures = HashMap::new();
        for procedure in file.procedures {
            if procedure.is_empty() {
                return Err(CatalogError::EmptySteps {
                    id: procedure.id,
                    name: procedure.name.clone(),
                });
            }
            for step in procedure.steps() {
                if step.action_code.trim().is_empty() {
                    return Err(CatalogError::EmptyActionCode {
                        id: procedure.id,
                        step_id: step.id,
                    });
                }
            }
            let id = procedure.id;
            if procedures.insert(id, Arc::new(procedure)).is_some() {
                return Err(CatalogError::DuplicateProcedure { id });
            }
        }

        Ok(Self {
            procedures,
            checksum,
        })
    }

    /// Returns the procedure with the given id.
    pub fn get(&self, id: i64) -> Option<Arc<Procedure>> {
        self.procedures.get(&id).cloned()
    }

    /// All procedure ids, ascending.
    pub fn procedure_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.procedures.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// crc32c of the canonical catalog serialization.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Number of procedures.
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl ProcedureCatalog for Catalog {
    fn lookup(&self, id: i64) -> Option<Arc<Procedure>> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_catalog() -> serde_json::Value {
        json!({
            "procedures": [
                {
                    "id": 7,
                    "name": "startup",
                    "steps": [
                        {"id": 1, "description": "battery on", "action_code": "set BAT 1",
                         "expected_state_check": "BAT", "delay_after_ms": 1000},
                        {"id": 2, "description": "wait for apu", "kind": "condition",
                         "action_code": "APU_AVAIL", "delay_after_ms": 2000},
                        {"id": 3, "description": "beacon on", "action_code": "set BEACON 1"}
                    ]
                },
                {
                    "id": 8,
                    "name": "shutdown",
                    "steps": [
                        {"id": 1, "description": "beacon off", "action_code": "set BEACON 0"}
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_load_and_lookup() {
        let catalog = Catalog::from_json(&sample_catalog()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.procedure_ids(), vec![7, 8]);

        let startup = catalog.lookup(7).unwrap();
        assert_eq!(startup.name, "startup");
        assert_eq!(startup.len(), 3);
        assert!(startup.step(1).unwrap().is_condition());
        assert_eq!(
            startup.step(0).unwrap().expected_state_check.as_deref(),
            Some("BAT")
        );
        // Omitted fields take their defaults.
        assert_eq!(startup.step(2).unwrap().delay_after_ms, 0);

        assert!(catalog.lookup(99).is_none());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = Catalog::from_json(&json!({"procedures": []}));
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_duplicate_procedure_rejected() {
        let result = Catalog::from_json(&json!({
            "procedures": [
                {"id": 1, "name": "a", "steps": [
                    {"id": 1, "description": "x", "action_code": "set A 1"}
                ]},
                {"id": 1, "name": "b", "steps": [
                    {"id": 1, "description": "y", "action_code": "set B 1"}
                ]}
            ]
        }));
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateProcedure { id: 1 })
        ));
    }

    #[test]
    fn test_procedure_without_steps_rejected() {
        let result = Catalog::from_json(&json!({
            "procedures": [{"id": 4, "name": "hollow", "steps": []}]
        }));
        assert!(matches!(result, Err(CatalogError::EmptySteps { id: 4, .. })));
    }

    #[test]
    fn test_blank_action_code_rejected() {
        let result = Catalog::from_json(&json!({
            "procedures": [{"id": 4, "name": "bad", "steps": [
                {"id": 9, "description": "noop", "action_code": "   "}
            ]}]
        }));
        assert!(matches!(
            result,
            Err(CatalogError::EmptyActionCode { id: 4, step_id: 9 })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, sample_catalog().to_string()).unwrap();

        let catalog = Catalog::from_file(&path).unwrap();
        assert_eq!(catalog.len(), 2);

        let missing = Catalog::from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_checksum_tracks_content() {
        let a = Catalog::from_json(&sample_catalog()).unwrap();
        let b = Catalog::from_json(&sample_catalog()).unwrap();
        assert_eq!(a.checksum(), b.checksum());

        let mut changed = sample_catalog();
        changed["procedures"][0]["steps"][0]["delay_after_ms"] = json!(2000);
        let c = Catalog::from_json(&changed).unwrap();
        assert_ne!(a.checksum(), c.checksum());
    }
}

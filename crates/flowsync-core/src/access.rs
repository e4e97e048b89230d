// ── Equipment access records ──
//
// A controller is reached through the access record registered for its
// equipment: base URI plus Basic credentials, one record per scheme.
// Lookup is behind a trait so the containing application can back it
// with its own inventory.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::CoreError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    /// Resolution order: encrypted access first.
    pub const PREFERENCE: [Scheme; 2] = [Scheme::Https, Scheme::Http];
}

/// How to reach one piece of equipment.
#[derive(Debug, Clone)]
pub struct EquipmentAccess {
    pub equipment: String,
    pub scheme: Scheme,
    /// Controller base URI, e.g. `https://odl.example:8181`.
    pub fqdn: String,
    pub username: String,
    pub password: SecretString,
}

/// Source of access records.
pub trait AccessStore: Send + Sync {
    fn lookup(&self, equipment: &str, scheme: Scheme) -> Option<EquipmentAccess>;
}

/// Resolve the access record for `equipment`, preferring `https`.
pub fn resolve_access(
    store: &dyn AccessStore,
    equipment: &str,
) -> Result<EquipmentAccess, CoreError> {
    for scheme in Scheme::PREFERENCE {
        if let Some(access) = store.lookup(equipment, scheme) {
            debug!(equipment, %scheme, fqdn = %access.fqdn, "resolved equipment access");
            return Ok(access);
        }
    }
    Err(CoreError::InvalidEquipmentAccess {
        equipment: equipment.to_owned(),
    })
}

/// In-memory access store.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessStore {
    records: HashMap<(String, Scheme), EquipmentAccess>,
}

impl StaticAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record, replacing any previous one for the same
    /// equipment and scheme.
    pub fn insert(&mut self, access: EquipmentAccess) {
        self.records
            .insert((access.equipment.clone(), access.scheme), access);
    }

    #[must_use]
    pub fn with(mut self, access: EquipmentAccess) -> Self {
        self.insert(access);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AccessStore for StaticAccessStore {
    fn lookup(&self, equipment: &str, scheme: Scheme) -> Option<EquipmentAccess> {
        self.records.get(&(equipment.to_owned(), scheme)).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn access(scheme: Scheme, fqdn: &str) -> EquipmentAccess {
        EquipmentAccess {
            equipment: "odl-1".into(),
            scheme,
            fqdn: fqdn.into(),
            username: "admin".into(),
            password: SecretString::from("admin".to_owned()),
        }
    }

    #[test]
    fn https_wins_over_http() {
        let store = StaticAccessStore::new()
            .with(access(Scheme::Http, "http://odl:8181"))
            .with(access(Scheme::Https, "https://odl:8443"));
        let resolved = resolve_access(&store, "odl-1").unwrap();
        assert_eq!(resolved.scheme, Scheme::Https);
        assert_eq!(resolved.fqdn, "https://odl:8443");
    }

    #[test]
    fn http_is_the_fallback() {
        let store = StaticAccessStore::new().with(access(Scheme::Http, "http://odl:8181"));
        assert_eq!(resolve_access(&store, "odl-1").unwrap().scheme, Scheme::Http);
    }

    #[test]
    fn missing_record_is_invalid_access() {
        let store = StaticAccessStore::new().with(access(Scheme::Http, "http://odl:8181"));
        let err = resolve_access(&store, "odl-2").unwrap_err();
        assert!(matches!(err, CoreError::InvalidEquipmentAccess { equipment } if equipment == "odl-2"));
    }
}

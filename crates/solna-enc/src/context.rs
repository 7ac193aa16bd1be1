#![forbid(unsafe_code)]

//! Encryption context — key resolution and policy.

use solna_keys::{KeyResolver, KeysManager};

/// Context for XML-Enc operations.
///
/// A context may be shared across calls but carries no per-call state;
/// each encrypt/decrypt call builds its own working state.
pub struct EncContext {
    /// Key resolution callback.
    pub resolver: Box<dyn KeyResolver>,
    /// Method to use when the template has no `EncryptionMethod`.
    pub default_method: Option<String>,
    /// Suppress node splicing regardless of the `Type` attribute.
    pub ignore_type: bool,
    /// Additional ID attribute names beyond `Id`.
    pub id_attrs: Vec<String>,
}

impl EncContext {
    /// Create a context backed by a [`KeysManager`].
    pub fn new(keys_manager: KeysManager) -> Self {
        Self::with_resolver(Box::new(keys_manager))
    }

    /// Create a context with a custom key resolver.
    pub fn with_resolver(resolver: Box<dyn KeyResolver>) -> Self {
        Self {
            resolver,
            default_method: None,
            ignore_type: false,
            id_attrs: Vec::new(),
        }
    }

    /// Register an additional ID attribute name.
    pub fn add_id_attr(&mut self, name: &str) {
        self.id_attrs.push(name.to_owned());
    }
}

//! Service state management.
//!
//! Contains the PolicyRegistry, the build cache and shared service state.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::cache::{BuildCache, CacheConfig};
use crate::canonical::canonical_hash_hex;
use crate::policy::LayoutPolicy;

/// Environment variable holding the build cache size.
pub const BUILD_CACHE_SIZE_ENV: &str = "BUILD_CACHE_SIZE";

/// Reference to a registered policy by hash.
///
/// This enables hash-stable policy references across requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    /// Policy version identifier (e.g., "layout_policy_v1")
    pub policy_id: String,
    /// xxHash64 of the quantized policy parameters
    pub params_hash: String,
}

impl PolicyRef {
    /// Create a policy reference from a LayoutPolicy.
    pub fn from_policy(policy: &LayoutPolicy) -> Self {
        Self {
            policy_id: policy.policy_id().to_string(),
            params_hash: policy.params_hash(),
        }
    }

    /// Create a reference with explicit values.
    pub fn new(policy_id: impl Into<String>, params_hash: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            params_hash: params_hash.into(),
        }
    }
}

/// Registry of immutable layout policies with stable hashes.
///
/// Policies are registered once and referenced by PolicyRef.
/// The registry itself has a fingerprint that changes when policies change.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: BTreeMap<PolicyRef, LayoutPolicy>,
    registry_fingerprint: String,
}

impl PolicyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let mut registry = Self {
            policies: BTreeMap::new(),
            registry_fingerprint: String::new(),
        };
        registry.update_fingerprint();
        registry
    }

    /// Create a registry with the default policy pre-registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(LayoutPolicy::default());
        registry
    }

    /// Register a policy and return its reference.
    ///
    /// If the policy already exists (same hash), returns the existing reference.
    pub fn register(&mut self, policy: LayoutPolicy) -> PolicyRef {
        let policy_ref = PolicyRef::from_policy(&policy);
        if !self.policies.contains_key(&policy_ref) {
            self.policies.insert(policy_ref.clone(), policy);
            self.update_fingerprint();
        }
        policy_ref
    }

    /// Resolve a policy reference to the actual policy.
    pub fn resolve(&self, policy_ref: &PolicyRef) -> Option<&LayoutPolicy> {
        self.policies.get(policy_ref)
    }

    /// Get all registered policy references.
    pub fn list(&self) -> Vec<PolicyRef> {
        self.policies.keys().cloned().collect()
    }

    /// Get the registry fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.registry_fingerprint
    }

    /// Get the number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    fn update_fingerprint(&mut self) {
        let refs: Vec<_> = self.policies.keys().collect();
        self.registry_fingerprint = canonical_hash_hex(&refs);
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shared service state.
#[derive(Debug, Clone)]
pub struct ServiceState {
    /// Registry of available policies.
    pub policy_registry: Arc<RwLock<PolicyRegistry>>,
    /// Cache of build results.
    pub cache: Arc<BuildCache>,
}

impl ServiceState {
    /// Create state with the default registry and cache.
    pub fn new() -> Self {
        Self::with_registry(PolicyRegistry::with_defaults(), CacheConfig::default())
    }

    /// Create service state with a custom policy registry.
    pub fn with_registry(registry: PolicyRegistry, cache: CacheConfig) -> Self {
        Self {
            policy_registry: Arc::new(RwLock::new(registry)),
            cache: Arc::new(BuildCache::new(cache)),
        }
    }

    /// Create service state from environment variables.
    ///
    /// Reads `BUILD_CACHE_SIZE`; 0 disables the cache.
    pub fn from_env() -> Self {
        let cache = match std::env::var(BUILD_CACHE_SIZE_ENV).ok().map(|s| s.parse::<usize>()) {
            Some(Ok(0)) => CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            Some(Ok(max_entries)) => CacheConfig {
                max_entries,
                enabled: true,
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, var = BUILD_CACHE_SIZE_ENV, "invalid cache size, using default");
                CacheConfig::default()
            }
            None => CacheConfig::default(),
        };
        Self::with_registry(PolicyRegistry::with_defaults(), cache)
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

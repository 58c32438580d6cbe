use serde::{Deserialize, Serialize};

/// Name prefixes of the PKCS#11 and NSS constant namespaces.
pub const PKCS11_PREFIXES: &[&str] = &[
    "CKA_", "CKC_", "CKD_", "CKF_", "CKG_", "CKH_", "CKK_", "CKM_", "CKN_", "CKO_", "CKP_", "CKR_",
    "CKS_", "CKT_", "CKU_", "CKZ_", "NSSCK_", "SFTK_",
];

/// Set of symbol-name prefixes that make up the real constant namespace.
///
/// Definitions whose names start with none of these prefixes (header guards,
/// helper macros, typedef shims) are dropped by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixAllowlist {
    /// Accepted prefixes, matched with `str::starts_with`
    pub prefixes: Vec<String>,
}

impl Default for PrefixAllowlist {
    fn default() -> Self {
        Self::pkcs11()
    }
}

impl PrefixAllowlist {
    /// Allowlist for `pkcs11t.h` / `pkcs11n.h`
    pub fn pkcs11() -> Self {
        Self {
            prefixes: PKCS11_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Allowlist accepting nothing; extend it with [`with_prefix`](Self::with_prefix)
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Add a prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Check whether a name belongs to the allowed namespace
    pub fn allows(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Configuration for the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum substitution passes per record before the record is reported
    /// as cyclic (None = number of candidates + 1)
    pub max_passes: Option<usize>,

    /// Resolve records on the rayon thread pool
    pub parallel: bool,
}

impl ResolverConfig {
    /// Enable parallel resolution
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set an explicit pass limit
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Pass limit for a candidate set of the given size
    pub fn pass_limit(&self, candidates: usize) -> usize {
        self.max_passes.unwrap_or(candidates + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist_is_pkcs11() {
        let allowlist = PrefixAllowlist::default();
        assert!(allowlist.allows("CKA_CLASS"));
        assert!(allowlist.allows("NSSCK_VENDOR_NSS"));
        assert!(allowlist.allows("SFTK_MIN_FIPS_USER_SLOT_ID"));
        assert!(!allowlist.allows("FOO_BAR"));
        assert!(!allowlist.allows("CK_INVALID_HANDLE"));
        assert!(!allowlist.allows("_PKCS11T_H_"));
    }

    #[test]
    fn test_custom_allowlist() {
        let allowlist = PrefixAllowlist::empty().with_prefix("FOO_");
        assert!(allowlist.allows("FOO_BAR"));
        assert!(!allowlist.allows("CKA_CLASS"));
    }

    #[test]
    fn test_pass_limit_defaults_to_candidate_count() {
        let config = ResolverConfig::default();
        assert_eq!(config.pass_limit(10), 11);
        assert_eq!(config.with_max_passes(3).pass_limit(10), 3);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ResolverConfig::default().with_parallel(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: ResolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

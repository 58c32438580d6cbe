use constgen::{PrefixAllowlist, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output language of the generated file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    #[default]
    Java,
    Rust,
    Json,
}

impl TargetLanguage {
    /// Conventional file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            TargetLanguage::Java => "java",
            TargetLanguage::Rust => "rs",
            TargetLanguage::Json => "json",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetLanguage::Java => "java",
            TargetLanguage::Rust => "rust",
            TargetLanguage::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(TargetLanguage::Java),
            "rust" | "rs" => Ok(TargetLanguage::Rust),
            "json" => Ok(TargetLanguage::Json),
            other => Err(format!("unknown target language '{other}'")),
        }
    }
}

/// External programs used for verification and compile checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// C compiler for probe programs
    pub cc: String,
    /// Queried for the NSS compiler and linker flags
    pub pkg_config: String,
    pub javac: String,
    pub rustc: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cc: "cc".to_string(),
            pkg_config: "pkg-config".to_string(),
            javac: "javac".to_string(),
            rustc: "rustc".to_string(),
        }
    }
}

/// Configuration for a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Language of the generated file
    pub target: TargetLanguage,

    /// Write source location, resolution steps and probe output into the
    /// generated comments
    pub verbose: bool,

    /// Check every value against the installed NSS headers
    pub verify_system: bool,

    /// Compile the generated text before returning it
    pub compile_check: bool,

    /// Java package of the generated interface
    pub java_package: String,

    /// Name of the generated Java interface
    pub type_name: String,

    pub allowlist: PrefixAllowlist,
    pub resolver: ResolverConfig,
    pub toolchain: Toolchain,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target: TargetLanguage::Java,
            verbose: false,
            verify_system: false,
            compile_check: true,
            java_package: "org.mozilla.jss.pkcs11".to_string(),
            type_name: "PKCS11Constants".to_string(),
            allowlist: PrefixAllowlist::default(),
            resolver: ResolverConfig::default(),
            toolchain: Toolchain::default(),
        }
    }
}

impl GeneratorConfig {
    /// Configuration that only parses, resolves and emits
    pub fn offline() -> Self {
        Self {
            compile_check: false,
            verify_system: false,
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: TargetLanguage) -> Self {
        self.target = target;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_verify_system(mut self, verify: bool) -> Self {
        self.verify_system = verify;
        self
    }

    pub fn with_compile_check(mut self, check: bool) -> Self {
        self.compile_check = check;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }
}

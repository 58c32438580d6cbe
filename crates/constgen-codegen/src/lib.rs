//! # constgen-codegen
//!
//! Output side of constgen: turns resolved PKCS#11 constants into a Java
//! interface, a Rust module or a JSON document, optionally confirming every
//! value against the installed NSS headers and compiling the result before
//! handing it back.
//!
//! ```rust
//! use constgen_codegen::{Generator, GeneratorConfig, HeaderSource, TargetLanguage};
//!
//! let headers = [HeaderSource::new(
//!     "pkcs11t.h",
//!     "#define CKA_CLASS 0x00000000UL\n#define CKA_TOKEN 0x00000001UL\n",
//! )];
//! let config = GeneratorConfig::offline().with_target(TargetLanguage::Rust);
//! let output = Generator::new(config).generate(&headers).unwrap();
//!
//! assert!(output.text.contains("pub const CKA_TOKEN: u64 = 0x00000001;"));
//! ```

#![deny(unsafe_code)]

pub mod check;
pub mod config;
pub mod emitter;
pub mod error;
pub mod java;
pub mod json;
pub mod pipeline;
pub mod rust;
pub mod verify;

pub use check::{compile_check, SCRATCH_PREFIX};
pub use config::{GeneratorConfig, TargetLanguage, Toolchain};
pub use emitter::{emitter_for, require_resolved, ConstantEmitter, GenerationUnit, HeaderCopyright};
pub use error::{CodegenError, Result};
pub use java::JavaEmitter;
pub use json::JsonEmitter;
pub use pipeline::{GeneratedOutput, GenerationStats, Generator, HeaderSource, ResolvedConstants};
pub use rust::RustEmitter;
pub use verify::{probe_source, ProbeOutput, VerificationReport, Verifier};

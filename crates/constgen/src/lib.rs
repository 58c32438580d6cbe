//! # constgen
//!
//! Turns the `#define` constants of PKCS#11 C headers into fully resolved
//! numeric values, ready to be emitted into another language.
//!
//! ## Stages
//!
//! ```text
//! Header text
//!     ↓
//! Define parsing (name, raw value, source location, copyright block)
//!     ↓
//! Prefix filtering (allowlist, last definition wins)
//!     ↓
//! Resolution (symbol substitution to a fixed point)
//!     ↓
//! Evaluation (C integer expression → u64)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use constgen::{filter, parse_header, resolve_all, PrefixAllowlist};
//!
//! let header = parse_header(
//!     "pkcs11n.h",
//!     "#define CKO_VENDOR_DEFINED 0x80000000UL\n\
//!      #define NSSCK_VENDOR_NSS 0x4E534350\n\
//!      #define CKO_NSS (CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)\n",
//! )
//! .unwrap();
//!
//! let mut set = filter(header.records, &PrefixAllowlist::default());
//! resolve_all(set.records_mut()).unwrap();
//!
//! let value = set.get("CKO_NSS").and_then(|r| r.resolved_value()).unwrap();
//! assert_eq!(value.to_string(), "0xCE534350");
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod copyright;
pub mod define;
pub mod error;
pub mod eval;
pub mod filter;
pub mod record;
pub mod resolver;
pub mod tokenizer;

pub use config::{PrefixAllowlist, ResolverConfig, PKCS11_PREFIXES};
pub use copyright::{extract_copyright, CopyrightScanner, ScanState};
pub use define::{parse_define, parse_header, parse_header_file, ParsedHeader};
pub use error::{ConstantsError, EvalError, Result, SyntaxError};
pub use eval::{evaluate, strip_literal_suffixes};
pub use filter::{filter, FilterStats, PrefixFilter};
pub use record::{ConstantRecord, ConstantSet, HexLiteral, ParseHexLiteralError, ResolutionStep};
pub use resolver::{
    resolve_all, substitute_pass, ResolutionOrder, ResolutionStats, Resolver, Substitution,
};
pub use tokenizer::{next_token, tokenize};

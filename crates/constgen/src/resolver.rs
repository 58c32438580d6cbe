//! Symbol resolution
//!
//! Each record's value is rewritten by substituting every known symbol that
//! occurs in it, repeatedly, until a full pass changes nothing. The result is
//! then a purely numeric expression and is evaluated.
//!
//! Matching is by substring, not by token: references appear glued into
//! larger expressions. Because many names are prefixes of other names
//! (`CKT_NSS` and `CKT_NSS_UNTRUSTED`), candidates are tried in
//! reverse-lexicographic order so a longer name is always replaced before
//! any of its prefixes can corrupt it.
//!
//! A definition that refers to itself, directly or through others, never
//! reaches a fixed point. Every record therefore gets a bounded number of
//! passes and fails with [`ConstantsError::CyclicReference`] beyond it.

use crate::config::ResolverConfig;
use crate::error::{ConstantsError, Result};
use crate::eval::evaluate;
use crate::record::{ConstantRecord, ConstantSet, HexLiteral, ResolutionStep};
use log::{debug, info, trace};
use rayon::prelude::*;
use std::collections::HashMap;

/// Substitution candidates sorted in reverse-lexicographic name order.
///
/// This is only the order in which names are tried during substitution; it
/// never decides which record is evaluated first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOrder {
    names: Vec<String>,
}

impl ResolutionOrder {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
        names.sort_unstable_by(|a, b| b.cmp(a));
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A symbol and the text that replaces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub name: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(name: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replacement: replacement.into(),
        }
    }
}

/// Run one substitution pass over `value`.
///
/// Every candidate, in the given order, whose name occurs in the current
/// value has all its occurrences replaced; each replacement is appended to
/// `steps`. Returns whether anything changed.
pub fn substitute_pass(
    value: &mut String,
    candidates: &[Substitution],
    steps: &mut Vec<ResolutionStep>,
) -> bool {
    let mut changed = false;
    for candidate in candidates {
        if !value.contains(candidate.name.as_str()) {
            continue;
        }
        let replaced = value.replace(candidate.name.as_str(), &candidate.replacement);
        trace!(
            "in [{}] replaced [{}] with [{}]",
            value,
            candidate.name,
            candidate.replacement
        );
        steps.push(ResolutionStep {
            expression: std::mem::replace(value, replaced),
            symbol: candidate.name.clone(),
            replacement: candidate.replacement.clone(),
        });
        changed = true;
    }
    changed
}

/// Statistics about a resolution run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolutionStats {
    pub records_resolved: usize,
    pub substitutions: usize,
    pub max_passes: usize,
}

struct Resolution {
    value: HexLiteral,
    trace: Vec<ResolutionStep>,
    passes: usize,
}

/// Resolves every record of a set into a numeric value
pub struct Resolver {
    config: ResolverConfig,
    stats: ResolutionStats,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            stats: ResolutionStats::default(),
        }
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn resolve_set(&mut self, set: &mut ConstantSet) -> Result<()> {
        self.resolve_all(set.records_mut())
    }

    /// Resolve all records in place.
    ///
    /// Records that are already resolved are left untouched. When names
    /// repeat, the last record with a name is the one other definitions see.
    ///
    /// # Errors
    ///
    /// Stops at the first record (in slice order) that cannot be resolved.
    pub fn resolve_all(&mut self, records: &mut [ConstantRecord]) -> Result<()> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            index.insert(record.name.as_str(), i);
        }

        let order = ResolutionOrder::new(index.keys().copied());
        let mut table: Vec<Substitution> = order
            .names()
            .iter()
            .map(|name| Substitution::new(name.clone(), records[index[name.as_str()]].substitution_text()))
            .collect();
        let slots: HashMap<String, (usize, usize)> = order
            .names()
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.clone(), (slot, index[name.as_str()])))
            .collect();
        drop(index);

        let limit = self.config.pass_limit(table.len());
        debug!(
            "Resolving {} records against {} candidates (pass limit {})",
            records.len(),
            table.len(),
            limit
        );

        if self.config.parallel {
            let outcomes: Vec<Result<Option<Resolution>>> = records
                .par_iter()
                .map(|record| {
                    if record.is_resolved() {
                        Ok(None)
                    } else {
                        resolve_record(record, &table, limit).map(Some)
                    }
                })
                .collect();

            for (record, outcome) in records.iter_mut().zip(outcomes) {
                if let Some(resolution) = outcome? {
                    self.commit(record, resolution);
                }
            }
        } else {
            for i in 0..records.len() {
                if records[i].is_resolved() {
                    continue;
                }
                let resolution = resolve_record(&records[i], &table, limit)?;
                self.commit(&mut records[i], resolution);

                let (slot, owner) = slots[records[i].name.as_str()];
                if owner == i {
                    table[slot].replacement = records[i].substitution_text();
                }
            }
        }

        info!(
            "Resolved {} constants ({} substitutions, at most {} passes)",
            self.stats.records_resolved, self.stats.substitutions, self.stats.max_passes
        );
        Ok(())
    }

    fn commit(&mut self, record: &mut ConstantRecord, resolution: Resolution) {
        debug!("{} = {}", record.name, resolution.value);
        self.stats.records_resolved += 1;
        self.stats.substitutions += resolution.trace.len();
        self.stats.max_passes = self.stats.max_passes.max(resolution.passes);
        record.mark_resolved(resolution.value, resolution.trace);
    }
}

/// Resolve records in place with the default configuration.
pub fn resolve_all(records: &mut [ConstantRecord]) -> Result<()> {
    Resolver::default().resolve_all(records)
}

fn resolve_record(record: &ConstantRecord, table: &[Substitution], limit: usize) -> Result<Resolution> {
    let mut value = record.raw_value().to_string();
    let mut steps = Vec::new();
    let mut passes = 0;

    while substitute_pass(&mut value, table, &mut steps) {
        passes += 1;
        if passes > limit {
            return Err(ConstantsError::CyclicReference {
                name: record.name.clone(),
                chain: reference_chain(record, table),
                file: record.source_file.clone(),
                line_number: record.source_line,
            });
        }
    }

    let number = evaluate(&value).map_err(|err| {
        ConstantsError::from_eval(err, &record.name, &record.source_file, record.source_line)
    })?;

    Ok(Resolution {
        value: HexLiteral(number),
        trace: steps,
        passes,
    })
}

/// Follow first references from `record` until a name repeats.
fn reference_chain(record: &ConstantRecord, table: &[Substitution]) -> Vec<String> {
    let mut chain = vec![record.name.clone()];
    let mut text = record.raw_value().to_string();

    for _ in 0..=table.len() {
        let Some(next) = table.iter().find(|c| text.contains(c.name.as_str())) else {
            break;
        };
        let seen = chain.contains(&next.name);
        chain.push(next.name.clone());
        if seen {
            break;
        }
        text = next.replacement.clone();
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, value: &str) -> ConstantRecord {
        ConstantRecord::new(name, value).with_source("test.h", 1)
    }

    fn resolved(records: &[ConstantRecord], name: &str) -> String {
        records
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.resolved_value())
            .map(|v| v.to_string())
            .unwrap()
    }

    #[test]
    fn test_resolution_order_is_reverse_lexicographic() {
        let order = ResolutionOrder::new(["CKT_NSS", "CKT_NSS_UNTRUSTED", "CKA_CLASS", "CKT_NSS"]);
        assert_eq!(order.names(), ["CKT_NSS_UNTRUSTED", "CKT_NSS", "CKA_CLASS"]);
    }

    #[test]
    fn test_vendor_defined_or() {
        let mut records = vec![
            record("CKO_VENDOR_DEFINED", "0x80000000UL"),
            record("NSSCK_VENDOR_NSS", "0x4E534350"),
            record("CKO_NSS", "(CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)"),
        ];
        resolve_all(&mut records).unwrap();

        assert_eq!(resolved(&records, "CKO_VENDOR_DEFINED"), "0x80000000");
        assert_eq!(resolved(&records, "CKO_NSS"), "0xCE534350");

        // Both operands were already resolved, so the trace uses their values
        let trace = records[2].resolution_trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].symbol, "NSSCK_VENDOR_NSS");
        assert_eq!(trace[0].replacement, "(0x4E534350)");
        assert_eq!(trace[1].symbol, "CKO_VENDOR_DEFINED");
        assert_eq!(trace[1].expression, "(CKO_VENDOR_DEFINED | (0x4E534350))");
    }

    #[test]
    fn test_forward_reference_uses_raw_value() {
        let mut records = vec![record("CKA_B", "CKA_A"), record("CKA_A", "(1 << 4)")];
        resolve_all(&mut records).unwrap();

        assert_eq!(resolved(&records, "CKA_B"), "0x00000010");
        assert_eq!(records[0].resolution_trace()[0].replacement, "((1 << 4))");
    }

    #[test]
    fn test_longer_name_substituted_before_prefix() {
        let mut records = vec![
            record("CKT_NSS_UNTRUSTED", "CKT_NSS_MUST_VERIFY_TRUST"),
            record("CKT_NSS_MUST_VERIFY_TRUST", "(CKT_NSS + 3)"),
            record("CKT_NSS", "0xCE534350"),
        ];
        resolve_all(&mut records).unwrap();

        assert_eq!(resolved(&records, "CKT_NSS_UNTRUSTED"), "0xCE534353");
        let trace = records[0].resolution_trace();
        assert_eq!(trace[0].symbol, "CKT_NSS_MUST_VERIFY_TRUST");
        assert_eq!(trace[1].symbol, "CKT_NSS");
        for step in trace {
            assert!(!step.expression.contains(")_MUST"), "mangled: {}", step.expression);
        }
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let mut records = vec![record("CKA_X", "(CK_UNAVAILABLE | 1)")];
        let err = resolve_all(&mut records).unwrap_err();
        assert!(matches!(
            err,
            ConstantsError::UnresolvedSymbol { ref name, ref symbol, .. }
                if name == "CKA_X" && symbol == "CK_UNAVAILABLE"
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let mut records = vec![record("A", "B"), record("B", "A")];
        let err = resolve_all(&mut records).unwrap_err();
        match err {
            ConstantsError::CyclicReference { name, chain, .. } => {
                assert_eq!(name, "A");
                assert_eq!(chain, vec!["A", "B", "A"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_self_reference_detected() {
        let mut records = vec![record("CKA_X", "(CKA_X | 1)")];
        assert!(matches!(
            resolve_all(&mut records),
            Err(ConstantsError::CyclicReference { .. })
        ));
    }

    #[test]
    fn test_resolve_all_twice_is_noop() {
        let mut records = vec![record("CKA_A", "1"), record("CKA_B", "CKA_A | 2")];
        let mut resolver = Resolver::default();
        resolver.resolve_all(&mut records).unwrap();
        let first = records.clone();

        resolver.resolve_all(&mut records).unwrap();
        assert_eq!(records, first);
        assert_eq!(resolver.stats().records_resolved, 2);
    }

    #[test]
    fn test_duplicate_names_last_wins_for_references() {
        let mut records = vec![
            record("CKA_A", "1"),
            record("CKA_A", "2"),
            record("CKA_B", "CKA_A"),
        ];
        resolve_all(&mut records).unwrap();
        assert_eq!(resolved(&records, "CKA_B"), "0x00000002");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let build = || {
            vec![
                record("CKO_NSS", "(CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)"),
                record("CKO_VENDOR_DEFINED", "0x80000000UL"),
                record("NSSCK_VENDOR_NSS", "0x4E534350"),
                record("CKO_NSS_CRL", "(CKO_NSS + 1)"),
            ]
        };
        let mut sequential = build();
        let mut parallel = build();
        resolve_all(&mut sequential).unwrap();
        Resolver::new(ResolverConfig::default().with_parallel(true))
            .resolve_all(&mut parallel)
            .unwrap();

        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.resolved_value(), b.resolved_value());
        }
    }

    #[test]
    fn test_substitute_pass_reports_change() {
        let table = vec![Substitution::new("CKA_A", "(1)")];
        let mut value = "CKA_A | CKA_A".to_string();
        let mut steps = Vec::new();

        assert!(substitute_pass(&mut value, &table, &mut steps));
        assert_eq!(value, "(1) | (1)");
        assert_eq!(steps.len(), 1);
        assert!(!substitute_pass(&mut value, &table, &mut steps));
    }
}

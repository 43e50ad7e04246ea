use std::collections::BTreeMap;

use serde::Serialize;

use super::extract::SymbolObservation;

/// A function name paired with its extracted return type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuncSig {
    pub name: String,
    pub return_type: String,
}

/// Per-package aggregation record: deduplicated signatures, sorted by
/// function name once sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageBucket {
    pub path: String,
    pub short_name: String,
    pub signatures: Vec<FuncSig>,
}

/// Deduplicates and deterministically orders observations. The output is a
/// pure function of the observation set; insertion order never shows
/// through.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: BTreeMap<String, PackageBucket>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert keyed by function name within the package bucket;
    /// the first-seen return type wins on (implausible) conflicts.
    pub fn insert(&mut self, obs: SymbolObservation) {
        let bucket = self
            .buckets
            .entry(obs.package_path.clone())
            .or_insert_with(|| PackageBucket {
                path: obs.package_path.clone(),
                short_name: obs.package_name.clone(),
                signatures: Vec::new(),
            });

        if !bucket.signatures.iter().any(|s| s.name == obs.func_name) {
            bucket.signatures.push(FuncSig {
                name: obs.func_name,
                return_type: obs.return_type,
            });
        }
    }

    /// Seal the aggregation: signatures sorted ascending by name, buckets
    /// ascending by path (byte-wise in both cases).
    pub fn finish(self) -> Vec<PackageBucket> {
        self.buckets
            .into_values()
            .map(|mut bucket| {
                bucket.signatures.sort_by(|a, b| a.name.cmp(&b.name));
                bucket
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(path: &str, func: &str, ret: &str) -> SymbolObservation {
        SymbolObservation {
            package_path: path.to_string(),
            package_name: path.rsplit('/').next().unwrap().to_string(),
            func_name: func.to_string(),
            return_type: ret.to_string(),
        }
    }

    fn aggregate(observations: Vec<SymbolObservation>) -> Vec<PackageBucket> {
        let mut aggregator = Aggregator::new();
        for o in observations {
            aggregator.insert(o);
        }
        aggregator.finish()
    }

    #[test]
    fn signatures_sort_by_function_name() {
        let buckets = aggregate(vec![
            obs("svc/a", "ListTables", "ListTablesOutput"),
            obs("svc/a", "BatchGetItem", "BatchGetItemOutput"),
        ]);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].path, "svc/a");
        assert_eq!(buckets[0].signatures[0].name, "BatchGetItem");
        assert_eq!(buckets[0].signatures[1].name, "ListTables");
    }

    #[test]
    fn duplicate_observations_merge() {
        let buckets = aggregate(vec![
            obs("svc/a", "ListTables", "ListTablesOutput"),
            obs("svc/a", "ListTables", "ListTablesOutput"),
        ]);

        assert_eq!(buckets[0].signatures.len(), 1);
    }

    #[test]
    fn first_seen_return_type_wins() {
        let buckets = aggregate(vec![
            obs("svc/a", "ListTables", "ListTablesOutput"),
            obs("svc/a", "ListTables", "SomethingElse"),
        ]);

        assert_eq!(buckets[0].signatures.len(), 1);
        assert_eq!(buckets[0].signatures[0].return_type, "ListTablesOutput");
    }

    #[test]
    fn buckets_sort_by_path() {
        let buckets = aggregate(vec![
            obs("svc/b", "Op", "OpOutput"),
            obs("svc/a", "Op", "OpOutput"),
        ]);

        let paths: Vec<&str> = buckets.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, vec!["svc/a", "svc/b"]);
    }

    #[test]
    fn output_is_permutation_invariant() {
        let observations = vec![
            obs("svc/b", "Beta", "BetaOutput"),
            obs("svc/a", "ListTables", "ListTablesOutput"),
            obs("svc/a", "BatchGetItem", "BatchGetItemOutput"),
            obs("svc/c", "Gamma", "GammaOutput"),
            obs("svc/a", "ListTables", "ListTablesOutput"),
        ];

        let forward = aggregate(observations.clone());
        let mut reversed = observations;
        reversed.reverse();
        let backward = aggregate(reversed);

        assert_eq!(forward, backward);
    }

    #[test]
    fn sort_invariants_hold_over_adjacent_pairs() {
        let buckets = aggregate(vec![
            obs("svc/c", "Z", "ZOut"),
            obs("svc/a", "M", "MOut"),
            obs("svc/a", "A", "AOut"),
            obs("svc/b", "Q", "QOut"),
            obs("svc/a", "Z", "ZOut"),
        ]);

        for pair in buckets.windows(2) {
            assert!(pair[0].path <= pair[1].path);
        }
        for bucket in &buckets {
            for pair in bucket.signatures.windows(2) {
                assert!(pair[0].name <= pair[1].name);
            }
        }
    }
}

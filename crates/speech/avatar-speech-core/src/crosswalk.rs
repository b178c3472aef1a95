//! Provider viseme id → canonical viseme translation tables.
//!
//! A provider id may list several plausible canonical visemes. The first one
//! listed is used; the rest are kept as `discarded` so callers can see what
//! the single-valued mapping throws away.

use std::collections::BTreeMap;

use log::warn;

use crate::viseme::Viseme;
use crate::viseme::Viseme::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrosswalkEntry {
    pub provider_id: u32,
    pub canonical: Viseme,
    pub discarded: Vec<Viseme>,
}

/// Azure-style viseme ids (0..=21) mapped to canonical candidates.
pub const AZURE_TABLE: &[(u32, &[Viseme])] = &[
    (0, &[Sil]),
    (1, &[A, Schwa, OpenE]),
    (2, &[A]),
    (3, &[OpenO]),
    (4, &[E, OpenE, U]),
    (5, &[OpenE]),
    (6, &[I]),
    (7, &[U]),
    (8, &[O]),
    (9, &[A]),
    (10, &[OpenO]),
    (11, &[A]),
    (12, &[K]),
    (13, &[R]),
    (14, &[T]),
    (15, &[S]),
    (16, &[Sh]),
    (17, &[Th]),
    (18, &[F]),
    (19, &[T]),
    (20, &[K]),
    (21, &[P]),
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisemeCrosswalk {
    entries: BTreeMap<u32, CrosswalkEntry>,
}

impl VisemeCrosswalk {
    /// Build from `(provider id, candidates)` rows. Rows with no candidates are
    /// skipped; a repeated id keeps its first row.
    pub fn from_table(table: &[(u32, &[Viseme])]) -> Self {
        let mut entries = BTreeMap::new();
        for (id, candidates) in table {
            let Some((first, rest)) = candidates.split_first() else {
                warn!("crosswalk row {id} has no candidates; skipped");
                continue;
            };
            if entries.contains_key(id) {
                warn!("crosswalk row {id} repeated; keeping the first");
                continue;
            }
            entries.insert(
                *id,
                CrosswalkEntry {
                    provider_id: *id,
                    canonical: *first,
                    discarded: rest.to_vec(),
                },
            );
        }
        Self { entries }
    }

    pub fn azure() -> Self {
        Self::from_table(AZURE_TABLE)
    }

    pub fn translate(&self, provider_id: u32) -> Option<Viseme> {
        self.entries.get(&provider_id).map(|e| e.canonical)
    }

    /// Candidates the translation dropped for this id.
    pub fn alternates(&self, provider_id: u32) -> &[Viseme] {
        self.entries
            .get(&provider_id)
            .map(|e| e.discarded.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry(&self, provider_id: u32) -> Option<&CrosswalkEntry> {
        self.entries.get(&provider_id)
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_first_candidate_wins() {
        let cw = VisemeCrosswalk::azure();
        assert_eq!(cw.len(), 22);
        assert_eq!(cw.translate(1), Some(A));
        assert_eq!(cw.alternates(1), &[Schwa, OpenE]);
        assert_eq!(cw.translate(4), Some(E));
        assert_eq!(cw.translate(19), Some(T));
        assert_eq!(cw.translate(21), Some(P));
        assert_eq!(cw.translate(0), Some(Sil));
        assert_eq!(cw.translate(22), None);
        assert!(cw.alternates(22).is_empty());
    }

    /// it should translate every table id to exactly one viseme, the same one every time
    #[test]
    fn translation_is_deterministic() {
        let a = VisemeCrosswalk::azure();
        let b = VisemeCrosswalk::azure();
        for id in a.provider_ids() {
            assert_eq!(a.translate(id), b.translate(id));
            assert!(a.translate(id).is_some());
        }
    }

    #[test]
    fn bad_rows_are_skipped() {
        let cw = VisemeCrosswalk::from_table(&[(1, &[]), (2, &[K]), (2, &[P])]);
        assert_eq!(cw.len(), 1);
        assert_eq!(cw.translate(2), Some(K));
    }
}

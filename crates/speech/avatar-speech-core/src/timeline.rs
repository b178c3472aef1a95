//! Normalized speechmark timelines.
//!
//! Building a timeline:
//! - malformed marks (non-finite or negative time, unknown viseme) are dropped and logged;
//! - marks are grouped by type and sorted by time (stable, so delivery order breaks ties);
//! - same-type marks at an identical time collapse to the last one delivered;
//! - each mark lasts until the next mark of its type;
//! - the last mark of each type lasts `max(min_end, overall_end - time)`, where
//!   `overall_end` is the latest mark time over all types.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::crosswalk::VisemeCrosswalk;
use crate::error::TimelineInconsistency;
use crate::speechmark::{MarkPayload, MarkType, RawMark, RawPayload, RawViseme, Speechmark};
use crate::viseme::Viseme;

pub const DEFAULT_MIN_END_MARK_DURATION_MS: f64 = 50.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Lower bound for the duration of the last mark of each type.
    pub min_end_mark_duration_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_end_mark_duration_ms: DEFAULT_MIN_END_MARK_DURATION_MS,
        }
    }
}

/// Per-type, time-ordered marks for one utterance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    groups: [Vec<Speechmark>; 4],
    /// Every mark ordered by time, then by type.
    ordered: Vec<Speechmark>,
    end_ms: f64,
}

impl Timeline {
    pub fn marks(&self, mark_type: MarkType) -> &[Speechmark] {
        &self.groups[mark_type.index()]
    }

    pub fn visemes(&self) -> &[Speechmark] {
        self.marks(MarkType::Viseme)
    }

    /// All marks in start-time order.
    pub fn ordered(&self) -> &[Speechmark] {
        &self.ordered
    }

    /// End of the latest-ending mark.
    pub fn end_ms(&self) -> f64 {
        self.end_ms
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// The mark of `mark_type` with `time <= t < time + duration`.
    pub fn active(&self, mark_type: MarkType, t_ms: f64) -> Option<&Speechmark> {
        let marks = self.marks(mark_type);
        let idx = marks.partition_point(|m| m.time_ms <= t_ms);
        idx.checked_sub(1)
            .map(|i| &marks[i])
            .filter(|m| m.contains(t_ms))
    }
}

#[derive(Clone, Debug)]
pub struct TimelineBuilder {
    crosswalk: VisemeCrosswalk,
    min_end_mark_duration_ms: f64,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new(VisemeCrosswalk::azure(), SchedulerConfig::default())
    }
}

impl TimelineBuilder {
    pub fn new(crosswalk: VisemeCrosswalk, config: SchedulerConfig) -> Self {
        Self {
            crosswalk,
            min_end_mark_duration_ms: config.min_end_mark_duration_ms.max(f64::EPSILON),
        }
    }

    pub fn crosswalk(&self) -> &VisemeCrosswalk {
        &self.crosswalk
    }

    pub fn min_end_mark_duration_ms(&self) -> f64 {
        self.min_end_mark_duration_ms
    }

    /// Build a timeline, returning it together with every recovered inconsistency.
    pub fn build(
        &self,
        raw: impl IntoIterator<Item = RawMark>,
    ) -> (Timeline, Vec<TimelineInconsistency>) {
        let mut issues = Vec::new();
        let mut groups: [Vec<Speechmark>; 4] = Default::default();

        for mark in raw {
            match self.normalize(mark) {
                Ok(m) => groups[m.mark_type().index()].push(m),
                Err(issue) => {
                    warn!("dropping speechmark: {issue}");
                    issues.push(issue);
                }
            }
        }

        for (group, mark_type) in groups.iter_mut().zip(MarkType::ALL) {
            group.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
            collapse_same_time(group, mark_type, &mut issues);
        }

        let overall_end = groups
            .iter()
            .filter_map(|g| g.last().map(|m| m.time_ms))
            .fold(0.0_f64, f64::max);

        for group in groups.iter_mut() {
            let n = group.len();
            for i in 0..n {
                group[i].duration_ms = if i + 1 < n {
                    group[i + 1].time_ms - group[i].time_ms
                } else {
                    (overall_end - group[i].time_ms).max(self.min_end_mark_duration_ms)
                };
            }
        }

        let mut ordered: Vec<Speechmark> = groups.iter().flatten().cloned().collect();
        ordered.sort_by(|a, b| {
            a.time_ms
                .total_cmp(&b.time_ms)
                .then(a.mark_type().cmp(&b.mark_type()))
        });
        let end_ms = ordered.iter().map(Speechmark::end_ms).fold(0.0, f64::max);

        (
            Timeline {
                groups,
                ordered,
                end_ms,
            },
            issues,
        )
    }

    fn normalize(&self, mark: RawMark) -> Result<Speechmark, TimelineInconsistency> {
        let time_ms = mark.time_ms;
        if !time_ms.is_finite() || time_ms < 0.0 {
            return Err(TimelineInconsistency::InvalidTime {
                mark_type: mark.mark_type(),
                time_ms,
            });
        }
        let payload = match mark.payload {
            RawPayload::Sentence(s) => MarkPayload::Sentence(s),
            RawPayload::Word(s) => MarkPayload::Word(s),
            RawPayload::Ssml(s) => MarkPayload::Ssml(s),
            RawPayload::Viseme(RawViseme::Id(id)) => MarkPayload::Viseme(
                self.crosswalk
                    .translate(id)
                    .ok_or(TimelineInconsistency::UnknownVisemeId { id, time_ms })?,
            ),
            RawPayload::Viseme(RawViseme::Code(code)) => match Viseme::from_code(&code) {
                Some(v) => MarkPayload::Viseme(v),
                None => return Err(TimelineInconsistency::UnknownVisemeCode { code, time_ms }),
            },
        };
        Ok(Speechmark {
            time_ms,
            duration_ms: 0.0,
            payload,
        })
    }
}

/// Keep only the last-delivered mark of each run of identical times.
/// Relies on the stable sort preserving delivery order within a run.
fn collapse_same_time(
    group: &mut Vec<Speechmark>,
    mark_type: MarkType,
    issues: &mut Vec<TimelineInconsistency>,
) {
    let mut out: Vec<Speechmark> = Vec::with_capacity(group.len());
    for mark in group.drain(..) {
        match out.last_mut() {
            Some(prev) if prev.time_ms == mark.time_ms => {
                issues.push(TimelineInconsistency::Collapsed {
                    mark_type,
                    time_ms: mark.time_ms,
                });
                *prev = mark;
            }
            _ => out.push(mark),
        }
    }
    *group = out;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TimelineBuilder {
        TimelineBuilder::default()
    }

    /// it should produce [i, t, a] with durations [120, 180, 50]
    #[test]
    fn azure_visemes_scenario() {
        let raw = vec![
            RawMark::viseme_id(0.0, 6),
            RawMark::viseme_id(120.0, 19),
            RawMark::viseme_id(300.0, 1),
        ];
        let (tl, issues) = builder().build(raw);
        assert!(issues.is_empty());
        let visemes: Vec<_> = tl.visemes().iter().map(|m| m.viseme().unwrap()).collect();
        assert_eq!(visemes, vec![Viseme::I, Viseme::T, Viseme::A]);
        let durations: Vec<_> = tl.visemes().iter().map(|m| m.duration_ms).collect();
        assert_eq!(durations, vec![120.0, 180.0, 50.0]);
        assert_eq!(tl.end_ms(), 350.0);
    }

    #[test]
    fn last_mark_extends_to_overall_end() {
        let raw = vec![
            RawMark::word(0.0, "hello"),
            RawMark::viseme_code(0.0, "k"),
            RawMark::viseme_code(400.0, "sil"),
        ];
        let (tl, _) = builder().build(raw);
        assert_eq!(tl.marks(MarkType::Word)[0].duration_ms, 400.0);
        assert_eq!(tl.visemes()[1].duration_ms, 50.0);
    }

    #[test]
    fn malformed_marks_are_dropped() {
        let raw = vec![
            RawMark::viseme_id(-1.0, 6),
            RawMark::viseme_id(f64::NAN, 6),
            RawMark::viseme_id(10.0, 99),
            RawMark::viseme_code(20.0, "x"),
            RawMark::viseme_id(30.0, 6),
        ];
        let (tl, issues) = builder().build(raw);
        assert_eq!(tl.len(), 1);
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn same_time_marks_keep_last_delivered() {
        let raw = vec![
            RawMark::viseme_id(100.0, 21),
            RawMark::viseme_id(0.0, 0),
            RawMark::viseme_id(100.0, 18),
        ];
        let (tl, issues) = builder().build(raw);
        let visemes: Vec<_> = tl.visemes().iter().map(|m| m.viseme().unwrap()).collect();
        assert_eq!(visemes, vec![Viseme::Sil, Viseme::F]);
        assert!(matches!(issues[..], [TimelineInconsistency::Collapsed { .. }]));
    }

    #[test]
    fn active_lookup_bounds() {
        let raw = vec![RawMark::viseme_id(100.0, 6), RawMark::viseme_id(220.0, 19)];
        let (tl, _) = builder().build(raw);
        assert!(tl.active(MarkType::Viseme, 50.0).is_none());
        assert_eq!(tl.active(MarkType::Viseme, 100.0).unwrap().viseme(), Some(Viseme::I));
        assert_eq!(tl.active(MarkType::Viseme, 219.9).unwrap().viseme(), Some(Viseme::I));
        assert_eq!(tl.active(MarkType::Viseme, 220.0).unwrap().viseme(), Some(Viseme::T));
        assert!(tl.active(MarkType::Viseme, 270.0).is_none());
    }
}

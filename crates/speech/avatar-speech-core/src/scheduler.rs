//! Per-utterance speechmark playback against an external clock.

use log::debug;

use crate::error::TimelineInconsistency;
use crate::speechmark::{MarkType, RawMark, Speechmark};
use crate::timeline::{Timeline, TimelineBuilder};

/// Marks active at one instant, one slot per type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActiveMarks<'a> {
    pub sentence: Option<&'a Speechmark>,
    pub word: Option<&'a Speechmark>,
    pub viseme: Option<&'a Speechmark>,
    pub ssml: Option<&'a Speechmark>,
}

impl<'a> ActiveMarks<'a> {
    pub fn get(&self, mark_type: MarkType) -> Option<&'a Speechmark> {
        match mark_type {
            MarkType::Sentence => self.sentence,
            MarkType::Word => self.word,
            MarkType::Viseme => self.viseme,
            MarkType::Ssml => self.ssml,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sentence.is_none() && self.word.is_none() && self.viseme.is_none() && self.ssml.is_none()
    }
}

#[derive(Debug, Default)]
pub struct SpeechmarkScheduler {
    builder: TimelineBuilder,
    timeline: Option<Timeline>,
    /// Index into `Timeline::ordered` of the next mark to fire.
    cursor: usize,
    last_elapsed_ms: f64,
    issues: Vec<TimelineInconsistency>,
}

impl SpeechmarkScheduler {
    pub fn new(builder: TimelineBuilder) -> Self {
        Self {
            builder,
            ..Self::default()
        }
    }

    pub fn builder(&self) -> &TimelineBuilder {
        &self.builder
    }

    /// Build a timeline from raw provider marks and make it current.
    pub fn ingest(&mut self, raw: impl IntoIterator<Item = RawMark>) -> &Timeline {
        let (timeline, issues) = self.builder.build(raw);
        self.issues = issues;
        self.load(timeline)
    }

    /// Make an already built timeline current, replacing any previous one.
    pub fn load(&mut self, timeline: Timeline) -> &Timeline {
        debug!(
            "scheduler loaded {} marks ending at {}ms",
            timeline.len(),
            timeline.end_ms()
        );
        self.cursor = 0;
        self.last_elapsed_ms = 0.0;
        self.timeline.insert(timeline)
    }

    pub fn cancel(&mut self) {
        if self.timeline.take().is_some() {
            debug!("scheduler cancelled");
        }
        self.cursor = 0;
        self.last_elapsed_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.timeline.is_some()
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Inconsistencies recovered while building the last ingested timeline.
    pub fn issues(&self) -> &[TimelineInconsistency] {
        &self.issues
    }

    /// Marks covering `elapsed_ms`; empty when nothing is loaded.
    pub fn query(&self, elapsed_ms: f64) -> ActiveMarks<'_> {
        let Some(tl) = &self.timeline else {
            return ActiveMarks::default();
        };
        ActiveMarks {
            sentence: tl.active(MarkType::Sentence, elapsed_ms),
            word: tl.active(MarkType::Word, elapsed_ms),
            viseme: tl.active(MarkType::Viseme, elapsed_ms),
            ssml: tl.active(MarkType::Ssml, elapsed_ms),
        }
    }

    /// Marks whose start was crossed since the previous call, in time order.
    /// Seeking backwards repositions the cursor without re-firing.
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<Speechmark> {
        let Some(tl) = &self.timeline else {
            return Vec::new();
        };
        let ordered = tl.ordered();
        if elapsed_ms < self.last_elapsed_ms {
            self.cursor = ordered.partition_point(|m| m.time_ms <= elapsed_ms);
            self.last_elapsed_ms = elapsed_ms;
            return Vec::new();
        }
        self.last_elapsed_ms = elapsed_ms;
        let end = self.cursor + ordered[self.cursor..].partition_point(|m| m.time_ms <= elapsed_ms);
        let fired = ordered[self.cursor..end].to_vec();
        self.cursor = end;
        fired
    }

    /// True once `elapsed_ms` is past the end of every mark.
    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        self.timeline
            .as_ref()
            .map_or(true, |tl| elapsed_ms >= tl.end_ms())
    }
}

use avatar_speech_core::{MarkType, RawMark, TimelineBuilder, Viseme};
use proptest::prelude::*;

fn raw_mark() -> impl Strategy<Value = RawMark> {
    let time = 0u32..5_000;
    prop_oneof![
        (time.clone(), 0u32..22).prop_map(|(t, id)| RawMark::viseme_id(t as f64, id)),
        (time.clone(), prop::sample::select(Viseme::ALL.to_vec()))
            .prop_map(|(t, v)| RawMark::viseme_code(t as f64, v.code())),
        time.clone().prop_map(|t| RawMark::word(t as f64, "w")),
        time.clone().prop_map(|t| RawMark::sentence(t as f64, "s")),
        time.prop_map(|t| RawMark::ssml(t as f64, "m")),
    ]
}

proptest! {
    /// it should give every mark a positive duration and keep each type sorted
    #[test]
    fn durations_positive_and_sorted(raw in prop::collection::vec(raw_mark(), 0..64)) {
        let builder = TimelineBuilder::default();
        let (tl, _) = builder.build(raw);
        for mark_type in MarkType::ALL {
            let marks = tl.marks(mark_type);
            for m in marks {
                prop_assert!(m.duration_ms > 0.0);
            }
            for pair in marks.windows(2) {
                prop_assert!(pair[0].time_ms < pair[1].time_ms);
                prop_assert_eq!(pair[0].end_ms(), pair[1].time_ms);
            }
        }
    }

    /// it should stretch the last mark of each type to the overall end, never below the minimum
    #[test]
    fn last_mark_reaches_overall_end(raw in prop::collection::vec(raw_mark(), 1..64)) {
        let builder = TimelineBuilder::default();
        let (tl, _) = builder.build(raw);
        let overall_end = MarkType::ALL
            .iter()
            .filter_map(|t| tl.marks(*t).last().map(|m| m.time_ms))
            .fold(0.0_f64, f64::max);
        for mark_type in MarkType::ALL {
            if let Some(last) = tl.marks(mark_type).last() {
                let expected = (overall_end - last.time_ms).max(builder.min_end_mark_duration_ms());
                prop_assert_eq!(last.duration_ms, expected);
            }
        }
    }

    /// it should report the same active viseme as a linear scan
    #[test]
    fn active_matches_linear_scan(
        raw in prop::collection::vec(raw_mark(), 0..48),
        t in 0.0f64..6_000.0,
    ) {
        let (tl, _) = TimelineBuilder::default().build(raw);
        let scanned = tl.visemes().iter().find(|m| m.contains(t));
        prop_assert_eq!(tl.active(MarkType::Viseme, t), scanned);
    }
}

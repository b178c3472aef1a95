use std::sync::Arc;

use avatar_animation_core::{
    parse_clip_json, AnimationConfig, AnimationEvent, Blend2dOption, BlendMode, LayerConfig,
    LayerManager, LayerStatus, PlayOptions, QueueEntry, Value,
};
use avatar_test_fixtures::clips;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn fixture_clip(name: &str) -> Arc<avatar_animation_core::AnimationClip> {
    let json = clips::json(name).expect("fixture clip");
    Arc::new(parse_clip_json(&json).expect("valid clip"))
}

/// it should play wave segment a fully, then b, with no gap between them
#[test]
fn gesture_queue_plays_segments_in_order() {
    let wave = fixture_clip("wave").as_ref().clone().into_additive();
    let a = Arc::new(wave.subclip("wave_a", 0.0, 30.0, 30.0).unwrap());
    let b = Arc::new(wave.subclip("wave_b", 30.0, 60.0, 30.0).unwrap());

    let mut mgr = LayerManager::default();
    mgr.add_layer(
        "Gesture",
        LayerConfig {
            blend_mode: BlendMode::Additive,
            transition_time: 0.0,
            weight: 1.0,
        },
    )
    .unwrap();
    mgr.add_animation(
        "Gesture",
        "wave",
        AnimationConfig::Queue {
            subclips: vec![QueueEntry::new(a), QueueEntry::new(b)],
            transition_between: 0.1,
        },
    )
    .unwrap();
    mgr.play_animation("Gesture", "wave", PlayOptions::default())
        .unwrap();

    let dt = 1.0 / 30.0;
    let mut last = 0.0;
    let mut advanced_at = None;
    let mut completed_at = None;
    for frame in 1..=70 {
        let pose = mgr.update(dt);
        let v = pose
            .get("gesture.wave")
            .and_then(Value::as_float)
            .expect("queue contributes every frame");
        assert!(v + 1e-3 >= last, "frame {frame}: {v} < {last}");
        last = v;
        for event in mgr.drain_events() {
            match event {
                AnimationEvent::QueueAdvanced { index, clip, .. } => {
                    assert_eq!((index, clip.as_str()), (1, "wave_b"));
                    advanced_at = Some(frame as f32 * dt);
                }
                AnimationEvent::Completed { .. } => completed_at = Some(frame as f32 * dt),
                _ => {}
            }
        }
    }
    let advanced_at = advanced_at.expect("queue advanced");
    assert!((advanced_at - 1.0).abs() <= dt + 1e-4, "{advanced_at}");
    let completed_at = completed_at.expect("queue completed");
    assert!((completed_at - 2.0).abs() <= dt + 1e-4, "{completed_at}");
    assert!(approx(last, 2.0));
    assert_eq!(mgr.layer_status("Gesture").unwrap(), LayerStatus::Completed);
}

#[test]
fn blend2d_follows_parameter() {
    let mut mgr = LayerManager::default();
    mgr.add_layer(
        "Head",
        LayerConfig {
            blend_mode: BlendMode::Additive,
            transition_time: 0.0,
            weight: 1.0,
        },
    )
    .unwrap();
    let pose_clip = |name: &str| {
        let clip = fixture_clip(name).as_ref().clone().into_additive();
        Arc::new(clip.subclip(name, 1.0, 2.0, 30.0).unwrap())
    };
    mgr.add_animation(
        "Head",
        "look",
        AnimationConfig::Blend2d {
            options: vec![
                Blend2dOption::new("center", pose_clip("look_center"), [0.0, 0.0]),
                Blend2dOption::new("left", pose_clip("look_left"), [-60.0, 0.0]),
                Blend2dOption::new("right", pose_clip("look_right"), [60.0, 0.0]),
                Blend2dOption::new("up", pose_clip("look_up"), [0.0, 30.0]),
                Blend2dOption::new("down", pose_clip("look_down"), [0.0, -30.0]),
            ],
            parameter: [0.0, 0.0],
        },
    )
    .unwrap();
    mgr.play_animation("Head", "look", PlayOptions::default())
        .unwrap();

    let yaw = |mgr: &LayerManager| {
        mgr.pose()
            .get("head.lookYaw")
            .and_then(Value::as_float)
            .unwrap_or(0.0)
    };
    mgr.update(0.016);
    assert!(approx(yaw(&mgr), 0.0));

    mgr.set_blend_parameter("Head", "look", [60.0, 0.0]).unwrap();
    mgr.update(0.016);
    assert!(approx(yaw(&mgr), 0.5));
    assert!(approx(mgr.blend_weight("Head", "look", "right").unwrap(), 1.0));

    mgr.set_blend_parameter("Head", "look", [30.0, 0.0]).unwrap();
    mgr.update(0.016);
    assert!(approx(yaw(&mgr), 0.25));
}

#[test]
fn random_blink_picks_after_interval() {
    let mut mgr = LayerManager::default();
    mgr.add_layer(
        "Blink",
        LayerConfig {
            blend_mode: BlendMode::Additive,
            transition_time: 0.075,
            weight: 1.0,
        },
    )
    .unwrap();
    let blink = Arc::new(fixture_clip("blink").as_ref().clone().into_additive());
    mgr.add_animation(
        "Blink",
        "blink",
        AnimationConfig::Random {
            options: vec![blink],
            play_interval: 3.0,
            seed: Some(3),
        },
    )
    .unwrap();
    mgr.play_animation("Blink", "blink", PlayOptions::default())
        .unwrap();

    let mut picks = 0;
    for _ in 0..(10 * 60) {
        mgr.update(1.0 / 60.0);
        picks += mgr
            .drain_events()
            .iter()
            .filter(|e| matches!(e, AnimationEvent::RandomPicked { .. }))
            .count();
    }
    // 3s wait + 0.25s blink per cycle over 10s
    assert_eq!(picks, 3);
    assert_eq!(mgr.layer_status("Blink").unwrap(), LayerStatus::Playing);
}

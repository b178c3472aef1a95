//! Benchmarks for the per-frame layer update

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use avatar_animation_core::{
    data::{AnimationClip, Keypoint, Track, Transitions},
    AnimationConfig, BlendMode, BlendOption, LayerConfig, LayerManager, PlayOptions, Value,
};

fn clip(name: &str, targets: usize) -> Arc<AnimationClip> {
    let tracks = (0..targets)
        .map(|i| Track {
            id: format!("{name}-{i}"),
            name: format!("t{i}"),
            target: format!("joint{i}.rotation"),
            points: (0..4)
                .map(|k| Keypoint {
                    id: format!("{name}-{i}-{k}"),
                    stamp: k as f32 / 3.0,
                    value: Value::Quat([0.0, (k as f32 * 0.1).sin(), 0.0, 1.0]),
                    transitions: Some(Transitions::default()),
                })
                .collect(),
        })
        .collect();
    Arc::new(AnimationClip {
        name: name.into(),
        tracks,
        duration_ms: 2000,
    })
}

fn rig() -> LayerManager {
    let mut mgr = LayerManager::default();
    mgr.add_layer("Base", LayerConfig::default()).unwrap();
    mgr.add_animation("Base", "idle", AnimationConfig::single(clip("idle", 60)))
        .unwrap();
    mgr.play_animation("Base", "idle", PlayOptions::default())
        .unwrap();

    let additive = LayerConfig {
        blend_mode: BlendMode::Additive,
        transition_time: 0.12,
        weight: 1.0,
    };
    mgr.add_layer("Viseme", additive).unwrap();
    let options = (0..17)
        .map(|i| BlendOption::new(format!("v{i}"), clip(&format!("v{i}"), 8), 0.0))
        .collect();
    mgr.add_animation("Viseme", "visemes", AnimationConfig::FreeBlend { options })
        .unwrap();
    mgr.play_animation("Viseme", "visemes", PlayOptions::default())
        .unwrap();
    mgr
}

fn bench_layer_update(c: &mut Criterion) {
    let mut mgr = rig();
    let mut frame = 0usize;

    c.bench_function("layer_update_60_joints_17_visemes", |b| {
        b.iter(|| {
            frame += 1;
            let option = format!("v{}", frame % 17);
            mgr.set_blend_weight(
                "Viseme",
                "visemes",
                &option,
                1.0,
                Some(0.12),
                Default::default(),
            )
            .unwrap();
            black_box(mgr.update(black_box(1.0 / 60.0)).len())
        })
    });
}

criterion_group!(benches, bench_layer_update);
criterion_main!(benches);

use avatar_animation_core::{AnimationKind, BlendMode, Config, LayerManager};
use avatar_host::{
    layer_names, ClipLibrary, HostConfig, HostController, HostError, RigSection, StandardRig,
};
use avatar_test_fixtures::{clips, configs};

fn library_without(skip: &[&str]) -> ClipLibrary {
    let mut library = ClipLibrary::new();
    for key in clips::keys() {
        if skip.contains(&key.as_str()) {
            continue;
        }
        library.insert_json(&clips::json(&key).unwrap()).unwrap();
    }
    library
}

fn full_rig() -> StandardRig {
    StandardRig {
        gesture_clips: vec!["wave".into()],
        gestures: configs::load("gesture").unwrap(),
        emote_clips: vec!["happy".into()],
        poi_layers: configs::load("poi").unwrap(),
        ..StandardRig::default()
    }
}

#[test]
fn installs_every_configured_section() {
    let mut manager = LayerManager::new(Config::default());
    let report = full_rig().install(&mut manager, &library_without(&[]));
    assert!(report.is_complete(), "{:?}", report.failed);
    for section in [
        RigSection::Base,
        RigSection::Blink,
        RigSection::Talk,
        RigSection::Gesture,
        RigSection::Emote,
        RigSection::Viseme,
        RigSection::PointOfInterest,
    ] {
        assert!(report.is_installed(section), "{section:?}");
    }
    // optional sections without clips are skipped silently
    assert!(!report.is_installed(RigSection::Face));
    assert!(!report.is_installed(RigSection::BindPoseOffset));

    let layer = |name| manager.layer(name).unwrap();
    assert_eq!(layer(layer_names::BASE).blend_mode(), BlendMode::Override);
    assert_eq!(layer(layer_names::TALK).blend_mode(), BlendMode::Additive);
    assert_eq!(layer(layer_names::TALK).weight(), 0.0);
    assert_eq!(layer(layer_names::VISEME).weight(), 0.0);
    assert_eq!(layer(layer_names::VISEME).transition_time(), 0.12);
    assert_eq!(layer(layer_names::BLINK).transition_time(), 0.075);
    assert_eq!(layer(layer_names::EMOTE).blend_mode(), BlendMode::Override);

    assert_eq!(
        manager.active_animation(layer_names::BASE).unwrap(),
        Some("idle")
    );
    let kind = |layer, anim| manager.animation(layer, anim).map(|s| s.kind());
    assert_eq!(kind(layer_names::BLINK, "blink"), Some(AnimationKind::Random));
    assert_eq!(kind(layer_names::GESTURE, "wave"), Some(AnimationKind::Queue));
    assert_eq!(kind(layer_names::EMOTE, "happy"), Some(AnimationKind::Single));
    assert_eq!(kind(layer_names::VISEME, "visemes"), Some(AnimationKind::FreeBlend));
    assert_eq!(kind("Head", "look"), Some(AnimationKind::Blend2d));
    for code in ["sil", "S", "s", "@", "O"] {
        assert_eq!(
            manager
                .blend_weight(layer_names::VISEME, "visemes", code)
                .unwrap(),
            0.0,
            "{code}"
        );
    }
}

/// it should fail only the section whose clip is missing
#[test]
fn missing_clip_fails_its_own_section() {
    let mut manager = LayerManager::new(Config::default());
    let report = full_rig().install(&mut manager, &library_without(&["talk", "look_up"]));

    let failed: Vec<_> = report.failed.iter().map(|(s, _)| *s).collect();
    assert_eq!(failed, [RigSection::Talk, RigSection::PointOfInterest]);
    assert!(matches!(
        &report.failed[0].1,
        HostError::MissingAsset { kind: "clip", name } if name == "talk"
    ));
    assert!(report.is_installed(RigSection::Viseme));
    assert!(report.is_installed(RigSection::Gesture));
    assert!(!manager.has_layer(layer_names::TALK));
    assert!(!manager.has_layer("Head"));
}

/// it should remove the layers a section registered before it failed
#[test]
fn failed_section_removes_its_partial_layers() {
    let mut rig = full_rig();
    rig.gesture_clips.push("wave".into());
    let head = rig.poi_layers[0].clone();
    rig.poi_layers.push(head);

    let mut manager = LayerManager::new(Config::default());
    let report = rig.install(&mut manager, &library_without(&[]));

    let failed: Vec<_> = report.failed.iter().map(|(s, _)| *s).collect();
    assert_eq!(failed, [RigSection::Gesture, RigSection::PointOfInterest]);
    assert!(!manager.has_layer(layer_names::GESTURE));
    assert!(!manager.has_layer("Head"));

    let names: Vec<_> = manager.layer_names().collect();
    assert_eq!(
        names,
        [
            layer_names::BASE,
            layer_names::BLINK,
            layer_names::TALK,
            layer_names::EMOTE,
            layer_names::VISEME,
        ]
    );
}

/// it should leave features off when the layers they drive are missing
#[test]
fn standard_host_skips_features_of_failed_sections() {
    let config = HostConfig::from_json(&configs::json("host").unwrap()).unwrap();
    let (host, report) = HostController::standard(
        &config,
        &full_rig(),
        &library_without(&["viseme_O"]),
        None,
    );
    assert!(!report.is_installed(RigSection::Viseme));
    assert!(host.lipsync().is_none());
    assert!(host.speech().is_none());
    assert!(host.gesture().is_some());
    assert!(host.point_of_interest().is_some());
}

#[test]
fn face_and_bind_pose_sections_slice_their_clips() {
    let mut manager = LayerManager::new(Config::default());
    let rig = StandardRig {
        face_idle_clip: Some("happy".into()),
        bind_pose_offset_clip: Some("happy".into()),
        ..StandardRig::default()
    };
    let report = rig.install(&mut manager, &library_without(&[]));
    assert!(report.is_installed(RigSection::Face));
    assert!(report.is_installed(RigSection::BindPoseOffset));

    manager.update(0.0);
    // face idle is made additive, so a constant clip contributes nothing;
    // the bind pose offset is already a delta and applies as authored
    let smile = manager
        .pose()
        .get("face.mouthSmile")
        .and_then(|v| v.as_float())
        .unwrap();
    assert!((smile - 0.8).abs() < 1e-4, "smile {smile}");
}

//! Speak one recorded utterance on the standard rig without audio hardware
//! and print what happens frame by frame.

use std::sync::Arc;

use async_trait::async_trait;

use avatar_host::{layer_names, ClipLibrary, HostConfig, HostController, HostEvent, StandardRig};
use avatar_speech_core::providers::{
    AzureEvent, AzureSpeechProvider, AzureSynthesis, AzureTransport,
};
use avatar_speech_core::{AudioPlayback, ManualPlayback, SpeechProvider, SynthesisError};
use avatar_test_fixtures::{clips, configs, speechmarks};

struct Recorded(Vec<AzureEvent>);

#[async_trait]
impl AzureTransport for Recorded {
    async fn speak_ssml(&self, _ssml: &str) -> Result<AzureSynthesis, SynthesisError> {
        Ok(AzureSynthesis {
            audio: vec![0xff, 0xf3, 0x44, 0xc4],
            content_type: "audio/mpeg".into(),
            events: self.0.clone(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let config = HostConfig::from_json(&configs::json("host")?)?;
    let mut library = ClipLibrary::new();
    for key in clips::keys() {
        library.insert_json(&clips::json(&key)?)?;
    }
    let rig = StandardRig {
        gesture_clips: vec!["wave".into()],
        gestures: configs::load("gesture")?,
        emote_clips: vec!["happy".into()],
        poi_layers: configs::load("poi")?,
        ..StandardRig::default()
    };

    let events: Vec<AzureEvent> = speechmarks::load("azure-hello")?;
    let provider: Arc<dyn SpeechProvider> = Arc::new(AzureSpeechProvider::new(Recorded(events)));
    let audio: Box<dyn AudioPlayback> = Box::new(ManualPlayback::with_duration(800.0));
    let (mut host, report) =
        HostController::standard(&config, &rig, &library, Some((provider, audio)));
    for (section, err) in &report.failed {
        println!("section {section:?} skipped: {err}");
    }

    host.set_look_target(Some([0.5, 1.6, 2.0]))?;
    host.speak("Hello world.")?;

    for _ in 0..90 {
        let frame = host.update(1.0 / 60.0)?;
        for event in &frame.events {
            match event {
                HostEvent::Animation(_) => {}
                other => println!("[{:>3}] {other:?}", frame.epoch),
            }
        }
        if frame.events.iter().any(|e| matches!(e, HostEvent::SpeechEnd { .. })) {
            let talk = host.animation().layer_weight(layer_names::TALK)?;
            println!("speech ended, Talk weight {talk:.2} fading out");
        }
    }

    let pose = host.animation().pose();
    println!("final pose: {}", serde_json::to_string_pretty(pose)?);
    Ok(())
}

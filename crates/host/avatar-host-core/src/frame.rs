//! One host frame:
//!   speech -> lipsync -> mark commands -> gesture -> look-at -> animation
//!
//! Feature errors from the animation side abort the frame. Bad mark commands
//! only produce a [`HostEvent::MarkCommandFailed`].

use log::warn;

use crate::error::HostError;
use crate::events::HostEvent;
use crate::mark_commands::{parse_mark, HostCommand};
use crate::{HostController, HostFrame};

pub(crate) fn run_frame(host: &mut HostController, dt: f32) -> Result<HostFrame, HostError> {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let mut events = std::mem::take(&mut host.pending);

    // Speech phase
    let speech = match host.speech.as_mut() {
        Some(speech) => speech.update(dt, &mut events),
        None => Default::default(),
    };

    // Lipsync phase
    if let Some(lipsync) = host.lipsync.as_mut() {
        if speech.stopped {
            lipsync.speech_stopped(&mut host.animation)?;
        }
        if speech.started {
            lipsync.speech_started(&mut host.animation)?;
        }
        lipsync.update(&mut host.animation, speech.viseme)?;
    }

    // Commands carried by SSML bookmarks
    for value in &speech.ssml {
        match parse_mark(value) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if let Err(err) = execute(host, command, &mut events) {
                    warn!("mark command {value} failed: {err}");
                    events.push(HostEvent::MarkCommandFailed {
                        value: value.clone(),
                        reason: err.to_string(),
                    });
                }
            }
            Err(err) => {
                warn!("mark {value} not understood: {err}");
                events.push(HostEvent::MarkCommandFailed {
                    value: value.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if let Some(gesture) = host.gesture.as_mut() {
        gesture.update(dt);
    }
    if let Some(poi) = host.point_of_interest.as_mut() {
        poi.update(dt, &mut host.animation)?;
    }

    // Animation phase
    host.animation.update(dt);
    let animation_events = host.animation.drain_events();
    if let Some(gesture) = host.gesture.as_mut() {
        gesture.on_animation_events(&mut host.animation, &animation_events)?;
    }
    events.extend(animation_events.into_iter().map(HostEvent::Animation));

    Ok(HostFrame {
        epoch: host.epoch,
        dt,
        events,
    })
}

fn execute(
    host: &mut HostController,
    command: HostCommand,
    events: &mut Vec<HostEvent>,
) -> Result<(), HostError> {
    match command {
        HostCommand::PlayGesture {
            layer,
            animation,
            force,
        } => {
            let gesture = host
                .gesture
                .as_mut()
                .ok_or(HostError::FeatureMissing { feature: "gesture" })?;
            if !gesture.play_gesture(&mut host.animation, &layer, &animation, force)? {
                events.push(HostEvent::GestureThrottled { layer, animation });
            }
        }
        HostCommand::StopGesture { layer } => {
            let gesture = host
                .gesture
                .as_mut()
                .ok_or(HostError::FeatureMissing { feature: "gesture" })?;
            gesture.stop_gesture(&mut host.animation, &layer)?;
        }
        HostCommand::SetTarget { position } => host.set_look_target(Some(position))?,
        HostCommand::ClearTarget => host.set_look_target(None)?,
    }
    Ok(())
}

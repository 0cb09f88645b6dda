//! The domain table.

use serde_json::Value;
use std::str::FromStr;

use super::{build, send_call, Domain, ServiceSpec};
use crate::context::CallContext;
use crate::dispatch::Connection;
use crate::envelope::ServiceData;
use crate::types::{Error, Result};

define_domains! {
    /// Alarm control panels. Pass `{"code": ...}` when the panel needs one.
    alarm_control_panel: AlarmControlPanel => "alarm_control_panel" {
        arm_away => "alarm_arm_away" (target, data);
        arm_custom_bypass => "alarm_arm_custom_bypass" (target, data);
        arm_home => "alarm_arm_home" (target, data);
        arm_night => "alarm_arm_night" (target, data);
        arm_vacation => "alarm_arm_vacation" (target, data);
        disarm => "alarm_disarm" (target, data);
        trigger => "alarm_trigger" (target, data);
    }

    /// Covers: blinds, garage doors, shades.
    cover: Cover => "cover" {
        close => "close_cover" (target);
        close_tilt => "close_cover_tilt" (target);
        open => "open_cover" (target);
        open_tilt => "open_cover_tilt" (target);
        /// `{"position": 0..=100}`
        set_position => "set_cover_position" (target, data);
        /// `{"tilt_position": 0..=100}`
        set_tilt_position => "set_cover_tilt_position" (target, data);
        stop => "stop_cover" (target);
        stop_tilt => "stop_cover_tilt" (target);
        toggle => "toggle" (target);
        toggle_tilt => "toggle_tilt" (target);
    }

    light: Light => "light" {
        turn_on => "turn_on" (target, data);
        toggle => "toggle" (target, data);
        turn_off => "turn_off" (target);
    }

    /// Domain-agnostic actions on any entity.
    home_assistant: HomeAssistant => "homeassistant" {
        turn_on => "turn_on" (target, data);
        toggle => "toggle" (target, data);
        turn_off => "turn_off" (target);
    }

    lock: Lock => "lock" {
        lock => "lock" (target, data);
        unlock => "unlock" (target, data);
        open => "open" (target, data);
    }

    media_player: MediaPlayer => "media_player" {
        clear_playlist => "clear_playlist" (target);
        /// Group players together. Only on platforms with player groups.
        join => "join" (target, data);
        next => "media_next_track" (target);
        pause => "media_pause" (target);
        play => "media_play" (target);
        play_pause => "media_play_pause" (target);
        previous => "media_previous_track" (target);
        /// `{"seek_position": seconds}`
        seek => "media_seek" (target, data);
        stop => "media_stop" (target);
        play_media => "play_media" (target, data);
        repeat_set => "repeat_set" (target, data);
        select_sound_mode => "select_sound_mode" (target, data);
        select_source => "select_source" (target, data);
        shuffle_set => "shuffle_set" (target, data);
        toggle => "toggle" (target);
        turn_off => "turn_off" (target);
        turn_on => "turn_on" (target);
        /// Remove the player from its group.
        unjoin => "unjoin" (target);
        volume_down => "volume_down" (target);
        volume_mute => "volume_mute" (target, data);
        volume_set => "volume_set" (target, data);
        volume_up => "volume_up" (target);
    }

    switch: Switch => "switch" {
        turn_on => "turn_on" (target);
        toggle => "toggle" (target);
        turn_off => "turn_off" (target);
    }

    input_boolean: InputBoolean => "input_boolean" {
        turn_on => "turn_on" (target);
        toggle => "toggle" (target);
        turn_off => "turn_off" (target);
        reload => "reload" ();
    }

    input_button: InputButton => "input_button" {
        press => "press" (target);
        reload => "reload" ();
    }

    input_datetime: InputDatetime => "input_datetime" {
        /// `{"datetime": ...}`, `{"date": ...}` or `{"time": ...}`
        set => "set_datetime" (target, data);
        reload => "reload" ();
    }

    input_text: InputText => "input_text" {
        set => "set_value" (target, data);
        reload => "reload" ();
    }

    input_number: InputNumber => "input_number" {
        set => "set_value" (target, data);
        increment => "increment" (target);
        decrement => "decrement" (target);
        reload => "reload" ();
    }

    /// Notifications. The service is the notifier's name, e.g.
    /// `mobile_app_pixel`; see [`Notify::notify`].
    notify: Notify => "notify" [open] {}

    number: Number => "number" {
        set_value => "set_value" (target, data);
    }

    scene: Scene => "scene" {
        /// Apply entity states without defining a scene entity.
        apply => "apply" (data);
        /// Create a scene on the fly, optionally snapshotting entities.
        create => "create" (data);
        reload => "reload" ();
        turn_on => "turn_on" (target, data);
    }

    /// Text-to-speech.
    tts: Tts => "tts" {
        /// Remove all text-to-speech cache files and RAM cache.
        clear_cache => "clear_cache" ();
        /// Say something on a media player with cloud TTS.
        cloud_say => "cloud_say" (target, data);
        /// Say something on a media player with google_translate.
        google_translate_say => "google_translate_say" (target, data);
    }

    vacuum: Vacuum => "vacuum" {
        clean_spot => "clean_spot" (target);
        locate => "locate" (target);
        pause => "pause" (target);
        return_to_base => "return_to_base" (target);
        send_command => "send_command" (target, data);
        set_fan_speed => "set_fan_speed" (target, data);
        start => "start" (target);
        start_pause => "start_pause" (target);
        stop => "stop" (target);
        turn_off => "turn_off" (target);
        turn_on => "turn_on" (target);
    }
}

// Typed shortcuts for the common single-parameter calls.

impl MediaPlayer {
    /// `volume_set` with `{"volume_level": level}`, level in `0.0..=1.0`.
    pub async fn set_volume(&self, entity_id: &str, level: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::validation(format!(
                "volume_level must be within 0.0..=1.0, got {}",
                level
            )));
        }
        self.volume_set(entity_id, Some(ServiceData::new().insert("volume_level", level)))
            .await
    }
}

impl Number {
    pub async fn set_number(&self, entity_id: &str, value: f64) -> Result<()> {
        self.set_value(entity_id, Some(number_value(value)?)).await
    }
}

impl InputNumber {
    pub async fn set_number(&self, entity_id: &str, value: f64) -> Result<()> {
        self.set(entity_id, Some(number_value(value)?)).await
    }
}

impl InputText {
    pub async fn set_text(&self, entity_id: &str, value: &str) -> Result<()> {
        self.set(entity_id, Some(ServiceData::new().insert("value", value)))
            .await
    }
}

// serde_json maps NaN and infinities to null; reject them instead.
fn number_value(value: f64) -> Result<ServiceData> {
    let number = serde_json::Number::from_f64(value)
        .ok_or_else(|| Error::validation(format!("{} is not a finite number", value)))?;
    Ok(ServiceData::new().insert("value", Value::Number(number)))
}

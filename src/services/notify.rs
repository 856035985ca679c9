//! Desktop notification, sound and screensaver collaborators

use tracing::debug;

use super::{process::spawn_detached, NotificationSink, ScreenSaverActivator, SoundPlayer};

/// Posts notifications through `notify-send`
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
    fn send(&self, title: &str, body: &str, sound_id: Option<&str>) {
        debug!("Sending notification: {}", title);
        let mut args = vec![
            "--app-name=Break Reminder".to_string(),
            "--urgency=normal".to_string(),
            "--category=break-reminder".to_string(),
        ];
        if let Some(sound) = sound_id {
            args.push(format!("--hint=string:sound-name:{}", freedesktop_sound_name(sound)));
        }
        args.push(title.to_string());
        args.push(body.to_string());
        spawn_detached("notify-send", args);
    }
}

/// Plays event sounds through `canberra-gtk-play`
#[derive(Debug, Default, Clone, Copy)]
pub struct CanberraSoundPlayer;

impl SoundPlayer for CanberraSoundPlayer {
    fn play(&self, sound_id: &str) {
        spawn_detached(
            "canberra-gtk-play",
            vec![
                format!("--id={}", freedesktop_sound_name(sound_id)),
                "--description=Break Reminder".to_string(),
            ],
        );
    }
}

/// Starts the screensaver with `xdg-screensaver activate`
#[derive(Debug, Default, Clone, Copy)]
pub struct XdgScreenSaver;

impl ScreenSaverActivator for XdgScreenSaver {
    fn activate(&self) {
        spawn_detached("xdg-screensaver", vec!["activate".to_string()]);
    }
}

/// Map a reminder sound id onto the freedesktop sound theme
pub fn freedesktop_sound_name(sound_id: &str) -> &'static str {
    match sound_id {
        "Glass" | "Tink" | "Ping" => "bell",
        "Pop" | "Bottle" => "message-new-instant",
        "Purr" | "Frog" => "dialog-information",
        "Submarine" | "Morse" => "complete",
        "Hero" | "Funk" => "service-login",
        "Blow" | "Sosumi" => "dialog-warning",
        _ => "message",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sounds_use_theme_default() {
        assert_eq!(freedesktop_sound_name("default"), "message");
        assert_eq!(freedesktop_sound_name("Glass"), "bell");
        assert_eq!(freedesktop_sound_name("nope"), "message");
    }
}

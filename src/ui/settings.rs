use serde::{Deserialize, Serialize};
use egui::Color32;
use std::collections::HashMap;

use dungeon_master::model::message::Speaker;

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Speaker → color mapping (extensible)
    pub speaker_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut speaker_colors = HashMap::new();

        speaker_colors.insert(Speaker::Player.key().into(), [40, 70, 120, 255]);
        speaker_colors.insert(Speaker::Narrator.key().into(), [40, 90, 60, 255]);
        speaker_colors.insert(Speaker::Resolver.key().into(), [90, 60, 120, 255]);
        speaker_colors.insert(Speaker::System.key().into(), [80, 80, 80, 255]);

        Self {
            ui_scale: 1.0,
            speaker_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, speaker: Speaker) -> Color32 {
        self.speaker_colors
            .get(speaker.key())
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::WHITE)
    }

    pub fn set_color(&mut self, speaker: Speaker, color: Color32) {
        self.speaker_colors.insert(
            speaker.key().to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_round_trip_through_the_table() {
        let mut settings = UiSettings::default();
        settings.set_color(Speaker::Narrator, Color32::from_rgb(1, 2, 3));
        assert_eq!(settings.color(Speaker::Narrator), Color32::from_rgb(1, 2, 3));
    }

    #[test]
    fn unknown_speaker_falls_back_to_white() {
        let settings = UiSettings {
            speaker_colors: HashMap::new(),
            ..UiSettings::default()
        };
        assert_eq!(settings.color(Speaker::System), Color32::WHITE);
    }
}

use ratatui::style::Color;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::ObjectStatus;

// Color palette structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThemeId {
    Dark = 0,
    Light = 1,
}

impl ThemeId {
    /// Value stored under the `theme` setting
    pub fn as_setting(&self) -> &'static str {
        match self {
            ThemeId::Dark => "dark",
            ThemeId::Light => "light",
        }
    }

    /// `light` selects the light theme; anything else is dark.
    pub fn from_setting(value: &str) -> Self {
        if value == "light" {
            ThemeId::Light
        } else {
            ThemeId::Dark
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeId::Dark => ThemeId::Light,
            ThemeId::Light => ThemeId::Dark,
        }
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            1 => ThemeId::Light,
            _ => ThemeId::Dark,
        }
    }
}

static CURRENT_THEME_INDEX: AtomicUsize = AtomicUsize::new(0);

pub fn current_theme_id() -> ThemeId {
    ThemeId::from_index(CURRENT_THEME_INDEX.load(Ordering::Relaxed))
}

pub fn set_theme(theme: ThemeId) {
    CURRENT_THEME_INDEX.store(theme as usize, Ordering::Relaxed);
}

/// Switches the active theme from a setting value, optionally persisting it.
///
/// Returns the theme actually applied.
pub fn change_theme(value: &str, save: bool) -> ThemeId {
    let theme = ThemeId::from_setting(value);
    set_theme(theme);
    if save {
        crate::settings::set_theme_name(theme.as_setting());
    }
    theme
}

pub fn current_theme() -> &'static Base16Palette {
    palette(current_theme_id())
}

pub fn palette(theme: ThemeId) -> &'static Base16Palette {
    match theme {
        ThemeId::Dark => &DARK_PALETTE,
        ThemeId::Light => &LIGHT_PALETTE,
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// Oceanic Next
static DARK_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
};

// Base16 One Light
static LIGHT_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0xFAFAFA),
    base_01: rgb(0xF0F0F1),
    base_02: rgb(0xE5E5E6),
    base_03: rgb(0xA0A1A7),
    base_04: rgb(0x696C77),
    base_05: rgb(0x383A42),
    base_06: rgb(0x202227),
    base_07: rgb(0x090A0B),
    base_08: rgb(0xCA1243),
    base_09: rgb(0xD75F00),
    base_0a: rgb(0xC18401),
    base_0b: rgb(0x50A14F),
    base_0c: rgb(0x0184BC),
    base_0d: rgb(0x4078F2),
    base_0e: rgb(0xA626A4),
    base_0f: rgb(0x986801),
};

// Color utilities for focus states
impl Base16Palette {
    // Get colors for focused/unfocused panels
    pub fn get_panel_colors(&self, is_focused: bool) -> (Color, Color, Color) {
        if is_focused {
            (self.base_07, self.base_04, self.base_00)
        } else {
            (self.base_05, self.base_03, self.base_00)
        }
    }

    // Get selection colors for focused/unfocused states
    pub fn get_selection_colors(&self, is_focused: bool) -> (Color, Color) {
        if is_focused {
            (self.base_02, self.base_06)
        } else {
            (self.base_01, self.base_04)
        }
    }

    pub fn status_color(&self, status: ObjectStatus) -> Color {
        match status {
            ObjectStatus::NoReview => self.base_03,
            ObjectStatus::PendingReview => self.base_0a,
            ObjectStatus::UnderReview => self.base_0d,
            ObjectStatus::RequireChanges => self.base_08,
            ObjectStatus::Approved => self.base_0b,
        }
    }
}

/// Night mode page filter: inverts lightness and keeps the hue.
///
/// Equivalent to an invert followed by a 180° hue rotation, computed per
/// pixel as `c + 255 - max - min`.
pub fn night_pixel([r, g, b]: [u8; 3]) -> [u8; 3] {
    let max = r.max(g).max(b) as i16;
    let min = r.min(g).min(b) as i16;
    let shift = 255 - max - min;
    let apply = |c: u8| (c as i16 + shift).clamp(0, 255) as u8;
    [apply(r), apply(g), apply(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_values_are_dark() {
        assert_eq!(ThemeId::from_setting("light"), ThemeId::Light);
        assert_eq!(ThemeId::from_setting("dark"), ThemeId::Dark);
        assert_eq!(ThemeId::from_setting("solarized"), ThemeId::Dark);
        assert_eq!(ThemeId::from_setting(""), ThemeId::Dark);
    }

    #[test]
    fn night_pixel_inverts_greys() {
        assert_eq!(night_pixel([255, 255, 255]), [0, 0, 0]);
        assert_eq!(night_pixel([0, 0, 0]), [255, 255, 255]);
        assert_eq!(night_pixel([100, 100, 100]), [155, 155, 155]);
    }

    #[test]
    fn night_pixel_keeps_hue() {
        // Pure red stays red, light red becomes dark red.
        assert_eq!(night_pixel([255, 0, 0]), [255, 0, 0]);
        assert_eq!(night_pixel([255, 200, 200]), [55, 0, 0]);
    }

    #[test]
    fn night_pixel_twice_is_identity() {
        for px in [[12, 200, 99], [0, 0, 255], [250, 250, 10]] {
            assert_eq!(night_pixel(night_pixel(px)), px);
        }
    }
}

// THEORY:
// The `paint` module is the colour vocabulary of the engine. Everything the renderer
// draws arrives with the fill style that was active at the time, and that fill is
// the strongest single hint about what an entity is. The game uses a small,
// fixed palette: one colour per neutral shape family, one per team, and a couple
// of special cases (the necromancer's drones, the black arrow indicator).
//
// Key principles:
// 1) Closed set: raw RGBA values are mapped once into `PaintColor`, and every
//    classifier switches on that enum. No downstream code compares raw colours.
// 2) Lossless fallback: colours outside the palette become `Unrecognized(rgba)`
//    so consumers can still audit what was drawn.
// 3) Alpha-blind: entities fade out when they die, so only RGB takes part in
//    palette matching.

pub mod paint {
    use crate::error::PaintParseError;
    use image::Rgba;
    use serde::{Serialize, Serializer};
    use std::fmt;

    pub type Channel = u8;
    pub type Rgba8 = Rgba<Channel>;

    const SQUARE: [Channel; 3] = [0xFF, 0xE8, 0x69];
    const TRIANGLE: [Channel; 3] = [0xFC, 0x76, 0x77];
    const CRASHER: [Channel; 3] = [0xF1, 0x77, 0xDD];
    const PENTAGON: [Channel; 3] = [0x76, 0x8D, 0xFC];
    const HEXAGON: [Channel; 3] = [0x9B, 0x5D, 0xE5];
    const NECROMANCER_DRONE: [Channel; 3] = [0xFC, 0xC3, 0x76];
    const TEAM_BLUE: [Channel; 3] = [0x00, 0xB2, 0xE1];
    const TEAM_RED: [Channel; 3] = [0xF1, 0x4E, 0x54];
    const TEAM_GREEN: [Channel; 3] = [0x00, 0xE1, 0x6E];
    const TEAM_PURPLE: [Channel; 3] = [0xBF, 0x7F, 0xF5];
    const BLACK: [Channel; 3] = [0x00, 0x00, 0x00];

    /// The recognised paint palette of the arena.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum PaintColor {
        Square,
        Triangle,
        Crasher,
        /// Shared by regular and alpha pentagons.
        Pentagon,
        Hexagon,
        NecromancerDrone,
        TeamBlue,
        TeamRed,
        TeamGreen,
        TeamPurple,
        /// Used by the on-screen arrow indicator, never by an entity.
        Black,
        Unrecognized(Rgba8),
    }

    impl PaintColor {
        /// Maps a raw fill into the palette, ignoring alpha.
        pub fn from_rgba(rgba: Rgba8) -> Self {
            let Rgba([r, g, b, _]) = rgba;
            match [r, g, b] {
                SQUARE => PaintColor::Square,
                TRIANGLE => PaintColor::Triangle,
                CRASHER => PaintColor::Crasher,
                PENTAGON => PaintColor::Pentagon,
                HEXAGON => PaintColor::Hexagon,
                NECROMANCER_DRONE => PaintColor::NecromancerDrone,
                TEAM_BLUE => PaintColor::TeamBlue,
                TEAM_RED => PaintColor::TeamRed,
                TEAM_GREEN => PaintColor::TeamGreen,
                TEAM_PURPLE => PaintColor::TeamPurple,
                BLACK => PaintColor::Black,
                _ => PaintColor::Unrecognized(rgba),
            }
        }

        /// The canonical RGBA value for this colour (opaque for palette entries).
        pub fn to_rgba(self) -> Rgba8 {
            let [r, g, b] = match self {
                PaintColor::Square => SQUARE,
                PaintColor::Triangle => TRIANGLE,
                PaintColor::Crasher => CRASHER,
                PaintColor::Pentagon => PENTAGON,
                PaintColor::Hexagon => HEXAGON,
                PaintColor::NecromancerDrone => NECROMANCER_DRONE,
                PaintColor::TeamBlue => TEAM_BLUE,
                PaintColor::TeamRed => TEAM_RED,
                PaintColor::TeamGreen => TEAM_GREEN,
                PaintColor::TeamPurple => TEAM_PURPLE,
                PaintColor::Black => BLACK,
                PaintColor::Unrecognized(rgba) => return rgba,
            };
            Rgba([r, g, b, 0xFF])
        }

        /// True for the four player team colours.
        pub fn is_team(self) -> bool {
            matches!(
                self,
                PaintColor::TeamBlue
                    | PaintColor::TeamRed
                    | PaintColor::TeamGreen
                    | PaintColor::TeamPurple
            )
        }
    }

    impl From<Rgba8> for PaintColor {
        fn from(rgba: Rgba8) -> Self {
            PaintColor::from_rgba(rgba)
        }
    }

    impl fmt::Display for PaintColor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                PaintColor::Square => f.write_str("square"),
                PaintColor::Triangle => f.write_str("triangle"),
                PaintColor::Crasher => f.write_str("crasher"),
                PaintColor::Pentagon => f.write_str("pentagon"),
                PaintColor::Hexagon => f.write_str("hexagon"),
                PaintColor::NecromancerDrone => f.write_str("necromancer_drone"),
                PaintColor::TeamBlue => f.write_str("team_blue"),
                PaintColor::TeamRed => f.write_str("team_red"),
                PaintColor::TeamGreen => f.write_str("team_green"),
                PaintColor::TeamPurple => f.write_str("team_purple"),
                PaintColor::Black => f.write_str("black"),
                PaintColor::Unrecognized(rgba) => f.write_str(&to_hex(*rgba)),
            }
        }
    }

    impl Serialize for PaintColor {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (case-insensitive) into RGBA.
    pub fn parse_hex(text: &str) -> Result<Rgba8, PaintParseError> {
        let digits = text
            .strip_prefix('#')
            .ok_or_else(|| PaintParseError::MissingHash(text.to_string()))?;
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(PaintParseError::BadLength(text.to_string()));
        }

        let mut channels = [0xFF; 4];
        for (i, channel) in channels.iter_mut().take(digits.len() / 2).enumerate() {
            *channel = Channel::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| PaintParseError::BadDigit(text.to_string()))?;
        }
        Ok(Rgba(channels))
    }

    /// Formats RGBA as `#rrggbbaa`.
    pub fn to_hex(rgba: Rgba8) -> String {
        let Rgba([r, g, b, a]) = rgba;
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

use super::Color;

/// Cell background
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    #[default]
    None,
    Solid {
        color: Color,
    },
    Pattern {
        pattern: PatternType,
        foreground: Color,
        background: Color,
    },
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid { color }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }
}

macro_rules! pattern_types {
    ($($variant:ident => $token:literal),* $(,)?) => {
        /// `patternFill/@patternType` values
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum PatternType {
            #[default]
            $($variant),*
        }

        impl PatternType {
            pub fn as_ooxml(&self) -> &'static str {
                match self {
                    $(PatternType::$variant => $token),*
                }
            }

            pub fn from_ooxml(s: &str) -> Option<Self> {
                match s {
                    $($token => Some(PatternType::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

pattern_types! {
    None => "none",
    Solid => "solid",
    MediumGray => "mediumGray",
    DarkGray => "darkGray",
    LightGray => "lightGray",
    DarkHorizontal => "darkHorizontal",
    DarkVertical => "darkVertical",
    DarkDown => "darkDown",
    DarkUp => "darkUp",
    DarkGrid => "darkGrid",
    DarkTrellis => "darkTrellis",
    LightHorizontal => "lightHorizontal",
    LightVertical => "lightVertical",
    LightDown => "lightDown",
    LightUp => "lightUp",
    LightGrid => "lightGrid",
    LightTrellis => "lightTrellis",
    Gray125 => "gray125",
    Gray0625 => "gray0625",
}

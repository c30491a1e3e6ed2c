use super::Color;

/// Borders of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub diagonal: Option<BorderEdge>,
    pub diagonal_direction: DiagonalDirection,
}

impl BorderStyle {
    /// Same edge on left, right, top and bottom
    pub fn all(line: BorderLineStyle, color: Color) -> Self {
        let edge = Some(BorderEdge::new(line, color));
        Self {
            left: edge.clone(),
            right: edge.clone(),
            top: edge.clone(),
            bottom: edge,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges().all(|(_, e)| e.is_none())
    }

    /// Edges in `<border>` child order, with their element names
    pub fn edges(&self) -> impl Iterator<Item = (&'static str, &Option<BorderEdge>)> {
        [
            ("left", &self.left),
            ("right", &self.right),
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("diagonal", &self.diagonal),
        ]
        .into_iter()
    }

    /// Mutable edge by element name (`left`, `right`, `top`, `bottom`, `diagonal`)
    pub fn edge_mut(&mut self, name: &str) -> Option<&mut Option<BorderEdge>> {
        match name {
            "left" => Some(&mut self.left),
            "right" => Some(&mut self.right),
            "top" => Some(&mut self.top),
            "bottom" => Some(&mut self.bottom),
            "diagonal" => Some(&mut self.diagonal),
            _ => None,
        }
    }
}

/// One border line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }

    pub fn thin() -> Self {
        Self::new(BorderLineStyle::Thin, Color::BLACK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    const TOKENS: [(BorderLineStyle, &'static str); 13] = [
        (BorderLineStyle::Thin, "thin"),
        (BorderLineStyle::Medium, "medium"),
        (BorderLineStyle::Thick, "thick"),
        (BorderLineStyle::Dashed, "dashed"),
        (BorderLineStyle::Dotted, "dotted"),
        (BorderLineStyle::Double, "double"),
        (BorderLineStyle::Hair, "hair"),
        (BorderLineStyle::MediumDashed, "mediumDashed"),
        (BorderLineStyle::DashDot, "dashDot"),
        (BorderLineStyle::MediumDashDot, "mediumDashDot"),
        (BorderLineStyle::DashDotDot, "dashDotDot"),
        (BorderLineStyle::MediumDashDotDot, "mediumDashDotDot"),
        (BorderLineStyle::SlantDashDot, "slantDashDot"),
    ];

    /// `style` attribute value; `None` draws nothing
    pub fn as_ooxml(&self) -> Option<&'static str> {
        Self::TOKENS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, token)| *token)
    }

    pub fn from_ooxml(s: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(_, token)| *token == s)
            .map(|(style, _)| *style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagonalDirection {
    #[default]
    None,
    Down,
    Up,
    Both,
}

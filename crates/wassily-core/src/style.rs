//! Style bags shared by frames and markings.
//!
//! A style is a plain value: markings copy their frame's style when they
//! are created, and `style_like` copies one element's bag onto another.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Dash pattern in pixels, alternating on/off lengths.
pub type DashPattern = SmallVec<[f64; 4]>;

/// Drawing attributes applied before a frame or marking paints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// CSS color used for both stroke and fill.
    pub color: String,
    pub line_width: f64,
    pub line_dash: Option<DashPattern>,
    /// CSS font shorthand, e.g. `"12px sans-serif"`.
    pub font: Option<String>,
    /// Stroke the path instead of filling it.
    pub stroke: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: "black".into(),
            line_width: 1.0,
            line_dash: None,
            font: None,
            stroke: false,
        }
    }
}

impl Style {
    pub fn stroked(&mut self) -> &mut Self {
        self.stroke = true;
        self
    }

    pub fn filled(&mut self) -> &mut Self {
        self.stroke = false;
        self
    }

    pub fn colored(&mut self, color: impl Into<String>) -> &mut Self {
        self.color = color.into();
        self
    }

    pub fn lined_width(&mut self, width: f64) -> &mut Self {
        self.line_width = width;
        self
    }

    pub fn dashed(&mut self, dash: Option<&[f64]>) -> &mut Self {
        self.line_dash = dash.map(SmallVec::from_slice);
        self
    }

    pub fn fonted(&mut self, font: Option<&str>) -> &mut Self {
        self.font = font.map(str::to_owned);
        self
    }
}

/// Horizontal anchor of a text box relative to its reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Vertical anchor of a text box (canvas `textBaseline`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

impl TextBaseline {
    pub fn as_css(self) -> &'static str {
        match self {
            TextBaseline::Top => "top",
            TextBaseline::Middle => "middle",
            TextBaseline::Alphabetic => "alphabetic",
            TextBaseline::Bottom => "bottom",
        }
    }
}

/// CSS color for a 3D direction: each component is mapped from [-1, 1]
/// (after normalizing) onto [0, 255]. Near-zero directions give mid grey.
pub fn rgb(direction: [f64; 3], alpha: Option<f64>, epsilon: f64) -> String {
    let len = direction.iter().map(|c| c * c).sum::<f64>().sqrt();
    let mut shifted = [0.5; 3];
    if len > epsilon {
        let halve = 0.5 / len;
        for (out, c) in shifted.iter_mut().zip(direction) {
            *out = c * halve + 0.5;
        }
    }
    let [r, g, b] = shifted.map(|x| (x * 255.0).round() as u8);
    match alpha {
        Some(a) => format!("rgba({r}, {g}, {b}, {a})"),
        None => format!("rgb({r}, {g}, {b})"),
    }
}

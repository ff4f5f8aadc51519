use std::fmt;

use kurbo::{Size, Vec2};

/// Stable identity of a span inside one [`SpanStore`](super::SpanStore).
///
/// Ids survive splits of *other* spans and re-walks, so they can be used to
/// mirror spans as host children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub(crate) u64);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 32-bit ARGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const TRANSPARENT: Color = Color(0x0000_0000);

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontWeight {
    Lighter,
    #[default]
    Normal,
    Medium,
    Bold,
    Bolder,
    Numeric(u16),
}

impl FontWeight {
    pub fn is_bold(self) -> bool {
        match self {
            FontWeight::Bold | FontWeight::Bolder => true,
            FontWeight::Numeric(value) => value >= 600,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Overline,
    LineThrough,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    pub blur_radius: f64,
    pub offset: Vec2,
    pub color: Color,
}

/// Character-level style of a text or symbol span.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub text_color: Color,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub font_family: Vec<String>,
    pub decoration: TextDecoration,
    pub decoration_color: Color,
    pub shadows: Vec<Shadow>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: crate::config::DEFAULT_TEXT_SIZE,
            text_color: Color::BLACK,
            font_style: FontStyle::Normal,
            font_weight: FontWeight::Normal,
            font_family: Vec::new(),
            decoration: TextDecoration::None,
            decoration_color: Color::BLACK,
            shadows: Vec::new(),
        }
    }
}

impl TextStyle {
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = FontStyle::Italic;
        self
    }

    pub fn with_decoration(mut self, decoration: TextDecoration) -> Self {
        self.decoration = decoration;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LeadingMargin {
    pub width: f64,
    pub height: f64,
}

/// Paragraph-level attributes. Every span carries a copy; the span that ends a
/// paragraph is the authoritative one.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ParagraphStyle {
    pub text_align: TextAlign,
    pub leading_margin: Option<LeadingMargin>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
    None,
    ScaleDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    Top,
    Center,
    #[default]
    Bottom,
    Baseline,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ImageAttributes {
    pub src: String,
    pub size: Option<Size>,
    pub object_fit: ImageFit,
    pub vertical_align: VerticalAlign,
    pub border_radius: Option<f64>,
    pub margin: Option<f64>,
}

impl ImageAttributes {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }
}

/// Embedded custom content occupying one logical character.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceholderRef {
    pub key: String,
    pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpanContent {
    Text {
        text: String,
        style: Option<TextStyle>,
    },
    Image(ImageAttributes),
    Symbol {
        code_point: char,
        style: Option<TextStyle>,
    },
    Placeholder(PlaceholderRef),
}

impl SpanContent {
    pub fn text(text: impl Into<String>) -> Self {
        SpanContent::Text {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled_text(text: impl Into<String>, style: TextStyle) -> Self {
        SpanContent::Text {
            text: text.into(),
            style: Some(style),
        }
    }

    /// Number of logical characters this content occupies.
    pub fn len(&self) -> usize {
        match self {
            SpanContent::Text { text, .. } => text.chars().count(),
            SpanContent::Image(_) | SpanContent::Symbol { .. } | SpanContent::Placeholder(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SpanContent::Image(_) | SpanContent::Placeholder(_))
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            SpanContent::Text { .. } => "Text",
            SpanContent::Image(_) => "Image",
            SpanContent::Symbol { .. } => "Symbol",
            SpanContent::Placeholder(_) => "Placeholder",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub(crate) id: SpanId,
    pub(crate) content: SpanContent,
    pub(crate) position: usize,
    pub(crate) paragraph_style: ParagraphStyle,
}

impl Span {
    pub fn id(&self) -> SpanId {
        self.id
    }

    pub fn content(&self) -> &SpanContent {
        &self.content
    }

    /// Exclusive end offset of this span in the document.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn start(&self) -> usize {
        self.position - self.len()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_placeholder(&self) -> bool {
        self.content.is_placeholder()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, SpanContent::Text { .. })
    }

    pub fn paragraph_style(&self) -> &ParagraphStyle {
        &self.paragraph_style
    }

    /// Content as it takes part in the flat document text. Placeholders read
    /// as a single space.
    pub fn text(&self) -> String {
        match &self.content {
            SpanContent::Text { text, .. } => text.clone(),
            SpanContent::Symbol { code_point, .. } => code_point.to_string(),
            SpanContent::Image(_) | SpanContent::Placeholder(_) => " ".to_string(),
        }
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.content {
            SpanContent::Text { style, .. } | SpanContent::Symbol { style, .. } => style.as_ref(),
            _ => None,
        }
    }

    pub fn ends_with_newline(&self) -> bool {
        matches!(&self.content, SpanContent::Text { text, .. } if text.ends_with('\n'))
    }
}

//! Layout description
//!
//! [`LayoutDescriber`] is the seam where screenshot bytes become prompt text.
//! The shipped [`TemplateDescriber`] ignores pixel content and returns a fixed
//! brief; a real vision step can replace it without touching the rest of the
//! pipeline.

use std::fmt;

/// Number of leading image bytes kept for provenance
const EXCERPT_BYTES: usize = 16;

const LAYOUT_TEMPLATE: &str = "The image shows a user interface that needs to be converted into a React component.
Please analyze the visual elements and create a responsive React component with:
- Semantic HTML structure
- Tailwind CSS for styling
- Proper spacing and alignment
- Responsive design considerations
- Accessibility features";

/// Prompt-ready description of a screenshot's layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDescription {
    text: String,
    excerpt: String,
}

impl LayoutDescription {
    pub fn new(text: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            excerpt: excerpt.into(),
        }
    }

    /// The text handed to the completion service
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Short hex rendering of the image head, for logs only
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }
}

impl fmt::Display for LayoutDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Turns artifact bytes into a [`LayoutDescription`]
///
/// Implementations must be pure: no I/O, same bytes in, same description out.
pub trait LayoutDescriber: Send + Sync {
    fn name(&self) -> &'static str;

    fn describe(&self, image: &[u8]) -> LayoutDescription;
}

/// Content-independent describer returning a fixed layout brief
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDescriber;

impl LayoutDescriber for TemplateDescriber {
    fn name(&self) -> &'static str {
        "template"
    }

    fn describe(&self, image: &[u8]) -> LayoutDescription {
        let head = &image[..image.len().min(EXCERPT_BYTES)];
        let excerpt = format!("{} bytes, head {}", image.len(), hex::encode(head));
        LayoutDescription::new(LAYOUT_TEMPLATE, excerpt)
    }
}

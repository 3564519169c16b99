use glint_core::Range;

/// Opaque handle to a decoration style registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationId(pub u64);

/// Styling parameters for a decoration handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationStyle {
    /// Tint the decorated range's background (execution highlights).
    Background { color: String },
    /// Render text after the line content (history annotations).
    AfterText { color: String, margin_px: u32 },
}

/// One decorated range, with optional inline and hover content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSpan {
    pub range: Range,
    pub after_text: Option<String>,
    pub hover_markdown: Option<String>,
}

impl DecorationSpan {
    /// A span with no inline or hover content.
    pub fn plain(range: Range) -> Self {
        Self {
            range,
            after_text: None,
            hover_markdown: None,
        }
    }
}

/// Resolved information about one line of a visible document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// The full line's range.
    pub range: Range,
    /// Column of the first non-whitespace character; equals the line end for
    /// whitespace-only lines.
    pub first_non_whitespace: u32,
}

/// The editor surface provider Glint renders through.
///
/// Implementations adapt a concrete host (an editor process, or
/// [`crate::InMemoryHost`] in tests and headless runs). Resources are
/// identified by the same absolute path strings the debug adapter reports.
pub trait EditorHost {
    /// Resources currently shown by at least one visible surface.
    fn visible_resources(&self) -> Vec<String>;

    /// Line information for a visible resource, if the line exists.
    fn line(&self, resource: &str, line: u32) -> Option<LineInfo>;

    /// Current selection of the surface showing `resource`, as inclusive
    /// (start, end) line bounds.
    fn selection(&self, resource: &str) -> Option<(u32, u32)>;

    /// Register a decoration style and return its handle.
    fn create_decoration(&mut self, style: DecorationStyle) -> DecorationId;

    /// Release a handle. Releasing removes its spans from every surface;
    /// releasing an unknown handle is a no-op.
    fn dispose_decoration(&mut self, id: DecorationId);

    /// Replace all spans of `id` on every visible surface showing
    /// `resource`. An empty `spans` clears the decoration there.
    fn set_decorations(&mut self, resource: &str, id: DecorationId, spans: Vec<DecorationSpan>);
}

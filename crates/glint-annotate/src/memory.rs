use std::collections::{BTreeMap, HashMap};

use glint_core::Range;

use crate::editor::{DecorationId, DecorationSpan, DecorationStyle, EditorHost, LineInfo};

/// An [`EditorHost`] over plain text buffers.
///
/// Every opened document counts as one visible surface. Applied decorations
/// are recorded instead of rendered, so tests and headless runs can inspect
/// exactly what a real editor would show.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    documents: BTreeMap<String, Vec<String>>,
    selections: HashMap<String, (u32, u32)>,
    next_decoration: u64,
    styles: HashMap<DecorationId, DecorationStyle>,
    applied: HashMap<(String, DecorationId), Vec<DecorationSpan>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `text` as a visible document identified by `resource`.
    pub fn open(&mut self, resource: impl Into<String>, text: &str) {
        self.documents
            .insert(resource.into(), text.lines().map(str::to_string).collect());
    }

    /// Close a document, dropping its recorded decorations.
    pub fn close(&mut self, resource: &str) {
        self.documents.remove(resource);
        self.selections.remove(resource);
        self.applied.retain(|(applied_resource, _), _| applied_resource != resource);
    }

    pub fn set_selection(&mut self, resource: impl Into<String>, start: u32, end: u32) {
        self.selections.insert(resource.into(), (start, end));
    }

    /// The style a live handle was created with.
    pub fn style(&self, id: DecorationId) -> Option<&DecorationStyle> {
        self.styles.get(&id)
    }

    /// Number of live (not yet disposed) decoration handles.
    pub fn live_decoration_count(&self) -> usize {
        self.styles.len()
    }

    /// Spans currently applied to `resource` under `id`.
    pub fn decorations(&self, resource: &str, id: DecorationId) -> &[DecorationSpan] {
        self.applied
            .get(&(resource.to_string(), id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All spans applied to `resource`, across every live handle, with the
    /// style each was created with.
    pub fn spans_with_style(&self, resource: &str) -> Vec<(&DecorationStyle, &DecorationSpan)> {
        let mut spans = Vec::new();
        for ((applied_resource, id), applied) in &self.applied {
            if applied_resource != resource {
                continue;
            }
            let Some(style) = self.styles.get(id) else {
                continue;
            };
            spans.extend(applied.iter().map(|span| (style, span)));
        }
        spans
    }
}

impl EditorHost for InMemoryHost {
    fn visible_resources(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    fn line(&self, resource: &str, line: u32) -> Option<LineInfo> {
        let text = self.documents.get(resource)?.get(line as usize)?;
        let length = text.chars().count() as u32;
        let first_non_whitespace = text
            .chars()
            .position(|ch| !ch.is_whitespace())
            .map(|index| index as u32)
            .unwrap_or(length);
        Some(LineInfo {
            range: Range::on_line(line, 0, length),
            first_non_whitespace,
        })
    }

    fn selection(&self, resource: &str) -> Option<(u32, u32)> {
        if !self.documents.contains_key(resource) {
            return None;
        }
        Some(self.selections.get(resource).copied().unwrap_or((0, 0)))
    }

    fn create_decoration(&mut self, style: DecorationStyle) -> DecorationId {
        let id = DecorationId(self.next_decoration);
        self.next_decoration += 1;
        self.styles.insert(id, style);
        id
    }

    fn dispose_decoration(&mut self, id: DecorationId) {
        self.styles.remove(&id);
        self.applied.retain(|(_, applied_id), _| *applied_id != id);
    }

    fn set_decorations(&mut self, resource: &str, id: DecorationId, spans: Vec<DecorationSpan>) {
        if !self.styles.contains_key(&id) || !self.documents.contains_key(resource) {
            return;
        }
        let key = (resource.to_string(), id);
        if spans.is_empty() {
            self.applied.remove(&key);
        } else {
            self.applied.insert(key, spans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Position;

    #[test]
    fn line_info_reports_first_non_whitespace() {
        let mut host = InMemoryHost::new();
        host.open("/a.ts", "fn main() {\n    let x = 1;\n\t\n");

        let info = host.line("/a.ts", 0).unwrap();
        assert_eq!(info.first_non_whitespace, 0);
        assert_eq!(info.range.start, Position::new(0, 0));

        let info = host.line("/a.ts", 1).unwrap();
        assert_eq!(info.first_non_whitespace, 4);
        assert_eq!(info.range.end, Position::new(1, 14));

        // Whitespace-only line: first non-whitespace equals the line end.
        let info = host.line("/a.ts", 2).unwrap();
        assert_eq!(info.first_non_whitespace, info.range.end.character);

        assert!(host.line("/a.ts", 9).is_none());
        assert!(host.line("/missing.ts", 0).is_none());
    }

    #[test]
    fn disposal_removes_spans_everywhere() {
        let mut host = InMemoryHost::new();
        host.open("/a.ts", "one\ntwo\n");
        host.open("/b.ts", "three\n");

        let id = host.create_decoration(DecorationStyle::Background {
            color: "#fff".into(),
        });
        host.set_decorations("/a.ts", id, vec![DecorationSpan::plain(Range::on_line(0, 0, 3))]);
        host.set_decorations("/b.ts", id, vec![DecorationSpan::plain(Range::on_line(0, 0, 5))]);
        assert_eq!(host.decorations("/a.ts", id).len(), 1);

        host.dispose_decoration(id);
        assert!(host.decorations("/a.ts", id).is_empty());
        assert!(host.decorations("/b.ts", id).is_empty());
        assert_eq!(host.live_decoration_count(), 0);

        // Disposing again is a no-op.
        host.dispose_decoration(id);
    }

    #[test]
    fn selection_defaults_to_line_zero() {
        let mut host = InMemoryHost::new();
        host.open("/a.ts", "one\ntwo\n");
        assert_eq!(host.selection("/a.ts"), Some((0, 0)));
        host.set_selection("/a.ts", 1, 1);
        assert_eq!(host.selection("/a.ts"), Some((1, 1)));
        assert_eq!(host.selection("/missing.ts"), None);
    }
}

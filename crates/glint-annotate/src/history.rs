use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use glint_core::Location;

use crate::config::{AnnotateConfig, ConfigSource};
use crate::editor::{DecorationId, DecorationSpan, DecorationStyle, EditorHost};

/// Command identifier the hover's clear affordance invokes.
pub const CLEAR_LINE_HISTORY_COMMAND: &str = "glint.clearLineHistory";

/// Per-line output history rendered as inline annotations.
///
/// For every (resource, line) with observed output, keeps the outputs
/// most-recent-first and renders one annotation per tracked line on every
/// visible surface: inline text equal to the newest entry, hover listing all
/// entries oldest-to-newest plus a clear-this-line link.
#[derive(Debug, Default)]
pub struct LineHistoryDecorator {
    map: HashMap<String, BTreeMap<u32, Vec<String>>>,
    decoration: Option<(DecorationId, DecorationStyle)>,
}

impl LineHistoryDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` as the newest output observed at `location` and
    /// re-render. A no-op when history is disabled.
    pub fn log(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        location: &Location,
        text: &str,
    ) {
        let config = config.current();
        if !config.line_history.enabled {
            return;
        }

        self.map
            .entry(location.path.clone())
            .or_default()
            .entry(location.line)
            .or_default()
            .insert(0, text.to_string());
        self.update_decorations(host, &config);
    }

    /// Drop all history and re-render empty everywhere.
    pub fn clear(&mut self, host: &mut dyn EditorHost, config: &dyn ConfigSource) {
        self.map.clear();
        let config = config.current();
        self.update_decorations(host, &config);
    }

    /// The clear command: scoped to `line` when given, otherwise to the
    /// surface's current selection bounds.
    ///
    /// If the resource has no history at all, or the scoped range removes
    /// nothing, the entire store is cleared instead.
    pub fn clear_command(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        resource: &str,
        line: Option<u32>,
    ) {
        if !self.map.contains_key(resource) {
            return self.clear(host, config);
        }
        let (first, last) = match line {
            Some(line) => (line, line),
            None => match host.selection(resource) {
                Some(bounds) => bounds,
                None => return,
            },
        };
        self.clear_lines(host, config, resource, first, last);
    }

    /// Remove history for `first..=last` within one resource.
    ///
    /// When nothing in that range had history, falls back to clearing the
    /// entire store.
    pub fn clear_lines(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        resource: &str,
        first: u32,
        last: u32,
    ) {
        let Some(lines) = self.map.get_mut(resource) else {
            return self.clear(host, config);
        };

        let mut removed = false;
        for line in first..=last {
            removed |= lines.remove(&line).is_some();
        }

        if removed {
            let config = config.current();
            self.update_decorations(host, &config);
        } else {
            tracing::debug!(resource, first, last, "scoped clear matched nothing; clearing all");
            self.clear(host, config);
        }
    }

    /// A document changed: its line-to-content assumptions no longer hold,
    /// so its entire history entry is dropped.
    pub fn document_changed(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        resource: &str,
    ) {
        self.map.remove(resource);
        let config = config.current();
        self.update_decorations(host, &config);
    }

    /// The recorded history for a line, most-recent-first.
    pub fn history(&self, resource: &str, line: u32) -> Option<&[String]> {
        self.map
            .get(resource)
            .and_then(|lines| lines.get(&line))
            .map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of lines currently carrying history, across all resources.
    pub fn tracked_line_count(&self) -> usize {
        self.map.values().map(BTreeMap::len).sum()
    }

    /// Release the rendering handle on teardown.
    pub fn dispose(&mut self, host: &mut dyn EditorHost) {
        if let Some((id, _)) = self.decoration.take() {
            host.dispose_decoration(id);
        }
    }

    /// The decoration handle for the current style, recreating it when the
    /// configured color or margin changed since the last render.
    fn ensure_decoration(
        &mut self,
        host: &mut dyn EditorHost,
        config: &AnnotateConfig,
    ) -> DecorationId {
        let style = DecorationStyle::AfterText {
            color: config.line_history.color.clone(),
            margin_px: config.editor_font_size,
        };
        match &self.decoration {
            Some((id, current)) if *current == style => *id,
            _ => {
                if let Some((old, _)) = self.decoration.take() {
                    host.dispose_decoration(old);
                }
                let id = host.create_decoration(style.clone());
                self.decoration = Some((id, style));
                id
            }
        }
    }

    fn update_decorations(&mut self, host: &mut dyn EditorHost, config: &AnnotateConfig) {
        let id = self.ensure_decoration(host, config);
        for resource in host.visible_resources() {
            let Some(lines) = self.map.get(&resource) else {
                host.set_decorations(&resource, id, Vec::new());
                continue;
            };

            let mut spans = Vec::new();
            for (&line, entries) in lines {
                let Some(info) = host.line(&resource, line) else {
                    continue;
                };
                spans.push(DecorationSpan {
                    range: info.range,
                    after_text: entries.first().cloned(),
                    hover_markdown: Some(hover_markdown(line, entries)),
                });
            }
            host.set_decorations(&resource, id, spans);
        }
    }
}

/// Hover content for one line: entries oldest-to-newest, then the clear link.
fn hover_markdown(line: u32, entries: &[String]) -> String {
    let mut hover = String::new();
    for entry in entries.iter().rev() {
        let _ = writeln!(hover, "* {entry}");
    }
    let _ = write!(
        hover,
        "[Clear line](command:{CLEAR_LINE_HISTORY_COMMAND}?{{\"line\":{line}}})"
    );
    hover
}

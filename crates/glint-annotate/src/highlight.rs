use std::time::Instant;

use glint_core::{Location, Range};

use crate::config::{ConfigSource, HighlightConfig};
use crate::editor::{DecorationSpan, DecorationStyle, EditorHost};

/// One transient execution highlight.
///
/// Identity is the (document, range) pair; at most one active highlight
/// exists for it at a time. Re-triggering escalates the intensity tier,
/// swaps the decoration for the tier's color and pushes the fade deadline
/// out. Disposal releases the decoration handle and is idempotent.
#[derive(Debug)]
struct Highlight {
    resource: String,
    range: Range,
    decoration: Option<crate::editor::DecorationId>,
    intensity: u32,
    fades_at: Instant,
}

impl Highlight {
    fn new(resource: &str, range: Range, now: Instant) -> Self {
        Self {
            resource: resource.to_string(),
            range,
            decoration: None,
            intensity: 0,
            fades_at: now,
        }
    }

    fn active(&self) -> bool {
        self.decoration.is_some()
    }

    fn matches(&self, resource: &str, range: &Range) -> bool {
        self.resource == resource && self.range == *range
    }

    fn trigger(&mut self, host: &mut dyn EditorHost, config: &HighlightConfig, now: Instant) {
        match self.decoration.take() {
            Some(old) => {
                host.dispose_decoration(old);
                self.intensity += 1;
            }
            None => self.intensity = 0,
        }

        let id = host.create_decoration(DecorationStyle::Background {
            color: config.color_for(self.intensity).to_string(),
        });
        host.set_decorations(&self.resource, id, vec![DecorationSpan::plain(self.range)]);
        self.decoration = Some(id);
        self.fades_at = now + config.fade();
    }

    fn dispose(&mut self, host: &mut dyn EditorHost) {
        if let Some(id) = self.decoration.take() {
            host.dispose_decoration(id);
        }
    }
}

/// Deduplicating, bounded pool of active highlights.
///
/// Fade timers are rendered as deadlines: the owner drives [`Highlighter::sweep`]
/// from its event loop, using [`Highlighter::next_fade`] to schedule the next
/// wakeup. Sweeping an already-faded highlight is a no-op.
#[derive(Debug, Default)]
pub struct Highlighter {
    highlights: Vec<Highlight>,
}

impl Highlighter {
    /// Trigger a highlight for the exact (document, range) pair.
    ///
    /// Re-triggers the active highlight for the pair if one exists;
    /// otherwise purges inactive entries, evicts the oldest surplus active
    /// entries beyond `config.maximum` (leaving room for exactly one more)
    /// and creates a fresh highlight. The configuration snapshot is supplied
    /// by the caller per call; nothing is cached here.
    pub fn highlight(
        &mut self,
        host: &mut dyn EditorHost,
        config: &HighlightConfig,
        resource: &str,
        range: Range,
        now: Instant,
    ) {
        if let Some(existing) = self
            .highlights
            .iter_mut()
            .find(|highlight| highlight.active() && highlight.matches(resource, &range))
        {
            existing.trigger(host, config, now);
            return;
        }

        self.highlights.retain(|highlight| highlight.active());
        while !self.highlights.is_empty() && self.highlights.len() >= config.maximum {
            let mut oldest = self.highlights.remove(0);
            tracing::debug!(resource = %oldest.resource, "evicting oldest highlight at capacity");
            oldest.dispose(host);
        }

        let mut highlight = Highlight::new(resource, range, now);
        highlight.trigger(host, config, now);
        self.highlights.push(highlight);
    }

    /// Release every highlight whose fade deadline has passed.
    pub fn sweep(&mut self, host: &mut dyn EditorHost, now: Instant) {
        for highlight in &mut self.highlights {
            if highlight.active() && highlight.fades_at <= now {
                highlight.dispose(host);
            }
        }
    }

    /// Earliest pending fade deadline among active highlights.
    pub fn next_fade(&self) -> Option<Instant> {
        self.highlights
            .iter()
            .filter(|highlight| highlight.active())
            .map(|highlight| highlight.fades_at)
            .min()
    }

    pub fn active_count(&self) -> usize {
        self.highlights
            .iter()
            .filter(|highlight| highlight.active())
            .count()
    }

    /// Intensity of the active highlight for the pair, if any.
    pub fn intensity(&self, resource: &str, range: &Range) -> Option<u32> {
        self.highlights
            .iter()
            .find(|highlight| highlight.active() && highlight.matches(resource, range))
            .map(|highlight| highlight.intensity)
    }

    /// Release everything, e.g. on teardown.
    pub fn dispose_all(&mut self, host: &mut dyn EditorHost) {
        for highlight in &mut self.highlights {
            highlight.dispose(host);
        }
        self.highlights.clear();
    }
}

/// Maps a logical location onto visible surfaces and delegates to the pool.
#[derive(Debug, Default)]
pub struct ExecutionHighlighter {
    pool: Highlighter,
}

impl ExecutionHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &Highlighter {
        &self.pool
    }

    /// Highlight `location` on every visible surface showing its resource.
    ///
    /// The highlighted range starts at the line's first non-whitespace
    /// character; a whitespace-only line keeps its full range. A no-op when
    /// disabled or when no visible surface shows the resource.
    pub fn highlight(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        location: &Location,
        now: Instant,
    ) {
        let config = config.current();
        if !config.highlight.enabled {
            return;
        }

        let mut ranges = Vec::new();
        for resource in host.visible_resources() {
            if resource != location.path {
                continue;
            }
            let Some(info) = host.line(&resource, location.line) else {
                continue;
            };
            let mut range = info.range;
            if info.first_non_whitespace != range.end.character {
                range.start.character = info.first_non_whitespace;
            }
            ranges.push(range);
        }

        for range in ranges {
            self.pool
                .highlight(host, &config.highlight, &location.path, range, now);
        }
    }

    pub fn sweep(&mut self, host: &mut dyn EditorHost, now: Instant) {
        self.pool.sweep(host, now);
    }

    pub fn next_fade(&self) -> Option<Instant> {
        self.pool.next_fade()
    }

    pub fn dispose(&mut self, host: &mut dyn EditorHost) {
        self.pool.dispose_all(host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnotateConfig;
    use crate::memory::InMemoryHost;
    use std::time::Duration;

    fn host_with(resource: &str, text: &str) -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.open(resource, text);
        host
    }

    fn config_with_palette(colors: &[&str]) -> HighlightConfig {
        HighlightConfig {
            colors: colors.iter().map(|color| color.to_string()).collect(),
            ..HighlightConfig::default()
        }
    }

    fn background_color<'h>(host: &'h InMemoryHost, resource: &str) -> Option<&'h str> {
        host.spans_with_style(resource)
            .into_iter()
            .find_map(|(style, _)| match style {
                DecorationStyle::Background { color } => Some(color.as_str()),
                _ => None,
            })
    }

    #[test]
    fn retrigger_escalates_through_the_palette() {
        let mut host = host_with("/a.ts", "line one\n");
        let config = config_with_palette(&["#0", "#1", "#2"]);
        let mut pool = Highlighter::default();
        let now = Instant::now();
        let range = Range::on_line(0, 0, 8);

        pool.highlight(&mut host, &config, "/a.ts", range, now);
        assert_eq!(pool.intensity("/a.ts", &range), Some(0));
        assert_eq!(background_color(&host, "/a.ts"), Some("#0"));

        pool.highlight(&mut host, &config, "/a.ts", range, now);
        assert_eq!(pool.intensity("/a.ts", &range), Some(1));
        assert_eq!(background_color(&host, "/a.ts"), Some("#1"));

        for _ in 0..5 {
            pool.highlight(&mut host, &config, "/a.ts", range, now);
        }
        // Saturates at the last tier.
        assert_eq!(pool.intensity("/a.ts", &range), Some(6));
        assert_eq!(background_color(&host, "/a.ts"), Some("#2"));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn capacity_evicts_the_oldest_active_entries() {
        let mut host = host_with("/a.ts", "0\n1\n2\n3\n4\n");
        let config = HighlightConfig {
            maximum: 3,
            ..HighlightConfig::default()
        };
        let mut pool = Highlighter::default();
        let now = Instant::now();

        for line in 0..3 {
            pool.highlight(&mut host, &config, "/a.ts", Range::on_line(line, 0, 1), now);
        }
        assert_eq!(pool.active_count(), 3);

        pool.highlight(&mut host, &config, "/a.ts", Range::on_line(3, 0, 1), now);
        assert_eq!(pool.active_count(), 3);
        // The oldest (line 0) was disposed; newer ones survive.
        assert!(pool.intensity("/a.ts", &Range::on_line(0, 0, 1)).is_none());
        assert!(pool.intensity("/a.ts", &Range::on_line(3, 0, 1)).is_some());
        assert_eq!(host.live_decoration_count(), 3);
    }

    #[test]
    fn sweep_releases_elapsed_highlights() {
        let mut host = host_with("/a.ts", "line\n");
        let config = HighlightConfig {
            fade_ms: 100,
            ..HighlightConfig::default()
        };
        let mut pool = Highlighter::default();
        let now = Instant::now();
        let range = Range::on_line(0, 0, 4);

        pool.highlight(&mut host, &config, "/a.ts", range, now);
        assert_eq!(pool.next_fade(), Some(now + Duration::from_millis(100)));

        // Before the deadline: nothing happens.
        pool.sweep(&mut host, now + Duration::from_millis(50));
        assert_eq!(pool.active_count(), 1);

        pool.sweep(&mut host, now + Duration::from_millis(100));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(host.live_decoration_count(), 0);
        assert_eq!(pool.next_fade(), None);

        // Sweeping again is a no-op.
        pool.sweep(&mut host, now + Duration::from_millis(200));
    }

    #[test]
    fn retrigger_extends_the_fade_deadline() {
        let mut host = host_with("/a.ts", "line\n");
        let config = HighlightConfig {
            fade_ms: 100,
            ..HighlightConfig::default()
        };
        let mut pool = Highlighter::default();
        let now = Instant::now();
        let range = Range::on_line(0, 0, 4);

        pool.highlight(&mut host, &config, "/a.ts", range, now);
        pool.highlight(
            &mut host,
            &config,
            "/a.ts",
            range,
            now + Duration::from_millis(80),
        );

        pool.sweep(&mut host, now + Duration::from_millis(120));
        assert_eq!(pool.active_count(), 1, "re-trigger replaced the deadline");
        pool.sweep(&mut host, now + Duration::from_millis(180));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn highlight_starts_at_first_non_whitespace() {
        let mut host = host_with("/a.ts", "    indented();\n");
        let mut highlighter = ExecutionHighlighter::new();
        let config = AnnotateConfig::default();

        highlighter.highlight(
            &mut host,
            &config,
            &Location::new("/a.ts", 0),
            Instant::now(),
        );

        let spans = host.spans_with_style("/a.ts");
        assert_eq!(spans.len(), 1);
        let range = spans[0].1.range;
        assert_eq!(range.start.character, 4);
        assert_eq!(range.end.character, 15);
    }

    #[test]
    fn whitespace_only_line_keeps_its_full_range() {
        let mut host = host_with("/a.ts", "   \n");
        let mut highlighter = ExecutionHighlighter::new();
        let config = AnnotateConfig::default();

        highlighter.highlight(
            &mut host,
            &config,
            &Location::new("/a.ts", 0),
            Instant::now(),
        );

        let spans = host.spans_with_style("/a.ts");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].1.range.start.character, 0);
    }

    #[test]
    fn disabled_or_invisible_resources_are_no_ops() {
        let mut host = host_with("/a.ts", "line\n");
        let mut highlighter = ExecutionHighlighter::new();

        let disabled = AnnotateConfig {
            highlight: HighlightConfig {
                enabled: false,
                ..HighlightConfig::default()
            },
            ..AnnotateConfig::default()
        };
        highlighter.highlight(
            &mut host,
            &disabled,
            &Location::new("/a.ts", 0),
            Instant::now(),
        );
        assert_eq!(host.live_decoration_count(), 0);

        let config = AnnotateConfig::default();
        highlighter.highlight(
            &mut host,
            &config,
            &Location::new("/not-open.ts", 0),
            Instant::now(),
        );
        assert_eq!(host.live_decoration_count(), 0);
    }
}

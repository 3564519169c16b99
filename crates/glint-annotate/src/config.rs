use std::time::Duration;

use serde::Deserialize;

/// Fallback highlight color when the configured palette is empty.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#37afa9";

fn default_true() -> bool {
    true
}

fn default_maximum() -> usize {
    10
}

fn default_palette() -> Vec<String> {
    vec![DEFAULT_HIGHLIGHT_COLOR.to_string()]
}

fn default_fade_ms() -> u64 {
    1000
}

fn default_history_color() -> String {
    "gray".to_string()
}

fn default_font_size() -> u32 {
    20
}

/// Execution-highlight settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HighlightConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on concurrently active highlights.
    #[serde(default = "default_maximum")]
    pub maximum: usize,
    /// Ordered palette; re-highlighting escalates through it.
    #[serde(default = "default_palette")]
    pub colors: Vec<String>,
    /// How long a highlight stays before its decoration is released.
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            maximum: default_maximum(),
            colors: default_palette(),
            fade_ms: default_fade_ms(),
        }
    }
}

impl HighlightConfig {
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    /// Palette color for an intensity tier; saturates at the last tier.
    pub fn color_for(&self, intensity: u32) -> &str {
        let index = (intensity as usize).min(self.colors.len().saturating_sub(1));
        self.colors
            .get(index)
            .map(String::as_str)
            .unwrap_or(DEFAULT_HIGHLIGHT_COLOR)
    }
}

/// Line-history annotation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_history_color")]
    pub color: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            color: default_history_color(),
        }
    }
}

/// The full annotation configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnnotateConfig {
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub line_history: HistoryConfig,
    /// The host's current font size, used to size the inline margin.
    #[serde(default = "default_font_size")]
    pub editor_font_size: u32,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            highlight: HighlightConfig::default(),
            line_history: HistoryConfig::default(),
            editor_font_size: default_font_size(),
        }
    }
}

/// Live configuration seam: queried for a fresh snapshot on every operation,
/// so configuration changes take effect on the next triggered annotation.
pub trait ConfigSource {
    fn current(&self) -> AnnotateConfig;
}

/// A fixed configuration, for tests and headless runs.
impl ConfigSource for AnnotateConfig {
    fn current(&self) -> AnnotateConfig {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AnnotateConfig::default();
        assert!(config.highlight.enabled);
        assert_eq!(config.highlight.maximum, 10);
        assert_eq!(config.highlight.colors, vec![DEFAULT_HIGHLIGHT_COLOR]);
        assert_eq!(config.highlight.fade(), Duration::from_millis(1000));
        assert!(config.line_history.enabled);
        assert_eq!(config.line_history.color, "gray");
        assert_eq!(config.editor_font_size, 20);
    }

    #[test]
    fn partial_files_deserialize_with_defaults() {
        let config: AnnotateConfig = serde_json::from_str(
            r##"{ "highlight": { "colors": ["#f00", "#a00", "#500"], "fade-ms": 250 } }"##,
        )
        .unwrap();
        assert!(config.highlight.enabled);
        assert_eq!(config.highlight.colors.len(), 3);
        assert_eq!(config.highlight.fade(), Duration::from_millis(250));
        assert_eq!(config.line_history.color, "gray");
    }

    #[test]
    fn palette_escalates_and_saturates() {
        let mut config = HighlightConfig::default();
        config.colors = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(config.color_for(0), "a");
        assert_eq!(config.color_for(1), "b");
        assert_eq!(config.color_for(2), "c");
        assert_eq!(config.color_for(7), "c");

        config.colors.clear();
        assert_eq!(config.color_for(0), DEFAULT_HIGHLIGHT_COLOR);
    }
}

//! Token labels: the transform indicator and collision-free summon names.

use regex::RegexBuilder;

use crate::library::DEFAULT_SHAPE_NAME;

/// Glyph prefixed to transformed tokens' labels when the preference is on
pub const INDICATOR: &str = "🐾";

/// Remove any leading indicator glyphs and surrounding whitespace
pub fn strip_indicator(label: &str) -> &str {
    let mut rest = label.trim();
    while let Some(stripped) = rest.strip_prefix(INDICATOR) {
        rest = stripped.trim_start();
    }
    rest.trim_end()
}

/// Label for a transformed token: the bare name, with one indicator if enabled
pub fn decorate(base: &str, indicator: bool) -> String {
    let base = strip_indicator(base);
    if indicator && !base.is_empty() {
        format!("{} {}", INDICATOR, base)
    } else {
        base.to_string()
    }
}

/// Name a transform starts from: captured label, then the player's name, then the live label
pub fn base_name<'a>(captured: &'a str, player: Option<&'a str>, current: &'a str) -> &'a str {
    [Some(captured), player]
        .into_iter()
        .flatten()
        .map(strip_indicator)
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| strip_indicator(current))
}

/// First free name for `base` among `labels`: `Base`, then `Base 2`, `Base 3`, ...
///
/// An exact match counts as number 1. Numbers freed by deleted tokens may
/// be handed out again. A base that is empty once the indicator is gone
/// becomes the default shape name.
pub fn unique_name<'a>(base: &str, labels: impl IntoIterator<Item = &'a str>) -> String {
    let base = match strip_indicator(base) {
        "" => DEFAULT_SHAPE_NAME,
        base => base,
    };
    let pattern = format!(r"^{}(\s+([0-9]+))?$", regex::escape(base));
    let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return base.to_string();
    };

    let highest = labels
        .into_iter()
        .filter_map(|label| re.captures(label.trim()))
        .map(|caps| {
            caps.get(2)
                .and_then(|n| n.as_str().parse::<u64>().ok())
                .unwrap_or(1)
        })
        .max();

    match highest {
        None => base.to_string(),
        Some(n) => format!("{} {}", base, n.saturating_add(1)),
    }
}

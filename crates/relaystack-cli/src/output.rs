//! Formatted output helpers for CLI commands.

use std::collections::BTreeMap;

use relaystack_synth::engine::ResourceKind;

/// Width of the heading rule printed under command titles.
const RULE_WIDTH: usize = 35;

/// A heavy horizontal rule.
#[must_use]
pub fn rule() -> String {
    "\u{2550}".repeat(RULE_WIDTH)
}

/// `"1 resource"`, `"2 resources"`.
#[must_use]
pub fn count_noun(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// One line per resource kind, `type_name  count`, sorted by kind.
#[must_use]
pub fn format_summary(counts: &BTreeMap<ResourceKind, usize>) -> Vec<String> {
    let width = counts
        .keys()
        .map(|k| k.type_name().len())
        .max()
        .unwrap_or(0);
    counts
        .iter()
        .map(|(kind, count)| format!("{:<width$}  {count}", kind.type_name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_noun_pluralizes() {
        assert_eq!(count_noun(1, "resource"), "1 resource");
        assert_eq!(count_noun(0, "resource"), "0 resources");
        assert_eq!(count_noun(19, "resource"), "19 resources");
    }

    #[test]
    fn summary_is_aligned() {
        let mut counts = BTreeMap::new();
        let _ = counts.insert(ResourceKind::Vpc, 1);
        let _ = counts.insert(ResourceKind::Subnet, 2);
        let lines = format_summary(&counts);
        assert_eq!(lines, vec!["AWS::EC2::VPC     1", "AWS::EC2::Subnet  2"]);
    }

    #[test]
    fn rule_has_fixed_width() {
        assert_eq!(rule().chars().count(), 35);
    }
}

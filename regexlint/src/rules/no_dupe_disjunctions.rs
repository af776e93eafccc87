use bon::Builder;

use super::{has_capturing_group, remove_alternative, Rule, RuleContext};
use crate::analysis::{is_covered_node, is_equal_nodes, CoverOptions};

/// Disallow alternatives that can never be reached because an earlier alternative of the same
/// group already matches everything they match.
///
/// `a|b|a` is reported with a fix removing the last `a`. With
/// [`report_subsets`](NoDupeDisjunctionsBuilder::report_subsets), `[a-z]|x` is reported as well.
#[derive(Builder, Clone, Copy, Debug, Default)]
pub struct NoDupeDisjunctions {
    /// Also report alternatives that are a strict subset of an earlier one.
    #[builder(default)]
    report_subsets: bool,
}

impl Rule for NoDupeDisjunctions {
    fn name(&self) -> &'static str {
        "no-dupe-disjunctions"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        let flags = cx.flags();
        for node in cx.ast().walk() {
            let alternatives: Vec<_> = node.alternatives().collect();
            for (i, &alternative) in alternatives.iter().enumerate().skip(1) {
                let earlier = &alternatives[..i];
                if let Some(dupe) = earlier
                    .iter()
                    .find(|&&e| is_equal_nodes(e, alternative, flags, None))
                {
                    // Removing a group would renumber the groups after it
                    let fix = if has_capturing_group(alternative) {
                        None
                    } else {
                        remove_alternative(alternative)
                    };
                    cx.report(
                        alternative,
                        format!(
                            "Unexpected duplicate alternative. This alternative is the same as `{}` and can be removed.",
                            dupe.raw()
                        ),
                        fix,
                    );
                    continue;
                }
                if !self.report_subsets {
                    continue;
                }
                let normalizer = cx.normalizer();
                if let Some(superset) = earlier.iter().find(|&&e| {
                    is_covered_node(normalizer, e, alternative, CoverOptions::default())
                }) {
                    let message = format!(
                        "Unexpected useless alternative. This alternative is a subset of `{}` and can be removed.",
                        superset.raw()
                    );
                    cx.report(alternative, message, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::lint;

    #[test]
    fn duplicates() {
        let found = lint(NoDupeDisjunctions::default(), "/a|b|a/");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "a");
        assert_eq!(found[0].2.as_deref(), Some("a|b"));

        let found = lint(NoDupeDisjunctions::default(), "/(?:ab|[a-z]b|a[b])/");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "a[b]");
        assert_eq!(found[0].2.as_deref(), Some("(?:ab|[a-z]b)"));

        let found = lint(NoDupeDisjunctions::default(), "/(?=x|y|x)/");
        assert_eq!(found[0].2.as_deref(), Some("(?=x|y)"));

        assert!(lint(NoDupeDisjunctions::default(), "/a|b|c/").is_empty());
    }

    #[test]
    fn capturing_groups_are_kept() {
        let found = lint(NoDupeDisjunctions::default(), "/(a)|(a)/");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].2, None);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(lint(NoDupeDisjunctions::default(), "/a|A/i").len(), 1);
        assert!(lint(NoDupeDisjunctions::default(), "/a|A/").is_empty());
    }

    #[test]
    fn subsets() {
        let rule = NoDupeDisjunctions::builder().report_subsets(true).build();
        let found = lint(rule, "/[a-z]+|foo|\\d/");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "foo");
        assert_eq!(found[0].2, None);
        assert!(found[0].1.contains("[a-z]+"));

        assert!(lint(NoDupeDisjunctions::default(), "/[a-z]+|foo/").is_empty());
        // Only earlier alternatives hide later ones
        assert!(lint(rule, "/foo|[a-z]+/").is_empty());
    }
}

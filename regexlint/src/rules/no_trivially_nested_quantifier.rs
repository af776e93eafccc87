use super::{Fix, Rule, RuleContext};
use crate::{
    analysis::quant::{combine, Bounds},
    syntax::{NodeKind, NodeRef},
};

/// Disallow a quantified group that only contains another quantifier, e.g. `(?:a{2,3}){2}`, when
/// the two can be written as one (`a{4,6}`).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTriviallyNestedQuantifier;

/// The quantifier that is the only content of a non-capturing group.
fn sole_quantifier(group: NodeRef<'_>) -> Option<NodeRef<'_>> {
    let NodeKind::Group { .. } = group.kind() else {
        return None;
    };
    let mut alternatives = group.alternatives();
    let (Some(alternative), None) = (alternatives.next(), alternatives.next()) else {
        return None;
    };
    let mut elements = alternative.elements();
    match (elements.next(), elements.next()) {
        (Some(element), None) if matches!(element.kind(), NodeKind::Quantifier { .. }) => {
            Some(element)
        }
        _ => None,
    }
}

fn bounds(quantifier: NodeRef<'_>) -> Option<(Bounds, bool, NodeRef<'_>)> {
    match quantifier.kind() {
        NodeKind::Quantifier {
            min,
            max,
            greedy,
            element,
        } => Some((Bounds::new(*min, *max), *greedy, quantifier.get(*element))),
        _ => None,
    }
}

impl Rule for NoTriviallyNestedQuantifier {
    fn name(&self) -> &'static str {
        "no-trivially-nested-quantifier"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        for outer in cx.ast().walk() {
            let Some((outer_bounds, outer_greedy, group)) = bounds(outer) else {
                continue;
            };
            let Some(inner) = sole_quantifier(group) else {
                continue;
            };
            let Some((inner_bounds, inner_greedy, element)) = bounds(inner) else {
                continue;
            };
            // Lazy and greedy mix only when one of them has no choice to make
            if outer_greedy != inner_greedy && !outer_bounds.is_fixed() && !inner_bounds.is_fixed() {
                continue;
            }
            let Some(combined) = combine(inner_bounds, outer_bounds) else {
                continue;
            };

            // The side that has a choice decides
            let greedy = if outer_bounds.is_fixed() { inner_greedy } else { outer_greedy };
            let replacement = match combined {
                Bounds { min: 1, max: Some(1) } => element.raw().to_owned(),
                _ => format!("{}{combined}{}", element.raw(), if greedy { "" } else { "?" }),
            };
            cx.report(
                outer,
                format!("These nested quantifiers can be combined into `{replacement}`."),
                Some(Fix::new(outer.span(), replacement)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::lint;

    fn fixed(literal: &str) -> Vec<String> {
        lint(NoTriviallyNestedQuantifier, literal)
            .into_iter()
            .filter_map(|(.., fix)| fix)
            .collect()
    }

    #[test]
    fn combined() {
        assert_eq!(fixed("/(?:a{2,3}){2}/"), ["a{4,6}"]);
        assert_eq!(fixed("/(?:a+)*/"), ["a*"]);
        assert_eq!(fixed("/(?:a?)+/"), ["a*"]);
        assert_eq!(fixed("/(?:[ab]{3}){4}/"), ["[ab]{12}"]);
        assert_eq!(fixed("/(?:(?:ab){1})/"), Vec::<String>::new());
        assert_eq!(fixed("/(?:a{1}){1}/"), ["a"]);
    }

    #[test]
    fn not_combinable() {
        assert!(fixed("/(?:a{2}){0,2}/").is_empty());
        assert!(fixed("/(?:ab+)+/").is_empty());
        assert!(fixed("/(a+)*/").is_empty());
        assert!(fixed("/(?:a+|b)*/").is_empty());
    }

    #[test]
    fn laziness() {
        assert_eq!(fixed("/(?:a+?)*?/"), ["a*?"]);
        assert_eq!(fixed("/(?:a+?){2}/"), ["a{2,}?"]);
        assert_eq!(fixed("/(?:a{2}){3}?/"), ["a{6}"]);
        assert!(fixed("/(?:a+?)*/").is_empty());
    }
}

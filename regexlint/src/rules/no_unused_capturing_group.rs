use std::collections::HashSet;

use super::{Fix, Rule, RuleContext};
use crate::syntax::{NodeKind, NodeRef};

/// Disallow capturing groups that are neither referenced by a backreference nor used by the
/// surrounding code.
///
/// Usage outside of the pattern comes from [`RuleContext::captures()`]. Without it nothing is
/// reported, since every group may be used.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUnusedCapturingGroup;

/// `(` or `(?<name>`.
fn opening(group: NodeRef<'_>) -> usize {
    let raw = group.raw();
    match group.kind() {
        NodeKind::CapturingGroup { name: Some(_), .. } => raw.find('>').map_or(1, |i| i + 1),
        _ => 1,
    }
}

impl Rule for NoUnusedCapturingGroup {
    fn name(&self) -> &'static str {
        "no-unused-capturing-group"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        let Some(captures) = cx.captures() else {
            return;
        };
        if captures.is_all_used() {
            return;
        }
        let ast = cx.ast();
        let referenced: HashSet<_> = ast
            .walk()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Backreference {
                    resolved: Some(group),
                    ..
                } => Some(*group),
                _ => None,
            })
            .collect();

        let groups = ast.capturing_groups();
        for (i, &group) in groups.iter().enumerate() {
            let NodeKind::CapturingGroup { index, name, .. } = group.kind() else {
                unreachable!();
            };
            if referenced.contains(&group.id()) || captures.is_used(*index, name.as_deref()) {
                continue;
            }
            // Turning the group into a non-capturing one renumbers the groups after it
            let fix = (i + 1 == groups.len()).then(|| {
                let span = group.span();
                Fix::new(span.start..span.start + opening(group), "(?:")
            });
            let message = match name {
                Some(name) => format!("Capturing group '{name}' is defined but never used."),
                None => format!("Capturing group number {index} is defined but never used."),
            };
            cx.report(group, message, fix);
        }
    }
}

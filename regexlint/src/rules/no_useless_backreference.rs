use super::{Rule, RuleContext};
use crate::{analysis::backref::is_empty_backreference, syntax::NodeKind};

/// Disallow backreferences that always match the empty string, e.g. `\1(a)` or `(a)|\1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUselessBackreference;

impl Rule for NoUselessBackreference {
    fn name(&self) -> &'static str {
        "no-useless-backreference"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        for node in cx.ast().walk() {
            let NodeKind::Backreference {
                resolved: Some(group),
                ..
            } = node.kind()
            else {
                continue;
            };
            if is_empty_backreference(node) {
                let group = node.get(*group);
                cx.report(
                    node,
                    format!(
                        "Backreference '{}' to group '{}' will always match the empty string.",
                        node.raw(),
                        group.raw()
                    ),
                    None,
                );
            }
        }
    }
}

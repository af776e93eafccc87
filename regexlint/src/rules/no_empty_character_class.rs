use super::{Rule, RuleContext};
use crate::{
    analysis::{classify, NodeCategory},
    charset::to_char_set,
    syntax::NodeKind,
};

/// Disallow character classes that match no character, e.g. `[]` or `[^\s\S]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEmptyCharacterClass;

impl Rule for NoEmptyCharacterClass {
    fn name(&self) -> &'static str {
        "no-empty-character-class"
    }

    fn check(&self, cx: &mut RuleContext<'_>) {
        for node in cx.ast().walk() {
            if !matches!(
                node.kind(),
                NodeKind::CharacterClass { .. } | NodeKind::ExpressionCharacterClass { .. }
            ) {
                continue;
            }
            // Nested classes are judged as part of the outermost one
            if node
                .parent()
                .is_some_and(|p| classify(p) == NodeCategory::CharacterLike)
            {
                continue;
            }
            if to_char_set(node, cx.flags()).is_some_and(|set| set.is_empty()) {
                cx.report(node, "This character class matches no characters.", None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::lint;

    fn empty(literal: &str) -> Vec<String> {
        lint(NoEmptyCharacterClass, literal)
            .into_iter()
            .map(|(raw, ..)| raw)
            .collect()
    }

    #[test]
    fn empty_classes() {
        assert_eq!(empty("/a[]b/"), ["[]"]);
        assert_eq!(empty(r"/[^\s\S]/"), [r"[^\s\S]"]);
        assert_eq!(empty(r"/[^\d\D]+/u"), [r"[^\d\D]"]);
        assert_eq!(empty("/[a&&b]/v"), ["[a&&b]"]);
        assert_eq!(empty("/[[]a]/v"), Vec::<String>::new());
        assert_eq!(empty("/[^]/"), Vec::<String>::new());
        assert_eq!(empty("/[a]/"), Vec::<String>::new());
    }
}

/*!
Static semantics of regex subexpressions.

Nodes are first mapped by a [`Normalizer`] onto [`CNode`]s, a small set of canonical shapes:
character sets, sequences, choices, lookarounds and optional repetitions. Structural differences
that do not change the matched language (`(?:a)` vs `a`, `a{2}` vs `aa`, `[aA]` vs `a` with `i`)
disappear in the process.

On top of that:
- [`is_equal_nodes()`]: whether two nodes match the same strings in the same way.
- [`is_covered_node()`]: whether one node matches every string another one does.
- [`reach`]: the characters a node consumes first, and the characters around a node.
- [`backref`]: backreferences that always match the empty string.
- [`quant`]: flattening nested quantifiers.

All checks are conservative. A `false` verdict can mean "could not tell".
*/
pub mod backref;
mod classify;
mod cover;
mod equal;
mod normalize;
pub mod quant;
pub mod reach;

pub use classify::{classify, NodeCategory};
pub use cover::{is_covered_node, CoverOptions};
pub use equal::{is_equal_nodes, ShortCircuit};
pub use normalize::{CNode, Normalizer};

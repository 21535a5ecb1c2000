/*!
`rill` models the procedural logic of a hardware design as a decision tree:
each process owns a root case (assignments plus nested switches) and a list
of edge-triggered synchronization rules. The centerpiece of the crate is a
structural cleanup pass which removes dead, redundant and degenerate parts
of that tree — constant-driven branch resolution, empty-branch pruning under
the `full`/`parallel` coverage claims, and single-branch inlining — repeated
to a fixpoint, without changing the behavior the tree describes.

The host owns everything around the tree: wire tables, process selection,
and the decision to discard a process once it has been cleaned down to
nothing.
*/
#![forbid(unsafe_code, missing_docs, missing_debug_implementations)]

pub mod clean;
pub mod proc;
pub mod sig;
pub mod util;

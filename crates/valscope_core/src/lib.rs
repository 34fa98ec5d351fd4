//! Type recognition and generic container access over debugger-inspected memory.

/// Type classification, layout recipes, and the dereference/access/iteration/comparison engines.
pub mod inspect;

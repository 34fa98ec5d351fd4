mod access;
mod bytes;
mod classify;
mod coerce;
mod compare;
mod deref;
mod error;
mod inspector;
mod iter;
mod memory;
mod options;
mod path;
mod recipe;
mod registry;
mod snapshot;
mod typename;
mod types;
mod value;

#[cfg(test)]
mod test_support;

/// Small-buffer storage mode.
pub use access::Storage;
/// Byte order of the inspected process.
pub use bytes::Endianness;
/// Uncached classification entry point.
pub use classify::classify_type;
/// Comparison operators and primitive comparison.
pub use compare::{CompareOp, compare_primitives};
/// Error and result aliases.
pub use error::{ErrorKind, InspectError, Result};
/// Engine entry point.
pub use inspector::Inspector;
/// Lazy iteration types.
pub use iter::{Item, Items};
/// Memory access trait and the captured-region implementation.
pub use memory::{Memory, Region, RegionMap, ResolvedAddr};
/// Traversal limits and target description.
pub use options::{InspectOptions, TargetInfo};
/// Member path parser types.
pub use path::{MemberPath, PathStep};
/// Classification output types.
pub use recipe::{Category, Classification, DequeIter, LayoutRecipe, Member};
/// Family registry types.
pub use registry::{BuildFn, FamilyPattern, RecipeContext, Registry};
/// Snapshot loading.
pub use snapshot::{Compression, Snapshot, Symbol, ZSTD_MAGIC, decode_bytes};
/// Type name normalization helpers.
pub use typename::{TemplateName, normalize_type_name, split_template};
/// Type model.
pub use types::{Field, TemplateArg, TypeDescriptor, TypeId, TypeKind, TypeTable};
/// Inspected values and operands.
pub use value::{InspectedValue, Location, Operand, Primitive};

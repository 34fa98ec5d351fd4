/// Type classification command.
pub mod classify;
/// Primitive coercion command.
pub mod coerce;
/// Comparison command.
pub mod compare;
/// Membership commands.
pub mod contains;
/// Dereference command.
pub mod deref;
/// Element lookup command.
pub mod getitem;
/// Container iteration command.
pub mod iter;
/// Length command.
pub mod len;
/// Symbol listing command.
pub mod symbols;
/// Shared argument and output helpers.
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_support;

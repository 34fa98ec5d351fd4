use std::fmt;

use crate::inspect::{InspectError, Result};

/// One parsed operation in a member path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Select a named member (base subobjects are searched transitively).
	Member(String),
	/// Select a fixed-array element by zero-based index.
	Index(usize),
}

/// Parsed member path such as `_M_impl._M_start` or `buckets[2].key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPath {
	/// Ordered sequence of path steps.
	pub steps: Vec<PathStep>,
}

impl MemberPath {
	/// Parse dotted member syntax with optional `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		if input.is_empty() {
			return Err(InspectError::InvalidMemberPath { path: input.to_owned() });
		}

		let bytes = input.as_bytes();
		let mut idx = 0_usize;
		let mut steps = Vec::new();

		while idx < bytes.len() {
			let start = idx;
			while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
				idx += 1;
			}

			if idx == start {
				return Err(InspectError::InvalidMemberPath { path: input.to_owned() });
			}

			steps.push(PathStep::Member(input[start..idx].to_owned()));

			while idx < bytes.len() && bytes[idx] == b'[' {
				idx += 1;
				let n_start = idx;
				while idx < bytes.len() && bytes[idx].is_ascii_digit() {
					idx += 1;
				}
				if idx == n_start || idx >= bytes.len() || bytes[idx] != b']' {
					return Err(InspectError::InvalidMemberPath { path: input.to_owned() });
				}

				let number = input[n_start..idx]
					.parse::<usize>()
					.map_err(|_| InspectError::InvalidMemberPath { path: input.to_owned() })?;
				steps.push(PathStep::Index(number));
				idx += 1;
			}

			if idx < bytes.len() {
				if bytes[idx] != b'.' {
					return Err(InspectError::InvalidMemberPath { path: input.to_owned() });
				}
				idx += 1;
				if idx >= bytes.len() {
					return Err(InspectError::InvalidMemberPath { path: input.to_owned() });
				}
			}
		}

		Ok(Self { steps })
	}
}

impl fmt::Display for MemberPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Member(name) if idx == 0 => write!(f, "{name}")?,
				PathStep::Member(name) => write!(f, ".{name}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

use std::sync::LazyLock;

use regex::Regex;

static QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:const|volatile)\b").expect("qualifier regex is valid"));
static INLINE_NAMESPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b__(?:8|cxx11)::").expect("namespace regex is valid"));
static PUNCT_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([<>,*&():\[\]])\s*").expect("punctuation regex is valid"));
static RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Template base name and top-level argument texts of a normalized type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateName<'a> {
	/// Name before the template argument list (the whole name for non-templates).
	pub base: &'a str,
	/// Top-level template argument texts.
	pub args: Vec<&'a str>,
}

/// Normalize a type name for family matching.
///
/// Drops cv-qualifiers, trailing references, and versioned inline namespaces,
/// then removes whitespace around punctuation and collapses remaining runs.
pub fn normalize_type_name(raw: &str) -> String {
	let stripped = QUALIFIERS.replace_all(raw, " ");
	let stripped = INLINE_NAMESPACES.replace_all(&stripped, "");
	let collapsed = RUNS.replace_all(stripped.trim(), " ");
	let tight = PUNCT_SPACE.replace_all(&collapsed, "$1");
	tight.trim_end_matches('&').trim().to_owned()
}

/// Split a normalized name into template base and top-level arguments.
///
/// Names where the argument list is followed by more text (nested member
/// types such as `std::vector<int>::iterator`) are treated as non-templates.
pub fn split_template(name: &str) -> TemplateName<'_> {
	let Some(open) = name.find('<') else {
		return TemplateName { base: name, args: Vec::new() };
	};

	let mut depth = 0_usize;
	let mut args = Vec::new();
	let mut arg_start = open + 1;

	for (idx, ch) in name.char_indices().skip_while(|(idx, _)| *idx < open) {
		match ch {
			'<' | '(' | '[' => depth += 1,
			'>' | ')' | ']' => {
				depth = depth.saturating_sub(1);
				if depth == 0 {
					if idx + 1 != name.len() {
						return TemplateName { base: name, args: Vec::new() };
					}
					let last = name[arg_start..idx].trim();
					if !last.is_empty() {
						args.push(last);
					}
					return TemplateName { base: &name[..open], args };
				}
			}
			',' if depth == 1 => {
				args.push(name[arg_start..idx].trim());
				arg_start = idx + 1;
			}
			_ => {}
		}
	}

	TemplateName { base: name, args: Vec::new() }
}

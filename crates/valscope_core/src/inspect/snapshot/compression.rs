use std::io::Read;

use crate::inspect::{InspectError, Result};

/// Inflated snapshot documents above this size are refused.
const MAX_SNAPSHOT_JSON: usize = 512 * 1024 * 1024;
/// Leading bytes of a zstd frame; compressed snapshots start with them.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// How a snapshot document was stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// The file is the JSON document itself.
	None,
	/// The JSON document sits inside a zstd frame.
	Zstd,
}

impl Compression {
	/// Label used in logs and `symbols` output.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Recover the JSON document from raw snapshot file contents.
///
/// Anything without the zstd magic is handed back untouched for the JSON parser to judge.
pub fn decode_bytes(raw: Vec<u8>) -> Result<(Compression, Vec<u8>)> {
	if !raw.starts_with(&ZSTD_MAGIC) {
		return Ok((Compression::None, raw));
	}
	let json = decode_zstd(&raw, MAX_SNAPSHOT_JSON)?;
	Ok((Compression::Zstd, json))
}

/// Inflate a zstd-framed document, failing once it grows past `limit` bytes.
pub(crate) fn decode_zstd(raw: &[u8], limit: usize) -> Result<Vec<u8>> {
	let decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut json = Vec::new();
	decoder.take(limit as u64 + 1).read_to_end(&mut json)?;
	if json.len() > limit {
		return Err(InspectError::DecompressedTooLarge { limit });
	}
	Ok(json)
}

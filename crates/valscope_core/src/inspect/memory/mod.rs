use std::borrow::Cow;

use crate::inspect::{InspectError, Result};

/// Byte-level read access to the inspected process.
///
/// Implementations return `None` for any range that is not fully readable.
/// Reads may block (remote targets) but never partially succeed.
pub trait Memory {
	/// Read exactly `len` bytes starting at `addr`.
	fn read_memory(&self, addr: u64, len: usize) -> Option<Cow<'_, [u8]>>;
}

impl<T: Memory + ?Sized> Memory for &T {
	fn read_memory(&self, addr: u64, len: usize) -> Option<Cow<'_, [u8]>> {
		(**self).read_memory(addr, len)
	}
}

/// One captured, contiguous range of process memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
	/// Process address of the first byte.
	pub start: u64,
	/// Captured bytes.
	pub bytes: Vec<u8>,
}

impl Region {
	/// Exclusive end address.
	pub fn end(&self) -> u64 {
		self.start.saturating_add(self.bytes.len() as u64)
	}
}

/// Result of mapping an address to a captured region.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAddr<'a> {
	/// Matched region.
	pub region: &'a Region,
	/// Byte offset of the address inside the region.
	pub byte_offset: usize,
}

impl<'a> ResolvedAddr<'a> {
	/// Return a bounded slice starting at `byte_offset`.
	pub fn slice_from(&self, len: usize) -> Option<&'a [u8]> {
		let start = self.byte_offset;
		let end = start.checked_add(len)?;
		self.region.bytes.get(start..end)
	}
}

/// Sorted range index over captured memory regions.
#[derive(Debug, Default, Clone)]
pub struct RegionMap {
	starts: Vec<u64>,
	regions: Vec<Region>,
}

impl RegionMap {
	/// Build an index, rejecting overlapping regions.
	pub fn new(mut regions: Vec<Region>) -> Result<Self> {
		regions.retain(|region| !region.bytes.is_empty());
		regions.sort_by_key(|region| region.start);

		for pair in regions.windows(2) {
			if pair[1].start < pair[0].end() {
				return Err(InspectError::OverlappingRegions { addr: pair[1].start });
			}
		}

		let starts = regions.iter().map(|region| region.start).collect();
		Ok(Self { starts, regions })
	}

	/// Build an index from `(address, bytes)` pairs.
	pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, Vec<u8>)>) -> Result<Self> {
		Self::new(pairs.into_iter().map(|(start, bytes)| Region { start, bytes }).collect())
	}

	/// Resolve an address to its containing region.
	pub fn resolve(&self, addr: u64) -> Option<ResolvedAddr<'_>> {
		let idx = self.starts.partition_point(|start| *start <= addr);
		if idx == 0 {
			return None;
		}

		let region = &self.regions[idx - 1];
		if addr >= region.end() {
			return None;
		}

		Some(ResolvedAddr {
			region,
			byte_offset: (addr - region.start) as usize,
		})
	}

	/// Return all regions in address order.
	pub fn regions(&self) -> &[Region] {
		&self.regions
	}

	/// Return number of regions.
	pub fn len(&self) -> usize {
		self.regions.len()
	}

	/// Return whether no memory was captured.
	pub fn is_empty(&self) -> bool {
		self.regions.is_empty()
	}
}

impl Memory for RegionMap {
	fn read_memory(&self, addr: u64, len: usize) -> Option<Cow<'_, [u8]>> {
		if addr == 0 {
			return None;
		}
		if len == 0 {
			return self.resolve(addr).map(|_| Cow::Borrowed(&[][..]));
		}

		let first = self.resolve(addr)?;
		if let Some(bytes) = first.slice_from(len) {
			return Some(Cow::Borrowed(bytes));
		}

		// Reads may straddle back-to-back regions.
		let mut out = Vec::with_capacity(len);
		let mut cursor = addr;
		while out.len() < len {
			let hit = self.resolve(cursor)?;
			let take = (hit.region.bytes.len() - hit.byte_offset).min(len - out.len());
			out.extend_from_slice(hit.slice_from(take)?);
			cursor = cursor.checked_add(take as u64)?;
		}
		Some(Cow::Owned(out))
	}
}

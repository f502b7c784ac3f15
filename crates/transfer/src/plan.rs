//! Chunk planning and destination keys

use std::path::Path;

use wheelhouse_errors::{Error, TransferError};
use wheelhouse_types::normalize_project_name;

/// Smallest chunk the planner will produce (5 MiB)
pub const BASE_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// One byte range of the source file, uploaded as one part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based
    pub part_number: u32,
    pub offset: u64,
    pub length: u64,
}

/// Split of a file of `total_size` bytes into parts
///
/// Chunk size grows with the square root of the file size and never drops
/// below the base size, so large files keep a low part count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub total_size: u64,
    pub chunk_size: u64,
    pub chunk_count: u32,
}

impl ChunkPlan {
    /// Plan chunks for `total_size` bytes with the given floor
    #[must_use]
    pub fn new(total_size: u64, base_chunk_size: u64) -> Self {
        let base = base_chunk_size.max(1);
        let scaled = (u128::from(base) * u128::from(total_size)).isqrt();
        let chunk_size = u64::try_from(scaled).unwrap_or(u64::MAX).max(base);
        let chunk_count = u32::try_from(total_size.div_ceil(chunk_size)).unwrap_or(u32::MAX);
        Self {
            total_size,
            chunk_size,
            chunk_count,
        }
    }

    /// Chunks in part-number order; the last one holds the remainder
    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.chunk_count).map(move |index| {
            let offset = u64::from(index) * self.chunk_size;
            Chunk {
                part_number: index + 1,
                offset,
                length: self.chunk_size.min(self.total_size - offset),
            }
        })
    }
}

/// Project prefix for an artifact file name
///
/// Leading sections (split on `.`, `-` and `_`) are joined with `_` until
/// the first integer section, then normalized. `None` when nothing is left.
#[must_use]
pub fn project_prefix(filename: &str) -> Option<String> {
    let sections: Vec<&str> = filename
        .split(['.', '-', '_'])
        .take_while(|section| section.parse::<u64>().is_err())
        .collect();
    let prefix = normalize_project_name(&sections.join("_"));
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Object key `{project}/{filename}` for a local artifact
///
/// # Errors
///
/// Returns `TransferError::InvalidFilename` when the path has no usable
/// file name or no project prefix can be derived from it.
pub fn destination_key(path: &Path) -> Result<String, Error> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TransferError::InvalidFilename {
            name: path.display().to_string(),
        })?;
    let prefix = project_prefix(filename).ok_or_else(|| TransferError::InvalidFilename {
        name: filename.to_string(),
    })?;
    Ok(format!("{prefix}/{filename}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_small_files_use_the_base_chunk() {
        let plan = ChunkPlan::new(1, BASE_CHUNK_SIZE);
        assert_eq!(plan.chunk_size, BASE_CHUNK_SIZE);
        assert_eq!(plan.chunk_count, 1);

        let plan = ChunkPlan::new(5 * MIB, BASE_CHUNK_SIZE);
        assert_eq!(plan.chunk_size, 5 * MIB);
        assert_eq!(plan.chunk_count, 1);
    }

    #[test]
    fn test_chunk_size_grows_with_square_root() {
        let plan = ChunkPlan::new(20 * MIB, BASE_CHUNK_SIZE);
        assert_eq!(plan.chunk_size, 10 * MIB);
        assert_eq!(plan.chunk_count, 2);

        let plan = ChunkPlan::new(100 * MIB, BASE_CHUNK_SIZE);
        assert_eq!(plan.chunk_size, 23_446_872);
        assert_eq!(plan.chunk_count, 5);
    }

    #[test]
    fn test_chunks_cover_the_file() {
        let plan = ChunkPlan::new(100 * MIB, BASE_CHUNK_SIZE);
        let chunks: Vec<Chunk> = plan.chunks().collect();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0].part_number, 1);
        assert_eq!(chunks[4].part_number, 5);
        assert_eq!(chunks[4].offset, 4 * 23_446_872);
        assert_eq!(chunks[4].length, 100 * MIB - 4 * 23_446_872);
        assert_eq!(chunks.iter().map(|c| c.length).sum::<u64>(), 100 * MIB);
    }

    #[test]
    fn test_tiny_base_splits_small_files() {
        let plan = ChunkPlan::new(10, 4);
        // floor(sqrt(40)) = 6
        assert_eq!(plan.chunk_size, 6);
        let lengths: Vec<u64> = plan.chunks().map(|c| c.length).collect();
        assert_eq!(lengths, vec![6, 4]);
    }

    #[test]
    fn test_project_prefix() {
        assert_eq!(project_prefix("package_two-0.0.1.tar.gz").as_deref(), Some("package-two"));
        assert_eq!(project_prefix("Package-One-1.2.3-py2.py3-none-any.whl").as_deref(), Some("package-one"));
        assert_eq!(project_prefix("tool.linux-x86_64.tar.gz").as_deref(), Some("tool-linux-x86"));
        assert_eq!(project_prefix("1.0.tar.gz"), None);
    }

    #[test]
    fn test_destination_key() {
        let key = destination_key(Path::new("/tmp/dist/package_two-0.0.1-py2.7.egg")).unwrap();
        assert_eq!(key, "package-two/package_two-0.0.1-py2.7.egg");

        assert!(matches!(
            destination_key(Path::new("/")),
            Err(Error::Transfer(TransferError::InvalidFilename { .. }))
        ));
    }
}

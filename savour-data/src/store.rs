//! Persisted embedding store file format.
//!
//! A store file starts with the 4-byte magic `SVEM` and a `u16` format
//! version, followed by a `bincode` payload holding the restaurant id list
//! and the parallel vector matrix. Reading is all-or-nothing: any header,
//! decoding or consistency failure rejects the whole file.

use std::io::{BufReader, BufWriter, Write};

use bincode::{deserialize_from, serialize_into};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use savour_core::{EmbeddingStore, EmbeddingStoreError, RestaurantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artefact::{create_file, open_file};

/// File identifier for persisted embedding stores.
pub const EMBEDDING_STORE_MAGIC: [u8; 4] = *b"SVEM";

/// Supported version of the embedding store format.
pub const EMBEDDING_STORE_VERSION: u16 = 1;

/// Payload stored after the header.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StorePayload {
    pub(crate) ids: Vec<String>,
    pub(crate) vectors: Vec<Vec<f32>>,
}

/// Error emitted when loading or validating a persisted embedding store.
#[derive(Debug, Error)]
pub enum EmbeddingFileError {
    /// The file could not be read.
    #[error("failed to read embedding store from {path}: {source}")]
    Io {
        /// Location of the store file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The header or payload could not be decoded.
    #[error("failed to decode embedding store from {path}: {source}")]
    Decode {
        /// Location of the store file.
        path: Utf8PathBuf,
        /// Decoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file did not start with the expected magic bytes.
    #[error("invalid embedding store magic in {path}: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Location of the store file.
        path: Utf8PathBuf,
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Sequence read from the file.
        found: [u8; 4],
    },
    /// The file uses an unsupported format version.
    #[error("unsupported embedding store version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Version present in the header.
        found: u16,
        /// Version supported by this binary.
        supported: u16,
    },
    /// The ids and vectors are inconsistent.
    #[error("embedding store at {path} is inconsistent: {source}")]
    Invalid {
        /// Location of the store file.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: EmbeddingStoreError,
    },
}

/// Error emitted when writing an embedding store to disk.
#[derive(Debug, Error)]
pub enum EmbeddingFileWriteError {
    /// Creating or flushing the file failed.
    #[error("failed to write embedding store to {path}: {source}")]
    Io {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The store could not be encoded.
    #[error("failed to encode embedding store for {path}: {source}")]
    Encode {
        /// Destination path.
        path: Utf8PathBuf,
        /// Encoder failure from `bincode`.
        #[source]
        source: bincode::Error,
    },
}

/// Persist `store` at `path`, creating parent directories as needed.
///
/// Entries are written sorted by restaurant id so identical stores produce
/// identical files. Existing files are truncated.
///
/// # Errors
/// Returns [`EmbeddingFileWriteError`] when the file cannot be created,
/// encoded or flushed.
pub fn write_embedding_store(
    path: &Utf8Path,
    store: &EmbeddingStore,
) -> Result<(), EmbeddingFileWriteError> {
    let io_err = |source| EmbeddingFileWriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let encode_err = |source| EmbeddingFileWriteError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let (ids, vectors) = store.clone().into_parts();
    let payload = StorePayload {
        ids: ids.iter().map(|id| id.as_str().to_owned()).collect(),
        vectors,
    };

    let file = create_file(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serialize_into(&mut writer, &EMBEDDING_STORE_MAGIC).map_err(encode_err)?;
    serialize_into(&mut writer, &EMBEDDING_STORE_VERSION).map_err(encode_err)?;
    serialize_into(&mut writer, &payload).map_err(encode_err)?;
    writer.flush().map_err(io_err)?;
    let file = writer
        .into_inner()
        .map_err(|err| io_err(err.into_error()))?;
    file.sync_all().map_err(io_err)?;
    info!(
        "wrote {} embeddings of {} dimensions to {path}",
        store.len(),
        store.dimensions()
    );
    Ok(())
}

/// Load and validate an embedding store from `path`.
///
/// # Errors
/// Returns [`EmbeddingFileError`] when the file is unreadable, carries the
/// wrong header, fails to decode, or holds ids and vectors that disagree.
pub fn read_embedding_store(path: &Utf8Path) -> Result<EmbeddingStore, EmbeddingFileError> {
    let decode_err = |source| EmbeddingFileError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file = open_file(path).map_err(|source| EmbeddingFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let magic: [u8; 4] = deserialize_from(&mut reader).map_err(decode_err)?;
    if magic != EMBEDDING_STORE_MAGIC {
        return Err(EmbeddingFileError::InvalidMagic {
            path: path.to_path_buf(),
            expected: EMBEDDING_STORE_MAGIC,
            found: magic,
        });
    }
    let version: u16 = deserialize_from(&mut reader).map_err(decode_err)?;
    if version != EMBEDDING_STORE_VERSION {
        return Err(EmbeddingFileError::UnsupportedVersion {
            found: version,
            supported: EMBEDDING_STORE_VERSION,
        });
    }
    let payload: StorePayload = deserialize_from(&mut reader).map_err(decode_err)?;

    let ids = payload.ids.into_iter().map(RestaurantId::new).collect();
    let store = EmbeddingStore::from_parts(ids, payload.vectors).map_err(|source| {
        EmbeddingFileError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!(
        "loaded {} embeddings of {} dimensions from {path}",
        store.len(),
        store.dimensions()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use savour_core::Embedding;
    use tempfile::TempDir;

    #[fixture]
    fn temp_store_path() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("embeddings.svem"))
            .expect("utf8 temp path");
        (dir, path)
    }

    fn write_raw(path: &Utf8Path, magic: [u8; 4], version: u16, payload: &StorePayload) {
        let mut file = std::fs::File::create(path).expect("create raw store");
        serialize_into(&mut file, &magic).expect("write magic");
        serialize_into(&mut file, &version).expect("write version");
        serialize_into(&mut file, payload).expect("write payload");
    }

    #[rstest]
    fn written_store_reads_back(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        let store = EmbeddingStore::from_parts(
            vec![RestaurantId::new("b"), RestaurantId::new("a")],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .expect("valid store");
        write_embedding_store(&path, &store).expect("write store");

        let loaded = read_embedding_store(&path).expect("read store");
        assert_eq!(loaded, store);
        assert_eq!(
            loaded.get(&RestaurantId::new("a")).map(Embedding::as_slice),
            Some(&[1.0, 0.0][..])
        );
    }

    #[rstest]
    fn rejects_wrong_magic(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        let payload = StorePayload {
            ids: Vec::new(),
            vectors: Vec::new(),
        };
        write_raw(&path, *b"NOPE", EMBEDDING_STORE_VERSION, &payload);
        let err = read_embedding_store(&path).expect_err("bad magic");
        assert!(matches!(
            err,
            EmbeddingFileError::InvalidMagic { found, .. } if found == *b"NOPE"
        ));
    }

    #[rstest]
    fn rejects_unknown_version(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        let payload = StorePayload {
            ids: Vec::new(),
            vectors: Vec::new(),
        };
        write_raw(&path, EMBEDDING_STORE_MAGIC, 99, &payload);
        let err = read_embedding_store(&path).expect_err("bad version");
        assert!(matches!(
            err,
            EmbeddingFileError::UnsupportedVersion {
                found: 99,
                supported: EMBEDDING_STORE_VERSION
            }
        ));
    }

    #[rstest]
    fn rejects_count_mismatch(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        let payload = StorePayload {
            ids: vec!["a".to_owned(), "b".to_owned()],
            vectors: vec![vec![1.0]],
        };
        write_raw(&path, EMBEDDING_STORE_MAGIC, EMBEDDING_STORE_VERSION, &payload);
        let err = read_embedding_store(&path).expect_err("count mismatch");
        assert!(matches!(
            err,
            EmbeddingFileError::Invalid {
                source: EmbeddingStoreError::CountMismatch { ids: 2, vectors: 1 },
                ..
            }
        ));
    }

    #[rstest]
    fn rejects_truncated_payload(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        let mut file = std::fs::File::create(&path).expect("create raw store");
        serialize_into(&mut file, &EMBEDDING_STORE_MAGIC).expect("write magic");
        drop(file);
        let err = read_embedding_store(&path).expect_err("truncated");
        assert!(matches!(err, EmbeddingFileError::Decode { .. }));
    }

    #[rstest]
    fn missing_file_is_an_io_error(temp_store_path: (TempDir, Utf8PathBuf)) {
        let (_dir, path) = temp_store_path;
        assert!(matches!(
            read_embedding_store(&path),
            Err(EmbeddingFileError::Io { .. })
        ));
    }
}

//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Bumped whenever the on-disk encoding of any table changes.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const MAX_DBS: u32 = 8;

pub(crate) type Table = Database<Bytes, Bytes>;

/// Wraps the LMDB environment and all database handles.
///
/// Implements both [`diploma_store::TemplateStore`] and
/// [`diploma_store::RequestStore`], so one handle serves the whole service.
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Table,
    pub(crate) templates_db: Table,
    pub(crate) requests_db: Table,
    pub(crate) signatures_db: Table,
    pub(crate) attestations_db: Table,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and the data
        // files are not modified by anything else while it is open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let meta_db: Table = env.create_database(&mut wtxn, Some("meta"))?;
        let templates_db: Table = env.create_database(&mut wtxn, Some("templates"))?;
        let requests_db: Table = env.create_database(&mut wtxn, Some("requests"))?;
        let signatures_db: Table = env.create_database(&mut wtxn, Some("signatures"))?;
        let attestations_db: Table = env.create_database(&mut wtxn, Some("attestations"))?;

        let stored: Option<[u8; 4]> = meta_db
            .get(&wtxn, SCHEMA_VERSION_KEY)?
            .map(|bytes: &[u8]| {
                bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(format!(
                        "schema version has {} bytes, expected 4",
                        bytes.len()
                    ))
                })
            })
            .transpose()?;
        match stored.map(u32::from_le_bytes) {
            None => {
                meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())?;
            }
            Some(version) if version > SCHEMA_VERSION => {
                return Err(LmdbError::Incompatible(format!(
                    "database schema {version} is newer than supported {SCHEMA_VERSION}"
                )));
            }
            Some(_) => {}
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            meta_db,
            templates_db,
            requests_db,
            signatures_db,
            attestations_db,
        })
    }

    /// Schema version recorded in the environment.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let bytes = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)?
            .ok_or_else(|| LmdbError::NotFound("meta key 'schema_version'".into()))?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LmdbError::Serialization("schema version is not 4 bytes".into()))?;
        Ok(u32::from_le_bytes(arr))
    }

    /// Flush dirty pages to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}

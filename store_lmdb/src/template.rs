//! LMDB implementation of TemplateStore.

use diploma_store::{StoreError, TemplateStore};
use diploma_types::{DiplomaTemplate, TemplateId};

use crate::{LmdbError, LmdbStore};

impl TemplateStore for LmdbStore {
    fn put_template(&self, template: &DiplomaTemplate) -> Result<(), StoreError> {
        let bytes = bincode::serialize(template).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.templates_db
            .put(&mut wtxn, template.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_template(&self, id: &TemplateId) -> Result<DiplomaTemplate, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .templates_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("template {id}")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn template_exists(&self, id: &TemplateId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .templates_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn iter_templates(&self) -> Result<Vec<DiplomaTemplate>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut templates = Vec::new();
        for item in self.templates_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, bytes) = item.map_err(LmdbError::from)?;
            templates.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(templates)
    }

    fn template_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.templates_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

//! Template storage trait.

use crate::StoreError;
use diploma_types::{DiplomaTemplate, TemplateId};

/// Trait for diploma template storage.
pub trait TemplateStore: Send + Sync {
    fn put_template(&self, template: &DiplomaTemplate) -> Result<(), StoreError>;
    fn get_template(&self, id: &TemplateId) -> Result<DiplomaTemplate, StoreError>;
    fn template_exists(&self, id: &TemplateId) -> Result<bool, StoreError>;
    fn iter_templates(&self) -> Result<Vec<DiplomaTemplate>, StoreError>;

    /// Count templates without keeping the result set around.
    fn template_count(&self) -> Result<u64, StoreError> {
        self.iter_templates().map(|v| v.len() as u64)
    }
}

//! Diploma templates (name, level, field of study).

use serde::{Deserialize, Serialize};

use crate::{TemplateId, Timestamp};

/// A diploma template that requests refer to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: Option<String>,
    /// Licence, Master, Doctorat, ...
    pub level: String,
    /// Field of study.
    pub field: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

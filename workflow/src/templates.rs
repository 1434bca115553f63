//! Diploma template registry.

use std::cmp::Reverse;

use diploma_store::DiplomaStore;
use diploma_types::{DiplomaTemplate, TemplateId};

use crate::event::WorkflowEvent;
use crate::{DiplomaWorkflow, WorkflowError};

/// Input for a new template.
#[derive(Clone, Debug, Default)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub level: String,
    pub field: String,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

fn required(value: &str, field: &str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

impl<S: DiplomaStore> DiplomaWorkflow<S> {
    pub fn create_template(&self, new: NewTemplate) -> Result<DiplomaTemplate, WorkflowError> {
        let now = self.now();
        let template = DiplomaTemplate {
            id: TemplateId::generate(),
            name: required(&new.name, "name")?,
            description: new
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            level: required(&new.level, "level")?,
            field: required(&new.field, "field")?,
            is_active: new.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.store.put_template(&template)?;
        tracing::info!(template_id = %template.id, name = %template.name, "template created");
        self.emit(WorkflowEvent::TemplateCreated {
            template_id: template.id,
        });
        Ok(template)
    }

    /// Active templates, newest first.
    pub fn list_active_templates(&self) -> Result<Vec<DiplomaTemplate>, WorkflowError> {
        let mut templates: Vec<_> = self
            .store
            .iter_templates()?
            .into_iter()
            .filter(|t| t.is_active)
            .collect();
        templates.sort_by_key(|t| Reverse(t.created_at));
        Ok(templates)
    }

    pub fn get_template(&self, id: &TemplateId) -> Result<DiplomaTemplate, WorkflowError> {
        Ok(self.store.get_template(id)?)
    }
}

//! Editing and filling sessions
//!
//! [`EditorSession`] holds at most one draft form at a time:
//! `NoForm -> Drafting -> Saved | Discarded -> NoForm`. A checkpoint saves
//! and keeps drafting. [`ResponseSession`] fills in one form against the
//! repository's stored response.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::binder::ResponseBinder;
use crate::error::{CoreError, Result};
use crate::models::{Datum, FieldValue, FormDefinition, ResponseRecord};
use crate::registry::FieldType;
use crate::store::{FieldUpdate, FormBuilder, FormRepository, Persistence, SaveOutcome};

/// State of an editor session
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    /// Nothing open
    NoForm,

    /// A draft is being edited
    Drafting(FormDefinition),
}

/// How a draft left the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Draft was persisted
    Saved {
        /// Form as stored
        form: FormDefinition,
        /// Whether it was new
        outcome: SaveOutcome,
    },

    /// Draft was dropped without saving
    Discarded {
        /// Id of the dropped draft
        form_id: String,
    },
}

/// Single-draft form editor
pub struct EditorSession<'r, P: Persistence> {
    repository: &'r FormRepository<P>,
    builder: FormBuilder,
    state: EditorState,
}

impl<'r, P: Persistence> EditorSession<'r, P> {
    /// Create an idle session
    pub fn new(repository: &'r FormRepository<P>, builder: FormBuilder) -> Self {
        EditorSession {
            repository,
            builder,
            state: EditorState::NoForm,
        }
    }

    /// Current state
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The draft, if one is open
    pub fn draft(&self) -> Option<&FormDefinition> {
        match &self.state {
            EditorState::Drafting(form) => Some(form),
            EditorState::NoForm => None,
        }
    }

    /// Start drafting a new form
    pub fn create(&mut self) -> Result<&FormDefinition> {
        self.expect_idle("create")?;
        let form = self.builder.new_form();
        debug!("Drafting new form {}", form.id);
        self.state = EditorState::Drafting(form);
        self.current("create")
    }

    /// Start drafting a copy of a stored form
    pub fn edit(&mut self, form_id: &str) -> Result<&FormDefinition> {
        self.expect_idle("edit")?;
        let form = self
            .repository
            .form(form_id)?
            .ok_or_else(|| CoreError::NotFound(format!("form {}", form_id)))?;
        debug!("Drafting stored form {} (revision {})", form.id, form.meta.revision);
        self.state = EditorState::Drafting(form);
        self.current("edit")
    }

    /// Append a field to the draft
    pub fn add_field(&mut self, field_type: FieldType) -> Result<&FormDefinition> {
        self.apply("add_field", |builder, form| builder.add_field(form, field_type))
    }

    /// Merge `update` into a draft field
    pub fn update_field(&mut self, field_id: &str, update: &FieldUpdate) -> Result<&FormDefinition> {
        self.apply("update_field", |builder, form| builder.update_field(form, field_id, update))
    }

    /// Remove a draft field
    pub fn remove_field(&mut self, field_id: &str) -> Result<&FormDefinition> {
        self.apply("remove_field", |builder, form| builder.remove_field(form, field_id))
    }

    /// Rename the draft
    pub fn rename(&mut self, name: &str) -> Result<&FormDefinition> {
        self.apply("rename", |builder, form| builder.rename(form, name))
    }

    /// Change the draft description
    pub fn set_description(&mut self, description: Option<String>) -> Result<&FormDefinition> {
        self.apply("set_description", move |builder, form| builder.describe(form, description))
    }

    /// Persist the draft and close it.
    ///
    /// On a validation failure the draft stays open and unchanged.
    pub fn save(&mut self) -> Result<SessionOutcome> {
        let (form, outcome) = self.persist("save")?;
        self.state = EditorState::NoForm;
        Ok(SessionOutcome::Saved { form, outcome })
    }

    /// Persist the draft and keep editing the stored copy
    pub fn checkpoint(&mut self) -> Result<&FormDefinition> {
        let (form, _) = self.persist("checkpoint")?;
        self.state = EditorState::Drafting(form);
        self.current("checkpoint")
    }

    /// Drop the draft without saving
    pub fn discard(&mut self) -> Result<SessionOutcome> {
        match std::mem::replace(&mut self.state, EditorState::NoForm) {
            EditorState::Drafting(form) => {
                debug!("Discarded draft {}", form.id);
                Ok(SessionOutcome::Discarded { form_id: form.id })
            }
            EditorState::NoForm => Err(no_draft("discard")),
        }
    }

    fn persist(&self, operation: &str) -> Result<(FormDefinition, SaveOutcome)> {
        let draft = self.draft().ok_or_else(|| no_draft(operation))?;
        self.repository.save_form(draft)
    }

    fn apply<F>(&mut self, operation: &str, edit: F) -> Result<&FormDefinition>
    where
        F: FnOnce(&FormBuilder, &FormDefinition) -> FormDefinition,
    {
        let next = match &self.state {
            EditorState::Drafting(form) => edit(&self.builder, form),
            EditorState::NoForm => return Err(no_draft(operation)),
        };
        self.state = EditorState::Drafting(next);
        self.current(operation)
    }

    fn expect_idle(&self, operation: &str) -> Result<()> {
        match &self.state {
            EditorState::NoForm => Ok(()),
            EditorState::Drafting(form) => Err(CoreError::InvalidStateTransition(format!(
                "cannot {} while drafting form {}",
                operation, form.id
            ))),
        }
    }

    fn current(&self, operation: &str) -> Result<&FormDefinition> {
        self.draft().ok_or_else(|| no_draft(operation))
    }
}

fn no_draft(operation: &str) -> CoreError {
    CoreError::InvalidStateTransition(format!("cannot {} without an open draft", operation))
}

/// Filling session for one form
pub struct ResponseSession<'r, P: Persistence> {
    repository: &'r FormRepository<P>,
    binder: ResponseBinder,
    form: FormDefinition,
    values: HashMap<String, FieldValue>,
    orphaned: Vec<Datum>,
}

impl<'r, P: Persistence> ResponseSession<'r, P> {
    /// Open `form_id` for filling.
    ///
    /// Values come from the stored response read against the current form,
    /// or from the field defaults when there is none.
    pub fn open(repository: &'r FormRepository<P>, form_id: &str) -> Result<Self> {
        let form = repository
            .form(form_id)?
            .ok_or_else(|| CoreError::NotFound(format!("form {}", form_id)))?;
        let binder = ResponseBinder::new(repository.config().binding.clone());

        let (values, orphaned) = match repository.response(form_id)? {
            Some(existing) => {
                let reconciled = binder.reconcile(&existing, &form);
                if reconciled.form_changed {
                    info!("Form {} changed since its response was saved", form_id);
                }
                for error in &reconciled.invalid {
                    warn!("Stored answer no longer valid: {}", error);
                }
                // Stored answers are authoritative; defaults only seed a new response
                let mut values = reconciled.values();
                for field in &form.fields {
                    values.entry(field.id.clone()).or_insert(FieldValue::Empty);
                }
                (values, reconciled.orphaned)
            }
            None => {
                let defaults = form
                    .fields
                    .iter()
                    .filter_map(|f| f.default_value.clone().map(|v| (f.id.clone(), v)))
                    .collect();
                (defaults, Vec::new())
            }
        };

        Ok(ResponseSession {
            repository,
            binder,
            form,
            values,
            orphaned,
        })
    }

    /// Form being filled
    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    /// Current value of a field
    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Answers kept for fields that no longer exist
    pub fn orphaned(&self) -> &[Datum] {
        &self.orphaned
    }

    /// Set the raw value of a field
    pub fn set_value(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<()> {
        if !self.form.has_field(field_id) {
            return Err(CoreError::NotFound(format!(
                "field {} in form {}",
                field_id, self.form.id
            )));
        }
        self.values.insert(field_id.to_string(), value.into());
        Ok(())
    }

    /// Clear a field, overriding any default
    pub fn clear_value(&mut self, field_id: &str) -> Result<()> {
        self.set_value(field_id, FieldValue::Empty)
    }

    /// Bind the current values and upsert the response.
    ///
    /// In strict mode any invalid answer fails the save. Otherwise invalid
    /// answers are left out and the rest is saved.
    pub fn save(&self) -> Result<ResponseRecord> {
        let bound = self.binder.bind_lenient(&self.form, &self.values);
        if !bound.is_valid() {
            if self.repository.config().binding.strict {
                return Err(CoreError::Coercion(bound.errors));
            }
            warn!(
                "Saving response to form {} without {} invalid answer(s)",
                self.form.id,
                bound.errors.len()
            );
        }

        let mut record = bound.record;
        record.orphaned = self.orphaned.clone();
        self.repository.save_response(&record)?;
        Ok(record)
    }
}

//! Form and response repository
//!
//! Upserts keyed by id over a [`Persistence`] collaborator. A save replaces
//! the stored entry with the same id in place, or appends when there is
//! none; it never merges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::models::{FormDefinition, ResponseRecord};
use crate::schema::{SchemaValidator, ValidationMode};
use crate::utils::{Clock, StringUtils, SystemClock};
use super::persistence::Persistence;

/// Whether a save added or replaced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Appended a new entry
    Inserted,

    /// Replaced the entry with the same id
    Replaced,
}

/// Listing entry for a stored form
#[derive(Debug, Clone, PartialEq)]
pub struct FormSummary {
    /// Form id
    pub id: String,

    /// Display name
    pub name: String,

    /// Description
    pub description: Option<String>,

    /// Number of fields
    pub field_count: usize,

    /// Creation time
    pub created: DateTime<Utc>,

    /// Whether the form is offered for filling
    pub is_active: bool,

    /// Whether a response has been saved
    pub has_response: bool,

    /// Number of non-empty answers in the saved response
    pub answered_count: usize,
}

/// Repository of forms and responses
pub struct FormRepository<P: Persistence> {
    store: P,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl<P: Persistence> FormRepository<P> {
    /// Create a repository with the wall clock
    pub fn new(store: P, config: CoreConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a repository with an explicit clock
    pub fn with_clock(store: P, config: CoreConfig, clock: Arc<dyn Clock>) -> Self {
        FormRepository { store, config, clock }
    }

    /// Underlying store
    pub fn store(&self) -> &P {
        &self.store
    }

    /// Repository configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// All stored forms, in stored order
    pub fn forms(&self) -> Result<Vec<FormDefinition>> {
        self.store.load(&self.config.storage.forms_key)
    }

    /// Get a form by id
    pub fn form(&self, form_id: &str) -> Result<Option<FormDefinition>> {
        Ok(self.forms()?.into_iter().find(|f| f.id == form_id))
    }

    /// Validate, stamp and upsert `form`.
    ///
    /// The stored copy gets `meta.modified` set to now, the next revision
    /// number, and the `meta.created` of any earlier version. A blank name
    /// is replaced with the configured placeholder.
    pub fn save_form(&self, form: &FormDefinition) -> Result<(FormDefinition, SaveOutcome)> {
        SchemaValidator::validate_form(form, ValidationMode::Final).map_err(CoreError::Schema)?;

        let key = &self.config.storage.forms_key;
        let mut forms: Vec<FormDefinition> = self.store.load(key)?;
        let existing = forms.iter().position(|f| f.id == form.id);

        let mut stamped = form.clone();
        if StringUtils::is_blank(&stamped.name) {
            stamped.name = self.config.editor.default_form_name.clone();
        }
        stamped.meta.modified = self.clock.now();

        let outcome = match existing {
            Some(index) => {
                stamped.meta.created = forms[index].meta.created;
                stamped.meta.revision = forms[index].meta.revision + 1;
                forms[index] = stamped.clone();
                SaveOutcome::Replaced
            }
            None => {
                stamped.meta.revision = 1;
                forms.push(stamped.clone());
                SaveOutcome::Inserted
            }
        };

        self.store.save(key, &forms)?;
        info!(
            "Saved form {} ({:?}, revision {}, {} field(s))",
            stamped.id,
            outcome,
            stamped.meta.revision,
            stamped.fields.len()
        );
        Ok((stamped, outcome))
    }

    /// Delete a form; returns whether it existed.
    ///
    /// Its response, if any, is left in place.
    pub fn delete_form(&self, form_id: &str) -> Result<bool> {
        let key = &self.config.storage.forms_key;
        let mut forms: Vec<FormDefinition> = self.store.load(key)?;
        let before = forms.len();
        forms.retain(|f| f.id != form_id);
        if forms.len() == before {
            return Ok(false);
        }
        self.store.save(key, &forms)?;
        info!("Deleted form {}", form_id);
        Ok(true)
    }

    /// All stored responses
    pub fn responses(&self) -> Result<Vec<ResponseRecord>> {
        self.store.load(&self.config.storage.responses_key)
    }

    /// Get the response to a form
    pub fn response(&self, form_id: &str) -> Result<Option<ResponseRecord>> {
        Ok(self.responses()?.into_iter().find(|r| r.form_id == form_id))
    }

    /// Whether a response to the form exists
    pub fn has_response(&self, form_id: &str) -> Result<bool> {
        Ok(self.response(form_id)?.is_some())
    }

    /// Upsert a response keyed by its form id
    pub fn save_response(&self, record: &ResponseRecord) -> Result<SaveOutcome> {
        let key = &self.config.storage.responses_key;
        let mut responses: Vec<ResponseRecord> = self.store.load(key)?;

        let outcome = match responses.iter().position(|r| r.form_id == record.form_id) {
            Some(index) => {
                responses[index] = record.clone();
                SaveOutcome::Replaced
            }
            None => {
                responses.push(record.clone());
                SaveOutcome::Inserted
            }
        };

        self.store.save(key, &responses)?;
        debug!(
            "Saved response to form {} ({:?}, {} datum(s), {} orphaned)",
            record.form_id,
            outcome,
            record.datums.len(),
            record.orphaned.len()
        );
        Ok(outcome)
    }

    /// Listing of every stored form with its response status
    pub fn summaries(&self) -> Result<Vec<FormSummary>> {
        let responses = self.responses()?;
        let summaries = self
            .forms()?
            .into_iter()
            .map(|form| {
                let response = responses.iter().find(|r| r.form_id == form.id);
                FormSummary {
                    name: form.display_name().to_string(),
                    field_count: form.fields.len(),
                    created: form.meta.created,
                    is_active: form.meta.is_active,
                    has_response: response.is_some(),
                    answered_count: response.map_or(0, ResponseRecord::answered_count),
                    description: form.description,
                    id: form.id,
                }
            })
            .collect();
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::models::{Datum, FieldDefinition, FormMeta};
    use crate::registry::FieldType;
    use crate::store::persistence::MemoryStore;
    use crate::utils::MockClock;

    fn fixed_clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        Arc::new(clock)
    }

    fn repository() -> FormRepository<MemoryStore> {
        FormRepository::with_clock(MemoryStore::new(), CoreConfig::testing(), fixed_clock())
    }

    fn form(id: &str) -> FormDefinition {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut form = FormDefinition::new(id, "Audit", FormMeta::new("user-1", created));
        form.fields.push(FieldDefinition::new("f1", FieldType::String, "Notes"));
        form
    }

    #[test]
    fn test_save_new_form_appends() {
        let repo = repository();
        repo.save_form(&form("a")).unwrap();

        let (saved, outcome) = repo.save_form(&form("b")).unwrap();
        assert_eq!(outcome, SaveOutcome::Inserted);
        assert_eq!(saved.meta.revision, 1);
        assert_eq!(repo.forms().unwrap().len(), 2);
    }

    #[test]
    fn test_save_existing_form_replaces_in_place() {
        let repo = repository();
        repo.save_form(&form("a")).unwrap();
        repo.save_form(&form("b")).unwrap();

        let mut edited = form("a");
        edited.name = "Audit v2".into();
        edited.meta.created = Utc::now();
        let (saved, outcome) = repo.save_form(&edited).unwrap();

        assert_eq!(outcome, SaveOutcome::Replaced);
        assert_eq!(saved.meta.revision, 2);
        assert_eq!(saved.meta.created, form("a").meta.created);

        let forms = repo.forms().unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].id, "a");
        assert_eq!(forms[0].name, "Audit v2");
        assert_eq!(forms[0].meta.modified, Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_form_is_not_saved() {
        let repo = repository();
        let mut bad = form("a");
        bad.fields.push(FieldDefinition::new("f2", FieldType::Select, "Pick"));

        assert!(matches!(repo.save_form(&bad), Err(CoreError::Schema(errors)) if errors.len() == 1));
        assert!(repo.forms().unwrap().is_empty());
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        let repo = repository();
        let mut unnamed = form("a");
        unnamed.name = " ".into();
        let (saved, _) = repo.save_form(&unnamed).unwrap();
        assert_eq!(saved.name, "Untitled Form");
    }

    #[test]
    fn test_delete_form() {
        let repo = repository();
        repo.save_form(&form("a")).unwrap();
        repo.save_response(&ResponseRecord::new("a")).unwrap();

        assert!(repo.delete_form("a").unwrap());
        assert!(!repo.delete_form("a").unwrap());
        assert!(repo.form("a").unwrap().is_none());
        assert!(repo.has_response("a").unwrap());
    }

    #[test]
    fn test_response_upsert_by_form_id() {
        let repo = repository();
        let mut record = ResponseRecord::new("a");
        record.datums.push(Datum::new("f1", "first"));
        assert_eq!(repo.save_response(&record).unwrap(), SaveOutcome::Inserted);
        assert_eq!(repo.save_response(&ResponseRecord::new("b")).unwrap(), SaveOutcome::Inserted);

        record.datums[0].value = "second".into();
        assert_eq!(repo.save_response(&record).unwrap(), SaveOutcome::Replaced);

        let responses = repo.responses().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].value("f1"), Some(&"second".into()));
    }

    #[test]
    fn test_summaries() {
        let repo = repository();
        repo.save_form(&form("a")).unwrap();
        repo.save_form(&form("b")).unwrap();
        let mut record = ResponseRecord::new("b");
        record.datums.push(Datum::new("f1", "hello"));
        repo.save_response(&record).unwrap();

        let summaries = repo.summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(!summaries[0].has_response);
        assert!(summaries[1].has_response);
        assert_eq!(summaries[1].answered_count, 1);
        assert_eq!(summaries[1].field_count, 1);
        assert_eq!(summaries[1].name, "Audit");
    }
}

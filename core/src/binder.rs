//! Response binding and reconciliation
//!
//! Binding maps raw per-field input onto a form's field list and produces a
//! response record, collecting every coercion failure instead of stopping at
//! the first. Reconciliation re-reads a stored response against the current
//! form, separating answers whose field no longer exists.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::coercion::{coerce, CoercionError};
use crate::config::BindingConfig;
use crate::models::{Datum, FieldValue, FormDefinition, ResponseRecord};

/// Result of a lenient bind: valid answers plus every failure
#[derive(Debug, Clone, PartialEq)]
pub struct BoundResponse {
    /// Record holding the answers that passed coercion
    pub record: ResponseRecord,

    /// Failures, in field order
    pub errors: Vec<CoercionError>,
}

impl BoundResponse {
    /// Whether every field bound cleanly
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A stored response read against the current form
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Answers to fields that still exist, in stored order
    pub datums: Vec<Datum>,

    /// Answers to fields that no longer exist
    pub orphaned: Vec<Datum>,

    /// Kept answers that no longer pass coercion for their field
    pub invalid: Vec<CoercionError>,

    /// The form's field list changed since the response was bound
    pub form_changed: bool,
}

impl Reconciliation {
    /// Field ids of the orphaned answers
    pub fn orphaned_ids(&self) -> Vec<&str> {
        self.orphaned.iter().map(|d| d.field_id.as_str()).collect()
    }

    /// Active answers keyed by field id
    pub fn values(&self) -> HashMap<String, FieldValue> {
        self.datums
            .iter()
            .map(|d| (d.field_id.clone(), d.value.clone()))
            .collect()
    }

    /// Fields of `form` with no active answer
    pub fn unanswered<'f>(&self, form: &'f FormDefinition) -> Vec<&'f str> {
        form.fields
            .iter()
            .filter(|f| !self.datums.iter().any(|d| d.field_id == f.id && !d.value.is_empty()))
            .map(|f| f.id.as_str())
            .collect()
    }
}

/// Response binder
#[derive(Debug, Clone, Default)]
pub struct ResponseBinder {
    config: BindingConfig,
}

impl ResponseBinder {
    /// Create a binder with the given configuration
    pub fn new(config: BindingConfig) -> Self {
        ResponseBinder { config }
    }

    /// Bind raw values to `form`, failing with every coercion error found
    pub fn bind_response(
        &self,
        form: &FormDefinition,
        raw: &HashMap<String, FieldValue>,
    ) -> Result<ResponseRecord, Vec<CoercionError>> {
        let bound = self.bind_lenient(form, raw);
        if bound.is_valid() {
            Ok(bound.record)
        } else {
            Err(bound.errors)
        }
    }

    /// Bind raw values to `form`, keeping the answers that pass.
    ///
    /// For each field the raw value is used if present, else the field's
    /// default, else nothing. Fields of an unsupported type keep their raw
    /// value untouched. Raw values for unknown field ids are ignored.
    pub fn bind_lenient(&self, form: &FormDefinition, raw: &HashMap<String, FieldValue>) -> BoundResponse {
        let mut datums = Vec::with_capacity(form.fields.len());
        let mut errors = Vec::new();

        for field in &form.fields {
            let input = raw
                .get(&field.id)
                .or(field.default_value.as_ref())
                .cloned()
                .unwrap_or_default();

            if field.field_type().is_none() {
                warn!(
                    "Field {} of form {} has unsupported type {}; keeping value as-is",
                    field.id,
                    form.id,
                    field.data_type.as_str()
                );
                if !input.is_empty() {
                    datums.push(Datum::new(field.id.clone(), input));
                }
                continue;
            }

            match coerce(field, &input) {
                Ok(value) => {
                    if !(self.config.drop_unanswered && value.is_empty()) {
                        datums.push(Datum::new(field.id.clone(), value));
                    }
                }
                Err(error) => errors.push(error),
            }
        }

        let unknown = raw.keys().filter(|id| !form.has_field(id)).count();
        if unknown > 0 {
            debug!("Ignored {} value(s) for fields not in form {}", unknown, form.id);
        }

        BoundResponse {
            record: ResponseRecord {
                form_id: form.id.clone(),
                datums,
                orphaned: Vec::new(),
                form_fingerprint: Some(form.fingerprint()),
            },
            errors,
        }
    }

    /// Read `existing` against the current `form`.
    ///
    /// Answers already orphaned stay orphaned even if a field with the same
    /// id reappears. Nothing is persisted here.
    pub fn reconcile(&self, existing: &ResponseRecord, form: &FormDefinition) -> Reconciliation {
        let mut datums = Vec::new();
        let mut orphaned = existing.orphaned.clone();
        let mut invalid = Vec::new();

        for datum in &existing.datums {
            let field = match form.field(&datum.field_id) {
                Some(field) => field,
                None => {
                    orphaned.push(datum.clone());
                    continue;
                }
            };

            // Stored blanks are unanswered fields, not invalid answers
            if field.field_type().is_none() || datum.value.is_empty() {
                datums.push(datum.clone());
                continue;
            }

            match coerce(field, &datum.value) {
                Ok(value) => datums.push(Datum::new(datum.field_id.clone(), value)),
                Err(error) => {
                    invalid.push(error);
                    datums.push(datum.clone());
                }
            }
        }

        if orphaned.len() > existing.orphaned.len() {
            info!(
                "Response to form {}: {} answer(s) orphaned by removed fields",
                form.id,
                orphaned.len() - existing.orphaned.len()
            );
        }

        let form_changed = existing
            .form_fingerprint
            .as_ref()
            .map_or(false, |fp| *fp != form.fingerprint());

        Reconciliation {
            datums,
            orphaned,
            invalid,
            form_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{Constraints, DataType, FieldDefinition, FormMeta};
    use crate::registry::FieldType;

    fn three_field_form() -> FormDefinition {
        let mut form = FormDefinition::new("form-1", "Site visit", FormMeta::new("user-1", Utc::now()));
        form.fields = vec![
            FieldDefinition::new("name", FieldType::String, "Name").required(),
            FieldDefinition::new("count", FieldType::Number, "Count")
                .with_constraints(Constraints::range(0.0, 100.0)),
            FieldDefinition::new("kind", FieldType::Select, "Kind")
                .with_options(["a", "b"])
                .required(),
        ];
        form
    }

    fn raw(pairs: &[(&str, FieldValue)]) -> HashMap<String, FieldValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_bind_valid_response() {
        let form = three_field_form();
        let record = ResponseBinder::default()
            .bind_response(&form, &raw(&[("name", "Ana".into()), ("count", "7".into()), ("kind", "b".into())]))
            .unwrap();

        assert_eq!(record.form_id, "form-1");
        assert_eq!(record.value("count"), Some(&FieldValue::Number(7.0)));
        assert_eq!(record.value("kind"), Some(&FieldValue::Choice("b".into())));
        assert_eq!(record.form_fingerprint, Some(form.fingerprint()));
    }

    #[test]
    fn test_single_missing_required_field() {
        let form = three_field_form();
        let errors = ResponseBinder::default()
            .bind_response(&form, &raw(&[("count", "7".into()), ("kind", "a".into())]))
            .unwrap_err();

        assert_eq!(errors, vec![CoercionError::RequiredFieldMissing { field_id: "name".into() }]);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let form = three_field_form();
        let errors = ResponseBinder::default()
            .bind_response(&form, &raw(&[("count", "500".into()), ("kind", "z".into())]))
            .unwrap_err();

        let ids: Vec<&str> = errors.iter().map(|e| e.field_id()).collect();
        assert_eq!(ids, vec!["name", "count", "kind"]);
    }

    #[test]
    fn test_lenient_keeps_valid_answers() {
        let form = three_field_form();
        let bound = ResponseBinder::default()
            .bind_lenient(&form, &raw(&[("name", "Ana".into()), ("count", "x".into()), ("kind", "a".into())]));

        assert!(!bound.is_valid());
        assert_eq!(bound.errors.len(), 1);
        assert_eq!(bound.record.datums.len(), 2);
        assert!(bound.record.value("count").is_none());
    }

    #[test]
    fn test_defaults_and_unanswered() {
        let mut form = three_field_form();
        form.fields[1] = form.fields[1].clone().with_default(3.0);
        let binder = ResponseBinder::default();

        let record = binder
            .bind_response(&form, &raw(&[("name", "Ana".into()), ("kind", "a".into())]))
            .unwrap();
        assert_eq!(record.value("count"), Some(&FieldValue::Number(3.0)));

        // An explicit empty value overrides the default
        let record = binder
            .bind_response(
                &form,
                &raw(&[("name", "Ana".into()), ("kind", "a".into()), ("count", FieldValue::Empty)]),
            )
            .unwrap();
        assert!(record.value("count").is_none());

        let keep_empty = ResponseBinder::new(BindingConfig {
            drop_unanswered: false,
            ..BindingConfig::default()
        });
        let record = keep_empty
            .bind_response(
                &form,
                &raw(&[("name", "Ana".into()), ("kind", "a".into()), ("count", FieldValue::Empty)]),
            )
            .unwrap();
        assert_eq!(record.value("count"), Some(&FieldValue::Empty));
    }

    #[test]
    fn test_unsupported_field_keeps_raw_value() {
        let mut form = three_field_form();
        let mut legacy = FieldDefinition::new("sig", FieldType::String, "Signature");
        legacy.data_type = DataType::Unsupported("signature".into());
        form.fields.push(legacy);

        let record = ResponseBinder::default()
            .bind_response(
                &form,
                &raw(&[("name", "Ana".into()), ("kind", "a".into()), ("sig", "scribble".into())]),
            )
            .unwrap();
        assert_eq!(record.value("sig"), Some(&FieldValue::from("scribble")));
    }

    #[test]
    fn test_reconcile_orphans_removed_fields() {
        let form = three_field_form();
        let mut existing = ResponseRecord::new("form-1");
        existing.datums = vec![
            Datum::new("name", "Ana"),
            Datum::new("gone", "stale"),
            Datum::new("count", 4.0),
        ];

        let reconciled = ResponseBinder::default().reconcile(&existing, &form);
        assert_eq!(reconciled.orphaned_ids(), vec!["gone"]);
        assert_eq!(reconciled.datums.len(), 2);
        assert!(reconciled.datums.iter().all(|d| d.field_id != "gone"));
        assert!(reconciled.invalid.is_empty());
        assert_eq!(reconciled.unanswered(&form), vec!["kind"]);
        assert!(!reconciled.form_changed);
    }

    #[test]
    fn test_reconcile_retyped_field() {
        let mut form = three_field_form();
        let mut existing = ResponseRecord::new("form-1");
        existing.datums = vec![Datum::new("count", 4.0), Datum::new("name", "12")];
        existing.form_fingerprint = Some(form.fingerprint());

        form.fields[1].data_type = FieldType::Date.into();
        form.fields[0].data_type = FieldType::Number.into();

        let reconciled = ResponseBinder::default().reconcile(&existing, &form);
        assert!(reconciled.form_changed);
        assert_eq!(reconciled.invalid.len(), 1);
        assert_eq!(reconciled.invalid[0].field_id(), "count");
        // Kept, untouched, for the user to fix
        assert_eq!(reconciled.values()["count"], FieldValue::Number(4.0));
        // Re-coerced into the new type
        assert_eq!(reconciled.values()["name"], FieldValue::Number(12.0));
    }

    #[test]
    fn test_reconcile_stored_blank_on_newly_required_field() {
        let mut form = three_field_form();
        let mut existing = ResponseRecord::new("form-1");
        existing.datums = vec![Datum::new("name", "Ana"), Datum::new("count", FieldValue::Empty)];

        form.fields[1].required = true;
        let reconciled = ResponseBinder::new(BindingConfig {
            drop_unanswered: false,
            ..BindingConfig::default()
        })
        .reconcile(&existing, &form);

        assert!(reconciled.invalid.is_empty());
        assert_eq!(reconciled.values()["count"], FieldValue::Empty);
        assert_eq!(reconciled.unanswered(&form), vec!["count", "kind"]);
    }

    #[test]
    fn test_orphans_are_never_resurrected() {
        let form = three_field_form();
        let mut existing = ResponseRecord::new("form-1");
        existing.orphaned = vec![Datum::new("name", "old answer")];

        let reconciled = ResponseBinder::default().reconcile(&existing, &form);
        assert_eq!(reconciled.orphaned_ids(), vec!["name"]);
        assert!(reconciled.datums.is_empty());
    }
}

//! Form edit operations
//!
//! Every operation takes a form snapshot and returns the next one; nothing is
//! mutated in place. Operations that change the form bump `meta.modified`,
//! operations that match nothing return the form unchanged.

use std::sync::Arc;

use crate::config::EditorConfig;
use crate::models::{Constraints, DiscussionItem, FieldConfig, FieldDefinition, FieldValue, FormDefinition, FormMeta};
use crate::registry::FieldType;
use crate::utils::{Clock, IdGenerator, StringUtils, SystemClock, UuidGenerator};

/// Partial update of a field definition.
///
/// Supplied keys replace the current value, omitted keys are kept. For
/// optional attributes `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    /// New data type
    pub data_type: Option<FieldType>,
    /// New label
    pub label: Option<String>,
    /// New description
    pub description: Option<Option<String>>,
    /// New required flag
    pub required: Option<bool>,
    /// New select options
    pub options: Option<Option<Vec<String>>>,
    /// New numeric constraints
    pub constraints: Option<Option<Constraints>>,
    /// New units
    pub units: Option<Option<String>>,
    /// New file type filter
    pub file_types: Option<Option<Vec<String>>>,
    /// New default value
    pub default_value: Option<Option<FieldValue>>,
}

impl FieldUpdate {
    /// Empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the data type
    pub fn data_type(mut self, data_type: FieldType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Change the label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Change the description
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Change the required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Replace the select options
    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = Some(Some(options));
        self
    }

    /// Replace the select options from comma-separated text
    pub fn options_text(self, text: &str) -> Self {
        self.options(StringUtils::split_list(text))
    }

    /// Replace the numeric constraints
    pub fn constraints(mut self, constraints: Option<Constraints>) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Replace the units
    pub fn units(mut self, units: Option<String>) -> Self {
        self.units = Some(units);
        self
    }

    /// Replace the file type filter
    pub fn file_types(mut self, file_types: Vec<String>) -> Self {
        self.file_types = Some(Some(file_types));
        self
    }

    /// Replace the file type filter from comma-separated text
    pub fn file_types_text(self, text: &str) -> Self {
        self.file_types(StringUtils::split_list(text))
    }

    /// Replace the default value
    pub fn default_value(mut self, value: Option<FieldValue>) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Whether the update changes nothing
    pub fn is_empty(&self) -> bool {
        *self == FieldUpdate::default()
    }

    fn apply(&self, field: &mut FieldDefinition) {
        if let Some(data_type) = self.data_type {
            field.data_type = data_type.into();
        }
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        if let Some(description) = &self.description {
            field.description = description.clone();
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        let FieldConfig {
            options,
            constraints,
            units,
            file_types,
        } = &mut field.config;
        if let Some(value) = &self.options {
            *options = value.clone();
        }
        if let Some(value) = self.constraints {
            *constraints = value;
        }
        if let Some(value) = &self.units {
            *units = value.clone();
        }
        if let Some(value) = &self.file_types {
            *file_types = value.clone();
        }
        if let Some(value) = &self.default_value {
            field.default_value = value.clone();
        }
    }
}

/// Pure edit operations on form definitions
#[derive(Clone)]
pub struct FormBuilder {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    config: EditorConfig,
}

impl std::fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBuilder").field("config", &self.config).finish()
    }
}

impl Default for FormBuilder {
    fn default() -> Self {
        FormBuilder::new(Arc::new(UuidGenerator), Arc::new(SystemClock), EditorConfig::default())
    }
}

impl FormBuilder {
    /// Create a builder over the given collaborators
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>, config: EditorConfig) -> Self {
        FormBuilder { ids, clock, config }
    }

    /// A new, empty form
    pub fn new_form(&self) -> FormDefinition {
        let mut meta = FormMeta::new(self.config.default_creator_id.clone(), self.clock.now());
        meta.is_active = self.config.default_active;
        let mut form = FormDefinition::new(self.ids.next_id(), self.config.default_form_name.clone(), meta);
        form.description = Some(String::new());
        form
    }

    /// Append a field of `field_type` with a generated id and default label
    pub fn add_field(&self, form: &FormDefinition, field_type: FieldType) -> FormDefinition {
        let mut field = FieldDefinition::new(
            self.ids.next_id(),
            field_type,
            format!("New {} field", field_type),
        );
        field.description = Some(String::new());

        let mut next = form.clone();
        next.fields.push(field);
        self.touch(next)
    }

    /// Merge `update` into the field with `field_id`
    pub fn update_field(&self, form: &FormDefinition, field_id: &str, update: &FieldUpdate) -> FormDefinition {
        let index = match form.position(field_id) {
            Some(index) if !update.is_empty() => index,
            _ => return form.clone(),
        };

        let mut next = form.clone();
        update.apply(&mut next.fields[index]);
        self.touch(next)
    }

    /// Remove the field with `field_id`
    pub fn remove_field(&self, form: &FormDefinition, field_id: &str) -> FormDefinition {
        if !form.has_field(field_id) {
            return form.clone();
        }

        let mut next = form.clone();
        next.fields.retain(|f| f.id != field_id);
        self.touch(next)
    }

    /// Change the form name
    pub fn rename(&self, form: &FormDefinition, name: impl Into<String>) -> FormDefinition {
        let mut next = form.clone();
        next.name = name.into();
        self.touch(next)
    }

    /// Change the form description
    pub fn describe(&self, form: &FormDefinition, description: Option<String>) -> FormDefinition {
        let mut next = form.clone();
        next.description = description;
        self.touch(next)
    }

    /// Change whether the form is offered for filling
    pub fn set_active(&self, form: &FormDefinition, is_active: bool) -> FormDefinition {
        let mut next = form.clone();
        next.meta.is_active = is_active;
        self.touch(next)
    }

    /// Append a comment to the form's discussion
    pub fn add_discussion(
        &self,
        form: &FormDefinition,
        creator_id: impl Into<String>,
        content: impl Into<String>,
    ) -> FormDefinition {
        let mut next = form.clone();
        next.discussion.push(DiscussionItem {
            creator_id: creator_id.into(),
            send_date: self.clock.now(),
            content: content.into(),
        });
        self.touch(next)
    }

    fn touch(&self, mut form: FormDefinition) -> FormDefinition {
        form.meta.modified = self.clock.now();
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use crate::utils::{MockClock, MockIdGenerator};

    fn ticking_builder() -> FormBuilder {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ticks = AtomicI64::new(0);
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(move || start + Duration::seconds(ticks.fetch_add(1, Ordering::SeqCst)));

        let counter = AtomicUsize::new(0);
        let mut ids = MockIdGenerator::new();
        ids.expect_next_id()
            .returning(move || format!("id-{}", counter.fetch_add(1, Ordering::SeqCst)));

        FormBuilder::new(Arc::new(ids), Arc::new(clock), EditorConfig::default())
    }

    #[test]
    fn test_new_form_defaults() {
        let builder = ticking_builder();
        let form = builder.new_form();

        assert_eq!(form.id, "id-0");
        assert_eq!(form.name, "Untitled Form");
        assert_eq!(form.meta.creator_id, "user-1");
        assert!(form.meta.is_active);
        assert!(form.fields.is_empty());
        assert_eq!(form.meta.created, form.meta.modified);
    }

    #[test]
    fn test_add_field() {
        let builder = ticking_builder();
        let form = builder.new_form();
        let next = builder.add_field(&form, FieldType::Measurement);

        assert!(form.fields.is_empty());
        assert_eq!(next.fields.len(), 1);
        let field = &next.fields[0];
        assert_eq!(field.id, "id-1");
        assert_eq!(field.label, "New measurement field");
        assert!(!field.required);
        assert!(field.config.constraints.is_none());
        assert!(next.meta.modified > form.meta.modified);
    }

    #[test]
    fn test_add_then_remove_restores_fields() {
        let builder = ticking_builder();
        let form = builder.add_field(&builder.new_form(), FieldType::String);
        let added = builder.add_field(&form, FieldType::Select);
        let new_id = added.fields.last().unwrap().id.clone();

        let removed = builder.remove_field(&added, &new_id);
        assert_eq!(removed.fields, form.fields);
        assert_ne!(removed.meta.modified, form.meta.modified);
    }

    #[test]
    fn test_update_field_is_shallow_merge() {
        let builder = ticking_builder();
        let form = builder.add_field(&builder.new_form(), FieldType::Select);
        let id = form.fields[0].id.clone();

        let form = builder.update_field(&form, &id, &FieldUpdate::new().options_text("a, b").required(true));
        let form = builder.update_field(&form, &id, &FieldUpdate::new().label("Colour"));

        let field = &form.fields[0];
        assert_eq!(field.label, "Colour");
        assert!(field.required);
        assert_eq!(field.config.options, Some(vec!["a".to_string(), "b".to_string()]));

        // Retyping keeps the options for a later switch back
        let form = builder.update_field(&form, &id, &FieldUpdate::new().data_type(FieldType::String));
        assert_eq!(form.fields[0].field_type(), Some(FieldType::String));
        assert!(form.fields[0].config.options.is_some());

        let form = builder.update_field(&form, &id, &FieldUpdate::new().description(None));
        assert!(form.fields[0].description.is_none());
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let builder = ticking_builder();
        let form = builder.add_field(&builder.new_form(), FieldType::Date);

        assert_eq!(builder.update_field(&form, "nope", &FieldUpdate::new().label("x")), form);
        assert_eq!(builder.remove_field(&form, "nope"), form);
        let id = form.fields[0].id.clone();
        assert_eq!(builder.update_field(&form, &id, &FieldUpdate::new()), form);
    }

    #[test]
    fn test_remove_keeps_order_and_ids() {
        let builder = ticking_builder();
        let mut form = builder.new_form();
        for field_type in [FieldType::String, FieldType::Number, FieldType::Boolean] {
            form = builder.add_field(&form, field_type);
        }
        let ids: Vec<String> = form.fields.iter().map(|f| f.id.clone()).collect();

        let form = builder.remove_field(&form, &ids[1]);
        assert_eq!(form.field_ids(), vec![ids[0].as_str(), ids[2].as_str()]);
    }

    #[test]
    fn test_metadata_operations() {
        let builder = ticking_builder();
        let form = builder.new_form();

        let renamed = builder.rename(&form, "Safety walk");
        assert_eq!(renamed.name, "Safety walk");
        assert!(renamed.meta.modified > form.meta.modified);
        assert_eq!(renamed.meta.created, form.meta.created);

        let described = builder.describe(&renamed, Some("Weekly".into()));
        assert_eq!(described.description.as_deref(), Some("Weekly"));

        let inactive = builder.set_active(&described, false);
        assert!(!inactive.meta.is_active);

        let discussed = builder.add_discussion(&inactive, "user-2", "Add a photo field?");
        assert_eq!(discussed.discussion.len(), 1);
        assert_eq!(discussed.discussion[0].creator_id, "user-2");
    }
}

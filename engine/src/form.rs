//! Form Renderer - schema interpretation into a render tree.
//!
//! A [`Form`] owns the value tree of one form instance. [`Form::render`]
//! walks the schema and produces one [`RenderNode`] per visible field;
//! every node carries a [`Binding`] that points back into the value tree.
//! Edits go through [`Form::set_value`], [`Form::append`] and
//! [`Form::remove`]; [`Form::submit`] validates the whole tree before
//! handing it to the caller.
//!
//! ## Array item keys
//!
//! Each array entry gets a key that survives removal of other entries, so a
//! renderer can keep per-entry UI state attached to the right entry. Keys
//! are unique within a form instance and reset with [`Form::reset`].

use crate::{
    defaults::{derive_defaults, derive_field_default},
    error::Result,
    path::{FieldPath, Segment},
    schema::{
        DateOptions, FieldDef, FieldKind, FieldOption, FieldType, FormSchema, Layout,
        NumberOptions, RadioOptions, SelectOptions,
    },
    validation::{FieldErrors, SchemaValidator},
    Error,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Shared attributes of a rendered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
}

impl FieldMeta {
    fn of(field: &FieldDef, name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: field.label.clone(),
            description: field.description.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
        }
    }
}

/// Connection between a rendered node and the form state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Dot-joined address of the value, e.g. `contacts.1.email`
    pub path: String,
    pub value: Option<Value>,
    pub error: Option<String>,
    pub disabled: bool,
}

/// Input control chosen for a leaf field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ControlVariant {
    /// Single-line input; `input_type` is one of text, email, password, tel, url
    TextInput { input_type: FieldType },
    TextArea,
    NumberInput {
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    DatePicker {
        min: Option<String>,
        max: Option<String>,
    },
    Select {
        options: Vec<FieldOption>,
        multiple: bool,
    },
    RadioGroup {
        options: Vec<FieldOption>,
        layout: Layout,
    },
    Checkbox,
    Switch,
}

/// One entry of a rendered array field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    /// Stable across removals of other entries
    pub key: u64,
    pub index: usize,
    pub node: RenderNode,
}

/// A node of the render tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderNode {
    Control {
        field: FieldMeta,
        variant: ControlVariant,
        binding: Binding,
    },
    /// Object field; children are its visible properties
    Group {
        field: FieldMeta,
        binding: Binding,
        children: Vec<RenderNode>,
    },
    /// Array field
    List {
        field: FieldMeta,
        binding: Binding,
        items: Vec<ListItem>,
        /// False once `max_items` entries exist
        can_append: bool,
        /// False while at or below `min_items` entries
        can_remove: bool,
    },
    /// Rendering delegated to the named component
    Custom {
        field: FieldMeta,
        component: String,
        binding: Binding,
    },
}

impl RenderNode {
    pub fn binding(&self) -> &Binding {
        match self {
            RenderNode::Control { binding, .. }
            | RenderNode::Group { binding, .. }
            | RenderNode::List { binding, .. }
            | RenderNode::Custom { binding, .. } => binding,
        }
    }

    pub fn field(&self) -> &FieldMeta {
        match self {
            RenderNode::Control { field, .. }
            | RenderNode::Group { field, .. }
            | RenderNode::List { field, .. }
            | RenderNode::Custom { field, .. } => field,
        }
    }
}

/// Result of [`Form::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation passed and the submit callback ran once
    Submitted,
    /// Validation failed; the callback did not run
    Invalid(FieldErrors),
}

/// A live form instance.
pub struct Form {
    schema: FormSchema,
    validator: SchemaValidator,
    defaults: Value,
    values: Value,
    errors: FieldErrors,
    item_keys: BTreeMap<FieldPath, Vec<u64>>,
    next_key: u64,
    submit_count: usize,
}

impl Form {
    /// Check the schema, compile its validator and derive initial values.
    pub fn new(schema: FormSchema) -> Result<Self> {
        schema.check()?;
        let validator = SchemaValidator::new(&schema)?;
        let defaults = derive_defaults(&schema);
        let mut form = Self {
            values: defaults.clone(),
            schema,
            validator,
            defaults,
            errors: FieldErrors::new(),
            item_keys: BTreeMap::new(),
            next_key: 0,
            submit_count: 0,
        };
        form.sync_item_keys();
        Ok(form)
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// The whole value tree.
    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn value(&self, path: &str) -> Result<Option<&Value>> {
        Ok(FieldPath::parse(path)?.get(&self.values))
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors.get(path)
    }

    /// Whether the values differ from the derived defaults.
    pub fn is_dirty(&self) -> bool {
        self.values != self.defaults
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count
    }

    /// Write one value and clear that path's error.
    pub fn set_value(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let field_path = FieldPath::parse(path)?;
        if field_path.is_root() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        field_path.set(&mut self.values, value.into())?;
        self.errors.remove(&field_path.to_string());
        self.sync_item_keys();
        tracing::debug!(path, "form value set");
        Ok(())
    }

    /// Add an entry to the array at `path`.
    ///
    /// The entry starts at the item field's derived default, or `""` when it
    /// has none. Returns `false` without changing anything when the array
    /// already holds `max_items` entries.
    pub fn append(&mut self, path: &str) -> Result<bool> {
        let field_path = FieldPath::parse(path)?;
        let (item_field, max_items) = match self.field_at(&field_path).map(|f| &f.kind) {
            Some(FieldKind::Array {
                item_field,
                max_items,
                ..
            }) => (&**item_field, *max_items),
            _ => return Err(Error::NotAnArray(path.to_string())),
        };
        let item = derive_field_default(item_field).unwrap_or_else(|| Value::String(String::new()));

        let len = self.array_len(&field_path);
        if max_items.is_some_and(|max| len >= max) {
            tracing::debug!(path, len, "append refused at capacity");
            return Ok(false);
        }

        field_path.index(len).set(&mut self.values, item)?;
        let key = self.fresh_key();
        self.item_keys.entry(field_path).or_default().push(key);
        self.sync_item_keys();
        Ok(true)
    }

    /// Remove the entry at `index` from the array at `path`.
    ///
    /// Surviving entries keep their item keys; only their positions shift.
    pub fn remove(&mut self, path: &str, index: usize) -> Result<()> {
        let field_path = FieldPath::parse(path)?;
        let items = field_path
            .get_mut(&mut self.values)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| Error::NotAnArray(path.to_string()))?;
        if index >= items.len() {
            return Err(Error::IndexOutOfBounds {
                path: path.to_string(),
                index,
                len: items.len(),
            });
        }
        items.remove(index);

        let depth = field_path.len();
        let mut remapped = BTreeMap::new();
        for (key_path, keys) in std::mem::take(&mut self.item_keys) {
            if key_path == field_path {
                let mut keys = keys;
                if index < keys.len() {
                    keys.remove(index);
                }
                remapped.insert(key_path, keys);
                continue;
            }
            if !key_path.starts_with(&field_path) {
                remapped.insert(key_path, keys);
                continue;
            }
            match key_path.segments().get(depth) {
                Some(Segment::Index(i)) if *i == index => {}
                Some(Segment::Index(i)) if *i > index => {
                    remapped.insert(key_path.with_segment(depth, Segment::Index(i - 1)), keys);
                }
                _ => {
                    remapped.insert(key_path, keys);
                }
            }
        }
        self.item_keys = remapped;

        let prefix = field_path.to_string();
        let stale: Vec<String> = self
            .errors
            .iter()
            .map(|(p, _)| p)
            .filter(|p| *p == prefix || p.starts_with(&format!("{prefix}.")))
            .map(str::to_string)
            .collect();
        for p in stale {
            self.errors.remove(&p);
        }

        self.sync_item_keys();
        tracing::debug!(path, index, "array entry removed");
        Ok(())
    }

    /// Validate and, if valid, hand the value tree to `on_submit` once.
    pub fn submit(&mut self, on_submit: impl FnOnce(&Value)) -> SubmitOutcome {
        self.submit_count += 1;
        match self.validator.validate(&self.values) {
            Ok(()) => {
                self.errors.clear();
                on_submit(&self.values);
                SubmitOutcome::Submitted
            }
            Err(errors) => {
                tracing::debug!(failed = errors.len(), "submit blocked by validation");
                self.errors = errors.clone();
                SubmitOutcome::Invalid(errors)
            }
        }
    }

    /// Restore the derived defaults and forget errors and item keys.
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
        self.errors.clear();
        self.item_keys.clear();
        self.next_key = 0;
        self.submit_count = 0;
        self.sync_item_keys();
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render every visible top-level field.
    pub fn render(&self) -> Vec<RenderNode> {
        let root = FieldPath::root();
        self.schema
            .fields
            .iter()
            .filter_map(|field| self.render_field(field, &field.name, root.key(field.name.clone()), false))
            .collect()
    }

    fn render_field(
        &self,
        field: &FieldDef,
        name: &str,
        path: FieldPath,
        parent_disabled: bool,
    ) -> Option<RenderNode> {
        if field.hidden {
            return None;
        }
        let disabled = parent_disabled || field.disabled;
        let meta = FieldMeta::of(field, name);
        let path_str = path.to_string();
        let binding = Binding {
            value: path.get(&self.values).cloned(),
            error: self.errors.get(&path_str).map(str::to_string),
            path: path_str,
            disabled,
        };

        let node = match &field.kind {
            FieldKind::Object { properties } => RenderNode::Group {
                field: meta,
                binding,
                children: properties
                    .iter()
                    .filter_map(|(key, child)| {
                        self.render_field(child, key, path.key(key.clone()), disabled)
                    })
                    .collect(),
            },
            FieldKind::Array {
                item_field,
                min_items,
                max_items,
            } => {
                let len = self.array_len(&path);
                let keys = self.item_keys.get(&path);
                let items = (0..len)
                    .filter_map(|index| {
                        let key = keys.and_then(|k| k.get(index)).copied().unwrap_or(index as u64);
                        let node = self.render_field(
                            item_field,
                            &item_field.name,
                            path.index(index),
                            disabled,
                        )?;
                        Some(ListItem { key, index, node })
                    })
                    .collect();
                RenderNode::List {
                    field: meta,
                    binding,
                    items,
                    can_append: !disabled && max_items.map_or(true, |max| len < max),
                    can_remove: !disabled && min_items.map_or(true, |min| len > min),
                }
            }
            FieldKind::Custom { component } => RenderNode::Custom {
                field: meta,
                component: component.clone(),
                binding,
            },
            kind => RenderNode::Control {
                field: meta,
                variant: control_variant(kind),
                binding,
            },
        };
        Some(node)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Definition of the field addressed by `path`.
    fn field_at(&self, path: &FieldPath) -> Option<&FieldDef> {
        let (first, rest) = path.segments().split_first()?;
        let Segment::Key(name) = first else {
            return None;
        };
        let mut field = self.schema.get_field(name)?;
        for segment in rest {
            field = match (&field.kind, segment) {
                (FieldKind::Object { properties }, Segment::Key(key)) => properties.get(key)?,
                (FieldKind::Array { item_field, .. }, Segment::Index(_)) => item_field,
                _ => return None,
            };
        }
        Some(field)
    }

    fn array_len(&self, path: &FieldPath) -> usize {
        path.get(&self.values)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    fn fresh_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Make the key lists match the arrays currently in the value tree.
    fn sync_item_keys(&mut self) {
        let mut lengths = Vec::new();
        let root = FieldPath::root();
        for field in &self.schema.fields {
            collect_array_lengths(field, root.key(field.name.clone()), &self.values, &mut lengths);
        }

        let mut synced = BTreeMap::new();
        for (path, len) in lengths {
            let mut keys = self.item_keys.remove(&path).unwrap_or_default();
            keys.truncate(len);
            while keys.len() < len {
                keys.push(self.fresh_key());
            }
            synced.insert(path, keys);
        }
        self.item_keys = synced;
    }
}

fn collect_array_lengths(
    field: &FieldDef,
    path: FieldPath,
    values: &Value,
    out: &mut Vec<(FieldPath, usize)>,
) {
    match &field.kind {
        FieldKind::Object { properties } => {
            for (key, child) in properties {
                collect_array_lengths(child, path.key(key.clone()), values, out);
            }
        }
        FieldKind::Array { item_field, .. } => {
            let len = path.get(values).and_then(Value::as_array).map_or(0, Vec::len);
            for index in 0..len {
                collect_array_lengths(item_field, path.index(index), values, out);
            }
            out.push((path, len));
        }
        _ => {}
    }
}

fn control_variant(kind: &FieldKind) -> ControlVariant {
    match kind {
        FieldKind::Textarea(_) => ControlVariant::TextArea,
        FieldKind::Number(NumberOptions { min, max, step }) => ControlVariant::NumberInput {
            min: *min,
            max: *max,
            step: *step,
        },
        FieldKind::Date(DateOptions { min, max }) => ControlVariant::DatePicker {
            min: min.clone(),
            max: max.clone(),
        },
        FieldKind::Select(SelectOptions { options, multiple }) => ControlVariant::Select {
            options: options.clone(),
            multiple: *multiple,
        },
        FieldKind::Radio(RadioOptions { options, layout }) => ControlVariant::RadioGroup {
            options: options.clone(),
            layout: *layout,
        },
        FieldKind::Checkbox => ControlVariant::Checkbox,
        FieldKind::Switch => ControlVariant::Switch,
        other => ControlVariant::TextInput {
            input_type: other.field_type(),
        },
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("submit_count", &self.submit_count)
            .finish()
    }
}

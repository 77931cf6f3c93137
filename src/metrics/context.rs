use crate::schema::TableSchema;

/// Reserved placeholder bound to the value name being evaluated.
pub const METRIC_VALUE: &str = "MetricValue";

/// A name a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    MetricValue,
    Column(usize),
}

/// Closed set of names known after schema resolution.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    columns: Vec<String>,
}

impl FieldSet {
    /// Only [`METRIC_VALUE`]; used for row-independent templates.
    pub fn metric_value_only() -> Self {
        Self::default()
    }

    /// Every column of the table plus [`METRIC_VALUE`].
    pub fn for_table(schema: &TableSchema) -> Self {
        Self::from_columns(schema.column_names())
    }

    pub fn from_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            columns: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        if name == METRIC_VALUE {
            return Some(FieldId::MetricValue);
        }
        self.columns
            .iter()
            .position(|c| c == name)
            .map(FieldId::Column)
    }

    pub fn name(&self, id: FieldId) -> &str {
        match id {
            FieldId::MetricValue => METRIC_VALUE,
            FieldId::Column(i) => &self.columns[i],
        }
    }
}

/// Values bound for one (row, value name) evaluation.
///
/// Lookups of names outside the field set, or of names not yet bound,
/// return `None`; there is no implicit empty string.
#[derive(Debug, Clone)]
pub struct SubstitutionContext<'a> {
    fields: &'a FieldSet,
    metric_value: Option<String>,
    columns: Vec<Option<String>>,
}

impl<'a> SubstitutionContext<'a> {
    pub fn new(fields: &'a FieldSet) -> Self {
        Self {
            fields,
            metric_value: None,
            columns: vec![None; fields.columns.len()],
        }
    }

    pub fn fields(&self) -> &FieldSet {
        self.fields
    }

    /// Bind a column value. Returns `false` when `column` is not in the
    /// field set.
    pub fn bind_column(&mut self, column: &str, value: &str) -> bool {
        match self.fields.lookup(column) {
            Some(FieldId::Column(i)) => {
                self.columns[i] = Some(value.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn bind_metric_value(&mut self, name: &str) {
        self.metric_value = Some(name.to_string());
    }

    pub fn get_id(&self, id: FieldId) -> Option<&str> {
        match id {
            FieldId::MetricValue => self.metric_value.as_deref(),
            FieldId::Column(i) => self.columns.get(i).and_then(|v| v.as_deref()),
        }
    }

    /// Column value by name. The reserved name is not a column and always
    /// resolves through [`SubstitutionContext::get_id`].
    pub fn column(&self, name: &str) -> Option<&str> {
        match self.fields.lookup(name)? {
            FieldId::Column(i) => self.columns[i].as_deref(),
            FieldId::MetricValue => None,
        }
    }
}

//! Column filters for repository lookups.

use sea_orm::{ColumnTrait, Condition, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// `column = value`
    Eq(Value),
    /// `column IN (values)`
    In(Vec<Value>),
}

/// Conjunction of per-column filters: scalars match by equality, lists by
/// membership.
#[derive(Debug, Clone, PartialEq)]
pub struct Filters<C> {
    items: Vec<(C, FilterValue)>,
}

impl<C> Default for Filters<C> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<C: ColumnTrait> Filters<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: C, value: impl Into<Value>) -> Self {
        self.items.push((column, FilterValue::Eq(value.into())));
        self
    }

    pub fn is_in<I, V>(mut self, column: C, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.items.push((column, FilterValue::In(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the filtered columns, first occurrence order, no repeats.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.items.len());
        for (column, _) in &self.items {
            let name = column.as_str();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    pub fn condition(&self) -> Condition {
        self.items
            .iter()
            .fold(Condition::all(), |cond, (column, value)| match value {
                FilterValue::Eq(v) => cond.add(column.eq(v.clone())),
                FilterValue::In(vs) => cond.add(column.is_in(vs.iter().cloned())),
            })
    }
}

//! Values bound to statement placeholders

use crate::core::value::DatabaseValue;
use std::collections::HashMap;

/// Clause family a bound value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingCategory {
    /// Insert rows and update assignments
    Values,
    /// WHERE operands
    Wheres,
    /// HAVING operands
    Havings,
}

impl BindingCategory {
    /// Every category in placeholder order
    pub const ALL: [BindingCategory; 3] = [
        BindingCategory::Values,
        BindingCategory::Wheres,
        BindingCategory::Havings,
    ];
}

/// Category-keyed store of bound values
///
/// Values stored under [`BindingCategory::Values`] are rows: a scalar is
/// wrapped into a one-element [`DatabaseValue::Array`] so that every entry of
/// that category has the same shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    bindings: HashMap<BindingCategory, Vec<DatabaseValue>>,
}

impl Bindings {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a category
    pub fn set(&mut self, category: BindingCategory, value: DatabaseValue) {
        let value = match (category, value) {
            (BindingCategory::Values, value @ DatabaseValue::Array(_)) => value,
            (BindingCategory::Values, value) => DatabaseValue::Array(vec![value]),
            (_, value) => value,
        };

        self.bindings.entry(category).or_default().push(value);
    }

    /// Raw values of a category, empty if none were bound
    pub fn get(&self, category: BindingCategory) -> &[DatabaseValue] {
        self.bindings
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Flatten the requested categories into one placeholder-ordered list
    ///
    /// Categories are visited in the order given, values within a category
    /// in insertion order, and array values are expanded one level.
    pub fn get_array(&self, categories: &[BindingCategory]) -> Vec<DatabaseValue> {
        let mut flattened = Vec::new();
        for category in categories {
            for value in self.get(*category) {
                match value {
                    DatabaseValue::Array(items) => flattened.extend(items.iter().cloned()),
                    other => flattened.push(other.clone()),
                }
            }
        }
        flattened
    }

    /// Flatten every category
    pub fn all(&self) -> Vec<DatabaseValue> {
        self.get_array(&BindingCategory::ALL)
    }

    /// Clear a category
    pub fn remove(&mut self, category: BindingCategory) -> bool {
        self.bindings.remove(&category).is_some()
    }

    /// Whether a category holds any value
    pub fn has(&self, category: BindingCategory) -> bool {
        !self.get(category).is_empty()
    }
}

use crate::data::{ExprType, ExprValue};
use crate::expression::ExpressionResult;
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered mapping of field name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuple {
    fields: IndexMap<String, ExprValue>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tuple from (name, value) pairs, keeping their order
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ExprValue>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Convert a raw JSON object into a tuple driven by `schema`.
    ///
    /// Schema fields absent from the object are left out of the tuple, so
    /// they resolve to MISSING. Object fields not in the schema are ignored.
    pub fn from_json(
        object: &serde_json::Map<String, serde_json::Value>,
        schema: &[ColumnInfo],
    ) -> ExpressionResult<Self> {
        let mut tuple = Tuple::new();
        for column in schema {
            if let Some(raw) = object.get(&column.name) {
                tuple.insert(column.name.clone(), ExprValue::from_json(raw, column.expr_type)?);
            }
        }
        Ok(tuple)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ExprValue) {
        self.fields.insert(name.into(), value);
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<ExprValue> {
        self.fields.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ExprValue> {
        self.fields.get(name)
    }

    /// Look up a possibly qualified name such as `address.city`.
    ///
    /// An exact field name wins. Otherwise the name is split on its first
    /// dot and the rest is looked up inside the nested tuple.
    pub fn lookup(&self, name: &str) -> Option<&ExprValue> {
        if let Some(value) = self.fields.get(name) {
            return Some(value);
        }
        let (head, rest) = name.split_once('.')?;
        match self.fields.get(head)? {
            ExprValue::Tuple(nested) => nested.lookup(rest),
            _ => None,
        }
    }

    /// Resolve a field, MISSING when it is absent
    pub fn resolve(&self, name: &str) -> ExprValue {
        self.lookup(name).cloned().unwrap_or(ExprValue::Missing)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExprValue)> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (name, value) in &self.fields {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl IntoIterator for Tuple {
    type Item = (String, ExprValue);
    type IntoIter = indexmap::map::IntoIter<String, ExprValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<(String, ExprValue)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (String, ExprValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Information about a column in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub expr_type: ExprType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, expr_type: ExprType) -> Self {
        Self {
            name: name.into(),
            expr_type,
        }
    }
}

/// Field name to type description of a relation
pub type Schema = Vec<ColumnInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tuple_preserves_insertion_order() {
        let mut tuple = Tuple::new();
        tuple.insert("z", ExprValue::Integer(1));
        tuple.insert("a", ExprValue::Integer(2));
        tuple.insert("m", ExprValue::Integer(3));
        let names: Vec<_> = tuple.names().cloned().collect();
        assert_eq!(names, vec!["z", "a", "m"]);

        tuple.remove("a");
        let names: Vec<_> = tuple.names().cloned().collect();
        assert_eq!(names, vec!["z", "m"]);
    }

    #[test]
    fn test_resolve_qualified_names() {
        let address = Tuple::from_pairs([("city", "Seattle"), ("state", "WA")]);
        let mut tuple = Tuple::from_pairs([("name", "bob")]);
        tuple.insert("address", ExprValue::Tuple(address));
        tuple.insert("a.b", ExprValue::Integer(9));

        assert_eq!(tuple.resolve("address.city"), ExprValue::string("Seattle"));
        assert_eq!(tuple.resolve("a.b"), ExprValue::Integer(9));
        assert!(tuple.resolve("address.zip").is_missing());
        assert!(tuple.resolve("name.first").is_missing());
        assert!(tuple.resolve("age").is_missing());
    }

    #[test]
    fn test_from_json_with_schema() -> ExpressionResult<()> {
        let schema = vec![
            ColumnInfo::new("name", ExprType::String),
            ColumnInfo::new("age", ExprType::Integer),
            ColumnInfo::new("email", ExprType::String),
        ];
        let raw = json!({"name": "alice", "age": null, "extra": 1});
        let object = raw.as_object().cloned().unwrap_or_default();
        let tuple = Tuple::from_json(&object, &schema)?;

        assert_eq!(tuple.len(), 2);
        assert_eq!(tuple.resolve("name"), ExprValue::string("alice"));
        assert!(tuple.resolve("age").is_null());
        assert!(tuple.resolve("email").is_missing());
        assert!(!tuple.contains("extra"));
        Ok(())
    }

    #[test]
    fn test_display() {
        let tuple = Tuple::from_pairs([("a", ExprValue::Integer(1)), ("b", ExprValue::string("x"))]);
        assert_eq!(tuple.to_string(), "{a:1, b:\"x\"}");
    }
}

//! Materialized result rows.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::DecodeError;
use crate::value::{FromValue, Value};

/// Column names of a result set, shared by all of its rows.
///
/// When several columns share a name (`SELECT a, a FROM t`, unaliased
/// joins) name lookup resolves to the last of them. Every column stays
/// reachable by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
   names: Vec<String>,
   by_name: IndexMap<String, usize>,
}

impl Columns {
   pub fn new(names: Vec<String>) -> Self {
      let mut by_name = IndexMap::with_capacity(names.len());
      for (index, name) in names.iter().enumerate() {
         by_name.insert(name.clone(), index);
      }
      Self { names, by_name }
   }

   pub fn len(&self) -> usize {
      self.names.len()
   }

   pub fn is_empty(&self) -> bool {
      self.names.is_empty()
   }

   /// Column names in result order, duplicates included.
   pub fn names(&self) -> &[String] {
      &self.names
   }

   /// Position that name lookup resolves `name` to.
   pub fn index_of(&self, name: &str) -> Option<usize> {
      self.by_name.get(name).copied()
   }

   /// True if some column name appears more than once.
   pub fn has_duplicates(&self) -> bool {
      self.by_name.len() != self.names.len()
   }
}

/// One result row, fully decoded and detached from the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
   columns: Arc<Columns>,
   values: Vec<Value>,
}

impl Row {
   pub(crate) fn new(columns: Arc<Columns>, values: Vec<Value>) -> Self {
      debug_assert_eq!(columns.len(), values.len());
      Self { columns, values }
   }

   /// Build a row from shared column names and one value per column.
   pub fn try_new(columns: Arc<Columns>, values: Vec<Value>) -> Result<Self, DecodeError> {
      if columns.len() != values.len() {
         return Err(DecodeError::ColumnCountMismatch {
            columns: columns.len(),
            values: values.len(),
         });
      }
      Ok(Self { columns, values })
   }

   pub fn len(&self) -> usize {
      self.values.len()
   }

   pub fn is_empty(&self) -> bool {
      self.values.is_empty()
   }

   pub fn columns(&self) -> &Columns {
      &self.columns
   }

   pub fn contains(&self, name: &str) -> bool {
      self.columns.index_of(name).is_some()
   }

   /// Value of column `name`.
   ///
   /// `None` means the column is not in the result set; a stored NULL is
   /// `Some(&Value::Null)`.
   pub fn value(&self, name: &str) -> Option<&Value> {
      self.columns.index_of(name).and_then(|i| self.values.get(i))
   }

   /// Value of the column at `index`, counting from 0.
   pub fn value_at(&self, index: usize) -> Option<&Value> {
      self.values.get(index)
   }

   /// Read column `name` as `T`.
   ///
   /// ```
   /// # use std::sync::Arc;
   /// # use sqlite_typed_core::{Columns, Row, Value};
   /// let columns = Arc::new(Columns::new(vec!["done".into(), "note".into()]));
   /// let row = Row::try_new(columns, vec![Value::Integer(1), Value::Null]).unwrap();
   ///
   /// assert!(row.get::<bool>("done").unwrap());
   /// assert_eq!(row.get::<Option<String>>("note").unwrap(), None);
   /// assert!(row.get::<String>("missing").is_err());
   /// ```
   pub fn get<T: FromValue>(&self, name: &str) -> Result<T, DecodeError> {
      let value = self
         .value(name)
         .ok_or_else(|| DecodeError::ColumnNotFound(name.to_owned()))?;
      T::from_value(value, name)
   }

   /// Read the column at `index` as `T`.
   pub fn get_at<T: FromValue>(&self, index: usize) -> Result<T, DecodeError> {
      let value = self.values.get(index).ok_or(DecodeError::IndexOutOfRange {
         index,
         len: self.values.len(),
      })?;
      let name = self.columns.names.get(index).map_or("", String::as_str);
      T::from_value(value, name)
   }

   /// Iterate `(name, value)` pairs in column order, duplicates included.
   pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
      self.columns.names.iter().map(String::as_str).zip(&self.values)
   }

   /// Convert into a name-keyed map; for duplicate names the last column wins.
   pub fn into_map(self) -> IndexMap<String, Value> {
      let mut values: Vec<Option<Value>> = self.values.into_iter().map(Some).collect();
      self
         .columns
         .by_name
         .iter()
         .map(|(name, &index)| {
            let value = values.get_mut(index).and_then(Option::take).unwrap_or(Value::Null);
            (name.clone(), value)
         })
         .collect()
   }
}

impl Serialize for Row {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      let mut map = serializer.serialize_map(Some(self.columns.by_name.len()))?;
      for (name, &index) in &self.columns.by_name {
         map.serialize_entry(name, self.values.get(index).unwrap_or(&Value::Null))?;
      }
      map.end()
   }
}

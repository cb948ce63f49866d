//! Row decoding for a statement positioned on a result row.

use std::sync::Arc;

use crate::codec::decode_column;
use crate::error::DecodeError;
use crate::row::{Columns, Row};
use crate::statement::Statement;

/// Read the result column names of a prepared statement.
pub fn read_columns(statement: &Statement<'_>) -> Result<Columns, DecodeError> {
   let names = (0..statement.column_count())
      .map(|index| statement.column_name(index))
      .collect::<Result<Vec<_>, _>>()?;
   Ok(Columns::new(names))
}

/// Decode the current row into an owned [`Row`].
///
/// Values are decoded structurally by storage class; nothing is kept that
/// points back into the statement.
pub fn decode_row(statement: &Statement<'_>, columns: &Arc<Columns>) -> Result<Row, DecodeError> {
   let values = columns
      .names()
      .iter()
      .enumerate()
      .map(|(index, name)| decode_column(statement, index, name))
      .collect::<Result<Vec<_>, _>>()?;
   Ok(Row::new(Arc::clone(columns), values))
}

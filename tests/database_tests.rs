use sqlite_typed::{
   BindError, Database, DatabaseConfig, DecodeError, Error, OffsetDateTime, Row, Value,
};
use tempfile::TempDir;

fn create_test_db() -> (Database, TempDir) {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();

   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let db_path = temp_dir.path().join("test.db");
   let db = Database::connect(&db_path, None).expect("Failed to open test database");

   (db, temp_dir)
}

const CREATE_TEST_TABLE: &str = "
   CREATE TABLE IF NOT EXISTS TestTable(
      strCol TEXT NOT NULL,
      intCol INTEGER NOT NULL,
      doubleCol REAL NOT NULL,
      boolCol INTEGER NOT NULL CHECK (boolCol IN (0,1)),
      dateCol DATETIME NOT NULL,
      nullableStrCol TEXT,
      nullableIntCol INTEGER,
      nullableDoubleCol REAL,
      nullableBoolCol INTEGER CHECK (nullableBoolCol IN (0,1)),
      nullableDateCol DATETIME
   );
";

const INSERT_TEST_ENTRY: &str = "
   INSERT INTO TestTable (strCol, intCol, doubleCol, boolCol, dateCol, nullableStrCol,
      nullableIntCol, nullableDoubleCol, nullableBoolCol, nullableDateCol)
   VALUES (?,?,?,?,?,?,?,?,?,?);
";

#[derive(Debug, PartialEq)]
struct TestEntry {
   str_col: String,
   int_col: i64,
   double_col: f64,
   bool_col: bool,
   date_col: OffsetDateTime,
   nullable_str_col: Option<String>,
   nullable_int_col: Option<i64>,
   nullable_double_col: Option<f64>,
   nullable_bool_col: Option<bool>,
   nullable_date_col: Option<OffsetDateTime>,
}

impl TestEntry {
   fn params(&self) -> Vec<Value> {
      vec![
         self.str_col.clone().into(),
         self.int_col.into(),
         self.double_col.into(),
         self.bool_col.into(),
         self.date_col.into(),
         self.nullable_str_col.clone().into(),
         self.nullable_int_col.into(),
         self.nullable_double_col.into(),
         self.nullable_bool_col.into(),
         self.nullable_date_col.into(),
      ]
   }

   fn from_row(row: &Row) -> Result<Self, DecodeError> {
      Ok(Self {
         str_col: row.get("strCol")?,
         int_col: row.get("intCol")?,
         double_col: row.get("doubleCol")?,
         bool_col: row.get("boolCol")?,
         date_col: row.get("dateCol")?,
         nullable_str_col: row.get("nullableStrCol")?,
         nullable_int_col: row.get("nullableIntCol")?,
         nullable_double_col: row.get("nullableDoubleCol")?,
         nullable_bool_col: row.get("nullableBoolCol")?,
         nullable_date_col: row.get("nullableDateCol")?,
      })
   }
}

fn sample_date() -> OffsetDateTime {
   OffsetDateTime::from_unix_timestamp(1_695_697_989).unwrap()
}

#[test]
fn test_entry_round_trip_with_nulls() {
   let (db, _temp) = create_test_db();
   db.execute(CREATE_TEST_TABLE, &[]).unwrap();

   let entry = TestEntry {
      str_col: "testString".into(),
      int_col: 123,
      double_col: 123.456,
      bool_col: true,
      date_col: sample_date(),
      nullable_str_col: None,
      nullable_int_col: None,
      nullable_double_col: None,
      nullable_bool_col: None,
      nullable_date_col: None,
   };
   db.execute(INSERT_TEST_ENTRY, &entry.params()).unwrap();

   let row = db
      .query_one(
         "SELECT * FROM TestTable WHERE strCol = ?",
         &[Value::from("testString")],
      )
      .unwrap()
      .expect("inserted row should be found");
   let retrieved = TestEntry::from_row(&row).unwrap();

   assert_eq!(retrieved.str_col, entry.str_col);
   assert_eq!(retrieved.int_col, entry.int_col);
   assert!((retrieved.double_col - entry.double_col).abs() < 1e-4);
   assert_eq!(retrieved.bool_col, entry.bool_col);
   assert_eq!(retrieved.date_col, entry.date_col);
   assert_eq!(retrieved.nullable_str_col, None);
   assert_eq!(retrieved.nullable_int_col, None);
   assert_eq!(retrieved.nullable_double_col, None);
   assert_eq!(retrieved.nullable_bool_col, None);
   assert_eq!(retrieved.nullable_date_col, None);
}

#[test]
fn test_entry_round_trip_with_values() {
   let (db, _temp) = create_test_db();
   db.execute(CREATE_TEST_TABLE, &[]).unwrap();

   let entry = TestEntry {
      str_col: "TestStr2".into(),
      int_col: 2,
      double_col: 2.2,
      bool_col: false,
      date_col: sample_date(),
      nullable_str_col: Some("NullableStr2".into()),
      nullable_int_col: Some(2),
      nullable_double_col: Some(2.2),
      nullable_bool_col: Some(false),
      nullable_date_col: Some(sample_date()),
   };
   db.execute(INSERT_TEST_ENTRY, &entry.params()).unwrap();

   let rows = db
      .query(
         "SELECT * FROM TestTable WHERE strCol = ?",
         &[Value::from("TestStr2")],
      )
      .unwrap();
   assert_eq!(rows.len(), 1);
   assert_eq!(TestEntry::from_row(&rows[0]).unwrap(), entry);
}

#[test]
fn test_every_variant_round_trips() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (v)", &[]).unwrap();

   let fractional = OffsetDateTime::from_unix_timestamp_nanos(1_695_697_989_123_456_000).unwrap();
   let cases = vec![
      Value::Text("hello".into()),
      Value::Text(String::new()),
      Value::Integer(i64::MIN),
      Value::Integer(i64::MAX),
      Value::Real(-0.5),
      Value::Boolean(true),
      Value::Boolean(false),
      Value::Timestamp(sample_date()),
      Value::Timestamp(fractional),
      Value::Null,
   ];

   for case in cases {
      db.execute("DELETE FROM t", &[]).unwrap();
      db.execute("INSERT INTO t (v) VALUES (?)", &[case.clone()]).unwrap();
      let row = db.query_one("SELECT v FROM t", &[]).unwrap().unwrap();

      match &case {
         Value::Boolean(expected) => assert_eq!(row.get::<bool>("v").unwrap(), *expected),
         Value::Timestamp(expected) => {
            assert_eq!(row.get::<OffsetDateTime>("v").unwrap(), *expected)
         }
         Value::Real(expected) => assert!((row.get::<f64>("v").unwrap() - expected).abs() < 1e-4),
         other => assert_eq!(row.value("v"), Some(other)),
      }
   }
}

#[test]
fn test_null_precedence() {
   let (db, _temp) = create_test_db();
   db.execute(CREATE_TEST_TABLE, &[]).unwrap();

   let mut params = vec![
      Value::from("nulls"),
      Value::from(0),
      Value::from(0.0),
      Value::from(false),
      Value::from(sample_date()),
   ];
   params.extend(std::iter::repeat_n(Value::Null, 5));
   db.execute(INSERT_TEST_ENTRY, &params).unwrap();

   let row = db.query_one("SELECT * FROM TestTable", &[]).unwrap().unwrap();
   for column in [
      "nullableStrCol",
      "nullableIntCol",
      "nullableDoubleCol",
      "nullableBoolCol",
      "nullableDateCol",
   ] {
      assert_eq!(row.value(column), Some(&Value::Null), "column {column}");
   }

   // A present NULL is distinct from an absent column
   assert_eq!(row.value("noSuchCol"), None);
   assert!(matches!(
      row.get::<Option<i64>>("noSuchCol"),
      Err(DecodeError::ColumnNotFound(_))
   ));

   // NULL never reads as a zero value
   assert!(matches!(
      row.get::<i64>("nullableIntCol"),
      Err(DecodeError::TypeMismatch { found: "NULL", .. })
   ));
}

#[test]
fn test_positional_binding() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (a TEXT, b INTEGER, c REAL, d INTEGER)", &[])
      .unwrap();

   db.execute(
      "INSERT INTO t (a, b, c, d) VALUES (?, ?, ?, ?)",
      &[
         Value::from("TestStr2"),
         Value::from(2),
         Value::from(2.2),
         Value::from(0),
      ],
   )
   .unwrap();

   let rows = db
      .query("SELECT * FROM t WHERE a = ?", &[Value::from("TestStr2")])
      .unwrap();
   assert_eq!(rows.len(), 1);

   let values: Vec<&Value> = rows[0].iter().map(|(_, v)| v).collect();
   assert_eq!(
      values,
      [
         &Value::Text("TestStr2".into()),
         &Value::Integer(2),
         &Value::Real(2.2),
         &Value::Integer(0),
      ]
   );
}

#[test]
fn test_boolean_convention() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (id INTEGER, flag INTEGER)", &[])
      .unwrap();
   db.execute(
      "INSERT INTO t VALUES (1, ?), (2, ?)",
      &[Value::from(true), Value::from(false)],
   )
   .unwrap();

   let rows = db.query("SELECT flag FROM t ORDER BY id", &[]).unwrap();
   assert_eq!(rows[0].value("flag"), Some(&Value::Integer(1)));
   assert_eq!(rows[1].value("flag"), Some(&Value::Integer(0)));
   assert!(rows[0].get::<bool>("flag").unwrap());
   assert!(!rows[1].get::<bool>("flag").unwrap());

   // Booleans also bind as integers in WHERE clauses
   let rows = db
      .query("SELECT id FROM t WHERE flag = ?", &[Value::from(true)])
      .unwrap();
   assert_eq!(rows.len(), 1);
   assert_eq!(rows[0].get::<i64>("id").unwrap(), 1);
}

#[test]
fn test_timestamp_stored_as_real_seconds() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (at DATETIME)", &[]).unwrap();
   db.execute("INSERT INTO t VALUES (?)", &[Value::from(sample_date())])
      .unwrap();

   let row = db
      .query_one("SELECT at, typeof(at) AS kind FROM t", &[])
      .unwrap()
      .unwrap();
   // DATETIME has NUMERIC affinity, which stores a whole REAL as INTEGER
   assert_eq!(row.get::<String>("kind").unwrap(), "integer");
   assert_eq!(row.get::<OffsetDateTime>("at").unwrap(), sample_date());
}

#[test]
fn test_empty_result() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (id INTEGER)", &[]).unwrap();

   let rows = db
      .query("SELECT * FROM t WHERE id = ?", &[Value::from(999)])
      .unwrap();
   assert!(rows.is_empty());

   assert!(
      db.query_one("SELECT * FROM t WHERE id = ?", &[Value::from(999)])
         .unwrap()
         .is_none()
   );
}

#[test]
fn test_query_one_multiple_rows() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (name TEXT)", &[]).unwrap();
   db.execute(
      "INSERT INTO t (name) VALUES (?), (?)",
      &[Value::from("Alice"), Value::from("Bob")],
   )
   .unwrap();

   let err = db.query_one("SELECT * FROM t", &[]).unwrap_err();
   assert!(matches!(err, Error::MultipleRowsReturned(2)));
   assert!(err.to_string().contains("2 rows"));
}

#[test]
fn test_repeated_calls_do_not_leak_statements() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, n INTEGER)", &[])
      .unwrap();

   db.execute("BEGIN", &[]).unwrap();
   for i in 0..10_000i64 {
      db.execute("INSERT INTO t (n) VALUES (?)", &[Value::from(i)])
         .unwrap();
      let rows = db
         .query("SELECT n FROM t WHERE id = ?", &[Value::from(i + 1)])
         .unwrap();
      assert_eq!(rows[0].get::<i64>("n").unwrap(), i);
   }
   db.execute("COMMIT", &[]).unwrap();
   assert_eq!(db.live_statement_count().unwrap(), 0);

   // Error paths release their statements too
   for _ in 0..1_000 {
      assert!(db.execute("INSERT INTO t (id, n) VALUES (1, 1)", &[]).is_err());
      assert!(db.query("SELECT n FROM t WHERE id = ?", &[]).is_err());
      assert!(db.query("SELECT nope FROM t", &[]).is_err());
   }
   assert_eq!(db.live_statement_count().unwrap(), 0);
}

#[test]
fn test_parameter_count_mismatch() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (a TEXT, b INTEGER)", &[]).unwrap();

   let short = db
      .execute("INSERT INTO t (a, b) VALUES (?, ?)", &[Value::from("x")])
      .unwrap_err();
   let long = db
      .query(
         "SELECT * FROM t WHERE a = ?",
         &[Value::from("x"), Value::from(1)],
      )
      .unwrap_err();

   for err in [short, long] {
      assert_eq!(err.error_code(), "BIND_ERROR");
      assert!(matches!(
         err,
         Error::Sqlite(sqlite_typed_core::Error::Bind(BindError::ParameterCount { .. }))
      ));
   }

   // Nothing was inserted
   assert!(db.query("SELECT * FROM t", &[]).unwrap().is_empty());
}

#[test]
fn test_idempotent_close() {
   let (mut db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (id INTEGER)", &[]).unwrap();

   db.close().unwrap();
   db.close().unwrap();
   assert!(!db.is_open());

   assert!(matches!(db.execute("SELECT 1", &[]), Err(Error::NotOpen)));
   assert!(matches!(db.query("SELECT 1", &[]), Err(Error::NotOpen)));
}

#[test]
fn test_reopen_after_close() {
   let (mut db, temp) = create_test_db();
   let path = temp.path().join("test.db");
   db.execute("CREATE TABLE t (id INTEGER)", &[]).unwrap();
   db.execute("INSERT INTO t VALUES (7)", &[]).unwrap();

   let err = db.open(&path).unwrap_err();
   assert!(matches!(err, Error::AlreadyOpen(ref p) if p == &path));

   db.close().unwrap();
   db.open(&path).unwrap();
   let row = db.query_one("SELECT id FROM t", &[]).unwrap().unwrap();
   assert_eq!(row.get::<i64>("id").unwrap(), 7);
}

#[test]
fn test_open_error() {
   let temp = TempDir::new().unwrap();
   let path = temp.path().join("missing-dir").join("test.db");

   let mut db = Database::new(None);
   let err = db.open(&path).unwrap_err();
   assert_eq!(err.error_code(), "OPEN_ERROR");
   assert!(err.sqlite_code().is_some());
   assert!(!db.is_open());
}

#[test]
fn test_read_only_config() {
   let temp = TempDir::new().unwrap();
   let path = temp.path().join("ro.db");

   {
      let mut db = Database::connect(&path, None).unwrap();
      db.execute("CREATE TABLE t (id INTEGER)", &[]).unwrap();
      db.close().unwrap();
   }

   let config = DatabaseConfig {
      read_only: true,
      ..Default::default()
   };
   let db = Database::connect(&path, Some(config)).unwrap();
   assert!(db.query("SELECT * FROM t", &[]).unwrap().is_empty());

   let err = db.execute("INSERT INTO t VALUES (1)", &[]).unwrap_err();
   assert_eq!(err.error_code(), "STEP_ERROR");
   assert_eq!(db.live_statement_count().unwrap(), 0);
}

#[test]
fn test_rows_serialize_to_json() {
   let (db, _temp) = create_test_db();
   db.execute("CREATE TABLE t (id INTEGER, name TEXT, score REAL)", &[])
      .unwrap();
   db.execute(
      "INSERT INTO t VALUES (?, ?, ?)",
      &[Value::from(1), Value::from("Alice"), Value::Null],
   )
   .unwrap();

   let rows = db.query("SELECT * FROM t", &[]).unwrap();
   let json = serde_json::to_value(&rows).unwrap();
   assert_eq!(
      json,
      serde_json::json!([{ "id": 1, "name": "Alice", "score": null }])
   );
}

//! Tests for DDL parsing and schema directory loading.

use sql_seeder::schema::files::{load_schema_dir, schema_files};
use sql_seeder::schema::{parse_table, parse_tables, ColumnType, KeyRole};
use sql_seeder::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_mysql_table() {
    let table = parse_table(
        r#"
CREATE TABLE `orders` (
  `order_id` INT NOT NULL AUTO_INCREMENT,
  `customer_id` INT NOT NULL,
  `total` DECIMAL(10,2) NULL DEFAULT NULL,
  `note` VARCHAR(40),
  PRIMARY KEY (`order_id`),
  CONSTRAINT `fk_customer` FOREIGN KEY (`customer_id`) REFERENCES `customers` (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
"#,
    )
    .unwrap();

    assert_eq!(table.name, "orders");
    assert_eq!(table.columns.len(), 4);
    assert_eq!(table.primary_key, vec![0]);

    let order_id = &table.columns[0];
    assert_eq!(order_id.role, KeyRole::PrimaryKey);
    assert!(!order_id.nullable);

    let customer_id = &table.columns[1];
    assert_eq!(customer_id.role, KeyRole::ForeignKey);
    let target = customer_id.references.as_ref().unwrap();
    assert_eq!(target.table, "customers");
    assert_eq!(target.column.as_deref(), Some("id"));

    let total = &table.columns[2];
    assert_eq!(total.col_type, ColumnType::Decimal);
    assert_eq!((total.length, total.scale), (Some(10), Some(2)));
    assert!(total.nullable);

    let note = &table.columns[3];
    assert_eq!(note.col_type, ColumnType::VarChar);
    assert_eq!(note.length, Some(40));
}

#[test]
fn test_parse_postgres_table() {
    let table = parse_table(
        r#"
CREATE TABLE IF NOT EXISTS public.customers (
    id integer PRIMARY KEY,
    email character varying(80) NOT NULL,
    created_at timestamp without time zone,
    balance numeric(12,2),
    code char(3),
    profile jsonb
);
"#,
    )
    .unwrap();

    assert_eq!(table.name, "customers");
    let types: Vec<&ColumnType> = table.columns.iter().map(|c| &c.col_type).collect();
    assert_eq!(
        types,
        vec![
            &ColumnType::Int,
            &ColumnType::VarChar,
            &ColumnType::DateTime,
            &ColumnType::Decimal,
            &ColumnType::Char,
            &ColumnType::Json,
        ]
    );
    assert!(!table.columns[1].nullable);
    assert_eq!(table.columns[4].length, Some(3));
}

#[test]
fn test_composite_primary_key() {
    let table = parse_table(
        "CREATE TABLE order_lines (order_id INT, line_no SMALLINT, qty INT, \
         PRIMARY KEY (order_id, line_no))",
    )
    .unwrap();
    assert_eq!(table.primary_key, vec![0, 1]);
    assert!(table.columns.iter().take(2).all(|c| !c.nullable));
    assert!(table.columns[2].nullable);
}

#[test]
fn test_parse_errors_name_the_table() {
    let cases = [
        "CREATE TABLE broken (id INT",
        "CREATE TABLE dup (id INT, ID INT)",
        "CREATE TABLE money (amount DECIMAL(2,5))",
        "CREATE TABLE conflict (id INT PRIMARY KEY NULL)",
        "CREATE TABLE bad_pk (id INT, PRIMARY KEY (missing))",
    ];
    for sql in cases {
        match parse_table(sql) {
            Err(Error::SchemaParse { table, .. }) => {
                assert!(sql.contains(&table), "{} should name table in {}", table, sql)
            }
            other => panic!("expected SchemaParse for {}, got {:?}", sql, other),
        }
    }
}

#[test]
fn test_parse_tables_in_one_file() {
    let sql = r#"
-- customers first
CREATE TABLE customers (id INT PRIMARY KEY, name VARCHAR(50));
/* then orders */
CREATE TABLE orders (order_id INT PRIMARY KEY, customer_id INT REFERENCES customers(id));
"#;
    let tables = parse_tables(sql).unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "orders"]);
}

#[test]
fn test_load_schema_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("01_customers.sql"),
        "CREATE TABLE customers (id INT PRIMARY KEY, email VARCHAR(60));",
    )
    .unwrap();
    fs::write(
        dir.path().join("02_orders.sql"),
        "CREATE TABLE orders (order_id INT PRIMARY KEY, customer_id INT);\n\
         CREATE TABLE audit_log (entry_id INT PRIMARY KEY);",
    )
    .unwrap();
    fs::write(dir.path().join("03_seed.sql"), "INSERT INTO customers VALUES (1, 'a');").unwrap();
    fs::write(dir.path().join("readme.txt"), "CREATE TABLE ignored (id INT);").unwrap();

    assert_eq!(schema_files(dir.path()).unwrap().len(), 3);

    let tables = load_schema_dir(dir.path(), &["AUDIT_LOG".to_string()]).unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "orders"]);
}

#[test]
fn test_load_schema_dir_duplicate_table() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.sql"), "CREATE TABLE t (id INT);").unwrap();
    fs::write(dir.path().join("b.sql"), "CREATE TABLE T (id INT);").unwrap();

    let err = load_schema_dir(dir.path(), &[]).unwrap_err();
    assert!(matches!(err, Error::SchemaParse { .. }));
}

#[test]
fn test_load_schema_dir_without_tables() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.sql"), "SELECT 1;").unwrap();

    let err = load_schema_dir(dir.path(), &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));

    let missing = dir.path().join("nope");
    assert!(load_schema_dir(&missing, &[]).is_err());
}

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use datagrid::header::Sorter;
use datagrid::{Column, ColumnType, FieldMap};
use rusqlite::{Connection, OpenFlags, Row, types::ValueRef};
use serde_json::Value;

pub const ROWID: &str = "__rowid__";

#[derive(Debug)]
pub enum DBRequest {
    LoadSchema,
    LoadTable {
        table: String,
        limit: usize,
        /// Applied in order as ORDER BY terms
        sorters: Vec<Sorter>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
}

impl ColumnInfo {
    pub fn data_type(&self) -> ColumnType {
        let decl = self.decl_type.to_ascii_uppercase();
        if decl.contains("INT") {
            ColumnType::Integer
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            ColumnType::Float
        } else if decl.contains("NUMERIC") || decl.contains("DECIMAL") {
            ColumnType::Number
        } else if decl.contains("BOOL") {
            ColumnType::Boolean
        } else {
            ColumnType::String
        }
    }

    /// Grid column for a table column when no grid config names it.
    pub fn to_column(&self) -> Column {
        if self.name == ROWID {
            return Column::new(ROWID, ColumnType::Integer).hidden(true);
        }
        Column::new(&self.name, self.data_type())
            .editable(true)
            .sortable(true)
    }
}

#[derive(Debug)]
pub enum DBResponse {
    Schema {
        tables: Vec<String>,
    },
    TableData {
        table: String,
        columns: Vec<ColumnInfo>,
        records: Vec<FieldMap>,
    },
    Error(String),
}

pub fn start_db_worker(path: String, req_rx: Receiver<DBRequest>, resp_tx: Sender<DBResponse>) {
    // the grid never writes back, so the file is opened read-only
    let conn = match Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to open {path}: {e}");
            let _ = resp_tx.send(DBResponse::Error(format!("Failed to open DB: {e}")));
            return;
        }
    };
    tracing::info!("Opened {path} read-only");

    while let Ok(req) = req_rx.recv() {
        let result = match req {
            DBRequest::LoadSchema => load_schema(&conn).map(|tables| DBResponse::Schema { tables }),
            DBRequest::LoadTable {
                table,
                limit,
                sorters,
            } => load_table(&conn, &table, limit, &sorters),
        };

        match result {
            Ok(resp) => {
                let _ = resp_tx.send(resp);
            }
            Err(e) => {
                tracing::warn!("DB request failed: {e:#}");
                let _ = resp_tx.send(DBResponse::Error(format!("{e:#}")));
            }
        }
    }
}

fn load_schema(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", ident(table)))
        .with_context(|| format!("Failed to read columns of {table}"))?;
    let mut columns = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        columns.push(ColumnInfo {
            name: row.get(1)?,
            decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        });
    }
    Ok(columns)
}

fn load_table(
    conn: &Connection,
    table: &str,
    limit: usize,
    sorters: &[Sorter],
) -> Result<DBResponse> {
    let table_cols = table_columns(conn, table)?;
    if table_cols.is_empty() {
        anyhow::bail!("Table {table} has no columns");
    }

    // unknown sorter names are skipped rather than injected
    let order_terms: Vec<String> = sorters
        .iter()
        .filter(|s| s.name == ROWID || table_cols.iter().any(|c| c.name == s.name))
        .map(|s| {
            let name = if s.name == ROWID {
                ROWID.to_string()
            } else {
                ident(&s.name)
            };
            format!("{} {}", name, if s.descending { "DESC" } else { "ASC" })
        })
        .collect();
    let order_sql = if order_terms.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", order_terms.join(", "))
    };

    let sql = format!(
        "SELECT rowid AS {ROWID}, {} FROM {}{} LIMIT ?",
        table_cols
            .iter()
            .map(|c| ident(&c.name))
            .collect::<Vec<_>>()
            .join(", "),
        ident(table),
        order_sql
    );
    tracing::debug!(%sql, "loading table");

    let mut columns = vec![ColumnInfo {
        name: ROWID.to_string(),
        decl_type: "INTEGER".to_string(),
    }];
    columns.extend(table_cols);

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to query {table}"))?;
    let records = stmt
        .query_map([limit as i64], |row| row_to_fields(row, &columns))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::info!(table, rows = records.len(), "table loaded");
    Ok(DBResponse::TableData {
        table: table.to_string(),
        columns,
        records,
    })
}

fn row_to_fields(row: &Row, columns: &[ColumnInfo]) -> rusqlite::Result<FieldMap> {
    let mut out = FieldMap::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        out.insert(col.name.clone(), value_to_json(row.get_ref(i)?));
    }
    Ok(out)
}

fn value_to_json(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::String(format!("0x{}", hex::encode(b))),
    }
}

// Quote identifiers with double-quotes, and escape inner quotes
fn ident(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

mod hex {
    pub fn encode(data: &[u8]) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut s = String::with_capacity(data.len() * 2);
        for &b in data {
            s.push(HEX[(b >> 4) as usize] as char);
            s.push(HEX[(b & 0xf) as usize] as char);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (name TEXT, qty INTEGER, price REAL, data BLOB);
             INSERT INTO items VALUES ('bolt', 5, 0.25, x'0aff');
             INSERT INTO items VALUES ('nut', 12, NULL, NULL);
             INSERT INTO items VALUES ('gear', 1, 3.5, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_load_schema_lists_user_tables() {
        assert_eq!(load_schema(&sample()).unwrap(), vec!["items".to_string()]);
    }

    #[test]
    fn test_load_table_converts_values() {
        let DBResponse::TableData { columns, records, .. } =
            load_table(&sample(), "items", 10, &[]).unwrap()
        else {
            panic!("expected table data");
        };
        assert_eq!(columns[0].name, ROWID);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["name"], json!("bolt"));
        assert_eq!(records[0]["qty"], json!(5));
        assert_eq!(records[0]["price"], json!(0.25));
        assert_eq!(records[0]["data"], json!("0x0aff"));
        assert_eq!(records[1]["price"], Value::Null);
    }

    #[test]
    fn test_load_table_orders_by_sorters_and_limits() {
        let sorters = vec![
            Sorter {
                name: "qty".into(),
                descending: true,
            },
            Sorter {
                name: "no_such_column".into(),
                descending: false,
            },
        ];
        let DBResponse::TableData { records, .. } =
            load_table(&sample(), "items", 2, &sorters).unwrap()
        else {
            panic!("expected table data");
        };
        let names: Vec<&Value> = records.iter().map(|r| &r["name"]).collect();
        assert_eq!(names, vec![&json!("nut"), &json!("bolt")]);
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        assert!(load_table(&sample(), "missing", 10, &[]).is_err());
    }

    #[test]
    fn test_declared_types_map_to_column_types() {
        let info = |decl: &str| ColumnInfo {
            name: "c".into(),
            decl_type: decl.into(),
        };
        assert_eq!(info("INTEGER").data_type(), ColumnType::Integer);
        assert_eq!(info("double precision").data_type(), ColumnType::Float);
        assert_eq!(info("BOOLEAN").data_type(), ColumnType::Boolean);
        assert_eq!(info("VARCHAR(20)").data_type(), ColumnType::String);
        assert!(info("").to_column().is_editable());

        let rowid = ColumnInfo {
            name: ROWID.into(),
            decl_type: "INTEGER".into(),
        }
        .to_column();
        assert!(rowid.hidden);
        assert!(!rowid.is_editable());
    }
}

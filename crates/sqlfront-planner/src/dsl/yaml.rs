//! YAML loaders for statements and catalogs.
//!
//! There is no SQL text parser in this workspace; statements arrive as
//! serialized ASTs. Statement example:
//! ```yaml
//! text: "SELECT * FROM t WHERE id = 1"
//! stmt:
//!   kind: select
//!   fields: [ { wildcard: {} } ]
//!   from: { table_refs: { left: { table_source: { source: { table: { name: t } } } } } }
//!   where_clause:
//!     binary:
//!       op: eq
//!       left: { column: { name: { name: id } } }
//!       right: { literal: { int: 1 } }
//! ```
//!
//! Catalog example:
//! ```yaml
//! version: 3
//! databases:
//!   - name: test
//!     tables:
//!       - name: t
//!         columns:
//!           - { name: id, type: Int64, nullable: false }
//!           - { name: v,  type: Utf8 }
//!         indexes:
//!           - { name: PRIMARY, columns: [id], primary: true }
//! ```

use serde::{Deserialize, Serialize};

use sqlfront_core::ast::{Statement, StatementNode};
use sqlfront_core::id::SchemaVersion;
use sqlfront_core::schema::{ColumnSpec, DataType, InfoSchema, InfoSchemaBuilder};

use crate::error::{PlanError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatementDoc {
    #[serde(default)]
    text: String,
    stmt: Statement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDoc {
    #[serde(default = "first_version")]
    pub version: u64,
    #[serde(default)]
    pub databases: Vec<DatabaseDef>,
}

fn first_version() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDef {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<FieldDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "nullable_by_default")]
    pub nullable: bool,
}

fn nullable_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
}

/// Parse one YAML statement document. A missing `text` becomes "".
pub fn parse_yaml_statement(yaml_src: &str) -> Result<StatementNode> {
    let doc: StatementDoc = serde_yaml::from_str(yaml_src)?;
    Ok(StatementNode::new(doc.text, doc.stmt))
}

/// Parse a YAML catalog into a schema snapshot at the document's version.
pub fn parse_yaml_catalog(yaml_src: &str) -> Result<InfoSchema> {
    let doc: CatalogDoc = serde_yaml::from_str(yaml_src)?;
    build_catalog(doc)
}

pub fn build_catalog(doc: CatalogDoc) -> Result<InfoSchema> {
    let load = |e: sqlfront_core::error::Error| PlanError::Load(e.to_string());
    let mut b = InfoSchemaBuilder::new();
    for db in &doc.databases {
        b.add_database(&db.name).map_err(load)?;
        for t in &db.tables {
            let columns = t
                .columns
                .iter()
                .map(|f| ColumnSpec::new(f.name.clone(), DataType::parse(&f.data_type), f.nullable))
                .collect();
            b.add_table(&db.name, &t.name, columns).map_err(load)?;
            for idx in &t.indexes {
                b.add_index(
                    &db.name,
                    &t.name,
                    &idx.name,
                    idx.columns.clone(),
                    idx.unique || idx.primary,
                    idx.primary,
                )
                .map_err(load)?;
            }
        }
    }
    Ok(b.build(SchemaVersion::new(doc.version)))
}

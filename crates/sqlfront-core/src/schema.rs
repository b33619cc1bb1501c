//! Schema types. Pure data; no locking here.
//!
//! Two layers live in this module:
//! - `DataType`/`Field`/`Schema`: the output row shape of a plan node.
//! - `InfoSchema`: an immutable, versioned snapshot of all database/table
//!   metadata. Snapshots are published by the session layer's `Domain` and
//!   shared as `Arc<InfoSchema>`; nothing mutates a snapshot after `build()`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{ColumnId, DatabaseId, IndexId, SchemaVersion, TableId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date64,
    Decimal128,
    /// Type not known yet (e.g. the value of a parameter marker).
    Unknown,
}

impl DataType {
    /// Lenient name parsing used by the YAML loaders.
    pub fn parse(s: &str) -> DataType {
        match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => DataType::Boolean,
            "int32" | "i32" | "int" | "integer" => DataType::Int32,
            "int64" | "i64" | "bigint" => DataType::Int64,
            "float32" | "f32" | "float" => DataType::Float32,
            "float64" | "f64" | "double" => DataType::Float64,
            "binary" | "bytes" | "blob" => DataType::Binary,
            "date64" | "date" | "datetime" | "timestamp" => DataType::Date64,
            "decimal128" | "decimal" => DataType::Decimal128,
            _ => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    /// Concatenate two schemas (join output).
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        Schema { fields }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub id: ColumnId,
    pub name: String,
    pub offset: usize,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub id: IndexId,
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indices: Vec<IndexInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn index(&self, name: &str) -> Option<&IndexInfo> {
        self.indices
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    /// Row shape of a full scan over this table.
    pub fn row_schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name.clone(), c.data_type.clone(), c.nullable))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbInfo {
    pub id: DatabaseId,
    pub name: String,
    /// Keyed by lower-cased table name.
    pub tables: BTreeMap<String, TableInfo>,
}

impl DbInfo {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(&name.to_ascii_lowercase())
    }
}

/// Immutable, versioned view of all database/table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSchema {
    version: SchemaVersion,
    /// Keyed by lower-cased database name.
    databases: BTreeMap<String, DbInfo>,
}

impl InfoSchema {
    /// An empty snapshot at the given version.
    pub fn empty(version: SchemaVersion) -> Self {
        Self {
            version,
            databases: BTreeMap::new(),
        }
    }

    pub fn schema_meta_version(&self) -> SchemaVersion {
        self.version
    }

    pub fn database(&self, name: &str) -> Option<&DbInfo> {
        self.databases.get(&name.to_ascii_lowercase())
    }

    pub fn table(&self, db: &str, table: &str) -> Option<&TableInfo> {
        self.database(db)?.table(table)
    }

    pub fn databases(&self) -> impl Iterator<Item = &DbInfo> {
        self.databases.values()
    }

    /// Start a builder pre-populated with this snapshot's metadata.
    ///
    /// The builder's output gets whatever version the publisher assigns.
    pub fn to_builder(&self) -> InfoSchemaBuilder {
        InfoSchemaBuilder {
            databases: self.databases.clone(),
            next_id: self.max_id() + 1,
        }
    }

    fn max_id(&self) -> u64 {
        let mut max = 0;
        for db in self.databases.values() {
            max = max.max(db.id.get());
            for t in db.tables.values() {
                max = max.max(t.id.get());
                for c in &t.columns {
                    max = max.max(c.id.get());
                }
                for i in &t.indices {
                    max = max.max(i.id.get());
                }
            }
        }
        max
    }
}

/// Column declaration accepted by `InfoSchemaBuilder::add_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Assigns ids and assembles an `InfoSchema`.
#[derive(Debug, Clone)]
pub struct InfoSchemaBuilder {
    databases: BTreeMap<String, DbInfo>,
    next_id: u64,
}

impl Default for InfoSchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InfoSchemaBuilder {
    pub fn new() -> Self {
        Self {
            databases: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_database(&mut self, name: &str) -> Result<&mut Self> {
        let key = name.to_ascii_lowercase();
        if self.databases.contains_key(&key) {
            return Err(Error::Schema(format!("database '{name}' already exists")));
        }
        let id = DatabaseId::new(self.alloc());
        self.databases.insert(
            key,
            DbInfo {
                id,
                name: name.to_string(),
                tables: BTreeMap::new(),
            },
        );
        Ok(self)
    }

    pub fn drop_database(&mut self, name: &str) -> Result<&mut Self> {
        self.databases
            .remove(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::Schema(format!("database '{name}' does not exist")))?;
        Ok(self)
    }

    pub fn add_table(&mut self, db: &str, name: &str, columns: Vec<ColumnSpec>) -> Result<&mut Self> {
        if columns.is_empty() {
            return Err(Error::Schema(format!("table '{name}' has no columns")));
        }
        let table_id = TableId::new(self.alloc());
        let mut infos = Vec::with_capacity(columns.len());
        for (offset, spec) in columns.into_iter().enumerate() {
            if infos
                .iter()
                .any(|c: &ColumnInfo| c.name.eq_ignore_ascii_case(&spec.name))
            {
                return Err(Error::Schema(format!(
                    "duplicate column '{}' in table '{name}'",
                    spec.name
                )));
            }
            infos.push(ColumnInfo {
                id: ColumnId::new(self.alloc()),
                name: spec.name,
                offset,
                data_type: spec.data_type,
                nullable: spec.nullable,
            });
        }

        let db_info = self
            .databases
            .get_mut(&db.to_ascii_lowercase())
            .ok_or_else(|| Error::Schema(format!("database '{db}' does not exist")))?;
        let key = name.to_ascii_lowercase();
        if db_info.tables.contains_key(&key) {
            return Err(Error::Schema(format!("table '{db}.{name}' already exists")));
        }
        db_info.tables.insert(
            key,
            TableInfo {
                id: table_id,
                name: name.to_string(),
                columns: infos,
                indices: Vec::new(),
            },
        );
        Ok(self)
    }

    pub fn drop_table(&mut self, db: &str, name: &str) -> Result<&mut Self> {
        self.databases
            .get_mut(&db.to_ascii_lowercase())
            .and_then(|d| d.tables.remove(&name.to_ascii_lowercase()))
            .ok_or_else(|| Error::Schema(format!("table '{db}.{name}' does not exist")))?;
        Ok(self)
    }

    pub fn add_index(
        &mut self,
        db: &str,
        table: &str,
        name: &str,
        columns: Vec<String>,
        unique: bool,
        primary: bool,
    ) -> Result<&mut Self> {
        let id = IndexId::new(self.alloc());
        let info = self
            .databases
            .get_mut(&db.to_ascii_lowercase())
            .and_then(|d| d.tables.get_mut(&table.to_ascii_lowercase()))
            .ok_or_else(|| Error::Schema(format!("table '{db}.{table}' does not exist")))?;
        if let Some(missing) = columns.iter().find(|c| info.column(c).is_none()) {
            return Err(Error::Schema(format!(
                "index '{name}' references unknown column '{missing}'"
            )));
        }
        if info.index(name).is_some() {
            return Err(Error::Schema(format!("index '{name}' already exists")));
        }
        info.indices.push(IndexInfo {
            id,
            name: name.to_string(),
            columns,
            unique,
            primary,
        });
        Ok(self)
    }

    /// Freeze into an immutable snapshot at `version`.
    pub fn build(self, version: SchemaVersion) -> InfoSchema {
        InfoSchema {
            version,
            databases: self.databases,
        }
    }
}

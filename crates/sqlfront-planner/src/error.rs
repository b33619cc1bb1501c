use thiserror::Error;

/// Result type local to sqlfront-planner.
pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("unknown database '{0}'")]
    UnknownDatabase(String),

    #[error("table '{db}.{table}' doesn't exist")]
    UnknownTable { db: String, table: String },

    #[error("unknown column '{column}' in {context}")]
    UnknownColumn { column: String, context: &'static str },

    #[error("column '{0}' is ambiguous")]
    AmbiguousColumn(String),

    #[error("database '{0}' already exists")]
    DatabaseExists(String),

    #[error("table '{db}.{table}' already exists")]
    TableExists { db: String, table: String },

    #[error("unknown index '{index}' on table '{table}'")]
    UnknownIndex { table: String, index: String },

    #[error("not unique table/alias: '{0}'")]
    DuplicateAlias(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unresolved name '{0}'; preprocess must run before optimize")]
    Unresolved(String),

    #[error("unsupported statement: {0}")]
    Unsupported(String),

    #[error("statement load error: {0}")]
    Load(String),
}

impl From<serde_yaml::Error> for PlanError {
    fn from(e: serde_yaml::Error) -> Self {
        PlanError::Load(e.to_string())
    }
}

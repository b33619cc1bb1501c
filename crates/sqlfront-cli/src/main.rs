//! sqlfront CLI: classify, compile and explain YAML statements.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlfront_core::config::CompilerConfig;
use sqlfront_core::id::{ConnectionId, SchemaVersion};
use sqlfront_exec::{statement_counts, statement_label, CompiledStatement, Compiler};
use sqlfront_planner::{parse_yaml_catalog, parse_yaml_statement};
use sqlfront_session::{Domain, SessionState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlfront")]
#[command(about = "Compile parsed SQL statements into schema-bound plans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the classification label of a statement
    Classify {
        /// Path to the statement YAML file
        #[arg(short, long)]
        statement: PathBuf,
    },

    /// Compile a statement against a catalog
    Compile {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Path to the statement YAML file
        #[arg(short, long)]
        statement: PathBuf,

        /// Current database (overrides config)
        #[arg(long)]
        database: Option<String>,

        /// Compile against this retained schema version instead of the live one
        #[arg(long)]
        pin_version: Option<u64>,

        /// Record the schema version in the session binlog (overrides config)
        #[arg(long)]
        binlog: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the physical plan of a statement (EXPLAIN)
    Explain {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Path to the statement YAML file
        #[arg(short, long)]
        statement: PathBuf,

        /// Current database (overrides config)
        #[arg(long)]
        database: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify { statement } => classify(&statement),
        Commands::Compile {
            catalog,
            statement,
            database,
            pin_version,
            binlog,
            json,
        } => {
            let mut cfg = CompilerConfig::from_env();
            apply_overrides(&mut cfg, database, binlog);
            compile(&catalog, &statement, &cfg, pin_version, json)
        }
        Commands::Explain {
            catalog,
            statement,
            database,
        } => {
            let mut cfg = CompilerConfig::from_env();
            apply_overrides(&mut cfg, database, false);
            explain(&catalog, &statement, &cfg)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn apply_overrides(cfg: &mut CompilerConfig, database: Option<String>, binlog: bool) {
    if let Some(db) = database {
        cfg.default_database = Some(db);
    }
    if binlog {
        cfg.binlog_enabled = true;
    }
}

fn classify(statement: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let node = parse_yaml_statement(&fs::read_to_string(statement)?)?;
    println!("{}", statement_label(node.stmt()));
    Ok(())
}

fn compile_file(
    catalog: &Path,
    statement: &Path,
    cfg: &CompilerConfig,
    pin_version: Option<u64>,
) -> Result<(CompiledStatement, SessionState), Box<dyn std::error::Error>> {
    cfg.validate()?;
    let schema = parse_yaml_catalog(&fs::read_to_string(catalog)?)?;
    let mut node = parse_yaml_statement(&fs::read_to_string(statement)?)?;

    let domain = Arc::new(Domain::with_schema(schema, cfg.schema_history_capacity));
    let mut session = SessionState::with_config(ConnectionId::new(1), cfg);
    if let Some(v) = pin_version {
        session.pin_snapshot(&domain, SchemaVersion::new(v))?;
    }

    let compiler = Compiler::from_config(domain, cfg);
    let compiled = compiler.compile(&mut session, &mut node)?;
    Ok((compiled, session))
}

fn compile(
    catalog: &Path,
    statement: &Path,
    cfg: &CompilerConfig,
    pin_version: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (compiled, session) = compile_file(catalog, statement, cfg, pin_version)?;
    let summary = compiled.summary()?;

    if json {
        let out = serde_json::json!({
            "statement": summary,
            "binlog_schema_version": session.binlog().schema_version(),
            "counts": statement_counts(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("✓ Compiled {} ({})", summary.label, summary.id);
    println!("  Text: {}", summary.text);
    println!("  DDL: {}", summary.is_ddl);
    println!("  Read-only: {}", summary.read_only);
    println!("  Schema version: {}", summary.schema_version.get());
    println!("  Plan digest: {}", summary.plan_digest);
    if let Some(v) = session.binlog().schema_version() {
        println!("  Binlog schema version: {}", v.get());
    }
    Ok(())
}

fn explain(
    catalog: &Path,
    statement: &Path,
    cfg: &CompilerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (compiled, _) = compile_file(catalog, statement, cfg, None)?;
    println!("Statement Plan");
    println!("==============");
    println!();
    println!("Label: {}", compiled.label());
    println!("Schema version: {}", compiled.schema_version().get());
    println!();
    print!("{}", compiled.plan().explain());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_overrides, CompilerConfig};

    #[test]
    fn flags_override_env_defaults() {
        let mut cfg = CompilerConfig::default();
        apply_overrides(&mut cfg, Some("test".into()), true);
        assert_eq!(cfg.default_database.as_deref(), Some("test"));
        assert!(cfg.binlog_enabled);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut cfg = CompilerConfig {
            binlog_enabled: true,
            default_database: Some("prod".into()),
            ..Default::default()
        };
        apply_overrides(&mut cfg, None, false);
        assert_eq!(cfg.default_database.as_deref(), Some("prod"));
        assert!(cfg.binlog_enabled);
    }
}

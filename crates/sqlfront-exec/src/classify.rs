//! Statement classification for observability.
//!
//! Labels are stable strings; they partition the statement counter and
//! are never used for control flow.

use sqlfront_core::ast::{ResultSetNode, SelectStmt, Statement, TableSourceKind};

/// Label for statement kinds without a dedicated label.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Map a statement to its counter label. Total: never fails.
pub fn statement_label(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::AlterTable(_) => "AlterTable",
        Statement::AnalyzeTable(_) => "AnalyzeTable",
        Statement::Begin(_) => "Begin",
        Statement::Commit => "Commit",
        Statement::CreateDatabase(_) => "CreateDatabase",
        Statement::CreateIndex(_) => "CreateIndex",
        Statement::CreateTable(_) => "CreateTable",
        Statement::CreateUser(_) => "CreateUser",
        Statement::Deallocate(_) => "Deallocate",
        Statement::Delete(_) => "Delete",
        Statement::Do(_) => "Do",
        Statement::DropDatabase(_) => "DropDatabase",
        Statement::DropIndex(_) => "DropIndex",
        Statement::DropTable(_) => "DropTable",
        Statement::DropUser(_) => "DropUser",
        Statement::Execute(_) => "Execute",
        Statement::Explain(_) => "Explain",
        Statement::FlushTable(_) => "FlushTable",
        Statement::Grant(_) => "Grant",
        Statement::Insert(ins) if ins.is_replace => "Replace",
        Statement::Insert(_) => "Insert",
        Statement::LoadData(_) => "LoadData",
        Statement::Prepare(_) => "Prepare",
        Statement::Rollback => "Rollback",
        Statement::Select(sel) if is_simple_select(sel) => "Select-Simple",
        Statement::Select(_) => "Select-Complex",
        Statement::SetPassword(_) => "SetPwd",
        Statement::Show(_) => "Show",
        Statement::TruncateTable(_) => "TruncateTable",
        Statement::Update(_) => "Update",
        Statement::Union(_) | Statement::Use(_) | Statement::Set(_) => UNKNOWN_LABEL,
    }
}

/// No FROM, or FROM a single non-joined base table.
fn is_simple_select(sel: &SelectStmt) -> bool {
    let Some(from) = &sel.from else {
        return true;
    };
    let refs = &from.table_refs;
    refs.right.is_none()
        && matches!(
            &refs.left,
            ResultSetNode::TableSource(ts) if matches!(ts.source, TableSourceKind::Table(_))
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::ast::{InsertSource, InsertStmt, TableName, TableRefsClause};

    #[test]
    fn replace_modifier_changes_insert_label() {
        let mut ins = InsertStmt {
            is_replace: false,
            ignore: false,
            table: TableName::new("t"),
            columns: vec![],
            source: InsertSource::Values(vec![]),
            on_duplicate: vec![],
        };
        assert_eq!(statement_label(&Statement::Insert(ins.clone())), "Insert");
        ins.is_replace = true;
        assert_eq!(statement_label(&Statement::Insert(ins)), "Replace");
    }

    #[test]
    fn select_without_from_is_simple() {
        assert_eq!(
            statement_label(&Statement::Select(SelectStmt::default())),
            "Select-Simple"
        );
    }

    #[test]
    fn derived_table_select_is_complex() {
        let mut from = TableRefsClause::table(TableName::new("t"));
        if let ResultSetNode::TableSource(ts) = &mut from.table_refs.left {
            ts.source = TableSourceKind::Select(Box::new(SelectStmt::default()));
            ts.as_name = Some("d".into());
        }
        let sel = SelectStmt {
            from: Some(from),
            ..Default::default()
        };
        assert_eq!(statement_label(&Statement::Select(sel)), "Select-Complex");
    }
}

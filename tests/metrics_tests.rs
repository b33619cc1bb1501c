//! Process-wide statement counter.

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use sqlfront_exec::{statement_counts, Compiler, LabeledCounter, STATEMENT_COUNTER};

#[test]
fn test_default_compiler_counts_into_global_counter() {
    let before = STATEMENT_COUNTER.get("CreateTable");
    let compiler = Compiler::new(domain());

    compiler
        .compile(&mut session(), &mut create_table("counted"))
        .unwrap();
    // Failed compiles are counted too.
    assert!(compiler
        .compile(&mut session(), &mut create_table("t"))
        .is_err());

    // Other tests share the counter, so only a lower bound holds.
    assert!(STATEMENT_COUNTER.get("CreateTable") >= before + 2);
    assert!(statement_counts().get("CreateTable").copied().unwrap_or(0) >= 2);
}

#[test]
fn test_metrics_disabled_leaves_counter_alone() {
    let cfg = sqlfront_core::config::CompilerConfig {
        metrics_enabled: false,
        ..Default::default()
    };
    let compiler = Compiler::from_config(domain(), &cfg);
    let before = STATEMENT_COUNTER.get("Update");
    compiler.compile(&mut session(), &mut update_t()).unwrap();
    // No other test in this binary compiles an UPDATE.
    assert_eq!(STATEMENT_COUNTER.get("Update"), before);
}

#[test]
fn test_concurrent_compiles_share_one_counter() {
    let counter = Arc::new(LabeledCounter::new());
    let compiler = Arc::new(Compiler::new(domain()).with_metrics(counter.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let compiler = Arc::clone(&compiler);
            thread::spawn(move || {
                for _ in 0..25 {
                    compiler
                        .compile(&mut session(), &mut select_star("t"))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(counter.get("Select-Simple"), 100);
    assert_eq!(counter.snapshot().len(), 1);
}

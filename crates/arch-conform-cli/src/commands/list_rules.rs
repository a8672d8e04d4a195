//! List rules command implementation.

use arch_conform_core::rules::builtin_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<8} {:<18} {:<18} Description", "Code", "Name", "Config table");
    println!("{}", "-".repeat(100));

    for rule in builtin_rules() {
        println!(
            "{:<8} {:<18} {:<18} {}",
            rule.code,
            rule.name,
            format!("[[{}]]", rule.table),
            rule.description
        );
    }

    println!("\nRules are instantiated from arch-conform.toml; each instance has its own name.");
    println!("Use --rules to filter by instance name or code, e.g.:");
    println!("  arch-conform check --rules slices-free-of-cycles");
    println!("  arch-conform check --rules AC001,AC003");
}

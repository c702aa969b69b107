use std::path::Path;

use anyhow::{bail, Context};
use codetree_server::{CodeTreeServer, ServerConfig};
use codetree_store::{CodeTree, IntegrityReport, JsonFileStore, TreeConfig};
use codetree_types::{CodeNode, RawCodeNode};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::*;

type FileTree = CodeTree<JsonFileStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let json = matches!(cli.format, OutputFormat::Json);
    let tree = open_tree(&cli);
    match cli.command {
        Command::Serve(args) => cmd_serve(args, cli.data, cli.no_depth_check),
        Command::List(args) => cmd_list(&tree, args, json),
        Command::Children(args) => cmd_children(&tree, args, json),
        Command::Show(args) => cmd_show(&tree, args, json),
        Command::Import(args) => cmd_import(&tree, args, json),
        Command::Delete(args) => cmd_delete(&tree, args, json),
        Command::Check(_) => cmd_check(&tree, json),
    }
}

fn open_tree(cli: &Cli) -> FileTree {
    let config = TreeConfig {
        enforce_depth: !cli.no_depth_check,
    };
    CodeTree::with_config(JsonFileStore::new(cli.data_path()), config)
}

fn cmd_serve(
    args: ServeArgs,
    data: Option<std::path::PathBuf>,
    no_depth_check: bool,
) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address: {bind}"))?;
    }
    if let Some(data) = data {
        config.data_path = data;
    }
    if no_depth_check {
        config.enforce_depth = false;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(CodeTreeServer::new(config).serve())?;
    Ok(())
}

fn cmd_list(tree: &FileTree, args: ListArgs, json: bool) -> anyhow::Result<()> {
    let depth = args.depth.max(1);
    let nodes = tree.list_by_depth(depth)?;
    if json {
        return print_json(&nodes);
    }
    if nodes.is_empty() {
        println!("No codes at depth {}.", depth);
    }
    for node in &nodes {
        print_node(node, 0);
    }
    Ok(())
}

fn cmd_children(tree: &FileTree, args: ChildrenArgs, json: bool) -> anyhow::Result<()> {
    let parent = args.parent.as_deref().filter(|p| !p.is_empty());
    let nodes = tree.list_children(parent)?;
    if json {
        return print_json(&nodes);
    }
    match parent {
        Some(p) => println!("Children of {}:", p.yellow().bold()),
        None => println!("Roots:"),
    }
    for node in &nodes {
        print_node(node, 1);
    }
    Ok(())
}

fn cmd_show(tree: &FileTree, args: ShowArgs, json: bool) -> anyhow::Result<()> {
    let found = tree.get_with_children(&args.code)?;
    if json {
        return print_json(&found);
    }
    print_node(&found.node, 0);
    if let Some(parent) = &found.node.parent_code {
        println!("  Parent: {}", parent.yellow());
    }
    if let Some(remark) = &found.node.remark {
        println!("  Remark: {}", remark);
    }
    if let Some(at) = found.node.updated_at {
        println!("  Updated: {}", at.to_rfc3339().dimmed());
    }
    for child in &found.children {
        print_node(child, 1);
    }
    Ok(())
}

fn cmd_import(tree: &FileTree, args: ImportArgs, json: bool) -> anyhow::Result<()> {
    let raw = read_import(&args.file)?;
    let outcome = tree.upsert_codes(&raw)?;
    if json {
        return print_json(&outcome);
    }
    println!(
        "{} Saved {} codes from {}",
        "✓".green().bold(),
        outcome.saved.len(),
        args.file.display()
    );
    for node in &outcome.saved {
        print_node(node, 1);
    }
    Ok(())
}

fn cmd_delete(tree: &FileTree, args: DeleteArgs, json: bool) -> anyhow::Result<()> {
    let outcome = tree.delete_with_descendants(&args.code)?;
    if json {
        print_json(&outcome)?;
    } else if let Some(count) = outcome.count {
        println!(
            "{} Deleted {} ({} codes)",
            "✓".green().bold(),
            args.code.yellow(),
            count
        );
    }
    if !outcome.deleted {
        bail!("code not found: {}", args.code);
    }
    Ok(())
}

fn cmd_check(tree: &FileTree, json: bool) -> anyhow::Result<()> {
    let report = tree.check()?;
    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    if !report.is_valid() {
        bail!("{} integrity violations", report.violations.len());
    }
    Ok(())
}

/// Read an import file holding either `{ "codes": [...] }` or a bare array.
fn read_import(path: &Path) -> anyhow::Result<Vec<RawCodeNode>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    parse_import(value)
}

fn parse_import(value: Value) -> anyhow::Result<Vec<RawCodeNode>> {
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("codes") {
            Some(Value::Array(items)) => items,
            _ => bail!("codes array is required"),
        },
        _ => bail!("codes array is required"),
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| -> anyhow::Result<RawCodeNode> {
            if !entry.is_object() {
                bail!("codes[{i}] must be an object");
            }
            Ok(serde_json::from_value(entry)?)
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_node(node: &CodeNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let line = format!(
        "{}{} {} (depth {}, order {})",
        pad,
        node.code.yellow().bold(),
        node.name,
        node.depth,
        node.sort_order
    );
    if node.use_yn {
        println!("{}", line);
    } else {
        println!("{} {}", line.dimmed(), "[inactive]".dimmed());
    }
}

fn print_report(report: &IntegrityReport) {
    println!(
        "{} codes, {} roots",
        report.node_count.to_string().bold(),
        report.root_count.to_string().bold()
    );
    if report.is_valid() {
        println!("{} No issues.", "✓".green().bold());
        return;
    }
    for violation in &report.violations {
        println!(
            "  {} {} {:?}: {}",
            "✗".red().bold(),
            violation.code.yellow(),
            violation.kind,
            violation.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    fn cli(data: &Path, args: &[&str]) -> Cli {
        let data = data.to_str().unwrap().to_string();
        let mut argv = vec!["codetree".to_string(), "--data".to_string(), data];
        argv.extend(args.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    fn write_import(dir: &Path, value: Value) -> std::path::PathBuf {
        let path = dir.join("import.json");
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn parse_import_accepts_both_shapes() {
        let wrapped = parse_import(json!({ "codes": [{ "code": "A", "name": "a" }] })).unwrap();
        assert_eq!(wrapped.len(), 1);

        let bare = parse_import(json!([{ "code": "A", "name": "a" }, { "code": "B", "name": "b" }])).unwrap();
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn parse_import_rejects_bad_shapes() {
        let err = parse_import(json!({ "items": [] })).unwrap_err();
        assert_eq!(err.to_string(), "codes array is required");

        let err = parse_import(json!([{ "code": "A", "name": "a" }, 7])).unwrap_err();
        assert_eq!(err.to_string(), "codes[1] must be an object");

        assert!(parse_import(json!("codes")).is_err());
    }

    #[test]
    fn import_then_delete_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("code-tree.json");
        let file = write_import(
            dir.path(),
            json!({ "codes": [
                { "code": "acc", "name": "Accounts" },
                { "code": "acc01", "name": "Cash", "parentCode": "ACC", "depth": 2 },
            ]}),
        );

        run_command(cli(&data, &["import", file.to_str().unwrap()])).unwrap();
        run_command(cli(&data, &["--format", "json", "show", "ACC"])).unwrap();
        run_command(cli(&data, &["check"])).unwrap();

        let store = JsonFileStore::new(&data);
        let tree = CodeTree::new(store);
        assert_eq!(tree.list_by_depth(2).unwrap()[0].code, "ACC01");

        run_command(cli(&data, &["delete", "acc"])).unwrap();
        assert!(tree.list_by_depth(1).unwrap().is_empty());
        assert!(run_command(cli(&data, &["delete", "acc"])).is_err());
    }

    #[test]
    fn depth_check_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("code-tree.json");
        let file = write_import(dir.path(), json!([{ "code": "A", "name": "a", "depth": 4 }]));

        assert!(run_command(cli(&data, &["import", file.to_str().unwrap()])).is_err());
        run_command(cli(&data, &["--no-depth-check", "import", file.to_str().unwrap()])).unwrap();
        run_command(cli(&data, &["list", "--depth", "4"])).unwrap();
    }

    #[test]
    fn show_missing_code_fails() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("code-tree.json");
        assert!(run_command(cli(&data, &["show", "NOPE"])).is_err());
    }
}

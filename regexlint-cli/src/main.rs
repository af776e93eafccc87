use std::io::BufRead;

use clap::Parser;
use regexlint::{
    rules::{CaptureReferenceTable, Linter},
    syntax::parse_literal,
};

/// Lint ECMAScript regular expression literals
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Literals like `/a|b/u`. Read from stdin, one per line, if none are given
    literals: Vec<String>,

    /// Replacement strings the literals are used with, e.g. `$1-$<name>`.
    /// Enables reporting of unused capturing groups
    #[arg(short, long)]
    replacement: Vec<String>,

    /// Only run these rules
    #[arg(long)]
    rule: Vec<String>,

    /// Print the fixed pattern after each fixable diagnostic
    #[arg(long)]
    fix: bool,
}

/// One literal per non-blank line.
fn read_literals(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut literals = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            literals.push(line);
        }
    }
    Ok(literals)
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let linter = Linter::all();
    let unknown: Vec<_> = args
        .rule
        .iter()
        .filter(|r| !linter.rule_names().any(|name| name == r.as_str()))
        .collect();
    if !unknown.is_empty() {
        eprintln!("unknown rules: {unknown:?}");
        std::process::exit(2);
    }

    let captures = (!args.replacement.is_empty()).then(|| {
        let mut table = CaptureReferenceTable::new();
        for replacement in &args.replacement {
            table.replacement(replacement);
        }
        table
    });

    let literals = if args.literals.is_empty() {
        match read_literals(std::io::stdin().lock()) {
            Ok(literals) => literals,
            Err(e) => {
                eprintln!("stdin: {e}");
                std::process::exit(2);
            }
        }
    } else {
        args.literals
    };

    let mut reported = 0;
    let mut failed = false;
    for literal in &literals {
        let ast = match parse_literal(literal) {
            Ok(ast) => ast,
            Err(e) => {
                eprintln!("{literal}: {e}");
                failed = true;
                continue;
            }
        };
        log::debug!("{ast:?}: {} nodes", ast.len());

        for diagnostic in linter.lint_ast(&ast, captures.as_ref()) {
            if !args.rule.is_empty() && !args.rule.iter().any(|r| r == diagnostic.rule) {
                continue;
            }
            reported += 1;
            let span = diagnostic.span.clone();
            println!(
                "{literal}:{}-{}: {} [{}]",
                span.start, span.end, diagnostic.message, diagnostic.rule
            );
            println!("    {}", ast.source());
            println!(
                "    {}{}",
                " ".repeat(ast.source()[..span.start].chars().count()),
                "^".repeat(ast.source()[span].chars().count().max(1))
            );
            if args.fix {
                if let Some(fix) = &diagnostic.fix {
                    println!("    fixed: /{}/{}", fix.apply(ast.source()), ast.flags());
                }
            }
        }
    }

    std::process::exit(match (failed, reported) {
        (true, _) => 2,
        (false, 0) => 0,
        (false, _) => 1,
    });
}

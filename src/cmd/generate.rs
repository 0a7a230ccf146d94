//! Generate command CLI handler.

use super::{GenerateArgs, SchemaArgs};
use anyhow::{bail, Context};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sql_seeder::config::{self, GenerateConfig, GenerateYamlConfig};
use sql_seeder::generate::{self, ProgressFn};
use sql_seeder::schema::{files, RelationshipGraph};
use sql_seeder::writer::{Dialect, OutputWriter};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Settings gathered from the config file and flags
pub(super) struct Resolved {
    pub config: GenerateConfig,
    pub schema_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dialect: Dialect,
}

/// Merge defaults, the optional YAML file and command-line flags
pub(super) fn resolve(schema: &SchemaArgs, args: Option<&GenerateArgs>) -> anyhow::Result<Resolved> {
    let yaml = match &schema.config {
        Some(path) => GenerateYamlConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GenerateYamlConfig::default(),
    };

    let mut config = GenerateConfig::default();
    config.apply_yaml(&yaml)?;

    if let Some(keys) = &schema.key_fields {
        config.key_fields = config::parse_list(keys);
    }
    if let Some(map) = &schema.foreign_map {
        config.foreign_map = config::parse_foreign_map(map)?;
    }
    if let Some(exclude) = &schema.exclude {
        config.exclude.extend(config::parse_list(exclude));
    }

    let mut output_dir = yaml.output_dir.clone();
    let mut dialect = yaml.dialect.clone();
    if let Some(args) = args {
        if let Some(n) = &args.num_rows {
            config.num_rows = config::parse_count("num_rows", n)?;
        }
        if let Some(m) = &args.multipliers {
            for (table, multiplier) in config::parse_multipliers(m)? {
                config.set_multiplier(&table, multiplier);
            }
        }
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        if let Some(rate) = args.null_rate {
            config.null_rate = rate;
        }
        if let Some(date) = &args.reference_date {
            config.reference_date = Some(config::parse_date(date)?);
        }
        if args.output_dir.is_some() {
            output_dir = args.output_dir.clone();
        }
        if args.dialect.is_some() {
            dialect = args.dialect.clone();
        }
    }
    config.validate()?;

    let schema_dir = match schema.schema_dir.clone().or(yaml.schema_dir) {
        Some(dir) => dir,
        None => bail!("--schema-dir is required (or schema_dir in the config file)"),
    };
    let dialect = match dialect {
        Some(d) => d.parse::<Dialect>().map_err(|e| anyhow::anyhow!("{}", e))?,
        None => Dialect::default(),
    };

    Ok(Resolved {
        config,
        schema_dir,
        output_dir: output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        dialect,
    })
}

/// Load the schema directory and build the relationship graph
pub(super) fn load_graph(resolved: &Resolved) -> anyhow::Result<RelationshipGraph> {
    let tables = files::load_schema_dir(&resolved.schema_dir, &resolved.config.exclude)
        .with_context(|| format!("reading schema from {}", resolved.schema_dir.display()))?;
    let graph = RelationshipGraph::build(
        tables,
        &resolved.config.key_fields,
        &resolved.config.foreign_map,
    )?;
    Ok(graph)
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let resolved = resolve(&args.schema, Some(&args))?;
    let graph = load_graph(&resolved)?;

    let seed = resolved.config.seed.unwrap_or_else(rand::random);
    let mut assembler = generate::seeded_assembler(&resolved.config, seed);

    if args.dry_run {
        let plan = assembler.plan(&graph)?;
        eprintln!("Generation plan (dry run, seed {}):", seed);
        for step in &plan {
            let depth = graph.depth(step.id);
            let indent = "  ".repeat(depth + 1);
            match (&step.parent, step.multiplier) {
                (Some(parent), Some(m)) => eprintln!(
                    "{}{}: {} rows ({} x {} per row of {})",
                    indent,
                    step.table_name,
                    step.rows,
                    plan.iter()
                        .find(|p| &p.table_name == parent)
                        .map(|p| p.rows)
                        .unwrap_or(0),
                    m,
                    parent
                ),
                _ => eprintln!("{}{}: {} rows [parent]", indent, step.table_name, step.rows),
            }
        }
        eprintln!(
            "  Total: {} rows across {} tables",
            plan.iter().map(|p| p.rows).sum::<usize>(),
            plan.len()
        );
        return Ok(());
    }

    if args.progress {
        assembler = assembler.with_progress(table_progress());
    }

    info!(seed, schema_dir = %resolved.schema_dir.display(), "starting generation");
    let dataset = assembler.assemble(&graph)?;

    let writer = OutputWriter::new(&resolved.output_dir)
        .dialect(resolved.dialect)
        .combined(args.combined)
        .formats(!args.no_sql, !args.no_json);
    let written = writer
        .write(&dataset)
        .with_context(|| format!("writing output to {}", resolved.output_dir.display()))?;

    eprintln!("Generated data (seed {}):", seed);
    eprintln!("  Parent table: {}", graph.root_table().name);
    for table in dataset.iter() {
        eprintln!("  {}: {} rows", table.table_name, table.rows.len());
    }
    eprintln!(
        "  Files written: {} to {}",
        written.len(),
        resolved.output_dir.display()
    );
    eprintln!("  Elapsed: {:.3?}", start.elapsed());

    Ok(())
}

/// One bar per table, replaced when rows for the next table start arriving
fn table_progress() -> ProgressFn {
    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "  {spinner:.green} {msg:20} [{bar:30.cyan/blue}] {pos}/{len} rows",
    )
    .unwrap()
    .progress_chars("█▓▒░  ");
    let current: RefCell<Option<(String, ProgressBar)>> = RefCell::new(None);

    Box::new(move |table: &str, done: u64, total: u64| {
        let mut current = current.borrow_mut();
        let is_new = !matches!(&*current, Some((name, _)) if name == table);
        if is_new {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            let bar = multi.add(ProgressBar::new(total));
            bar.set_style(style.clone());
            bar.set_message(table.to_string());
            *current = Some((table.to_string(), bar));
        }
        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(done);
            if done >= total {
                bar.finish();
            }
        }
    })
}

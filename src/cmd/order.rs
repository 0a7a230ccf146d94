//! Order command - print the table generation order, parents first.

use super::generate::{load_graph, resolve};
use super::SchemaArgs;

pub fn run(schema: SchemaArgs) -> anyhow::Result<()> {
    let resolved = resolve(&schema, None)?;
    let graph = load_graph(&resolved)?;

    eprintln!("Generation order (parent: {}):", graph.root_table().name);
    for &id in graph.order() {
        let indent = "  ".repeat(graph.depth(id));
        match graph.parent(id) {
            Some(parent) => println!(
                "{}{} <- {}",
                indent,
                graph.table_name(id),
                graph.table_name(parent)
            ),
            None => println!("{}", graph.table_name(id)),
        }
    }

    Ok(())
}

use std::path::Path;

use serde::Serialize;
use shardwire_gump::{LayoutDecoder, LayoutHeader, LayoutTree, PlacedWidget};

use crate::cmd::{load_config, GumpArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat, LAYOUT_SCHEMA};

#[derive(Serialize)]
struct LayoutOutput<'a> {
    schema_id: &'static str,
    #[serde(flatten)]
    tree: &'a LayoutTree,
}

pub fn run(args: GumpArgs, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    let config = load_config(config, None)?;
    let layout = std::fs::read_to_string(&args.layout)
        .map_err(|err| io_error(&format!("read {}", args.layout.display()), err))?;
    let lines = match &args.lines {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    let header = LayoutHeader {
        gump_id: args.gump_id,
        ..LayoutHeader::default()
    };
    let mut decoder = LayoutDecoder::with_config(config.layout);
    let tree = decoder.build(header, &layout, lines);
    if tree.skipped > 0 {
        tracing::warn!(skipped = tree.skipped, "layout commands skipped");
    }

    print_layout(&tree, format);
    Ok(SUCCESS)
}

fn print_layout(tree: &LayoutTree, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&LayoutOutput {
            schema_id: LAYOUT_SCHEMA,
            tree,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PAGE", "TYPE", "X", "Y", "DETAIL"]);
            for placed in &tree.widgets {
                let (x, y) = placed.widget.position();
                table.add_row(vec![
                    placed.page.to_string(),
                    placed.widget.kind().to_string(),
                    x.to_string(),
                    y.to_string(),
                    detail(placed),
                ]);
            }
            println!("{table}");
            if tree.skipped > 0 {
                println!("{} command(s) skipped", tree.skipped);
            }
        }
        OutputFormat::Pretty => {
            println!(
                "layout {} at ({}, {}): {} widgets, {} lines, {} skipped",
                tree.gump_id,
                tree.x,
                tree.y,
                tree.widgets.len(),
                tree.lines.len(),
                tree.skipped
            );
            for placed in &tree.widgets {
                let (x, y) = placed.widget.position();
                println!(
                    "  page={} {} ({x}, {y}) {}",
                    placed.page,
                    placed.widget.kind(),
                    detail(placed)
                );
            }
        }
    }
}

/// Widget fields as compact JSON, minus the ones shown in their own column.
fn detail(placed: &PlacedWidget) -> String {
    let mut value = serde_json::to_value(&placed.widget).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        for key in ["type", "x", "y"] {
            map.remove(key);
        }
    }
    let mut text = value.to_string();
    if !placed.tooltips.is_empty() {
        text.push_str(&format!(" tooltips={}", placed.tooltips.len()));
    }
    if let Some(serial) = placed.item_property {
        text.push_str(&format!(" itemproperty=0x{serial:08X}"));
    }
    text
}

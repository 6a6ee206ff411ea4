//! Tag subcommand execution

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use taxa_core::{Tag, TagService, TagStore};

use crate::cli::TagCommands;

pub async fn execute<S: TagStore>(service: &TagService<S>, command: TagCommands) -> Result<()> {
    match command {
        TagCommands::Create {
            id,
            description,
            parent,
            umbrella,
        } => {
            let mut tag = Tag::new(id)
                .with_description(description)
                .with_use_filter(!umbrella);
            if let Some(parent) = parent {
                tag = tag.with_parent(parent);
            }
            let tag = service.create_tag(tag).await?;
            println!("Created tag `{}` ({})", tag.id, tag.display_name());
        }

        TagCommands::Show { name } => {
            let tag = service.find_by_name(&name).await?;
            let ancestors = service.ancestors(&tag.id).await?;
            let children = service.children(&tag.id).await?;

            println!("{}", render_tags(std::iter::once(&tag)));
            if !ancestors.is_empty() {
                let chain: Vec<&str> = ancestors.iter().map(|t| t.id.as_str()).collect();
                println!("Ancestors: {}", chain.join(" -> "));
            }
            if !children.is_empty() {
                println!("Children:");
                println!("{}", render_tags(children.iter()));
            }
        }

        TagCommands::Edit { id, description } => {
            service.set_description(&id, &description).await?;
            println!("Updated `{id}`");
        }

        TagCommands::Move { id, parent, root } => {
            let target = if root { None } else { parent };
            let tag = service.reparent(&id, target).await?;
            match &tag.parent {
                Some(parent) => println!("Moved `{}` under `{}`", tag.id, parent),
                None => println!("Detached `{}` to a root", tag.id),
            }
        }

        TagCommands::Rm { id } => {
            service.delete_tag(&id).await?;
            println!("Deleted `{id}`");
        }

        TagCommands::Ls { parent } => {
            let tags = match &parent {
                Some(parent) => service.children(parent).await?,
                None => service.roots().await?,
            };
            if tags.is_empty() {
                println!("(no tags)");
            } else {
                println!("{}", render_tags(tags.iter()));
            }
        }

        TagCommands::Tree => {
            for (depth, tag) in service.tree().await? {
                let marker = if tag.use_filter { "" } else { " (umbrella)" };
                println!("{}{}{}", "  ".repeat(depth), tag.id, marker);
            }
        }

        TagCommands::AddChildren {
            parent,
            names,
            umbrella,
        } => {
            let ids = service.add_children(&parent, &names, !umbrella).await?;
            println!("Created {} children under `{}`: {}", ids.len(), parent, ids.join(", "));
        }

        TagCommands::Filter { ids, on } => {
            let report = service.set_use_filter_bulk(&ids, on).await?;
            if !report.updated.is_empty() {
                println!(
                    "{} {} tag(s): {}",
                    if on { "Enabled filtering for" } else { "Disabled filtering for" },
                    report.updated.len(),
                    report.updated.join(", ")
                );
            }
            for (id, err) in &report.failed {
                eprintln!("Skipped `{id}`: {err}");
            }
            if !report.is_clean() {
                anyhow::bail!("{} tag(s) could not be updated", report.failed.len());
            }
        }
    }

    Ok(())
}

fn render_tags<'a>(tags: impl Iterator<Item = &'a Tag>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Name", "Filter", "Parent", "Description"]);
    for tag in tags {
        table.add_row(vec![
            tag.id.clone(),
            tag.display_name(),
            if tag.use_filter { "yes".into() } else { "no".into() },
            tag.parent.clone().unwrap_or_else(|| "-".into()),
            tag.description.clone(),
        ]);
    }
    table
}

//! Problem subcommand execution

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use taxa_core::{Problem, ProblemStore};

use crate::cli::ProblemCommands;

pub async fn execute<P: ProblemStore>(store: &P, command: ProblemCommands) -> Result<()> {
    match command {
        ProblemCommands::Add {
            description,
            source,
            author,
            hardness,
            number,
            aops_url,
            git_url,
            date,
        } => {
            let mut problem = Problem::new(description);
            problem.source = source;
            problem.author = author.unwrap_or_default();
            problem.hardness = hardness;
            problem.problem_number = number;
            problem.aops_url = aops_url.unwrap_or_default();
            problem.git_url = git_url.unwrap_or_default();
            problem.proposal_date = date;

            let stored = store.create(problem).await?;
            println!("Added problem #{}: {}", stored.id, stored.description);
        }

        ProblemCommands::Show { id } => {
            let problem = store.get(id).await?;
            let tags = store.tags_of(id).await?;
            println!("{}", render_problems(std::iter::once(&problem)));
            if !tags.is_empty() {
                println!("Tags: {}", tags.join(", "));
            }
        }

        ProblemCommands::Rm { id } => {
            store.delete(id).await?;
            println!("Deleted problem #{id}");
        }

        ProblemCommands::Ls { tag } => {
            let problems = match &tag {
                Some(tag) => {
                    let ids = store.problems_with_tag(tag).await?;
                    let mut problems = Vec::with_capacity(ids.len());
                    for id in ids {
                        problems.push(store.get(id).await?);
                    }
                    problems
                }
                None => store.list().await?,
            };
            if problems.is_empty() {
                println!("(no problems)");
            } else {
                println!("{}", render_problems(problems.iter()));
            }
        }

        ProblemCommands::Tag { id, tag } => {
            store.attach_tag(id, &tag).await?;
            println!("Tagged problem #{id} with `{tag}`");
        }

        ProblemCommands::Untag { id, tag } => {
            store.detach_tag(id, &tag).await?;
            println!("Removed `{tag}` from problem #{id}");
        }
    }

    Ok(())
}

fn render_problems<'a>(problems: impl Iterator<Item = &'a Problem>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Source", "Description", "Author", "MOHS", "Number"]);
    for problem in problems {
        table.add_row(vec![
            problem.id.to_string(),
            problem.source.clone().unwrap_or_else(|| "-".into()),
            problem.description.clone(),
            problem.author.clone(),
            problem
                .hardness
                .map(|h| h.to_string())
                .unwrap_or_else(|| "-".into()),
            problem
                .problem_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".into()),
        ]);
    }
    table
}

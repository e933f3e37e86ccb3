use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::sync::Arc;

use finance_tracker::{
    cycle_key_from_date, Config, CycleKeyDeriver, SqliteStore, SystemClock, Tag, TagError,
    TagRepository, UsageType,
};

const USAGE: &str = "\
usage:
  finance-tracker tag add <name> <person-id> <expense|gain>
  finance-tracker tag get <id>
  finance-tracker tag list [person-id]
  finance-tracker tag delete <id>
  finance-tracker cycle [YYYY-MM-DD]
  finance-tracker cycle check <YYYY-MM>";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ {:#}", e);
        if let Some(tag_err) = e.downcast_ref::<TagError>() {
            eprintln!("   {}", tag_err.user_message());
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["tag", rest @ ..] => run_tag(&config, rest).await,
        ["cycle", rest @ ..] => run_cycle(&config, rest),
        _ => bail!("{}", USAGE),
    }
}

async fn run_tag(config: &Config, args: &[&str]) -> Result<()> {
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    let repo = TagRepository::new(Arc::new(store));

    match args {
        ["add", name, person_id, usage] => {
            let usage: UsageType = usage.parse()?;
            let id = repo.add_tag(name, person_id, usage).await?;
            println!("✓ Created tag {}", id);
        }
        ["get", id] => {
            let tag = repo.get_tag(id).await?;
            println!("{}", serde_json::to_string_pretty(&tag)?);
        }
        ["list"] => print_tags(&repo.list_tags().await?)?,
        ["list", person_id] => print_tags(&repo.list_tags_for_person(person_id).await?)?,
        ["delete", id] => {
            repo.delete_tag(id).await?;
            println!("✓ Deleted tag {}", id);
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

fn print_tags(tags: &[Tag]) -> Result<()> {
    for tag in tags {
        println!(
            "{}  {:<8} {:<24} {}",
            tag.id,
            tag.usage_type.as_str(),
            tag.name,
            tag.person_id
        );
    }
    let expenses = tags.iter().filter(|t| t.is_expense()).count();
    println!(
        "({} tags: {} expense, {} gain)",
        tags.len(),
        expenses,
        tags.len() - expenses
    );
    Ok(())
}

fn run_cycle(config: &Config, args: &[&str]) -> Result<()> {
    let deriver = CycleKeyDeriver::new(Arc::new(SystemClock), config.cycle_zone);
    tracing::debug!(zone = %deriver.zone(), "deriving cycle keys");

    match args {
        [] => println!("{}", deriver.current_cycle_key()),
        ["check", key] => {
            let current = deriver.is_cycle_key_current(Some(*key));
            println!("{} {}", key, if current { "is current" } else { "is not current" });
        }
        [date] => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("expected a date like 2024-03-15, got {:?}", date))?;
            println!("{}", cycle_key_from_date(&date));
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

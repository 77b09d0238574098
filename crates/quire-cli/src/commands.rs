//! Subcommand execution

use crate::cli::{AddTopic, CategoryCommand, Cli, Command, TopicCommand};
use anyhow::{bail, Context, Result};
use quire_model::{NewTopic, Topic};
use quire_sync::{
    resolve_root, CatalogConfig, CatalogSync, CategoryUpdate, SyncReport, Synced, CONFIG_FILE,
};
use quire_watch::CatalogWatcher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = resolve_root(cli.root.as_deref()).context("resolving catalog root")?;
    let config = CatalogConfig::load_with_env(&root)
        .await
        .with_context(|| format!("loading configuration under {}", root.display()))?;
    let sync = CatalogSync::from_config(root.clone(), &config);

    match cli.command {
        Command::Init => {
            let synced = sync.ensure_layout().await?;
            for step in &synced.report.completed {
                println!("{}: {}", step.step, step.target);
            }
            report_skipped(&synced.report);
        }
        Command::Category { command } => category(&sync, command).await?,
        Command::Topic { command } => topic(&sync, command).await?,
        Command::Docs { topic } => {
            let documents = sync.list_documents(&topic).await?;
            print_json(&documents)?;
        }
        Command::Backups { file } => {
            for snapshot in sync.list_backups(&file).await? {
                println!("{}", sync.paths().display(&snapshot));
            }
        }
        Command::Restore { file } => {
            let snapshot = sync
                .restore(&file)
                .await
                .with_context(|| format!("restoring {}", file.display()))?;
            println!("restored {} from {}", file.display(), sync.paths().display(&snapshot));
        }
        Command::Watch => watch(&sync, &config).await?,
    }
    Ok(())
}

async fn category(sync: &CatalogSync, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::List => print_json(&sync.category_summaries().await?),
        CategoryCommand::Add { title, slug } => finish(sync.add_category(&title, &slug).await?),
        CategoryCommand::Update { id, title, slug } => {
            let update = CategoryUpdate { title, slug };
            finish(sync.update_category(&id, update).await?)
        }
        CategoryCommand::Delete { id } => finish(sync.delete_category(&id).await?),
        CategoryCommand::Reorder { ids } => finish(sync.reorder_categories(&ids).await?),
    }
}

async fn topic(sync: &CatalogSync, command: TopicCommand) -> Result<()> {
    match command {
        TopicCommand::Show { slug } => print_json(&sync.topic(&slug).await?),
        TopicCommand::Add(AddTopic {
            category,
            name,
            slug,
            description,
            image,
        }) => {
            let new = NewTopic {
                name,
                slug,
                description,
                image,
            };
            finish(sync.add_topic(&category, new).await?)
        }
        TopicCommand::Update { file } => {
            let topic: Topic = read_json(&file).await?;
            finish(sync.update_topic_detail(topic).await?)
        }
        TopicCommand::Delete { slug } => finish(sync.delete_topic(&slug).await?),
        TopicCommand::Reorder { file } => {
            let order: BTreeMap<String, Vec<String>> = read_json(&file).await?;
            finish(sync.reorder_topics_across_categories(&order).await?)
        }
    }
}

async fn watch(sync: &CatalogSync, config: &CatalogConfig) -> Result<()> {
    if !config.watch.enabled {
        bail!("watching is disabled in {}", CONFIG_FILE);
    }
    let watcher = CatalogWatcher::start(sync.paths(), &config.watch)?;
    let mut subscription = watcher.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("stopping watcher");
                break;
            }
            received = subscription.recv() => match received {
                Some(notification) => println!("{}", notification.to_json()?),
                None => break,
            },
        }
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn finish<T: Serialize>(synced: Synced<T>) -> Result<()> {
    report_skipped(&synced.report);
    print_json(&synced.value)
}

fn report_skipped(report: &SyncReport) {
    for line in skipped_lines(report) {
        eprintln!("{line}");
    }
}

/// One stderr line per skipped step
pub(crate) fn skipped_lines(report: &SyncReport) -> Vec<String> {
    report
        .skipped
        .iter()
        .map(|failure| format!("skipped: {failure}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_sync::StepFailure;

    #[test]
    fn skipped_steps_are_one_line_each() {
        let report = SyncReport {
            completed: Vec::new(),
            skipped: vec![StepFailure {
                step: "update topic category".into(),
                target: ".vitepress/topics/data/vue/index.ts".into(),
                error: "topic not found: vue".into(),
            }],
        };
        assert_eq!(
            skipped_lines(&report),
            vec!["skipped: update topic category (.vitepress/topics/data/vue/index.ts): topic not found: vue"]
        );
        assert!(skipped_lines(&SyncReport::default()).is_empty());
    }
}

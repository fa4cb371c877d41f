//! `stamp inspect`: describe a template without rendering it.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde_json::json;

use crate::schema::{TemplateSchema, yaml_to_plain_string};
use crate::source::TemplateSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Show the questions and settings a template declares.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Template: local directory, git URL, or gh:owner/repo / gl:owner/repo
    pub template: String,

    /// Template revision (tag, branch, commit or HEAD)
    #[arg(long, value_name = "REF")]
    pub vcs_ref: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl InspectCommand {
    pub async fn execute(self) -> Result<()> {
        let source = TemplateSource::parse(&self.template)?;
        let template = source.resolve(self.vcs_ref.as_deref()).await?;
        let schema = TemplateSchema::load(template.root())?;

        match self.format {
            OutputFormat::Json => {
                let report = json_report(&schema, template.src_path(), template.commit());
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => print_text(&schema, template.src_path(), template.commit()),
        }
        Ok(())
    }
}

pub(crate) fn json_report(
    schema: &TemplateSchema,
    src_path: &str,
    commit: Option<&str>,
) -> serde_json::Value {
    let questions: Vec<_> = schema
        .questions
        .iter()
        .map(|q| {
            json!({
                "name": q.name,
                "type": q.kind.to_string(),
                "default": q.default.as_ref().and_then(|d| serde_json::to_value(d).ok()),
                "help": q.help,
                "derived": q.is_derived(),
                "secret": q.secret,
                "choices": q.choices.iter().map(|c| c.label.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "src_path": src_path,
        "commit": commit,
        "answers_file": schema.settings.answers_file,
        "tasks": schema.settings.tasks.iter().map(|t| t.command()).collect::<Vec<_>>(),
        "questions": questions,
    })
}

fn print_text(schema: &TemplateSchema, src_path: &str, commit: Option<&str>) {
    println!("{} {}", "Template".bold(), src_path);
    if let Some(commit) = commit {
        println!("{} {}", "Revision".bold(), commit);
    }
    println!("{} {}", "Answers file".bold(), schema.settings.answers_file);
    if schema.has_tasks() {
        println!(
            "{} {} (requires --trust)",
            "Tasks".bold(),
            schema.settings.tasks.len()
        );
    }

    println!("\n{}", "Questions".bold());
    for question in &schema.questions {
        let mut line = format!("  {} ({})", question.name.cyan(), question.kind);
        if let Some(default) = &question.default {
            line.push_str(&format!(" = {}", yaml_to_plain_string(default)));
        }
        if question.is_derived() {
            line.push_str(&format!(" {}", "[derived]".dimmed()));
        }
        if question.secret {
            line.push_str(&format!(" {}", "[secret]".dimmed()));
        }
        println!("{line}");
        if let Some(help) = &question.help {
            println!("      {help}");
        }
        if !question.choices.is_empty() {
            let labels: Vec<&str> = question.choices.iter().map(|c| c.label.as_str()).collect();
            println!("      choices: {}", labels.join(", "));
        }
    }
}

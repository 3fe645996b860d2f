use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use client_core::edit::{MinutesEdit, ScalarField, TextListField};
use shared::domain::MinutesDocument;

#[derive(Parser, Debug)]
#[command(name = "minutes", about = "Turn meeting transcripts into structured minutes")]
pub struct Cli {
    /// Overrides the backend URL from minutes.toml and the environment.
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    ResetPassword {
        email: String,
    },
    /// Stores the AI provider credential used for generation.
    SetAiKey {
        #[arg(long, default_value = "OpenAI")]
        provider: String,
        #[arg(long)]
        key: String,
    },
    Templates,
    Generate(GenerateArgs),
    /// Lists previously exported PDFs.
    Files,
    Fetch {
        filename: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "text"])))]
pub struct GenerateArgs {
    /// Transcript or recording (.txt, .mp3, .wav, .m4a, .ogg, .webm).
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    /// Comma-separated; replaces the generated attendee list.
    #[arg(long)]
    pub attendees: Option<String>,
    #[arg(long = "add-decision")]
    pub add_decisions: Vec<String>,
    /// Renders the result with this template and saves the PDF.
    #[arg(long, value_name = "TEMPLATE")]
    pub export: Option<String>,
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    /// Edit operations equivalent to the requested overrides, in application order.
    pub fn edits_for(&self, doc: &MinutesDocument) -> Vec<MinutesEdit> {
        let mut edits = Vec::new();
        if let Some(title) = &self.title {
            edits.push(MinutesEdit::set(ScalarField::Title, title.as_str()));
        }
        if let Some(summary) = &self.summary {
            edits.push(MinutesEdit::set(ScalarField::Summary, summary.as_str()));
        }
        if let Some(attendees) = &self.attendees {
            edits.push(MinutesEdit::attendees_from_text(attendees));
        }
        for (offset, decision) in self.add_decisions.iter().enumerate() {
            edits.push(MinutesEdit::AppendItem(TextListField::Decisions.into()));
            edits.push(MinutesEdit::UpdateListItem {
                field: TextListField::Decisions,
                index: doc.decisions.len() + offset,
                value: decision.clone(),
            });
        }
        edits
    }
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    archive::write_pdf, ApiFailure, ExportOutcome, FileArchive, GenerationGate, HttpMinutesApi,
    MinutesApi, MinutesWorkspace, TokenStore, TranscriptInput,
};
use shared::domain::{AiConfig, AiProvider};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod render;

use cli::{Cli, Command, GenerateArgs};
use config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings()?;
    config::apply_overrides(
        &mut settings,
        cli.api_base_url.as_deref(),
        cli.token_path.as_deref(),
    )?;

    let api = Arc::new(HttpMinutesApi::with_timeout(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    let store = TokenStore::new(&settings.token_path);
    if let Some(token) = store.load().await? {
        api.set_token(Some(token)).await;
    }
    info!(api_base_url = %settings.api_base_url, "minutes client ready");

    match cli.command {
        Command::Login { username, password } => {
            let token = api.login(&username, &password).await?;
            store.save(&token).await?;
            println!("Logged in as {username}");
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            validate_registration(&username, &email, &password)?;
            println!("{}", api.register(&username, &password, &email).await?);
        }
        Command::Logout => {
            api.logout().await;
            store.clear().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let profile = signed_in(api.current_user().await, &store).await?;
            println!("{}", profile.username);
            if let Some(email) = &profile.email {
                println!("email: {email}");
            }
            println!(
                "ai provider: {} ({})",
                profile.ai_config.ai_provider.label(),
                if profile.has_ai_credential() { "key set" } else { "no key" }
            );
            println!(
                "processed: {} transcripts, {} characters, {} audio seconds",
                profile.stats.transcripts_generated,
                profile.stats.characters_processed,
                profile.stats.audio_seconds_processed
            );
        }
        Command::ResetPassword { email } => {
            println!("{}", api.reset_password(&email).await?);
        }
        Command::SetAiKey { provider, key } => {
            let ai_provider = AiProvider::parse(&provider).with_context(|| {
                let known: Vec<&str> = AiProvider::ALL.iter().map(|p| p.wire_name()).collect();
                format!("unknown provider '{provider}', expected one of {}", known.join(", "))
            })?;
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            signed_in(
                api.update_ai_config(&AiConfig {
                    ai_provider,
                    api_key: key.trim().to_string(),
                })
                .await,
                &store,
            )
            .await?;
            println!("{} key saved", ai_provider.label());
        }
        Command::Templates => {
            let templates = api.list_pdf_templates().await?;
            print!(
                "{}",
                render::templates_text(&templates, &settings.default_template)
            );
        }
        Command::Generate(args) => generate(api, &store, &settings, args).await?,
        Command::Files => {
            let mut archive = FileArchive::new();
            let listed = archive.refresh_from(&*api).await.map(|files| files.to_vec());
            let files = signed_in(listed, &store).await?;
            print!("{}", render::files_text(&files));
        }
        Command::Fetch { filename, out } => {
            let mut archive = FileArchive::new();
            let listed = archive.refresh_from(&*api).await.map(|_| ());
            signed_in(listed, &store).await?;
            archive
                .open_from(&*api, &filename.as_str().into())
                .await?;
            let path = out.unwrap_or_else(|| settings.output_dir.join(&filename));
            archive.save_to(&path).await?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

async fn generate(
    api: Arc<HttpMinutesApi>,
    store: &TokenStore,
    settings: &Settings,
    args: GenerateArgs,
) -> Result<()> {
    let workspace = MinutesWorkspace::new(api, settings.default_template.clone());
    signed_in(
        workspace.refresh_profile().await.map_err(|err| match err {
            client_core::WorkspaceError::Api(failure) => failure,
            other => ApiFailure::Rejected(other.to_string()),
        }),
        store,
    )
    .await?;
    match workspace.generation_gate().await {
        GenerationGate::Ready => {}
        GenerationGate::SignedOut => bail!("not logged in; run `minutes login` first"),
        GenerationGate::MissingAiCredential => {
            bail!("no AI API key configured; run `minutes set-ai-key --key <KEY>` first")
        }
    }

    let input = match (&args.file, &args.text) {
        (Some(path), _) => TranscriptInput::from_path(path).await?,
        (None, Some(text)) => TranscriptInput::Text(text.clone()),
        (None, None) => bail!("either --file or --text is required"),
    };
    let generated = workspace.generate(input).await?;

    let edits = args.edits_for(&generated);
    if !edits.is_empty() {
        workspace.start_edit().await?;
        for edit in &edits {
            workspace.apply_edit(edit).await?;
        }
        workspace.commit_edit().await?;
    }
    let minutes = workspace
        .snapshot()
        .await
        .committed
        .context("generated minutes missing after edits")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&minutes)?);
    } else {
        print!("{}", render::minutes_text(&minutes));
    }

    if let Some(template) = args.export {
        workspace.open_template_picker().await?;
        workspace.select_template(template.into()).await?;
        match workspace.confirm_export().await? {
            ExportOutcome::Ready(pdf) => {
                let path = settings.output_dir.join(pdf.filename.as_str());
                write_pdf(&path, &pdf.bytes).await?;
                workspace.back_to_result().await?;
                eprintln!("Saved {}", path.display());
            }
            ExportOutcome::Failed(message) => {
                workspace.cancel_export().await?;
                bail!("PDF export failed: {message}");
            }
        }
    }
    Ok(())
}

async fn signed_in<T>(result: Result<T, ApiFailure>, store: &TokenStore) -> Result<T> {
    match result {
        Err(ApiFailure::Unauthenticated) => {
            if let Err(err) = store.clear().await {
                warn!(error = %err, "failed to clear stored token");
            }
            bail!("not logged in or session expired; run `minutes login`")
        }
        other => Ok(other?),
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() {
        bail!("username must not be empty");
    }
    if !email.contains('@') || !email.contains('.') {
        bail!("Invalid email format.");
    }
    if password.chars().count() < 8 {
        bail!("Password too weak. It must be at least 8 characters long.");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

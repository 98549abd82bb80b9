use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use site_core::{
    ActiveNavigation, ContactFormController, FormRelay, HttpFormRelay, NavigationState,
    NavigationTracker, ScrollBus, SubmitRejection,
};
use site_shared::domain::{FieldKey, SectionId, SubmissionState};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod form_args;
mod layout;

use config::Settings;
use form_args::parse_field_assignment;
use layout::{parse_section_spec, StaticLayout};

const NAV_UPDATE_WAIT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
struct Cli {
    /// Config file; defaults to ./site.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the contact form and submit it to the form relay.
    Contact {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Sets a field as key=value; applied after the named flags.
        #[arg(long = "field", value_parser = parse_field_assignment)]
        fields: Vec<(FieldKey, String)>,
        /// Overrides the configured relay endpoint.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Report which section is highlighted for a given scroll position.
    Nav {
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
        #[arg(long)]
        viewport: f64,
        /// Section geometry as id:top:height, in priority order.
        #[arg(long = "section", required = true)]
        sections: Vec<String>,
        /// Fragment to navigate to after the first reading, e.g. #skills.
        #[arg(long)]
        goto: Option<String>,
        /// Use the back-to-top control after the other readings.
        #[arg(long)]
        top: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Contact {
            name,
            email,
            subject,
            message,
            fields: assignments,
            endpoint,
        } => {
            let mut fields = vec![
                (FieldKey::Name, name),
                (FieldKey::Email, email),
                (FieldKey::Subject, subject),
                (FieldKey::Message, message),
            ];
            fields.extend(assignments);
            run_contact(&settings, endpoint, fields).await
        }
        Command::Nav {
            offset,
            viewport,
            sections,
            goto,
            top,
        } => run_nav(&settings, offset, viewport, &sections, goto.as_deref(), top).await,
    }
}

fn build_relay(settings: &Settings, endpoint: Option<String>) -> Result<Arc<dyn FormRelay>> {
    let endpoint = match endpoint {
        Some(raw) => config::validate_endpoint(&raw)?.to_string(),
        None => settings.form_endpoint.clone(),
    };
    let relay = match settings.submit_timeout() {
        Some(timeout) => HttpFormRelay::with_timeout(endpoint, timeout)
            .context("failed to build form relay client")?,
        None => HttpFormRelay::new(endpoint),
    };
    info!(endpoint = relay.endpoint(), "form relay ready");
    Ok(Arc::new(relay))
}

async fn run_contact(
    settings: &Settings,
    endpoint: Option<String>,
    fields: Vec<(FieldKey, String)>,
) -> Result<()> {
    let controller = ContactFormController::new(build_relay(settings, endpoint)?);
    for (key, value) in fields {
        controller.update_field(key, value).await;
    }

    match controller.submit().await {
        Ok(terminal) => {
            let snapshot = controller.snapshot().await;
            if let Some(banner) = snapshot.status_banner() {
                println!("{}", banner.text());
            }
            if terminal == SubmissionState::Failed {
                bail!("contact form submission failed");
            }
            Ok(())
        }
        Err(SubmitRejection::Invalid) => {
            let snapshot = controller.snapshot().await;
            for (key, error) in snapshot.errors() {
                println!("{key}: {error}");
            }
            bail!("contact form has validation errors");
        }
        Err(rejection) => Err(rejection.into()),
    }
}

async fn run_nav(
    settings: &Settings,
    offset: f64,
    viewport: f64,
    sections: &[String],
    goto: Option<&str>,
    top: bool,
) -> Result<()> {
    let geometry = sections
        .iter()
        .map(|raw| parse_section_spec(raw))
        .collect::<Result<Vec<_>>>()?;
    let order: Vec<SectionId> = geometry.iter().map(|(id, _)| id.clone()).collect();
    let layout = Arc::new(StaticLayout::new(offset, viewport, geometry));
    let tracker = NavigationTracker::new(order, settings.scroll_threshold)?;

    let bus = ScrollBus::new();
    let mut active = tracker.clone().activate(layout.clone(), &bus);
    print_nav_state(&active.state());

    if let Some(hash) = goto {
        if tracker.navigate_to_hash(layout.as_ref(), hash) {
            bus.notify();
            print_nav_state(&next_nav_state(&mut active).await?);
        } else {
            println!("no section for '{hash}'");
        }
    }

    if top {
        tracker.scroll_to_top(layout.as_ref());
        bus.notify();
        print_nav_state(&next_nav_state(&mut active).await?);
    }

    active.deactivate().await;
    Ok(())
}

async fn next_nav_state(active: &mut ActiveNavigation) -> Result<NavigationState> {
    tokio::time::timeout(NAV_UPDATE_WAIT, active.next_update())
        .await
        .context("navigation tracker did not respond")?
        .context("navigation tracker stopped")
}

fn print_nav_state(state: &NavigationState) {
    println!(
        "active={} scrolled={}",
        state.active_section, state.scroll_threshold_crossed
    );
}

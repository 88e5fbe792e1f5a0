use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use paywidget::application::session::CheckoutSession;
use paywidget::config::CheckoutConfig;
use paywidget::domain::credential::{PublicKey, TokenId};
use paywidget::domain::form::SubmitEvent;
use paywidget::domain::pricing::{cost_all_sites, format_amount, price_list};
use paywidget::domain::ui_state::{PageView, UiState};
use paywidget::domain::widget::{FaultKind, ProviderFault};
use paywidget::infrastructure::card::CardInput;
use paywidget::infrastructure::in_memory::{HostCall, RecordingHost};
use paywidget::infrastructure::simulated::{SimulatedPage, SimulatedProvider};
use paywidget::interfaces::csv::script_reader::{Action, ScriptReader, ScriptStep};
use paywidget::interfaces::csv::transition_writer::{TransitionRecord, TransitionWriter};
use paywidget::interfaces::json::snapshot_writer::{PageSnapshot, SnapshotWriter};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkout configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a CSV script of page events against a simulated card element
    Replay {
        /// Input script CSV file
        input: PathBuf,

        /// Publishable key. Overrides the config file.
        #[arg(long, env = "STRIPE_PUBLIC_KEY")]
        public_key: Option<String>,

        /// Number of credits being purchased, used for the pay button label
        #[arg(long, default_value_t = 100)]
        credits: u32,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
    /// Print prices
    Quote {
        /// Price of this many credits
        #[arg(long, required_unless_present_any = ["list", "sites"])]
        credits: Option<u32>,

        /// Print the price list, 100 to 100 000 credits in steps of 100
        #[arg(long)]
        list: bool,

        /// Price of one credit for each of this many sites
        #[arg(long)]
        sites: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One row per step
    Csv,
    /// One object per step with every page element
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = CheckoutConfig::load(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Command::Quote {
            credits,
            list,
            sites,
        } => quote(&config, credits, list, sites),
        Command::Replay {
            input,
            public_key,
            credits,
            format,
        } => {
            let key = public_key
                .or_else(|| config.public_key.clone())
                .ok_or_else(|| miette!("No publishable key: pass --public-key or set STRIPE_PUBLIC_KEY"))?;
            let key = PublicKey::new(key).into_diagnostic()?;
            replay(&config, &key, input, credits, format).await
        }
    }
}

fn quote(config: &CheckoutConfig, credits: Option<u32>, list: bool, sites: Option<u32>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(credits) = credits {
        let quote = config.quote(credits).into_diagnostic()?;
        writeln!(out, "{} credits: {}", credits, quote.display()).into_diagnostic()?;
    }
    if list {
        for (units, cost) in price_list(config.cost_per_credit).into_diagnostic()? {
            writeln!(out, "{} credits: {}", units, format_amount(cost, &config.currency))
                .into_diagnostic()?;
        }
    }
    if let Some(sites) = sites {
        let cost = cost_all_sites(sites, config.cost_per_credit).into_diagnostic()?;
        writeln!(out, "{} sites: {}", sites, format_amount(cost, &config.currency))
            .into_diagnostic()?;
    }
    Ok(())
}

/// Where replay results go.
enum Output<W: Write> {
    Csv(TransitionWriter<W>),
    Json(SnapshotWriter<W>),
}

impl<W: Write> Output<W> {
    fn new(format: Format, sink: W) -> Self {
        match format {
            Format::Csv => Output::Csv(TransitionWriter::new(sink)),
            Format::Json => Output::Json(SnapshotWriter::new(sink)),
        }
    }

    fn write(
        &mut self,
        step: usize,
        action: &str,
        state: &UiState,
        view: &PageView,
        token: Option<TokenId>,
    ) -> paywidget::error::Result<()> {
        match self {
            Output::Csv(writer) => {
                writer.write(&TransitionRecord::new(step, action, state, view, token))
            }
            Output::Json(writer) => writer.write(&PageSnapshot {
                step,
                action,
                state,
                page: view,
                token: token.as_ref(),
            }),
        }
    }

    fn flush(&mut self) -> paywidget::error::Result<()> {
        match self {
            Output::Csv(writer) => writer.flush(),
            Output::Json(writer) => writer.flush(),
        }
    }
}

async fn replay(
    config: &CheckoutConfig,
    key: &PublicKey,
    input: PathBuf,
    credits: u32,
    format: Format,
) -> Result<()> {
    let page = SimulatedPage::with_mount_points([config.layout.mount_selector.clone()]);
    let host = RecordingHost::new();
    let mut session = CheckoutSession::new(
        SimulatedProvider::factory(page.clone()),
        Arc::new(host.clone()),
    );
    let amount = config.quote(credits).into_diagnostic()?.display();

    let file = File::open(input).into_diagnostic()?;
    let reader = ScriptReader::new(file);
    let stdout = io::stdout();
    let mut writer = Output::new(format, stdout.lock());

    for (index, step_result) in reader.steps().enumerate() {
        let step_no = index + 1;
        match step_result {
            Ok(step) => {
                if let Err(e) = run_step(&mut session, &page, config, key, &step).await {
                    error!("Error in step {}: {}", step_no, e);
                }
                let token = host.drain().into_iter().find_map(|call| match call {
                    HostCall::HandleToken(token) => Some(token),
                    HostCall::SetState(_) => None,
                });
                let state = session.state();
                let view = PageView::render(&state, &amount, &config.layout);
                writer
                    .write(step_no, step.action.name(), &state, &view, token)
                    .into_diagnostic()?;
            }
            Err(e) => {
                error!("Error reading step {}: {}", step_no, e);
            }
        }
    }

    writer.flush().into_diagnostic()?;
    session.unmount().await;
    Ok(())
}

async fn run_step(
    session: &mut CheckoutSession,
    page: &SimulatedPage,
    config: &CheckoutConfig,
    key: &PublicKey,
    step: &ScriptStep,
) -> paywidget::error::Result<()> {
    let selector = config.layout.mount_selector.as_str();

    match step.action {
        Action::Mount => {
            session.mount(key, selector, &config.style).await?;
        }
        Action::Input => {
            let input = CardInput::new(
                step.card_number.as_deref().unwrap_or_default(),
                step.expiry.as_deref().unwrap_or_default(),
                step.cvc.as_deref().unwrap_or_default(),
            );
            page.type_card(selector, input)?;
        }
        Action::Submit => {
            let mut event = SubmitEvent::new(config.layout.form_id.as_str());
            session.on_submit(&mut event).await?;
        }
        Action::FailNext => {
            let fault = ProviderFault::new(FaultKind::ApiConnectionError, step.require_message()?);
            page.fail_next_token(fault);
        }
        Action::Complete => {
            session.complete();
        }
        Action::CaptureFailed => {
            session.capture_failed(step.require_message()?);
        }
        Action::Reset => {
            session.reset();
        }
        Action::Unmount => session.unmount().await,
        Action::Detach => {
            page.remove_mount_point(selector);
        }
    }
    Ok(())
}

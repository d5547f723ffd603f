use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::Parser;

use daily_agenda::agenda::today_in;
use daily_agenda::client::Client;
use daily_agenda::mailer::{deliver, DeliveryMode, SmtpMailer};
use daily_agenda::render::render;
use daily_agenda::runner::collect_agenda;
use daily_agenda::{AgendaError, Config};

/// Email the agenda of a day, built from the events of a CalDAV account
#[derive(Parser, Debug)]
#[command(name = "daily-agenda", version, about)]
struct Cli {
    /// Print the HTML agenda to stdout instead of sending it
    #[arg(long)]
    preview: bool,

    /// Build the agenda of this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Leave out the events of today that are already over
    #[arg(long)]
    hide_finished: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<(), AgendaError> {
    let config = Config::from_env()?;
    log::info!("Connecting to CalDAV server at {}...", config.caldav_url());
    let client = Client::from_config(&config)?;

    let mut agenda = collect_agenda(&client, &config, cli.date, today_in).await?;
    if cli.hide_finished {
        if agenda.date() == today_in(&agenda.timezone()) {
            agenda.drop_finished(Utc::now());
        } else {
            log::debug!("{} is not today, keeping every event", agenda.date());
        }
    }

    let rendered = render(&agenda, config.display_name());

    let mode = if cli.preview { DeliveryMode::Preview } else { DeliveryMode::Send };
    let mailer = SmtpMailer::from_config(&config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    deliver(&rendered, &config, mode, &mailer, &mut out).await
}

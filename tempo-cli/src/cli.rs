use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tracing::debug;

use tempo_core::{Config, WeatherSession, provider, session};

use crate::form::SearchForm;
use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempo", version, about = "Consulta de clima por cidade ou localização")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key.
    Configure,

    /// Show weather for a city name.
    Search {
        /// City name, as you would type it into the search form.
        city: String,
    },

    /// Show weather for the current position (IP geolocation).
    Locate,

    /// Interactive prompt: type a city, `:gps` to locate, `:sair` to quit.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { city } => search(&city).await,
            Command::Locate => locate().await,
            Command::Interactive => interactive().await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    config.set_api_key(api_key);
    config.save()?;

    println!("Configuração salva em {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_session() -> Result<WeatherSession> {
    let config = Config::load()?;
    let weather = provider::weather_provider_from_config(&config)?;
    let geolocation = provider::geolocation_provider_from_config(&config)?;

    Ok(WeatherSession::spawn(weather, geolocation))
}

async fn search(city: &str) -> Result<()> {
    let session = open_session()?;
    let mut vm = session.subscribe();

    let mut form = SearchForm::default();
    form.set_city_name(city);
    session.submit(&form.submit());

    let settled = session::settled(&mut vm).await;
    render::view_model(&settled);
    Ok(())
}

async fn locate() -> Result<()> {
    let session = open_session()?;
    let mut vm = session.subscribe();

    session.request_position();

    let settled = session::settled(&mut vm).await;
    render::view_model(&settled);
    Ok(())
}

async fn interactive() -> Result<()> {
    let session = open_session()?;
    let mut vm = session.subscribe();
    let mut form = SearchForm::default();

    println!("Digite uma cidade, `:gps` para usar sua localização ou `:sair` para encerrar.");

    loop {
        let input = match Text::new("Cidade:").prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match input.trim() {
            ":sair" => break,
            ":gps" => session.request_position(),
            text => {
                form.set_city_name(text);
                session.submit(&form.submit());
            }
        }

        for change in form.take_changes() {
            debug!(value = %change, "form change");
        }

        let settled = session::settled(&mut vm).await;
        render::view_model(&settled);
    }

    Ok(())
}

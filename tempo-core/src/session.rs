//! View-model composition for a weather lookup session.
//!
//! The interaction model is a handful of merged event channels: city-name
//! submissions and geolocation triggers produce queries, each query drives
//! one weather lookup, and loading/error/condition are derived along the
//! way. Here that composition is an explicit state machine: a single driver
//! task owns the state, every in-flight lookup is tagged with an epoch, and
//! a completion whose epoch is no longer current is dropped. A newer
//! triggering event therefore supersedes any pending lookup of the same
//! kind without relying on stream cancellation, and a submission also
//! supersedes a pending geolocation lookup.
//!
//! Snapshots are published through a `watch` channel: late subscribers see
//! the latest value, and every transition produces exactly one snapshot.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::condition::{ConditionCategory, classify};
use crate::model::{PositionResult, Query, ViewModel, WeatherReport};
use crate::provider::{GeolocationProvider, WeatherDataProvider};

/// Shown when a lookup yields no usable report.
pub const NOT_FOUND_MSG: &str = "Não foram encontradas dados nesta região. Verifique se o nome está correto ou busque por uma outra cidade próxima.";

#[derive(Debug)]
enum Command {
    Submit(String),
    RequestPosition,
}

#[derive(Debug)]
enum Completion {
    Weather {
        epoch: u64,
        result: anyhow::Result<Option<WeatherReport>>,
    },
    Position {
        epoch: u64,
        result: PositionResult,
    },
}

/// Handle to a running lookup session.
///
/// Dropping the handle closes the command channel; the driver task drains
/// and exits on its own.
#[derive(Debug)]
pub struct WeatherSession {
    commands: mpsc::UnboundedSender<Command>,
    view_model: watch::Receiver<ViewModel>,
}

impl WeatherSession {
    /// Spawn the driver task over the given providers.
    pub fn spawn(
        weather: Arc<dyn WeatherDataProvider>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (vm_tx, vm_rx) = watch::channel(ViewModel::default());

        tokio::spawn(drive(weather, geolocation, commands_rx, vm_tx));

        Self {
            commands: commands_tx,
            view_model: vm_rx,
        }
    }

    /// Submit a city name, exactly as typed. The empty string is a legal
    /// submission (a reset form). Supersedes any pending lookup.
    pub fn submit(&self, city_name: &str) {
        let _ = self.commands.send(Command::Submit(city_name.to_owned()));
    }

    /// Trigger a geolocation lookup. Supersedes a pending one.
    pub fn request_position(&self) {
        let _ = self.commands.send(Command::RequestPosition);
    }

    /// Latest view model. The receiver replays the current value to new
    /// subscribers and wakes on every published transition.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view_model.clone()
    }
}

/// Waits until the session settles after a triggering event: not loading,
/// with either a report or an error present.
pub async fn settled(view_model: &mut watch::Receiver<ViewModel>) -> ViewModel {
    loop {
        if view_model.changed().await.is_err() {
            return view_model.borrow().clone();
        }

        let vm = view_model.borrow_and_update().clone();
        if !vm.loading && (vm.weather_data.is_some() || !vm.error.is_empty()) {
            return vm;
        }
    }
}

async fn drive(
    weather: Arc<dyn WeatherDataProvider>,
    geolocation: Arc<dyn GeolocationProvider>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    view_model: watch::Sender<ViewModel>,
) {
    let (completions_tx, mut completions_rx) = mpsc::unbounded_channel();

    let mut driver = Driver {
        weather,
        geolocation,
        completions: completions_tx,
        view_model,
        state: ViewModel::default(),
        query_epoch: 0,
        position_epoch: 0,
    };

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Submit(city_name)) => driver.on_submit(city_name),
                Some(Command::RequestPosition) => driver.on_request_position(),
                None => break,
            },
            Some(completion) = completions_rx.recv() => driver.on_completion(completion),
        }
    }
}

struct Driver {
    weather: Arc<dyn WeatherDataProvider>,
    geolocation: Arc<dyn GeolocationProvider>,
    completions: mpsc::UnboundedSender<Completion>,
    view_model: watch::Sender<ViewModel>,
    state: ViewModel,
    /// Current weather lookup generation; completions from older
    /// generations are dropped.
    query_epoch: u64,
    /// Current geolocation generation; bumped by both position requests and
    /// submissions, since a submission cancels a pending lookup.
    position_epoch: u64,
}

impl Driver {
    fn publish(&self) {
        let _ = self.view_model.send(self.state.clone());
    }

    fn on_submit(&mut self, city_name: String) {
        self.position_epoch += 1;
        self.start_query(Query::CityName(city_name));
    }

    fn on_request_position(&mut self) {
        self.position_epoch += 1;
        let epoch = self.position_epoch;

        let geolocation = Arc::clone(&self.geolocation);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = geolocation.get_position().await;
            let _ = completions.send(Completion::Position { epoch, result });
        });
    }

    fn start_query(&mut self, query: Query) {
        self.query_epoch += 1;
        let epoch = self.query_epoch;
        debug!(?query, epoch, "starting weather lookup");

        self.state.loading = true;
        self.publish();

        let weather = Arc::clone(&self.weather);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = weather.get_weather_data(&query).await;
            let _ = completions.send(Completion::Weather { epoch, result });
        });
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Weather { epoch, result } => {
                if epoch != self.query_epoch {
                    debug!(epoch, current = self.query_epoch, "dropping superseded weather result");
                    return;
                }
                self.apply_weather(result);
            }
            Completion::Position { epoch, result } => {
                if epoch != self.position_epoch {
                    debug!(epoch, current = self.position_epoch, "dropping superseded position result");
                    return;
                }
                self.apply_position(result);
            }
        }
    }

    fn apply_weather(&mut self, result: anyhow::Result<Option<WeatherReport>>) {
        self.state.loading = false;

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                // A transport failure shares the not-found surface; the log
                // keeps the two tellable apart.
                warn!(error = %err, "weather lookup failed");
                None
            }
        };

        match report {
            Some(report) => {
                self.state.error.clear();
                self.state.condition = classify(Some(&report));
                debug!(condition = %self.state.condition, "report classified");
                self.state.weather_data = Some(report);
            }
            None => {
                self.state.weather_data = None;
                self.state.error = NOT_FOUND_MSG.to_owned();
                self.state.condition = ConditionCategory::None;
            }
        }

        self.publish();
    }

    fn apply_position(&mut self, result: PositionResult) {
        match result {
            Ok(coordinates) => self.start_query(Query::Coordinates(coordinates)),
            Err(err) => {
                self.state.error = err.to_string();
                self.state.condition = ConditionCategory::None;
                self.publish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, PositionError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Responds after a per-city delay; a handful of magic names select the
    /// failure modes.
    #[derive(Debug)]
    struct StubWeather;

    #[async_trait]
    impl WeatherDataProvider for StubWeather {
        async fn get_weather_data(&self, query: &Query) -> anyhow::Result<Option<WeatherReport>> {
            match query {
                Query::CityName(name) if name == "Lenta" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Some(report("Lenta")))
                }
                Query::CityName(name) if name.is_empty() || name == "Lugar Nenhum" => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(None)
                }
                Query::CityName(name) if name == "Offline" => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Err(anyhow::anyhow!("connection refused"))
                }
                Query::CityName(name) => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(Some(report(name)))
                }
                Query::Coordinates(_) => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(Some(report("Cidade do GPS")))
                }
            }
        }
    }

    #[derive(Debug)]
    struct StubGeolocation {
        delay: Duration,
        result: PositionResult,
    }

    #[async_trait]
    impl GeolocationProvider for StubGeolocation {
        async fn get_position(&self) -> PositionResult {
            tokio::time::sleep(self.delay).await;
            self.result
        }
    }

    fn report(name: &str) -> WeatherReport {
        let mut report = crate::model::tests::sample_report();
        report.location_name = name.to_string();
        report
    }

    fn session_with(geolocation: StubGeolocation) -> WeatherSession {
        WeatherSession::spawn(Arc::new(StubWeather), Arc::new(geolocation))
    }

    fn quick_position(result: PositionResult) -> StubGeolocation {
        StubGeolocation {
            delay: Duration::from_secs(2),
            result,
        }
    }

    const COORDS: Coordinates = Coordinates {
        latitude: -23.9608,
        longitude: -46.3336,
    };

    #[tokio::test(start_paused = true)]
    async fn submission_loads_then_settles_with_report() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Santos");

        vm.changed().await.unwrap();
        let loading = vm.borrow_and_update().clone();
        assert!(loading.loading);
        assert!(loading.weather_data.is_none());

        let settled = settled(&mut vm).await;
        assert!(!settled.loading);
        assert!(settled.error.is_empty());
        assert_eq!(
            settled.weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Santos")
        );
        assert_eq!(settled.condition, ConditionCategory::Rain);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_sets_message_and_clears_condition() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Lugar Nenhum");
        let settled = settled(&mut vm).await;

        assert!(!settled.loading);
        assert!(settled.weather_data.is_none());
        assert_eq!(settled.error, NOT_FOUND_MSG);
        assert_eq!(settled.condition, ConditionCategory::None);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_share_the_not_found_surface() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Offline");
        let settled = settled(&mut vm).await;

        assert!(settled.weather_data.is_none());
        assert_eq!(settled.error, NOT_FOUND_MSG);
        assert_eq!(settled.condition, ConditionCategory::None);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_submission_is_a_legal_query() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("");
        let settled = settled(&mut vm).await;

        assert_eq!(settled.error, NOT_FOUND_MSG);
    }

    #[tokio::test(start_paused = true)]
    async fn position_success_drives_a_coordinate_query() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.request_position();
        let settled = settled(&mut vm).await;

        assert_eq!(
            settled.weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Cidade do GPS")
        );
        assert!(settled.error.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn position_failure_codes_map_to_messages() {
        for err in [
            PositionError::PermissionDenied,
            PositionError::Unavailable,
            PositionError::Unsupported,
        ] {
            let session = session_with(quick_position(Err(err)));
            let mut vm = session.subscribe();

            session.request_position();
            let settled = settled(&mut vm).await;

            assert_eq!(settled.error, err.to_string());
            assert_eq!(settled.condition, ConditionCategory::None);
            assert!(!settled.loading, "position failure must not toggle loading");
            assert!(settled.weather_data.is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn submission_supersedes_pending_position_lookup() {
        // Position resolves only after 20s; the submission lands first and
        // must win. The late position result is dropped, not applied.
        let session = session_with(StubGeolocation {
            delay: Duration::from_secs(20),
            result: Ok(COORDS),
        });
        let mut vm = session.subscribe();

        session.request_position();
        session.submit("Santos");

        let settled = settled(&mut vm).await;
        assert_eq!(
            settled.weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Santos")
        );

        // Let the stale position lookup complete; nothing may change.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!vm.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_position_failure_cannot_overwrite_newer_search() {
        let session = session_with(StubGeolocation {
            delay: Duration::from_secs(20),
            result: Err(PositionError::PermissionDenied),
        });
        let mut vm = session.subscribe();

        session.request_position();
        session.submit("Santos");

        let settled = settled(&mut vm).await;
        assert!(settled.error.is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!vm.has_changed().unwrap());
        assert!(vm.borrow().error.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_submission_supersedes_inflight_query() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Lenta");
        session.submit("Santos");

        let settled = settled(&mut vm).await;
        assert_eq!(
            settled.weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Santos")
        );

        // The slow lookup finishes long after; its result is dropped.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!vm.has_changed().unwrap());
        assert_eq!(
            vm.borrow().weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Santos")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_subscribers_see_the_latest_snapshot() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Santos");
        settled(&mut vm).await;

        let late = session.subscribe();
        assert_eq!(
            late.borrow().weather_data.as_ref().map(|r| r.location_name.as_str()),
            Some("Santos")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_failure_clears_the_error() {
        let session = session_with(quick_position(Ok(COORDS)));
        let mut vm = session.subscribe();

        session.submit("Lugar Nenhum");
        let failed = settled(&mut vm).await;
        assert_eq!(failed.error, NOT_FOUND_MSG);

        session.submit("Santos");
        let recovered = settled(&mut vm).await;
        assert!(recovered.error.is_empty());
        assert_eq!(recovered.condition, ConditionCategory::Rain);
    }
}

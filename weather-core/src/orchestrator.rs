//! Fetch state machine: resolve a location (unless coordinates are known), then
//! fetch its weather.
//!
//! Every `start_*` call bumps a generation counter and runs on its own task.
//! When a step finishes, its result is committed only if its generation is
//! still the current one; anything older is dropped without touching the
//! state. Overlapping requests are therefore allowed and the newest one wins,
//! regardless of which finishes first.
//!
//! Outcomes are delivered as [`FetchEvent`]s on the channel returned by
//! [`FetchOrchestrator::new`]. Session state (snapshot, location, display
//! units) is read back through accessors.

use parking_lot::Mutex;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, DEFAULT_TIMEOUT_SECS},
    error::FetchError,
    location::{HttpLocationResolver, LocationResolver},
    model::{DisplayPreferences, ResolvedLocation, TemperatureUnit, WeatherSnapshot, WindUnit},
    provider::{WeatherProvider, provider_from_config},
    theme::{DEFAULT_THEME, Theme, theme_for},
    units::DisplayReading,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Resolving,
    Fetching,
    /// Idle after the current generation stored a snapshot.
    Succeeded,
    /// Idle after the current generation failed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchState {
    pub phase: Phase,
    pub generation: u64,
}

impl FetchState {
    /// True while the current generation is resolving or fetching.
    pub fn busy(&self) -> bool {
        matches!(self.phase, Phase::Resolving | Phase::Fetching)
    }
}

/// Outcome of the current generation. Superseded requests never produce one.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Loaded {
        generation: u64,
        snapshot: WeatherSnapshot,
        /// `None` for a refresh by bare coordinates.
        location: Option<ResolvedLocation>,
    },
    Failed {
        generation: u64,
        error: FetchError,
    },
}

/// A launched request. Dropping it does not cancel anything.
#[derive(Debug)]
pub struct FetchHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl FetchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait until the request's task has finished, whether or not its result was kept.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(generation = self.generation, "fetch task ended abnormally: {err}");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    pub preferences: DisplayPreferences,
    /// Upper bound for each network step.
    pub step_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            preferences: DisplayPreferences::default(),
            step_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    state: FetchState,
    snapshot: Option<WeatherSnapshot>,
    location: Option<ResolvedLocation>,
    preferences: DisplayPreferences,
}

#[derive(Debug)]
enum Target {
    Ip,
    City(String),
    Coordinates { latitude: f64, longitude: f64, known: Option<ResolvedLocation> },
}

#[derive(Debug)]
struct Inner {
    resolver: Arc<dyn LocationResolver>,
    provider: Arc<dyn WeatherProvider>,
    step_timeout: Duration,
    events: mpsc::UnboundedSender<FetchEvent>,
    session: Mutex<Session>,
}

#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    inner: Arc<Inner>,
}

impl FetchOrchestrator {
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        provider: Arc<dyn WeatherProvider>,
        options: OrchestratorOptions,
    ) -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Session { preferences: options.preferences, ..Default::default() };

        let orchestrator = Self {
            inner: Arc::new(Inner {
                resolver,
                provider,
                step_timeout: options.step_timeout,
                events,
                session: Mutex::new(session),
            }),
        };

        (orchestrator, rx)
    }

    /// HTTP-backed orchestrator using the endpoints, keys and default units in `config`.
    pub fn from_config(
        config: &Config,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<FetchEvent>)> {
        let resolver = Arc::new(HttpLocationResolver::from_config(config)?);
        let provider = provider_from_config(config)?;

        Ok(Self::new(
            resolver,
            provider,
            OrchestratorOptions {
                preferences: config.display,
                step_timeout: config.services.timeout(),
            },
        ))
    }

    /// Locate by IP, then fetch. Must be called from within a tokio runtime.
    pub fn start_auto(&self) -> FetchHandle {
        self.launch(Target::Ip)
    }

    /// Geocode `city`, then fetch.
    ///
    /// Blank input is reported as [`FetchError::InvalidInput`] on the event
    /// channel and `None` is returned; no generation is consumed and the state
    /// is left as it was.
    pub fn start_search(&self, city: &str) -> Option<FetchHandle> {
        if city.trim().is_empty() {
            let session = self.inner.session.lock();
            debug!("rejecting blank search");
            self.emit(FetchEvent::Failed {
                generation: session.state.generation,
                error: FetchError::InvalidInput("Please provide the name of the city".into()),
            });
            return None;
        }

        Some(self.launch(Target::City(city.to_string())))
    }

    /// Fetch for known coordinates, skipping location resolution.
    ///
    /// The stored location is cleared when the weather lands, since the
    /// coordinates carry no place name.
    pub fn start_refresh(&self, latitude: f64, longitude: f64) -> FetchHandle {
        self.launch(Target::Coordinates { latitude, longitude, known: None })
    }

    /// Re-fetch for an already resolved location and keep it as the label.
    pub fn start_refresh_at(&self, location: ResolvedLocation) -> FetchHandle {
        self.launch(Target::Coordinates {
            latitude: location.latitude,
            longitude: location.longitude,
            known: Some(location),
        })
    }

    /// Drop the stored snapshot and location.
    ///
    /// A settled session goes back to `Idle`. A request still in flight keeps
    /// its phase, so `busy()` stays true until it lands. The generation is
    /// left alone; pair with a `start_*` call to supersede it.
    pub fn reset(&self) {
        let mut session = self.inner.session.lock();
        session.snapshot = None;
        session.location = None;
        if !session.state.busy() {
            session.state.phase = Phase::Idle;
        }
        debug!(
            generation = session.state.generation,
            phase = ?session.state.phase,
            "session reset"
        );
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.inner.session.lock().preferences.temperature_unit = unit;
    }

    pub fn set_wind_unit(&self, unit: WindUnit) {
        self.inner.session.lock().preferences.wind_unit = unit;
    }

    pub fn state(&self) -> FetchState {
        self.inner.session.lock().state
    }

    pub fn snapshot(&self) -> Option<WeatherSnapshot> {
        self.inner.session.lock().snapshot.clone()
    }

    pub fn location(&self) -> Option<ResolvedLocation> {
        self.inner.session.lock().location.clone()
    }

    pub fn preferences(&self) -> DisplayPreferences {
        self.inner.session.lock().preferences
    }

    /// Theme for the stored snapshot's description, or the default theme.
    pub fn theme(&self) -> Theme {
        self.inner
            .session
            .lock()
            .snapshot
            .as_ref()
            .map(|s| theme_for(&s.description))
            .unwrap_or(DEFAULT_THEME)
    }

    /// Stored snapshot converted to the current display units.
    pub fn reading(&self) -> Option<DisplayReading> {
        let session = self.inner.session.lock();
        session
            .snapshot
            .as_ref()
            .map(|s| DisplayReading::new(s, session.preferences))
    }

    fn launch(&self, target: Target) -> FetchHandle {
        let generation = {
            let mut session = self.inner.session.lock();
            session.state.generation += 1;
            session.state.phase = match target {
                Target::Coordinates { .. } => Phase::Fetching,
                Target::Ip | Target::City(_) => Phase::Resolving,
            };
            session.state.generation
        };
        debug!(generation, ?target, "starting fetch");

        let task = tokio::spawn(self.clone().supervise(generation, target));
        FetchHandle { generation, task }
    }

    /// Runs the request on its own task so a panicking resolver or provider
    /// still ends the generation as a failure instead of leaving it busy.
    async fn supervise(self, generation: u64, target: Target) {
        let worker = tokio::spawn(self.clone().run(generation, target));
        if let Err(err) = worker.await {
            let reason = format!("request aborted: {err}");
            let error = match self.state().phase {
                Phase::Resolving => FetchError::LocationLookup(reason),
                _ => FetchError::WeatherLookup(reason),
            };
            self.finish_failed(generation, error);
        }
    }

    async fn run(self, generation: u64, target: Target) {
        let resolver = Arc::clone(&self.inner.resolver);

        let (latitude, longitude, location) = match target {
            Target::Coordinates { latitude, longitude, known } => (latitude, longitude, known),
            Target::Ip => match self.resolve(generation, resolver.resolve_by_ip()).await {
                Some(loc) => (loc.latitude, loc.longitude, Some(loc)),
                None => return,
            },
            Target::City(city) => {
                match self.resolve(generation, resolver.resolve_by_name(&city)).await {
                    Some(loc) => (loc.latitude, loc.longitude, Some(loc)),
                    None => return,
                }
            }
        };

        let fetched = match timeout(
            self.inner.step_timeout,
            self.inner.provider.fetch(latitude, longitude),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::WeatherLookup(format!(
                "weather request timed out after {:?}",
                self.inner.step_timeout
            ))),
        };

        match fetched {
            Ok(snapshot) => self.finish_loaded(generation, snapshot, location),
            Err(error) => self.finish_failed(generation, error),
        }
    }

    /// Run a resolver step; `Some` only if it succeeded and is still current.
    async fn resolve<F>(&self, generation: u64, lookup: F) -> Option<ResolvedLocation>
    where
        F: Future<Output = Result<ResolvedLocation, FetchError>>,
    {
        let resolved = match timeout(self.inner.step_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::LocationLookup(format!(
                "location lookup timed out after {:?}",
                self.inner.step_timeout
            ))),
        };

        match resolved {
            Ok(location) => {
                let mut session = self.inner.session.lock();
                if session.state.generation != generation {
                    debug!(
                        generation,
                        current = session.state.generation,
                        "discarding stale location"
                    );
                    return None;
                }
                session.state.phase = Phase::Fetching;
                debug!(generation, city = %location.city, "location resolved");
                Some(location)
            }
            Err(error) => {
                self.finish_failed(generation, error);
                None
            }
        }
    }

    fn finish_loaded(
        &self,
        generation: u64,
        snapshot: WeatherSnapshot,
        location: Option<ResolvedLocation>,
    ) {
        let mut session = self.inner.session.lock();
        if session.state.generation != generation {
            debug!(generation, current = session.state.generation, "discarding stale weather");
            return;
        }

        session.snapshot = Some(snapshot.clone());
        session.location = location.clone();
        session.state.phase = Phase::Succeeded;
        info!(
            generation,
            temperature_c = snapshot.temperature_c,
            description = %snapshot.description,
            "weather updated"
        );

        // Sent under the lock so events arrive in commit order.
        self.emit(FetchEvent::Loaded { generation, snapshot, location });
    }

    fn finish_failed(&self, generation: u64, error: FetchError) {
        let mut session = self.inner.session.lock();
        if session.state.generation != generation {
            debug!(
                generation,
                current = session.state.generation,
                "discarding stale error: {error}"
            );
            return;
        }

        session.state.phase = Phase::Failed;
        warn!(generation, "fetch failed: {error}");
        self.emit(FetchEvent::Failed { generation, error });
    }

    fn emit(&self, event: FetchEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

//! Simulated greenhouse feed for the detail view.
//!
//! A [`TelemetrySession`] lives for exactly one detail-view visit. It starts in
//! [`ConnectionPhase::Connecting`], registers a one-shot handshake timer, and on
//! handshake switches to [`ConnectionPhase::Live`], seeds the sensor readings
//! and registers the repeating jitter tick. [`TelemetrySession::teardown`]
//! consumes the session and cancels whatever timers are still pending, so no
//! firing can reach a session the user has left.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::catalog::{CatalogItem, ItemId, VariantId};
use crate::config::TelemetryConfig;
use crate::scheduler::{Scheduler, TimerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryTimerKind {
    Handshake,
    Tick,
}

/// Payload carried by every timer a session registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryTimer {
    pub session: SessionId,
    pub kind: TelemetryTimerKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConnectionPhase {
    Connecting,
    Live,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub light_lux: f64,
}

impl SensorReadings {
    /// One random-walk step. Temperature keeps one decimal place, humidity is
    /// held to `0..=100` and light never goes negative.
    pub fn jitter<R: Rng>(&self, rng: &mut R, config: &TelemetryConfig) -> Self {
        let temperature = self.temperature_c + symmetric(rng, config.temperature_jitter);
        let humidity = (self.humidity_pct + symmetric(rng, config.humidity_jitter)).floor();
        let light = (self.light_lux + symmetric(rng, config.light_jitter)).floor();
        Self {
            temperature_c: (temperature * 10.0).round() / 10.0,
            humidity_pct: humidity.clamp(0.0, 100.0),
            light_lux: light.max(0.0),
        }
    }
}

fn symmetric<R: Rng>(rng: &mut R, amplitude: f64) -> f64 {
    let amplitude = amplitude.abs();
    rng.gen_range(-amplitude..=amplitude)
}

/// Outcome of [`TelemetrySession::select_variant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantSelection {
    Selected,
    Unchanged,
    Rejected,
}

/// Read-only view of a session for renderers and subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub session: SessionId,
    pub item: ItemId,
    pub phase: ConnectionPhase,
    pub readings: Option<SensorReadings>,
    pub camera: u8,
    pub zoom: f64,
    pub selected_variant: Option<VariantId>,
    pub ticks: u64,
}

#[derive(Debug)]
pub struct TelemetrySession {
    id: SessionId,
    item: ItemId,
    variants: Vec<VariantId>,
    phase: ConnectionPhase,
    readings: Option<SensorReadings>,
    camera: u8,
    zoom_steps: u32,
    selected_variant: Option<VariantId>,
    handshake: Option<TimerId>,
    ticker: Option<TimerId>,
    ticks: u64,
    rng: ChaCha8Rng,
    config: TelemetryConfig,
}

impl TelemetrySession {
    pub fn start<S>(
        id: SessionId,
        item: &CatalogItem,
        config: &TelemetryConfig,
        scheduler: &mut S,
    ) -> Self
    where
        S: Scheduler<TelemetryTimer> + ?Sized,
    {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ id.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => ChaCha8Rng::from_entropy(),
        };
        let handshake = scheduler.schedule_once(
            config.handshake_delay(),
            TelemetryTimer {
                session: id,
                kind: TelemetryTimerKind::Handshake,
            },
        );
        info!(
            target: "greenflwr::telemetry",
            session = %id,
            item = %item.id,
            "telemetry.connecting"
        );

        Self {
            id,
            item: item.id.clone(),
            variants: item.variants.iter().map(|variant| variant.id.clone()).collect(),
            phase: ConnectionPhase::Connecting,
            readings: None,
            camera: 1,
            zoom_steps: 0,
            selected_variant: item.first_variant().map(|variant| variant.id.clone()),
            handshake: Some(handshake),
            ticker: None,
            ticks: 0,
            rng,
            config: config.clone(),
        }
    }

    /// Applies a fired timer. Returns whether the session state changed.
    pub fn on_timer<S>(&mut self, timer: TelemetryTimer, scheduler: &mut S) -> bool
    where
        S: Scheduler<TelemetryTimer> + ?Sized,
    {
        if timer.session != self.id {
            warn!(
                target: "greenflwr::telemetry",
                session = %self.id,
                stray = %timer.session,
                "telemetry.timer_mismatch"
            );
            return false;
        }

        match timer.kind {
            TelemetryTimerKind::Handshake => {
                if self.phase != ConnectionPhase::Connecting {
                    return false;
                }
                self.handshake = None;
                self.phase = ConnectionPhase::Live;
                self.readings = Some(self.config.initial_readings);
                self.ticker = Some(scheduler.schedule_every(
                    self.config.tick_interval(),
                    TelemetryTimer {
                        session: self.id,
                        kind: TelemetryTimerKind::Tick,
                    },
                ));
                info!(
                    target: "greenflwr::telemetry",
                    session = %self.id,
                    item = %self.item,
                    "telemetry.live"
                );
                true
            }
            TelemetryTimerKind::Tick => {
                let Some(current) = self.readings else {
                    return false;
                };
                let next = current.jitter(&mut self.rng, &self.config);
                self.readings = Some(next);
                self.ticks += 1;
                trace!(
                    target: "greenflwr::telemetry",
                    session = %self.id,
                    temperature = next.temperature_c,
                    humidity = next.humidity_pct,
                    light = next.light_lux,
                    "telemetry.tick"
                );
                true
            }
        }
    }

    /// Ends the session, cancelling the handshake and the periodic tick.
    pub fn teardown<S>(mut self, scheduler: &mut S)
    where
        S: Scheduler<TelemetryTimer> + ?Sized,
    {
        for timer in [self.handshake.take(), self.ticker.take()].into_iter().flatten() {
            scheduler.cancel(timer);
        }
        info!(
            target: "greenflwr::telemetry",
            session = %self.id,
            item = %self.item,
            ticks = self.ticks,
            "telemetry.closed"
        );
    }

    /// Switches the active camera. Indices outside `1..=camera_count` are ignored.
    pub fn set_camera(&mut self, index: u8) -> bool {
        if index == 0 || index > self.config.camera_count {
            debug!(target: "greenflwr::telemetry", index, "telemetry.camera_rejected");
            return false;
        }
        self.camera = index;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        if self.zoom_steps >= self.config.zoom_steps() {
            return false;
        }
        self.zoom_steps += 1;
        true
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.zoom_steps == 0 {
            return false;
        }
        self.zoom_steps -= 1;
        true
    }

    pub fn select_variant(&mut self, id: &str) -> VariantSelection {
        if !self.variants.iter().any(|variant| variant.as_str() == id) {
            debug!(
                target: "greenflwr::telemetry",
                item = %self.item,
                variant = id,
                "telemetry.variant_rejected"
            );
            return VariantSelection::Rejected;
        }
        if self
            .selected_variant
            .as_ref()
            .is_some_and(|selected| selected.as_str() == id)
        {
            return VariantSelection::Unchanged;
        }
        self.selected_variant = Some(VariantId::from(id));
        VariantSelection::Selected
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_live(&self) -> bool {
        self.phase == ConnectionPhase::Live
    }

    pub fn readings(&self) -> Option<SensorReadings> {
        self.readings
    }

    pub fn camera(&self) -> u8 {
        self.camera
    }

    pub fn zoom(&self) -> f64 {
        self.config.zoom_min + self.zoom_steps as f64 * self.config.zoom_step
    }

    pub fn selected_variant(&self) -> Option<&VariantId> {
        self.selected_variant.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending_timers(&self) -> Vec<TimerId> {
        [self.handshake, self.ticker].into_iter().flatten().collect()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            session: self.id,
            item: self.item.clone(),
            phase: self.phase,
            readings: self.readings,
            camera: self.camera,
            zoom: self.zoom(),
            selected_variant: self.selected_variant.clone(),
            ticks: self.ticks,
        }
    }
}

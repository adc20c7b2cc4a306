//! Prometheus gauges backed by remote caches.
//!
//! Each surface owns a registry whose gauges are written from
//! [`RemoteCache::get`] at scrape time, so a scrape inherits the cache's
//! staleness bound and its down-on-error policy. The rendered text also
//! carries the process-wide self-metrics.

use std::sync::Arc;

use pico_core::{HumidityReading, PanicStatus, PulseStatus};
use pico_telemetry::{encode_families, Metrics};
use prometheus::{Gauge, Opts, Registry};

use crate::cache::RemoteCache;
use crate::error::ExporterResult;

enum Sources {
    Panic {
        pulse: Arc<RemoteCache<PulseStatus>>,
        up: Gauge,
        panic: Option<(Arc<RemoteCache<PanicStatus>>, Gauge)>,
    },
    Humidity {
        reading: Arc<RemoteCache<HumidityReading>>,
        humidity: Gauge,
        up: Gauge,
    },
}

/// Gauges exposed at `/metrics`.
pub struct MetricsSurface {
    registry: Registry,
    sources: Sources,
}

impl MetricsSurface {
    /// Panic button gauges.
    ///
    /// `pico_up` follows the `/pulse` cache. `pico_panic{status="bool"}` is
    /// only registered when a `/panic` cache is supplied.
    pub fn panic(
        pulse: Arc<RemoteCache<PulseStatus>>,
        panic: Option<Arc<RemoteCache<PanicStatus>>>,
    ) -> ExporterResult<Self> {
        let registry = Registry::new();

        let up = Gauge::with_opts(Opts::new("pico_up", "Pico panic button reachability."))?;
        registry.register(Box::new(up.clone()))?;

        let panic = match panic {
            Some(cache) => {
                let gauge = Gauge::with_opts(
                    Opts::new("pico_panic", "Pico Panic Checker.").const_label("status", "bool"),
                )?;
                registry.register(Box::new(gauge.clone()))?;
                Some((cache, gauge))
            }
            None => None,
        };

        Ok(Self {
            registry,
            sources: Sources::Panic { pulse, up, panic },
        })
    }

    /// Humidity sensor gauges.
    pub fn humidity(reading: Arc<RemoteCache<HumidityReading>>) -> ExporterResult<Self> {
        let registry = Registry::new();

        let humidity = Gauge::with_opts(
            Opts::new("pico_humidity", "Pico Sensor Humidity.")
                .subsystem("monstera_sensor")
                .const_label("unit", "humidity"),
        )?;
        let up = Gauge::with_opts(
            Opts::new("pico_up", "Pico Sensor Server Status.").subsystem("monstera_sensor"),
        )?;
        registry.register(Box::new(humidity.clone()))?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            registry,
            sources: Sources::Humidity {
                reading,
                humidity,
                up,
            },
        })
    }

    /// Refresh gauges from their caches.
    pub async fn update(&self) {
        match &self.sources {
            Sources::Panic { pulse, up, panic } => {
                let pulse = pulse.get().await;
                up.set(bool_gauge(pulse.up && pulse.value.up));

                if let Some((cache, gauge)) = panic {
                    let status = cache.get().await;
                    gauge.set(bool_gauge(status.up && status.value.panic));
                }
            }
            Sources::Humidity {
                reading,
                humidity,
                up,
            } => {
                let snapshot = reading.get().await;
                humidity.set(snapshot.value.value);
                up.set(bool_gauge(snapshot.up));
            }
        }
    }

    /// Refresh and encode surface gauges plus self-metrics.
    pub async fn render(&self) -> ExporterResult<String> {
        self.update().await;

        let mut families = self.registry.gather();
        families.extend(Metrics::gather());
        Ok(encode_families(&families)?)
    }
}

fn bool_gauge(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::fetch::MockFetch;
    use pico_core::ManualClock;

    fn cache<T>(mock: &Arc<MockFetch<T>>) -> Arc<RemoteCache<T>>
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        Arc::new(RemoteCache::new(
            mock.clone(),
            Arc::new(ManualClock::new(0)),
            DEFAULT_TTL,
        ))
    }

    #[tokio::test]
    async fn test_panic_surface_reports_up_and_panic() {
        let pulse = Arc::new(MockFetch::new("pulse"));
        pulse.push_ok(PulseStatus::up());
        let panic = Arc::new(MockFetch::new("panic"));
        panic.push_ok(PanicStatus::raised(chrono::Utc::now()));

        let surface = MetricsSurface::panic(cache(&pulse), Some(cache(&panic))).unwrap();
        let text = surface.render().await.unwrap();

        assert!(text.contains("pico_up 1"));
        assert!(text.contains("pico_panic{status=\"bool\"} 1"));
    }

    #[tokio::test]
    async fn test_down_device_zeroes_gauges() {
        let pulse: Arc<MockFetch<PulseStatus>> = Arc::new(MockFetch::new("pulse"));
        pulse.push_err();

        let surface = MetricsSurface::panic(cache(&pulse), None).unwrap();
        let text = surface.render().await.unwrap();

        assert!(text.contains("pico_up 0"));
        assert!(!text.contains("pico_panic{"));
    }

    #[tokio::test]
    async fn test_humidity_surface() {
        let reading = Arc::new(MockFetch::new("humidity"));
        reading.push_ok(HumidityReading::from_raw(41_234));

        let surface = MetricsSurface::humidity(cache(&reading)).unwrap();
        let text = surface.render().await.unwrap();

        assert!(text.contains("monstera_sensor_pico_humidity{unit=\"humidity\"} 41234"));
        assert!(text.contains("monstera_sensor_pico_up 1"));
    }

    #[tokio::test]
    async fn test_includes_self_metrics() {
        let pulse = Arc::new(MockFetch::new("pulse"));
        pulse.push_ok(PulseStatus::up());

        let surface = MetricsSurface::panic(cache(&pulse), None).unwrap();
        let text = surface.render().await.unwrap();

        assert!(text.contains("pico_cache_refresh_total"));
    }
}

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum OperationKind {
    Reload,
    Filter,
    IndividualQuantity,
    GlobalQuantity,
    Submit,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationRecord {
    pub operation: OperationKind,
    pub success: u32,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TimeMetric {
    pub success: u32,
}

pub struct PrometheusClient {
    registry: Registry,
    operation: Family<OperationRecord, Counter>,
    submission_time: Family<TimeMetric, Histogram>,

    loaded_workers: Gauge,
    // per active skill when the backend reports it, overall pool otherwise
    available_tasks: Gauge,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let operation = Family::default();
        let loaded_workers = Gauge::default();
        let available_tasks = Gauge::default();
        let submission_time: Family<TimeMetric, Histogram> = Family::new_with_constructor(|| {
            Histogram::new([0.1, 0.25, 0.5, 1., 2.5, 5., 10., 30., f64::INFINITY].into_iter())
        });

        registry.register(
            "desk_operation",
            "Allocation desk operations by kind and outcome",
            operation.clone(),
        );
        registry.register(
            "desk_submission_time",
            "Round trip time of assignment submissions in seconds",
            submission_time.clone(),
        );
        registry.register(
            "desk_loaded_workers",
            "Workers in the currently loaded directory",
            loaded_workers.clone(),
        );
        registry.register(
            "desk_available_tasks",
            "Unassigned tasks for the active skill",
            available_tasks.clone(),
        );
        Self {
            registry,
            operation,
            submission_time,
            loaded_workers,
            available_tasks,
        }
    }
}

impl PrometheusClient {
    pub fn record(&self, operation: OperationKind, success: bool) {
        self.operation
            .get_or_create(&OperationRecord {
                operation,
                success: success as u32,
            })
            .inc();
    }

    pub fn record_submission(&self, success: bool, started: chrono::DateTime<chrono::Utc>) {
        self.record(OperationKind::Submit, success);

        let time = chrono::Utc::now() - started;
        self.submission_time
            .get_or_create(&TimeMetric {
                success: success as u32,
            })
            .observe(time.num_milliseconds() as f64 / 1000.0);
    }

    pub fn set_directory(&self, workers: usize, available: u64) {
        self.loaded_workers.set(workers as i64);
        self.available_tasks
            .set(i64::try_from(available).unwrap_or(i64::MAX));
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

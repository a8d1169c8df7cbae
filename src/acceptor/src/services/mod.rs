pub mod otlp_metric_service;

pub use otlp_metric_service::MetricsAcceptorService;

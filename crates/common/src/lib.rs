pub mod config;
pub mod structured_logging;

pub use config::{
    ComplexityConfig, ConfigError, ConfigLoader, CoreConfig, ExecutorConfig, LoggingSettings,
    RouterConfig,
};

pub use structured_logging::{
    init_structured_logging, new_request_id, parse_level, ExecutionContext, JsonFormatter,
    LoggingConfig, OperationTimer, PerformanceMetrics, StructuredLogEntry,
};

use crate::queue::QueueKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default queue capacity (2 << 16 slots)
pub const DEFAULT_CAPACITY: usize = 2 << 16;

/// Default reporting interval
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Number of producer threads
    pub producers: usize,

    /// Number of consumer threads
    pub consumers: usize,

    /// Queue capacity (slots)
    pub capacity: usize,

    /// Time between reporter ticks
    pub report_interval: Duration,

    /// Queue implementation under test
    pub queue_kind: QueueKind,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 1,
            capacity: DEFAULT_CAPACITY,
            report_interval: DEFAULT_REPORT_INTERVAL,
            queue_kind: QueueKind::Bounded,
        }
    }
}

impl BenchConfig {
    /// Create a configuration with the given thread counts
    pub fn simple(producers: usize, consumers: usize) -> Self {
        Self {
            producers,
            consumers,
            ..Default::default()
        }
    }

    /// Build a configuration from positional command-line arguments
    ///
    /// `[producers [consumers]]`, program name excluded. Missing values keep
    /// their defaults; anything non-numeric or extra is rejected.
    pub fn from_args<I, S>(args: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config: BenchConfig = BenchConfig::default();

        for (position, arg) in args.into_iter().enumerate() {
            let arg: &str = arg.as_ref();
            match position {
                0 => config.producers = parse_count("producer", arg)?,
                1 => config.consumers = parse_count("consumer", arg)?,
                _ => {
                    return Err(crate::Error::Config(format!(
                        "Unexpected argument '{}' (usage: mpmc-bench [producers [consumers]])",
                        arg
                    )));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.producers == 0 {
            return Err(crate::Error::Config(
                "Producer count must be at least 1".to_string(),
            ));
        }

        if self.consumers == 0 {
            return Err(crate::Error::Config(
                "Consumer count must be at least 1".to_string(),
            ));
        }

        if self.capacity == 0 {
            return Err(crate::Error::Config(
                "Queue capacity must be at least 1".to_string(),
            ));
        }

        if self.report_interval.is_zero() {
            return Err(crate::Error::Config(
                "Report interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_count(role: &str, arg: &str) -> crate::Result<usize> {
    arg.trim().parse::<usize>().map_err(|e| {
        crate::Error::Config(format!("Invalid {} count '{}': {}", role, arg, e))
    })
}

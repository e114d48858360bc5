use crate::config::{Backend, ScanConfig};
use crate::error::{check_shape, check_workers, ScanError};
use crate::program::Invocation;
use crate::stepper::Stepper;
use crate::threaded;
use tracing::debug;

/// Exclusive prefix sum over power-of-two sized inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prescan {
    config: ScanConfig,
}

impl Prescan {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Writes the exclusive prefix sum of `input` into `output`.
    ///
    /// `input.len()` must be a power of two of at least 2 and `output` must
    /// have the same length.
    pub fn scan(&self, input: &[f32], output: &mut [f32]) -> Result<(), ScanError> {
        check_shape(input.len(), output.len())?;

        match self.config.backend {
            Backend::Threaded => {
                check_workers(input.len(), self.config.max_workers)?;
                let invocation = Invocation::new(self.config.layout, input);
                debug!(
                    n = invocation.n(),
                    workers = invocation.workers(),
                    staging = invocation.staging_len(),
                    "launching exclusive scan"
                );
                threaded::run(&invocation, output)
            }
            Backend::Stepped => Stepper::new(self.config.layout).run(input, output),
        }
    }

    pub fn scan_to_vec(&self, input: &[f32]) -> Result<Vec<f32>, ScanError> {
        let mut output = vec![0.0; input.len()];
        self.scan(input, &mut output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::Prescan;
    use crate::config::{Backend, ScanConfig};
    use crate::error::ScanError;

    #[test]
    fn scan_to_vec_test() {
        let prescan = Prescan::default();
        let actual = prescan.scan_to_vec(&[5.0, 5.0]).unwrap();
        assert_eq!(actual, vec![0.0, 5.0]);
    }

    #[test]
    fn rejects_bad_shapes() {
        let prescan = Prescan::default();
        assert!(matches!(
            prescan.scan_to_vec(&[1.0, 2.0, 3.0]),
            Err(ScanError::InvalidLength(3))
        ));

        let mut output = [0.0; 2];
        assert!(matches!(
            prescan.scan(&[1.0; 4], &mut output),
            Err(ScanError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn worker_cap_only_limits_threads() {
        let config = ScanConfig::default().with_max_workers(2);
        let input = [1.0; 8];

        let threaded = Prescan::new(config);
        assert!(matches!(
            threaded.scan_to_vec(&input),
            Err(ScanError::TooManyWorkers { workers: 4, .. })
        ));

        let stepped = Prescan::new(config.with_backend(Backend::Stepped));
        let actual = stepped.scan_to_vec(&input).unwrap();
        assert_eq!(actual, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }
}

/// A snapshot of the run, emitted at every reporting point. Formatting is
/// the driver's business; the engine only supplies the numbers.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    /// Steps completed so far (0 for the load report).
    pub step: usize,
    pub n_objects: usize,
    pub pressure: f64,
    pub beta: f64,
    pub area: f64,
    /// Objects per unit area.
    pub density: f64,
    pub energy: f64,
    pub accepted: u64,
    pub attempted: u64,
    pub dl_max: f64,
}

#[derive(Debug, Clone)]
pub enum Progress {
    /// The configuration has been loaded and its initial energy evaluated.
    Loaded { report: RunReport },

    /// The overlap-relaxation phase ran and finished.
    Relaxed { steps: usize, report: RunReport },

    /// A sampling chunk of the main loop finished.
    Sampled { report: RunReport },

    /// The run is complete.
    Finished { report: RunReport },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

use nalgebra::DMatrix;

/// One full multi-channel recording, channels along the rows.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Uniform sampling frequency in Hz (taken from the first channel header)
    pub fs: f64,
    /// Channel labels, row order
    pub labels: Vec<String>,
    /// channels × samples
    pub data: DMatrix<f64>,
}

impl Recording {
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration(&self) -> f64 {
        self.data.ncols() as f64 / self.fs
    }

    /// Slice the sample axis over `[onset, onset + duration)` seconds.
    ///
    /// Bounds are `floor(t * fs)` on both ends and clamp silently to the
    /// recorded length, so a window past the end comes back shorter
    /// (possibly empty) rather than failing.
    pub fn segment(&self, onset: f64, duration: f64) -> DMatrix<f64> {
        let n = self.data.ncols();
        let start = ((onset * self.fs).floor() as usize).min(n);
        let end = (((onset + duration) * self.fs).floor() as usize).clamp(start, n);
        self.data.columns(start, end - start).into_owned()
    }
}

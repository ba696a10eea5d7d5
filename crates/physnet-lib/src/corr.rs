use nalgebra::DMatrix;

/// Spatial correlation matrix across channels: `X·Xᵀ` where `X` is the
/// input with each channel's own mean subtracted.
///
/// The product is deliberately left unnormalized (no division by sample
/// count or standard deviations); downstream consumers of the historical
/// pipeline depend on that scale.
pub fn spatial_correlation(channels: &DMatrix<f64>) -> DMatrix<f64> {
    let mut x = channels.clone();
    for mut row in x.row_iter_mut() {
        let mean = row.mean();
        row.add_scalar_mut(-mean);
    }
    &x * x.transpose()
}

use crate::geo::{CrsRef, Point};
use crate::utils::{GeoAssistError, Result};
use proj::Proj;

/// Convert a batch of points from `source` to `dest`, preserving order.
///
/// The whole batch transforms or none of it does: the first point the
/// projection rejects (or maps to a non-finite value) discards everything.
pub fn transform_batch(points: &[Point], source: &CrsRef, dest: &CrsRef) -> Result<Vec<Point>> {
    if points.is_empty() {
        return Err(GeoAssistError::NoCoordinatesRecognized);
    }

    let pipeline = Proj::new_known_crs(&source.code, &dest.code, None).map_err(|e| {
        GeoAssistError::TransformFailed {
            source_id: source.code.clone(),
            dest_id: dest.code.clone(),
            message: e.to_string(),
        }
    })?;

    let mut out = Vec::with_capacity(points.len());
    for point in points {
        let (x, y) = pipeline.convert((point.x, point.y)).map_err(|e| {
            GeoAssistError::TransformFailed {
                source_id: source.code.clone(),
                dest_id: dest.code.clone(),
                message: e.to_string(),
            }
        })?;

        if !x.is_finite() || !y.is_finite() {
            return Err(GeoAssistError::TransformFailed {
                source_id: source.code.clone(),
                dest_id: dest.code.clone(),
                message: format!("non-finite result for input ({}, {})", point.x, point.y),
            });
        }

        out.push(Point::new(x, y));
    }

    Ok(out)
}

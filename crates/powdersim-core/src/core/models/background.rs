use super::ModelError;

/// A piecewise-linear background defined by `(x, intensity)` anchors.
///
/// Anchors are kept sorted by `x`. Outside the anchor span the background is clamped
/// to the nearest end anchor; with no anchors it evaluates to zero everywhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Background {
    points: Vec<(f64, f64)>,
}

impl Background {
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, ModelError> {
        let mut points: Vec<(f64, f64)> = points.into_iter().collect();
        if let Some(&(x, _)) = points
            .iter()
            .find(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ModelError::InvalidBackgroundPoint(x));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, x: f64) -> f64 {
        let points = &self.points;
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 0.0;
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        // First anchor strictly to the right of x; guaranteed to exist and be > 0 here.
        let upper = points.partition_point(|p| p.0 <= x);
        let (x0, y0) = points[upper - 1];
        let (x1, y1) = points[upper];
        if x1 == x0 {
            return y1;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    pub fn evaluate(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.value_at(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_background_is_zero() {
        let bg = Background::default();
        assert_eq!(bg.evaluate(&[1.0, 2.0, 3.0]), vec![0.0; 3]);
    }

    #[test]
    fn interpolates_linearly_and_clamps_outside_span() {
        let bg = Background::new([(20.0, 30.0), (10.0, 10.0)]).unwrap();
        assert_eq!(bg.points()[0], (10.0, 10.0));
        assert_eq!(bg.evaluate(&[0.0, 10.0, 15.0, 20.0, 40.0]), vec![
            10.0, 10.0, 20.0, 30.0, 30.0
        ]);
    }

    #[test]
    fn flat_background_scenario() {
        let bg = Background::new([(0.0, 1.0), (180.0, 1.0)]).unwrap();
        assert_eq!(bg.evaluate(&[10.0, 20.0, 30.0]), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn rejects_non_finite_anchors() {
        assert!(Background::new([(f64::NAN, 1.0)]).is_err());
        assert!(Background::new([(1.0, f64::INFINITY)]).is_err());
    }
}

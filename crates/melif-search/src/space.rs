//! Standard starting points on the weight simplex.

use melif_types::{ConfigError, Point};
use std::collections::BTreeSet;

/// Generators for seed points.
#[derive(Debug, Clone, Copy)]
pub struct SeedSpace;

impl SeedSpace {
    /// The uniform point followed by every axis unit point.
    /// Empty for `dimension == 0`.
    pub fn axis_and_uniform(dimension: usize) -> Vec<Point> {
        std::iter::once(Point::uniform(dimension))
            .chain((0..dimension).map(|axis| Point::unit(dimension, axis)))
            .filter_map(Result::ok)
            .collect()
    }

    /// Axis points, the uniform point and a regular grid over the simplex.
    ///
    /// Grid coordinates take the values `1 - i/resolution` for
    /// `i in 0..resolution`; every combination is normalized and duplicates
    /// under point equality are merged. The result is in point order.
    pub fn partition(dimension: usize, resolution: usize) -> Result<Vec<Point>, ConfigError> {
        if resolution == 0 {
            return Err(ConfigError::InvalidGrid { resolution });
        }
        if dimension == 0 {
            return Ok(Vec::new());
        }

        let levels: Vec<f64> = (0..resolution)
            .map(|i| 1.0 - i as f64 / resolution as f64)
            .collect();

        // Cartesian product of the levels over every coordinate
        let mut grid: Vec<Vec<f64>> = vec![Vec::with_capacity(dimension)];
        for _ in 0..dimension {
            let mut next = Vec::with_capacity(grid.len() * levels.len());
            for existing in &grid {
                for level in &levels {
                    let mut raw = existing.clone();
                    raw.push(*level);
                    next.push(raw);
                }
            }
            grid = next;
        }

        let mut points: BTreeSet<Point> = Self::axis_and_uniform(dimension).into_iter().collect();
        points.extend(grid.into_iter().filter_map(|raw| Point::new(raw).ok()));
        Ok(points.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_and_uniform_points() {
        let seeds = SeedSpace::axis_and_uniform(3);
        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds[0], Point::uniform(3).unwrap());
        assert_eq!(seeds[2], Point::unit(3, 1).unwrap());
        assert!(SeedSpace::axis_and_uniform(0).is_empty());
    }

    #[test]
    fn partition_merges_equal_points() {
        // Levels {1.0, 0.5}: (1,1) and (0.5,0.5) both normalize to the uniform point
        let seeds = SeedSpace::partition(2, 2).unwrap();
        let expected: Vec<Point> = [
            vec![0.0, 1.0],
            vec![1.0, 2.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![1.0, 0.0],
        ]
        .into_iter()
        .map(|raw| Point::new(raw).unwrap())
        .collect();
        assert_eq!(seeds, expected);
    }

    #[test]
    fn coarse_partition_is_axis_and_uniform() {
        let seeds = SeedSpace::partition(3, 1).unwrap();
        assert_eq!(seeds.len(), 4);
        for point in SeedSpace::axis_and_uniform(3) {
            assert!(seeds.contains(&point));
        }
    }

    #[test]
    fn finer_partitions_add_points() {
        let coarse = SeedSpace::partition(3, 2).unwrap();
        let fine = SeedSpace::partition(3, 3).unwrap();
        assert!(fine.len() > coarse.len());
        assert!(fine.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert_eq!(
            SeedSpace::partition(3, 0),
            Err(ConfigError::InvalidGrid { resolution: 0 })
        );
    }
}

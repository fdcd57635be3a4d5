pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Mean radial distance of a shot group from its own centroid, a
/// tightness measure independent of where the group sits on the face.
pub fn group_spread(points: &[(f64, f64)]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
    let radial: Vec<f64> = points
        .iter()
        .map(|&(x, y)| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt())
        .collect();
    mean(&radial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(
            std_dev(&[100., 120., 90., 102., 94.]),
            Some(10.322790320451151)
        );
        assert_eq!(std_dev(&[15., 7., 55.]), Some(20.997354330698162));
    }

    #[test]
    fn test_std_dev_identical_values() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev_empty_slice() {
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn group_spread_of_a_single_shot_is_zero() {
        assert_eq!(group_spread(&[(40.0, 60.0)]), Some(0.0));
    }

    #[test]
    fn group_spread_is_translation_invariant() {
        let base = [(48.0, 50.0), (52.0, 50.0), (50.0, 48.0), (50.0, 52.0)];
        let shifted: Vec<(f64, f64)> = base.iter().map(|&(x, y)| (x + 7.0, y - 3.0)).collect();
        let a = group_spread(&base).unwrap();
        let b = group_spread(&shifted).unwrap();
        assert!((a - b).abs() < 1e-9);
        assert!((a - 2.0).abs() < 1e-9);
    }

    #[test]
    fn group_spread_empty_is_none() {
        assert_eq!(group_spread(&[]), None);
    }
}

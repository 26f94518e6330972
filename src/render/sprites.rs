//! Pre-rotated person sprites indexed by whole degrees.

use rayon::prelude::*;

/// Number of pre-rotated sprites, one per integer degree.
pub const DEGREES: usize = 360;

/// Map a heading in radians to the sprite rotation in `0..360`.
///
/// The sprite artwork faces up, so a heading of 0 (pointing along +x) needs a
/// 90 degree rotation. The result is always a valid [`SpriteTable`] index;
/// 360 is never produced.
pub fn heading_to_degree(heading: f64) -> u16 {
    let angle = heading * 180.0 / std::f64::consts::PI + 90.0;
    (angle.round() as i64).rem_euclid(DEGREES as i64) as u16
}

/// Sprites for every integer rotation, built once before playback.
#[derive(Debug)]
pub struct SpriteTable<T> {
    sprites: Vec<T>,
}

impl<T: Send> SpriteTable<T> {
    /// Render all rotations in parallel.
    pub fn build<E, F>(render: F) -> Result<Self, E>
    where
        E: Send,
        F: Fn(u16) -> Result<T, E> + Sync + Send,
    {
        let sprites = (0..DEGREES as u16)
            .into_par_iter()
            .map(render)
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self { sprites })
    }
}

impl<T> SpriteTable<T> {
    /// Sprite for an already normalised degree.
    pub fn get(&self, degree: u16) -> &T {
        debug_assert!((degree as usize) < DEGREES);
        &self.sprites[degree as usize % DEGREES]
    }

    /// Sprite for a heading in radians.
    pub fn for_heading(&self, heading: f64) -> &T {
        self.get(heading_to_degree(heading))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_heading_reference_points() {
        assert_eq!(heading_to_degree(-FRAC_PI_2), 0);
        assert_eq!(heading_to_degree(0.0), 90);
        assert_eq!(heading_to_degree(FRAC_PI_2), 180);
        assert_eq!(heading_to_degree(PI), 270);
    }

    #[test]
    fn test_heading_wraps() {
        // 269.6 + 90 rounds to 360, which must wrap to 0.
        assert_eq!(heading_to_degree(269.6f64.to_radians()), 0);
        assert_eq!(heading_to_degree(-PI), 270);
        assert_eq!(heading_to_degree(4.0 * PI), 90);
        assert_eq!(heading_to_degree(-3.0 * PI), 270);
    }

    #[test]
    fn test_non_finite_heading_is_in_range() {
        assert!((heading_to_degree(f64::NAN) as usize) < DEGREES);
        assert!((heading_to_degree(f64::INFINITY) as usize) < DEGREES);
        assert!((heading_to_degree(f64::NEG_INFINITY) as usize) < DEGREES);
    }

    #[test]
    fn test_table_build_keeps_degree_order() {
        let table = SpriteTable::build(|deg| Ok::<_, ()>(deg)).unwrap();
        assert_eq!(table.len(), DEGREES);
        for deg in 0..DEGREES as u16 {
            assert_eq!(*table.get(deg), deg);
        }
        assert_eq!(*table.for_heading(0.0), 90);
    }

    #[test]
    fn test_table_build_propagates_error() {
        let result = SpriteTable::build(|deg| if deg == 200 { Err(deg) } else { Ok(deg) });
        assert_eq!(result.unwrap_err(), 200);
    }

    proptest! {
        #[test]
        fn prop_heading_always_indexable(heading in -1.0e6f64..1.0e6) {
            let deg = heading_to_degree(heading);
            prop_assert!((deg as usize) < DEGREES);
        }
    }
}

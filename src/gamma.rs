/// Brightness correction lookup, shared by all three channels.
///
/// `table[i] = round(255 * (i / 255) ^ gamma)`. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaLookup {
    table: [u8; 256],
}

impl GammaLookup {
    pub fn new(gamma: f64) -> Self {
        let mut table = [0_u8; 256];
        for (index, out) in table.iter_mut().enumerate() {
            let f = (index as f64 / 255.0).powf(gamma);
            *out = (f * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        Self { table }
    }

    /// Pass-through table, gamma 1.0.
    pub fn identity() -> Self {
        Self::new(1.0)
    }

    pub fn correct(&self, value: u8) -> u8 {
        self.table[usize::from(value)]
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }
}

impl Default for GammaLookup {
    fn default() -> Self {
        Self::new(2.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_with_fixed_endpoints() {
        for gamma in [0.25, 0.5, 0.75, 1.0, 1.25, 2.2, 2.8, 5.0] {
            let lookup = GammaLookup::new(gamma);
            let table = lookup.table();
            assert_eq!(table[0], 0, "gamma {gamma}");
            assert_eq!(table[255], 255, "gamma {gamma}");
            assert!(
                table.windows(2).all(|w| w[0] <= w[1]),
                "gamma {gamma} is not monotonic"
            );
        }
    }

    #[test]
    fn test_identity() {
        let lookup = GammaLookup::identity();
        assert!((0..=255_u8).all(|v| lookup.correct(v) == v));
    }

    #[test]
    fn test_known_values() {
        let lookup = GammaLookup::new(2.8);
        // 255 * 0.5^2.8 = 36.6
        assert_eq!(lookup.correct(128), 37);
        assert_eq!(lookup.correct(1), 0);

        let lookup = GammaLookup::new(0.5);
        // 255 * sqrt(64/255) = 127.7
        assert_eq!(lookup.correct(64), 128);
    }
}

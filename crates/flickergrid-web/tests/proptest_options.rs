//! Property-based tests for JS options handling.
//!
//! Verifies:
//! 1. Any in-range numeric props parse and survive.
//! 2. Out-of-range opacity is always rejected.
//! 3. A configured seed always wins over the host fallback.
//! 4. `seed_from_unit` is monotone and stays within 53 bits.

#![cfg(not(target_arch = "wasm32"))]

use flickergrid_web::options::{flicker_config, seed_from_unit};
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_props_roundtrip(
        square in 1u16..64,
        gap in 0u16..64,
        opacity in 0.0f32..=1.0,
        chance in 0.0f32..=1.0,
    ) {
        let json = format!(
            r#"{{"squareSize": {square}, "gridGap": {gap}, "maxOpacity": {opacity}, "flickerChance": {chance}}}"#
        );
        let config = flicker_config(Some(&json), 5).unwrap();
        prop_assert_eq!(config.cell_size, f32::from(square));
        prop_assert_eq!(config.gap, f32::from(gap));
        // JSON numbers pass through f64 on the way in.
        prop_assert!((config.max_opacity - opacity).abs() <= f32::EPSILON);
        prop_assert!((config.flicker_chance - chance).abs() <= f32::EPSILON);
    }

    #[test]
    fn out_of_range_opacity_rejected(opacity in 1.001f32..100.0) {
        let json = format!(r#"{{"maxOpacity": {opacity}}}"#);
        prop_assert!(flicker_config(Some(&json), 0).is_err());
    }

    #[test]
    fn configured_seed_wins(seed in any::<u64>(), fallback in any::<u64>()) {
        let json = format!(r#"{{"seed": {seed}}}"#);
        prop_assert_eq!(flicker_config(Some(&json), fallback).unwrap().seed, Some(seed));
    }

    #[test]
    fn seed_from_unit_monotone(a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(seed_from_unit(lo) <= seed_from_unit(hi));
        prop_assert!(seed_from_unit(hi) < 1u64 << 53);
    }
}

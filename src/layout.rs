//! Hotspot placement for countries that have no hand-drawn region.
//!
//! Regions are derived from the country name alone, so the same country
//! lands on the same pixels on every run and in every client that applies
//! the same hash (the browser map uses the identical formula).

use crate::error::CodeMapperError;
use crate::models::HotspotRegion;

/// Distance kept between generated hotspots and the map edge.
const EDGE_MARGIN: i64 = 50;
pub const HOTSPOT_WIDTH: u32 = 50;
pub const HOTSPOT_HEIGHT: u32 = 40;

/// 32-bit rolling hash: `hash = (hash << 5) - hash + unit`, wrapping each step.
///
/// Iterates over UTF-16 code units so results match `String.charCodeAt`.
pub fn string_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Derives a deterministic hotspot for `country_name` on a map of the given size.
///
/// # Errors
///
/// Returns `CodeMapperError::InvalidLayoutBounds` if either dimension is 100
/// or less, since the margins would leave no room to place the region.
pub fn layout_for(
    country_name: &str,
    map_width: u32,
    map_height: u32,
) -> Result<HotspotRegion, CodeMapperError> {
    validate_bounds(map_width, map_height)?;

    let hash = i64::from(string_hash(country_name));
    let span_x = i64::from(map_width) - 2 * EDGE_MARGIN;
    let span_y = i64::from(map_height) - 2 * EDGE_MARGIN;

    // `%` truncates toward zero and `>>` is arithmetic on signed ints; both
    // are part of the observable coordinates.
    let x = (hash % span_x).abs() + EDGE_MARGIN;
    let y = ((hash >> 8) % span_y).abs() + EDGE_MARGIN;

    Ok(HotspotRegion {
        country_name: country_name.to_string(),
        // Both values lie in 50..map dimension, so they fit in u32.
        x: x as u32,
        y: y as u32,
        width: HOTSPOT_WIDTH,
        height: HOTSPOT_HEIGHT,
    })
}

/// Rejects map sizes that leave no room for generated hotspots.
pub fn validate_bounds(map_width: u32, map_height: u32) -> Result<(), CodeMapperError> {
    if map_width <= 100 || map_height <= 100 {
        return Err(CodeMapperError::InvalidLayoutBounds {
            width: map_width,
            height: map_height,
        });
    }
    Ok(())
}

/// Uses the explicit region when the data source supplied one.
pub fn region_for(
    country_name: &str,
    explicit: Option<&HotspotRegion>,
    map_width: u32,
    map_height: u32,
) -> Result<HotspotRegion, CodeMapperError> {
    match explicit {
        Some(region) => Ok(region.clone()),
        None => layout_for(country_name, map_width, map_height),
    }
}

/// Hand-placed regions for an 800x600 map, used when no country list is
/// available from the cache directory.
pub fn fallback_regions() -> Vec<HotspotRegion> {
    const TABLE: [(&str, u32, u32, u32, u32); 10] = [
        ("Algeria", 445, 180, 50, 40),
        ("USA", 180, 150, 100, 70),
        ("India", 620, 200, 60, 50),
        ("Brazil", 300, 250, 70, 60),
        ("Japan", 730, 170, 40, 30),
        ("Germany", 460, 130, 30, 20),
        ("UK", 430, 120, 20, 15),
        ("China", 670, 170, 70, 50),
        ("Canada", 200, 100, 100, 50),
        ("Australia", 730, 300, 60, 50),
    ];

    TABLE
        .iter()
        .map(|&(name, x, y, width, height)| HotspotRegion {
            country_name: name.to_string(),
            x,
            y,
            width,
            height,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod string_hash_tests {
        use super::*;

        #[test]
        fn test_empty_string() {
            assert_eq!(string_hash(""), 0);
        }

        #[test]
        fn test_known_values() {
            assert_eq!(string_hash("USA"), 84_323);
            assert_eq!(string_hash("France"), 2_112_320_571);
        }

        #[test]
        fn test_wraps_to_negative() {
            assert_eq!(string_hash("United States"), -2_032_517_217);
        }
    }

    mod layout_for_tests {
        use super::*;

        #[test]
        fn test_usa_conformance_value() {
            let region = layout_for("USA", 1000, 800).unwrap();
            assert_eq!(
                region,
                HotspotRegion {
                    country_name: "USA".into(),
                    x: 673,
                    y: 379,
                    width: 50,
                    height: 40,
                }
            );
        }

        #[test]
        fn test_france_is_deterministic() {
            let first = layout_for("France", 800, 600).unwrap();
            let second = layout_for("France", 800, 600).unwrap();
            assert_eq!(first, second);
            assert_eq!((first.x, first.y), (621, 302));
        }

        #[test]
        fn test_negative_hash_uses_absolute_remainder() {
            let region = layout_for("United States", 1200, 700).unwrap();
            assert_eq!((region.x, region.y), (1067, 371));
        }

        #[test]
        fn test_region_stays_inside_margins() {
            for name in ["Chad", "Algeria", "Papua New Guinea", "Côte d'Ivoire", "日本"] {
                let region = layout_for(name, 300, 200).unwrap();
                assert!((50..250).contains(&region.x), "{name}: x={}", region.x);
                assert!((50..150).contains(&region.y), "{name}: y={}", region.y);
            }
        }

        #[test]
        fn test_narrow_map_rejected() {
            assert!(matches!(
                layout_for("Chad", 100, 600),
                Err(CodeMapperError::InvalidLayoutBounds {
                    width: 100,
                    height: 600
                })
            ));
        }

        #[test]
        fn test_short_map_rejected() {
            assert!(layout_for("Chad", 800, 42).is_err());
            assert!(layout_for("Chad", 101, 101).is_ok());
        }
    }

    #[test]
    fn test_explicit_region_wins() {
        let explicit = HotspotRegion {
            country_name: "USA".into(),
            x: 1,
            y: 2,
            width: 3,
            height: 4,
        };
        assert_eq!(region_for("USA", Some(&explicit), 800, 600).unwrap(), explicit);
        assert_eq!(
            region_for("USA", None, 1000, 800).unwrap(),
            layout_for("USA", 1000, 800).unwrap()
        );
    }

    #[test]
    fn test_fallback_table() {
        let regions = fallback_regions();
        assert_eq!(regions.len(), 10);
        assert_eq!(regions[0].country_name, "Algeria");
    }
}

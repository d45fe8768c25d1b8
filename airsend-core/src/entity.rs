//! Hub entity identifier derivation.

/// Vendor type code for roller-shutter (cover) devices.
pub const COVER_DEVICE_TYPE: i64 = 4099;

/// Derive the hub entity identifier for a device.
///
/// The device name is lowercased, every character outside `[a-z0-9_]` is
/// replaced with `_`, and consecutive underscores collapse to one. Covers
/// (type 4099, also the default when no type is configured) live in the
/// `cover` domain, everything else in `switch`.
pub fn entity_id(name: &str, device_type: Option<i64>) -> String {
    let domain = if device_type.unwrap_or(COVER_DEVICE_TYPE) == COVER_DEVICE_TYPE {
        "cover"
    } else {
        "switch"
    };
    format!("{domain}.airsend_{}", slugify(name))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            c
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        slug.push(mapped);
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_derivation() {
        assert_eq!(
            entity_id("Living Room!!", Some(COVER_DEVICE_TYPE)),
            "cover.airsend_living_room_"
        );
    }

    #[test]
    fn test_switch_derivation() {
        assert_eq!(entity_id("Garage Light", Some(1)), "switch.airsend_garage_light");
    }

    #[test]
    fn test_missing_type_defaults_to_cover() {
        assert_eq!(entity_id("gate", None), "cover.airsend_gate");
    }

    #[test]
    fn test_underscore_runs_collapse() {
        assert_eq!(entity_id("a  -  b", Some(1)), "switch.airsend_a_b");
        assert_eq!(entity_id("a__b", Some(1)), "switch.airsend_a_b");
        assert_eq!(entity_id("Mötorized", Some(1)), "switch.airsend_m_torized");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let first = entity_id("Living Room!!", Some(COVER_DEVICE_TYPE));
        let slug = first.trim_start_matches("cover.airsend_");
        assert_eq!(slug, slugify(slug));
    }
}

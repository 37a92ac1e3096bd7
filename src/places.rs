use crate::domain::ResolvedPlace;
use crate::error::{ImportError, LookupKind};
use crate::http::Transport;
use crate::inat::{InatApi, PlaceRecord};

const ADMIN_LEVEL_COUNTRY: i64 = 0;
const ADMIN_LEVEL_STATE: i64 = 10;
const ADMIN_LEVEL_COUNTY: i64 = 20;

pub fn resolve_places<T: Transport>(
    api: &InatApi<T>,
    place_ids: &[u64],
    observation_id: u64,
) -> Result<ResolvedPlace, ImportError> {
    let places = api.fetch_places(place_ids)?;
    if places.is_empty() {
        return Err(ImportError::LookupNotFound {
            kind: LookupKind::Location,
            observation_id,
        });
    }
    Ok(reduce_places(&places))
}

pub fn reduce_places(places: &[PlaceRecord]) -> ResolvedPlace {
    let mut resolved = ResolvedPlace::default();
    for place in places {
        match place.admin_level {
            Some(ADMIN_LEVEL_COUNTRY) => resolved.country = place.name.clone(),
            Some(ADMIN_LEVEL_STATE) => resolved.state = place.name.clone(),
            Some(ADMIN_LEVEL_COUNTY) => {
                resolved.county = county_name(place.name.as_deref(), place.display_name.as_deref())
            }
            _ => {}
        }
    }
    resolved
}

/// US county short names drop the "County"/"Parish" suffix; the display name
/// keeps it before the first comma.
pub fn county_name(name: Option<&str>, display_name: Option<&str>) -> Option<String> {
    let Some(display_name) = display_name.filter(|value| value.contains(", US")) else {
        return name.map(str::to_string);
    };
    match display_name.split(',').next() {
        Some(prefix) if !prefix.is_empty() => Some(prefix.to_string()),
        _ => name.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(level: i64, name: &str, display_name: &str) -> PlaceRecord {
        PlaceRecord {
            admin_level: Some(level),
            name: Some(name.to_string()),
            display_name: Some(display_name.to_string()),
        }
    }

    #[test]
    fn us_county_takes_display_prefix() {
        assert_eq!(
            county_name(Some("Some"), Some("Some County, US")).as_deref(),
            Some("Some County")
        );
    }

    #[test]
    fn non_us_county_keeps_short_name() {
        assert_eq!(
            county_name(Some("Kent"), Some("Kent, GB")).as_deref(),
            Some("Kent")
        );
    }

    #[test]
    fn empty_display_prefix_falls_back_to_name() {
        assert_eq!(
            county_name(Some("Orleans"), Some(", US")).as_deref(),
            Some("Orleans")
        );
    }

    #[test]
    fn levels_map_to_triple() {
        let resolved = reduce_places(&[
            place(0, "United States", "United States"),
            place(10, "Louisiana", "Louisiana, US"),
            place(20, "Orleans", "Orleans Parish, LA, US"),
            PlaceRecord {
                admin_level: None,
                name: Some("Open space".to_string()),
                display_name: None,
            },
        ]);
        assert_eq!(resolved.country.as_deref(), Some("United States"));
        assert_eq!(resolved.state.as_deref(), Some("Louisiana"));
        assert_eq!(resolved.county.as_deref(), Some("Orleans Parish"));
    }
}

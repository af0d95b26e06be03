use crate::constants::GEOCODE_TIMEOUT;
use crate::core::geo::{LatLng, LatLngBounds};
use crate::tiles::loader::HTTP_CLIENT;
use crate::{MapError, Result};
use crossbeam_channel::Receiver;
use serde::Deserialize;
use std::sync::Arc;

/// A forward (name to coordinate) or reverse (coordinate to name)
/// lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    Forward(String),
    Reverse(LatLng),
}

impl From<&str> for GeocodeQuery {
    fn from(query: &str) -> Self {
        Self::Forward(query.to_string())
    }
}

impl From<String> for GeocodeQuery {
    fn from(query: String) -> Self {
        Self::Forward(query)
    }
}

impl From<LatLng> for GeocodeQuery {
    fn from(position: LatLng) -> Self {
        Self::Reverse(position)
    }
}

/// One match for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub display_name: String,
    pub position: LatLng,
    pub bounds: Option<LatLngBounds>,
}

/// Place lookup. Implementations may block; use `geocode_async` to
/// keep the render loop responsive.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>>;
}

/// The OpenStreetMap Nominatim service. Forward queries go to
/// `<base>/search`, reverse queries to `<base>/reverse`.
pub struct NominatimGeocoder {
    base_url: String,
}

#[derive(Deserialize)]
struct NominatimEntry {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    boundingbox: Option<[String; 4]>,
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::with_base_url("https://nominatim.openstreetmap.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn parse_entry(entry: NominatimEntry) -> Result<GeocodeResult> {
        let lat: f64 = entry
            .lat
            .parse()
            .map_err(|_| MapError::Geocode(format!("bad latitude {:?}", entry.lat)))?;
        let lon: f64 = entry
            .lon
            .parse()
            .map_err(|_| MapError::Geocode(format!("bad longitude {:?}", entry.lon)))?;

        // Nominatim order is south, north, west, east
        let bounds = match entry.boundingbox {
            Some([s, n, w, e]) => {
                let parse = |v: &str| {
                    v.parse::<f64>()
                        .map_err(|_| MapError::Geocode(format!("bad bounding box value {v:?}")))
                };
                Some(LatLngBounds::new(
                    LatLng::new(parse(&s)?, parse(&w)?),
                    LatLng::new(parse(&n)?, parse(&e)?),
                ))
            }
            None => None,
        };

        Ok(GeocodeResult {
            display_name: entry.display_name,
            position: LatLng::new(lat, lon),
            bounds,
        })
    }

    fn search(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let entries: Vec<NominatimEntry> = HTTP_CLIENT
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json")])
            .timeout(GEOCODE_TIMEOUT)
            .send()?
            .error_for_status()?
            .json()?;

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(Self::parse_entry(entry)?);
        }
        Ok(results)
    }

    fn reverse(&self, position: &LatLng) -> Result<Vec<GeocodeResult>> {
        // The reverse endpoint answers with a single object, not an array.
        let entry: NominatimEntry = HTTP_CLIENT
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", position.lat.to_string().as_str()),
                ("lon", position.lng.to_string().as_str()),
                ("format", "json"),
            ])
            .timeout(GEOCODE_TIMEOUT)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(vec![Self::parse_entry(entry)?])
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>> {
        log::debug!("geocoding {:?}", query);
        let results = match query {
            GeocodeQuery::Forward(text) => self.search(text)?,
            GeocodeQuery::Reverse(position) => self.reverse(position)?,
        };
        log::info!("geocoded {:?}: {} result(s)", query, results.len());
        Ok(results)
    }
}

/// Run a query on a worker thread; the receiver yields exactly one
/// message when the lookup settles.
pub fn geocode_async(
    geocoder: Arc<dyn Geocoder>,
    query: impl Into<GeocodeQuery>,
) -> Receiver<Result<Vec<GeocodeResult>>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let query = query.into();
    std::thread::spawn(move || {
        let result = geocoder.geocode(&query);
        if tx.send(result).is_err() {
            log::debug!("geocode receiver dropped before {:?} settled", query);
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(lat: &str, lon: &str, boundingbox: Option<[&str; 4]>) -> NominatimEntry {
        NominatimEntry {
            display_name: "Somewhere".to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
            boundingbox: boundingbox.map(|b| b.map(str::to_string)),
        }
    }

    #[test]
    fn test_parse_entry_with_bounds() {
        let result = NominatimGeocoder::parse_entry(entry(
            "51.5073",
            "-0.1276",
            Some(["51.28", "51.69", "-0.51", "0.33"]),
        ))
        .unwrap();

        assert_eq!(result.position, LatLng::new(51.5073, -0.1276));
        let bounds = result.bounds.unwrap();
        assert_eq!(bounds.south_west, LatLng::new(51.28, -0.51));
        assert_eq!(bounds.north_east, LatLng::new(51.69, 0.33));
    }

    #[test]
    fn test_parse_entry_without_bounds() {
        let result = NominatimGeocoder::parse_entry(entry("40.7", "-74.0", None)).unwrap();
        assert_eq!(result.bounds, None);
    }

    #[test]
    fn test_parse_entry_rejects_garbage() {
        assert!(NominatimGeocoder::parse_entry(entry("north-ish", "-74.0", None)).is_err());
        assert!(
            NominatimGeocoder::parse_entry(entry("40.7", "-74.0", Some(["a", "b", "c", "d"])))
                .is_err()
        );
    }

    #[test]
    fn test_search_response_shape_deserializes() {
        let body = r#"[{
            "display_name": "Paris, Ile-de-France, France",
            "lat": "48.8566",
            "lon": "2.3522",
            "boundingbox": ["48.815", "48.902", "2.224", "2.469"]
        }]"#;
        let entries: Vec<NominatimEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries.len(), 1);
        let result = NominatimGeocoder::parse_entry(entries.into_iter().next().unwrap()).unwrap();
        assert_eq!(result.display_name, "Paris, Ile-de-France, France");
        assert!((result.position.lat - 48.8566).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_response_shape_deserializes() {
        let body = r#"{
            "display_name": "10 Downing Street, London, England",
            "lat": "51.5034",
            "lon": "-0.1276"
        }"#;
        let entry: NominatimEntry = serde_json::from_str(body).unwrap();
        let result = NominatimGeocoder::parse_entry(entry).unwrap();
        assert_eq!(result.display_name, "10 Downing Street, London, England");
        assert_eq!(result.bounds, None);
    }

    #[test]
    fn test_query_conversions() {
        assert_eq!(
            GeocodeQuery::from("Paris"),
            GeocodeQuery::Forward("Paris".to_string())
        );
        assert_eq!(
            GeocodeQuery::from(LatLng::new(1.0, 2.0)),
            GeocodeQuery::Reverse(LatLng::new(1.0, 2.0))
        );
    }

    struct CannedGeocoder;

    impl Geocoder for CannedGeocoder {
        fn geocode(&self, _query: &GeocodeQuery) -> Result<Vec<GeocodeResult>> {
            Ok(vec![GeocodeResult {
                display_name: "Canned".to_string(),
                position: LatLng::new(1.0, 2.0),
                bounds: None,
            }])
        }
    }

    #[test]
    fn test_geocode_async_delivers_one_message() {
        let rx = geocode_async(Arc::new(CannedGeocoder), "anywhere");
        let results = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "Canned");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}

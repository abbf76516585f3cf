use serde::Serialize;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Airport {
    pub code: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub state: Option<&'static str>,
    pub country: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    /// Great-circle (haversine) distance to a coordinate, in kilometres.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), latitude.to_radians());
        let d_lat = (latitude - self.latitude).to_radians();
        let d_lon = (longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    fn matches(&self, needle: &str) -> bool {
        self.code.to_lowercase().contains(needle)
            || self.city.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
    }
}

/// Read-only lookup over the compiled-in airport table.
#[derive(Debug, Clone, Copy)]
pub struct AirportDirectory {
    airports: &'static [Airport],
}

impl AirportDirectory {
    pub fn new() -> Self {
        Self { airports: AIRPORTS }
    }

    pub fn all(&self) -> &'static [Airport] {
        self.airports
    }

    pub fn find_by_code(&self, code: &str) -> Option<&'static Airport> {
        let code = code.trim();
        self.airports.iter().find(|a| a.code.eq_ignore_ascii_case(code))
    }

    /// Case-insensitive substring match over code, city and name.
    /// An exact code hit is always ranked first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&'static Airport> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.airports.iter().take(limit).collect();
        }

        let mut hits: Vec<&'static Airport> = self.airports.iter().filter(|a| a.matches(&needle)).collect();
        hits.sort_by_key(|a| !a.code.eq_ignore_ascii_case(&needle));
        hits.truncate(limit);
        hits
    }

    /// Airports ordered by distance from the given point, closest first.
    pub fn nearest(&self, latitude: f64, longitude: f64, limit: usize) -> Vec<(&'static Airport, f64)> {
        let mut ranked: Vec<(&'static Airport, f64)> = self
            .airports
            .iter()
            .map(|a| (a, a.distance_km(latitude, longitude)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(limit);
        ranked
    }
}

impl Default for AirportDirectory {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! airport {
    ($code:literal, $name:literal, $city:literal, $state:expr, $country:literal, $lat:literal, $lon:literal) => {
        Airport {
            code: $code,
            name: $name,
            city: $city,
            state: $state,
            country: $country,
            latitude: $lat,
            longitude: $lon,
        }
    };
}

pub static AIRPORTS: &[Airport] = &[
    airport!("ATL", "Hartsfield-Jackson Atlanta International Airport", "Atlanta", Some("GA"), "US", 33.6407, -84.4277),
    airport!("LAX", "Los Angeles International Airport", "Los Angeles", Some("CA"), "US", 33.9416, -118.4085),
    airport!("ORD", "O'Hare International Airport", "Chicago", Some("IL"), "US", 41.9742, -87.9073),
    airport!("DFW", "Dallas/Fort Worth International Airport", "Dallas", Some("TX"), "US", 32.8998, -97.0403),
    airport!("DEN", "Denver International Airport", "Denver", Some("CO"), "US", 39.8561, -104.6737),
    airport!("JFK", "John F. Kennedy International Airport", "New York", Some("NY"), "US", 40.6413, -73.7781),
    airport!("LGA", "LaGuardia Airport", "New York", Some("NY"), "US", 40.7769, -73.8740),
    airport!("EWR", "Newark Liberty International Airport", "Newark", Some("NJ"), "US", 40.6895, -74.1745),
    airport!("SFO", "San Francisco International Airport", "San Francisco", Some("CA"), "US", 37.6213, -122.3790),
    airport!("SEA", "Seattle-Tacoma International Airport", "Seattle", Some("WA"), "US", 47.4502, -122.3088),
    airport!("LAS", "Harry Reid International Airport", "Las Vegas", Some("NV"), "US", 36.0840, -115.1537),
    airport!("MCO", "Orlando International Airport", "Orlando", Some("FL"), "US", 28.4312, -81.3081),
    airport!("MIA", "Miami International Airport", "Miami", Some("FL"), "US", 25.7959, -80.2870),
    airport!("BOS", "Logan International Airport", "Boston", Some("MA"), "US", 42.3656, -71.0096),
    airport!("PHX", "Phoenix Sky Harbor International Airport", "Phoenix", Some("AZ"), "US", 33.4342, -112.0116),
    airport!("IAH", "George Bush Intercontinental Airport", "Houston", Some("TX"), "US", 29.9902, -95.3368),
    airport!("MSP", "Minneapolis-Saint Paul International Airport", "Minneapolis", Some("MN"), "US", 44.8848, -93.2223),
    airport!("DTW", "Detroit Metropolitan Wayne County Airport", "Detroit", Some("MI"), "US", 42.2162, -83.3554),
    airport!("PHL", "Philadelphia International Airport", "Philadelphia", Some("PA"), "US", 39.8744, -75.2424),
    airport!("CLT", "Charlotte Douglas International Airport", "Charlotte", Some("NC"), "US", 35.2144, -80.9473),
    airport!("SAN", "San Diego International Airport", "San Diego", Some("CA"), "US", 32.7338, -117.1933),
    airport!("HNL", "Daniel K. Inouye International Airport", "Honolulu", Some("HI"), "US", 21.3187, -157.9225),
    airport!("YYZ", "Toronto Pearson International Airport", "Toronto", Some("ON"), "CA", 43.6777, -79.6248),
    airport!("YVR", "Vancouver International Airport", "Vancouver", Some("BC"), "CA", 49.1967, -123.1815),
    airport!("MEX", "Mexico City International Airport", "Mexico City", None, "MX", 19.4361, -99.0719),
    airport!("CUN", "Cancun International Airport", "Cancun", None, "MX", 21.0365, -86.8771),
    airport!("LHR", "Heathrow Airport", "London", None, "GB", 51.4700, -0.4543),
    airport!("LGW", "Gatwick Airport", "London", None, "GB", 51.1537, -0.1821),
    airport!("CDG", "Charles de Gaulle Airport", "Paris", None, "FR", 49.0097, 2.5479),
    airport!("AMS", "Amsterdam Airport Schiphol", "Amsterdam", None, "NL", 52.3105, 4.7683),
    airport!("FRA", "Frankfurt Airport", "Frankfurt", None, "DE", 50.0379, 8.5622),
    airport!("MAD", "Adolfo Suarez Madrid-Barajas Airport", "Madrid", None, "ES", 40.4983, -3.5676),
    airport!("BCN", "Josep Tarradellas Barcelona-El Prat Airport", "Barcelona", None, "ES", 41.2974, 2.0833),
    airport!("FCO", "Leonardo da Vinci-Fiumicino Airport", "Rome", None, "IT", 41.8003, 12.2389),
    airport!("DXB", "Dubai International Airport", "Dubai", None, "AE", 25.2532, 55.3657),
    airport!("DOH", "Hamad International Airport", "Doha", None, "QA", 25.2731, 51.6081),
    airport!("SIN", "Singapore Changi Airport", "Singapore", None, "SG", 1.3644, 103.9915),
    airport!("HND", "Tokyo Haneda Airport", "Tokyo", None, "JP", 35.5494, 139.7798),
    airport!("NRT", "Narita International Airport", "Tokyo", None, "JP", 35.7720, 140.3929),
    airport!("ICN", "Incheon International Airport", "Seoul", None, "KR", 37.4602, 126.4407),
    airport!("HKG", "Hong Kong International Airport", "Hong Kong", None, "HK", 22.3080, 113.9185),
    airport!("SYD", "Sydney Kingsford Smith Airport", "Sydney", Some("NSW"), "AU", -33.9399, 151.1753),
    airport!("GRU", "Sao Paulo/Guarulhos International Airport", "Sao Paulo", None, "BR", -23.4356, -46.4731),
    airport!("JNB", "O. R. Tambo International Airport", "Johannesburg", None, "ZA", -26.1367, 28.2411),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_code_is_case_insensitive() {
        let dir = AirportDirectory::new();
        let jfk = dir.find_by_code(" jfk ").expect("JFK should exist");
        assert_eq!(jfk.city, "New York");
        assert!(dir.find_by_code("ZZZ").is_none());
    }

    #[test]
    fn test_search_ranks_exact_code_first() {
        let dir = AirportDirectory::new();
        // "lax" matches LAX by code; nothing else contains it
        let hits = dir.search("lax", 5);
        assert_eq!(hits[0].code, "LAX");

        let london = dir.search("London", 10);
        let codes: Vec<&str> = london.iter().map(|a| a.code).collect();
        assert_eq!(codes, vec!["LHR", "LGW"]);
    }

    #[test]
    fn test_search_respects_limit() {
        let dir = AirportDirectory::new();
        assert_eq!(dir.search("international", 3).len(), 3);
        assert_eq!(dir.search("", 4).len(), 4);
    }

    #[test]
    fn test_nearest_airport() {
        let dir = AirportDirectory::new();
        // Times Square
        let nearest = dir.nearest(40.7580, -73.9855, 3);
        let codes: Vec<&str> = nearest.iter().map(|(a, _)| a.code).collect();
        assert_eq!(codes[0], "LGA");
        assert!(codes.contains(&"JFK"));
        assert!(nearest.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_distance_lhr_jfk() {
        let dir = AirportDirectory::new();
        let lhr = dir.find_by_code("LHR").unwrap();
        let jfk = dir.find_by_code("JFK").unwrap();
        let km = lhr.distance_km(jfk.latitude, jfk.longitude);
        assert!((km - 5550.0).abs() < 60.0, "got {km}");
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, Value};

use crate::data::spatial::FeatureGrid;
use crate::error::GeometryLoadError;

/// GeoJSON feature property holding the sub-region identifier
pub const KEY_PROPERTY: &str = "subregion";

/// Grid cell size in degrees for hit-testing
const GRID_CELL_DEGREES: f64 = 10.0;

/// A closed ring of (lon, lat) positions
pub type Ring = Vec<(f64, f64)>;

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    fn empty() -> Self {
        Self::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN)
    }

    fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    fn union(&mut self, other: &BBox) {
        self.extend(other.min_lon, other.min_lat);
        self.extend(other.max_lon, other.max_lat);
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// One polygon: the exterior ring first, then any holes
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    /// Even-odd test across all rings, so holes are excluded
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;
        for ring in self.rings.iter().filter(|r| !r.is_empty()) {
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }

    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for &(lon, lat) in self.exterior().into_iter().flatten() {
            bbox.extend(lon, lat);
        }
        bbox
    }
}

/// Boundary of one sub-region
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub subregion: String,
    pub polygons: Vec<Polygon>,
    pub bbox: BBox,
}

impl Region {
    pub fn new(subregion: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let mut bbox = BBox::empty();
        for polygon in &polygons {
            bbox.union(&polygon.bbox());
        }
        Self {
            subregion: subregion.into(),
            polygons,
            bbox,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox.contains(lon, lat) && self.polygons.iter().any(|p| p.contains(lon, lat))
    }

    /// Polygon with the widest exterior extent, used to anchor labels
    pub fn largest_polygon(&self) -> Option<&Polygon> {
        self.polygons.iter().max_by(|a, b| {
            let area = |p: &Polygon| {
                let b = p.bbox();
                (b.max_lon - b.min_lon) * (b.max_lat - b.min_lat)
            };
            area(a).total_cmp(&area(b))
        })
    }
}

/// Immutable sub-region boundaries keyed by sub-region id
pub struct GeometryStore {
    /// Sorted by key
    regions: Vec<Region>,
    keys: BTreeMap<String, usize>,
    grid: FeatureGrid,
}

impl GeometryStore {
    /// Build from regions; a repeated key is an error
    pub fn from_regions(regions: Vec<Region>) -> Result<Self, GeometryLoadError> {
        let mut by_key = BTreeMap::new();
        for region in regions {
            if by_key.contains_key(&region.subregion) {
                return Err(GeometryLoadError::DuplicateKey(region.subregion));
            }
            by_key.insert(region.subregion.clone(), region);
        }

        let regions: Vec<Region> = by_key.into_values().collect();
        let keys = regions
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.subregion.clone(), idx))
            .collect();
        let grid = FeatureGrid::build(regions.iter().map(|r| &r.bbox), GRID_CELL_DEGREES);

        Ok(Self {
            regions,
            keys,
            grid,
        })
    }

    /// Load sub-region boundaries from a GeoJSON file
    pub fn load(path: &Path) -> Result<Self, GeometryLoadError> {
        let content = fs::read_to_string(path).map_err(|source| GeometryLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_geojson_str(&content)?;
        tracing::info!(
            path = %path.display(),
            regions = store.len(),
            "loaded sub-region boundaries"
        );
        Ok(store)
    }

    /// Parse a FeatureCollection whose features carry a `subregion` property
    pub fn from_geojson_str(content: &str) -> Result<Self, GeometryLoadError> {
        let geojson: GeoJson = content.parse()?;
        let GeoJson::FeatureCollection(fc) = geojson else {
            return Err(GeometryLoadError::NotFeatureCollection);
        };

        let regions = fc
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| region_from_feature(index, feature))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_regions(regions)
    }

    pub fn lookup(&self, subregion: &str) -> Option<&Region> {
        self.keys.get(subregion).map(|&idx| &self.regions[idx])
    }

    /// Region under a geographic point, if any
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&Region> {
        self.grid
            .query_point(lon, lat)
            .iter()
            .map(|&idx| &self.regions[idx])
            .find(|region| region.contains(lon, lat))
    }

    /// Regions in key order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Extent of all regions, `None` when the store is empty
    pub fn bounds(&self) -> Option<BBox> {
        let mut regions = self.regions.iter();
        let mut bbox = regions.next()?.bbox;
        for region in regions {
            bbox.union(&region.bbox);
        }
        Some(bbox)
    }
}

fn region_from_feature(index: usize, feature: &Feature) -> Result<Region, GeometryLoadError> {
    let subregion = feature
        .properties
        .as_ref()
        .and_then(|p| p.get(KEY_PROPERTY))
        .and_then(|v| v.as_str())
        .ok_or(GeometryLoadError::MissingKey { index })?
        .to_string();

    let Some(geometry) = feature.geometry.as_ref() else {
        return Err(GeometryLoadError::MissingGeometry { subregion });
    };

    let polygons = match &geometry.value {
        Value::Polygon(rings) => vec![convert_polygon(&subregion, rings)?],
        Value::MultiPolygon(polygons) if polygons.is_empty() => {
            return Err(GeometryLoadError::MalformedRing {
                subregion,
                reason: "multipolygon has no polygons",
            })
        }
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| convert_polygon(&subregion, rings))
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(GeometryLoadError::UnsupportedGeometry {
                subregion,
                kind: geometry_kind(other),
            })
        }
    };

    Ok(Region::new(subregion, polygons))
}

fn convert_polygon(subregion: &str, rings: &[Vec<Vec<f64>>]) -> Result<Polygon, GeometryLoadError> {
    let malformed = |reason| GeometryLoadError::MalformedRing {
        subregion: subregion.to_string(),
        reason,
    };

    if rings.is_empty() {
        return Err(malformed("polygon has no rings"));
    }

    let mut converted = Vec::with_capacity(rings.len());
    for ring in rings {
        if ring.len() < 4 {
            return Err(malformed("ring has fewer than four positions"));
        }
        let mut line = Vec::with_capacity(ring.len());
        for position in ring {
            match position.as_slice() {
                [lon, lat, ..] if !lon.is_finite() || !lat.is_finite() => {
                    return Err(malformed("position is not finite"))
                }
                [lon, lat, ..] if lon.abs() > 180.0 || lat.abs() > 90.0 => {
                    return Err(malformed("position out of range"))
                }
                [lon, lat, ..] => line.push((*lon, *lat)),
                _ => return Err(malformed("position has fewer than two coordinates")),
            }
        }
        converted.push(line);
    }

    Ok(Polygon { rings: converted })
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        _ => "GeometryCollection",
    }
}

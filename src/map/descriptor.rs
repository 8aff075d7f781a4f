use crate::data::{GeometryStore, Region};
use crate::error::UnresolvedRegionWarning;
use crate::query::Aggregation;

/// Number of colour classes a value range is split into
pub const CLASS_COUNT: usize = 5;

/// Colour ramp identifier. The palette itself belongs to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorScale {
    Reds,
    Purples,
}

impl ColorScale {
    pub fn name(&self) -> &'static str {
        match self {
            ColorScale::Reds => "reds",
            ColorScale::Purples => "purples",
        }
    }
}

/// Bounds of the values on the map, used to normalize colours
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Position of `value` within the range, clamped to [0, 1].
    /// A degenerate range maps everything to the top of the scale.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Colour class in `0..CLASS_COUNT`
    pub fn class_of(&self, value: f64) -> usize {
        let t = self.normalize(value);
        ((t * CLASS_COUNT as f64) as usize).min(CLASS_COUNT - 1)
    }

    /// Lower value bound of a colour class
    pub fn class_floor(&self, class: usize) -> f64 {
        self.min + (self.max - self.min) * class as f64 / CLASS_COUNT as f64
    }
}

/// One region to paint
#[derive(Clone, Debug)]
pub struct RenderedRegion<'a> {
    pub region: &'a Region,
    pub value: f64,
    pub label: String,
}

/// Everything needed to draw one choropleth
#[derive(Clone, Debug)]
pub struct RenderDescriptor<'a> {
    pub regions: Vec<RenderedRegion<'a>>,
    pub color_scale: ColorScale,
    /// `None` when nothing is drawn
    pub value_range: Option<ValueRange>,
    pub warnings: Vec<UnresolvedRegionWarning>,
}

impl<'a> RenderDescriptor<'a> {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, subregion: &str) -> Option<&RenderedRegion<'a>> {
        self.regions
            .iter()
            .find(|r| r.region.subregion == subregion)
    }
}

/// Join aggregated values to their boundaries.
/// Rows without a boundary are dropped and reported as warnings.
pub fn render<'a>(
    aggregation: &Aggregation,
    geometry: &'a GeometryStore,
    color_scale: ColorScale,
) -> RenderDescriptor<'a> {
    let mut regions = Vec::with_capacity(aggregation.len());
    let mut warnings = Vec::new();
    let mut value_range: Option<ValueRange> = None;

    for (subregion, value) in aggregation.iter() {
        let Some(region) = geometry.lookup(subregion) else {
            let warning = UnresolvedRegionWarning {
                subregion: subregion.to_string(),
                value,
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
            continue;
        };

        value_range = Some(match value_range {
            Some(range) => ValueRange {
                min: range.min.min(value),
                max: range.max.max(value),
            },
            None => ValueRange {
                min: value,
                max: value,
            },
        });

        regions.push(RenderedRegion {
            region,
            value,
            label: region.subregion.clone(),
        });
    }

    RenderDescriptor {
        regions,
        color_scale,
        value_range,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::tests::square_store;
    use crate::query::tests::record;
    use crate::query::{aggregate, DecadeRange, ImpactMetric, QueryParams, ScenarioFilter};

    fn droughts(min: i32, max: i32) -> QueryParams {
        QueryParams {
            decades: DecadeRange::new(min, max).unwrap(),
            disaster_type: "Droughts".to_string(),
            metric: ImpactMetric::Human,
            scenario: ScenarioFilter::Any,
        }
    }

    #[test]
    fn test_render_joins_values_to_regions() {
        let store = square_store(&[("A", 0.0, 0.0, 10.0), ("B", 20.0, 0.0, 10.0)]);
        let records = vec![
            record(1900, "A", "Droughts", 10.0),
            record(1910, "A", "Droughts", 5.0),
            record(1900, "B", "Droughts", 3.0),
        ];
        let agg = aggregate(&records, &droughts(1900, 1920));
        let desc = render(&agg, &store, ColorScale::Reds);

        assert_eq!(desc.regions.len(), 2);
        assert_eq!(desc.color_scale, ColorScale::Reds);
        assert_eq!(desc.value_range, Some(ValueRange { min: 3.0, max: 15.0 }));
        let a = desc.get("A").unwrap();
        assert_eq!(a.value, 15.0);
        assert_eq!(a.label, "A");
        assert_eq!(a.region.subregion, "A");
        assert!(desc.warnings.is_empty());
    }

    #[test]
    fn test_unresolved_region_is_excluded_not_fatal() {
        let store = square_store(&[("A", 0.0, 0.0, 10.0)]);
        let records = vec![
            record(1900, "A", "Droughts", 2.0),
            record(1900, "Atlantis", "Droughts", 99.0),
        ];
        let agg = aggregate(&records, &droughts(1900, 1900));
        let desc = render(&agg, &store, ColorScale::Purples);

        assert_eq!(desc.regions.len(), 1);
        assert!(desc.get("Atlantis").is_none());
        // The unresolved value must not stretch the colour range
        assert_eq!(desc.value_range, Some(ValueRange { min: 2.0, max: 2.0 }));
        assert_eq!(
            desc.warnings,
            vec![UnresolvedRegionWarning {
                subregion: "Atlantis".to_string(),
                value: 99.0
            }]
        );
    }

    #[test]
    fn test_empty_aggregation_has_no_range() {
        let store = square_store(&[("A", 0.0, 0.0, 10.0)]);
        let agg = aggregate(&[], &droughts(1900, 2100));
        let desc = render(&agg, &store, ColorScale::Reds);

        assert!(desc.is_empty());
        assert_eq!(desc.value_range, None);
        assert!(desc.warnings.is_empty());
    }

    #[test]
    fn test_value_classes() {
        let range = ValueRange { min: 0.0, max: 100.0 };
        assert_eq!(range.class_of(0.0), 0);
        assert_eq!(range.class_of(19.9), 0);
        assert_eq!(range.class_of(20.0), 1);
        assert_eq!(range.class_of(99.0), CLASS_COUNT - 1);
        assert_eq!(range.class_of(100.0), CLASS_COUNT - 1);
        assert_eq!(range.class_floor(2), 40.0);

        let flat = ValueRange { min: 7.0, max: 7.0 };
        assert_eq!(flat.normalize(7.0), 1.0);
        assert_eq!(flat.class_of(7.0), CLASS_COUNT - 1);
    }
}

use crate::braille::BrailleCanvas;
use crate::data::{GeometryStore, Polygon, Region};
use crate::map::descriptor::{RenderDescriptor, CLASS_COUNT};
use crate::map::geometry::{draw_ring, fill_rings};
use crate::map::projection::Viewport;

/// Labels are only placed once regions are large enough to hold them
const LABEL_MIN_ZOOM: f64 = 2.0;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_labels: true,
        }
    }
}

/// Rasterized choropleth, one canvas per colour class
pub struct MapLayers {
    /// Boundaries of every known sub-region, data or not
    pub outlines: BrailleCanvas,
    /// Fills, indexed by colour class
    pub classes: Vec<BrailleCanvas>,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Draws a render descriptor onto braille canvases
#[derive(Default)]
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize for a `width` x `height` character area.
    /// `viewport` must already be sized in braille pixels.
    pub fn render(
        &self,
        descriptor: &RenderDescriptor<'_>,
        geometry: &GeometryStore,
        width: usize,
        height: usize,
        viewport: &Viewport,
    ) -> MapLayers {
        let mut layers = MapLayers {
            outlines: BrailleCanvas::new(width, height),
            classes: (0..CLASS_COUNT)
                .map(|_| BrailleCanvas::new(width, height))
                .collect(),
            labels: Vec::new(),
        };

        if let Some(range) = descriptor.value_range {
            for rendered in &descriptor.regions {
                let canvas = &mut layers.classes[range.class_of(rendered.value)];
                for polygon in &rendered.region.polygons {
                    fill_polygon(canvas, polygon, viewport);
                }
            }
        }

        if self.settings.show_outlines {
            let max_jump = (viewport.width / 2).max(1) as i32;
            for region in geometry.iter().filter(|r| region_visible(r, viewport)) {
                for ring in region.polygons.iter().flat_map(|p| &p.rings) {
                    let projected: Vec<(i32, i32)> = ring
                        .iter()
                        .map(|&(lon, lat)| viewport.project(lon, lat))
                        .collect();
                    draw_ring(&mut layers.outlines, &projected, max_jump);
                }
            }
        }

        if self.settings.show_labels && viewport.zoom >= LABEL_MIN_ZOOM {
            for rendered in &descriptor.regions {
                if let Some(label) = label_position(rendered.region, viewport, width, height) {
                    layers.labels.push((label.0, label.1, rendered.label.clone()));
                }
            }
        }

        layers
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }
}

fn region_visible(region: &Region, viewport: &Viewport) -> bool {
    let b = &region.bbox;
    let (x0, y1) = viewport.project_f64(b.min_lon, b.min_lat);
    let (x1, y0) = viewport.project_f64(b.max_lon, b.max_lat);
    viewport.bbox_visible((x0, y0), (x1, y1))
}

fn fill_polygon(canvas: &mut BrailleCanvas, polygon: &Polygon, viewport: &Viewport) {
    let rings: Vec<Vec<(f64, f64)>> = polygon
        .rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|&(lon, lat)| viewport.project_f64(lon, lat))
                .collect()
        })
        .collect();

    let Some(exterior) = rings.first() else {
        return;
    };
    let (min, max) = exterior.iter().fold(
        ((f64::MAX, f64::MAX), (f64::MIN, f64::MIN)),
        |(min, max), &(x, y)| ((min.0.min(x), min.1.min(y)), (max.0.max(x), max.1.max(y))),
    );

    // A ring wider than half the world has wrapped across the antimeridian
    if max.0 - min.0 > viewport.zoom * viewport.width as f64 / 2.0 {
        return;
    }
    if viewport.bbox_visible(min, max) {
        fill_rings(canvas, &rings);
    }
}

/// Character cell at the centre of the region's largest polygon
fn label_position(
    region: &Region,
    viewport: &Viewport,
    width: usize,
    height: usize,
) -> Option<(u16, u16)> {
    let (lon, lat) = region.largest_polygon()?.bbox().center();
    let (px, py) = viewport.project(lon, lat);
    if px < 0 || py < 0 {
        return None;
    }
    let (cx, cy) = (px as usize / 2, py as usize / 4);
    (cx < width && cy < height).then_some((cx as u16, cy as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::tests::square_store;
    use crate::map::descriptor::{render, ColorScale};
    use crate::query::tests::record;
    use crate::query::{aggregate, DecadeRange, ImpactMetric, QueryParams, ScenarioFilter};

    fn floods() -> QueryParams {
        QueryParams {
            decades: DecadeRange::all(),
            disaster_type: "Floods".to_string(),
            metric: ImpactMetric::Human,
            scenario: ScenarioFilter::Any,
        }
    }

    #[test]
    fn test_regions_land_in_their_value_class() {
        let store = square_store(&[("Low", -60.0, -10.0, 20.0), ("High", 40.0, -10.0, 20.0)]);
        let records = vec![
            record(1900, "Low", "Floods", 1.0),
            record(1900, "High", "Floods", 100.0),
        ];
        let agg = aggregate(&records, &floods());
        let desc = render(&agg, &store, ColorScale::Reds);

        let viewport = Viewport::new(0.0, 0.0, 1.0, 160, 80);
        let layers = MapRenderer::new().render(&desc, &store, 80, 20, &viewport);

        assert!(!layers.classes[0].is_blank());
        assert!(!layers.classes[CLASS_COUNT - 1].is_blank());
        for class in &layers.classes[1..CLASS_COUNT - 1] {
            assert!(class.is_blank());
        }
        assert!(!layers.outlines.is_blank());
        // Below label zoom
        assert!(layers.labels.is_empty());
    }

    #[test]
    fn test_no_data_draws_outlines_only() {
        let store = square_store(&[("A", -20.0, -20.0, 40.0)]);
        let agg = aggregate(&[], &floods());
        let desc = render(&agg, &store, ColorScale::Purples);

        let viewport = Viewport::new(0.0, 0.0, 1.0, 80, 40);
        let layers = MapRenderer::new().render(&desc, &store, 40, 10, &viewport);

        assert!(layers.classes.iter().all(BrailleCanvas::is_blank));
        assert!(!layers.outlines.is_blank());
    }

    #[test]
    fn test_labels_at_region_centre() {
        let store = square_store(&[("A", -10.0, -10.0, 20.0)]);
        let agg = aggregate(&[record(1900, "A", "Floods", 3.0)], &floods());
        let desc = render(&agg, &store, ColorScale::Reds);

        let viewport = Viewport::new(0.0, 0.0, 2.0, 80, 40);
        let layers = MapRenderer::new().render(&desc, &store, 40, 10, &viewport);
        assert_eq!(layers.labels, vec![(20, 5, "A".to_string())]);

        let mut renderer = MapRenderer::new();
        renderer.toggle_labels();
        renderer.toggle_outlines();
        let layers = renderer.render(&desc, &store, 40, 10, &viewport);
        assert!(layers.labels.is_empty());
        assert!(layers.outlines.is_blank());
    }
}

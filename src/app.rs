use crate::data::{Dataset, GeometryStore, Region};
use crate::map::{render, ColorScale, MapRenderer, RenderDescriptor, Viewport};
use crate::query::{aggregate, DecadeRange, ImpactMetric, QueryParams, ScenarioFilter};

/// Disaster type selected at startup when the data has it
pub const DEFAULT_DISASTER: &str = "Droughts";

/// Descriptor and caption for one parameter set, always produced together
#[derive(Clone, Debug)]
pub struct View<'a> {
    pub descriptor: RenderDescriptor<'a>,
    pub caption: String,
    pub matched_records: usize,
}

pub fn caption(decades: &DecadeRange) -> String {
    format!(
        "Choropleth map of disaster damages from {} to {}",
        decades.min(),
        decades.max()
    )
}

/// Colour policy: human impact in reds, financial impact in purples
pub fn color_scale_for(metric: ImpactMetric) -> ColorScale {
    match metric {
        ImpactMetric::Human => ColorScale::Reds,
        ImpactMetric::Financial => ColorScale::Purples,
    }
}

/// One full aggregate-then-render cycle
pub fn compute_view<'a>(
    dataset: &Dataset,
    geometry: &'a GeometryStore,
    params: &QueryParams,
) -> View<'a> {
    let aggregation = aggregate(dataset.records(), params);
    let descriptor = render(&aggregation, geometry, color_scale_for(params.metric));
    View {
        descriptor,
        caption: caption(&params.decades),
        matched_records: aggregation.matched_records(),
    }
}

/// Initial parameters: the given choices, falling back to Droughts (or the
/// first observed type) over 1900-1920 for human impact
pub fn initial_params(
    dataset: &Dataset,
    decades: DecadeRange,
    disaster: Option<&str>,
    metric: ImpactMetric,
    scenario: ScenarioFilter,
) -> QueryParams {
    let types = dataset.disaster_types();
    let disaster_type = disaster
        .map(str::to_string)
        .or_else(|| types.iter().find(|t| *t == DEFAULT_DISASTER).cloned())
        .or_else(|| types.first().cloned())
        .unwrap_or_else(|| DEFAULT_DISASTER.to_string());

    QueryParams {
        decades,
        disaster_type,
        metric,
        scenario,
    }
}

/// The scenario code when it is pinned to one that no record carries
pub fn unknown_scenario(dataset: &Dataset, scenario: ScenarioFilter) -> Option<f64> {
    match scenario {
        ScenarioFilter::Only(code) if !dataset.scenarios().contains(&code) => Some(code),
        _ => None,
    }
}

/// Sub-regions named in the dataset with no boundary, sorted
pub fn unmapped_subregions<'d>(dataset: &'d Dataset, geometry: &GeometryStore) -> Vec<&'d str> {
    dataset
        .subregions()
        .into_iter()
        .filter(|s| geometry.lookup(s).is_none())
        .collect()
}

/// Application state: the borrowed stores, the active query and its view,
/// plus map navigation
pub struct App<'a> {
    dataset: &'a Dataset,
    geometry: &'a GeometryStore,
    params: QueryParams,
    view: View<'a>,
    /// Disaster selector entries, in first-seen order
    pub disaster_types: Vec<String>,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position in terminal cells
    pub mouse_pos: Option<(u16, u16)>,
    /// Map area origin in terminal cells, set by the UI each frame
    pub map_origin: (u16, u16),
    refreshes: u64,
}

impl<'a> App<'a> {
    pub fn new(
        dataset: &'a Dataset,
        geometry: &'a GeometryStore,
        params: QueryParams,
        width: usize,
        height: usize,
    ) -> Self {
        let view = compute_view(dataset, geometry, &params);
        Self {
            dataset,
            geometry,
            params,
            view,
            disaster_types: dataset.disaster_types(),
            viewport: Viewport::world(width * 2, height * 4),
            map_renderer: MapRenderer::new(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            map_origin: (0, 0),
            refreshes: 1,
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    pub fn geometry(&self) -> &'a GeometryStore {
        self.geometry
    }

    /// Number of aggregate-then-render cycles run so far
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Swap in new parameters; recompute only if they actually changed
    fn apply(&mut self, params: QueryParams) -> bool {
        if params == self.params {
            return false;
        }
        self.params = params;
        self.view = compute_view(self.dataset, self.geometry, &self.params);
        self.refreshes += 1;
        tracing::debug!(
            caption = %self.view.caption,
            disaster = %self.params.disaster_type,
            metric = self.params.metric.label(),
            regions = self.view.descriptor.regions.len(),
            "view refreshed"
        );
        true
    }

    pub fn set_decade_range(&mut self, decades: DecadeRange) -> bool {
        let params = QueryParams {
            decades,
            ..self.params.clone()
        };
        self.apply(params)
    }

    pub fn set_disaster_type(&mut self, disaster_type: &str) -> bool {
        let params = QueryParams {
            disaster_type: disaster_type.to_string(),
            ..self.params.clone()
        };
        self.apply(params)
    }

    pub fn set_metric(&mut self, metric: ImpactMetric) -> bool {
        let params = QueryParams {
            metric,
            ..self.params.clone()
        };
        self.apply(params)
    }

    pub fn toggle_metric(&mut self) -> bool {
        self.set_metric(self.params.metric.toggled())
    }

    /// Move the range start handle; ignored at the axis ends
    pub fn move_range_start(&mut self, steps: i32) -> bool {
        match self.params.decades.move_start(steps) {
            Some(range) => self.set_decade_range(range),
            None => false,
        }
    }

    pub fn move_range_end(&mut self, steps: i32) -> bool {
        match self.params.decades.move_end(steps) {
            Some(range) => self.set_decade_range(range),
            None => false,
        }
    }

    pub fn shift_range(&mut self, steps: i32) -> bool {
        match self.params.decades.shift(steps) {
            Some(range) => self.set_decade_range(range),
            None => false,
        }
    }

    /// Step through the disaster selector, wrapping around
    pub fn cycle_disaster(&mut self, forward: bool) -> bool {
        if self.disaster_types.is_empty() {
            return false;
        }
        let len = self.disaster_types.len();
        let next = match self.selected_disaster_index() {
            Some(idx) if forward => (idx + 1) % len,
            Some(idx) => (idx + len - 1) % len,
            None => 0,
        };
        let disaster = self.disaster_types[next].clone();
        self.set_disaster_type(&disaster)
    }

    pub fn selected_disaster_index(&self) -> Option<usize> {
        self.disaster_types
            .iter()
            .position(|t| *t == self.params.disaster_type)
    }

    /// Update viewport size when the map area changes (in characters)
    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.set_size(width * 2, height * 4);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom towards a terminal cell
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Pan by a mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Terminal cell to braille pixel, relative to the map area
    fn cell_to_pixel(&self, col: u16, row: u16) -> (i32, i32) {
        let px = col.saturating_sub(self.map_origin.0) as i32 * 2;
        let py = row.saturating_sub(self.map_origin.1) as i32 * 4;
        (px, py)
    }

    /// Region under the mouse and its value in the current view, if it has one
    pub fn hovered(&self) -> Option<(&'a Region, Option<f64>)> {
        let (col, row) = self.mouse_pos?;
        if col < self.map_origin.0 || row < self.map_origin.1 {
            return None;
        }
        let (px, py) = self.cell_to_pixel(col, row);
        if px >= self.viewport.width as i32 || py >= self.viewport.height as i32 {
            return None;
        }
        let (lon, lat) = self.viewport.unproject(px, py);
        let region = self.geometry.region_at(lon, lat)?;
        let value = self.view.descriptor.get(&region.subregion).map(|r| r.value);
        Some((region, value))
    }

    /// Zoom as text
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Map centre as text
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

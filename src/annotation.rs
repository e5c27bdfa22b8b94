// 📍 Station Annotations - compute, then apply
//
// The renderer resolves a station's references through an injected lookup,
// classifies its price and builds its style and callout. Nothing is pushed
// to a view here: front-ends receive finished annotations through
// `AnnotationPresenter`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::callout::{self, Callout};
use crate::cluster::{self, ClusterSummary};
use crate::context::ReferenceLookup;
use crate::entities::{Brand, FuelType, Station};
use crate::styles::{style_for, TierStyle};
use crate::tiers::{classify, PriceTier};

// ============================================================================
// ANNOTATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAnnotation {
    pub trading_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Tenths of a cent per litre
    pub price: Option<i64>,

    pub tier: PriceTier,
    pub style: TierStyle,
    pub callout: Callout,
}

impl StationAnnotation {
    pub fn new(station: &Station, price: Option<i64>, tier: PriceTier, callout: Callout) -> Self {
        StationAnnotation {
            trading_name: station.trading_name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            price,
            tier,
            style: style_for(tier),
            callout: callout.with_price(price),
        }
    }

    pub fn display_priority(&self) -> i32 {
        self.style.display_priority
    }
}

/// Receives computed annotations; the "apply" half of rendering
pub trait AnnotationPresenter {
    fn present(&mut self, annotation: &StationAnnotation);

    fn present_cluster(&mut self, _summary: &ClusterSummary, _members: &[StationAnnotation]) {}
}

/// Presenter that keeps everything it is given
#[derive(Debug, Default)]
pub struct CollectingPresenter {
    pub annotations: Vec<StationAnnotation>,
    pub clusters: Vec<ClusterSummary>,
}

impl AnnotationPresenter for CollectingPresenter {
    fn present(&mut self, annotation: &StationAnnotation) {
        self.annotations.push(annotation.clone());
    }

    fn present_cluster(&mut self, summary: &ClusterSummary, _members: &[StationAnnotation]) {
        self.clusters.push(summary.clone());
    }
}

// ============================================================================
// RENDERER
// ============================================================================

pub struct AnnotationRenderer<'a, L: ReferenceLookup> {
    lookup: &'a L,
    fuel_type: FuelType,
    use_discounts: bool,
}

impl<'a, L: ReferenceLookup> AnnotationRenderer<'a, L> {
    pub fn new(lookup: &'a L, fuel_type: FuelType) -> Self {
        AnnotationRenderer {
            lookup,
            fuel_type,
            use_discounts: true,
        }
    }

    /// When off, every brand's discount line reads "Not active"
    pub fn with_discounts(mut self, use_discounts: bool) -> Self {
        self.use_discounts = use_discounts;
        self
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    /// Annotation for one station by trading name
    pub fn render(&self, trading_name: &str, date: NaiveDate) -> Option<StationAnnotation> {
        self.lookup
            .station(trading_name)
            .map(|station| self.render_station(station, date))
    }

    pub fn render_station(&self, station: &Station, date: NaiveDate) -> StationAnnotation {
        let relations = self.lookup.relations(station);
        let price = station.price_on(self.fuel_type, date);

        let stats = relations
            .region
            .and_then(|region| self.lookup.statistics(&region.id, self.fuel_type, date));
        let tier = classify(price, stats);

        let brand: Option<Brand> = relations.brand.map(|b| {
            let mut b = b.clone();
            if !self.use_discounts {
                b.use_discount = false;
            }
            b
        });

        let callout = callout::build(
            station,
            brand.as_ref(),
            relations.suburb,
            relations.region,
            &station.features,
        );

        StationAnnotation::new(station, price, tier, callout)
    }

    /// Every station, highest display priority first, then by name
    pub fn render_all(&self, date: NaiveDate) -> Vec<StationAnnotation> {
        let mut annotations: Vec<StationAnnotation> = self
            .lookup
            .stations()
            .into_iter()
            .map(|station| self.render_station(station, date))
            .collect();

        annotations.sort_by(|a, b| {
            b.display_priority()
                .cmp(&a.display_priority())
                .then_with(|| a.trading_name.cmp(&b.trading_name))
        });

        tracing::debug!(
            count = annotations.len(),
            fuel = self.fuel_type.as_str(),
            %date,
            "rendered annotations"
        );
        annotations
    }

    pub fn cluster(&self, members: &[StationAnnotation]) -> ClusterSummary {
        cluster::summarize(members)
    }

    /// Render all stations and hand them to a presenter. Returns the count.
    pub fn present_all<P: AnnotationPresenter>(&self, date: NaiveDate, presenter: &mut P) -> usize {
        let annotations = self.render_all(date);
        for annotation in &annotations {
            presenter.present(annotation);
        }
        annotations.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MapContext;
    use crate::entities::{PriceObservation, Region, Statistics, Suburb};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    /// Metro region with statistics, one branded, one independent and one
    /// unbranded station
    fn sample_context() -> MapContext {
        let mut ctx = MapContext::new();

        let metro = Region::new("Metro");
        let subiaco = Suburb::new("Subiaco", Some(metro.id.clone()));
        ctx.statistics.register(Statistics::new(
            metro.id.clone(),
            FuelType::Unleaded,
            day(),
            vec![100, 110, 120, 130, 140, 150, 160, 170, 180],
        ));

        let caltex = Brand::new("Caltex")
            .with_assets("caltex-glyph", "caltex-logo")
            .with_discount(4.0);

        let mut cheap = Station::new("Caltex Subiaco");
        cheap.brand_id = Some(caltex.id.clone());
        cheap.suburb_id = Some(subiaco.id.clone());
        cheap.record_price(PriceObservation::new(FuelType::Unleaded, 105, day()));

        let mut dear = Station::new("Indy Subiaco");
        dear.brand_id = Some(ctx.brands.independent().id.clone());
        dear.suburb_id = Some(subiaco.id.clone());
        dear.record_price(PriceObservation::new(FuelType::Unleaded, 185, day()));

        let unpriced = Station::new("Nowhere Fuel");

        ctx.regions.register(metro);
        ctx.suburbs.register(subiaco);
        ctx.brands.register(caltex);
        ctx.stations.register(cheap);
        ctx.stations.register(dear);
        ctx.stations.register(unpriced);
        ctx
    }

    #[test]
    fn test_render_branded_station() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);

        let a = renderer.render("Caltex Subiaco", day()).unwrap();
        assert_eq!(a.tier, PriceTier::Bottom20);
        assert_eq!(a.style.tint_key, "per20");
        assert_eq!(a.display_priority(), 890);
        assert_eq!(a.callout.glyph_image_key.as_deref(), Some("caltex-glyph"));
        assert!(a.callout.detail_text.contains("Discount: 4c/l"));
        assert!(a.callout.detail_text.contains("Region: Metro"));
        assert_eq!(a.callout.subtitle.as_deref(), Some("10.5"));
    }

    #[test]
    fn test_render_independent_station() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);

        let a = renderer.render("Indy Subiaco", day()).unwrap();
        assert_eq!(a.tier, PriceTier::Top10);
        assert_eq!(a.display_priority(), 800);
        assert_eq!(a.callout.glyph_text.as_deref(), Some("Ind"));
        assert_eq!(a.callout.glyph_image_key, None);
        assert!(!a.callout.has_brand_line());
    }

    #[test]
    fn test_render_unpriced_station() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);

        let a = renderer.render("Nowhere Fuel", day()).unwrap();
        assert_eq!(a.tier, PriceTier::None);
        assert_eq!(a.display_priority(), 100);
        assert_eq!(a.callout.glyph_text.as_deref(), Some("?"));
    }

    #[test]
    fn test_other_fuel_has_no_price() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Diesel);

        let a = renderer.render("Caltex Subiaco", day()).unwrap();
        assert_eq!(a.tier, PriceTier::None);
    }

    #[test]
    fn test_missing_statistics_is_uncategorizable() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

        let mut station = ctx.station("Caltex Subiaco").unwrap().clone();
        station.record_price(PriceObservation::new(FuelType::Unleaded, 105, next_day));

        let a = renderer.render_station(&station, next_day);
        assert_eq!(a.tier, PriceTier::Uncategorizable);
        assert_eq!(a.display_priority(), 840);
    }

    #[test]
    fn test_discounts_disabled() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded).with_discounts(false);

        let a = renderer.render("Caltex Subiaco", day()).unwrap();
        assert!(a.callout.detail_text.contains("Discount: Not active"));
    }

    #[test]
    fn test_render_all_sorted_by_priority() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);

        let names: Vec<String> = renderer
            .render_all(day())
            .into_iter()
            .map(|a| a.trading_name)
            .collect();
        assert_eq!(names, vec!["Caltex Subiaco", "Indy Subiaco", "Nowhere Fuel"]);
    }

    #[test]
    fn test_unknown_station() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);
        assert!(renderer.render("Not A Station", day()).is_none());
    }

    #[test]
    fn test_present_all_and_cluster() {
        let ctx = sample_context();
        let renderer = AnnotationRenderer::new(&ctx, FuelType::Unleaded);
        let mut presenter = CollectingPresenter::default();

        let count = renderer.present_all(day(), &mut presenter);
        assert_eq!(count, 3);
        assert_eq!(presenter.annotations.len(), 3);

        let summary = renderer.cluster(&presenter.annotations);
        presenter.present_cluster(&summary, &[]);
        assert_eq!(presenter.clusters[0].glyph_text, "3");
    }
}

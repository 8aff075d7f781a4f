use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use crate::data::CsvOptions;
use crate::query::{DecadeRange, ImpactMetric, ScenarioFilter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImpactArg {
    Human,
    Financial,
}

impl From<ImpactArg> for ImpactMetric {
    fn from(arg: ImpactArg) -> Self {
        match arg {
            ImpactArg::Human => ImpactMetric::Human,
            ImpactArg::Financial => ImpactMetric::Financial,
        }
    }
}

/// Explore disaster impacts by decade, disaster type and UN sub-region
#[derive(Clone, Debug, Parser)]
#[command(name = "disaster-map", version, about)]
pub struct Args {
    /// Impact dataset (delimited text with a header row)
    #[arg(long, default_value = "data/randominput.csv")]
    pub data: PathBuf,

    /// Sub-region boundaries (GeoJSON FeatureCollection keyed by `subregion`)
    #[arg(long, default_value = "data/un_subregion_contours.geojson")]
    pub geometry: PathBuf,

    /// Field delimiter of the dataset
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Decimal separator used by numbers in the dataset
    #[arg(long, default_value_t = '.')]
    pub decimal: char,

    /// Climate scenario (RCP) code every query is restricted to
    #[arg(long, default_value_t = 0.0, conflicts_with = "all_scenarios")]
    pub scenario: f64,

    /// Sum across every scenario instead of a single one
    #[arg(long)]
    pub all_scenarios: bool,

    /// First decade of the initial range
    #[arg(long, default_value_t = 1900)]
    pub from: i32,

    /// Last decade of the initial range
    #[arg(long, default_value_t = 1920)]
    pub to: i32,

    /// Initial disaster type (defaults to Droughts, or the first type in the data)
    #[arg(long)]
    pub disaster: Option<String>,

    /// Initial impact metric
    #[arg(long, value_enum, default_value_t = ImpactArg::Human)]
    pub impact: ImpactArg,

    /// Write log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the initial query's per-region totals and exit
    #[arg(long)]
    pub print: bool,
}

impl Args {
    pub fn csv_options(&self) -> Result<CsvOptions> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter {:?} must be a single ASCII character", self.delimiter);
        }
        if self.delimiter == self.decimal {
            bail!(
                "decimal separator {:?} must differ from the field delimiter",
                self.decimal
            );
        }
        Ok(CsvOptions {
            delimiter: self.delimiter as u8,
            decimal: self.decimal,
        })
    }

    pub fn scenario_filter(&self) -> ScenarioFilter {
        if self.all_scenarios {
            ScenarioFilter::Any
        } else {
            ScenarioFilter::Only(self.scenario)
        }
    }

    pub fn decade_range(&self) -> Result<DecadeRange> {
        Ok(DecadeRange::new(self.from, self.to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("disaster-map").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.data, PathBuf::from("data/randominput.csv"));
        assert_eq!(args.csv_options().unwrap(), CsvOptions::default());
        assert_eq!(args.scenario_filter(), ScenarioFilter::Only(0.0));
        assert_eq!(args.decade_range().unwrap(), DecadeRange::new(1900, 1920).unwrap());
        assert_eq!(ImpactMetric::from(args.impact), ImpactMetric::Human);
        assert!(!args.print);
    }

    #[test]
    fn test_european_number_format() {
        let args = parse(&["--delimiter", ";", "--decimal", ","]);
        let options = args.csv_options().unwrap();
        assert_eq!(options.delimiter, b';');
        assert_eq!(options.decimal, ',');

        let clash = parse(&["--decimal", ","]);
        assert!(clash.csv_options().is_err());
    }

    #[test]
    fn test_scenario_and_range_flags() {
        let args = parse(&[
            "--all-scenarios",
            "--from",
            "2000",
            "--to",
            "2100",
            "--impact",
            "financial",
        ]);
        assert_eq!(args.scenario_filter(), ScenarioFilter::Any);
        assert_eq!(args.decade_range().unwrap().decade_count(), 11);
        assert_eq!(ImpactMetric::from(args.impact), ImpactMetric::Financial);

        assert!(parse(&["--from", "1925"]).decade_range().is_err());
        let clash = Args::try_parse_from(["disaster-map", "--scenario", "4.5", "--all-scenarios"]);
        assert!(clash.is_err());
    }
}

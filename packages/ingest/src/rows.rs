//! Raw CSV rows of the two published datasets and their conversion into
//! validated store records.
//!
//! Both files are semicolon-delimited with French headers. Every value
//! object is built here, so a row that converts is guaranteed valid.

use rent_insights_database_models::{NewDistrict, NewUnit};
use rent_insights_geography_models::{GeometryError, GeometryPoint, GeometryShape};
use rent_insights_rent_models::{ConstructionPeriod, InvalidConstructionPeriodError, Money, MoneyError};
use serde::Deserialize;

/// City recorded when the rent row leaves `Ville` empty.
pub const DEFAULT_CITY: &str = "PARIS";

/// `Type de location` value for furnished rentals.
const FURNISHED: &str = "meublé";

/// Reasons a single CSV row is rejected.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// The row does not match the expected columns or types.
    #[error("Malformed row: {0}")]
    Csv(#[from] csv::Error),

    /// A coordinate pair is not `"lat,lon"`.
    #[error("Malformed coordinate pair '{value}'")]
    Coordinates {
        /// The raw cell.
        value: String,
    },

    /// A point or polygon failed validation.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// A rent cell is not a decimal amount.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Unknown construction period label.
    #[error(transparent)]
    Period(#[from] InvalidConstructionPeriodError),

    /// A numeric district attribute is not a number.
    #[error("Invalid {field} '{value}'")]
    Number {
        /// Column name.
        field: &'static str,
        /// The raw cell.
        value: String,
    },
}

/// One row of `quartier_paris.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictCsvRow {
    /// `N_SQ_QU`.
    #[serde(rename = "N_SQ_QU")]
    pub section_number: String,
    /// `Numéro du quartier / C_QU`.
    #[serde(rename = "Numéro du quartier / C_QU")]
    pub district_number: i32,
    /// `C_QUINSEE`.
    #[serde(rename = "C_QUINSEE")]
    pub insee_code: String,
    /// `L_QU`.
    #[serde(rename = "L_QU")]
    pub name: String,
    /// `C_AR`.
    #[serde(rename = "C_AR")]
    pub borough_code: String,
    /// `N_SQ_AR`.
    #[serde(rename = "N_SQ_AR")]
    pub borough_section_number: String,
    /// `PERIMETRE`.
    #[serde(rename = "PERIMETRE", default)]
    pub perimeter: Option<String>,
    /// `SURFACE`.
    #[serde(rename = "SURFACE", default)]
    pub surface: Option<String>,
    /// `Geometry X Y`, written as `"lat,lon"`.
    #[serde(rename = "Geometry X Y")]
    pub geometry_xy: String,
    /// `ZIP CODE`.
    #[serde(rename = "ZIP CODE")]
    pub postal_code: String,
}

impl DistrictCsvRow {
    /// Validates the row into an insertable district.
    ///
    /// # Errors
    ///
    /// Returns [`RowError`] if the coordinates or surface area are invalid.
    pub fn into_district(self) -> Result<NewDistrict, RowError> {
        let surface_area = self
            .surface
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| RowError::Number {
                        field: "SURFACE",
                        value: s.clone(),
                    })
            })
            .transpose()?;

        Ok(NewDistrict {
            district_number: self.district_number,
            section_number: self.section_number,
            insee_code: self.insee_code,
            name: self.name,
            borough_code: self.borough_code,
            borough_section_number: self.borough_section_number,
            perimeter: self.perimeter.filter(|p| !p.trim().is_empty()),
            surface_area,
            postal_code: self.postal_code,
            location: parse_lat_lon(&self.geometry_xy)?,
        })
    }
}

/// One row of `logement-encadrement-des-loyers.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct RentCsvRow {
    /// `Secteurs géographiques`.
    #[serde(rename = "Secteurs géographiques", default)]
    pub geographic_sector: Option<String>,
    /// `Numéro du quartier`.
    #[serde(rename = "Numéro du quartier")]
    pub district_number: i32,
    /// `Nom du quartier`.
    #[serde(rename = "Nom du quartier")]
    pub district_name: String,
    /// `Nombre de pièces principales`.
    #[serde(rename = "Nombre de pièces principales")]
    pub number_of_rooms: i16,
    /// `Epoque de construction`.
    #[serde(rename = "Epoque de construction")]
    pub construction_period: String,
    /// `Type de location` (`"meublé"` or `"non meublé"`).
    #[serde(rename = "Type de location")]
    pub rental_type: String,
    /// `Loyers de référence`.
    #[serde(rename = "Loyers de référence", default)]
    pub reference_rent: Option<String>,
    /// `Loyers de référence majorés`.
    #[serde(rename = "Loyers de référence majorés", default)]
    pub maximum_rent: Option<String>,
    /// `Loyers de référence minorés`.
    #[serde(rename = "Loyers de référence minorés", default)]
    pub minimum_rent: Option<String>,
    /// `Année`.
    #[serde(rename = "Année")]
    pub year: i32,
    /// `Ville`.
    #[serde(rename = "Ville", default)]
    pub city: Option<String>,
    /// `geo_shape`, a `GeoJSON` polygon.
    #[serde(rename = "geo_shape")]
    pub geo_shape: String,
    /// `geo_point_2d`, written as `"lat,lon"`.
    #[serde(rename = "geo_point_2d")]
    pub geo_point_2d: String,
}

impl RentCsvRow {
    /// Validates the row into an insertable rent record.
    ///
    /// # Errors
    ///
    /// Returns [`RowError`] for an unknown construction period, a malformed
    /// rent amount, point or polygon.
    pub fn into_unit(self) -> Result<NewUnit, RowError> {
        Ok(NewUnit {
            district_number: self.district_number,
            district_name: self.district_name,
            geographic_sector: self.geographic_sector.filter(|s| !s.trim().is_empty()),
            number_of_rooms: self.number_of_rooms,
            construction_period: ConstructionPeriod::from_label(&self.construction_period)?,
            furnished: self.rental_type.trim().to_lowercase() == FURNISHED,
            reference_rent: parse_rent(self.reference_rent.as_deref())?,
            maximum_rent: parse_rent(self.maximum_rent.as_deref())?,
            minimum_rent: parse_rent(self.minimum_rent.as_deref())?,
            year: self.year,
            city: self
                .city
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            shape: GeometryShape::from_geojson(&self.geo_shape)?,
            point: parse_lat_lon(&self.geo_point_2d)?,
        })
    }
}

/// Parses the datasets' `"lat,lon"` cells into a point.
fn parse_lat_lon(value: &str) -> Result<GeometryPoint, RowError> {
    let malformed = || RowError::Coordinates {
        value: value.to_string(),
    };

    let (lat, lon) = value.split_once(',').ok_or_else(malformed)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| malformed())?;
    let lon = lon.trim().parse::<f64>().map_err(|_| malformed())?;

    Ok(GeometryPoint::from_components(lon, lat)?)
}

fn parse_rent(value: Option<&str>) -> Result<Option<Money>, RowError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(amount) => Ok(Some(amount.parse()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: &str = r#"{"coordinates": [[[2.3455, 48.8620], [2.3490, 48.8610], [2.3470, 48.8590], [2.3455, 48.8620]]], "type": "Polygon"}"#;

    fn rent_row() -> RentCsvRow {
        RentCsvRow {
            geographic_sector: Some("1".to_string()),
            district_number: 1,
            district_name: "St-Germain-l'Auxerrois".to_string(),
            number_of_rooms: 1,
            construction_period: "Après 1990".to_string(),
            rental_type: "meublé".to_string(),
            reference_rent: Some("27.6".to_string()),
            maximum_rent: Some("33.12".to_string()),
            minimum_rent: Some("19.32".to_string()),
            year: 2024,
            city: Some("PARIS".to_string()),
            geo_shape: SHAPE.to_string(),
            geo_point_2d: "48.8606, 2.3470".to_string(),
        }
    }

    #[test]
    fn rent_row_converts_with_swapped_point_and_exact_money() {
        let unit = rent_row().into_unit().unwrap();
        assert_eq!(unit.construction_period, ConstructionPeriod::After1990);
        assert!(unit.furnished);
        assert_eq!(unit.reference_rent.map(Money::amount), Some(276_000));
        assert_eq!(unit.maximum_rent.map(Money::amount), Some(331_200));
        assert!((unit.point.longitude() - 2.3470).abs() < f64::EPSILON);
        assert!((unit.point.latitude() - 48.8606).abs() < f64::EPSILON);
    }

    #[test]
    fn non_furnished_and_empty_cells() {
        let mut row = rent_row();
        row.rental_type = "non meublé".to_string();
        row.reference_rent = Some(String::new());
        row.city = None;
        row.geographic_sector = Some(" ".to_string());

        let unit = row.into_unit().unwrap();
        assert!(!unit.furnished);
        assert_eq!(unit.reference_rent, None);
        assert_eq!(unit.city, DEFAULT_CITY);
        assert_eq!(unit.geographic_sector, None);
    }

    #[test]
    fn invalid_rent_rows_are_rejected() {
        let mut row = rent_row();
        row.construction_period = "Apres 2000".to_string();
        assert!(matches!(row.into_unit(), Err(RowError::Period(_))));

        let mut row = rent_row();
        row.maximum_rent = Some("n/a".to_string());
        assert!(matches!(row.into_unit(), Err(RowError::Money(_))));

        let mut row = rent_row();
        row.geo_point_2d = "48.86".to_string();
        assert!(matches!(row.into_unit(), Err(RowError::Coordinates { .. })));

        let mut row = rent_row();
        row.geo_shape = r#"{"type":"MultiPolygon","coordinates":[]}"#.to_string();
        assert!(matches!(row.into_unit(), Err(RowError::Geometry(_))));
    }

    #[test]
    fn district_row_reads_lat_lon_order() {
        let row = DistrictCsvRow {
            section_number: "750000029".to_string(),
            district_number: 29,
            insee_code: "7510829".to_string(),
            name: "Champs-Elysées".to_string(),
            borough_code: "8".to_string(),
            borough_section_number: "750000008".to_string(),
            perimeter: Some(String::new()),
            surface: Some("1136810,25".to_string()),
            geometry_xy: "48.8664702895,2.30650973551".to_string(),
            postal_code: "75008".to_string(),
        };

        let district = row.into_district().unwrap();
        assert!((district.location.latitude() - 48.866_470_289_5).abs() < 1e-12);
        assert!((district.location.longitude() - 2.306_509_735_51).abs() < 1e-12);
        assert_eq!(district.perimeter, None);
        assert_eq!(district.surface_area, Some(1_136_810.25));
    }
}

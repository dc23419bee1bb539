//! District storage and lookups.

use duckdb::{Connection, params};
use rent_insights_database_models::{DistrictRow, NewDistrict};
use rent_insights_geography_models::{BoundingBox, GeometryPoint};

use crate::{DbError, codec};

const SELECT_COLUMNS: &str = "SELECT id, district_number, name, postal_code, longitude, latitude
     FROM districts";

type RawDistrict = (i64, i32, String, String, f64, f64);

fn read_raw(row: &duckdb::Row<'_>) -> duckdb::Result<RawDistrict> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode(raw: RawDistrict) -> Result<DistrictRow, DbError> {
    let (id, district_number, name, postal_code, longitude, latitude) = raw;
    Ok(DistrictRow {
        id,
        district_number,
        name,
        postal_code,
        location: codec::decode_point(longitude, latitude)?,
    })
}

fn optional_row(result: duckdb::Result<RawDistrict>) -> Result<Option<DistrictRow>, DbError> {
    match result {
        Ok(raw) => decode(raw).map(Some),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

/// Whether a district with this business key exists.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn exists(conn: &Connection, district_number: i32) -> Result<bool, DbError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM districts WHERE district_number = ?",
        [district_number],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Inserts a district unless one with the same `district_number` is
/// already stored. Existing rows are never overwritten.
///
/// Returns `true` if a row was inserted.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup or insert fails (including a
/// `section_number` collision with a different district).
pub fn insert_if_absent(conn: &Connection, district: &NewDistrict) -> Result<bool, DbError> {
    if exists(conn, district.district_number)? {
        log::debug!(
            "District {} already stored, skipping",
            district.district_number
        );
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO districts (
            district_number, section_number, insee_code, name, borough_code,
            borough_section_number, perimeter, surface_area, postal_code,
            longitude, latitude
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            district.district_number,
            district.section_number,
            district.insee_code,
            district.name,
            district.borough_code,
            district.borough_section_number,
            district.perimeter.as_deref(),
            district.surface_area,
            district.postal_code,
            district.location.longitude(),
            district.location.latitude(),
        ],
    )?;

    Ok(true)
}

/// Finds the district for a postal code.
///
/// Several districts share a postal code; the one with the lowest
/// `district_number` is returned.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the stored point is invalid.
pub fn find_by_postal_code(
    conn: &Connection,
    postal_code: &str,
) -> Result<Option<DistrictRow>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE postal_code = ? ORDER BY district_number LIMIT 1"
    ))?;
    optional_row(stmt.query_row([postal_code.trim()], read_raw))
}

/// Finds the district whose stored point lies within `tolerance` degrees of
/// `point` on both axes. When several qualify, the nearest one wins.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the stored point is invalid.
pub fn find_nearest_within_box(
    conn: &Connection,
    point: &GeometryPoint,
    tolerance: f64,
) -> Result<Option<DistrictRow>, DbError> {
    let bbox = BoundingBox::around(point, tolerance);

    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS}
         WHERE longitude BETWEEN ? AND ?
           AND latitude BETWEEN ? AND ?
         ORDER BY POW(longitude - ?, 2) + POW(latitude - ?, 2), district_number
         LIMIT 1"
    ))?;

    optional_row(stmt.query_row(
        params![
            bbox.west,
            bbox.east,
            bbox.south,
            bbox.north,
            point.longitude(),
            point.latitude(),
        ],
        read_raw,
    ))
}

/// Returns the number of stored districts.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn count(conn: &Connection) -> Result<u64, DbError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM districts", [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Deletes every district. Rent records must be removed first.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub fn truncate(conn: &Connection) -> Result<u64, DbError> {
    let rows = conn.execute("DELETE FROM districts", [])?;
    Ok(u64::try_from(rows).unwrap_or(0))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn district(number: i32, postal_code: &str, lon: f64, lat: f64) -> NewDistrict {
        NewDistrict {
            district_number: number,
            section_number: format!("7511{number:04}"),
            insee_code: format!("75101{number:02}"),
            name: format!("Quartier {number}"),
            borough_code: "1".to_string(),
            borough_section_number: "750000001".to_string(),
            perimeter: Some("2155.37".to_string()),
            surface_area: Some(442_892.7),
            postal_code: postal_code.to_string(),
            location: GeometryPoint::from_components(lon, lat).unwrap(),
        }
    }

    #[test]
    fn insert_is_idempotent_on_district_number() {
        let conn = crate::open_in_memory().unwrap();

        assert!(insert_if_absent(&conn, &district(1, "75001", 2.3455, 48.8620)).unwrap());

        let mut renamed = district(1, "75002", 2.0, 48.0);
        renamed.name = "Renamed".to_string();
        assert!(!insert_if_absent(&conn, &renamed).unwrap());

        assert_eq!(count(&conn).unwrap(), 1);
        let stored = find_by_postal_code(&conn, "75001").unwrap().unwrap();
        assert_eq!(stored.name, "Quartier 1");
        assert!(find_by_postal_code(&conn, "75002").unwrap().is_none());
    }

    #[test]
    fn postal_code_lookup_picks_lowest_district_number() {
        let conn = crate::open_in_memory().unwrap();
        insert_if_absent(&conn, &district(3, "75001", 2.34, 48.86)).unwrap();
        insert_if_absent(&conn, &district(2, "75001", 2.33, 48.86)).unwrap();

        let found = find_by_postal_code(&conn, " 75001 ").unwrap().unwrap();
        assert_eq!(found.district_number, 2);
    }

    #[test]
    fn coordinate_lookup_uses_tolerance_box_and_nearest_point() {
        let conn = crate::open_in_memory().unwrap();
        insert_if_absent(&conn, &district(1, "75001", 2.3400, 48.8600)).unwrap();
        insert_if_absent(&conn, &district(2, "75001", 2.3480, 48.8600)).unwrap();

        let near_second = GeometryPoint::from_components(2.3470, 48.8605).unwrap();
        let found = find_nearest_within_box(&conn, &near_second, 0.01)
            .unwrap()
            .unwrap();
        assert_eq!(found.district_number, 2);

        let far = GeometryPoint::from_components(2.40, 48.90).unwrap();
        assert!(find_nearest_within_box(&conn, &far, 0.01).unwrap().is_none());
    }

    #[test]
    fn truncate_removes_everything() {
        let conn = crate::open_in_memory().unwrap();
        insert_if_absent(&conn, &district(1, "75001", 2.34, 48.86)).unwrap();
        insert_if_absent(&conn, &district(2, "75001", 2.35, 48.86)).unwrap();

        assert_eq!(truncate(&conn).unwrap(), 2);
        assert_eq!(count(&conn).unwrap(), 0);
        assert!(!exists(&conn, 1).unwrap());
    }
}

//! Rent record storage, proximity candidates and rent aggregation.

use std::fmt::Write as _;

use duckdb::types::Value;
use duckdb::{Connection, params, params_from_iter};
use rent_insights_database_models::{
    HashComposition, NewUnit, ProximityCandidate, RentAggregate, UnitFilter, UnitScope,
};
use rent_insights_geography_models::BoundingBox;

use crate::{DbError, codec};

/// Content hash used as the idempotency key of a rent record.
///
/// The hash is the lowercase hex MD5 digest of the selected fields
/// concatenated without separators. The furnished flag contributes `"1"`
/// when set and nothing otherwise.
#[must_use]
pub fn unit_hash(unit: &NewUnit, composition: HashComposition) -> String {
    let mut context = md5::Context::new();
    context.consume(unit.district_number.to_string());
    context.consume(unit.number_of_rooms.to_string());
    context.consume(unit.construction_period.ordinal().to_string());
    context.consume(if unit.furnished { "1" } else { "" });
    context.consume(unit.year.to_string());

    if composition == HashComposition::Extended {
        context.consume(&unit.city);
        context.consume(unit.geographic_sector.as_deref().unwrap_or_default());
        context.consume(unit.point.latitude().to_string());
        context.consume(unit.point.longitude().to_string());
    }

    format!("{:x}", context.finalize())
}

/// Whether a record with this content hash is stored.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn exists_by_hash(conn: &Connection, unit_hash: &str) -> Result<bool, DbError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM units WHERE unit_hash = ?",
        [unit_hash],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Inserts a rent record unless one with the same content hash is already
/// stored.
///
/// Returns `true` if a row was inserted.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup or insert fails, including when the
/// record's district does not exist.
pub fn insert_if_absent(
    conn: &Connection,
    unit: &NewUnit,
    composition: HashComposition,
) -> Result<bool, DbError> {
    let hash = unit_hash(unit, composition);

    if exists_by_hash(conn, &hash)? {
        log::trace!("Rent record {hash} already stored, skipping");
        return Ok(false);
    }

    let envelope = unit.shape.envelope();

    conn.execute(
        "INSERT INTO units (
            unit_hash, district_number, district_name, geographic_sector,
            number_of_rooms, construction_period, furnished,
            reference_rent, maximum_rent, minimum_rent, year, city,
            geometry_shape, min_lon, min_lat, max_lon, max_lat,
            longitude, latitude
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            hash,
            unit.district_number,
            unit.district_name,
            unit.geographic_sector.as_deref(),
            unit.number_of_rooms,
            unit.construction_period.ordinal(),
            unit.furnished,
            codec::encode_money(unit.reference_rent),
            codec::encode_money(unit.maximum_rent),
            codec::encode_money(unit.minimum_rent),
            unit.year,
            unit.city,
            codec::encode_shape(&unit.shape),
            envelope.west,
            envelope.south,
            envelope.east,
            envelope.north,
            unit.point.longitude(),
            unit.point.latitude(),
        ],
    )?;

    Ok(true)
}

/// Records matching `filter` whose polygon envelope overlaps `search_box`.
///
/// This is only the SQL pre-filter; callers still run the exact distance
/// test on [`ProximityCandidate::geometry`].
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn proximity_candidates(
    conn: &Connection,
    search_box: &BoundingBox,
    filter: &UnitFilter,
) -> Result<Vec<ProximityCandidate>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, geometry_shape FROM units
         WHERE construction_period = ?
           AND number_of_rooms = ?
           AND furnished = ?
           AND min_lon <= ? AND max_lon >= ?
           AND min_lat <= ? AND max_lat >= ?
         ORDER BY id",
    )?;

    let candidates = stmt
        .query_map(
            params![
                filter.construction_period.ordinal(),
                filter.number_of_rooms,
                filter.furnished,
                search_box.east,
                search_box.west,
                search_box.north,
                search_box.south,
            ],
            |row| {
                Ok(ProximityCandidate {
                    id: row.get(0)?,
                    geometry: row.get(1)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "{} proximity candidates in envelope ({}, {}, {}, {})",
        candidates.len(),
        search_box.west,
        search_box.south,
        search_box.east,
        search_box.north
    );

    Ok(candidates)
}

/// Aggregates rents over the records in `scope` that match `filter`.
///
/// `MAX(maximum_rent)` and `MIN(minimum_rent)` come straight from the
/// stored subunits. The average of `reference_rent` is computed from an
/// integer sum and count and truncated toward zero. `NULL` rents are
/// ignored by all three aggregates.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn aggregate_rents(
    conn: &Connection,
    scope: &UnitScope,
    filter: &UnitFilter,
) -> Result<RentAggregate, DbError> {
    let mut sql = String::from(
        "SELECT MAX(maximum_rent),
                MIN(minimum_rent),
                CAST(SUM(reference_rent) AS BIGINT),
                COUNT(reference_rent),
                COUNT(*)
         FROM units
         WHERE construction_period = ?
           AND number_of_rooms = ?
           AND furnished = ?",
    );
    let mut values = vec![
        Value::SmallInt(filter.construction_period.ordinal()),
        Value::SmallInt(filter.number_of_rooms),
        Value::Boolean(filter.furnished),
    ];

    match scope {
        UnitScope::District(district_number) => {
            sql.push_str(" AND district_number = ?");
            values.push(Value::Int(*district_number));
        }
        UnitScope::Units(ids) if ids.is_empty() => {
            return Ok(RentAggregate::default());
        }
        UnitScope::Units(ids) => {
            let placeholders = vec!["?"; ids.len()].join(", ");
            write!(sql, " AND id IN ({placeholders})").map_err(|e| DbError::Conversion {
                message: e.to_string(),
            })?;
            values.extend(ids.iter().copied().map(Value::BigInt));
        }
    }

    let (max_rent, min_rent, reference_sum, reference_count, matched): (
        Option<i64>,
        Option<i64>,
        Option<i64>,
        i64,
        i64,
    ) = conn.query_row(&sql, params_from_iter(values), |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    })?;

    let average_rent = reference_sum
        .filter(|_| reference_count > 0)
        .map(|sum| sum / reference_count);

    Ok(RentAggregate {
        max_rent,
        min_rent,
        average_rent,
        matched: u64::try_from(matched).unwrap_or(0),
    })
}

/// Returns the number of stored rent records.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn count(conn: &Connection) -> Result<u64, DbError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Deletes every rent record.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub fn truncate(conn: &Connection) -> Result<u64, DbError> {
    let rows = conn.execute("DELETE FROM units", [])?;
    Ok(u64::try_from(rows).unwrap_or(0))
}

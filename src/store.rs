use std::fs;

use camino::Utf8Path;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::domain::ImportedRow;
use crate::error::ImportError;

pub const TABLE: &str = "inatimported";

pub trait RowSink {
    /// Insert-or-replace keyed by `row.id`.
    fn upsert(&mut self, row: &ImportedRow) -> Result<(), ImportError>;
}

pub struct SqliteStore {
    conn: Connection,
    upsert_sql: String,
}

impl SqliteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, ImportError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ImportError::Database(err.to_string()))?;
        }
        let conn = Connection::open(path.as_std_path())
            .map_err(|err| ImportError::Database(err.to_string()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, ImportError> {
        let conn =
            Connection::open_in_memory().map_err(|err| ImportError::Database(err.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, ImportError> {
        let store = Self {
            conn,
            upsert_sql: upsert_statement(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<(), ImportError> {
        let columns = ImportedRow::COLUMNS
            .iter()
            .map(|column| match *column {
                "id" => "\"id\" INTEGER PRIMARY KEY".to_string(),
                "coordinates_obscured" => "\"coordinates_obscured\" TEXT NOT NULL".to_string(),
                other => format!("\"{other}\" TEXT"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute_batch(&format!("CREATE TABLE IF NOT EXISTS {TABLE} ({columns});"))
            .map_err(|err| ImportError::Database(err.to_string()))
    }

    pub fn count(&self) -> Result<u64, ImportError> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|count| count as u64)
            .map_err(|err| ImportError::Database(err.to_string()))
    }

    pub fn get(&self, id: u64) -> Result<Option<ImportedRow>, ImportError> {
        let columns = quoted_columns();
        self.conn
            .query_row(
                &format!("SELECT {columns} FROM {TABLE} WHERE \"id\" = ?1"),
                params![id as i64],
                read_row,
            )
            .optional()
            .map_err(|err| ImportError::Database(err.to_string()))
    }
}

impl RowSink for SqliteStore {
    fn upsert(&mut self, row: &ImportedRow) -> Result<(), ImportError> {
        let persistence = |err: rusqlite::Error| ImportError::Persistence {
            id: row.id,
            message: err.to_string(),
        };
        let mut statement = self
            .conn
            .prepare_cached(&self.upsert_sql)
            .map_err(persistence)?;
        statement
            .execute(params![
                row.id as i64,
                row.date,
                row.user_name,
                row.user_login,
                row.description,
                row.latitude,
                row.longitude,
                row.private_latitude,
                row.private_longitude,
                row.coordinates_obscured,
                row.county,
                row.state,
                row.country,
                row.scientific_name,
                row.phylum,
                row.class,
                row.order,
                row.family,
                row.tribe,
                row.genus,
                row.species,
                row.accession_number,
                row.fundis_tag_number,
                row.microscopy_requested,
                row.mycomap_blast_results,
                row.mycoportal_link,
                row.provisional_species_name,
                row.voucher_number,
                row.voucher_numbers,
                row.dna_barcode_its,
                row.dna_barcode_its_2,
                row.dna_barcode_lsu,
            ])
            .map_err(persistence)?;
        Ok(())
    }
}

fn quoted_columns() -> String {
    ImportedRow::COLUMNS
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn upsert_statement() -> String {
    let placeholders = (1..=ImportedRow::COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = ImportedRow::COLUMNS
        .iter()
        .filter(|column| **column != "id")
        .map(|column| format!("\"{column}\" = excluded.\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({placeholders}) ON CONFLICT(\"id\") DO UPDATE SET {updates}",
        quoted_columns()
    )
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ImportedRow> {
    Ok(ImportedRow {
        id: row.get::<_, i64>(0)? as u64,
        date: row.get(1)?,
        user_name: row.get(2)?,
        user_login: row.get(3)?,
        description: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        private_latitude: row.get(7)?,
        private_longitude: row.get(8)?,
        coordinates_obscured: row.get(9)?,
        county: row.get(10)?,
        state: row.get(11)?,
        country: row.get(12)?,
        scientific_name: row.get(13)?,
        phylum: row.get(14)?,
        class: row.get(15)?,
        order: row.get(16)?,
        family: row.get(17)?,
        tribe: row.get(18)?,
        genus: row.get(19)?,
        species: row.get(20)?,
        accession_number: row.get(21)?,
        fundis_tag_number: row.get(22)?,
        microscopy_requested: row.get(23)?,
        mycomap_blast_results: row.get(24)?,
        mycoportal_link: row.get(25)?,
        provisional_species_name: row.get(26)?,
        voucher_number: row.get(27)?,
        voucher_numbers: row.get(28)?,
        dna_barcode_its: row.get(29)?,
        dna_barcode_its_2: row.get(30)?,
        dna_barcode_lsu: row.get(31)?,
    })
}

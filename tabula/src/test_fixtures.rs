//! Common test fixtures: a small procurement-style dataset.
//!
//! - `obras_contratos_menores`: euro-style amounts, accented awardee spellings,
//!   a blank type, a NULL awardee and one malformed date.
//! - `obras_contratos_menores_files`: attachments for two of its records.
//! - `servizos_licitacions`: a second contract table sharing awardees.
//! - `mixed`: a column whose style depends on the active filter.

use std::path::PathBuf;

use rusqlite::Connection;
use tempfile::TempDir;

use crate::store::register_functions;

/// Statements creating and filling the fixture tables.
pub const FIXTURE_SQL: &str = r#"
CREATE TABLE obras_contratos_menores (
    Expediente TEXT, Tipo TEXT, Importe TEXT, Adxudicatario TEXT, Objeto TEXT, Estado TEXT
);
INSERT INTO obras_contratos_menores VALUES
    ('EXP-001', 'Obras', '1.234,50', 'Acme Obras SA',
     'Reparación de beirarrúas', 'Adxudicado 15/03/2024'),
    ('EXP-002', 'Servizos', '999,00', 'Construcións Álvarez SL',
     'Limpeza de colexios', 'Adxudicado 02/04/2024'),
    ('EXP-003', 'Obras', '10.000,00', 'CONSTRUCIONS ALVAREZ SL',
     'Pavimentación do camiño de Santiago en varios treitos do concello', 'Adxudicado 20/03/2024'),
    ('EXP-004', '', '150,75', 'Acme Obras SA',
     'Material de oficina', 'Pendente 10/01/2023'),
    ('EXP-005', 'Obras', '2.500,00', NULL,
     'Iluminación pública', 'Sen data');

CREATE TABLE obras_contratos_menores_files (Expediente TEXT, Ficheiro TEXT);
INSERT INTO obras_contratos_menores_files VALUES
    ('EXP-001', 'a.pdf'),
    ('EXP-001', 'b.pdf'),
    ('EXP-003', 'c.pdf');

CREATE TABLE servizos_licitacions (
    Expediente TEXT, Tipo_licitacion TEXT, Importe_con_iva TEXT, Empresa TEXT, Fechas TEXT
);
INSERT INTO servizos_licitacions VALUES
    ('L-1', 'Servizos', '5.000,00', 'ACME OBRAS SA', 'Publicado 01/03/2024'),
    ('L-2', 'Subministros', '750,00', 'Beta Limpezas', 'Publicado 15/03/2024'),
    ('L-3', 'Servizos', '12.000,00', 'Construcións Álvarez SL', 'Publicado 05/04/2024');

CREATE TABLE mixed (fonte TEXT, valor TEXT);
INSERT INTO mixed VALUES
    ('Europa', '1.234,56'),
    ('Europa', '2.000,10'),
    ('USA', '1234.56'),
    ('USA', '2000.10'),
    ('USA', '15.5'),
    ('USA', '300.25');
"#;

/// An in-memory connection holding the fixture tables and the dataset functions.
pub fn fixture_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory database");
    register_functions(&conn).expect("register functions");
    conn.execute_batch(FIXTURE_SQL).expect("fixture data");
    conn
}

/// The fixture written to a file; keep the [`TempDir`] alive while using the path.
pub fn fixture_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("fixture.db");
    let conn = Connection::open(&path).expect("create fixture db");
    conn.execute_batch(FIXTURE_SQL).expect("fixture data");
    drop(conn);
    (dir, path)
}

//! Shared helpers for integration tests: throwaway SQLite datasets.

#![allow(dead_code)]

use std::path::PathBuf;

use rusqlite::Connection;
use tabula::config::EngineConfig;
use tabula::engine::Explorer;
use tempfile::TempDir;

/// A dataset on disk. The directory is removed when this is dropped.
pub struct TestDataset {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDataset {
    pub fn from_sql(sql: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("dataset.db");
        let conn = Connection::open(&path).expect("create dataset");
        conn.execute_batch(sql).expect("load dataset");
        drop(conn);
        Self { _dir: dir, path }
    }

    pub fn explorer(&self) -> Explorer {
        self.explorer_with(EngineConfig::default())
    }

    pub fn explorer_with(&self, config: EngineConfig) -> Explorer {
        Explorer::open(&self.path, config).expect("open dataset")
    }
}

/// Two contract tables sharing awardees, one attachment table and an unrelated table.
pub const PROCUREMENT_SQL: &str = r#"
CREATE TABLE concello_contratos_menores (
    Expediente TEXT, Tipo TEXT, Importe TEXT, Adxudicatario TEXT,
    Objeto_del_contrato TEXT, Estado TEXT
);
INSERT INTO concello_contratos_menores VALUES
    ('CM-1', 'Obras', '1.200,00', 'Acme', 'Reforma da praza', 'Adxudicado 03/02/2024'),
    ('CM-2', 'Obras', '800,50', 'ACME', 'Pintura do colexio', 'Adxudicado 17/02/2024'),
    ('CM-3', 'Servizos', '45.000,00', 'acmé', 'Mantemento de parques', 'Adxudicado 01/03/2024'),
    ('CM-4', 'Subministros', '9,95', 'Ferretería Núñez', 'Parafusos', 'Adxudicado 01/03/2024');

CREATE TABLE concello_contratos_menores_file (Expediente TEXT, Url TEXT);
INSERT INTO concello_contratos_menores_file VALUES ('CM-3', 'cm3.pdf');

CREATE TABLE deporte_licitacions (
    Expediente TEXT, Tipo_licitacion TEXT, Importe_con_iva TEXT, Empresa TEXT, Fechas TEXT
);
INSERT INTO deporte_licitacions VALUES
    ('DL-1', 'Obras', '120.000,00', 'Acme', 'Publicado 10/02/2024'),
    ('DL-2', 'Servizos', '3.000,00', 'Beta Deportes', 'Publicado 22/03/2024');

CREATE TABLE notas (texto TEXT);
INSERT INTO notas VALUES ('sen importes'), ('outra nota');
"#;

pub fn procurement_dataset() -> TestDataset {
    TestDataset::from_sql(PROCUREMENT_SQL)
}

/// Routes `tracing` output through the test harness.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tabula=debug")
        .try_init();
}

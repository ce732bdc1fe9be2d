//! Resolution of logical column roles for a table.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::schema::{pick_first_column, Column};

/// The columns of one table that play each logical role, if present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRoles {
    pub record_type: Option<String>,
    pub amount: Option<String>,
    pub awardee: Option<String>,
    pub record_id: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl TableRoles {
    pub fn resolve(config: &EngineConfig, table: &str, columns: &[Column]) -> Self {
        let roles = &config.roles;
        let pick = |candidates: &[String]| pick_first_column(columns, candidates).map(str::to_string);

        let date = config
            .date_column_for(table)
            .and_then(|name| pick(&[name.to_string()]));

        Self {
            record_type: pick(&roles.record_type),
            amount: pick(&roles.amount),
            awardee: pick(&roles.awardee),
            record_id: pick(&roles.record_id),
            description: pick(&roles.description),
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<Column> {
        names
            .iter()
            .map(|n| Column {
                name: n.to_string(),
                declared_type: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_resolves_contract_table() {
        let config = EngineConfig::default();
        let roles = TableRoles::resolve(
            &config,
            "obras_contratos_menores",
            &cols(&["Expediente", "Tipo", "Importe", "Adxudicatario", "Objeto", "Estado"]),
        );
        assert_eq!(roles.record_type.as_deref(), Some("Tipo"));
        assert_eq!(roles.amount.as_deref(), Some("Importe"));
        assert_eq!(roles.awardee.as_deref(), Some("Adxudicatario"));
        assert_eq!(roles.record_id.as_deref(), Some("Expediente"));
        assert_eq!(roles.description.as_deref(), Some("Objeto"));
        assert_eq!(roles.date.as_deref(), Some("Estado"));
    }

    #[test]
    fn test_date_column_must_exist() {
        let config = EngineConfig::default();
        let roles = TableRoles::resolve(&config, "x_licitacions", &cols(&["Importe"]));
        assert_eq!(roles.date, None);
        assert_eq!(roles.amount.as_deref(), Some("Importe"));
    }

    #[test]
    fn test_unrelated_table_has_no_roles() {
        let config = EngineConfig::default();
        assert_eq!(
            TableRoles::resolve(&config, "mixed", &cols(&["fonte", "valor"])),
            TableRoles::default()
        );
    }
}

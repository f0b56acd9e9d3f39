//! Dameng catalog SQL and connection string.
//!
//! Dameng folds unquoted identifiers to upper case, so table names are
//! upper-cased before binding.

use super::{OdbcDialect, attribute};
use crate::services::database::traits::{ConnectionConfig, DatabaseType};

const TABLES_QUERY: &str = r#"
    SELECT TABLE_NAME
    FROM DBA_TABLES
    WHERE OWNER = UPPER(?)
    ORDER BY TABLE_NAME
"#;

const DESCRIBE_QUERY: &str = r#"
    SELECT
        C.COLUMN_NAME AS COLUMN_NAME,
        C.DATA_TYPE AS DATA_TYPE,
        C.DATA_LENGTH AS DATA_LENGTH,
        C.NULLABLE AS NULLABLE,
        CASE WHEN EXISTS (
            SELECT 1 FROM USER_CONS_COLUMNS CC
            JOIN USER_CONSTRAINTS UC ON CC.CONSTRAINT_NAME = UC.CONSTRAINT_NAME
            WHERE UC.TABLE_NAME = ? AND UC.CONSTRAINT_TYPE = 'P'
                AND CC.COLUMN_NAME = C.COLUMN_NAME
        ) THEN 'PRIMARY KEY' ELSE '' END AS CONSTRAINT_TYPE,
        NVL((
            SELECT COMMENTS FROM USER_COL_COMMENTS
            WHERE TABLE_NAME = ? AND COLUMN_NAME = C.COLUMN_NAME
        ), '') AS DESCRIPTION,
        CASE WHEN C.DATA_TYPE LIKE '%IDENTITY%' THEN 'IDENTITY' ELSE '' END AS IDENTITY_INFO
    FROM USER_TAB_COLUMNS C
    WHERE C.TABLE_NAME = ?
    ORDER BY C.COLUMN_ID
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT COLUMN_NAME
    FROM USER_TAB_COLUMNS
    WHERE TABLE_NAME = ?
    ORDER BY COLUMN_ID
"#;

fn connection_string(driver: &str, config: &ConnectionConfig) -> String {
    format!(
        "Driver={{{}}};Server={};TCP_Port={};UID={};PWD={};",
        driver,
        attribute(&config.host),
        config.effective_port(),
        attribute(&config.user),
        attribute(&config.password),
    )
}

pub(super) const DIALECT: OdbcDialect = OdbcDialect {
    database_type: DatabaseType::Dameng,
    driver_env: "DATAMGR_DAMENG_ODBC_DRIVER",
    default_driver: "DM8 ODBC DRIVER",
    tables_query: TABLES_QUERY,
    tables_by_owner: true,
    describe_query: DESCRIBE_QUERY,
    describe_binds: 3,
    columns_query: COLUMNS_QUERY,
    ping_query: "SELECT 1 FROM DUAL",
    connection_string,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dameng_connection_string() {
        let config = ConnectionConfig::new(DatabaseType::Dameng, "dm.local", 0, "SYSDBA", "p;w", "DAMENG");
        assert_eq!(
            connection_string("DM8 ODBC DRIVER", &config),
            "Driver={DM8 ODBC DRIVER};Server=dm.local;TCP_Port=5236;UID=SYSDBA;PWD={p;w};"
        );
    }

    #[test]
    fn test_describe_binds_match_placeholders() {
        assert_eq!(DESCRIBE_QUERY.matches('?').count(), DIALECT.describe_binds);
        assert_eq!(TABLES_QUERY.matches('?').count(), 1);
    }
}

//! Oracle catalog SQL and connection string.
//!
//! `dbname` is the service name; the connect descriptor is `host:port/service`.

use super::{OdbcDialect, attribute};
use crate::services::database::traits::{ConnectionConfig, DatabaseType};

const TABLES_QUERY: &str = "SELECT table_name AS TABLE_NAME FROM user_tables ORDER BY table_name";

const DESCRIBE_QUERY: &str = r#"
    SELECT
        col.column_name AS COLUMN_NAME,
        col.data_type AS DATA_TYPE,
        TO_CHAR(CASE
            WHEN col.data_type IN ('VARCHAR2', 'CHAR', 'NVARCHAR2', 'NCHAR') THEN col.char_length
            WHEN col.data_precision IS NOT NULL THEN col.data_precision
            ELSE col.data_length
        END) AS DATA_LENGTH,
        CASE col.nullable WHEN 'Y' THEN 'Y' ELSE 'N' END AS NULLABLE,
        CASE
            WHEN pk.constraint_name IS NOT NULL THEN 'PRIMARY KEY'
            WHEN fk.constraint_name IS NOT NULL THEN 'FOREIGN KEY'
            WHEN unq.constraint_name IS NOT NULL THEN 'UNIQUE'
            ELSE ''
        END AS CONSTRAINT_TYPE,
        com.comments AS DESCRIPTION,
        CASE WHEN col.identity_column = 'YES' THEN 'IDENTITY' ELSE '' END AS IDENTITY_INFO
    FROM user_tab_columns col
    LEFT JOIN user_col_comments com
        ON col.table_name = com.table_name AND col.column_name = com.column_name
    LEFT JOIN (
        SELECT MIN(cons.constraint_name) AS constraint_name, cols.column_name, cols.table_name
        FROM user_constraints cons
        JOIN user_cons_columns cols ON cons.constraint_name = cols.constraint_name
        WHERE cons.constraint_type = 'P'
        GROUP BY cols.column_name, cols.table_name
    ) pk ON col.column_name = pk.column_name AND col.table_name = pk.table_name
    LEFT JOIN (
        SELECT MIN(cons.constraint_name) AS constraint_name, cols.column_name, cols.table_name
        FROM user_constraints cons
        JOIN user_cons_columns cols ON cons.constraint_name = cols.constraint_name
        WHERE cons.constraint_type = 'R'
        GROUP BY cols.column_name, cols.table_name
    ) fk ON col.column_name = fk.column_name AND col.table_name = fk.table_name
    LEFT JOIN (
        SELECT MIN(cons.constraint_name) AS constraint_name, cols.column_name, cols.table_name
        FROM user_constraints cons
        JOIN user_cons_columns cols ON cons.constraint_name = cols.constraint_name
        WHERE cons.constraint_type = 'U'
        GROUP BY cols.column_name, cols.table_name
    ) unq ON col.column_name = unq.column_name AND col.table_name = unq.table_name
    WHERE col.table_name = ?
    ORDER BY col.column_id
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT column_name AS COLUMN_NAME
    FROM user_tab_columns
    WHERE table_name = ?
    ORDER BY column_id
"#;

fn connection_string(driver: &str, config: &ConnectionConfig) -> String {
    format!(
        "Driver={{{}}};Dbq={}:{}/{};Uid={};Pwd={};",
        driver,
        config.host,
        config.effective_port(),
        config.dbname,
        attribute(&config.user),
        attribute(&config.password),
    )
}

pub(super) const DIALECT: OdbcDialect = OdbcDialect {
    database_type: DatabaseType::Oracle,
    driver_env: "DATAMGR_ORACLE_ODBC_DRIVER",
    default_driver: "Oracle",
    tables_query: TABLES_QUERY,
    tables_by_owner: false,
    describe_query: DESCRIBE_QUERY,
    describe_binds: 1,
    columns_query: COLUMNS_QUERY,
    ping_query: "SELECT 1 FROM DUAL",
    connection_string,
};

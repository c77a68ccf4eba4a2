// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: dictionary rows for a small HR schema
//!
//! Rows are shaped like the dictionary views the catalog queries, so a
//! [`MockRowSource`](crate::MockRowSource) scripted with them drives the real
//! call sites end to end.
//!
//! - Tables: `COUNTRIES`, `DEPARTMENTS`, `EMPLOYEES`, view `EMP_DETAILS_VIEW`
//! - `EMPLOYEES` columns arrive out of `COLUMN_ID` order
//! - `EMP_UPPER_IX` indexes a hidden virtual column and resolves to nothing
//! - `EMP_SALARY_MIN` is a check constraint without columns
//! - `ADD_JOB_HISTORY` takes a nested record, `GET_SALARY` is a function,
//!   `SECURE_DML` takes no arguments

use sqlnav_catalog::{Row, Value};

/// Sample dictionary rows for testing
pub struct CatalogFixtures;

impl CatalogFixtures {
    // ===== Schemas =====

    pub fn schema_rows() -> Vec<Row> {
        vec![
            Row::new().with("USERNAME", "HR").with("ORACLE_MAINTAINED", "N"),
            Row::new().with("USERNAME", "SALES").with("ORACLE_MAINTAINED", "N"),
            Row::new().with("USERNAME", "SYS").with("ORACLE_MAINTAINED", "Y"),
        ]
    }

    // ===== Tables and columns =====

    pub fn table_rows() -> Vec<Row> {
        vec![
            table("EMPLOYEES", "TABLE", Some(107), Some("Employee records")),
            table("COUNTRIES", "TABLE", Some(25), None),
            table("DEPARTMENTS", "TABLE", Some(27), None),
            table("EMP_DETAILS_VIEW", "VIEW", None, None),
        ]
    }

    pub fn column_rows() -> Vec<Row> {
        vec![
            column("COUNTRIES", "COUNTRY_ID", 1, "CHAR", Some(2), None, None, false),
            column("COUNTRIES", "COUNTRY_NAME", 2, "VARCHAR2", Some(40), None, None, true),
            column("DEPARTMENTS", "DEPARTMENT_ID", 1, "NUMBER", None, Some(4), Some(0), false),
            column("DEPARTMENTS", "DEPARTMENT_NAME", 2, "VARCHAR2", Some(30), None, None, false),
            column("DEPARTMENTS", "MANAGER_ID", 3, "NUMBER", None, Some(6), Some(0), true),
            column("EMPLOYEES", "EMAIL", 4, "VARCHAR2", Some(25), None, None, false),
            column("EMPLOYEES", "EMPLOYEE_ID", 1, "NUMBER", None, Some(6), Some(0), false),
            column("EMPLOYEES", "FIRST_NAME", 2, "VARCHAR2", Some(20), None, None, true),
            column("EMPLOYEES", "LAST_NAME", 3, "VARCHAR2", Some(25), None, None, false),
            column("EMPLOYEES", "DEPARTMENT_ID", 5, "NUMBER", None, Some(4), Some(0), true),
            column("EMPLOYEES", "HIRE_DATE", 6, "DATE", None, None, None, false),
            column("EMP_DETAILS_VIEW", "EMPLOYEE_ID", 1, "NUMBER", None, Some(6), Some(0), false),
        ]
    }

    // ===== Indexes and constraints =====

    pub fn index_rows() -> Vec<Row> {
        vec![
            index("DEPARTMENTS", "DEPT_ID_PK", "UNIQUE", "DEPARTMENT_ID", 1),
            index("EMPLOYEES", "EMP_EMP_ID_PK", "UNIQUE", "EMPLOYEE_ID", 1),
            index("EMPLOYEES", "EMP_NAME_IX", "NONUNIQUE", "LAST_NAME", 1),
            index("EMPLOYEES", "EMP_NAME_IX", "NONUNIQUE", "FIRST_NAME", 2),
            index("EMPLOYEES", "EMP_UPPER_IX", "NONUNIQUE", "SYS_NC00010$", 1),
        ]
    }

    pub fn constraint_rows() -> Vec<Row> {
        vec![
            constraint("COUNTRIES", "COUNTRY_C_ID_PK", "P", Some("COUNTRY_ID:1")),
            constraint("DEPARTMENTS", "DEPT_ID_PK", "P", Some("DEPARTMENT_ID:1")),
            constraint("EMPLOYEES", "EMP_EMAIL_UK", "U", Some("EMAIL:1")),
            constraint("EMPLOYEES", "EMP_EMP_ID_PK", "P", Some("EMPLOYEE_ID:1")),
            constraint("EMPLOYEES", "EMP_NAME_UK", "U", Some("LAST_NAME:2,FIRST_NAME:1")),
            constraint("EMPLOYEES", "EMP_SALARY_MIN", "C", None)
                .with("SEARCH_CONDITION", "salary > 0"),
        ]
    }

    pub fn foreign_key_rows() -> Vec<Row> {
        vec![
            Row::new()
                .with("TABLE_NAME", "EMPLOYEES")
                .with("CONSTRAINT_NAME", "EMP_DEPT_FK")
                .with("R_OWNER", "HR")
                .with("R_CONSTRAINT_NAME", "DEPT_ID_PK")
                .with("DELETE_RULE", "SET NULL")
                .with("STATUS", "ENABLED")
                .with("COLUMN_NAME", "DEPARTMENT_ID")
                .with("POSITION", 1u32),
        ]
    }

    // ===== Routines =====

    pub fn procedure_rows() -> Vec<Row> {
        vec![
            procedure("ADD_JOB_HISTORY", "PROCEDURE", 1001),
            procedure("GET_SALARY", "FUNCTION", 1002),
            procedure("SECURE_DML", "PROCEDURE", 1003),
        ]
    }

    pub fn argument_rows() -> Vec<Row> {
        vec![
            argument(1001, Some("P_EMP_ID"), 1, 1, 0, Some("NUMBER")),
            argument(1001, Some("P_EMP"), 2, 2, 0, Some("PL/SQL RECORD")),
            argument(1001, Some("ID"), 3, 1, 1, Some("NUMBER")),
            argument(1001, Some("ADDRESS"), 4, 2, 1, Some("PL/SQL RECORD")),
            argument(1001, Some("CITY"), 5, 1, 2, Some("VARCHAR2")),
            argument(1001, Some("P_START"), 6, 3, 0, Some("DATE")).with("DEFAULTED", "Y"),
            argument(1002, None, 1, 1, 0, Some("NUMBER")).with("IN_OUT", "OUT"),
            argument(1002, Some("P_EMP_ID"), 2, 2, 0, Some("NUMBER")),
            argument(1003, None, 1, 1, 0, None),
        ]
    }

    // ===== Synonyms and triggers =====

    /// Every synonym, including ones pointing at routines and remote objects
    pub fn synonym_rows() -> Vec<Row> {
        vec![
            synonym("DEPT", "HR", "DEPARTMENTS", None),
            synonym("EMP", "HR", "EMPLOYEES", None),
            synonym("GET_SAL", "HR", "GET_SALARY", None),
            synonym("LOC", "SCOTT", "LOCATIONS", Some("REMOTE")),
        ]
    }

    /// Synonyms whose target is a table or view
    pub fn table_synonym_rows() -> Vec<Row> {
        vec![
            synonym("DEPT", "HR", "DEPARTMENTS", None),
            synonym("EMP", "HR", "EMPLOYEES", None),
        ]
    }

    pub fn trigger_rows() -> Vec<Row> {
        vec![
            trigger("LOGON_AUDIT", "AFTER EVENT", "LOGON", "DATABASE", None, "DISABLED"),
            trigger(
                "SECURE_EMPLOYEES",
                "BEFORE STATEMENT",
                "INSERT OR UPDATE OR DELETE",
                "TABLE",
                Some("EMPLOYEES"),
                "ENABLED",
            ),
            trigger(
                "UPDATE_JOB_HISTORY",
                "AFTER EACH ROW",
                "UPDATE",
                "TABLE",
                Some("EMPLOYEES"),
                "ENABLED",
            ),
        ]
    }
}

fn table(name: &str, object_type: &str, rows: Option<i64>, comment: Option<&str>) -> Row {
    Row::new()
        .with("TABLE_NAME", name)
        .with("OBJECT_TYPE", object_type)
        .with("TEMPORARY", "N")
        .with("NUM_ROWS", rows)
        .with("COMMENTS", comment)
}

#[allow(clippy::too_many_arguments)]
fn column(
    table: &str,
    name: &str,
    id: u32,
    data_type: &str,
    length: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
    nullable: bool,
) -> Row {
    Row::new()
        .with("TABLE_NAME", table)
        .with("COLUMN_NAME", name)
        .with("COLUMN_ID", id)
        .with("DATA_TYPE", data_type)
        .with("CHAR_LENGTH", length)
        .with("DATA_PRECISION", precision)
        .with("DATA_SCALE", scale)
        .with("NULLABLE", if nullable { "Y" } else { "N" })
        .with("DATA_DEFAULT", Value::Null)
        .with("COMMENTS", Value::Null)
}

fn index(table: &str, name: &str, uniqueness: &str, column: &str, position: u32) -> Row {
    Row::new()
        .with("TABLE_NAME", table)
        .with("INDEX_NAME", name)
        .with("INDEX_TYPE", "NORMAL")
        .with("UNIQUENESS", uniqueness)
        .with("COLUMN_NAME", column)
        .with("COLUMN_POSITION", position)
        .with("DESCEND", "ASC")
}

fn constraint(table: &str, name: &str, kind: &str, columns: Option<&str>) -> Row {
    Row::new()
        .with("TABLE_NAME", table)
        .with("CONSTRAINT_NAME", name)
        .with("CONSTRAINT_TYPE", kind)
        .with("STATUS", "ENABLED")
        .with("COLUMNS", columns)
}

fn procedure(name: &str, object_type: &str, object_id: i64) -> Row {
    Row::new()
        .with("OBJECT_NAME", name)
        .with("OBJECT_TYPE", object_type)
        .with("OBJECT_ID", object_id)
        .with("STATUS", "VALID")
}

fn argument(
    object_id: i64,
    name: Option<&str>,
    sequence: u32,
    position: u32,
    level: u32,
    data_type: Option<&str>,
) -> Row {
    Row::new()
        .with("OBJECT_ID", object_id)
        .with("ARGUMENT_NAME", name)
        .with("SEQUENCE", sequence)
        .with("POSITION", position)
        .with("DATA_LEVEL", level)
        .with("DATA_TYPE", data_type)
}

fn synonym(name: &str, owner: &str, target: &str, db_link: Option<&str>) -> Row {
    Row::new()
        .with("SYNONYM_NAME", name)
        .with("TABLE_OWNER", owner)
        .with("TABLE_NAME", target)
        .with("DB_LINK", db_link)
}

fn trigger(
    name: &str,
    trigger_type: &str,
    event: &str,
    base_type: &str,
    table: Option<&str>,
    status: &str,
) -> Row {
    Row::new()
        .with("TRIGGER_NAME", name)
        .with("TRIGGER_TYPE", trigger_type)
        .with("TRIGGERING_EVENT", event)
        .with("BASE_OBJECT_TYPE", base_type)
        .with("TABLE_NAME", table)
        .with("STATUS", status)
}

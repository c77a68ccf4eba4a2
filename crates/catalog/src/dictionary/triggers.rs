// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Triggers. `ALL_TRIGGERS` is permission-gated on some installations, so
//! this cache usually runs with the lenient read policy.

use sqlnav_model::{TriggerMetadata, TriggerTiming};

use super::Schema;
use crate::cache::ObjectFetcher;
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::row::{Row, Statement};

const TRIGGERS_SQL: &str = "\
SELECT TRIGGER_NAME, TRIGGER_TYPE, TRIGGERING_EVENT, BASE_OBJECT_TYPE, TABLE_NAME, STATUS
FROM ALL_TRIGGERS
WHERE OWNER = :1
ORDER BY TRIGGER_NAME";

const TRIGGER_LOOKUP_SQL: &str = "\
SELECT TRIGGER_NAME, TRIGGER_TYPE, TRIGGERING_EVENT, BASE_OBJECT_TYPE, TABLE_NAME, STATUS
FROM ALL_TRIGGERS
WHERE OWNER = :1 AND TRIGGER_NAME = :2";

impl CatalogObject for TriggerMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

pub(super) struct TriggerFetcher;

impl ObjectFetcher<Schema, TriggerMetadata> for TriggerFetcher {
    fn prepare_objects(&self, owner: &Schema) -> Statement {
        Statement::new("triggers.list", TRIGGERS_SQL)
            .bind(owner.name())
            .with_fetch_size(owner.fetch_size())
    }

    fn prepare_lookup(&self, owner: &Schema, name: &str) -> Option<Statement> {
        Some(
            Statement::new("triggers.lookup", TRIGGER_LOOKUP_SQL)
                .bind(owner.name())
                .bind(name),
        )
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<TriggerMetadata>> {
        let trigger_type = row.get_str("TRIGGER_TYPE")?;
        let mut trigger = TriggerMetadata::new(
            owner.name(),
            row.get_str("TRIGGER_NAME")?,
            TriggerTiming::from_trigger_type(trigger_type),
        );
        trigger.for_each_row = trigger_type.to_uppercase().contains("EACH ROW");
        trigger.enabled = row.get_flag("STATUS")?;
        if let Some(event) = row.get_opt_str("TRIGGERING_EVENT")? {
            trigger = trigger.with_event(event.trim());
        }
        let on_table = row
            .get_opt_str("BASE_OBJECT_TYPE")?
            .is_some_and(|t| matches!(t.trim(), "TABLE" | "VIEW"));
        if on_table {
            if let Some(table) = row.get_opt_str("TABLE_NAME")? {
                trigger = trigger.on_table(table);
            }
        }
        Ok(Some(trigger))
    }
}
